//! # license-index
//!
//! A license-text detection index and multi-strategy matcher: build an
//! index from a set of license rules, then match arbitrary text against
//! it through a pipeline of increasingly expensive strategies — negative
//! subtraction, whole-document content hash, SPDX tag extraction, exact
//! Aho-Corasick substring matching, and approximate set-ranked sequence
//! alignment.
//!
//! ## Quick start
//!
//! ```
//! use license_index::index::builder::IndexBuilder;
//! use license_index::orchestrator::{match_text, MatchOptions};
//! use license_index::rule::RuleRecord;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut builder = IndexBuilder::new();
//! builder.add_rule(RuleRecord::new(
//!     "mit_1",
//!     "Permission is hereby granted, free of charge, to any person",
//!     "mit",
//! ))?;
//! let index = builder.build()?;
//!
//! let matches = match_text(
//!     &index,
//!     "Permission is hereby granted, free of charge, to any person",
//!     &MatchOptions::default(),
//! );
//! assert_eq!(matches.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`tokenize`] / [`dictionary`]: turn text into a frequency-renumbered
//!   token-id vocabulary, partitioned into junk (common) and good/high
//!   (discriminating) ids.
//! - [`rule`]: the external rule input shape and the derived, indexed
//!   shape computed at build time.
//! - [`index`]: the frozen [`index::LicenseIndex`] and the
//!   [`index::builder::IndexBuilder`] that produces it; [`index::persist`]
//!   handles serialization.
//! - [`query`]: tokenizes input text into matchable runs.
//! - [`matchers`]: the four strategies (hash, SPDX, exact, approximate).
//! - [`refine`]: dedup/merge/overlap-resolution over raw matches.
//! - [`orchestrator`]: runs the full pipeline and returns refined matches.
//! - [`expression`]: the license-expression validation hook used by the
//!   SPDX strategy.
//! - [`error`]: build- and query-time error types.

pub mod common_tokens;
pub mod dictionary;
pub mod error;
pub mod expression;
pub mod index;
pub mod matchers;
pub mod models;
pub mod orchestrator;
pub mod query;
pub mod refine;
pub mod rule;
pub mod spans;
pub mod thresholds;
pub mod token_sets;
pub mod tokenize;

pub use error::{BuildError, QueryError};
pub use index::builder::IndexBuilder;
pub use index::LicenseIndex;
pub use models::{LicenseMatch, MatcherKind};
pub use orchestrator::{match_text, MatchOptions};
pub use rule::{Rid, Rule, RuleRecord};
