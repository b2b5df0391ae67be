//! The result type produced by every matching strategy.

use serde::{Deserialize, Serialize};

use crate::rule::Rid;
use crate::spans::Span;

/// Which strategy produced a [`LicenseMatch`], in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatcherKind {
    /// S1: whole-query-run content hash.
    Hash,
    /// S2: SPDX-License-Identifier expression extraction.
    Spdx,
    /// S3: Aho-Corasick exact substring matching.
    Exact,
    /// S4: set-ranked candidates refined by sequence alignment.
    Approximate,
}

impl MatcherKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatcherKind::Hash => "1-hash",
            MatcherKind::Spdx => "2-spdx-lid",
            MatcherKind::Exact => "3-exact",
            MatcherKind::Approximate => "4-approx",
        }
    }
}

impl std::fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single license detection result, produced by one matching strategy
/// against one contiguous region of the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseMatch {
    /// The rule this match is attributed to, or [`crate::rule::NO_RULE`]
    /// for matches not tied to any indexed rule (e.g. SPDX extraction).
    pub rule_id: Rid,
    /// Query-side matched positions.
    pub qspan: Span,
    /// Rule-side matched positions; `ispan ⊆ positions(rule rule_id)`.
    pub ispan: Span,
    /// The subset of `ispan` that falls on good/high (discriminating)
    /// rule tokens.
    pub hispan: Span,
    pub license_expression: String,
    pub start_line: usize,
    pub end_line: usize,
    pub matcher: MatcherKind,
    /// 0.0-1.0 confidence score; `coverage * relevance / 100` for
    /// non-exact strategies.
    pub score: f32,
    /// Count of matched query tokens.
    pub matched_length: usize,
    /// Percentage (0.0-100.0) of the rule's tokens accounted for.
    pub match_coverage: f32,
    pub rule_relevance: u8,
    pub rule_identifier: String,
    pub matched_text: Option<String>,
}

impl LicenseMatch {
    pub fn line_span(&self) -> std::ops::RangeInclusive<usize> {
        self.start_line..=self.end_line
    }
}
