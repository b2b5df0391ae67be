//! Rule records: the external input shape and the derived, indexed shape.

use serde::{Deserialize, Serialize};

/// A rule as supplied by an external rule provider, before indexing.
///
/// An ordered iterable of these is the sole input to
/// [`crate::index::IndexBuilder::build`]; `rid` is assigned by position in
/// that iteration order.
#[derive(Debug, Clone)]
pub struct RuleRecord {
    pub identifier: String,
    pub text: String,
    pub license_expression: String,
    pub is_negative: bool,
    pub is_false_positive: bool,
    pub minimum_coverage: Option<u8>,
    pub relevance: u8,
}

impl RuleRecord {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>, license_expression: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
            license_expression: license_expression.into(),
            is_negative: false,
            is_false_positive: false,
            minimum_coverage: None,
            relevance: 100,
        }
    }

    pub fn negative(mut self, value: bool) -> Self {
        self.is_negative = value;
        self
    }

    pub fn false_positive(mut self, value: bool) -> Self {
        self.is_false_positive = value;
        self
    }

    pub fn minimum_coverage(mut self, value: u8) -> Self {
        self.minimum_coverage = Some(value);
        self
    }

    pub fn relevance(mut self, value: u8) -> Self {
        self.relevance = value;
        self
    }
}

pub type Rid = usize;

/// Sentinel `rid` for a [`crate::models::LicenseMatch`] not tied to any
/// indexed rule, e.g. an SPDX-tag extraction.
pub const NO_RULE: Rid = Rid::MAX;

/// The derived, index-time record for a rule: everything computed once at
/// build time and never touched again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub rid: Rid,
    pub identifier: String,
    pub license_expression: String,
    pub is_negative: bool,
    pub is_false_positive: bool,
    pub relevance: u8,
    pub minimum_coverage: Option<u8>,

    pub length: usize,
    pub length_unique: usize,
    pub high_length: usize,
    pub high_length_unique: usize,

    pub min_matched_length: usize,
    pub min_high_matched_length: usize,
    pub min_matched_length_unique: usize,
    pub min_high_matched_length_unique: usize,

    /// `regular` and not `false_positive`/`negative`, and containing at
    /// least one good/high token.
    pub is_approx_matchable: bool,
}
