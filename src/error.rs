//! Error kinds surfaced by index construction and by queries.
//!
//! Build errors are fatal and bubble up to the caller via `Result`. Query-time
//! failures in a single strategy (alignment timeouts, deadline expiry) are
//! never returned as errors: they are logged and the pipeline continues with
//! whatever matches it has already accumulated.

use thiserror::Error;

/// Errors that can occur while constructing a [`crate::index::LicenseIndex`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// Two or more rules reduced to the identical token-id sequence (and
    /// therefore the identical content hash).
    #[error("duplicate rule content hash shared by {0:?}")]
    DuplicateRule(Vec<String>),

    /// More than 2^15-1 distinct tokens were observed across all rules.
    #[error("token limit exceeded: {found} unique tokens found, hard cap is {limit}")]
    TokenLimitExceeded { found: usize, limit: usize },

    /// A single rule produced more than 65535 token positions.
    #[error("rule {0:?} has {1} tokens, exceeding the 65535 position cap")]
    RuleTooLong(String, usize),

    /// The builder was already consumed by a previous `build()` call.
    #[error("index builder is frozen and cannot be mutated")]
    IndexFrozen,
}

/// Errors surfaced directly to a caller of the query-time API.
///
/// Per policy, an empty query is not actually an error condition at the
/// orchestrator level (it yields an empty match list); this type exists for
/// callers that want to distinguish "nothing to search" from "searched and
/// found nothing" at the API boundary.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query has no location and no query string")]
    Empty,
}
