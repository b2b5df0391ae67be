//! S1: whole-document content hash matching.
//!
//! The fastest and highest-confidence strategy: if the *entire* query,
//! taken as one token sequence (including unknown-token gaps), is still
//! fully matchable and hashes to the same 128-bit BLAKE3 digest as a
//! rule's full token sequence, it's a 100%-coverage match and the whole
//! pipeline stops — no run splitting, no further strategy, needed.

use crate::index::LicenseIndex;
use crate::models::{LicenseMatch, MatcherKind};
use crate::query::{Query, QueryRun};
use crate::spans::Span;

fn tokens_to_bytes(tokens: &[u16]) -> Vec<u8> {
    tokens.iter().flat_map(|t| t.to_le_bytes()).collect()
}

fn content_hash(tokens: &[u16]) -> [u8; 16] {
    let digest = blake3::hash(&tokens_to_bytes(tokens));
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest.as_bytes()[..16]);
    out
}

/// Try a whole-document hash match against the full query. Returns the
/// match and the span it claims (the whole query), or `None` if any
/// position is already claimed or the document doesn't hash-match a rule.
pub fn match_query(index: &LicenseIndex, query: &Query) -> Option<(LicenseMatch, Span)> {
    let whole = QueryRun { start: 0, end: query.len() };
    if !query.run_is_fully_matchable(&whole) {
        return None;
    }

    let tokens = query.tokens();
    if tokens.is_empty() {
        return None;
    }

    let hash = content_hash(tokens);
    let rid = index.rid_for_hash(&hash)?;
    let rule = index.rule(rid)?;

    let start_line = query.line_for_pos(0).unwrap_or(1);
    let end_line = query.line_for_pos(tokens.len().saturating_sub(1)).unwrap_or(start_line);

    let len_junk = index.dictionary().len_junk();
    let rule_tokens = index.tokens_for(rid).unwrap_or(&[]);
    let hispan = Span::from_iterator((0..rule_tokens.len()).filter(|&p| (rule_tokens[p] as usize) >= len_junk));

    let license_match = LicenseMatch {
        rule_id: rid,
        qspan: Span::from_range(0..tokens.len()),
        ispan: Span::from_range(0..rule.length),
        hispan,
        license_expression: rule.license_expression.clone(),
        start_line,
        end_line,
        matcher: MatcherKind::Hash,
        score: 1.0,
        matched_length: tokens.len(),
        match_coverage: 100.0,
        rule_relevance: rule.relevance,
        rule_identifier: rule.identifier.clone(),
        matched_text: Some(query.matched_text(0, tokens.len())),
    };

    Some((license_match, Span::from_range(0..tokens.len())))
}
