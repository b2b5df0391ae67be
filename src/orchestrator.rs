//! Runs the full S0-S4 matching pipeline over a query and refines the
//! result into the final list of [`LicenseMatch`]es.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::expression::{ExpressionValidator, PassthroughValidator};
use crate::index::LicenseIndex;
use crate::matchers::approx::{self, MatchBudget};
use crate::matchers::{exact, hash, spdx};
use crate::models::LicenseMatch;
use crate::query::{Query, QueryRun};
use crate::refine;
use crate::rule::Rid;
use crate::spans::Span;

/// Tunables for a single call to [`match_text`].
#[derive(Clone)]
pub struct MatchOptions {
    /// Matches scoring below this are dropped during refinement.
    pub min_score: f32,
    /// Wall-clock deadline for the whole query; checked between runs and
    /// between S4 candidates.
    pub deadline: Option<Instant>,
    /// Cooperative cancellation flag, checked at the same points as
    /// `deadline`.
    pub cancel: Option<Arc<AtomicBool>>,
    /// Validates expressions extracted by the S2 SPDX strategy.
    pub expression_validator: Arc<dyn ExpressionValidator>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_score: 0.1,
            deadline: None,
            cancel: None,
            expression_validator: Arc::new(PassthroughValidator),
        }
    }
}

impl MatchOptions {
    fn expired(&self) -> bool {
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                return true;
            }
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    fn budget(&self) -> MatchBudget {
        MatchBudget {
            deadline: self.deadline,
            cancel: self.cancel.clone(),
        }
    }
}

fn tokens_to_bytes(tokens: &[u16]) -> Vec<u8> {
    tokens.iter().flat_map(|t| t.to_le_bytes()).collect()
}

/// S0: scan a run against the negative-rule automaton and subtract any
/// fully matchable hit, before any positive strategy sees it. A negative
/// rule marks text that looks like a license fragment but must never
/// itself contribute a match (e.g. a sentence *about* a license rather
/// than the license text itself).
fn subtract_negatives(index: &LicenseIndex, query: &mut Query, run: &QueryRun) {
    let run_tokens = query.run_tokens(run);
    if run_tokens.is_empty() || index.negative_rids.is_empty() {
        return;
    }

    let encoded = tokens_to_bytes(run_tokens);
    let mut spans = Vec::new();
    for ac_match in index.negative_automaton.find_overlapping_iter(&encoded) {
        let qstart = run.start + ac_match.start() / 2;
        let qend = run.start + ac_match.end() / 2;
        if qend > qstart && (qstart..qend).all(|pos| query.is_matchable(pos)) {
            spans.push(Span::from_range(qstart..qend));
        }
    }
    for span in spans {
        query.subtract(&span);
    }
}

/// Run every matching strategy over `text` in priority order (S0 negative
/// subtraction over every run, S1 whole-document hash, S2 SPDX, then S3
/// exact / S4 approximate per run), then refine the accumulated raw
/// matches into the final result.
pub fn match_text(index: &LicenseIndex, text: &str, options: &MatchOptions) -> Vec<LicenseMatch> {
    let mut query = Query::tokenize(text, index.dictionary());
    if query.is_empty() {
        return Vec::new();
    }

    if options.expired() {
        log::warn!("match deadline/cancellation reached before any strategy ran");
        return Vec::new();
    }

    // S0 runs over every run up front, before any positive strategy sees
    // the query — a negative hit must never survive into a hash match
    // either.
    for run in query.runs().to_vec() {
        subtract_negatives(index, &mut query, &run);
    }

    let mut raw_matches = Vec::new();

    // S1 is pipeline-terminating: the whole document either hashes to a
    // single rule's exact text, in which case nothing else can add to
    // that, or it doesn't and every later strategy gets a turn.
    if let Some((license_match, span)) = hash::match_query(index, &query) {
        log::debug!("S1 hash: matched whole document");
        query.subtract(&span);
        raw_matches.push(license_match);
        return finish(raw_matches, options);
    }

    let spdx_matches = spdx::match_query(&query, text, options.expression_validator.as_ref());
    log::debug!("S2 spdx: {} matches", spdx_matches.len());
    for (license_match, span) in spdx_matches {
        query.subtract(&span);
        raw_matches.push(license_match);
    }

    let runs: Vec<QueryRun> = query.runs().to_vec();
    for run in runs {
        if options.expired() {
            log::warn!("match deadline/cancellation reached before run {}..{}", run.start, run.end);
            break;
        }

        if query.run_is_exhausted(&run) {
            continue;
        }

        let exact_matches = exact::match_run(index, &query, &run);
        log::debug!("S3 exact: {} candidate matches in run {}..{}", exact_matches.len(), run.start, run.end);
        let mut matched_rids: HashSet<Rid> = HashSet::new();
        for (license_match, span) in exact_matches {
            if (span.start().unwrap_or(0)..span.end().unwrap_or(0)).all(|pos| query.is_matchable(pos)) {
                matched_rids.insert(license_match.rule_id);
                query.subtract(&span);
                raw_matches.push(license_match);
            }
        }

        if query.run_is_exhausted_under(&run, false) {
            continue;
        }

        if options.expired() {
            log::warn!("match deadline/cancellation reached before approximate pass on run {}..{}", run.start, run.end);
            break;
        }

        let budget = options.budget();
        let approx_matches = approx::match_run(index, &mut query, &run, &budget, &matched_rids);
        log::debug!("S4 approximate: {} matches in run {}..{}", approx_matches.len(), run.start, run.end);
        raw_matches.extend(approx_matches);
    }

    finish(raw_matches, options)
}

fn finish(raw_matches: Vec<LicenseMatch>, options: &MatchOptions) -> Vec<LicenseMatch> {
    let mut refined = refine::refine(raw_matches);
    refined.retain(|m| m.score >= options.min_score);
    refined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::builder::IndexBuilder;
    use crate::rule::RuleRecord;

    #[test]
    fn empty_text_yields_no_matches() {
        let index = IndexBuilder::new().build().unwrap();
        let options = MatchOptions::default();
        assert!(match_text(&index, "", &options).is_empty());
    }

    #[test]
    fn exact_rule_text_is_found_via_hash() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new("mit_1", "permission is hereby granted free of charge", "mit"))
            .unwrap();
        let index = builder.build().unwrap();
        let options = MatchOptions::default();

        let matches = match_text(&index, "permission is hereby granted free of charge", &options);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].license_expression, "mit");
        assert_eq!(matches[0].matcher, crate::models::MatcherKind::Hash);
    }

    #[test]
    fn spdx_tag_is_detected_even_with_no_rules_loaded() {
        let index = IndexBuilder::new().build().unwrap();
        let options = MatchOptions::default();
        let text = "// SPDX-License-Identifier: MIT";
        let matches = match_text(&index, text, &options);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].license_expression, "MIT");
    }

    #[test]
    fn negative_rule_text_never_surfaces_a_match() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new("neg_1", "this is definitely not a license grant", "mit").negative(true))
            .unwrap();
        let index = builder.build().unwrap();
        let options = MatchOptions::default();

        let matches = match_text(&index, "this is definitely not a license grant", &options);
        assert!(matches.is_empty());
    }

    #[test]
    fn exactly_matched_rule_is_not_also_reported_by_approximate_matching() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new(
                "mit_1",
                "permission is hereby granted free of charge to any person obtaining a copy",
                "mit",
            ))
            .unwrap();
        let index = builder.build().unwrap();
        let options = MatchOptions::default();

        let text = "some preamble permission is hereby granted free of charge to any person obtaining a copy trailing words";
        let matches = match_text(&index, text, &options);
        assert_eq!(matches.iter().filter(|m| m.license_expression == "mit").count(), 1);
    }

    #[test]
    fn already_expired_deadline_stops_before_any_run() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new("mit_1", "permission is hereby granted free of charge", "mit"))
            .unwrap();
        let index = builder.build().unwrap();

        let mut options = MatchOptions::default();
        options.deadline = Some(Instant::now());
        std::thread::sleep(std::time::Duration::from_millis(1));

        let matches = match_text(&index, "permission is hereby granted free of charge", &options);
        assert!(matches.is_empty());
    }
}
