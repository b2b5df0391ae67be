//! S3: Aho-Corasick exact substring matching.
//!
//! Scans a query run for every occurrence of a full rule token sequence
//! using the index's precompiled automaton. A hit only counts if every
//! position it covers is still matchable — an earlier strategy may have
//! already claimed part of the span.

use crate::index::LicenseIndex;
use crate::models::{LicenseMatch, MatcherKind};
use crate::query::{Query, QueryRun};
use crate::spans::Span;

fn tokens_to_bytes(tokens: &[u16]) -> Vec<u8> {
    tokens.iter().flat_map(|t| t.to_le_bytes()).collect()
}

#[inline]
fn byte_pos_to_token_pos(byte_pos: usize) -> usize {
    byte_pos / 2
}

/// Find every exact occurrence of an indexed rule within `run`, returning
/// one match (and its claimed span) per hit that is entirely matchable.
pub fn match_run(index: &LicenseIndex, query: &Query, run: &QueryRun) -> Vec<(LicenseMatch, Span)> {
    let mut matches = Vec::new();

    let run_tokens = query.run_tokens(run);
    if run_tokens.is_empty() {
        return matches;
    }

    let encoded = tokens_to_bytes(run_tokens);

    for ac_match in index.rules_automaton.find_overlapping_iter(&encoded) {
        let qstart = run.start + byte_pos_to_token_pos(ac_match.start());
        let qend = run.start + byte_pos_to_token_pos(ac_match.end());
        let matched_length = qend - qstart;
        if matched_length == 0 {
            continue;
        }

        if !(qstart..qend).all(|pos| query.is_matchable(pos)) {
            continue;
        }

        let Some(rid) = index.pattern_id_to_rid.get(ac_match.pattern().as_usize()).copied() else {
            continue;
        };
        let Some(rule) = index.rule(rid) else { continue };
        // builder.rs keeps negative rules out of this automaton entirely;
        // the check here is pure defense-in-depth against that invariant.
        if index.is_false_positive(rid) || index.is_negative(rid) {
            continue;
        }

        let rule_length = rule.length.max(1);
        let match_coverage = (matched_length as f32 / rule_length as f32) * 100.0;
        let score = (match_coverage / 100.0) * (rule.relevance as f32 / 100.0);

        let start_line = query.line_for_pos(qstart).unwrap_or(1);
        let end_line = query.line_for_pos(qend.saturating_sub(1)).unwrap_or(start_line);

        let len_junk = index.dictionary().len_junk();
        let hispan = match index.tokens_for(rid) {
            Some(tokens) => {
                Span::from_iterator((0..tokens.len()).filter(|&p| (tokens[p] as usize) >= len_junk))
            }
            None => Span::new(),
        };

        matches.push((
            LicenseMatch {
                rule_id: rid,
                qspan: Span::from_range(qstart..qend),
                ispan: Span::from_range(0..rule_length),
                hispan,
                license_expression: rule.license_expression.clone(),
                start_line,
                end_line,
                matcher: MatcherKind::Exact,
                score,
                matched_length,
                match_coverage,
                rule_relevance: rule.relevance,
                rule_identifier: rule.identifier.clone(),
                matched_text: Some(query.matched_text(qstart, qend)),
            },
            Span::from_range(qstart..qend),
        ));
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::builder::IndexBuilder;
    use crate::rule::RuleRecord;

    #[test]
    fn exact_substring_inside_a_larger_run_is_found() {
        let mut builder = IndexBuilder::new();
        builder.add_rule(RuleRecord::new("mit_1", "permission is hereby granted", "mit")).unwrap();
        let index = builder.build().unwrap();

        let text = "some preamble permission is hereby granted and then trailer words";
        let query = Query::tokenize(text, index.dictionary());
        let run = query.runs()[0];
        let matches = match_run(&index, &query, &run);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0.license_expression, "mit");
        assert_eq!(matches[0].0.match_coverage, 100.0);
    }

    #[test]
    fn false_positive_rules_never_surface_a_match() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new("fp_1", "not really a license", "mit").false_positive(true))
            .unwrap();
        let index = builder.build().unwrap();

        let query = Query::tokenize("not really a license at all", index.dictionary());
        let run = query.runs()[0];
        assert!(match_run(&index, &query, &run).is_empty());
    }

    #[test]
    fn already_claimed_positions_are_skipped() {
        let mut builder = IndexBuilder::new();
        builder.add_rule(RuleRecord::new("mit_1", "permission is hereby granted", "mit")).unwrap();
        let index = builder.build().unwrap();

        let mut query = Query::tokenize("permission is hereby granted", index.dictionary());
        query.subtract(&Span::from_range(0..4));
        let run = query.runs()[0];
        assert!(match_run(&index, &query, &run).is_empty());
    }
}
