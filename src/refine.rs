//! Post-processing over the raw matches every strategy produced: dedup,
//! merge, resolve overlaps, drop weak matches, and order the survivors.

use crate::matchers::approx::align::MAX_DIST;
use crate::models::LicenseMatch;

/// Matches below this score are dropped outright; below this, the text
/// overlap is too thin to be worth reporting.
const MIN_SCORE: f32 = 0.1;

fn same_rule(a: &LicenseMatch, b: &LicenseMatch) -> bool {
    a.rule_identifier == b.rule_identifier
}

fn order_by_qspan<'a>(a: &'a LicenseMatch, b: &'a LicenseMatch) -> (&'a LicenseMatch, &'a LicenseMatch) {
    if a.qspan.start().unwrap_or(0) <= b.qspan.start().unwrap_or(0) {
        (a, b)
    } else {
        (b, a)
    }
}

/// True if two same-rule matches should be merged into one: their qspans
/// literally overlap, or the gap between them is small enough that it's
/// more likely one match split by a run boundary than two independent
/// hits of the same rule.
fn merge_compatible(a: &LicenseMatch, b: &LicenseMatch) -> bool {
    if a.qspan.overlaps(&b.qspan) {
        return true;
    }
    let (earlier, later) = order_by_qspan(a, b);
    matches!(earlier.qspan.gap_to(&later.qspan), Some(gap) if gap <= MAX_DIST / 2)
}

/// True only when two matches' qspans literally share a position. Unlike
/// [`merge_compatible`], cross-rule overlap resolution never tolerates a
/// gap — two different rules' matches a few tokens apart are independent
/// findings, not one match split in two.
fn qspans_overlap(a: &LicenseMatch, b: &LicenseMatch) -> bool {
    a.qspan.overlaps(&b.qspan)
}

fn merge_pair(a: LicenseMatch, b: LicenseMatch) -> LicenseMatch {
    let (earlier, later) = if a.start_line <= b.start_line { (a, b) } else { (b, a) };

    let matched_text = match (earlier.matched_text.clone(), later.matched_text.clone()) {
        (Some(a), Some(b)) if a != b => Some(format!("{a} {b}")),
        (Some(a), _) => Some(a),
        (None, b) => b,
    };

    let qspan = earlier.qspan.union(&later.qspan);
    let ispan = earlier.ispan.union(&later.ispan);
    let hispan = earlier.hispan.union(&later.hispan);

    LicenseMatch {
        rule_id: earlier.rule_id,
        qspan,
        ispan,
        hispan,
        license_expression: earlier.license_expression,
        start_line: earlier.start_line,
        end_line: earlier.end_line.max(later.end_line),
        matcher: earlier.matcher,
        score: earlier.score.max(later.score),
        matched_length: earlier.matched_length + later.matched_length,
        match_coverage: earlier.match_coverage.max(later.match_coverage),
        rule_relevance: earlier.rule_relevance,
        rule_identifier: earlier.rule_identifier,
        matched_text,
    }
}

/// Merge matches of the same rule that are adjacent or overlapping, so a
/// rule broken into two runs by a mid-document gap is reported once.
fn merge_same_rule(mut matches: Vec<LicenseMatch>) -> Vec<LicenseMatch> {
    matches.sort_by_key(|m| (m.rule_identifier.clone(), m.start_line));

    let mut merged: Vec<LicenseMatch> = Vec::with_capacity(matches.len());
    for current in matches {
        if let Some(last) = merged.last() {
            if same_rule(last, &current) && merge_compatible(last, &current) {
                let previous = merged.pop().unwrap();
                merged.push(merge_pair(previous, current));
                continue;
            }
        }
        merged.push(current);
    }
    merged
}

/// Between two matches from different rules that overlap the same
/// tokens, keep only the stronger one: higher score wins, then higher
/// coverage, then the longer match, then the lower rule identifier
/// (stable tie-break so output order doesn't depend on strategy scan
/// order).
fn resolve_overlaps(mut matches: Vec<LicenseMatch>) -> Vec<LicenseMatch> {
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.match_coverage.partial_cmp(&a.match_coverage).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| b.matched_length.cmp(&a.matched_length))
            .then_with(|| a.rule_identifier.cmp(&b.rule_identifier))
    });

    let mut kept: Vec<LicenseMatch> = Vec::with_capacity(matches.len());
    for candidate in matches {
        let overlaps_kept = kept.iter().any(|k| qspans_overlap(k, &candidate) && !same_rule(k, &candidate));
        if !overlaps_kept {
            kept.push(candidate);
        }
    }
    kept
}

fn drop_weak(matches: Vec<LicenseMatch>) -> Vec<LicenseMatch> {
    matches.into_iter().filter(|m| m.score >= MIN_SCORE).collect()
}

fn stable_order(mut matches: Vec<LicenseMatch>) -> Vec<LicenseMatch> {
    matches.sort_by(|a, b| {
        a.start_line
            .cmp(&b.start_line)
            .then_with(|| a.end_line.cmp(&b.end_line))
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.rule_identifier.cmp(&b.rule_identifier))
    });
    matches
}

/// Run the full refinement pipeline: dedup exact repeats, merge adjacent
/// same-rule matches, resolve cross-rule overlaps, drop sub-threshold
/// matches, and sort the final list by position.
pub fn refine(matches: Vec<LicenseMatch>) -> Vec<LicenseMatch> {
    let mut deduped = matches;
    deduped.dedup_by(|a, b| a == b);

    let merged = merge_same_rule(deduped);
    let resolved = resolve_overlaps(merged);
    let strong = drop_weak(resolved);
    stable_order(strong)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatcherKind;
    use crate::spans::Span;

    /// `start`/`end` double as both line numbers and qspan token
    /// positions, which keeps every existing test's line-based
    /// expectations valid while the merge/overlap logic underneath now
    /// reads `qspan`, not line numbers.
    fn make(rule: &str, start: usize, end: usize, score: f32, coverage: f32) -> LicenseMatch {
        LicenseMatch {
            rule_id: 0,
            qspan: Span::from_range(start..end + 1),
            ispan: Span::new(),
            hispan: Span::new(),
            license_expression: rule.to_string(),
            start_line: start,
            end_line: end,
            matcher: MatcherKind::Exact,
            score,
            matched_length: end - start + 1,
            match_coverage: coverage,
            rule_relevance: 100,
            rule_identifier: rule.to_string(),
            matched_text: Some(format!("text-{start}-{end}")),
        }
    }

    #[test]
    fn merges_adjacent_matches_of_the_same_rule() {
        let matches = vec![make("mit", 1, 3, 0.5, 50.0), make("mit", 4, 6, 0.5, 50.0)];
        let refined = refine(matches);
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].start_line, 1);
        assert_eq!(refined[0].end_line, 6);
    }

    #[test]
    fn keeps_stronger_match_when_different_rules_overlap() {
        let matches = vec![make("mit", 1, 5, 0.9, 90.0), make("apache-2.0", 2, 4, 0.4, 40.0)];
        let refined = refine(matches);
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].license_expression, "mit");
    }

    #[test]
    fn drops_matches_below_minimum_score() {
        let matches = vec![make("mit", 1, 2, 0.01, 5.0)];
        assert!(refine(matches).is_empty());
    }

    #[test]
    fn non_overlapping_matches_of_different_rules_both_survive() {
        let matches = vec![make("mit", 1, 2, 0.9, 90.0), make("apache-2.0", 10, 12, 0.8, 80.0)];
        let refined = refine(matches);
        assert_eq!(refined.len(), 2);
    }

    #[test]
    fn final_order_is_by_start_line() {
        let matches = vec![make("apache-2.0", 10, 12, 0.8, 80.0), make("mit", 1, 2, 0.9, 90.0)];
        let refined = refine(matches);
        assert_eq!(refined[0].license_expression, "mit");
        assert_eq!(refined[1].license_expression, "apache-2.0");
    }
}
