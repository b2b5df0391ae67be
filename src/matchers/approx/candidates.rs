//! Candidate ranking for approximate matching.
//!
//! Before paying for sequence alignment, narrow the rule set down to a
//! short list of plausible candidates using cheap set/multiset overlap
//! scores: Jaccard resemblance over unique good/high token ids, and
//! multiset containment (how much of the *rule's* high-token occurrences
//! are covered by the query, counting repeats). A rule must clear its own
//! minimum-coverage gate, expressed as a floor on the unique high-token
//! intersection size, before it is even scored.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::dictionary::TokenId;
use crate::index::LicenseIndex;
use crate::rule::Rid;

/// Hard cap on candidates carried into alignment, regardless of how many
/// rules clear the coverage threshold.
pub const MAX_CANDIDATES: usize = 65;

#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub rid: Rid,
    pub resemblance: f32,
    pub containment: f32,
}

fn jaccard(a: &HashSet<TokenId>, b: &HashSet<TokenId>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// `Σ min(q_i, r_i) / Σ r_i` over the rule's high-token multiset.
fn multiset_containment(query_mset: &HashMap<TokenId, usize>, rule_mset: &HashMap<TokenId, usize>) -> f32 {
    let total: usize = rule_mset.values().sum();
    if total == 0 {
        return 0.0;
    }
    let shared: usize = rule_mset
        .iter()
        .map(|(tid, &r_count)| query_mset.get(tid).copied().unwrap_or(0).min(r_count))
        .sum();
    shared as f32 / total as f32
}

/// Rank every approx-matchable rule against the query's good/high token
/// set and multiset, returning the best `MAX_CANDIDATES` that meet each
/// rule's own minimum-coverage gate. `exclude` holds rids already exactly
/// matched in the current run, since S4 never reconsiders a rule S3 has
/// already accounted for.
pub fn rank(
    index: &LicenseIndex,
    query_high_set: &HashSet<TokenId>,
    query_high_mset: &HashMap<TokenId, usize>,
    exclude: &HashSet<Rid>,
) -> Vec<Candidate> {
    let len_junk = index.dictionary().len_junk();
    let rids: Vec<Rid> = index.approx_matchable_rids.iter().collect();

    let mut candidates: Vec<Candidate> = rids
        .par_iter()
        .copied()
        .filter_map(|rid| {
            if exclude.contains(&rid) {
                return None;
            }
            let rule_set = index.sets_by_rid.get(&rid)?;
            let rule_mset = index.msets_by_rid.get(&rid)?;
            let rule = index.rule(rid)?;

            let high_rule_set: HashSet<TokenId> = rule_set.iter().copied().filter(|&tid| (tid as usize) >= len_junk).collect();
            let high_rule_mset: HashMap<TokenId, usize> = rule_mset
                .iter()
                .filter(|(tid, _)| (**tid as usize) >= len_junk)
                .map(|(&tid, &count)| (tid, count))
                .collect();

            let intersection = query_high_set.intersection(&high_rule_set).count();
            let required = (rule.minimum_coverage.unwrap_or(0) as f64 / 100.0 * rule.high_length_unique as f64).ceil() as usize;
            if intersection < required {
                return None;
            }
            if intersection == 0 {
                return None;
            }

            let resemblance = jaccard(query_high_set, &high_rule_set);
            let containment = multiset_containment(query_high_mset, &high_rule_mset);

            Some(Candidate { rid, resemblance, containment })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.containment
            .partial_cmp(&a.containment)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.resemblance.partial_cmp(&a.resemblance).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.rid.cmp(&b.rid))
    });
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::builder::IndexBuilder;
    use crate::rule::RuleRecord;

    fn build_index() -> LicenseIndex {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new(
                "mit_1",
                "permission is hereby granted free of charge to any person obtaining a copy",
                "mit",
            ))
            .unwrap();
        builder
            .add_rule(RuleRecord::new(
                "apache_1",
                "licensed under the apache license version two point oh",
                "apache-2.0",
            ))
            .unwrap();
        builder.build().unwrap()
    }

    fn high_set_and_mset(index: &LicenseIndex, rid: Rid) -> (HashSet<TokenId>, HashMap<TokenId, usize>) {
        let len_junk = index.dictionary().len_junk();
        let tokens = index.tokens_for(rid).unwrap();
        let mut mset = HashMap::new();
        for &tid in tokens {
            if (tid as usize) >= len_junk {
                *mset.entry(tid).or_insert(0) += 1;
            }
        }
        (mset.keys().copied().collect(), mset)
    }

    #[test]
    fn ranks_the_closer_rule_first() {
        let index = build_index();
        let (query_set, query_mset) = high_set_and_mset(&index, 0);

        let ranked = rank(&index, &query_set, &query_mset, &HashSet::new());
        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].rid, 0);
    }

    #[test]
    fn empty_query_set_yields_no_candidates() {
        let index = build_index();
        let ranked = rank(&index, &HashSet::new(), &HashMap::new(), &HashSet::new());
        assert!(ranked.is_empty());
    }

    #[test]
    fn excluded_rid_is_never_ranked() {
        let index = build_index();
        let (query_set, query_mset) = high_set_and_mset(&index, 0);
        let mut exclude = HashSet::new();
        exclude.insert(0);

        let ranked = rank(&index, &query_set, &query_mset, &exclude);
        assert!(ranked.iter().all(|c| c.rid != 0));
    }
}
