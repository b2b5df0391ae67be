//! S4: approximate matching — set-ranked candidates refined by local
//! sequence alignment.

pub mod align;
pub mod candidates;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::dictionary::TokenId;
use crate::index::LicenseIndex;
use crate::models::LicenseMatch;
use crate::query::{Query, QueryRun};
use crate::rule::Rid;

/// Cooperative stop conditions checked between candidates, so a caller can
/// bound how long a single query run spends in the expensive S4 pass.
#[derive(Clone, Default)]
pub struct MatchBudget {
    pub deadline: Option<Instant>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl MatchBudget {
    fn expired(&self) -> bool {
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                return true;
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        false
    }
}

/// Run the candidate-ranking + alignment pass over a single query run,
/// claiming matched spans from `query` as they're found. `exclude` holds
/// rids S3 already matched exactly in this run, so ranking and alignment
/// never reconsider a rule already accounted for. Candidates are ranked
/// once against the run's starting state; each candidate is then aligned
/// repeatedly with an advancing offset so every non-overlapping
/// occurrence of that rule within the run is found, not just the first.
pub fn match_run(index: &LicenseIndex, query: &mut Query, run: &QueryRun, budget: &MatchBudget, exclude: &HashSet<Rid>) -> Vec<LicenseMatch> {
    let mut matches = Vec::new();

    if query.run_is_exhausted_under(run, false) {
        return matches;
    }

    let len_junk = index.dictionary().len_junk();
    let mut query_high_mset: std::collections::HashMap<TokenId, usize> = std::collections::HashMap::new();
    for p in query.matchable_positions_in(run) {
        let tid = query.tokens()[p];
        if (tid as usize) >= len_junk {
            *query_high_mset.entry(tid).or_insert(0) += 1;
        }
    }
    let query_high_set: std::collections::HashSet<TokenId> = query_high_mset.keys().copied().collect();
    if query_high_set.is_empty() {
        return matches;
    }

    let candidates = candidates::rank(index, &query_high_set, &query_high_mset, exclude);

    for candidate in &candidates {
        if budget.expired() {
            log::warn!("approximate matching budget exhausted before candidate rid {}", candidate.rid);
            break;
        }

        let mut start_offset = run.start;
        while start_offset < run.end {
            if budget.expired() {
                log::warn!("approximate matching budget exhausted mid-candidate scan");
                return matches;
            }

            let Some((license_match, span)) = align::align(index, query, run, candidate.rid, start_offset) else {
                break;
            };

            let next_offset = span.end().unwrap_or(run.end);
            query.subtract(&span);
            matches.push(license_match);
            start_offset = next_offset.max(start_offset + 1);
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::builder::IndexBuilder;
    use crate::rule::RuleRecord;

    #[test]
    fn finds_a_match_and_then_exhausts() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new(
                "mit_1",
                "permission is hereby granted free of charge to any person obtaining a copy of software",
                "mit",
            ))
            .unwrap();
        let index = builder.build().unwrap();

        let text = "permission is hereby granted free of charge to any person obtaining a copy of software";
        let mut query = Query::tokenize(text, index.dictionary());
        let run = query.runs()[0];
        let budget = MatchBudget::default();

        let matches = match_run(&index, &mut query, &run, &budget, &HashSet::new());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].license_expression, "mit");
    }

    #[test]
    fn expired_budget_stops_immediately() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new("mit_1", "permission is hereby granted free of charge", "mit"))
            .unwrap();
        let index = builder.build().unwrap();

        let mut query = Query::tokenize("permission is hereby granted free of charge", index.dictionary());
        let run = query.runs()[0];
        let budget = MatchBudget {
            deadline: Some(Instant::now()),
            cancel: None,
        };
        std::thread::sleep(std::time::Duration::from_millis(1));

        let matches = match_run(&index, &mut query, &run, &budget, &HashSet::new());
        assert!(matches.is_empty());
    }
}
