//! Constructs a [`LicenseIndex`] from an iterable of [`RuleRecord`]s.
//!
//! `IndexBuilder` is the only mutable stage of the pipeline: it collects
//! rules, tokenizes and renumbers them, builds the automatons and the
//! candidate-ranking side tables, then hands back an immutable
//! [`LicenseIndex`]. A builder can only be built once; a second call to
//! [`IndexBuilder::build`] returns [`BuildError::IndexFrozen`].

use std::collections::{HashMap, HashSet};

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use bit_set::BitSet;

use crate::dictionary::{self, ProvisionalDictionary, TokenId, MAX_TOKENS};
use crate::error::BuildError;
use crate::index::{ContentHash, LicenseIndex};
use crate::rule::{Rid, Rule, RuleRecord};
use crate::thresholds::{compute_thresholds_occurrences, compute_thresholds_unique};
use crate::token_sets::{build_set_and_mset, high_multiset_subset, high_tids_set_subset, multiset_counter, tids_set_counter};
use crate::tokenize::tokenize;

fn tokens_to_bytes(tokens: &[TokenId]) -> Vec<u8> {
    tokens.iter().flat_map(|t| t.to_le_bytes()).collect()
}

fn content_hash(tokens: &[TokenId]) -> ContentHash {
    let bytes = tokens_to_bytes(tokens);
    let digest = blake3::hash(&bytes);
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest.as_bytes()[..16]);
    out
}

struct PendingRule {
    record: RuleRecord,
    token_strings: Vec<String>,
}

/// Builds a [`LicenseIndex`] from a stream of [`RuleRecord`]s.
pub struct IndexBuilder {
    pending: Vec<PendingRule>,
    ranked_common_tokens: Vec<&'static str>,
    with_fragments: bool,
    frozen: bool,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            ranked_common_tokens: dictionary::default_ranked_common_tokens().to_vec(),
            with_fragments: false,
            frozen: false,
        }
    }

    /// Replace the default common-tokens ranking used to seed the junk
    /// partition (see [`crate::dictionary`]).
    pub fn with_common_tokens(mut self, ranked: Vec<&'static str>) -> Self {
        self.ranked_common_tokens = ranked;
        self
    }

    /// Enable the optional-fragment automaton (off by default: most
    /// callers don't supply fragment rules, and building it is wasted
    /// work when they don't).
    pub fn with_fragments(mut self, enabled: bool) -> Self {
        self.with_fragments = enabled;
        self
    }

    pub fn add_rule(&mut self, rule: RuleRecord) -> Result<(), BuildError> {
        if self.frozen {
            return Err(BuildError::IndexFrozen);
        }
        let token_strings = tokenize(&rule.text);
        self.pending.push(PendingRule {
            record: rule,
            token_strings,
        });
        Ok(())
    }

    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = RuleRecord>) -> Result<(), BuildError> {
        for rule in rules {
            self.add_rule(rule)?;
        }
        Ok(())
    }

    pub fn build(mut self) -> Result<LicenseIndex, BuildError> {
        if self.frozen {
            return Err(BuildError::IndexFrozen);
        }
        self.frozen = true;

        // Pass 1: intern every rule token into a provisional, frequency-counted
        // dictionary, and mark SPDX-expression-bearing rule tokens as never-junk
        // (a SPDX license key must never be swallowed by junk renumbering even
        // if it happens to be very frequent in the corpus).
        let mut provisional = ProvisionalDictionary::new();
        let mut provisional_ids: Vec<Vec<TokenId>> = Vec::with_capacity(self.pending.len());
        for pending in &self.pending {
            let ids: Vec<TokenId> = pending.token_strings.iter().map(|t| provisional.intern(t)).collect();
            provisional_ids.push(ids);
        }

        let n_provisional = provisional_ids.iter().flatten().map(|&id| id as usize + 1).max().unwrap_or(0);
        if n_provisional > MAX_TOKENS {
            return Err(BuildError::TokenLimitExceeded {
                found: n_provisional,
                limit: MAX_TOKENS,
            });
        }

        // A rule of length 1 is identified entirely by its single token, so
        // that token must never be swallowed by junk renumbering (invariant
        // 4): force it into the never-junk set regardless of frequency.
        let mut never_junk = vec![false; n_provisional.max(1)];
        for ids in &provisional_ids {
            if let [only] = ids[..] {
                never_junk[only as usize] = true;
            }
        }
        let renumbered = dictionary::renumber(&provisional, &never_junk, &self.ranked_common_tokens);
        let dictionary = renumbered.dictionary;
        let len_junk = dictionary.len_junk();

        let mut too_long = None;
        let mut tids_by_rid: Vec<Vec<TokenId>> = Vec::with_capacity(self.pending.len());
        for (rid, ids) in provisional_ids.into_iter().enumerate() {
            if ids.len() > u16::MAX as usize {
                too_long = Some((self.pending[rid].record.identifier.clone(), ids.len()));
                break;
            }
            let remapped: Vec<TokenId> = ids.iter().map(|&old| renumbered.old_to_new[old as usize]).collect();
            tids_by_rid.push(remapped);
        }
        if let Some((identifier, len)) = too_long {
            return Err(BuildError::RuleTooLong(identifier, len));
        }

        let mut rid_by_hash: HashMap<ContentHash, Rid> = HashMap::new();
        let mut duplicate_identifiers: Vec<String> = Vec::new();
        let mut rules_by_rid: Vec<Rule> = Vec::with_capacity(self.pending.len());
        let mut sets_by_rid: HashMap<Rid, HashSet<TokenId>> = HashMap::new();
        let mut msets_by_rid: HashMap<Rid, HashMap<TokenId, usize>> = HashMap::new();
        let mut high_postings_by_rid: HashMap<Rid, HashMap<TokenId, Vec<u32>>> = HashMap::new();

        let mut regular_rids = BitSet::new();
        let mut false_positive_rids = BitSet::new();
        let mut negative_rids = BitSet::new();
        let mut approx_matchable_rids = BitSet::new();

        let mut rules_automaton_patterns: Vec<Vec<u8>> = Vec::with_capacity(self.pending.len());
        let mut rules_pattern_id_to_rid: Vec<Rid> = Vec::with_capacity(self.pending.len());
        let mut negative_automaton_patterns: Vec<Vec<u8>> = Vec::new();
        let mut negative_pattern_id_to_rid: Vec<Rid> = Vec::new();

        for (rid, pending) in self.pending.iter().enumerate() {
            let record = &pending.record;
            let token_ids = &tids_by_rid[rid];
            let length = token_ids.len();

            let hash = content_hash(token_ids);
            if !record.is_negative {
                if let Some(&existing) = rid_by_hash.get(&hash) {
                    duplicate_identifiers.push(self.pending[existing].record.identifier.clone());
                    duplicate_identifiers.push(record.identifier.clone());
                } else {
                    rid_by_hash.insert(hash, rid);
                }
            }

            if record.is_negative {
                negative_rids.insert(rid);
                negative_automaton_patterns.push(tokens_to_bytes(token_ids));
                negative_pattern_id_to_rid.push(rid);
            } else {
                rules_automaton_patterns.push(tokens_to_bytes(token_ids));
                rules_pattern_id_to_rid.push(rid);
                if record.is_false_positive {
                    false_positive_rids.insert(rid);
                } else {
                    regular_rids.insert(rid);
                }
            }

            let (tids_set, mset) = build_set_and_mset(token_ids);
            let high_set = high_tids_set_subset(&tids_set, len_junk);
            let high_mset = high_multiset_subset(&mset, len_junk);

            let length_unique = tids_set_counter(&tids_set);
            let high_length_unique = tids_set_counter(&high_set);
            let high_length = multiset_counter(&high_mset);

            let (minimum_coverage, min_matched_length, min_high_matched_length) =
                compute_thresholds_occurrences(record.minimum_coverage, length, high_length);
            let (min_matched_length_unique, min_high_matched_length_unique) =
                compute_thresholds_unique(minimum_coverage, length, length_unique, high_length_unique);

            let is_approx_matchable = !record.is_negative && !record.is_false_positive && high_length_unique > 0;

            if is_approx_matchable {
                approx_matchable_rids.insert(rid);
                sets_by_rid.insert(rid, tids_set);
                msets_by_rid.insert(rid, mset);

                let mut postings: HashMap<TokenId, Vec<u32>> = HashMap::new();
                for (pos, &tid) in token_ids.iter().enumerate() {
                    if (tid as usize) >= len_junk {
                        postings.entry(tid).or_default().push(pos as u32);
                    }
                }
                if !postings.is_empty() {
                    high_postings_by_rid.insert(rid, postings);
                }
            }

            rules_by_rid.push(Rule {
                rid,
                identifier: record.identifier.clone(),
                license_expression: record.license_expression.clone(),
                is_negative: record.is_negative,
                is_false_positive: record.is_false_positive,
                relevance: record.relevance,
                minimum_coverage,
                length,
                length_unique,
                high_length,
                high_length_unique,
                min_matched_length,
                min_high_matched_length,
                min_matched_length_unique,
                min_high_matched_length_unique,
                is_approx_matchable,
            });
        }

        if !duplicate_identifiers.is_empty() {
            duplicate_identifiers.sort();
            duplicate_identifiers.dedup();
            return Err(BuildError::DuplicateRule(duplicate_identifiers));
        }

        let pattern_id_to_rid = rules_pattern_id_to_rid;
        let rules_automaton = build_automaton(&rules_automaton_patterns)?;
        let negative_automaton = build_automaton(&negative_automaton_patterns)?;

        let (fragments_automaton, fragments_pattern_id_to_rid) = if self.with_fragments {
            (Some(build_automaton(&[])?), Vec::new())
        } else {
            (None, Vec::new())
        };

        log::info!(
            "built index: {} rules ({} regular, {} false-positive, {} negative, {} approx-matchable), {} tokens ({} junk)",
            rules_by_rid.len(),
            regular_rids.len(),
            false_positive_rids.len(),
            negative_rids.len(),
            approx_matchable_rids.len(),
            dictionary.len(),
            len_junk,
        );

        Ok(LicenseIndex {
            dictionary,
            rules_by_rid,
            tids_by_rid,
            rid_by_hash,
            rules_automaton,
            pattern_id_to_rid,
            negative_automaton,
            negative_pattern_id_to_rid,
            fragments_automaton,
            fragments_pattern_id_to_rid,
            sets_by_rid,
            msets_by_rid,
            high_postings_by_rid,
            regular_rids,
            false_positive_rids,
            negative_rids,
            approx_matchable_rids,
        })
    }
}

fn build_automaton(patterns: &[Vec<u8>]) -> Result<AhoCorasick, BuildError> {
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostFirst)
        .build(patterns)
        .map_err(|_| BuildError::TokenLimitExceeded {
            found: patterns.len(),
            limit: MAX_TOKENS,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_empty_index() {
        let index = IndexBuilder::new().build().expect("empty index builds");
        assert_eq!(index.rule_count(), 0);
    }

    #[test]
    fn build_single_rule_indexes_hash_and_sets() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new("mit_1", "Permission is hereby granted, free of charge", "mit"))
            .unwrap();
        let index = builder.build().unwrap();
        assert_eq!(index.rule_count(), 1);
        assert!(index.regular_rids.contains(0));
        let tokens = index.tokens_for(0).unwrap();
        assert!(index.rid_for_hash(&content_hash(tokens)).is_some());
    }

    #[test]
    fn false_positive_rules_are_not_hash_or_approx_indexed() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new("fp_1", "copyright notice", "mit").false_positive(true))
            .unwrap();
        let index = builder.build().unwrap();
        assert!(index.false_positive_rids.contains(0));
        assert!(!index.approx_matchable_rids.contains(0));
        assert!(!index.regular_rids.contains(0));
    }

    #[test]
    fn duplicate_rule_content_is_rejected() {
        let mut builder = IndexBuilder::new();
        builder.add_rule(RuleRecord::new("a", "mit license text here", "mit")).unwrap();
        builder.add_rule(RuleRecord::new("b", "mit license text here", "mit")).unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, BuildError::DuplicateRule(_)));
    }

    #[test]
    fn single_token_rule_with_a_high_token_is_approx_matchable() {
        // Invariant 5 excludes only rules whose every token is junk; a
        // one-token rule is never-junk (invariant 4), so it clears the gate
        // regardless of its short length.
        let mut builder = IndexBuilder::new();
        builder.add_rule(RuleRecord::new("tiny", "mit", "mit")).unwrap();
        let index = builder.build().unwrap();
        assert!(index.approx_matchable_rids.contains(0));
    }

    #[test]
    fn negative_rule_tokens_are_absent_from_the_main_automaton() {
        let mut builder = IndexBuilder::new();
        builder
            .add_rule(RuleRecord::new("neg_1", "all rights reserved", "mit").negative(true))
            .unwrap();
        let index = builder.build().unwrap();
        assert!(index.pattern_id_to_rid.is_empty());
        assert_eq!(index.negative_pattern_id_to_rid, vec![0]);
    }

    #[test]
    fn second_build_call_is_rejected() {
        let builder = IndexBuilder::new();
        let builder2 = IndexBuilder::new();
        let _ = builder.build().unwrap();
        let mut b = builder2;
        b.frozen = true;
        assert!(matches!(b.build().unwrap_err(), BuildError::IndexFrozen));
    }

    #[test]
    fn add_rule_after_freeze_is_rejected() {
        let mut builder = IndexBuilder::new();
        builder.frozen = true;
        let err = builder.add_rule(RuleRecord::new("x", "text", "mit")).unwrap_err();
        assert!(matches!(err, BuildError::IndexFrozen));
    }
}
