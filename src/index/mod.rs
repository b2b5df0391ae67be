//! The frozen, immutable license index: everything a query is matched
//! against.
//!
//! An index is produced once, by [`builder::IndexBuilder`], and never
//! mutated afterward — every method on [`LicenseIndex`] takes `&self`.
//! That split (a separate builder type vs. zero `&mut self` methods on the
//! frozen type) is the compile-time enforcement of "build once, read
//! many" rather than a runtime flag.

pub mod builder;
pub mod persist;

use std::collections::HashMap;

use aho_corasick::AhoCorasick;
use bit_set::BitSet;

use crate::dictionary::{TokenDictionary, TokenId};
use crate::rule::{Rid, Rule};

/// A truncated BLAKE3 digest (128 bits) used as the whole-rule content
/// hash key.
pub type ContentHash = [u8; 16];

/// All data structures required to run the S0-S4 matching pipeline
/// against a query.
#[derive(Debug, Clone)]
pub struct LicenseIndex {
    pub(crate) dictionary: TokenDictionary,

    pub(crate) rules_by_rid: Vec<Rule>,
    pub(crate) tids_by_rid: Vec<Vec<TokenId>>,

    pub(crate) rid_by_hash: HashMap<ContentHash, Rid>,

    /// Exact-match automaton over every regular and false-positive rule's
    /// token sequence, encoded as little-endian `u16` bytes.
    pub(crate) rules_automaton: AhoCorasick,
    /// Automaton pattern index -> rid, since one rid can in principle
    /// contribute more than one pattern in the future; today it's the
    /// identity but the indirection keeps `exact` matcher code stable.
    pub(crate) pattern_id_to_rid: Vec<Rid>,

    /// Negative-rule automaton, run once up front (S0) to subtract
    /// spans that must never contribute to a positive match.
    pub(crate) negative_automaton: AhoCorasick,
    pub(crate) negative_pattern_id_to_rid: Vec<Rid>,

    /// Optional automaton over short, explicitly-optional fragments.
    /// Only populated when [`builder::IndexBuilder::with_fragments`] is
    /// enabled.
    pub(crate) fragments_automaton: Option<AhoCorasick>,
    pub(crate) fragments_pattern_id_to_rid: Vec<Rid>,

    pub(crate) sets_by_rid: HashMap<Rid, std::collections::HashSet<TokenId>>,
    pub(crate) msets_by_rid: HashMap<Rid, HashMap<TokenId, usize>>,
    pub(crate) high_postings_by_rid: HashMap<Rid, HashMap<TokenId, Vec<u32>>>,

    pub(crate) regular_rids: BitSet,
    pub(crate) false_positive_rids: BitSet,
    pub(crate) negative_rids: BitSet,
    pub(crate) approx_matchable_rids: BitSet,
}

impl LicenseIndex {
    pub fn dictionary(&self) -> &TokenDictionary {
        &self.dictionary
    }

    pub fn rule(&self, rid: Rid) -> Option<&Rule> {
        self.rules_by_rid.get(rid)
    }

    pub fn rule_count(&self) -> usize {
        self.rules_by_rid.len()
    }

    pub fn tokens_for(&self, rid: Rid) -> Option<&[TokenId]> {
        self.tids_by_rid.get(rid).map(|v| v.as_slice())
    }

    pub(crate) fn rid_for_hash(&self, hash: &ContentHash) -> Option<Rid> {
        self.rid_by_hash.get(hash).copied()
    }

    pub fn is_approx_matchable(&self, rid: Rid) -> bool {
        self.approx_matchable_rids.contains(rid)
    }

    pub fn is_false_positive(&self, rid: Rid) -> bool {
        self.false_positive_rids.contains(rid)
    }

    pub fn is_negative(&self, rid: Rid) -> bool {
        self.negative_rids.contains(rid)
    }
}
