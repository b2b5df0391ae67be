//! On-disk persistence for a built [`LicenseIndex`].
//!
//! Building an index re-tokenizes every rule and rebuilds two Aho-Corasick
//! automatons, which is too slow to redo on every process start for a
//! large rule set. The persisted format captures everything except the
//! automatons themselves (serializing compiled automaton state is brittle
//! across aho-corasick versions); automatons are rebuilt from the stored
//! token sequences on load, which is much cheaper than re-tokenizing text.

use std::collections::HashMap;

use aho_corasick::{AhoCorasickBuilder, MatchKind};
use bit_set::BitSet;
use serde::{Deserialize, Serialize};

use crate::dictionary::{TokenDictionary, TokenId};
use crate::error::BuildError;
use crate::index::{ContentHash, LicenseIndex};
use crate::rule::{Rid, Rule};

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    token_strings: Vec<String>,
    len_junk: usize,
    rules_by_rid: Vec<Rule>,
    tids_by_rid: Vec<Vec<TokenId>>,
    rid_by_hash: Vec<(ContentHash, Rid)>,
    sets_by_rid: Vec<(Rid, Vec<TokenId>)>,
    msets_by_rid: Vec<(Rid, Vec<(TokenId, usize)>)>,
    high_postings_by_rid: Vec<(Rid, Vec<(TokenId, Vec<u32>)>)>,
    regular_rids: Vec<usize>,
    false_positive_rids: Vec<usize>,
    negative_rids: Vec<usize>,
    approx_matchable_rids: Vec<usize>,
}

fn bitset_to_vec(set: &BitSet) -> Vec<usize> {
    set.iter().collect()
}

fn vec_to_bitset(values: &[usize]) -> BitSet {
    let mut set = BitSet::new();
    for &v in values {
        set.insert(v);
    }
    set
}

fn tokens_to_bytes(tokens: &[TokenId]) -> Vec<u8> {
    tokens.iter().flat_map(|t| t.to_le_bytes()).collect()
}

fn rebuild_automaton(patterns: &[Vec<u8>]) -> Result<aho_corasick::AhoCorasick, BuildError> {
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostFirst)
        .build(patterns)
        .map_err(|_| BuildError::TokenLimitExceeded {
            found: patterns.len(),
            limit: crate::dictionary::MAX_TOKENS,
        })
}

impl LicenseIndex {
    /// Serialize this index to a zstd-compressed bincode blob.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let token_strings: Vec<String> = (0..self.dictionary.len() as TokenId)
            .map(|id| self.dictionary.token_for(id).unwrap_or_default().to_string())
            .collect();

        // HashMap iteration order is not guaranteed stable across builds
        // (RandomState), so every map-derived field below is sorted by a
        // deterministic key before being collected into the persisted
        // Vec — otherwise two builds from identical input could legally
        // serialize to different byte sequences.
        let mut rid_by_hash: Vec<(ContentHash, Rid)> = self.rid_by_hash.iter().map(|(h, r)| (*h, *r)).collect();
        rid_by_hash.sort_by_key(|(hash, rid)| (*rid, *hash));

        let mut sets_by_rid: Vec<(Rid, Vec<TokenId>)> = self
            .sets_by_rid
            .iter()
            .map(|(rid, set)| {
                let mut tids: Vec<TokenId> = set.iter().copied().collect();
                tids.sort_unstable();
                (*rid, tids)
            })
            .collect();
        sets_by_rid.sort_by_key(|(rid, _)| *rid);

        let mut msets_by_rid: Vec<(Rid, Vec<(TokenId, usize)>)> = self
            .msets_by_rid
            .iter()
            .map(|(rid, mset)| {
                let mut entries: Vec<(TokenId, usize)> = mset.iter().map(|(&k, &v)| (k, v)).collect();
                entries.sort_by_key(|(tid, _)| *tid);
                (*rid, entries)
            })
            .collect();
        msets_by_rid.sort_by_key(|(rid, _)| *rid);

        let mut high_postings_by_rid: Vec<(Rid, Vec<(TokenId, Vec<u32>)>)> = self
            .high_postings_by_rid
            .iter()
            .map(|(rid, postings)| {
                let mut entries: Vec<(TokenId, Vec<u32>)> = postings.iter().map(|(&k, v)| (k, v.clone())).collect();
                entries.sort_by_key(|(tid, _)| *tid);
                (*rid, entries)
            })
            .collect();
        high_postings_by_rid.sort_by_key(|(rid, _)| *rid);

        let persisted = PersistedIndex {
            token_strings,
            len_junk: self.dictionary.len_junk(),
            rules_by_rid: self.rules_by_rid.clone(),
            tids_by_rid: self.tids_by_rid.clone(),
            rid_by_hash,
            sets_by_rid,
            msets_by_rid,
            high_postings_by_rid,
            regular_rids: bitset_to_vec(&self.regular_rids),
            false_positive_rids: bitset_to_vec(&self.false_positive_rids),
            negative_rids: bitset_to_vec(&self.negative_rids),
            approx_matchable_rids: bitset_to_vec(&self.approx_matchable_rids),
        };

        let encoded = bincode::serde::encode_to_vec(&persisted, bincode::config::standard())?;
        let compressed = zstd::encode_all(encoded.as_slice(), 0)?;
        Ok(compressed)
    }

    /// Reconstruct an index previously written by [`to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let decompressed = zstd::decode_all(bytes)?;
        let (persisted, _): (PersistedIndex, usize) =
            bincode::serde::decode_from_slice(&decompressed, bincode::config::standard())?;

        let dictionary = TokenDictionary::rebuild(persisted.token_strings, persisted.len_junk);

        let mut rid_by_hash = HashMap::new();
        for (hash, rid) in persisted.rid_by_hash {
            rid_by_hash.insert(hash, rid);
        }

        let mut sets_by_rid = HashMap::new();
        for (rid, tids) in persisted.sets_by_rid {
            sets_by_rid.insert(rid, tids.into_iter().collect());
        }

        let mut msets_by_rid = HashMap::new();
        for (rid, entries) in persisted.msets_by_rid {
            msets_by_rid.insert(rid, entries.into_iter().collect());
        }

        let mut high_postings_by_rid = HashMap::new();
        for (rid, entries) in persisted.high_postings_by_rid {
            high_postings_by_rid.insert(rid, entries.into_iter().collect());
        }

        let negative_rids = vec_to_bitset(&persisted.negative_rids);

        // Negative rules are excluded from the main automaton entirely —
        // they live only in the negative automaton — so pattern index and
        // rid diverge and must be tracked explicitly, not assumed identity.
        let mut rules_automaton_patterns: Vec<Vec<u8>> = Vec::new();
        let mut pattern_id_to_rid: Vec<Rid> = Vec::new();
        for (rid, tokens) in persisted.tids_by_rid.iter().enumerate() {
            if negative_rids.contains(rid) {
                continue;
            }
            rules_automaton_patterns.push(tokens_to_bytes(tokens));
            pattern_id_to_rid.push(rid);
        }
        let rules_automaton = rebuild_automaton(&rules_automaton_patterns)?;

        let negative_automaton_patterns: Vec<Vec<u8>> = negative_rids
            .iter()
            .filter_map(|rid| persisted.tids_by_rid.get(rid))
            .map(|t| tokens_to_bytes(t))
            .collect();
        let negative_pattern_id_to_rid: Vec<Rid> = negative_rids.iter().collect();
        let negative_automaton = rebuild_automaton(&negative_automaton_patterns)?;

        Ok(LicenseIndex {
            dictionary,
            rules_by_rid: persisted.rules_by_rid,
            tids_by_rid: persisted.tids_by_rid,
            rid_by_hash,
            rules_automaton,
            pattern_id_to_rid,
            negative_automaton,
            negative_pattern_id_to_rid,
            fragments_automaton: None,
            fragments_pattern_id_to_rid: Vec::new(),
            sets_by_rid,
            msets_by_rid,
            high_postings_by_rid,
            regular_rids: vec_to_bitset(&persisted.regular_rids),
            false_positive_rids: vec_to_bitset(&persisted.false_positive_rids),
            negative_rids,
            approx_matchable_rids: vec_to_bitset(&persisted.approx_matchable_rids),
        })
    }
}
