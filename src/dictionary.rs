//! The token dictionary and its frequency-driven junk/good renumbering.
//!
//! Every distinct token string observed across all rules is assigned a
//! stable numeric id. Ids below `len_junk` are "junk" (common, low
//! discriminating power); ids at or above `len_junk` are "good"/"high"
//! tokens. Renumbering happens once, at build time, driven by a two-pass
//! process: count frequencies across all rule text, then assign junk
//! status to a bounded prefix of the frequency-sorted ids before
//! renumbering everything by `(is_good, -frequency, old_id)`.

use std::collections::HashMap;

use crate::common_tokens;

pub type TokenId = u16;

/// Hard cap on distinct tokens a dictionary can hold; ids are `u16`.
pub const MAX_TOKENS: usize = u16::MAX as usize - 1;

/// Fraction of the vocabulary eligible to be marked junk, at most.
const PROPORTION_OF_JUNK: f64 = 0.7;

/// The built, immutable token vocabulary: string <-> id, plus the junk
/// boundary.
#[derive(Debug, Clone, Default)]
pub struct TokenDictionary {
    by_id: Vec<String>,
    by_token: HashMap<String, TokenId>,
    len_junk: usize,
}

impl TokenDictionary {
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn len_junk(&self) -> usize {
        self.len_junk
    }

    pub fn is_junk(&self, tid: TokenId) -> bool {
        (tid as usize) < self.len_junk
    }

    pub fn token_for(&self, tid: TokenId) -> Option<&str> {
        self.by_id.get(tid as usize).map(|s| s.as_str())
    }

    pub fn id_for(&self, token: &str) -> Option<TokenId> {
        self.by_token.get(token).copied()
    }

    /// Map a sequence of token strings to ids, dropping any that were
    /// never observed during the build pass (this only happens for
    /// query-time text against a frozen dictionary).
    pub fn map_known(&self, tokens: &[String]) -> Vec<TokenId> {
        tokens.iter().filter_map(|t| self.id_for(t)).collect()
    }

    /// Reconstruct a dictionary from its persisted id-ordered token list
    /// and junk boundary. Used only by [`crate::index::persist`].
    pub(crate) fn rebuild(by_id: Vec<String>, len_junk: usize) -> Self {
        let by_token = by_id
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as TokenId))
            .collect();
        Self {
            by_id,
            by_token,
            len_junk,
        }
    }
}

/// A single rule's token sequence during the build's first pass, keyed by
/// a provisional (insertion-order) token id.
pub(crate) struct ProvisionalDictionary {
    by_id: Vec<String>,
    by_token: HashMap<String, TokenId>,
    frequencies: Vec<u64>,
}

impl ProvisionalDictionary {
    pub(crate) fn new() -> Self {
        Self {
            by_id: Vec::new(),
            by_token: HashMap::new(),
            frequencies: Vec::new(),
        }
    }

    /// Intern a token, bumping its frequency count, and return its
    /// provisional id.
    pub(crate) fn intern(&mut self, token: &str) -> TokenId {
        if let Some(&id) = self.by_token.get(token) {
            self.frequencies[id as usize] += 1;
            return id;
        }
        let id = self.by_id.len() as TokenId;
        self.by_id.push(token.to_string());
        self.by_token.insert(token.to_string(), id);
        self.frequencies.push(1);
        id
    }
}

/// Result of renumbering: the frozen dictionary plus the provisional-id to
/// final-id permutation, so callers can remap already-tokenized rule
/// sequences in place.
pub(crate) struct Renumbered {
    pub dictionary: TokenDictionary,
    pub old_to_new: Vec<TokenId>,
}

/// Renumber a provisional dictionary into its frozen, junk-partitioned
/// form.
///
/// `never_junk` holds provisional ids (e.g. SPDX license-key tokens) that
/// must never be classified as junk regardless of frequency; it is
/// computed by the caller before this runs, from the full set of rules,
/// since junk-seeding below consults it at every step.
///
/// Order of operations mirrors the reference renumbering algorithm:
/// never-junk is fixed first, then junk candidates are seeded from
/// single-character/digit tokens, then from the ranked common-token list,
/// up to `floor(n_tokens * PROPORTION_OF_JUNK)`; everything else is good.
/// The final id order is `(is_good, -frequency, provisional_id)` so that
/// within each partition, more frequent tokens sort first.
pub(crate) fn renumber(
    provisional: &ProvisionalDictionary,
    never_junk: &[bool],
    ranked_common_tokens: &[&str],
) -> Renumbered {
    let n_tokens = provisional.by_id.len();
    let max_junk = ((n_tokens as f64) * PROPORTION_OF_JUNK).floor() as usize;

    let mut is_junk = vec![false; n_tokens];

    // Seed junk from single-char/digit tokens first (never overriding
    // never_junk), then widen with the ranked common-token list, in rank
    // order, until we hit max_junk or run out of candidates.
    let mut junk_count = 0usize;
    for (id, token) in provisional.by_id.iter().enumerate() {
        if junk_count >= max_junk {
            break;
        }
        if never_junk[id] {
            continue;
        }
        if crate::tokenize::is_single_char_or_digits(token) {
            is_junk[id] = true;
            junk_count += 1;
        }
    }

    for &common in ranked_common_tokens {
        if junk_count >= max_junk {
            break;
        }
        if let Some(&id) = provisional.by_token.get(common) {
            let id = id as usize;
            if never_junk[id] || is_junk[id] {
                continue;
            }
            is_junk[id] = true;
            junk_count += 1;
        }
    }

    let mut order: Vec<usize> = (0..n_tokens).collect();
    order.sort_by(|&a, &b| {
        let a_good = !is_junk[a];
        let b_good = !is_junk[b];
        a_good
            .cmp(&b_good)
            .then_with(|| provisional.frequencies[b].cmp(&provisional.frequencies[a]))
            .then_with(|| a.cmp(&b))
    });

    let mut old_to_new = vec![0 as TokenId; n_tokens];
    let mut by_id = Vec::with_capacity(n_tokens);
    let mut by_token = HashMap::with_capacity(n_tokens);
    for (new_id, &old_id) in order.iter().enumerate() {
        old_to_new[old_id] = new_id as TokenId;
        let token = provisional.by_id[old_id].clone();
        by_token.insert(token.clone(), new_id as TokenId);
        by_id.push(token);
    }

    let len_junk = is_junk.iter().filter(|&&j| j).count();

    Renumbered {
        dictionary: TokenDictionary {
            by_id,
            by_token,
            len_junk,
        },
        old_to_new,
    }
}

pub(crate) fn default_ranked_common_tokens() -> &'static [&'static str] {
    common_tokens::default_ranked_tokens()
}
