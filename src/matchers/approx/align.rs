//! Local sequence alignment between a query run and one candidate rule.
//!
//! Implemented as seed-extend-chain: anchor on shared high/good token
//! positions (seeds), chain seeds that advance monotonically and without
//! skewing too far apart in the query vs. the rule, pick the
//! highest-weight chain via a small DP, then fill the gaps between
//! consecutive chained seeds with a greedy token-by-token walk so the
//! final span reflects what was actually matched rather than an
//! optimistic first-seed-to-last-seed range.

use std::collections::HashSet;

use crate::dictionary::TokenId;
use crate::index::LicenseIndex;
use crate::models::{LicenseMatch, MatcherKind};
use crate::query::{Query, QueryRun};
use crate::rule::Rid;
use crate::spans::Span;
use crate::tokenize::is_digit_only;

/// Maximum allowed gap, in tokens, between two chained seeds on either
/// side (query or rule) before they're considered unrelated.
pub const MAX_DIST: usize = 21;

/// Maximum allowed skew between the query-side and rule-side gap of two
/// chained seeds — two seeds 20 tokens apart in the query but 2 apart in
/// the rule aren't a plausible continuation of the same text, even though
/// both individual gaps clear `MAX_DIST`. No explicit value is given by
/// the reference behavior this is grounded on; chosen conservatively.
const MAX_SKEW: usize = 5;

/// Cost charged per token of combined query/rule gap when scoring a
/// chain extension, so that a chain preferring fewer, tighter gaps beats
/// one spanning the same seeds more loosely. Chosen conservatively in the
/// absence of an explicit reference value.
const GAP_PENALTY: f32 = 0.05;

struct Seed {
    qpos: usize,
    rpos: usize,
}

fn collect_seeds(index: &LicenseIndex, query: &Query, run: &QueryRun, rid: Rid, start_offset: usize) -> Vec<Seed> {
    let Some(postings) = index.high_postings_by_rid.get(&rid) else {
        return Vec::new();
    };

    let scan_start = run.start.max(start_offset);
    let mut seeds = Vec::new();
    for qpos in scan_start..run.end {
        if !query.is_matchable(qpos) {
            continue;
        }
        let tid = query.tokens()[qpos];
        if let Some(rpositions) = postings.get(&tid) {
            for &rpos in rpositions {
                seeds.push(Seed { qpos, rpos: rpos as usize });
            }
        }
    }
    seeds.sort_by_key(|s| s.qpos);
    seeds
}

/// Highest-weight chain of seeds monotonically increasing in both
/// coordinates, with each step within `MAX_DIST` on both axes and within
/// `MAX_SKEW` of each other. Weight is high-token count minus a penalty
/// for the gap each step introduces, so a tighter chain outscores a
/// looser one covering the same seeds. Returns the chain as indices into
/// `seeds`, in order.
fn longest_chain(seeds: &[Seed]) -> Vec<usize> {
    if seeds.is_empty() {
        return Vec::new();
    }

    let n = seeds.len();
    let mut best_weight = vec![1.0f32; n];
    let mut prev = vec![None; n];

    for i in 0..n {
        for j in 0..i {
            if seeds[j].rpos >= seeds[i].rpos {
                continue;
            }
            let qgap = seeds[i].qpos.saturating_sub(seeds[j].qpos);
            let rgap = seeds[i].rpos.saturating_sub(seeds[j].rpos);
            if qgap > MAX_DIST || rgap > MAX_DIST {
                continue;
            }
            let skew = qgap.abs_diff(rgap);
            if skew > MAX_SKEW {
                continue;
            }

            let weight = best_weight[j] + 1.0 - (qgap + rgap) as f32 * GAP_PENALTY;
            if weight > best_weight[i] {
                best_weight[i] = weight;
                prev[i] = Some(j);
            }
        }
    }

    let mut best_end = 0;
    for i in 1..n {
        if best_weight[i] > best_weight[best_end] {
            best_end = i;
        }
    }

    let mut chain = vec![best_end];
    let mut cur = best_end;
    while let Some(p) = prev[cur] {
        chain.push(p);
        cur = p;
    }
    chain.reverse();
    chain
}

/// Greedily fill the gap between two chained seeds by walking both token
/// sequences in lockstep, accepting a position pair only when the tokens
/// agree, and giving up on the remainder of the gap once more than
/// `MAX_DIST / 2` positions in a row fail to agree.
fn fill_gap(query: &Query, rule_tokens: &[TokenId], q1: usize, r1: usize, q2: usize, r2: usize) -> Vec<(usize, usize)> {
    let max_skips = MAX_DIST / 2;
    let mut filled = Vec::new();
    let mut qi = q1 + 1;
    let mut ri = r1 + 1;
    let mut skips = 0usize;

    while qi < q2 && ri < r2 {
        if query.tokens()[qi] == rule_tokens[ri] {
            filled.push((qi, ri));
            qi += 1;
            ri += 1;
        } else {
            skips += 1;
            if skips > max_skips {
                break;
            }
            qi += 1;
            ri += 1;
        }
    }

    filled
}

/// Align `run` against candidate rule `rid`, scanning for seeds starting
/// no earlier than `start_offset`. Returns a match and the query span it
/// claims if the resulting chain clears the rule's own minimum-match
/// thresholds. Callers that want every non-overlapping occurrence of
/// `rid` within a run call this repeatedly, advancing `start_offset` past
/// each returned span's end.
pub fn align(index: &LicenseIndex, query: &Query, run: &QueryRun, rid: Rid, start_offset: usize) -> Option<(LicenseMatch, Span)> {
    let rule = index.rule(rid)?;
    let rule_tokens = index.tokens_for(rid)?;
    let len_junk = index.dictionary().len_junk();

    let seeds = collect_seeds(index, query, run, rid, start_offset);
    let chain = longest_chain(&seeds);
    if chain.is_empty() {
        return None;
    }

    let ordered: Vec<(usize, usize)> = chain.iter().map(|&i| (seeds[i].qpos, seeds[i].rpos)).collect();

    let mut qpositions: HashSet<usize> = HashSet::new();
    let mut ipositions: HashSet<usize> = HashSet::new();
    for &(q, r) in &ordered {
        qpositions.insert(q);
        ipositions.insert(r);
    }
    for pair in ordered.windows(2) {
        let (q1, r1) = pair[0];
        let (q2, r2) = pair[1];
        for (q, r) in fill_gap(query, rule_tokens, q1, r1, q2, r2) {
            qpositions.insert(q);
            ipositions.insert(r);
        }
    }

    let hi_positions: HashSet<usize> = ipositions.iter().copied().filter(|&r| (rule_tokens[r] as usize) >= len_junk).collect();
    if hi_positions.len() < rule.min_high_matched_length.max(1) {
        return None;
    }

    // Digit-only rule tokens (version numbers, serials) contribute no
    // discriminating power and are excluded from coverage, matching how
    // they're excluded from high-token classification during indexing.
    let matched_length = ipositions
        .iter()
        .filter(|&&r| {
            index
                .dictionary()
                .token_for(rule_tokens[r])
                .map(|t| !is_digit_only(t))
                .unwrap_or(true)
        })
        .count();

    let rule_length = rule.length.max(1);
    let match_coverage = (matched_length as f32 / rule_length as f32) * 100.0;

    let required_coverage = rule.minimum_coverage.unwrap_or(0) as f32;
    if match_coverage < required_coverage {
        return None;
    }

    let score = (match_coverage / 100.0) * (rule.relevance as f32 / 100.0);

    let qspan = Span::from_iterator(qpositions.iter().copied());
    let ispan = Span::from_iterator(ipositions.iter().copied());
    let hispan = Span::from_iterator(hi_positions.iter().copied());

    let qstart = qspan.start().unwrap_or(0);
    let qend = qspan.end().unwrap_or(qstart);

    let start_line = query.line_for_pos(qstart).unwrap_or(1);
    let end_line = query.line_for_pos(qend.saturating_sub(1).max(qstart)).unwrap_or(start_line);

    let license_match = LicenseMatch {
        rule_id: rid,
        qspan: qspan.clone(),
        ispan,
        hispan,
        license_expression: rule.license_expression.clone(),
        start_line,
        end_line,
        matcher: MatcherKind::Approximate,
        score,
        matched_length,
        match_coverage,
        rule_relevance: rule.relevance,
        rule_identifier: rule.identifier.clone(),
        matched_text: Some(query.matched_text(qstart, qend)),
    };

    Some((license_match, qspan))
}
