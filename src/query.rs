//! Turns input text into a token sequence matchers can consume, and tracks
//! which positions remain available for matching as strategies claim them.

use bit_set::BitSet;

use crate::dictionary::{TokenDictionary, TokenId};
use crate::spans::Span;
use crate::tokenize::{is_digit_only, tokenize_with_lines};

/// Sentinel id for a token string never seen while building the index.
pub const UNKNOWN_TOKEN: TokenId = TokenId::MAX;

/// A run of unknown tokens this long splits the query into separate runs;
/// a gap that size is unlikely to be a typo inside a single license block.
pub const MAX_GAP_TOKENS: usize = 10;

/// A run of digit-only tokens (version numbers, serials, dates) this long
/// splits the query the same way an unknown-token gap does.
pub const MAX_DIGIT_RUN_TOKENS: usize = MAX_GAP_TOKENS;

/// A jump in source line number at least this large splits the query,
/// treating text as a plain-text document. There is no caller-supplied
/// signal in this crate to classify input as binary, so the higher
/// `bin_line_threshold` from the reference implementation is unreachable
/// here and this single threshold is applied uniformly.
pub const TEXT_LINE_THRESHOLD: usize = 15;

/// A contiguous slice of a [`Query`]'s tokens, treated as a matching unit.
///
/// Runs are split at long stretches of unknown tokens so a strategy
/// scanning one run never has to reason about an unrelated block of text
/// in between two license mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRun {
    pub start: usize,
    /// Exclusive.
    pub end: usize,
}

impl QueryRun {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A tokenized query. Tokenization happens once; the `matchable` bitset is
/// the single shared piece of mutable state every strategy subtracts from
/// as it claims query positions, so later strategies never reconsider text
/// an earlier, higher-priority strategy already accounted for.
pub struct Query {
    tokens: Vec<TokenId>,
    lines: Vec<usize>,
    original_tokens: Vec<String>,
    matchable: BitSet,
    /// Positions whose token is good/high (non-junk). Static for the life
    /// of the query — subtracting a span only clears `matchable`.
    high: BitSet,
    runs: Vec<QueryRun>,
}

impl Query {
    pub fn tokenize(text: &str, dictionary: &TokenDictionary) -> Self {
        let positioned = tokenize_with_lines(text);

        let mut tokens = Vec::with_capacity(positioned.len());
        let mut lines = Vec::with_capacity(positioned.len());
        let mut original_tokens = Vec::with_capacity(positioned.len());

        for pt in &positioned {
            let tid = dictionary.id_for(&pt.text).unwrap_or(UNKNOWN_TOKEN);
            tokens.push(tid);
            lines.push(pt.line);
            original_tokens.push(pt.text.clone());
        }

        let len_junk = dictionary.len_junk();
        let mut matchable = BitSet::with_capacity(tokens.len());
        let mut high = BitSet::with_capacity(tokens.len());
        for (pos, &tid) in tokens.iter().enumerate() {
            if tid != UNKNOWN_TOKEN {
                matchable.insert(pos);
                if (tid as usize) >= len_junk {
                    high.insert(pos);
                }
            }
        }

        let runs = split_runs(&tokens, &original_tokens, &lines);

        Self {
            tokens,
            lines,
            original_tokens,
            matchable,
            high,
            runs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn runs(&self) -> &[QueryRun] {
        &self.runs
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    pub fn run_tokens(&self, run: &QueryRun) -> &[TokenId] {
        &self.tokens[run.start..run.end]
    }

    /// Positions within `run` that have not yet been claimed by an
    /// earlier, higher-priority strategy.
    pub fn matchable_positions_in(&self, run: &QueryRun) -> Vec<usize> {
        (run.start..run.end).filter(|&p| self.matchable.contains(p)).collect()
    }

    pub fn is_matchable(&self, pos: usize) -> bool {
        self.matchable.contains(pos)
    }

    pub fn run_is_exhausted(&self, run: &QueryRun) -> bool {
        (run.start..run.end).all(|p| !self.matchable.contains(p))
    }

    /// True iff no matchable position remains in `run` under a strategy's
    /// `include_low` flag: when `include_low` is false (approximate
    /// matching, which needs at least one high-token seed), a run with
    /// only junk tokens still unclaimed counts as exhausted.
    pub fn run_is_exhausted_under(&self, run: &QueryRun, include_low: bool) -> bool {
        !(run.start..run.end).any(|p| self.matchable.contains(p) && (include_low || self.high.contains(p)))
    }

    pub fn run_is_fully_matchable(&self, run: &QueryRun) -> bool {
        (run.start..run.end).all(|p| self.matchable.contains(p))
    }

    pub fn any_matchable(&self) -> bool {
        !self.matchable.is_empty()
    }

    /// Remove every position in `span` from the matchable set — called
    /// after a strategy accepts a match, so subsequent strategies skip it.
    pub fn subtract(&mut self, span: &Span) {
        for pos in span.iter() {
            self.matchable.remove(pos);
        }
    }

    pub fn line_for_pos(&self, pos: usize) -> Option<usize> {
        self.lines.get(pos).copied()
    }

    pub fn matched_text(&self, start: usize, end: usize) -> String {
        self.original_tokens
            .get(start..end.min(self.original_tokens.len()))
            .map(|slice| slice.join(" "))
            .unwrap_or_default()
    }
}

/// Split a token sequence into runs at three points (spec.md §4.4): gaps of
/// `MAX_GAP_TOKENS` or more consecutive unknown tokens, runs of
/// `MAX_DIGIT_RUN_TOKENS` or more consecutive digit-only tokens, and a jump
/// in source line number of `TEXT_LINE_THRESHOLD` or more between adjacent
/// tokens.
fn split_runs(tokens: &[TokenId], original_tokens: &[String], lines: &[usize]) -> Vec<QueryRun> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut runs = Vec::new();
    let mut run_start = 0usize;
    let mut unknown_start: Option<usize> = None;
    let mut digit_start: Option<usize> = None;

    for pos in 0..tokens.len() {
        let is_unknown = tokens[pos] == UNKNOWN_TOKEN;
        let is_digit = original_tokens.get(pos).map(|t| is_digit_only(t)).unwrap_or(false);

        if is_unknown {
            unknown_start.get_or_insert(pos);
        } else {
            unknown_start = None;
        }
        if is_digit {
            digit_start.get_or_insert(pos);
        } else {
            digit_start = None;
        }

        let unknown_run_len = unknown_start.map(|s| pos - s + 1).unwrap_or(0);
        let digit_run_len = digit_start.map(|s| pos - s + 1).unwrap_or(0);
        let line_gap = if pos > 0 { lines[pos].saturating_sub(lines[pos - 1]) } else { 0 };

        let gap_split_at = if unknown_run_len >= MAX_GAP_TOKENS {
            unknown_start
        } else if digit_run_len >= MAX_GAP_TOKENS {
            digit_start
        } else {
            None
        };

        let split_at = gap_split_at.or(if line_gap >= TEXT_LINE_THRESHOLD { Some(pos) } else { None });

        if let Some(split_at) = split_at {
            if split_at > run_start {
                runs.push(QueryRun { start: run_start, end: split_at });
            }
            run_start = if gap_split_at.is_some() { pos + 1 } else { pos };
            unknown_start = None;
            digit_start = None;
        }
    }

    if run_start < tokens.len() {
        runs.push(QueryRun { start: run_start, end: tokens.len() });
    }

    runs
}
