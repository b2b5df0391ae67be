//! S2: `SPDX-License-Identifier:` tag extraction.
//!
//! This strategy looks for the literal SPDX tag prefix (tolerant of
//! comment markers, punctuation, and a handful of common misspellings
//! observed in the wild) and hands whatever follows it on the same line
//! to an [`ExpressionValidator`]. It runs before the token-sequence
//! strategies because an SPDX tag is unambiguous and shouldn't be left to
//! approximate scoring.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::expression::ExpressionValidator;
use crate::models::{LicenseMatch, MatcherKind};
use crate::query::Query;
use crate::rule::NO_RULE;
use crate::spans::Span;

static SPDX_LID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(spd[xz][\-\s]+lin?[cs]en?[sc]es?[\-\s]+identifi?er\s*:? *)").expect("valid SPDX-LID regex"));

static NUGET_SPDX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(https?://licenses\.nuget\.org/?)\s*:? *").expect("valid NuGet SPDX regex"));

fn split_spdx_tag(line: &str) -> Option<(usize, String)> {
    if let Some(captures) = SPDX_LID_PATTERN.captures(line) {
        let matched = captures.get(1)?;
        return Some((matched.end(), line[matched.end()..].to_string()));
    }
    if let Some(captures) = NUGET_SPDX_PATTERN.captures(line) {
        let full = captures.get(0)?;
        return Some((full.end(), line[full.end()..].to_string()));
    }
    None
}

fn clean_expression_text(text: &str) -> String {
    let mut text = text.replace("</a>", "").replace("</p>", "").replace("</div>", "");
    text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    text.trim_matches(|c: char| c.is_ascii_punctuation() && c != '-' && c != '.' && c != '+')
        .trim()
        .to_string()
}

/// Scan every line of the original query text for an SPDX tag, validate
/// the expression that follows, and return one match per line that
/// yields a recognized expression.
pub fn match_query(query: &Query, original_text: &str, validator: &dyn ExpressionValidator) -> Vec<(LicenseMatch, Span)> {
    let mut matches = Vec::new();

    for (line_idx, line) in original_text.lines().enumerate() {
        let line_number = line_idx + 1;
        let Some((_, rest)) = split_spdx_tag(line) else {
            continue;
        };
        let cleaned = clean_expression_text(&rest);
        if cleaned.is_empty() {
            continue;
        }
        let Some(expression) = validator.validate(&cleaned) else {
            continue;
        };

        let positions: Vec<usize> = (0..query.len()).filter(|&p| query.line_for_pos(p) == Some(line_number)).collect();
        if positions.is_empty() {
            continue;
        }
        let span = Span::from_iterator(positions.iter().copied());
        let matched_text = query.matched_text(*positions.first().unwrap(), positions.last().unwrap() + 1);

        matches.push((
            LicenseMatch {
                rule_id: NO_RULE,
                qspan: span.clone(),
                ispan: Span::new(),
                hispan: Span::new(),
                license_expression: expression,
                start_line: line_number,
                end_line: line_number,
                matcher: MatcherKind::Spdx,
                score: 1.0,
                matched_length: positions.len(),
                match_coverage: 100.0,
                rule_relevance: 100,
                rule_identifier: "spdx-license-identifier".to_string(),
                matched_text: Some(matched_text),
            },
            span,
        ));
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::PassthroughValidator;
    use crate::index::builder::IndexBuilder;

    #[test]
    fn extracts_simple_spdx_tag() {
        let index = IndexBuilder::new().build().unwrap();
        let text = "// SPDX-License-Identifier: MIT\nfn main() {}";
        let query = Query::tokenize(text, index.dictionary());
        let matches = match_query(&query, text, &PassthroughValidator);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0.license_expression, "MIT");
        assert_eq!(matches[0].0.start_line, 1);
    }

    #[test]
    fn tolerates_dashes_and_case_variants() {
        let index = IndexBuilder::new().build().unwrap();
        let text = "SPDX License Identifier: Apache-2.0";
        let query = Query::tokenize(text, index.dictionary());
        let matches = match_query(&query, text, &PassthroughValidator);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0.license_expression, "Apache-2.0");
    }

    #[test]
    fn no_tag_yields_no_matches() {
        let index = IndexBuilder::new().build().unwrap();
        let text = "just some ordinary comment";
        let query = Query::tokenize(text, index.dictionary());
        assert!(match_query(&query, text, &PassthroughValidator).is_empty());
    }
}
