//! Default common-tokens provider.
//!
//! The token dictionary's junk/good renumbering needs an externally ranked
//! list of common lowercase words, most frequent first, to seed the junk
//! set (see [`crate::dictionary`]). Callers may supply their own ranked
//! list; this module provides a reasonable default drawn from general
//! English word frequency, for when none is supplied.

/// A small frequency-ranked list of common English words, most common first.
///
/// This is a default, not an attempt at a complete frequency table — any
/// ranked list works as long as it is ordered most-to-least common.
pub fn default_ranked_tokens() -> &'static [&'static str] {
    &[
        "the", "of", "and", "to", "in", "a", "is", "that", "for", "on", "with", "as", "this",
        "by", "be", "are", "or", "from", "at", "an", "not", "you", "your", "it", "have", "will",
        "shall", "all", "any", "such", "may", "if", "no", "other", "under", "which", "each",
        "these", "its", "who", "than", "their", "has", "been", "use", "used", "using", "software",
        "code", "source", "file", "files", "work", "works", "rights", "right", "above", "below",
        "following", "provided", "without", "whether", "same", "must", "can", "one", "do", "does",
        "so", "but", "were", "was", "he", "she", "they", "them", "we", "our", "us", "i", "me",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_list_is_ranked_and_lowercase() {
        let tokens = default_ranked_tokens();
        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|t| t.chars().all(|c| c.is_lowercase() || c.is_ascii_digit())));
        assert_eq!(tokens[0], "the");
    }
}
