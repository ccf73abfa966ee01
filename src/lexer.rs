//! Term extraction: word regex plus normalizer callback
//!
//! The lexer numbers every regex match with a 1-based ordinal before the
//! normalizer runs, so dropping a token (stopword-style normalizers) never
//! renumbers the terms around it.

use std::sync::Arc;

use regex::Regex;

use crate::config::Normalizer;
use crate::error::{Result, SquillError};

pub struct Lexer {
    regex: Regex,
    normalizer: Normalizer,
}

impl Lexer {
    /// Compile the word regex and pair it with a normalizer
    ///
    /// Capturing groups are rejected: the excerpt regex built from query
    /// terms is substituted into replacement templates where stray groups
    /// would change match numbering.
    pub fn new(pattern: &str, normalizer: Normalizer) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| SquillError::BadRegex(e.to_string()))?;
        if regex.captures_len() > 1 {
            return Err(SquillError::BadRegex(
                "word regex must not contain capturing groups".to_string(),
            ));
        }
        Ok(Self { regex, normalizer })
    }

    /// Lazily yield `(ordinal, normalized_term)` for each kept token
    pub fn terms<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (u32, String)> + 'a {
        self.regex.find_iter(text).enumerate().filter_map(move |(i, m)| {
            let normalized = (self.normalizer)(m.as_str());
            if normalized.is_empty() {
                None
            } else {
                Some((i as u32 + 1, normalized))
            }
        })
    }

    /// Raw matched tokens, un-normalized
    pub fn surface_tokens<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.regex.find_iter(text).map(|m| m.as_str()).collect()
    }

    /// Run the configured normalizer on a single term
    pub fn normalize(&self, term: &str) -> String {
        (self.normalizer)(term)
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl std::fmt::Debug for Lexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("pattern", &self.regex.as_str())
            .finish_non_exhaustive()
    }
}

/// Lowercase and fold Latin-1 accented characters to their ASCII base
pub fn latin1_fold(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars().flat_map(|c| c.to_lowercase()) {
        match ch {
            'à'..='å' => out.push('a'),
            'æ' => out.push_str("ae"),
            'ç' => out.push('c'),
            'è'..='ë' => out.push('e'),
            'ì'..='ï' => out.push('i'),
            'ñ' => out.push('n'),
            'ò'..='ö' | 'ø' => out.push('o'),
            'ù'..='ü' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'ß' => out.push_str("ss"),
            _ => out.push(ch),
        }
    }
    out
}

/// The default normalizer: [`latin1_fold`]
pub fn default_normalizer() -> Normalizer {
    Arc::new(|term| latin1_fold(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_lexer() -> Lexer {
        Lexer::new(r"\w+", default_normalizer()).unwrap()
    }

    #[test]
    fn test_terms_with_ordinals() {
        let lexer = default_lexer();
        let terms: Vec<_> = lexer.terms("The quick brown Fox").collect();
        assert_eq!(
            terms,
            vec![
                (1, "the".to_string()),
                (2, "quick".to_string()),
                (3, "brown".to_string()),
                (4, "fox".to_string()),
            ]
        );
    }

    #[test]
    fn test_dropped_terms_keep_ordinals_stable() {
        // A normalizer that drops short words must not shift positions
        let normalizer: Normalizer =
            Arc::new(|t| if t.len() <= 3 { String::new() } else { latin1_fold(t) });
        let lexer = Lexer::new(r"\w+", normalizer).unwrap();

        let terms: Vec<_> = lexer.terms("the quick brown fox ran").collect();
        assert_eq!(
            terms,
            vec![(2, "quick".to_string()), (3, "brown".to_string())]
        );
    }

    #[test]
    fn test_latin1_fold() {
        assert_eq!(latin1_fold("Çédille"), "cedille");
        assert_eq!(latin1_fold("naïve"), "naive");
        assert_eq!(latin1_fold("Grüße"), "grusse");
        assert_eq!(latin1_fold("façade"), "facade");
        assert_eq!(latin1_fold("plain"), "plain");
    }

    #[test]
    fn test_surface_tokens() {
        let lexer = default_lexer();
        assert_eq!(
            lexer.surface_tokens("Fox, dogs; birds"),
            vec!["Fox", "dogs", "birds"]
        );
    }

    #[test]
    fn test_capturing_groups_rejected() {
        let err = Lexer::new(r"(\w)\w*", default_normalizer()).unwrap_err();
        assert!(matches!(err, SquillError::BadRegex(_)));

        // Non-capturing groups are fine
        assert!(Lexer::new(r"(?:\w)\w*", default_normalizer()).is_ok());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(Lexer::new(r"[unclosed", default_normalizer()).is_err());
    }
}
