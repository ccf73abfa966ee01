use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lexer::default_normalizer;

/// Normalizer callback applied to every matched token.
///
/// Returning an empty string drops the token (its ordinal is still
/// consumed, so positions of surrounding terms do not shift).
pub type Normalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Default word regex: runs of word characters
pub const DEFAULT_WORD_REGEX: &str = r"\w+";

/// Excerpt extraction settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExcerptConfig {
    /// Context kept around each match, and the merge distance between matches
    pub ctxt_num_chars: usize,
    /// Maximum number of excerpts returned
    pub max_excerpts: usize,
    /// Inserted before each highlighted match
    pub pre_match: String,
    /// Inserted after each highlighted match
    pub post_match: String,
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        Self {
            ctxt_num_chars: 35,
            max_excerpts: 5,
            pre_match: "<b>".to_string(),
            post_match: "</b>".to_string(),
        }
    }
}

/// Where stopwords come from at index initialization
#[derive(Clone, Debug)]
pub enum Stopwords {
    /// Inline list of surface terms
    List(Vec<String>),
    /// File whose contents are tokenized with the word regex
    File(PathBuf),
}

/// Index handle configuration
///
/// The plain settings mirror the on-disk contract; the normalizer is an
/// injected capability and is paired with the word regex in the lexer.
#[derive(Clone)]
pub struct IndexConfig {
    /// Directory holding the three stores
    pub dir: PathBuf,
    /// Open read-write (false: read-only)
    pub write_mode: bool,
    /// Token-matching regex; must not contain capturing groups
    pub word_regex: String,
    /// Term normalizer; empty output drops the term
    pub normalizer: Normalizer,
    /// Stopword source, only accepted in write mode
    pub stopwords: Option<Stopwords>,
    /// Field name this index answers for in field-qualified subqueries
    pub fieldname: Option<String>,
    /// Excerpt extraction settings
    pub excerpt: ExcerptConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            write_mode: false,
            word_regex: DEFAULT_WORD_REGEX.to_string(),
            normalizer: default_normalizer(),
            stopwords: None,
            fieldname: None,
            excerpt: ExcerptConfig::default(),
        }
    }
}

impl fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexConfig")
            .field("dir", &self.dir)
            .field("write_mode", &self.write_mode)
            .field("word_regex", &self.word_regex)
            .field("stopwords", &self.stopwords)
            .field("fieldname", &self.fieldname)
            .field("excerpt", &self.excerpt)
            .finish_non_exhaustive()
    }
}

impl IndexConfig {
    /// Create a configuration rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Open read-write, creating missing stores
    pub fn writable(mut self) -> Self {
        self.write_mode = true;
        self
    }

    /// Set the token-matching regex
    pub fn with_word_regex(mut self, pattern: impl Into<String>) -> Self {
        self.word_regex = pattern.into();
        self
    }

    /// Set the term normalizer
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Set the stopword source
    pub fn with_stopwords(mut self, stopwords: Stopwords) -> Self {
        self.stopwords = Some(stopwords);
        self
    }

    /// Set the field name for field-qualified subqueries
    pub fn with_fieldname(mut self, fieldname: impl Into<String>) -> Self {
        self.fieldname = Some(fieldname.into());
        self
    }

    /// Set the excerpt settings
    pub fn with_excerpt(mut self, excerpt: ExcerptConfig) -> Self {
        self.excerpt = excerpt;
        self
    }
}
