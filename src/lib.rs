//! squill: embedded full-text indexing and retrieval
//!
//! Documents are plain-text buffers identified by caller-assigned 32-bit
//! ids. Indexing builds a persistent inverted index over three keyed
//! stores (dictionary, doc postings, position postings); queries combine
//! mandatory, optional, and negative subqueries with exact-phrase
//! matching and return IDF-weighted scores plus an excerpt regex.

pub mod codec;
pub mod config;
pub mod dict;
pub mod error;
pub mod excerpt;
pub mod index;
pub mod lexer;
pub mod postings;
pub mod query;
pub mod store;

pub use config::{ExcerptConfig, IndexConfig, Normalizer, Stopwords, DEFAULT_WORD_REGEX};
pub use error::{Result, SquillError};
pub use index::{Index, SearchResults};
pub use lexer::{default_normalizer, latin1_fold, Lexer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
