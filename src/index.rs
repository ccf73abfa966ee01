//! The index handle
//!
//! Owns the three stores for its lifetime and exposes the externally
//! blocking operations: `add`, `remove`, `search`, `excerpts`, `dump`.
//! Within one handle, writes are serialized in call order; every
//! completed mutation is flushed before returning.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, info};

use crate::codec;
use crate::config::{IndexConfig, Stopwords};
use crate::dict::{Dictionary, NWORDS_KEY, STOPWORD_ID};
use crate::error::{Result, SquillError};
use crate::excerpt::Excerpter;
use crate::lexer::Lexer;
use crate::postings::Postings;
use crate::query::eval::Evaluator;
use crate::query::parser::QueryParser;
use crate::query::translate::Translator;
use crate::store::{OpenMode, StoreKind, StoreSet};

/// The outcome of a `search`
#[derive(Debug)]
pub struct SearchResults {
    /// docId -> score; empty when the query carried no information
    pub scores: HashMap<u32, i64>,
    /// Query terms that did not contribute, sorted
    pub killed_words: Vec<String>,
    /// Case-insensitive regex matching the query terms, for excerpting
    pub regex: Regex,
}

/// A read-only or read-write binding over the three stores
pub struct Index {
    config: IndexConfig,
    store: StoreSet,
    lexer: Lexer,
    parser: QueryParser,
    // Serializes add/remove so read-modify-write cycles cannot interleave
    write_lock: Mutex<()>,
}

impl Index {
    /// Open an index as configured
    ///
    /// Write mode creates missing stores and applies the configured
    /// stopwords; read mode fails on a missing index and rejects
    /// stopword configuration outright.
    pub fn open(config: IndexConfig) -> Result<Self> {
        if !config.write_mode && config.stopwords.is_some() {
            return Err(SquillError::StopwordsInReadMode);
        }

        let lexer = Lexer::new(&config.word_regex, config.normalizer.clone())?;
        let mode = if config.write_mode {
            OpenMode::Write
        } else {
            OpenMode::Read
        };
        let store = StoreSet::open(&config.dir, mode)?;

        let index = Self {
            config,
            store,
            lexer,
            parser: QueryParser::new(),
            write_lock: Mutex::new(()),
        };

        if let Some(stopwords) = index.config.stopwords.clone() {
            index.init_stopwords(&stopwords)?;
        }

        info!(
            dir = %index.config.dir.display(),
            write = index.config.write_mode,
            "index opened"
        );
        Ok(index)
    }

    fn init_stopwords(&self, source: &Stopwords) -> Result<()> {
        let terms: Vec<String> = match source {
            Stopwords::List(list) => list.clone(),
            Stopwords::File(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    SquillError::StopwordFileOpenFailed {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    }
                })?;
                self.lexer
                    .surface_tokens(&contents)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            }
        };

        let _guard = self.write_lock.lock();
        let dict = Dictionary::new(&self.store);
        let mut marked = 0usize;
        for term in &terms {
            let normalized = self.lexer.normalize(term);
            if !normalized.is_empty() {
                dict.mark_stopword(&normalized)?;
                marked += 1;
            }
        }
        self.store.flush()?;
        debug!(marked, "stopwords initialized");
        Ok(())
    }

    fn checked_doc_id(&self, doc_id: u64) -> Result<u32> {
        u32::try_from(doc_id).map_err(|_| SquillError::DocIdTooLarge(doc_id))
    }

    /// Index a document
    ///
    /// The buffer is lexed, unknown terms get fresh wordIds, and both
    /// postings stores plus the document counter are updated and
    /// flushed. Re-adding an id that already has postings fails with
    /// `DupDoc` before anything is written.
    pub fn add(&self, doc_id: u64, buf: &str) -> Result<()> {
        let doc = self.checked_doc_id(doc_id)?;
        if !self.config.write_mode {
            return Err(SquillError::ReadOnly);
        }

        let _guard = self.write_lock.lock();
        let dict = Dictionary::new(&self.store);
        let postings = Postings::new(&self.store);

        let mut known_ids: HashMap<String, i32> = HashMap::new();
        let mut by_word: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for (ordinal, term) in self.lexer.terms(buf) {
            let id = match known_ids.get(&term) {
                Some(&id) => id,
                None => {
                    let id = dict.word_id_or_assign(&term)?;
                    known_ids.insert(term, id);
                    id
                }
            };
            if id == STOPWORD_ID {
                continue;
            }
            by_word.entry(id as u32).or_default().push(ordinal);
        }

        for &word_id in by_word.keys() {
            if postings.has_positions(doc, word_id)? {
                return Err(SquillError::DupDoc(doc));
            }
        }

        for (&word_id, positions) in &by_word {
            postings.append_doc(word_id, doc, codec::clamp_occ(positions.len()))?;
            postings.write_positions(doc, word_id, positions)?;
        }
        postings.set_doc_count(postings.doc_count()? + 1)?;
        self.store.flush()?;

        debug!(doc, terms = by_word.len(), "document indexed");
        Ok(())
    }

    /// Remove a document, given the same buffer that was indexed
    ///
    /// The buffer is re-lexed to recover the document's wordIds; their
    /// postings are rewritten without the document and the counter is
    /// decremented (also for ids that were never added).
    pub fn remove(&self, doc_id: u64, buf: &str) -> Result<()> {
        let doc = self.checked_doc_id(doc_id)?;
        if !self.config.write_mode {
            return Err(SquillError::ReadOnly);
        }

        let _guard = self.write_lock.lock();
        let dict = Dictionary::new(&self.store);
        let postings = Postings::new(&self.store);

        let mut word_ids: BTreeSet<u32> = BTreeSet::new();
        for (_, term) in self.lexer.terms(buf) {
            if let Some(id) = dict.word_id(&term)? {
                if id > 0 {
                    word_ids.insert(id as u32);
                }
            }
        }

        for &word_id in &word_ids {
            postings.remove_doc(word_id, doc)?;
        }
        postings.set_doc_count(postings.doc_count()?.saturating_sub(1))?;
        self.store.flush()?;

        debug!(doc, terms = word_ids.len(), "document removed");
        Ok(())
    }

    /// Run a query: parse, translate, evaluate, and build the excerpt regex
    pub fn search(&self, query: &str, implicit_plus: bool) -> Result<SearchResults> {
        let parsed = self.parser.parse(query, implicit_plus)?;
        let translator = Translator::new(
            &self.store,
            &self.lexer,
            self.config.fieldname.as_deref(),
        );
        let translation = translator.translate(&parsed)?;

        let scores = Evaluator::new(&self.store)
            .evaluate(&translation.groups)?
            .unwrap_or_default();
        let regex = compile_excerpt_regex(&translation.word_regexes)?;

        debug!(query, hits = scores.len(), "search evaluated");
        Ok(SearchResults {
            scores,
            killed_words: translation.killed_words,
            regex,
        })
    }

    /// Extract highlighted excerpts with a regex returned by `search`
    pub fn excerpts(&self, buf: &str, regex: &Regex) -> Vec<String> {
        Excerpter::new(&self.config.excerpt).excerpts(buf, regex)
    }

    /// Debug listing: `term : docId docId …` in term order
    ///
    /// Stopwords render as `term : -`; reserved keys are omitted.
    pub fn dump(&self) -> Result<Vec<String>> {
        let postings = Postings::new(&self.store);
        let mut lines = Vec::new();
        for key in self.store.iter_keys(StoreKind::Words)? {
            if key == NWORDS_KEY {
                continue;
            }
            let Ok(term) = std::str::from_utf8(&key) else {
                continue;
            };
            let Some(bytes) = self.store.get(StoreKind::Words, &key)? else {
                continue;
            };
            let id = codec::decode_word_value(&bytes)?;
            if id == STOPWORD_ID {
                lines.push(format!("{term} : -"));
                continue;
            }
            let docs = postings.doc_records(id as u32)?;
            let list = docs
                .iter()
                .map(|(doc, _)| doc.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("{term} : {list}"));
        }
        Ok(lines)
    }

    /// Push pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Total indexed documents
    pub fn doc_count(&self) -> Result<u32> {
        Postings::new(&self.store).doc_count()
    }

    /// Highest assigned wordId
    pub fn word_count(&self) -> Result<u32> {
        Dictionary::new(&self.store).word_count()
    }

    /// Doc postings for a term: `(docId, occ)` records, empty when unknown
    pub fn term_docs(&self, term: &str) -> Result<Vec<(u32, u8)>> {
        let normalized = self.lexer.normalize(term);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }
        match Dictionary::new(&self.store).word_id(&normalized)? {
            Some(id) if id > 0 => Postings::new(&self.store).doc_records(id as u32),
            _ => Ok(Vec::new()),
        }
    }

    /// In-document positions of a term, empty when absent
    pub fn positions(&self, doc_id: u64, term: &str) -> Result<Vec<u32>> {
        let doc = self.checked_doc_id(doc_id)?;
        let normalized = self.lexer.normalize(term);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }
        match Dictionary::new(&self.store).word_id(&normalized)? {
            Some(id) if id > 0 => Postings::new(&self.store).positions(doc, id as u32),
            _ => Ok(Vec::new()),
        }
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Combine the translator's fragments into one excerpt regex
///
/// Case-insensitive, word-boundary anchored alternation; with no
/// fragments the result matches nothing.
fn compile_excerpt_regex(fragments: &[String]) -> Result<Regex> {
    let pattern = if fragments.is_empty() {
        r"[^\s\S]".to_string()
    } else {
        format!(r"(?i)\b(?:{})\b", fragments.join("|"))
    };
    Regex::new(&pattern).map_err(|e| SquillError::BadRegex(e.to_string()))
}
