//! Word dictionary over store W
//!
//! Maintains the term -> wordId bijection, the stopword marker, and the
//! `_NWORDS` counter. Entries are created on first observation and never
//! deleted, so ids stay stable across document removals.

use crate::codec;
use crate::error::{Result, SquillError};
use crate::store::{StoreKind, StoreSet};

/// Reserved store W key holding the highest assigned wordId
pub const NWORDS_KEY: &[u8] = b"_NWORDS";

/// Dictionary value marking a stopword
pub const STOPWORD_ID: i32 = -1;

/// View over store W
pub struct Dictionary<'a> {
    store: &'a StoreSet,
}

impl<'a> Dictionary<'a> {
    pub fn new(store: &'a StoreSet) -> Self {
        Self { store }
    }

    /// Look up a term without assigning
    ///
    /// `Some(id > 0)` known word, `Some(-1)` stopword, `None` unknown.
    pub fn word_id(&self, term: &str) -> Result<Option<i32>> {
        match self.store.get(StoreKind::Words, term.as_bytes())? {
            Some(bytes) => Ok(Some(codec::decode_word_value(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Look up a term, assigning the next free id when unknown
    ///
    /// Stopword entries are returned as-is, never overwritten.
    pub fn word_id_or_assign(&self, term: &str) -> Result<i32> {
        if let Some(id) = self.word_id(term)? {
            return Ok(id);
        }
        let next = self.word_count()? + 1;
        if next > i32::MAX as u32 {
            return Err(SquillError::Store("word id space exhausted".to_string()));
        }
        self.store.put(
            StoreKind::Words,
            term.as_bytes(),
            &codec::encode_word_value(next as i32),
        )?;
        self.set_word_count(next)?;
        Ok(next as i32)
    }

    /// Mark a term as a stopword
    ///
    /// Fails with `StopwordAfterWrite` when the term already carries a
    /// positive id: its postings would dangle otherwise.
    pub fn mark_stopword(&self, term: &str) -> Result<()> {
        match self.word_id(term)? {
            Some(id) if id > 0 => Err(SquillError::StopwordAfterWrite(term.to_string())),
            Some(_) => Ok(()),
            None => self.store.put(
                StoreKind::Words,
                term.as_bytes(),
                &codec::encode_word_value(STOPWORD_ID),
            ),
        }
    }

    /// Highest assigned wordId
    pub fn word_count(&self) -> Result<u32> {
        match self.store.get(StoreKind::Words, NWORDS_KEY)? {
            Some(bytes) => Ok(codec::decode_word_value(&bytes)?.max(0) as u32),
            None => Ok(0),
        }
    }

    fn set_word_count(&self, count: u32) -> Result<()> {
        self.store.put(
            StoreKind::Words,
            NWORDS_KEY,
            &codec::encode_word_value(count as i32),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OpenMode;
    use tempfile::TempDir;

    fn write_stores(tmp: &TempDir) -> StoreSet {
        StoreSet::open(tmp.path(), OpenMode::Write).unwrap()
    }

    #[test]
    fn test_ids_assigned_in_sequence() {
        let tmp = TempDir::new().unwrap();
        let stores = write_stores(&tmp);
        let dict = Dictionary::new(&stores);

        assert_eq!(dict.word_id_or_assign("quick").unwrap(), 1);
        assert_eq!(dict.word_id_or_assign("brown").unwrap(), 2);
        assert_eq!(dict.word_id_or_assign("quick").unwrap(), 1);
        assert_eq!(dict.word_count().unwrap(), 2);
    }

    #[test]
    fn test_read_lookup_does_not_assign() {
        let tmp = TempDir::new().unwrap();
        let stores = write_stores(&tmp);
        let dict = Dictionary::new(&stores);

        assert_eq!(dict.word_id("unseen").unwrap(), None);
        assert_eq!(dict.word_count().unwrap(), 0);
    }

    #[test]
    fn test_stopword_marking() {
        let tmp = TempDir::new().unwrap();
        let stores = write_stores(&tmp);
        let dict = Dictionary::new(&stores);

        dict.mark_stopword("the").unwrap();
        assert_eq!(dict.word_id("the").unwrap(), Some(STOPWORD_ID));
        // Marking twice is a no-op
        dict.mark_stopword("the").unwrap();

        // Stopword entries survive assignment attempts
        assert_eq!(dict.word_id_or_assign("the").unwrap(), STOPWORD_ID);
        assert_eq!(dict.word_count().unwrap(), 0);
    }

    #[test]
    fn test_stopword_after_postings_rejected() {
        let tmp = TempDir::new().unwrap();
        let stores = write_stores(&tmp);
        let dict = Dictionary::new(&stores);

        dict.word_id_or_assign("fox").unwrap();
        let err = dict.mark_stopword("fox").unwrap_err();
        assert!(matches!(err, SquillError::StopwordAfterWrite(_)));
    }
}
