//! Doc and position postings over stores D and P
//!
//! Store D maps a wordId to concatenated `(docId, occ)` records plus the
//! reserved `NDOCS` counter. Store P maps `(docId, wordId)` to the word's
//! in-document positions in strictly ascending order.

use crate::codec;
use crate::error::Result;
use crate::store::{StoreKind, StoreSet};

/// Reserved store D key holding the total document count
pub const NDOCS_KEY: &[u8] = b"NDOCS";

/// View over stores D and P
pub struct Postings<'a> {
    store: &'a StoreSet,
}

impl<'a> Postings<'a> {
    pub fn new(store: &'a StoreSet) -> Self {
        Self { store }
    }

    /// Decoded `(docId, occ)` records for a word; empty when absent
    pub fn doc_records(&self, word_id: u32) -> Result<Vec<(u32, u8)>> {
        match self.store.get(StoreKind::Docs, &codec::word_key(word_id))? {
            Some(bytes) => codec::decode_doc_records(&bytes),
            None => Ok(Vec::new()),
        }
    }

    /// In-document positions for a `(docId, wordId)` pair; empty when absent
    pub fn positions(&self, doc_id: u32, word_id: u32) -> Result<Vec<u32>> {
        match self
            .store
            .get(StoreKind::Positions, &codec::pos_key(doc_id, word_id))?
        {
            Some(bytes) => codec::decode_positions(&bytes),
            None => Ok(Vec::new()),
        }
    }

    /// Whether store P already has an entry for this pair
    pub fn has_positions(&self, doc_id: u32, word_id: u32) -> Result<bool> {
        Ok(self
            .store
            .get(StoreKind::Positions, &codec::pos_key(doc_id, word_id))?
            .is_some())
    }

    /// Append one `(docId, occ)` record to a word's doc list
    pub fn append_doc(&self, word_id: u32, doc_id: u32, occ: u8) -> Result<()> {
        let key = codec::word_key(word_id);
        let mut value = self.store.get(StoreKind::Docs, &key)?.unwrap_or_default();
        codec::encode_doc_record(doc_id, occ, &mut value);
        self.store.put(StoreKind::Docs, &key, &value)
    }

    /// Write the position list for a `(docId, wordId)` pair
    pub fn write_positions(&self, doc_id: u32, word_id: u32, positions: &[u32]) -> Result<()> {
        self.store.put(
            StoreKind::Positions,
            &codec::pos_key(doc_id, word_id),
            &codec::encode_positions(positions),
        )
    }

    /// Drop one document from a word's postings in both stores
    ///
    /// The store D key is kept even when its list becomes empty; scoring
    /// treats an empty list as no matches.
    pub fn remove_doc(&self, word_id: u32, doc_id: u32) -> Result<()> {
        let key = codec::word_key(word_id);
        if let Some(bytes) = self.store.get(StoreKind::Docs, &key)? {
            let records = codec::decode_doc_records(&bytes)?;
            let kept: Vec<(u32, u8)> = records
                .into_iter()
                .filter(|&(doc, _)| doc != doc_id)
                .collect();
            self.store
                .put(StoreKind::Docs, &key, &codec::encode_doc_records(&kept))?;
        }
        self.store
            .delete(StoreKind::Positions, &codec::pos_key(doc_id, word_id))
    }

    /// Total indexed documents
    pub fn doc_count(&self) -> Result<u32> {
        match self.store.get(StoreKind::Docs, NDOCS_KEY)? {
            Some(bytes) => codec::decode_count(&bytes),
            None => Ok(0),
        }
    }

    pub fn set_doc_count(&self, count: u32) -> Result<()> {
        self.store
            .put(StoreKind::Docs, NDOCS_KEY, &codec::encode_count(count))
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
    fn test_append_and_read_back() {
        let tmp = TempDir::new().unwrap();
        let stores = write_stores(&tmp);
        let postings = Postings::new(&stores);

        postings.append_doc(7, 1, 2).unwrap();
        postings.append_doc(7, 3, 1).unwrap();
        postings.write_positions(1, 7, &[2, 9]).unwrap();
        postings.write_positions(3, 7, &[4]).unwrap();

        assert_eq!(postings.doc_records(7).unwrap(), vec![(1, 2), (3, 1)]);
        assert_eq!(postings.positions(1, 7).unwrap(), vec![2, 9]);
        assert_eq!(postings.positions(3, 7).unwrap(), vec![4]);
        assert_eq!(postings.doc_records(8).unwrap(), Vec::new());
    }

    #[test]
    fn test_remove_rewrites_doc_list() {
        let tmp = TempDir::new().unwrap();
        let stores = write_stores(&tmp);
        let postings = Postings::new(&stores);

        postings.append_doc(7, 1, 2).unwrap();
        postings.append_doc(7, 3, 1).unwrap();
        postings.write_positions(1, 7, &[2, 9]).unwrap();
        postings.write_positions(3, 7, &[4]).unwrap();

        postings.remove_doc(7, 1).unwrap();
        assert_eq!(postings.doc_records(7).unwrap(), vec![(3, 1)]);
        assert!(postings.positions(1, 7).unwrap().is_empty());
        assert!(!postings.has_positions(1, 7).unwrap());
        assert!(postings.has_positions(3, 7).unwrap());
    }

    #[test]
    fn test_empty_doc_list_is_kept() {
        let tmp = TempDir::new().unwrap();
        let stores = write_stores(&tmp);
        let postings = Postings::new(&stores);

        postings.append_doc(7, 1, 1).unwrap();
        postings.write_positions(1, 7, &[5]).unwrap();
        postings.remove_doc(7, 1).unwrap();

        // Key survives with an empty value
        assert!(stores
            .get(StoreKind::Docs, &codec::word_key(7))
            .unwrap()
            .is_some());
        assert_eq!(postings.doc_records(7).unwrap(), Vec::new());
    }

    #[test]
    fn test_doc_counter() {
        let tmp = TempDir::new().unwrap();
        let stores = write_stores(&tmp);
        let postings = Postings::new(&stores);

        assert_eq!(postings.doc_count().unwrap(), 0);
        postings.set_doc_count(3).unwrap();
        assert_eq!(postings.doc_count().unwrap(), 3);
    }
}
