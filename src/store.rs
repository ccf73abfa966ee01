//! Persistent keyed stores backing the index
//!
//! One fjall database per index directory, holding the three keyspaces of
//! the on-disk format: `ixw` (dictionary), `ixd` (doc postings), `ixp`
//! (position postings). A handle binds all three for its lifetime; writer
//! exclusivity rides on the database's directory lock.

use std::path::Path;

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use tracing::info;

use crate::error::{Result, SquillError};

/// Dictionary store name
pub const WORDS_STORE: &str = "ixw";
/// Doc-postings store name
pub const DOCS_STORE: &str = "ixd";
/// Position-postings store name
pub const POSITIONS_STORE: &str = "ixp";

/// How the stores were opened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

/// Selects one of the three stores in the keyed-store contract
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Words,
    Docs,
    Positions,
}

impl StoreKind {
    fn name(self) -> &'static str {
        match self {
            StoreKind::Words => WORDS_STORE,
            StoreKind::Docs => DOCS_STORE,
            StoreKind::Positions => POSITIONS_STORE,
        }
    }
}

/// The three keyed stores plus their shared database handle
pub struct StoreSet {
    db: Database,
    words: Keyspace,
    docs: Keyspace,
    positions: Keyspace,
    mode: OpenMode,
}

impl StoreSet {
    /// Open the stores under `dir`
    ///
    /// Write mode creates the directory and missing stores. Read mode
    /// fails with `StoreMissing` when nothing has been created yet and
    /// rejects all mutations afterwards.
    pub fn open(dir: &Path, mode: OpenMode) -> Result<Self> {
        let existed = dir.is_dir();
        match mode {
            OpenMode::Read => {
                if !existed {
                    return Err(SquillError::StoreMissing(dir.display().to_string()));
                }
            }
            OpenMode::Write => {
                std::fs::create_dir_all(dir)?;
            }
        }

        let db = Database::builder(dir).open().map_err(|e| {
            if mode == OpenMode::Write && existed {
                SquillError::AlreadyOpenForWrite(e.to_string())
            } else {
                SquillError::StoreOpenFailed {
                    name: dir.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let words = db
            .keyspace(WORDS_STORE, || KeyspaceCreateOptions::default())
            .map_err(|e| SquillError::StoreOpenFailed {
                name: WORDS_STORE.to_string(),
                reason: e.to_string(),
            })?;
        let docs = db
            .keyspace(DOCS_STORE, || KeyspaceCreateOptions::default())
            .map_err(|e| SquillError::StoreOpenFailed {
                name: DOCS_STORE.to_string(),
                reason: e.to_string(),
            })?;
        let positions = db
            .keyspace(POSITIONS_STORE, || KeyspaceCreateOptions::default())
            .map_err(|e| SquillError::StoreOpenFailed {
                name: POSITIONS_STORE.to_string(),
                reason: e.to_string(),
            })?;

        info!(dir = %dir.display(), ?mode, "stores opened");

        Ok(Self {
            db,
            words,
            docs,
            positions,
            mode,
        })
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn keyspace(&self, kind: StoreKind) -> &Keyspace {
        match kind {
            StoreKind::Words => &self.words,
            StoreKind::Docs => &self.docs,
            StoreKind::Positions => &self.positions,
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.mode == OpenMode::Write {
            Ok(())
        } else {
            Err(SquillError::ReadOnly)
        }
    }

    pub fn get(&self, kind: StoreKind, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self
            .keyspace(kind)
            .get(key)
            .map_err(|e| SquillError::Store(e.to_string()))?
            .map(|value| value.as_ref().to_vec()))
    }

    pub fn put(&self, kind: StoreKind, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        self.keyspace(kind)
            .insert(key, value)
            .map_err(|e| SquillError::Store(e.to_string()))
    }

    pub fn delete(&self, kind: StoreKind, key: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        self.keyspace(kind)
            .remove(key)
            .map_err(|e| SquillError::Store(e.to_string()))
    }

    /// All keys of a store in key order (used by the debug dump and tests)
    pub fn iter_keys(&self, kind: StoreKind) -> Result<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        for kv in self.keyspace(kind).iter() {
            let key = kv.key().map_err(|e| SquillError::Store(e.to_string()))?;
            keys.push(key.as_ref().to_vec());
        }
        Ok(keys)
    }

    /// Push the write cache to disk
    pub fn flush(&self) -> Result<()> {
        self.db
            .persist(fjall::PersistMode::SyncAll)
            .map_err(|e| SquillError::Store(e.to_string()))
    }
}

impl std::fmt::Debug for StoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSet")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
