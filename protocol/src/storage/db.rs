//! # VaultDb — Persistent Storage Engine
//!
//! The persistence layer for a Strongbox deployment, built on sled's
//! embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                 | Value                     |
//! |------------|---------------------|---------------------------|
//! | `entries`  | `entry_id` (8B BE)  | `bincode(entry)`          |
//! | `events`   | `sequence` (8B BE)  | `bincode(event)`          |
//! | `ledgers`  | `"snapshot"`        | `bincode(LedgerSnapshot)` |
//! | `metadata` | key (UTF-8)         | value (bytes)             |
//!
//! Ids are stored big-endian so sled's lexicographic order is numeric
//! order, and a full scan returns entries in id order.
//!
//! The entry and event types live in the contracts crate, so the entry and
//! event accessors are generic over any serde type. This crate only cares
//! that they round-trip through bincode.
//!
//! ## Atomicity
//!
//! [`VaultDb::commit`] writes changed entries, new events and the ledger
//! snapshot in one sled transaction across all four trees. A crash mid-way
//! never leaves an entry marked withdrawn without the matching ledger
//! movement.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};

use crate::ledger::LedgerSnapshot;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt record in tree '{tree}': {reason}")]
    Corrupt {
        /// The tree holding the bad record.
        tree: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

pub type DbResult<T> = Result<T, DbError>;

impl From<TransactionError<DbError>> for DbError {
    fn from(e: TransactionError<DbError>) -> Self {
        match e {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(err) => DbError::Sled(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

const LEDGER_SNAPSHOT_KEY: &[u8] = b"snapshot";

fn encode<T: Serialize>(value: &T) -> DbResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode_id(tree: &'static str, key: &[u8]) -> DbResult<u64> {
    let arr: [u8; 8] = key.try_into().map_err(|_| DbError::Corrupt {
        tree,
        reason: format!("key of {} bytes, expected 8", key.len()),
    })?;
    Ok(u64::from_be_bytes(arr))
}

// ---------------------------------------------------------------------------
// Commit batch
// ---------------------------------------------------------------------------

/// A set of writes applied atomically by [`VaultDb::commit`].
#[derive(Debug, Default)]
pub struct Commit {
    entries: Vec<(u64, Vec<u8>)>,
    events: Vec<(u64, Vec<u8>)>,
    ledgers: Option<Vec<u8>>,
    metadata: Vec<(String, Vec<u8>)>,
}

impl Commit {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts an entry record.
    pub fn put_entry<T: Serialize>(&mut self, id: u64, entry: &T) -> DbResult<&mut Self> {
        self.entries.push((id, encode(entry)?));
        Ok(self)
    }

    /// Writes an event at `sequence`.
    pub fn put_event<T: Serialize>(&mut self, sequence: u64, event: &T) -> DbResult<&mut Self> {
        self.events.push((sequence, encode(event)?));
        Ok(self)
    }

    /// Replaces the ledger snapshot.
    pub fn put_ledgers(&mut self, snapshot: &LedgerSnapshot) -> DbResult<&mut Self> {
        self.ledgers = Some(encode(snapshot)?);
        Ok(self)
    }

    /// Sets a metadata key.
    pub fn put_metadata(&mut self, key: &str, value: &[u8]) -> &mut Self {
        self.metadata.push((key.to_string(), value.to_vec()));
        self
    }

    /// Whether the batch would write anything.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.events.is_empty()
            && self.ledgers.is_none()
            && self.metadata.is_empty()
    }
}

// ---------------------------------------------------------------------------
// VaultDb
// ---------------------------------------------------------------------------

/// Persistent storage for one vault deployment.
///
/// Cheap to clone; sled handles are reference counted and thread-safe.
#[derive(Debug, Clone)]
pub struct VaultDb {
    db: Db,
    entries: Tree,
    events: Tree,
    ledgers: Tree,
    metadata: Tree,
}

impl VaultDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// In-memory database, removed on drop. For tests.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        Ok(Self {
            entries: db.open_tree("entries")?,
            events: db.open_tree("events")?,
            ledgers: db.open_tree("ledgers")?,
            metadata: db.open_tree("metadata")?,
            db,
        })
    }

    /// Applies every write in `commit` atomically and flushes.
    pub fn commit(&self, commit: &Commit) -> DbResult<()> {
        if commit.is_empty() {
            return Ok(());
        }
        (&self.entries, &self.events, &self.ledgers, &self.metadata).transaction(
            |(entries, events, ledgers, metadata)| {
                for (id, bytes) in &commit.entries {
                    entries.insert(&id.to_be_bytes(), bytes.as_slice())?;
                }
                for (seq, bytes) in &commit.events {
                    events.insert(&seq.to_be_bytes(), bytes.as_slice())?;
                }
                if let Some(bytes) = &commit.ledgers {
                    ledgers.insert(LEDGER_SNAPSHOT_KEY, bytes.as_slice())?;
                }
                for (key, value) in &commit.metadata {
                    metadata.insert(key.as_bytes(), value.as_slice())?;
                }
                Ok::<(), ConflictableTransactionError<DbError>>(())
            },
        )?;
        self.db.flush()?;
        Ok(())
    }

    /// Fetches one entry.
    pub fn get_entry<T: DeserializeOwned>(&self, id: u64) -> DbResult<Option<T>> {
        match self.entries.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every entry in id order, with its id.
    pub fn entries<T: DeserializeOwned>(&self) -> DbResult<Vec<(u64, T)>> {
        self.entries
            .iter()
            .map(|item| {
                let (key, value) = item?;
                Ok((decode_id("entries", &key)?, decode(&value)?))
            })
            .collect()
    }

    /// Every event in sequence order.
    pub fn events<T: DeserializeOwned>(&self) -> DbResult<Vec<T>> {
        self.events
            .iter()
            .map(|item| {
                let (_, value) = item?;
                decode(&value)
            })
            .collect()
    }

    /// Number of stored entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of stored events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The last saved ledger snapshot, if any.
    pub fn ledgers(&self) -> DbResult<Option<LedgerSnapshot>> {
        match self.ledgers.get(LEDGER_SNAPSHOT_KEY)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Reads a metadata key.
    pub fn get_metadata(&self, key: &str) -> DbResult<Option<Vec<u8>>> {
        Ok(self.metadata.get(key.as_bytes())?.map(|v| v.to_vec()))
    }
}
