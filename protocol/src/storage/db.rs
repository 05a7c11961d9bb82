//! # ChainDB: Persistent Storage Engine
//!
//! The persistence layer for the chain state, built on sled's embedded
//! key-value store.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                      | Value                 |
//! |------------|--------------------------|-----------------------|
//! | `state`    | raw state key            | raw state value       |
//! | `withdraw` | raw withdraw key         | raw withdraw value    |
//! | `metadata` | well-known key (UTF-8)   | height / hashes       |
//!
//! ## Commit
//!
//! Only entries touched since the previous commit are written. Each tree
//! receives one `Batch`; the metadata batch carrying the new height goes
//! last, so a crash in between leaves the previous height on disk and the
//! block is replayed.

use sled::{Batch, Db, Tree};
use std::path::Path;

use super::context::ChainState;
use super::keys::{decode_u64, encode_u64};
use super::state::{PendingChanges, StateTree};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("corrupted metadata entry: {0}")]
    Corrupted(&'static str),
}

pub type DbResult<T> = Result<T, DbError>;

// ---------------------------------------------------------------------------
// Metadata Keys
// ---------------------------------------------------------------------------

const META_HEIGHT: &[u8] = b"height";
const META_APP_HASH: &[u8] = b"app_hash";
const META_BLOCK_HASH: &[u8] = b"block_hash";
const META_BLOCK_TIME: &[u8] = b"block_time";

// ---------------------------------------------------------------------------
// ChainDB
// ---------------------------------------------------------------------------

/// Persistent store for [`ChainState`].
///
/// sled trees are safe for concurrent reads; a single writer is expected
/// (the application's commit path).
#[derive(Debug, Clone)]
pub struct ChainDB {
    db: Db,
    state: Tree,
    withdraw: Tree,
    metadata: Tree,
}

impl ChainDB {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// In-memory database removed on drop. Used by tests.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let state = db.open_tree("state")?;
        let withdraw = db.open_tree("withdraw")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self {
            db,
            state,
            withdraw,
            metadata,
        })
    }

    /// Rebuild the last committed [`ChainState`]. A fresh database yields
    /// the empty state at height 0.
    pub fn load_state(&self) -> DbResult<ChainState> {
        let state = StateTree::from_entries(read_tree(&self.state)?);
        let withdraw = StateTree::from_entries(read_tree(&self.withdraw)?);

        let height = match self.metadata.get(META_HEIGHT)? {
            Some(v) => decode_u64(&v).ok_or(DbError::Corrupted("height"))? as i64,
            None => 0,
        };
        let app_hash = match self.metadata.get(META_APP_HASH)? {
            Some(v) => <[u8; 32]>::try_from(v.as_ref()).map_err(|_| DbError::Corrupted("app_hash"))?,
            None => [0u8; 32],
        };
        let block_hash = self
            .metadata
            .get(META_BLOCK_HASH)?
            .map(|v| v.to_vec())
            .unwrap_or_default();
        let block_time = match self.metadata.get(META_BLOCK_TIME)? {
            Some(v) => decode_u64(&v).ok_or(DbError::Corrupted("block_time"))? as i64,
            None => 0,
        };

        Ok(ChainState {
            state,
            committed_withdraw: withdraw.snapshot(),
            withdraw,
            height,
            block_time,
            block_hash,
            app_hash,
        })
    }

    /// Persist everything changed in `chain` since the last commit.
    pub fn commit(&self, chain: &mut ChainState) -> DbResult<()> {
        self.state.apply_batch(to_batch(chain.state.take_pending()))?;
        self.withdraw.apply_batch(to_batch(chain.withdraw.take_pending()))?;

        let mut meta = Batch::default();
        meta.insert(META_HEIGHT, &encode_u64(chain.height as u64)[..]);
        meta.insert(META_APP_HASH, &chain.app_hash[..]);
        meta.insert(META_BLOCK_HASH, chain.block_hash.as_slice());
        meta.insert(META_BLOCK_TIME, &encode_u64(chain.block_time as u64)[..]);
        self.metadata.apply_batch(meta)?;

        self.db.flush()?;
        tracing::debug!(height = chain.height, "state persisted");
        Ok(())
    }

    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn read_tree(tree: &Tree) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
    tree.iter()
        .map(|item| {
            let (k, v) = item?;
            Ok((k.to_vec(), v.to_vec()))
        })
        .collect()
}

fn to_batch(changes: PendingChanges) -> Batch {
    let mut batch = Batch::default();
    for (key, value) in changes {
        match value {
            Some(v) => batch.insert(key, v),
            None => batch.remove(key),
        }
    }
    batch
}
