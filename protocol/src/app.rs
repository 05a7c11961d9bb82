//! # Application
//!
//! The host-facing surface of the state machine. A consensus host drives it
//! through one lifecycle per block:
//!
//! ```text
//! init_chain (once) ─▶ begin_block ─▶ deliver_tx* ─▶ commit ─▶ begin_block ─▶ …
//!                      check_tx / query at any time, against the working state
//! ```
//!
//! `deliver_tx` is the only path that writes transaction status. Status
//! transitions out of `Success` never happen: a transaction whose status was
//! already settled by a later one (an approved deposit, a claimed lock)
//! keeps it.

use tracing::{debug, info};

use crate::config::CODE_UNDECODABLE_TX;
use crate::genesis::{GenesisDocument, GenesisError};
use crate::query;
use crate::response::Response;
use crate::storage::{ChainDB, ChainState, DbError};
use crate::transaction::{tx_hash, Transaction};
use crate::txstatus::{self, TxStatus};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("storage failure: {0}")]
    Db(#[from] DbError),

    #[error("genesis rejected: {0}")]
    Genesis(#[from] GenesisError),

    #[error("chain already initialized at height {height}")]
    AlreadyInitialized { height: i64 },
}

/// Last committed height and app hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppInfo {
    pub height: i64,
    pub app_hash: [u8; 32],
}

pub struct Application {
    chain: ChainState,
    db: Option<ChainDB>,
}

fn undecodable(stage: &'static str, error: impl std::fmt::Display) -> Response {
    debug!(stage, error = %error, "cannot parse transaction");
    Response {
        code: CODE_UNDECODABLE_TX,
        info: "Cannot parse transaction".to_string(),
        status: TxStatus::Fail,
        ..Response::default()
    }
}

impl Application {
    /// A purely in-memory application. Nothing survives a restart.
    pub fn in_memory() -> Self {
        Self {
            chain: ChainState::new(),
            db: None,
        }
    }

    /// Resume from the last state committed to `db`.
    pub fn with_db(db: ChainDB) -> Result<Self, AppError> {
        let chain = db.load_state()?;
        info!(height = chain.height, app_hash = %hex::encode(chain.app_hash), "state loaded");
        Ok(Self { chain, db: Some(db) })
    }

    pub fn chain(&self) -> &ChainState {
        &self.chain
    }

    pub fn info(&self) -> AppInfo {
        AppInfo {
            height: self.chain.height,
            app_hash: self.chain.app_hash,
        }
    }

    /// Load the genesis document into an empty chain and persist it at
    /// height 0. Returns the genesis app hash.
    pub fn init_chain(&mut self, genesis: &GenesisDocument) -> Result<[u8; 32], AppError> {
        if self.chain.height > 0 || !self.chain.state.is_empty() {
            return Err(AppError::AlreadyInitialized {
                height: self.chain.height,
            });
        }
        genesis.apply(&mut self.chain)?;
        self.chain.seal();
        if let Some(db) = &self.db {
            db.commit(&mut self.chain)?;
        }
        info!(app_hash = %hex::encode(self.chain.app_hash), "chain initialized");
        Ok(self.chain.app_hash)
    }

    pub fn begin_block(&mut self, block_hash: Vec<u8>, block_time: i64) {
        debug!(
            height = self.chain.execution_height(),
            block_hash = %hex::encode(&block_hash),
            block_time,
            "begin block"
        );
        self.chain.set_block(block_hash, block_time);
    }

    /// Mempool admission. Never mutates state.
    pub fn check_tx(&self, raw: &[u8]) -> Response {
        match Transaction::decode(raw) {
            Ok(tx) => tx.check(&self.chain),
            Err(e) => undecodable("check", e),
        }
    }

    /// Execute one transaction in the current block.
    pub fn deliver_tx(&mut self, raw: &[u8]) -> Response {
        let hash = tx_hash(raw);
        let tx = match Transaction::decode(raw) {
            Ok(tx) => tx,
            Err(e) => return undecodable("deliver", e),
        };

        let response = tx.deliver(&mut self.chain, &hash);
        if txstatus::get_status(&self.chain.state, &hash) != TxStatus::Success {
            txstatus::set_status(&mut self.chain.state, &hash, response.status);
        }
        response
    }

    /// Close the block: advance the height, compute the app hash and, when
    /// backed by a database, persist everything written since the last
    /// commit.
    pub fn commit(&mut self) -> Result<[u8; 32], AppError> {
        let app_hash = self.chain.advance_height();
        if let Some(db) = &self.db {
            db.commit(&mut self.chain)?;
        }
        info!(height = self.chain.height, app_hash = %hex::encode(app_hash), "block committed");
        Ok(app_hash)
    }

    pub fn query(&self, path: &str, data: &[u8], height: i64) -> Response {
        debug!(path, height, "query");
        query::query(&self.chain, path, data, height)
    }
}
