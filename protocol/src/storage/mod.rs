//! # Storage Module
//!
//! ```text
//! keys.rs    — byte-key layout helpers
//! state.rs   — ordered key/value tree with a BLAKE3 Merkle root
//! context.rs — ChainState: main tree, withdraw tree, block context
//! db.rs      — sled persistence for ChainState
//! ```
//!
//! Handlers only ever see [`ChainState`]. The application commits it to
//! [`ChainDB`] once per block.

pub mod context;
pub mod db;
pub mod keys;
pub mod state;

pub use context::ChainState;
pub use db::{ChainDB, DbError, DbResult};
pub use state::{MerkleProof, StateTree};
