//! In-memory chain state handed to every transaction handler.

use super::state::StateTree;
use crate::crypto::blake3_hash_multi;

/// Working state of the chain between commits.
///
/// `height` is the last committed height; a transaction delivered now will
/// land in block `height + 1`. `block_time` and `block_hash` describe the
/// block currently being executed. `committed_withdraw` is the withdraw
/// tree as of the last commit; proofs are served from it.
#[derive(Clone, Debug, Default)]
pub struct ChainState {
    pub state: StateTree,
    pub withdraw: StateTree,
    pub committed_withdraw: StateTree,
    pub height: i64,
    pub block_time: i64,
    pub block_hash: Vec<u8>,
    pub app_hash: [u8; 32],
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new block.
    pub fn set_block(&mut self, block_hash: Vec<u8>, block_time: i64) {
        self.block_hash = block_hash;
        self.block_time = block_time;
    }

    /// Height a transaction executed right now will be included at.
    pub fn execution_height(&self) -> i64 {
        self.height + 1
    }

    /// `BLAKE3(state_root ‖ withdraw_root)`.
    pub fn compute_app_hash(&self) -> [u8; 32] {
        let state_root = self.state.root_hash();
        let withdraw_root = self.withdraw.root_hash();
        blake3_hash_multi(&[&state_root[..], &withdraw_root[..]])
    }

    /// Refresh the app hash and snapshot the withdraw tree for proof
    /// queries. Called whenever the working state becomes committed state.
    pub fn seal(&mut self) -> [u8; 32] {
        self.app_hash = self.compute_app_hash();
        self.committed_withdraw = self.withdraw.snapshot();
        self.app_hash
    }

    /// Close the current block: bump the height and seal.
    pub fn advance_height(&mut self) -> [u8; 32] {
        self.height += 1;
        self.seal()
    }
}
