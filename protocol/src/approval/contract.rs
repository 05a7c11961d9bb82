//! Contract update proposals: moving the external bridge contract to a new
//! address.
//!
//! Proposals must target exactly the next contract index. Execution writes
//! `"exec" ‖ index BE8 → address` into the withdraw tree, where external
//! verifiers read it through a Merkle proof.

use serde::{Deserialize, Serialize};

use super::{ApprovalBook, ApprovalRejection, Approver};
use crate::identity::{Address, ChainId};
use crate::storage::keys::{decode_u64, encode_u64};
use crate::storage::{ChainState, StateTree};

pub const BOOK: ApprovalBook = ApprovalBook::new(
    b"contractUpdaters",
    b"contractUpdatersWeightSum",
    b"updateWeight",
    b"updateApproval",
);

const CURRENT_INDEX_KEY: &[u8] = b"currentContractIndex";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractUpdateProposal {
    pub contract_index: u64,
    pub contract_address: Address,
}

impl ContractUpdateProposal {
    /// `index BE8 ‖ address`. Also serves as the proposal's identity.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = encode_u64(self.contract_index).to_vec();
        bytes.extend_from_slice(self.contract_address.as_bytes());
        bytes
    }
}

/// Withdraw-tree key of the execution record for `contract_index`.
pub fn execution_key(contract_index: u64) -> Vec<u8> {
    let mut key = b"exec".to_vec();
    key.extend_from_slice(&encode_u64(contract_index));
    key
}

/// Index of the contract currently in force. Starts at 0.
pub fn current_index(state: &StateTree) -> u64 {
    state
        .get(CURRENT_INDEX_KEY)
        .and_then(decode_u64)
        .unwrap_or(0)
}

/// Address executed for `contract_index`, if any.
pub fn execution(withdraw: &StateTree, contract_index: u64) -> Option<Address> {
    withdraw
        .get(&execution_key(contract_index))
        .and_then(|bytes| Address::from_slice(bytes).ok())
}

pub fn check_update(
    state: &StateTree,
    proposal: &ContractUpdateProposal,
    proposer: &ChainId,
) -> Result<Approver, ApprovalRejection> {
    let updater = BOOK
        .member(state, proposer)
        .ok_or(ApprovalRejection::NotApprover)?;
    if BOOK
        .approval_in_slot(state, proposer, proposal.contract_index)
        .is_some()
    {
        return Err(ApprovalRejection::DoubleApproval);
    }
    if proposal.contract_index != current_index(state) + 1 {
        return Err(ApprovalRejection::InvalidIndex);
    }
    Ok(updater)
}

/// Record the approval and execute when the threshold is crossed. Returns
/// whether the proposal executed.
pub fn process_update(chain: &mut ChainState, proposal: &ContractUpdateProposal, updater: &Approver) -> bool {
    let id = proposal.to_bytes();
    let (weight, executes) = BOOK.approve(&mut chain.state, updater, proposal.contract_index, &id);
    tracing::debug!(
        contract_index = proposal.contract_index,
        weight,
        "contract update approval recorded"
    );
    if !executes {
        return false;
    }

    chain.withdraw.set(
        execution_key(proposal.contract_index),
        proposal.contract_address.as_bytes().to_vec(),
    );
    chain
        .state
        .set(CURRENT_INDEX_KEY.to_vec(), encode_u64(proposal.contract_index).to_vec());
    tracing::info!(
        contract_index = proposal.contract_index,
        contract_address = %proposal.contract_address,
        "contract update executed"
    );
    true
}
