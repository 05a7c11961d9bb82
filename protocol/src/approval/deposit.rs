//! Deposit proposals: crediting transfers observed on an external chain.
//!
//! A proposal lists every deposit `(from_addr, value)` seen in one external
//! block. Its identity is a hash over the *sorted* inputs, so two approvers
//! that list the same deposits in a different order back the same proposal.

use serde::{Deserialize, Serialize};

use super::{ApprovalBook, ApprovalRejection, Approver};
use crate::account;
use crate::amount::BoundedAmount;
use crate::config::TX_HASH_LENGTH;
use crate::crypto::truncated_sha256;
use crate::identity::{Address, ChainId, Identifier};
use crate::storage::keys::{encode_u64, join_keys, tx_hash_key};
use crate::storage::StateTree;

pub const BOOK: ApprovalBook = ApprovalBook::new(
    b"depositApprovers",
    b"depositApproversWeightSum",
    b"depositWeight",
    b"depositApproval",
);

const EXECUTED_KEY: &[u8] = b"depositExecuted";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepositInput {
    pub from_addr: Address,
    pub value: BoundedAmount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositProposal {
    pub block_number: u64,
    pub inputs: Vec<DepositInput>,
}

impl DepositProposal {
    /// At least one input, every value positive and below `2^256`.
    pub fn validate(&self) -> bool {
        !self.inputs.is_empty()
            && self
                .inputs
                .iter()
                .all(|input| !input.value.is_zero() && input.value.is_within_range())
    }

    /// Inputs ordered by `(from_addr, value)`.
    pub fn sorted_inputs(&self) -> Vec<DepositInput> {
        let mut inputs = self.inputs.clone();
        inputs.sort();
        inputs
    }

    /// Content hash, independent of input order.
    ///
    /// ```text
    /// SHA-256(block_number BE8 ‖ count BE8 ‖ (addr ‖ len(value) u8 ‖ value)*)[..20]
    /// ```
    pub fn hash(&self) -> [u8; TX_HASH_LENGTH] {
        let inputs = self.sorted_inputs();
        let mut buf = Vec::with_capacity(16 + inputs.len() * 53);
        buf.extend_from_slice(&encode_u64(self.block_number));
        buf.extend_from_slice(&encode_u64(inputs.len() as u64));
        for input in &inputs {
            let value = input.value.to_canonical_bytes();
            buf.extend_from_slice(input.from_addr.as_bytes());
            buf.push(value.len() as u8);
            buf.extend_from_slice(&value);
        }
        truncated_sha256(&buf)
    }
}

fn executed_key(block_number: u64) -> Vec<u8> {
    join_keys(&[EXECUTED_KEY, &encode_u64(block_number)])
}

/// The proposal hash executed for `block_number`, if any.
pub fn execution(state: &StateTree, block_number: u64) -> Option<Vec<u8>> {
    state.get(&executed_key(block_number)).map(<[u8]>::to_vec)
}

fn proposal_key(tx_hash: &[u8]) -> Vec<u8> {
    tx_hash_key(tx_hash, "depositProposal")
}

/// Remember which proposal the deposit transaction `tx_hash` carried.
pub fn record_proposal(state: &mut StateTree, tx_hash: &[u8], proposal: &DepositProposal) {
    match bincode::serialize(proposal) {
        Ok(bytes) => state.set(proposal_key(tx_hash), bytes),
        Err(e) => tracing::error!(error = %e, "cannot encode deposit proposal"),
    }
}

pub fn proposal_of(state: &StateTree, tx_hash: &[u8]) -> Option<DepositProposal> {
    let bytes = state.get(&proposal_key(tx_hash))?;
    bincode::deserialize(bytes).ok()
}

/// Whether `proposer` may back `proposal` now.
pub fn check_deposit(
    state: &StateTree,
    proposal: &DepositProposal,
    proposer: &ChainId,
) -> Result<Approver, ApprovalRejection> {
    if execution(state, proposal.block_number).is_some() {
        return Err(ApprovalRejection::AlreadyExecuted);
    }
    let approver = BOOK
        .member(state, proposer)
        .ok_or(ApprovalRejection::NotApprover)?;
    if BOOK
        .approval_in_slot(state, proposer, proposal.block_number)
        .is_some()
    {
        return Err(ApprovalRejection::DoubleApproval);
    }
    Ok(approver)
}

/// Whether `approver_id` may approve the proposal carried by deposit
/// transaction `deposit_tx_hash`.
pub fn check_deposit_approval(
    state: &StateTree,
    deposit_tx_hash: &[u8],
    approver_id: &ChainId,
) -> Result<(DepositProposal, Approver), ApprovalRejection> {
    let proposal = proposal_of(state, deposit_tx_hash).ok_or(ApprovalRejection::ProposalNotExist)?;
    let approver = BOOK
        .member(state, approver_id)
        .ok_or(ApprovalRejection::NotApprover)?;
    if BOOK
        .approval_in_slot(state, approver_id, proposal.block_number)
        .is_some()
    {
        return Err(ApprovalRejection::DoubleApproval);
    }
    if execution(state, proposal.block_number).is_some() {
        return Err(ApprovalRejection::AlreadyExecuted);
    }
    Ok((proposal, approver))
}

/// Record the approval and execute when the threshold is crossed. Returns
/// whether the proposal executed.
pub fn process_deposit(state: &mut StateTree, proposal: &DepositProposal, approver: &Approver) -> bool {
    let hash = proposal.hash();
    let (weight, executes) = BOOK.approve(state, approver, proposal.block_number, &hash);
    tracing::debug!(
        block_number = proposal.block_number,
        proposal = %hex::encode(hash),
        weight,
        "deposit approval recorded"
    );
    if !executes {
        return false;
    }

    state.set(executed_key(proposal.block_number), hash.to_vec());
    for input in &proposal.inputs {
        account::add_balance(state, &Identifier::Address(input.from_addr), &input.value);
    }
    tracing::info!(block_number = proposal.block_number, "deposit proposal executed");
    true
}
