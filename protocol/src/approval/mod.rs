//! # Weighted Approval
//!
//! Deposits and contract updates are executed by a fixed set of weighted
//! members once strictly more than two thirds of the total weight backs the
//! same proposal.
//!
//! ```text
//! deposit.rs  — deposit proposals (credit balances for one external block)
//! contract.rs — contract update proposals (rebind the contract address)
//! ```
//!
//! Both share an [`ApprovalBook`]: member list, per-proposal accumulated
//! weight, and per-member approval records. Each proposal targets a *slot*
//! (an external block number or a contract index). A member may back at
//! most one proposal per slot.
//!
//! ```text
//! execute  ⟺  weight(proposal) × 3 > total_weight × 2
//! ```

pub mod contract;
pub mod deposit;

use serde::{Deserialize, Serialize};

use crate::config::{APPROVAL_THRESHOLD_DENOMINATOR, APPROVAL_THRESHOLD_NUMERATOR};
use crate::identity::ChainId;
use crate::storage::keys::{decode_u64, encode_u64, join_keys};
use crate::storage::StateTree;

/// A member of an approval set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approver {
    pub id: ChainId,
    pub weight: u32,
}

/// Why a proposal or approval cannot be accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalRejection {
    ProposalNotExist,
    NotApprover,
    DoubleApproval,
    AlreadyExecuted,
    InvalidIndex,
}

/// Strict two-thirds supermajority in integer arithmetic.
pub fn exceeds_threshold(weight: u64, total: u64) -> bool {
    u128::from(weight) * u128::from(APPROVAL_THRESHOLD_DENOMINATOR)
        > u128::from(total) * u128::from(APPROVAL_THRESHOLD_NUMERATOR)
}

// ---------------------------------------------------------------------------
// ApprovalBook
// ---------------------------------------------------------------------------

/// State keys for one approval namespace.
#[derive(Clone, Copy, Debug)]
pub struct ApprovalBook {
    members_key: &'static [u8],
    weight_sum_key: &'static [u8],
    weight_key: &'static [u8],
    approval_key: &'static [u8],
}

impl ApprovalBook {
    pub const fn new(
        members_key: &'static [u8],
        weight_sum_key: &'static [u8],
        weight_key: &'static [u8],
        approval_key: &'static [u8],
    ) -> Self {
        Self {
            members_key,
            weight_sum_key,
            weight_key,
            approval_key,
        }
    }

    fn proposal_weight_key(&self, proposal_id: &[u8]) -> Vec<u8> {
        join_keys(&[self.weight_key, proposal_id])
    }

    fn member_approval_key(&self, member: &ChainId, slot: u64) -> Vec<u8> {
        join_keys(&[self.approval_key, member.as_bytes(), b"slot", &encode_u64(slot)])
    }

    /// Current member list. An unreadable record reads as empty.
    pub fn members(&self, state: &StateTree) -> Vec<Approver> {
        let Some(bytes) = state.get(self.members_key) else {
            return Vec::new();
        };
        match bincode::deserialize(bytes) {
            Ok(members) => members,
            Err(e) => {
                tracing::error!(error = %e, "cannot decode approver list");
                Vec::new()
            }
        }
    }

    /// Replace the member list and its cached weight sum. An empty list
    /// clears both. State is untouched when the list cannot be encoded.
    pub fn set_members(&self, state: &mut StateTree, members: &[Approver]) -> Result<(), bincode::Error> {
        if members.is_empty() {
            state.remove(self.members_key);
            state.remove(self.weight_sum_key);
            return Ok(());
        }
        let total: u64 = members.iter().map(|m| u64::from(m.weight)).sum();
        let bytes = bincode::serialize(members)?;
        state.set(self.members_key.to_vec(), bytes);
        state.set(self.weight_sum_key.to_vec(), encode_u64(total).to_vec());
        Ok(())
    }

    pub fn member(&self, state: &StateTree, id: &ChainId) -> Option<Approver> {
        self.members(state).into_iter().find(|m| m.id == *id)
    }

    pub fn weight_sum(&self, state: &StateTree) -> u64 {
        state
            .get(self.weight_sum_key)
            .and_then(decode_u64)
            .unwrap_or(0)
    }

    pub fn proposal_weight(&self, state: &StateTree, proposal_id: &[u8]) -> u64 {
        state
            .get(&self.proposal_weight_key(proposal_id))
            .and_then(decode_u64)
            .unwrap_or(0)
    }

    /// The proposal `member` already backs in `slot`, if any.
    pub fn approval_in_slot(&self, state: &StateTree, member: &ChainId, slot: u64) -> Option<Vec<u8>> {
        state
            .get(&self.member_approval_key(member, slot))
            .map(<[u8]>::to_vec)
    }

    /// Record `approver` backing `proposal_id` in `slot`. Returns the
    /// proposal's accumulated weight and whether it now executes.
    pub fn approve(
        &self,
        state: &mut StateTree,
        approver: &Approver,
        slot: u64,
        proposal_id: &[u8],
    ) -> (u64, bool) {
        state.set(self.member_approval_key(&approver.id, slot), proposal_id.to_vec());
        let weight = self.proposal_weight(state, proposal_id) + u64::from(approver.weight);
        state.set(self.proposal_weight_key(proposal_id), encode_u64(weight).to_vec());
        (weight, exceeds_threshold(weight, self.weight_sum(state)))
    }
}
