//! # Transaction Module
//!
//! The nine transaction variants and their two-phase contract.
//!
//! ## Architecture
//!
//! ```text
//! register.rs              — bind an address to a new chain id
//! transfer.rs              — multi-output transfer with remarks
//! simple_transfer.rs       — single-output transfer
//! withdraw.rs              — burn for release on the external chain
//! deposit.rs               — propose crediting an external block's deposits
//! deposit_approval.rs      — back an existing deposit proposal
//! hashed_transfer.rs       — lock funds under a hash and expiry
//! claim_hashed_transfer.rs — claim (receiver) or revoke (sender) a lock
//! contract_update.rs       — propose a new bridge contract address
//! ```
//!
//! ## Two-Phase Contract
//!
//! Every variant implements [`TxHandler`]:
//!
//! 1. **check** is read-only and may run any number of times. It runs, in
//!    order: format validation → sender resolution → signature recovery and
//!    address linkage → nonce comparison → variant business rules. The first
//!    failure wins.
//! 2. **deliver** re-runs check. On failure it still consumes the sender's
//!    nonce when the failure code says so; on success it consumes the nonce
//!    and applies the effects.
//!
//! ## Wire Format
//!
//! `bincode` (fixed-width integers, trailing bytes rejected) over the
//! serde-derived [`Transaction`] enum.

pub mod claim_hashed_transfer;
pub mod contract_update;
pub mod deposit;
pub mod deposit_approval;
pub mod hashed_transfer;
pub mod register;
pub mod simple_transfer;
pub mod transfer;
pub mod withdraw;

use bincode::Options;
use serde::{Deserialize, Serialize};

pub use claim_hashed_transfer::ClaimHashedTransferTransaction;
pub use contract_update::ContractUpdateTransaction;
pub use deposit::DepositTransaction;
pub use deposit_approval::DepositApprovalTransaction;
pub use hashed_transfer::HashedTransferTransaction;
pub use register::RegisterTransaction;
pub use simple_transfer::SimpleTransferTransaction;
pub use transfer::{TransferOutput, TransferTransaction};
pub use withdraw::WithdrawTransaction;

use crate::account;
use crate::config::{MAX_TX_BYTES, TX_HASH_LENGTH};
use crate::crypto::truncated_sha256;
use crate::identity::{Address, ChainId, Identifier};
use crate::response::{Response, ResponseCode};
use crate::signature::SignatureError;
use crate::storage::{ChainState, StateTree};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("cannot encode transaction: {0}")]
    Encode(String),

    #[error("cannot decode transaction: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Handler Trait
// ---------------------------------------------------------------------------

/// The two-phase contract every transaction variant implements.
pub trait TxHandler {
    /// Name used in logs and in signature errors.
    fn kind(&self) -> &'static str;

    /// Stateless structural check.
    fn validate_format(&self) -> bool;

    /// Read-only admission check.
    fn check(&self, chain: &ChainState) -> Response;

    /// Check, then apply. `tx_hash` identifies this transaction in state.
    fn deliver(&self, chain: &mut ChainState, tx_hash: &[u8]) -> Response;
}

// ---------------------------------------------------------------------------
// Shared Check Steps
// ---------------------------------------------------------------------------

/// A failed check, with the sender's id when it was resolved.
#[derive(Debug)]
pub struct Rejection {
    pub response: Response,
    pub sender: Option<ChainId>,
}

pub type CheckResult<T> = Result<T, Rejection>;

impl Rejection {
    pub fn new(code: ResponseCode, sender: Option<ChainId>) -> Self {
        Self {
            response: Response::failure(code),
            sender,
        }
    }

    /// Deliver-side settlement: consume the nonce if the code demands it.
    pub fn settle(self, state: &mut StateTree) -> Response {
        if self.response.should_increment_nonce {
            if let Some(id) = &self.sender {
                account::increment_next_nonce(state, id);
            }
        }
        self.response
    }
}

/// Codes for the steps every signed, nonced variant shares.
#[derive(Clone, Copy, Debug)]
pub struct CommonCodes {
    pub invalid_format: ResponseCode,
    pub sender_not_registered: ResponseCode,
    pub invalid_signature: ResponseCode,
    pub invalid_nonce: ResponseCode,
    pub duplicated: ResponseCode,
}

/// Sender resolution, signature linkage and nonce comparison.
///
/// `recover` runs only once the sender has resolved.
pub fn authenticate<F>(
    state: &StateTree,
    kind: &'static str,
    sender: &Identifier,
    nonce: u64,
    codes: &CommonCodes,
    recover: F,
) -> CheckResult<ChainId>
where
    F: FnOnce() -> Result<Address, SignatureError>,
{
    let sender_id = account::resolve_identifier(state, sender)
        .ok_or_else(|| Rejection::new(codes.sender_not_registered, None))?;

    match recover() {
        Ok(addr) if account::has_linked_address(state, &sender_id, &addr) => {}
        Ok(addr) => {
            tracing::debug!(tx = kind, %sender, recovered_addr = %addr, "signer not linked to sender");
            return Err(Rejection::new(codes.invalid_signature, Some(sender_id)));
        }
        Err(e) => {
            tracing::debug!(tx = kind, %sender, error = %e, "signature recovery failed");
            return Err(Rejection::new(codes.invalid_signature, Some(sender_id)));
        }
    }

    let next_nonce = account::fetch_next_nonce(state, &sender_id);
    if nonce > next_nonce {
        return Err(Rejection::new(codes.invalid_nonce, Some(sender_id)));
    }
    if nonce < next_nonce {
        return Err(Rejection::new(codes.duplicated, Some(sender_id)));
    }
    Ok(sender_id)
}

/// Collapse a check result to its response.
pub fn check_response<T>(result: CheckResult<T>) -> Response {
    match result {
        Ok(_) => Response::success(),
        Err(rejection) => rejection.response,
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// Closed set of transaction variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    Register(RegisterTransaction),
    Transfer(TransferTransaction),
    Deposit(DepositTransaction),
    DepositApproval(DepositApprovalTransaction),
    Withdraw(WithdrawTransaction),
    HashedTransfer(HashedTransferTransaction),
    ClaimHashedTransfer(ClaimHashedTransferTransaction),
    SimpleTransfer(SimpleTransferTransaction),
    ContractUpdate(ContractUpdateTransaction),
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .with_limit(MAX_TX_BYTES)
        .reject_trailing_bytes()
}

impl Transaction {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec()
            .serialize(self)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        codec()
            .deserialize(bytes)
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    pub fn handler(&self) -> &dyn TxHandler {
        match self {
            Transaction::Register(tx) => tx,
            Transaction::Transfer(tx) => tx,
            Transaction::Deposit(tx) => tx,
            Transaction::DepositApproval(tx) => tx,
            Transaction::Withdraw(tx) => tx,
            Transaction::HashedTransfer(tx) => tx,
            Transaction::ClaimHashedTransfer(tx) => tx,
            Transaction::SimpleTransfer(tx) => tx,
            Transaction::ContractUpdate(tx) => tx,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.handler().kind()
    }

    pub fn validate_format(&self) -> bool {
        self.handler().validate_format()
    }

    pub fn check(&self, chain: &ChainState) -> Response {
        let response = self.handler().check(chain);
        if !response.is_ok() {
            tracing::info!(tx = self.kind(), code = response.code, info = %response.info, "check rejected");
        }
        response
    }

    pub fn deliver(&self, chain: &mut ChainState, tx_hash: &[u8]) -> Response {
        let response = self.handler().deliver(chain, tx_hash);
        if response.is_ok() {
            tracing::info!(tx = self.kind(), tx_hash = %hex::encode(tx_hash), "delivered");
        } else {
            tracing::info!(
                tx = self.kind(),
                tx_hash = %hex::encode(tx_hash),
                code = response.code,
                info = %response.info,
                "deliver rejected"
            );
        }
        response
    }
}

/// Hash identifying raw transaction bytes in state.
pub fn tx_hash(raw: &[u8]) -> [u8; TX_HASH_LENGTH] {
    truncated_sha256(raw)
}

macro_rules! impl_from_variant {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Transaction {
                fn from(tx: $ty) -> Self {
                    Transaction::$variant(tx)
                }
            }
        )*
    };
}

impl_from_variant! {
    Register => RegisterTransaction,
    Transfer => TransferTransaction,
    Deposit => DepositTransaction,
    DepositApproval => DepositApprovalTransaction,
    Withdraw => WithdrawTransaction,
    HashedTransfer => HashedTransferTransaction,
    ClaimHashedTransfer => ClaimHashedTransferTransaction,
    SimpleTransfer => SimpleTransferTransaction,
    ContractUpdate => ContractUpdateTransaction,
}
