//! `WithdrawTransaction`: burn funds here so they can be released on the
//! external chain.
//!
//! Delivery packs the withdrawal into a fixed 112-byte record and commits
//! `SHA-256(record)` to the withdraw tree:
//!
//! ```text
//! from chain id (20) ‖ to_addr (20) ‖ value (32 BE) ‖ fee (32 BE) ‖ nonce (8 BE)
//! ```
//!
//! The external contract verifies a Merkle proof of that hash against the
//! app hash before paying out.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{authenticate, check_response, CheckResult, CommonCodes, Rejection, TxHandler};
use crate::account;
use crate::amount::BoundedAmount;
use crate::crypto::keys::ChainKeypair;
use crate::crypto::sha256;
use crate::identity::{Address, ChainId, Identifier};
use crate::response::{withdraw as codes, Response, Tag};
use crate::signature::{
    Eip712Message, Eip712Signable, Eip712Value, JsonSignable, SignScheme, Signature, SignatureError,
};
use crate::storage::ChainState;

const KIND: &str = "WithdrawTransaction";

/// Byte length of a packed withdrawal record.
pub const PACKED_LENGTH: usize = 20 + 20 + 32 + 32 + 8;

const COMMON: CommonCodes = CommonCodes {
    invalid_format: codes::INVALID_FORMAT,
    sender_not_registered: codes::SENDER_NOT_REGISTERED,
    invalid_signature: codes::INVALID_SIGNATURE,
    invalid_nonce: codes::INVALID_NONCE,
    duplicated: codes::DUPLICATED,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawTransaction {
    pub from: Identifier,
    pub to_addr: Address,
    pub value: BoundedAmount,
    pub fee: BoundedAmount,
    pub nonce: u64,
    pub sig: Signature,
}

impl JsonSignable for WithdrawTransaction {
    fn json_sign_map(&self) -> Value {
        json!({
            "identity": self.from.to_string(),
            "to_addr": self.to_addr.to_string(),
            "value": self.value.to_string(),
            "fee": self.fee.to_string(),
            "nonce": self.nonce,
        })
    }
}

impl Eip712Signable for WithdrawTransaction {
    fn eip712_message(&self) -> Eip712Message {
        Eip712Message::new("Withdraw")
            .field("identity", Eip712Value::String(self.from.eip712_string()))
            .field("to_addr", Eip712Value::Address(self.to_addr))
            .field("value", Eip712Value::Uint256(self.value))
            .field("fee", Eip712Value::Uint256(self.fee))
            .field("nonce", Eip712Value::Uint64(self.nonce))
    }
}

impl WithdrawTransaction {
    pub fn sign(&mut self, keypair: &ChainKeypair, scheme: SignScheme) -> Result<(), SignatureError> {
        self.sig = Signature::sign(&*self, keypair, scheme)?;
        Ok(())
    }

    /// Packed withdrawal record with `from` as the sender's resolved chain
    /// id. `None` if value or fee does not fit 256 bits.
    pub fn pack(&self, from: &ChainId) -> Option<Vec<u8>> {
        let value = self.value.to_uint256_bytes()?;
        let fee = self.fee.to_uint256_bytes()?;
        let mut buf = Vec::with_capacity(PACKED_LENGTH);
        buf.extend_from_slice(from.as_bytes());
        buf.extend_from_slice(self.to_addr.as_bytes());
        buf.extend_from_slice(&value);
        buf.extend_from_slice(&fee);
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        Some(buf)
    }

    fn total(&self) -> BoundedAmount {
        self.value + self.fee
    }

    fn check_tx(&self, chain: &ChainState) -> CheckResult<ChainId> {
        if !self.validate_format() {
            return Err(Rejection::new(COMMON.invalid_format, None));
        }
        let sender_id = authenticate(&chain.state, KIND, &self.from, self.nonce, &COMMON, || {
            self.sig.recover(self)
        })?;

        let balance = account::fetch_balance(&chain.state, &sender_id.into());
        if balance < self.total() {
            return Err(Rejection::new(codes::NOT_ENOUGH_BALANCE, Some(sender_id)));
        }
        Ok(sender_id)
    }
}

impl TxHandler for WithdrawTransaction {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate_format(&self) -> bool {
        self.sig.is_present() && self.value.is_within_range() && self.fee.is_within_range()
    }

    fn check(&self, chain: &ChainState) -> Response {
        check_response(self.check_tx(chain))
    }

    fn deliver(&self, chain: &mut ChainState, _tx_hash: &[u8]) -> Response {
        let sender_id = match self.check_tx(chain) {
            Ok(id) => id,
            Err(rejection) => return rejection.settle(&mut chain.state),
        };
        let Some(packed) = self.pack(&sender_id) else {
            return Response::failure(codes::INVALID_FORMAT);
        };

        account::increment_next_nonce(&mut chain.state, &sender_id);
        account::subtract_balance(&mut chain.state, &sender_id.into(), &self.total());
        chain.withdraw.set(sha256(&packed).to_vec(), vec![1]);

        let height = chain.execution_height();
        tracing::debug!(height, packed = %hex::encode(&packed), "withdraw proof saved");
        Response::success()
            .with_tag(Tag::height("withdraw.height", height))
            .with_data(packed)
    }
}
