//! `HashedTransferTransaction`: lock `value` for `to` under a SHA-256 commit
//! until `expiry`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{authenticate, check_response, CheckResult, CommonCodes, Rejection, TxHandler};
use crate::account;
use crate::amount::BoundedAmount;
use crate::crypto::keys::ChainKeypair;
use crate::htlc::{self, HashedTransfer};
use crate::identity::ChainId;
use crate::response::{hashed_transfer as codes, Response};
use crate::signature::{
    Eip712Message, Eip712Signable, Eip712Value, JsonSignable, SignScheme, Signature, SignatureError,
};
use crate::storage::ChainState;
use crate::txstatus::TxStatus;

const KIND: &str = "HashedTransferTransaction";

const COMMON: CommonCodes = CommonCodes {
    invalid_format: codes::INVALID_FORMAT,
    sender_not_registered: codes::SENDER_NOT_REGISTERED,
    invalid_signature: codes::INVALID_SIGNATURE,
    invalid_nonce: codes::INVALID_NONCE,
    duplicated: codes::DUPLICATED,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedTransferTransaction {
    pub htlc: HashedTransfer,
    pub fee: BoundedAmount,
    pub nonce: u64,
    pub sig: Signature,
}

impl JsonSignable for HashedTransferTransaction {
    fn json_sign_map(&self) -> Value {
        json!({
            "identity": self.htlc.from.to_string(),
            "to": self.htlc.to.to_string(),
            "value": self.htlc.value.to_string(),
            "hash_commit": format!("0x{}", hex::encode(self.htlc.hash_commit)),
            "expiry": self.htlc.expiry,
            "fee": self.fee.to_string(),
            "nonce": self.nonce,
        })
    }
}

impl Eip712Signable for HashedTransferTransaction {
    fn eip712_message(&self) -> Eip712Message {
        let expiry = u64::try_from(self.htlc.expiry).unwrap_or_default();
        Eip712Message::new("HashedTransfer")
            .field("identity", Eip712Value::String(self.htlc.from.eip712_string()))
            .field("to", Eip712Value::String(self.htlc.to.eip712_string()))
            .field("value", Eip712Value::Uint256(self.htlc.value))
            .field("hash_commit", Eip712Value::Bytes32(self.htlc.hash_commit.to_vec()))
            .field("expiry", Eip712Value::Uint256(BoundedAmount::from(expiry)))
            .field("fee", Eip712Value::Uint256(self.fee))
            .field("nonce", Eip712Value::Uint64(self.nonce))
    }
}

impl HashedTransferTransaction {
    pub fn sign(&mut self, keypair: &ChainKeypair, scheme: SignScheme) -> Result<(), SignatureError> {
        self.sig = Signature::sign(&*self, keypair, scheme)?;
        Ok(())
    }

    fn total(&self) -> BoundedAmount {
        self.htlc.value + self.fee
    }

    fn check_tx(&self, chain: &ChainState) -> CheckResult<ChainId> {
        if !self.validate_format() {
            return Err(Rejection::new(COMMON.invalid_format, None));
        }
        let sender_id = authenticate(&chain.state, KIND, &self.htlc.from, self.nonce, &COMMON, || {
            self.sig.recover(self)
        })?;

        if account::resolve_identifier(&chain.state, &self.htlc.to).is_none() {
            return Err(Rejection::new(codes::INVALID_RECEIVER, Some(sender_id)));
        }
        let balance = account::fetch_balance(&chain.state, &sender_id.into());
        if balance < self.total() {
            return Err(Rejection::new(codes::NOT_ENOUGH_BALANCE, Some(sender_id)));
        }
        if !self.htlc.check_create(chain.block_time) {
            return Err(Rejection::new(codes::INVALID_EXPIRY, Some(sender_id)));
        }
        Ok(sender_id)
    }
}

impl TxHandler for HashedTransferTransaction {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate_format(&self) -> bool {
        self.sig.is_present() && self.htlc.validate() && self.fee.is_within_range()
    }

    fn check(&self, chain: &ChainState) -> Response {
        check_response(self.check_tx(chain))
    }

    fn deliver(&self, chain: &mut ChainState, tx_hash: &[u8]) -> Response {
        let sender_id = match self.check_tx(chain) {
            Ok(id) => id,
            Err(rejection) => return rejection.settle(&mut chain.state),
        };
        account::increment_next_nonce(&mut chain.state, &sender_id);
        account::subtract_balance(&mut chain.state, &sender_id.into(), &self.total());
        htlc::create(&mut chain.state, tx_hash, &self.htlc);
        Response::success().with_status(TxStatus::Pending)
    }
}
