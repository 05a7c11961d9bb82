//! `TransferTransaction`: one sender, many outputs, a single shared fee.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{authenticate, check_response, CheckResult, CommonCodes, Rejection, TxHandler};
use crate::account;
use crate::amount::BoundedAmount;
use crate::config::MAX_REMARK_SIZE;
use crate::crypto::keys::ChainKeypair;
use crate::identity::{ChainId, Identifier};
use crate::response::{transfer as codes, Response};
use crate::signature::{JsonSignable, SignScheme, Signature, SignatureError};
use crate::storage::ChainState;

const KIND: &str = "TransferTransaction";

const COMMON: CommonCodes = CommonCodes {
    invalid_format: codes::INVALID_FORMAT,
    sender_not_registered: codes::SENDER_NOT_REGISTERED,
    invalid_signature: codes::INVALID_SIGNATURE,
    invalid_nonce: codes::INVALID_NONCE,
    duplicated: codes::DUPLICATED,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutput {
    pub to: Identifier,
    pub value: BoundedAmount,
    pub remark: Vec<u8>,
}

impl TransferOutput {
    pub fn validate(&self) -> bool {
        self.value.is_within_range() && self.remark.len() <= MAX_REMARK_SIZE
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTransaction {
    pub from: Identifier,
    pub outputs: Vec<TransferOutput>,
    pub fee: BoundedAmount,
    pub nonce: u64,
    pub sig: Signature,
}

impl JsonSignable for TransferTransaction {
    fn json_sign_map(&self) -> Value {
        let outputs: Vec<Value> = self
            .outputs
            .iter()
            .map(|output| {
                json!({
                    "identity": output.to.to_string(),
                    "remark": BASE64.encode(&output.remark),
                    "value": output.value.to_string(),
                })
            })
            .collect();
        json!({
            "fee": self.fee.to_string(),
            "identity": self.from.to_string(),
            "nonce": self.nonce,
            "outputs": outputs,
        })
    }
}

impl TransferTransaction {
    /// Only the JSON scheme is accepted for multi-output transfers.
    pub fn sign(&mut self, keypair: &ChainKeypair, scheme: SignScheme) -> Result<(), SignatureError> {
        self.sig = Signature::sign_json_only(&*self, keypair, scheme, KIND)?;
        Ok(())
    }

    /// `Σ values + fee`.
    pub fn total(&self) -> BoundedAmount {
        self.outputs.iter().map(|o| o.value).sum::<BoundedAmount>() + self.fee
    }

    fn check_tx(&self, chain: &ChainState) -> CheckResult<ChainId> {
        if !self.validate_format() {
            return Err(Rejection::new(COMMON.invalid_format, None));
        }
        let sender_id = authenticate(&chain.state, KIND, &self.from, self.nonce, &COMMON, || {
            self.sig.recover_json_only(self, KIND)
        })?;

        for output in &self.outputs {
            if let Identifier::ChainId(id) = &output.to {
                if !account::is_chain_id_registered(&chain.state, id) {
                    return Err(Rejection::new(codes::INVALID_RECEIVER, Some(sender_id)));
                }
            }
        }

        let balance = account::fetch_balance(&chain.state, &sender_id.into());
        if balance < self.total() {
            tracing::debug!(total = %self.total(), %balance, "transfer exceeds balance");
            return Err(Rejection::new(codes::NOT_ENOUGH_BALANCE, Some(sender_id)));
        }
        Ok(sender_id)
    }
}

impl TxHandler for TransferTransaction {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate_format(&self) -> bool {
        self.sig.is_present()
            && !self.outputs.is_empty()
            && self.fee.is_within_range()
            && self.outputs.iter().all(TransferOutput::validate)
    }

    fn check(&self, chain: &ChainState) -> Response {
        check_response(self.check_tx(chain))
    }

    fn deliver(&self, chain: &mut ChainState, _tx_hash: &[u8]) -> Response {
        let sender_id = match self.check_tx(chain) {
            Ok(id) => id,
            Err(rejection) => return rejection.settle(&mut chain.state),
        };
        account::increment_next_nonce(&mut chain.state, &sender_id);
        account::subtract_balance(&mut chain.state, &sender_id.into(), &self.total());
        for output in &self.outputs {
            account::add_balance(&mut chain.state, &output.to, &output.value);
        }
        Response::success()
    }
}
