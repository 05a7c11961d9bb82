//! `SimpleTransferTransaction`: single receiver, text remark, both
//! signature schemes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{authenticate, check_response, CheckResult, CommonCodes, Rejection, TxHandler};
use crate::account;
use crate::amount::BoundedAmount;
use crate::config::MAX_REMARK_SIZE;
use crate::crypto::keys::ChainKeypair;
use crate::identity::{ChainId, Identifier};
use crate::response::{simple_transfer as codes, Response};
use crate::signature::{
    Eip712Message, Eip712Signable, Eip712Value, JsonSignable, SignScheme, Signature, SignatureError,
};
use crate::storage::ChainState;

const KIND: &str = "SimpleTransferTransaction";

const COMMON: CommonCodes = CommonCodes {
    invalid_format: codes::INVALID_FORMAT,
    sender_not_registered: codes::SENDER_NOT_REGISTERED,
    invalid_signature: codes::INVALID_SIGNATURE,
    invalid_nonce: codes::INVALID_NONCE,
    duplicated: codes::DUPLICATED,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleTransferTransaction {
    pub from: Identifier,
    pub to: Identifier,
    pub value: BoundedAmount,
    pub remark: String,
    pub fee: BoundedAmount,
    pub nonce: u64,
    pub sig: Signature,
}

impl JsonSignable for SimpleTransferTransaction {
    fn json_sign_map(&self) -> Value {
        json!({
            "identity": self.from.to_string(),
            "to": self.to.to_string(),
            "value": self.value.to_string(),
            "remark": self.remark,
            "fee": self.fee.to_string(),
            "nonce": self.nonce,
        })
    }
}

impl Eip712Signable for SimpleTransferTransaction {
    fn eip712_message(&self) -> Eip712Message {
        Eip712Message::new("SimpleTransfer")
            .field("identity", Eip712Value::String(self.from.eip712_string()))
            .field("to", Eip712Value::String(self.to.eip712_string()))
            .field("value", Eip712Value::Uint256(self.value))
            .field("remark", Eip712Value::String(self.remark.clone()))
            .field("fee", Eip712Value::Uint256(self.fee))
            .field("nonce", Eip712Value::Uint64(self.nonce))
    }
}

impl SimpleTransferTransaction {
    pub fn sign(&mut self, keypair: &ChainKeypair, scheme: SignScheme) -> Result<(), SignatureError> {
        self.sig = Signature::sign(&*self, keypair, scheme)?;
        Ok(())
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

        if let Identifier::ChainId(id) = &self.to {
            if !account::is_chain_id_registered(&chain.state, id) {
                return Err(Rejection::new(codes::INVALID_RECEIVER, Some(sender_id)));
            }
        }

        let balance = account::fetch_balance(&chain.state, &sender_id.into());
        if balance < self.total() {
            return Err(Rejection::new(codes::NOT_ENOUGH_BALANCE, Some(sender_id)));
        }
        Ok(sender_id)
    }
}

impl TxHandler for SimpleTransferTransaction {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate_format(&self) -> bool {
        self.sig.is_present()
            && self.value.is_within_range()
            && self.fee.is_within_range()
            && self.remark.len() <= MAX_REMARK_SIZE
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
        account::add_balance(&mut chain.state, &self.to, &self.value);
        Response::success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Address;
    use crate::transaction::test_support::*;

    fn tx(from: ChainId, to: Identifier, value: u64, fee: u64) -> SimpleTransferTransaction {
        SimpleTransferTransaction {
            from: from.into(),
            to,
            value: BoundedAmount::from(value),
            remark: "thanks".into(),
            fee: BoundedAmount::from(fee),
            nonce: 1,
            sig: Signature::Json(Vec::new()),
        }
    }

    #[test]
    fn eip712_type_string() {
        let t = tx(ChainId([1; 20]), Address([2; 20]).into(), 1, 0);
        assert_eq!(
            t.eip712_message().type_string(),
            "SimpleTransfer(string identity,string to,uint256 value,string remark,uint256 fee,uint64 nonce)"
        );
    }

    #[test]
    fn deliver_with_either_scheme() {
        for scheme in [SignScheme::Json, SignScheme::Eip712] {
            let mut chain = chain();
            let kp = keypair(1);
            let id = funded(&mut chain, &kp, 50);
            let receiver = funded(&mut chain, &keypair(2), 0);

            let mut t = tx(id, keypair(2).address().into(), 40, 10);
            t.sign(&kp, scheme).unwrap();
            assert!(t.deliver(&mut chain, &[0; 20]).is_ok());
            assert!(balance(&chain, id).is_zero());
            assert_eq!(balance(&chain, receiver), BoundedAmount::from(40));
        }
    }

    #[test]
    fn mutated_field_breaks_signature() {
        let mut chain = chain();
        let kp = keypair(1);
        let id = funded(&mut chain, &kp, 50);
        let mut t = tx(id, Address([2; 20]).into(), 1, 0);
        t.sign(&kp, SignScheme::Eip712).unwrap();
        t.remark = "changed".into();
        assert_eq!(t.check(&chain).code, codes::INVALID_SIGNATURE.code);
    }

    #[test]
    fn oversized_remark_is_format_error() {
        let chain = chain();
        let mut t = tx(ChainId([1; 20]), Address([2; 20]).into(), 1, 0);
        t.sig = Signature::Json(vec![0; 65]);
        t.remark = "x".repeat(MAX_REMARK_SIZE + 1);
        assert_eq!(t.check(&chain).code, codes::INVALID_FORMAT.code);
    }
}
