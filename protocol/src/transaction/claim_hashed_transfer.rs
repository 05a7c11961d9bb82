//! `ClaimHashedTransferTransaction`: resolve a pending hashed transfer.
//!
//! The same transaction shape serves both parties. Sent by the lock's
//! receiver with the preimage before expiry it *claims*; sent by the lock's
//! sender at or after expiry it *revokes*. Either way the creating
//! transaction's status becomes `Success`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{authenticate, check_response, CheckResult, CommonCodes, Rejection, TxHandler};
use crate::account;
use crate::config::{HASH_COMMIT_LENGTH, TX_HASH_LENGTH};
use crate::crypto::keys::ChainKeypair;
use crate::htlc::{self, HashedTransfer, HtlcRejection};
use crate::identity::{ChainId, Identifier};
use crate::response::{claim_hashed_transfer as codes, Response, ResponseCode, Tag};
use crate::signature::{
    Eip712Message, Eip712Signable, Eip712Value, JsonSignable, SignScheme, Signature, SignatureError,
};
use crate::storage::ChainState;
use crate::txstatus::{self, TxStatus};

const KIND: &str = "ClaimHashedTransferTransaction";

const COMMON: CommonCodes = CommonCodes {
    invalid_format: codes::INVALID_FORMAT,
    sender_not_registered: codes::SENDER_NOT_REGISTERED,
    invalid_signature: codes::INVALID_SIGNATURE,
    invalid_nonce: codes::INVALID_NONCE,
    duplicated: codes::DUPLICATED,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Receiver,
    Sender,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimHashedTransferTransaction {
    pub from: Identifier,
    pub htlc_tx_hash: Vec<u8>,
    /// Preimage of the lock's commit. Empty when revoking.
    pub secret: Vec<u8>,
    pub nonce: u64,
    pub sig: Signature,
}

impl JsonSignable for ClaimHashedTransferTransaction {
    fn json_sign_map(&self) -> Value {
        let secret = if self.secret.is_empty() {
            String::new()
        } else {
            format!("0x{}", hex::encode(&self.secret))
        };
        json!({
            "identity": self.from.to_string(),
            "htlc_tx_hash": format!("0x{}", hex::encode(&self.htlc_tx_hash)),
            "secret": secret,
            "nonce": self.nonce,
        })
    }
}

impl Eip712Signable for ClaimHashedTransferTransaction {
    fn eip712_message(&self) -> Eip712Message {
        Eip712Message::new("ClaimHashedTransfer")
            .field("identity", Eip712Value::String(self.from.eip712_string()))
            .field("htlc_tx_hash", Eip712Value::Bytes32(self.htlc_tx_hash.clone()))
            .field("secret", Eip712Value::Bytes32(self.secret.clone()))
            .field("nonce", Eip712Value::Uint64(self.nonce))
    }
}

fn rejection_code(reason: HtlcRejection) -> ResponseCode {
    match reason {
        HtlcRejection::Expired => codes::EXPIRED,
        HtlcRejection::InvalidSecret => codes::INVALID_SECRET,
        HtlcRejection::NotYetExpired => codes::NOT_YET_EXPIRED,
    }
}

impl ClaimHashedTransferTransaction {
    pub fn sign(&mut self, keypair: &ChainKeypair, scheme: SignScheme) -> Result<(), SignatureError> {
        self.sig = Signature::sign(&*self, keypair, scheme)?;
        Ok(())
    }

    fn role_of(chain: &ChainState, ht: &HashedTransfer, sender_id: &ChainId) -> Option<Role> {
        let is = |party: &Identifier| account::resolve_identifier(&chain.state, party).as_ref() == Some(sender_id);
        if is(&ht.to) {
            Some(Role::Receiver)
        } else if is(&ht.from) {
            Some(Role::Sender)
        } else {
            None
        }
    }

    fn check_tx(&self, chain: &ChainState) -> CheckResult<(ChainId, HashedTransfer, Role)> {
        if !self.validate_format() {
            return Err(Rejection::new(COMMON.invalid_format, None));
        }
        let sender_id = authenticate(&chain.state, KIND, &self.from, self.nonce, &COMMON, || {
            self.sig.recover(self)
        })?;

        let reject = |code| Rejection::new(code, Some(sender_id));
        let ht = htlc::get(&chain.state, &self.htlc_tx_hash).ok_or_else(|| reject(codes::TX_NOT_EXIST))?;
        let role = Self::role_of(chain, &ht, &sender_id).ok_or_else(|| reject(codes::INVALID_SENDER))?;
        let verdict = match role {
            Role::Receiver => ht.check_claim(chain.block_time, &self.secret),
            Role::Sender => ht.check_revoke(chain.block_time),
        };
        verdict.map_err(|reason| reject(rejection_code(reason)))?;
        Ok((sender_id, ht, role))
    }
}

impl TxHandler for ClaimHashedTransferTransaction {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate_format(&self) -> bool {
        self.sig.is_present()
            && self.htlc_tx_hash.len() == TX_HASH_LENGTH
            && (self.secret.is_empty() || self.secret.len() == HASH_COMMIT_LENGTH)
    }

    fn check(&self, chain: &ChainState) -> Response {
        check_response(self.check_tx(chain))
    }

    fn deliver(&self, chain: &mut ChainState, _tx_hash: &[u8]) -> Response {
        let (sender_id, ht, role) = match self.check_tx(chain) {
            Ok(found) => found,
            Err(rejection) => return rejection.settle(&mut chain.state),
        };
        account::increment_next_nonce(&mut chain.state, &sender_id);

        let mut response = Response::success().with_tag(Tag::new(
            "claim_hashed_transfer.htlc_tx_hash",
            self.htlc_tx_hash.clone(),
        ));
        match role {
            Role::Receiver => {
                htlc::claim(chain, &ht, &self.htlc_tx_hash);
                response = response.with_tag(Tag::new("claim_hashed_transfer.secret", self.secret.clone()));
            }
            Role::Sender => htlc::revoke(chain, &ht, &self.htlc_tx_hash),
        }
        txstatus::set_status(&mut chain.state, &self.htlc_tx_hash, TxStatus::Success);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::BoundedAmount;
    use crate::crypto::sha256;
    use crate::transaction::test_support::*;
    use crate::transaction::HashedTransferTransaction;

    const SECRET: [u8; 32] = [0x5e; 32];
    const HTLC_HASH: [u8; 20] = [0x77; 20];

    /// A (funded 100) locks 20 with fee 1 for B; expiry one minute out.
    fn locked() -> (ChainState, ChainId, ChainId) {
        let mut chain = chain();
        let a = funded(&mut chain, &keypair(1), 100);
        let b = funded(&mut chain, &keypair(2), 0);
        let mut lock = HashedTransferTransaction {
            htlc: HashedTransfer {
                from: a.into(),
                to: b.into(),
                value: BoundedAmount::from(20),
                hash_commit: sha256(&SECRET),
                expiry: BLOCK_TIME + 60,
            },
            fee: BoundedAmount::from(1),
            nonce: 1,
            sig: Signature::Json(Vec::new()),
        };
        lock.sign(&keypair(1), SignScheme::Json).unwrap();
        assert!(lock.deliver(&mut chain, &HTLC_HASH).is_ok());
        (chain, a, b)
    }

    fn claim(kp_seed: u8, from: ChainId, secret: &[u8], nonce: u64) -> ClaimHashedTransferTransaction {
        let mut tx = ClaimHashedTransferTransaction {
            from: from.into(),
            htlc_tx_hash: HTLC_HASH.to_vec(),
            secret: secret.to_vec(),
            nonce,
            sig: Signature::Json(Vec::new()),
        };
        tx.sign(&keypair(kp_seed), SignScheme::Eip712).unwrap();
        tx
    }

    #[test]
    fn receiver_claims_with_secret() {
        let (mut chain, a, b) = locked();
        let r = claim(2, b, &SECRET, 1).deliver(&mut chain, &[0; 20]);

        assert!(r.is_ok());
        assert_eq!(r.tags[1].value, SECRET.to_vec());
        assert_eq!(balance(&chain, a), BoundedAmount::from(79));
        assert_eq!(balance(&chain, b), BoundedAmount::from(20));
        assert!(htlc::get(&chain.state, &HTLC_HASH).is_none());
        assert_eq!(txstatus::get_status(&chain.state, &HTLC_HASH), TxStatus::Success);

        let again = claim(2, b, &SECRET, 2).check(&chain);
        assert_eq!(again.code, codes::TX_NOT_EXIST.code);
    }

    #[test]
    fn sender_revokes_after_expiry() {
        let (mut chain, a, _) = locked();
        assert_eq!(
            claim(1, a, &[], 2).check(&chain).code,
            codes::NOT_YET_EXPIRED.code
        );

        chain.block_time = BLOCK_TIME + 60;
        let r = claim(1, a, &[], 2).deliver(&mut chain, &[0; 20]);
        assert!(r.is_ok());
        assert_eq!(r.tags.len(), 1);
        assert_eq!(balance(&chain, a), BoundedAmount::from(99));
    }

    #[test]
    fn receiver_rules() {
        let (mut chain, _, b) = locked();
        assert_eq!(
            claim(2, b, &[0; 32], 1).check(&chain).code,
            codes::INVALID_SECRET.code
        );
        chain.block_time = BLOCK_TIME + 60;
        let r = claim(2, b, &SECRET, 1).deliver(&mut chain, &[0; 20]);
        assert_eq!(r.code, codes::EXPIRED.code);
        assert_eq!(nonce(&chain, &b), 2);
    }

    #[test]
    fn third_party_is_invalid_sender() {
        let (mut chain, _, _) = locked();
        let c = funded(&mut chain, &keypair(3), 0);
        assert_eq!(
            claim(3, c, &SECRET, 1).check(&chain).code,
            codes::INVALID_SENDER.code
        );
    }

    #[test]
    fn format_rules() {
        let mut tx = claim(1, ChainId([1; 20]), &SECRET, 1);
        assert!(tx.validate_format());
        tx.secret = vec![1; 31];
        assert!(!tx.validate_format());
        tx.secret.clear();
        tx.htlc_tx_hash = vec![0; 32];
        assert!(!tx.validate_format());
    }
}
