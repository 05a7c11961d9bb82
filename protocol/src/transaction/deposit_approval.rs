//! `DepositApprovalTransaction`: another approver backs the proposal carried
//! by an earlier deposit transaction.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{authenticate, check_response, CheckResult, CommonCodes, Rejection, TxHandler};
use crate::account;
use crate::approval::deposit::{self as deposit_book, DepositProposal};
use crate::approval::{ApprovalRejection, Approver};
use crate::config::TX_HASH_LENGTH;
use crate::crypto::keys::ChainKeypair;
use crate::identity::Identifier;
use crate::response::{deposit_approval as codes, Response, Tag};
use crate::signature::{JsonSignable, SignScheme, Signature, SignatureError};
use crate::storage::ChainState;
use crate::txstatus::{self, TxStatus};

const KIND: &str = "DepositApprovalTransaction";

const COMMON: CommonCodes = CommonCodes {
    invalid_format: codes::INVALID_FORMAT,
    sender_not_registered: codes::SENDER_NOT_REGISTERED,
    invalid_signature: codes::INVALID_SIGNATURE,
    invalid_nonce: codes::INVALID_NONCE,
    duplicated: codes::DUPLICATED,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositApprovalTransaction {
    pub approver: Identifier,
    pub deposit_tx_hash: Vec<u8>,
    pub nonce: u64,
    pub sig: Signature,
}

impl JsonSignable for DepositApprovalTransaction {
    fn json_sign_map(&self) -> Value {
        json!({
            "deposit_tx_hash": format!("0x{}", hex::encode(&self.deposit_tx_hash)),
            "identity": self.approver.to_string(),
            "nonce": self.nonce,
        })
    }
}

impl DepositApprovalTransaction {
    pub fn sign(&mut self, keypair: &ChainKeypair, scheme: SignScheme) -> Result<(), SignatureError> {
        self.sig = Signature::sign_json_only(&*self, keypair, scheme, KIND)?;
        Ok(())
    }

    fn check_tx(&self, chain: &ChainState) -> CheckResult<(DepositProposal, Approver)> {
        if !self.validate_format() {
            return Err(Rejection::new(COMMON.invalid_format, None));
        }
        let sender_id = authenticate(&chain.state, KIND, &self.approver, self.nonce, &COMMON, || {
            self.sig.recover_json_only(self, KIND)
        })?;

        deposit_book::check_deposit_approval(&chain.state, &self.deposit_tx_hash, &sender_id).map_err(
            |reason| {
                let code = match reason {
                    ApprovalRejection::ProposalNotExist => codes::PROPOSAL_NOT_EXIST,
                    ApprovalRejection::DoubleApproval => codes::DOUBLE_APPROVAL,
                    ApprovalRejection::AlreadyExecuted => codes::ALREADY_EXECUTED,
                    _ => codes::NOT_APPROVER,
                };
                Rejection::new(code, Some(sender_id))
            },
        )
    }
}

impl TxHandler for DepositApprovalTransaction {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate_format(&self) -> bool {
        self.sig.is_present() && self.deposit_tx_hash.len() == TX_HASH_LENGTH
    }

    fn check(&self, chain: &ChainState) -> Response {
        check_response(self.check_tx(chain))
    }

    fn deliver(&self, chain: &mut ChainState, _tx_hash: &[u8]) -> Response {
        let (proposal, approver) = match self.check_tx(chain) {
            Ok(found) => found,
            Err(rejection) => return rejection.settle(&mut chain.state),
        };
        account::increment_next_nonce(&mut chain.state, &approver.id);

        let height = chain.execution_height();
        let mut response = Response::success().with_tag(Tag::height("deposit_approval.height", height));
        if deposit_book::process_deposit(&mut chain.state, &proposal, &approver) {
            txstatus::set_status(&mut chain.state, &self.deposit_tx_hash, TxStatus::Success);
            response = response.with_tag(Tag::height("deposit_execution.height", height));
        }
        response
    }
}
