//! `DepositTransaction`: an approver proposes the deposits seen in one
//! external block and backs the proposal with its own weight.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{authenticate, check_response, CheckResult, CommonCodes, Rejection, TxHandler};
use crate::account;
use crate::approval::deposit::{self as deposit_book, DepositProposal};
use crate::approval::{ApprovalRejection, Approver};
use crate::crypto::keys::ChainKeypair;
use crate::identity::Identifier;
use crate::response::{deposit as codes, Response, Tag};
use crate::signature::{JsonSignable, SignScheme, Signature, SignatureError};
use crate::storage::ChainState;
use crate::txstatus::TxStatus;

const KIND: &str = "DepositTransaction";

const COMMON: CommonCodes = CommonCodes {
    invalid_format: codes::INVALID_FORMAT,
    sender_not_registered: codes::SENDER_NOT_REGISTERED,
    invalid_signature: codes::INVALID_SIGNATURE,
    invalid_nonce: codes::INVALID_NONCE,
    duplicated: codes::DUPLICATED,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositTransaction {
    pub proposer: Identifier,
    pub proposal: DepositProposal,
    pub nonce: u64,
    pub sig: Signature,
}

impl JsonSignable for DepositTransaction {
    fn json_sign_map(&self) -> Value {
        let inputs: Vec<Value> = self
            .proposal
            .sorted_inputs()
            .iter()
            .map(|input| {
                json!({
                    "from_addr": input.from_addr.to_string(),
                    "value": input.value.to_string(),
                })
            })
            .collect();
        json!({
            "block_number": self.proposal.block_number,
            "identity": self.proposer.to_string(),
            "inputs": inputs,
            "nonce": self.nonce,
        })
    }
}

impl DepositTransaction {
    pub fn sign(&mut self, keypair: &ChainKeypair, scheme: SignScheme) -> Result<(), SignatureError> {
        self.sig = Signature::sign_json_only(&*self, keypair, scheme, KIND)?;
        Ok(())
    }

    fn check_tx(&self, chain: &ChainState) -> CheckResult<Approver> {
        if !self.validate_format() {
            return Err(Rejection::new(COMMON.invalid_format, None));
        }
        let sender_id = authenticate(&chain.state, KIND, &self.proposer, self.nonce, &COMMON, || {
            self.sig.recover_json_only(self, KIND)
        })?;

        deposit_book::check_deposit(&chain.state, &self.proposal, &sender_id).map_err(|reason| {
            let code = match reason {
                ApprovalRejection::AlreadyExecuted => codes::ALREADY_EXECUTED,
                ApprovalRejection::DoubleApproval => codes::DOUBLE_APPROVAL,
                _ => codes::NOT_APPROVER,
            };
            Rejection::new(code, Some(sender_id))
        })
    }
}

impl TxHandler for DepositTransaction {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate_format(&self) -> bool {
        self.sig.is_present() && self.proposal.validate()
    }

    fn check(&self, chain: &ChainState) -> Response {
        check_response(self.check_tx(chain))
    }

    fn deliver(&self, chain: &mut ChainState, tx_hash: &[u8]) -> Response {
        let approver = match self.check_tx(chain) {
            Ok(approver) => approver,
            Err(rejection) => return rejection.settle(&mut chain.state),
        };
        account::increment_next_nonce(&mut chain.state, &approver.id);
        deposit_book::record_proposal(&mut chain.state, tx_hash, &self.proposal);

        let height = chain.execution_height();
        let mut response = Response::success().with_tag(Tag::height("deposit.height", height));
        if deposit_book::process_deposit(&mut chain.state, &self.proposal, &approver) {
            response = response.with_tag(Tag::height("deposit_execution.height", height));
        } else {
            response = response.with_status(TxStatus::Pending);
        }
        response
    }
}
