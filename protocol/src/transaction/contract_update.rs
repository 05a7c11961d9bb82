//! `ContractUpdateTransaction`: an updater proposes (or backs) the next
//! bridge contract address.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{authenticate, check_response, CheckResult, CommonCodes, Rejection, TxHandler};
use crate::account;
use crate::approval::contract::{self as contract_book, ContractUpdateProposal};
use crate::approval::{ApprovalRejection, Approver};
use crate::crypto::keys::ChainKeypair;
use crate::identity::Identifier;
use crate::response::{contract_update as codes, Response, Tag};
use crate::signature::{JsonSignable, SignScheme, Signature, SignatureError};
use crate::storage::ChainState;

const KIND: &str = "ContractUpdateTransaction";

const COMMON: CommonCodes = CommonCodes {
    invalid_format: codes::INVALID_FORMAT,
    sender_not_registered: codes::SENDER_NOT_REGISTERED,
    invalid_signature: codes::INVALID_SIGNATURE,
    invalid_nonce: codes::INVALID_NONCE,
    duplicated: codes::DUPLICATED,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractUpdateTransaction {
    pub proposer: Identifier,
    pub proposal: ContractUpdateProposal,
    pub nonce: u64,
    pub sig: Signature,
}

impl JsonSignable for ContractUpdateTransaction {
    fn json_sign_map(&self) -> Value {
        json!({
            "contract_addr": self.proposal.contract_address.to_string(),
            "contract_index": self.proposal.contract_index,
            "identity": self.proposer.to_string(),
            "nonce": self.nonce,
        })
    }
}

impl ContractUpdateTransaction {
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

        contract_book::check_update(&chain.state, &self.proposal, &sender_id).map_err(|reason| {
            let code = match reason {
                ApprovalRejection::DoubleApproval => codes::DOUBLE_APPROVAL,
                ApprovalRejection::InvalidIndex => codes::INVALID_INDEX,
                _ => codes::NOT_UPDATER,
            };
            Rejection::new(code, Some(sender_id))
        })
    }
}

impl TxHandler for ContractUpdateTransaction {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn validate_format(&self) -> bool {
        self.sig.is_present()
    }

    fn check(&self, chain: &ChainState) -> Response {
        check_response(self.check_tx(chain))
    }

    fn deliver(&self, chain: &mut ChainState, _tx_hash: &[u8]) -> Response {
        let updater = match self.check_tx(chain) {
            Ok(updater) => updater,
            Err(rejection) => return rejection.settle(&mut chain.state),
        };
        account::increment_next_nonce(&mut chain.state, &updater.id);

        let height = chain.execution_height();
        let mut response = Response::success().with_tag(Tag::height("contract_update.height", height));
        if contract_book::process_update(chain, &self.proposal, &updater) {
            response = response.with_tag(Tag::height("contract_update_execution.height", height));
        }
        response
    }
}
