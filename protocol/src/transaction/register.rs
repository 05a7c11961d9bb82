//! `RegisterTransaction`: bind an address to a freshly derived chain id.
//!
//! Register has no sender account yet, so it skips sender resolution and the
//! nonce step. The signature must recover the very address being registered.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{check_response, CheckResult, Rejection, TxHandler};
use crate::account;
use crate::crypto::keys::ChainKeypair;
use crate::identity::Address;
use crate::response::{register as codes, Response};
use crate::signature::{
    Eip712Message, Eip712Signable, Eip712Value, JsonSignable, SignScheme, Signature, SignatureError,
};
use crate::storage::ChainState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTransaction {
    pub addr: Address,
    pub sig: Signature,
}

impl JsonSignable for RegisterTransaction {
    fn json_sign_map(&self) -> Value {
        json!({ "addr": self.addr.to_string() })
    }
}

impl Eip712Signable for RegisterTransaction {
    fn eip712_message(&self) -> Eip712Message {
        Eip712Message::new("Register").field("addr", Eip712Value::Address(self.addr))
    }
}

impl RegisterTransaction {
    /// Build and sign a registration for `keypair`'s own address.
    pub fn new_signed(keypair: &ChainKeypair, scheme: SignScheme) -> Result<Self, SignatureError> {
        let mut tx = Self {
            addr: keypair.address(),
            sig: Signature::Json(Vec::new()),
        };
        tx.sign(keypair, scheme)?;
        Ok(tx)
    }

    pub fn sign(&mut self, keypair: &ChainKeypair, scheme: SignScheme) -> Result<(), SignatureError> {
        self.sig = Signature::sign(&*self, keypair, scheme)?;
        Ok(())
    }

    fn check_tx(&self, chain: &ChainState) -> CheckResult<()> {
        if !self.validate_format() {
            return Err(Rejection::new(codes::INVALID_FORMAT, None));
        }
        match self.sig.recover(self) {
            Ok(addr) if addr == self.addr => {}
            Ok(addr) => {
                tracing::debug!(claimed = %self.addr, recovered_addr = %addr, "register signer mismatch");
                return Err(Rejection::new(codes::INVALID_SIGNATURE, None));
            }
            Err(e) => {
                tracing::debug!(error = %e, "register signature recovery failed");
                return Err(Rejection::new(codes::INVALID_SIGNATURE, None));
            }
        }
        if account::is_address_registered(&chain.state, &self.addr) {
            return Err(Rejection::new(codes::DUPLICATED, None));
        }
        Ok(())
    }
}

impl TxHandler for RegisterTransaction {
    fn kind(&self) -> &'static str {
        "RegisterTransaction"
    }

    fn validate_format(&self) -> bool {
        self.sig.is_present()
    }

    fn check(&self, chain: &ChainState) -> Response {
        check_response(self.check_tx(chain))
    }

    fn deliver(&self, chain: &mut ChainState, _tx_hash: &[u8]) -> Response {
        if let Err(rejection) = self.check_tx(chain) {
            return rejection.settle(&mut chain.state);
        }
        let id = account::create_account(chain, &self.addr);
        Response::success().with_data(id.as_bytes().to_vec())
    }
}
