//! # Queries
//!
//! Read-only lookups answered from the committed chain state. Each path
//! takes raw request bytes and answers with a JSON document in `data`.
//!
//! | Path                    | Request data                 | Answer                               |
//! |-------------------------|------------------------------|--------------------------------------|
//! | `account_info`          | chain id or address string   | `{id, balance, next_nonce}`          |
//! | `address_info`          | `0x` address string          | `{id?, balance, next_nonce?}`        |
//! | `tx_state`              | 20-byte tx hash              | `{status}`                           |
//! | `withdraw_proof`        | packed withdrawal record     | `{height, root, proof}`              |
//! | `contract_update_proof` | contract index, 8 bytes BE   | `{height, root, contract_address, proof}` |
//!
//! Proofs are served against the withdraw tree as of the last commit;
//! records delivered in the open block are not provable yet. A proof
//! query must name a committed height, i.e. `1..=height`.

use serde::Serialize;

use crate::account;
use crate::approval::contract;
use crate::crypto::sha256;
use crate::identity::{Address, ChainId, Identifier};
use crate::response::{query as codes, Response};
use crate::storage::keys::decode_u64;
use crate::storage::{ChainState, MerkleProof, StateTree};
use crate::txstatus::{self, TxStatus};

/// Supported query paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryPath {
    AccountInfo,
    AddressInfo,
    TxState,
    WithdrawProof,
    ContractUpdateProof,
}

impl QueryPath {
    pub fn parse(path: &str) -> Option<Self> {
        match path.trim_start_matches('/') {
            "account_info" => Some(Self::AccountInfo),
            "address_info" => Some(Self::AddressInfo),
            "tx_state" => Some(Self::TxState),
            "withdraw_proof" => Some(Self::WithdrawProof),
            "contract_update_proof" => Some(Self::ContractUpdateProof),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Answer Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct AccountInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    balance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_nonce: Option<u64>,
}

#[derive(Debug, Serialize)]
struct TxState {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ProofStep {
    hash: String,
    left: bool,
}

/// Hex rendering of a [`MerkleProof`].
#[derive(Debug, Serialize)]
struct ProofView {
    key: String,
    value: String,
    index: usize,
    path: Vec<ProofStep>,
}

impl From<&MerkleProof> for ProofView {
    fn from(proof: &MerkleProof) -> Self {
        Self {
            key: hex::encode(&proof.key),
            value: hex::encode(&proof.value),
            index: proof.index,
            path: proof
                .path
                .iter()
                .map(|(hash, left)| ProofStep {
                    hash: hex::encode(hash),
                    left: *left,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WithdrawProof {
    height: i64,
    root: String,
    proof: ProofView,
}

#[derive(Debug, Serialize)]
struct ContractUpdateProof {
    height: i64,
    root: String,
    contract_address: String,
    proof: ProofView,
}

fn json_response<T: Serialize>(answer: &T) -> Response {
    match serde_json::to_vec(answer) {
        Ok(data) => Response::success().with_data(data),
        Err(e) => {
            tracing::warn!(error = %e, "cannot encode query answer");
            Response::failure(codes::PARSING_RESPONSE_ERROR)
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Answer `path` for request `data`. `height` is only read by proof paths.
pub fn query(chain: &ChainState, path: &str, data: &[u8], height: i64) -> Response {
    let Some(path) = QueryPath::parse(path) else {
        return Response::failure(codes::PATH_NOT_EXIST);
    };
    if data.is_empty() {
        tracing::debug!(?path, "query without request data");
        return Response::failure(codes::PARSING_REQUEST_ERROR);
    }
    match path {
        QueryPath::AccountInfo => account_info(&chain.state, data),
        QueryPath::AddressInfo => address_info(&chain.state, data),
        QueryPath::TxState => tx_state(&chain.state, data),
        QueryPath::WithdrawProof => withdraw_proof(chain, data, height),
        QueryPath::ContractUpdateProof => contract_update_proof(chain, data, height),
    }
}

fn account_info(state: &StateTree, data: &[u8]) -> Response {
    let Ok(text) = std::str::from_utf8(data) else {
        return Response::failure(codes::INVALID_IDENTIFIER);
    };
    let id = match Identifier::parse(text.trim()) {
        Ok(identifier) => account::resolve_identifier(state, &identifier),
        Err(_) => None,
    };
    let Some(id) = id else {
        tracing::debug!(identity = text, "account_info for unknown identity");
        return Response::failure(codes::INVALID_IDENTIFIER);
    };
    json_response(&AccountInfo {
        id: Some(id.to_string()),
        balance: account::fetch_balance(state, &id.into()).to_string(),
        next_nonce: Some(account::fetch_next_nonce(state, &id)),
    })
}

fn address_info(state: &StateTree, data: &[u8]) -> Response {
    let addr = std::str::from_utf8(data)
        .ok()
        .and_then(|text| Address::from_hex(text.trim()).ok());
    let Some(addr) = addr else {
        return Response::failure(codes::INVALID_IDENTIFIER);
    };

    let identifier = Identifier::Address(addr);
    let answer = match account::resolve_identifier(state, &identifier) {
        Some(id) => AccountInfo {
            id: Some(id.to_string()),
            balance: account::fetch_balance(state, &id.into()).to_string(),
            next_nonce: Some(account::fetch_next_nonce(state, &id)),
        },
        None => AccountInfo {
            id: None,
            balance: account::fetch_balance(state, &identifier).to_string(),
            next_nonce: None,
        },
    };
    json_response(&answer)
}

fn tx_state(state: &StateTree, tx_hash: &[u8]) -> Response {
    match txstatus::get_status(state, tx_hash) {
        TxStatus::NotSet => Response::failure(codes::TX_NOT_EXIST),
        status => json_response(&TxState { status: status.as_str() }),
    }
}

fn is_committed_height(chain: &ChainState, height: i64) -> bool {
    height > 0 && height <= chain.height
}

fn withdraw_proof(chain: &ChainState, packed: &[u8], height: i64) -> Response {
    if !is_committed_height(chain, height) {
        tracing::debug!(height, committed = chain.height, "withdraw proof at invalid height");
        return Response::failure(codes::WITHDRAW_PROOF_INVALID_HEIGHT);
    }
    let tree = &chain.committed_withdraw;
    let Some(proof) = tree.prove(&sha256(packed)) else {
        tracing::debug!(packed = %hex::encode(packed), "no withdraw record");
        return Response::failure(codes::WITHDRAW_PROOF_NOT_EXIST);
    };
    json_response(&WithdrawProof {
        height: chain.height,
        root: hex::encode(tree.root_hash()),
        proof: ProofView::from(&proof),
    })
}

fn contract_update_proof(chain: &ChainState, data: &[u8], height: i64) -> Response {
    if !is_committed_height(chain, height) {
        tracing::debug!(height, committed = chain.height, "contract update proof at invalid height");
        return Response::failure(codes::CONTRACT_UPDATE_PROOF_INVALID_HEIGHT);
    }
    let Some(index) = decode_u64(data) else {
        return Response::failure(codes::CONTRACT_UPDATE_PROOF_NOT_EXIST);
    };
    let tree = &chain.committed_withdraw;
    let found = contract::execution(tree, index).zip(tree.prove(&contract::execution_key(index)));
    let Some((address, proof)) = found else {
        return Response::failure(codes::CONTRACT_UPDATE_PROOF_NOT_EXIST);
    };
    json_response(&ContractUpdateProof {
        height: chain.height,
        root: hex::encode(tree.root_hash()),
        contract_address: address.to_string(),
        proof: ProofView::from(&proof),
    })
}

/// Decode an `account_info`/`address_info` answer's chain id.
pub fn parse_account_id(data: &[u8]) -> Option<ChainId> {
    let value: serde_json::Value = serde_json::from_slice(data).ok()?;
    ChainId::from_base64(value.get("id")?.as_str()?).ok()
}
