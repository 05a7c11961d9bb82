//! # Genesis
//!
//! The initial chain state, loaded once from a JSON document:
//!
//! ```json
//! {
//!   "accounts": [
//!     { "id": "<base64 chain id>", "addr": "0x…", "balance": "1000" }
//!   ],
//!   "deposit_approvers": [{ "id": "<base64 chain id>", "weight": 1 }],
//!   "contract_updaters": [{ "id": "<base64 chain id>", "weight": 1 }]
//! }
//! ```
//!
//! Accounts are created with the id they are listed under, so genesis ids
//! never come from the registration seed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::account;
use crate::amount::{AmountError, BoundedAmount};
use crate::approval::{contract, deposit, Approver};
use crate::identity::{Address, ChainId, IdentityError};
use crate::storage::ChainState;

#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    #[error("malformed genesis document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("genesis entry {entry}: {source}")]
    Identity {
        entry: usize,
        #[source]
        source: IdentityError,
    },

    #[error("genesis entry {entry}: invalid balance: {source}")]
    Balance {
        entry: usize,
        #[source]
        source: AmountError,
    },

    #[error("genesis entry {entry}: balance {balance} exceeds 256 bits")]
    BalanceOutOfRange { entry: usize, balance: String },

    #[error("genesis entry {entry}: duplicated chain id {id}")]
    DuplicatedId { entry: usize, id: String },

    #[error("genesis entry {entry}: duplicated address {addr}")]
    DuplicatedAddress { entry: usize, addr: String },

    #[error("cannot encode approver set: {0}")]
    ApproverSet(#[from] bincode::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub id: String,
    pub addr: String,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisApprover {
    pub id: String,
    pub weight: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisDocument {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub deposit_approvers: Vec<GenesisApprover>,
    #[serde(default)]
    pub contract_updaters: Vec<GenesisApprover>,
}

impl GenesisDocument {
    pub fn from_json(json: &str) -> Result<Self, GenesisError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate every entry, then write the accounts and approval sets into
    /// `chain`. Nothing is written if any entry is rejected.
    pub fn apply(&self, chain: &mut ChainState) -> Result<(), GenesisError> {
        let accounts = self.parse_accounts()?;
        let depositors = parse_approvers(&self.deposit_approvers)?;
        let updaters = parse_approvers(&self.contract_updaters)?;

        deposit::BOOK.set_members(&mut chain.state, &depositors)?;
        contract::BOOK.set_members(&mut chain.state, &updaters)?;
        for (id, addr, balance) in &accounts {
            account::create_account_with_id(&mut chain.state, *id, addr);
            account::add_balance(&mut chain.state, &(*id).into(), balance);
        }

        tracing::info!(
            accounts = accounts.len(),
            deposit_approvers = depositors.len(),
            contract_updaters = updaters.len(),
            "genesis state loaded"
        );
        Ok(())
    }

    fn parse_accounts(&self) -> Result<Vec<(ChainId, Address, BoundedAmount)>, GenesisError> {
        let mut ids = HashSet::new();
        let mut addrs = HashSet::new();
        let mut parsed = Vec::with_capacity(self.accounts.len());

        for (entry, acc) in self.accounts.iter().enumerate() {
            let identity = |source| GenesisError::Identity { entry, source };
            let id = ChainId::from_base64(&acc.id).map_err(identity)?;
            let addr = Address::from_hex(&acc.addr).map_err(identity)?;
            let balance = BoundedAmount::from_decimal_string(&acc.balance).map_err(|source| match source {
                AmountError::OutOfRange { .. } => GenesisError::BalanceOutOfRange {
                    entry,
                    balance: acc.balance.clone(),
                },
                source => GenesisError::Balance { entry, source },
            })?;
            if !ids.insert(id) {
                return Err(GenesisError::DuplicatedId { entry, id: id.to_string() });
            }
            if !addrs.insert(addr) {
                return Err(GenesisError::DuplicatedAddress { entry, addr: addr.to_string() });
            }
            parsed.push((id, addr, balance));
        }
        Ok(parsed)
    }
}

fn parse_approvers(entries: &[GenesisApprover]) -> Result<Vec<Approver>, GenesisError> {
    entries
        .iter()
        .enumerate()
        .map(|(entry, a)| {
            let id = ChainId::from_base64(&a.id).map_err(|source| GenesisError::Identity { entry, source })?;
            Ok(Approver { id, weight: a.weight })
        })
        .collect()
}
