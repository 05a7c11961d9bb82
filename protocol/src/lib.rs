// Copyright (c) 2026 LikeChain Developers. MIT License.
// See LICENSE for details.

//! # LikeChain Protocol: Core Library
//!
//! The deterministic state machine behind LikeChain: a token ledger with a
//! 1:1 bridge to an external smart-contract chain. A consensus host feeds it
//! raw transaction bytes; every node must reach identical state.
//!
//! ## Architecture
//!
//! - **app** — the host-facing lifecycle: genesis, blocks, commit, queries.
//! - **transaction** — the nine transaction variants and their check/deliver
//!   rules, plus the binary wire codec.
//! - **signature** — JSON and EIP-712 signing schemes over secp256k1.
//! - **account** — balances, nonces, address/chain-id binding.
//! - **approval** — weighted 2/3 approval for deposits and contract updates.
//! - **htlc** — hash-time-locked transfers.
//! - **txstatus** — per-transaction status records.
//! - **storage** — state trees, chain context and sled persistence.
//! - **identity**, **amount**, **crypto** — value types and primitives.
//! - **response**, **config** — result codes and protocol constants.
//!
//! Handlers never panic on untrusted input. Every rejection is a coded
//! [`Response`].

pub mod account;
pub mod amount;
pub mod app;
pub mod approval;
pub mod config;
pub mod crypto;
pub mod genesis;
pub mod htlc;
pub mod identity;
pub mod query;
pub mod response;
pub mod signature;
pub mod storage;
pub mod transaction;
pub mod txstatus;

pub use amount::BoundedAmount;
pub use app::{AppError, AppInfo, Application};
pub use genesis::GenesisDocument;
pub use identity::{Address, ChainId, Identifier};
pub use response::{Response, ResponseCode, Tag};
pub use signature::{SignScheme, Signature};
pub use storage::{ChainDB, ChainState};
pub use transaction::{tx_hash, Transaction};
pub use txstatus::TxStatus;
