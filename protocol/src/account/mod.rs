//! # Account Ledger
//!
//! Balances, nonces and the binding between addresses and chain ids, all
//! stored in the main state tree.
//!
//! ## Key Layout
//!
//! Identifiers are embedded in keys by their display form (`0x…` hex for
//! addresses, base64 for chain ids), so the two kinds never collide.
//!
//! | Key                               | Value                      |
//! |-----------------------------------|----------------------------|
//! | `acc_<addr>_id`                   | chain id (20 bytes)        |
//! | `acc_<id>_addr_<addr>`            | empty (link marker)        |
//! | `acc_<identifier>_balance`        | canonical amount bytes     |
//! | `acc_<id>_nextNonce`              | u64 BE                     |
//! | `$account.likeChainIDSeed`        | u64 BE                     |
//!
//! A raw address may hold a balance before it is registered. Registration
//! moves that balance onto the new chain id.

use crate::amount::BoundedAmount;
use crate::config::{CHAIN_ID_LENGTH, CHAIN_ID_SEED_START};
use crate::crypto::keccak256_multi;
use crate::identity::{Address, ChainId, Identifier};
use crate::storage::keys::{decode_u64, encode_u64, raw_key};
use crate::storage::{ChainState, StateTree};

const ACCOUNT_PREFIX: &str = "acc";
const CHAIN_ID_SEED_KEY: &[u8] = b"$account.likeChainIDSeed";

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

fn address_to_id_key(addr: &Address) -> Vec<u8> {
    raw_key(addr.to_string().as_bytes(), ACCOUNT_PREFIX, "id")
}

fn id_to_address_prefix(id: &ChainId) -> Vec<u8> {
    raw_key(id.to_string().as_bytes(), ACCOUNT_PREFIX, "addr_")
}

fn id_to_address_key(id: &ChainId, addr: &Address) -> Vec<u8> {
    let mut key = id_to_address_prefix(id);
    key.extend_from_slice(addr.to_string().as_bytes());
    key
}

fn balance_key(identifier: &Identifier) -> Vec<u8> {
    raw_key(identifier.to_string().as_bytes(), ACCOUNT_PREFIX, "balance")
}

fn nonce_key(id: &ChainId) -> Vec<u8> {
    raw_key(id.to_string().as_bytes(), ACCOUNT_PREFIX, "nextNonce")
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn next_seed(state: &StateTree) -> u64 {
    state
        .get(CHAIN_ID_SEED_KEY)
        .and_then(decode_u64)
        .unwrap_or(CHAIN_ID_SEED_START)
}

fn derive_chain_id(seed: u64, block_hash: &[u8]) -> ChainId {
    let digest = keccak256_multi(&[&encode_u64(seed)[..], block_hash]);
    let mut id = [0u8; CHAIN_ID_LENGTH];
    id.copy_from_slice(&digest[..CHAIN_ID_LENGTH]);
    ChainId(id)
}

/// Register `addr` under a freshly derived chain id.
///
/// The id is `Keccak256(seed ‖ block_hash)[..20]`; the seed advances on
/// every derivation. The new account starts with next nonce 1.
pub fn create_account(chain: &mut ChainState, addr: &Address) -> ChainId {
    let mut seed = next_seed(&chain.state);
    let mut id = derive_chain_id(seed, &chain.block_hash);
    while is_chain_id_registered(&chain.state, &id) {
        seed += 1;
        id = derive_chain_id(seed, &chain.block_hash);
    }
    chain.state.set(CHAIN_ID_SEED_KEY.to_vec(), encode_u64(seed + 1).to_vec());

    create_account_with_id(&mut chain.state, id, addr);
    tracing::debug!(%addr, chain_id = %id, "account created");
    id
}

/// Bind `addr` to a caller-chosen id and start its nonce at 1. Genesis
/// uses this directly.
pub fn create_account_with_id(state: &mut StateTree, id: ChainId, addr: &Address) {
    let addr_balance_key = balance_key(&Identifier::Address(*addr));
    let pending = state
        .remove(&addr_balance_key)
        .and_then(|bytes| BoundedAmount::from_canonical_bytes(&bytes).ok());

    state.set(address_to_id_key(addr), id.as_bytes().to_vec());
    state.set(id_to_address_key(&id, addr), Vec::new());

    if let Some(amount) = pending {
        add_balance(state, &Identifier::ChainId(id), &amount);
    }
    increment_next_nonce(state, &id);
}

pub fn is_address_registered(state: &StateTree, addr: &Address) -> bool {
    state.contains(&address_to_id_key(addr))
}

pub fn is_chain_id_registered(state: &StateTree, id: &ChainId) -> bool {
    state.has_prefix(&id_to_address_prefix(id))
}

/// `true` iff `addr` is currently linked to `id`.
pub fn has_linked_address(state: &StateTree, id: &ChainId, addr: &Address) -> bool {
    state.contains(&id_to_address_key(id, addr))
}

/// Every address linked to `id`, in key order.
pub fn linked_addresses(state: &StateTree, id: &ChainId) -> Vec<Address> {
    let prefix = id_to_address_prefix(id);
    state
        .scan_prefix(&prefix)
        .filter_map(|(key, _)| {
            let suffix = std::str::from_utf8(&key[prefix.len()..]).ok()?;
            Address::from_hex(suffix).ok()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The chain id an identifier denotes, if the account exists.
pub fn resolve_identifier(state: &StateTree, identifier: &Identifier) -> Option<ChainId> {
    match identifier {
        Identifier::ChainId(id) => is_chain_id_registered(state, id).then_some(*id),
        Identifier::Address(addr) => {
            let bytes = state.get(&address_to_id_key(addr))?;
            ChainId::from_slice(bytes).ok()
        }
    }
}

/// Registered address → its chain id. Anything else is returned unchanged.
pub fn normalize_identifier(state: &StateTree, identifier: &Identifier) -> Identifier {
    match identifier {
        Identifier::Address(_) => match resolve_identifier(state, identifier) {
            Some(id) => Identifier::ChainId(id),
            None => *identifier,
        },
        Identifier::ChainId(_) => *identifier,
    }
}

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

pub fn fetch_balance(state: &StateTree, identifier: &Identifier) -> BoundedAmount {
    let key = balance_key(&normalize_identifier(state, identifier));
    state
        .get(&key)
        .and_then(|bytes| BoundedAmount::from_canonical_bytes(bytes).ok())
        .unwrap_or_else(BoundedAmount::zero)
}

fn save_balance(state: &mut StateTree, identifier: &Identifier, balance: &BoundedAmount) {
    let key = balance_key(&normalize_identifier(state, identifier));
    state.set(key, balance.to_canonical_bytes());
}

pub fn add_balance(state: &mut StateTree, identifier: &Identifier, amount: &BoundedAmount) {
    let balance = fetch_balance(state, identifier) + *amount;
    save_balance(state, identifier, &balance);
}

/// Debit `amount`.
///
/// # Panics
///
/// If `amount` exceeds the balance. Callers check sufficiency first.
pub fn subtract_balance(state: &mut StateTree, identifier: &Identifier, amount: &BoundedAmount) {
    let balance = fetch_balance(state, identifier) - *amount;
    save_balance(state, identifier, &balance);
}

// ---------------------------------------------------------------------------
// Nonces
// ---------------------------------------------------------------------------

/// Next nonce the account must use. Unknown accounts report 0.
pub fn fetch_next_nonce(state: &StateTree, id: &ChainId) -> u64 {
    state.get(&nonce_key(id)).and_then(decode_u64).unwrap_or(0)
}

pub fn increment_next_nonce(state: &mut StateTree, id: &ChainId) {
    let next = fetch_next_nonce(state, id) + 1;
    state.set(nonce_key(id), encode_u64(next).to_vec());
}
