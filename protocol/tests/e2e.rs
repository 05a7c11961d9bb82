//! End-to-end tests for the LikeChain application.
//!
//! Every test drives [`Application`] the way a consensus host would: raw
//! transaction bytes in, coded responses out, one `begin_block`/`commit`
//! pair per block. Accounts come from a genesis document so their ids and
//! starting nonces are known up front.

use likechain_protocol::amount::BoundedAmount;
use likechain_protocol::approval::contract::ContractUpdateProposal;
use likechain_protocol::approval::deposit::{DepositInput, DepositProposal};
use likechain_protocol::crypto::keys::ChainKeypair;
use likechain_protocol::crypto::sha256;
use likechain_protocol::genesis::{GenesisAccount, GenesisApprover, GenesisDocument};
use likechain_protocol::htlc::HashedTransfer;
use likechain_protocol::identity::{Address, ChainId, Identifier};
use likechain_protocol::response::{
    claim_hashed_transfer, contract_update, deposit, deposit_approval, hashed_transfer, register,
    query as query_codes, simple_transfer, transfer, withdraw,
};
use likechain_protocol::signature::{SignScheme, Signature};
use likechain_protocol::storage::ChainDB;
use likechain_protocol::transaction::withdraw::PACKED_LENGTH;
use likechain_protocol::transaction::{
    tx_hash, ClaimHashedTransferTransaction, ContractUpdateTransaction, DepositApprovalTransaction,
    DepositTransaction, HashedTransferTransaction, RegisterTransaction, SimpleTransferTransaction,
    Transaction, TransferOutput, TransferTransaction, WithdrawTransaction,
};
use likechain_protocol::txstatus::{self, TxStatus};
use likechain_protocol::{query, Application, Response};

use serde_json::Value;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const BLOCK_TIME: i64 = 1_600_000_000;

/// Genesis seeds: Alice holds 100, Bob holds nothing, Carol (33) and
/// Dave (67) approve deposits and contract updates.
const ALICE: u8 = 1;
const BOB: u8 = 2;
const CAROL: u8 = 3;
const DAVE: u8 = 4;

fn keypair(seed: u8) -> ChainKeypair {
    let mut secret = [0x33u8; 32];
    secret[31] = seed;
    ChainKeypair::from_bytes(&secret).expect("valid test key")
}

fn id(seed: u8) -> ChainId {
    ChainId([seed; 20])
}

fn genesis() -> GenesisDocument {
    let account = |seed: u8, balance: &str| GenesisAccount {
        id: id(seed).to_string(),
        addr: keypair(seed).address().to_string(),
        balance: balance.to_string(),
    };
    let approvers = vec![
        GenesisApprover { id: id(CAROL).to_string(), weight: 33 },
        GenesisApprover { id: id(DAVE).to_string(), weight: 67 },
    ];
    GenesisDocument {
        accounts: vec![
            account(ALICE, "100"),
            account(BOB, "0"),
            account(CAROL, "0"),
            account(DAVE, "0"),
        ],
        deposit_approvers: approvers.clone(),
        contract_updaters: approvers,
    }
}

fn app() -> Application {
    let mut app = Application::in_memory();
    app.init_chain(&genesis()).expect("genesis applies");
    app.begin_block(vec![0x42; 32], BLOCK_TIME);
    app
}

fn encode(tx: impl Into<Transaction>) -> Vec<u8> {
    tx.into().encode().expect("encodable")
}

fn deliver(app: &mut Application, tx: impl Into<Transaction>) -> Response {
    let raw = encode(tx);
    app.deliver_tx(&raw)
}

fn balance(app: &Application, who: impl Into<Identifier>) -> BoundedAmount {
    likechain_protocol::account::fetch_balance(&app.chain().state, &who.into())
}

fn next_nonce(app: &Application, who: &ChainId) -> u64 {
    likechain_protocol::account::fetch_next_nonce(&app.chain().state, who)
}

fn unsigned() -> Signature {
    Signature::Json(Vec::new())
}

fn simple_transfer_tx(from: u8, to: Identifier, value: u64, nonce: u64) -> SimpleTransferTransaction {
    let mut tx = SimpleTransferTransaction {
        from: id(from).into(),
        to,
        value: BoundedAmount::from(value),
        remark: String::new(),
        fee: BoundedAmount::zero(),
        nonce,
        sig: unsigned(),
    };
    tx.sign(&keypair(from), SignScheme::Json).unwrap();
    tx
}

fn lock_tx(value: u64, fee: u64, expiry: i64, nonce: u64) -> HashedTransferTransaction {
    let mut tx = HashedTransferTransaction {
        htlc: HashedTransfer {
            from: id(ALICE).into(),
            to: id(BOB).into(),
            value: BoundedAmount::from(value),
            hash_commit: sha256(&SECRET),
            expiry,
        },
        fee: BoundedAmount::from(fee),
        nonce,
        sig: unsigned(),
    };
    tx.sign(&keypair(ALICE), SignScheme::Eip712).unwrap();
    tx
}

fn claim_tx(seed: u8, htlc_tx_hash: &[u8], secret: &[u8], nonce: u64) -> ClaimHashedTransferTransaction {
    let mut tx = ClaimHashedTransferTransaction {
        from: id(seed).into(),
        htlc_tx_hash: htlc_tx_hash.to_vec(),
        secret: secret.to_vec(),
        nonce,
        sig: unsigned(),
    };
    tx.sign(&keypair(seed), SignScheme::Json).unwrap();
    tx
}

fn deposit_tx(seed: u8, block_number: u64, nonce: u64) -> DepositTransaction {
    let mut tx = DepositTransaction {
        proposer: id(seed).into(),
        proposal: DepositProposal {
            block_number,
            inputs: vec![DepositInput {
                from_addr: keypair(BOB).address(),
                value: BoundedAmount::from(500),
            }],
        },
        nonce,
        sig: unsigned(),
    };
    tx.sign(&keypair(seed), SignScheme::Json).unwrap();
    tx
}

fn approval_tx(seed: u8, deposit_tx_hash: &[u8], nonce: u64) -> DepositApprovalTransaction {
    let mut tx = DepositApprovalTransaction {
        approver: id(seed).into(),
        deposit_tx_hash: deposit_tx_hash.to_vec(),
        nonce,
        sig: unsigned(),
    };
    tx.sign(&keypair(seed), SignScheme::Json).unwrap();
    tx
}

fn contract_update_tx(seed: u8, index: u64, nonce: u64) -> ContractUpdateTransaction {
    let mut tx = ContractUpdateTransaction {
        proposer: id(seed).into(),
        proposal: ContractUpdateProposal {
            contract_index: index,
            contract_address: Address([0xc0; 20]),
        },
        nonce,
        sig: unsigned(),
    };
    tx.sign(&keypair(seed), SignScheme::Json).unwrap();
    tx
}

fn withdraw_tx(value: u64, fee: u64, nonce: u64) -> WithdrawTransaction {
    let mut tx = WithdrawTransaction {
        from: keypair(ALICE).address().into(),
        to_addr: Address([0xee; 20]),
        value: BoundedAmount::from(value),
        fee: BoundedAmount::from(fee),
        nonce,
        sig: unsigned(),
    };
    tx.sign(&keypair(ALICE), SignScheme::Eip712).unwrap();
    tx
}

const SECRET: [u8; 32] = [0x5e; 32];

fn json(response: &Response) -> Value {
    serde_json::from_slice(&response.data).expect("json answer")
}

// ---------------------------------------------------------------------------
// 1. Registration and Transfers
// ---------------------------------------------------------------------------

#[test]
fn address_balance_follows_registration() {
    let mut app = app();
    let newcomer = keypair(9);

    let r = deliver(&mut app, simple_transfer_tx(ALICE, newcomer.address().into(), 30, 1));
    assert!(r.is_ok());
    assert_eq!(balance(&app, newcomer.address()), BoundedAmount::from(30));

    let r = deliver(&mut app, RegisterTransaction::new_signed(&newcomer, SignScheme::Eip712).unwrap());
    assert!(r.is_ok());
    let new_id = ChainId::from_slice(&r.data).unwrap();
    assert_eq!(balance(&app, new_id), BoundedAmount::from(30));
    assert_eq!(next_nonce(&app, &new_id), 1);

    let info = app.query("account_info", newcomer.address().to_string().as_bytes(), 0);
    assert_eq!(query::parse_account_id(&info.data), Some(new_id));
    assert_eq!(json(&info)["balance"], "30");
}

#[test]
fn multi_output_transfer() {
    let mut app = app();
    let mut tx = TransferTransaction {
        from: id(ALICE).into(),
        outputs: vec![
            TransferOutput { to: id(BOB).into(), value: BoundedAmount::from(40), remark: Vec::new() },
            TransferOutput { to: Address([7; 20]).into(), value: BoundedAmount::from(10), remark: b"hi".to_vec() },
        ],
        fee: BoundedAmount::from(2),
        nonce: 1,
        sig: unsigned(),
    };
    tx.sign(&keypair(ALICE), SignScheme::Json).unwrap();

    assert!(deliver(&mut app, tx).is_ok());
    assert_eq!(balance(&app, id(ALICE)), BoundedAmount::from(48));
    assert_eq!(balance(&app, id(BOB)), BoundedAmount::from(40));
    assert_eq!(balance(&app, Address([7; 20])), BoundedAmount::from(10));
}

#[test]
fn balance_boundary() {
    let mut app = app();
    // Exactly the whole balance passes, one more does not.
    let over = simple_transfer_tx(ALICE, id(BOB).into(), 101, 1);
    assert_eq!(app.check_tx(&encode(over)).code, simple_transfer::NOT_ENOUGH_BALANCE.code);

    let exact = simple_transfer_tx(ALICE, id(BOB).into(), 100, 1);
    assert!(deliver(&mut app, exact).is_ok());
    assert!(balance(&app, id(ALICE)).is_zero());

    // A charged failure still consumes the nonce.
    let r = deliver(&mut app, simple_transfer_tx(ALICE, id(BOB).into(), 1, 2));
    assert_eq!(r.deliver_code(), simple_transfer::NOT_ENOUGH_BALANCE.code + 1);
    assert_eq!(next_nonce(&app, &id(ALICE)), 3);
}

#[test]
fn every_variant_survives_the_wire() {
    let mut transfer = TransferTransaction {
        from: id(ALICE).into(),
        outputs: vec![TransferOutput { to: id(BOB).into(), value: BoundedAmount::from(1), remark: b"x".to_vec() }],
        fee: BoundedAmount::zero(),
        nonce: 1,
        sig: unsigned(),
    };
    transfer.sign(&keypair(ALICE), SignScheme::Json).unwrap();

    let txs: Vec<Transaction> = vec![
        RegisterTransaction::new_signed(&keypair(9), SignScheme::Json).unwrap().into(),
        transfer.into(),
        deposit_tx(CAROL, 1, 1).into(),
        approval_tx(DAVE, &[1; 20], 1).into(),
        withdraw_tx(1, 1, 1).into(),
        lock_tx(1, 1, BLOCK_TIME + 1, 1).into(),
        claim_tx(BOB, &[1; 20], &SECRET, 1).into(),
        simple_transfer_tx(ALICE, id(BOB).into(), 1, 1).into(),
        contract_update_tx(CAROL, 1, 1).into(),
    ];
    for tx in txs {
        let raw = tx.encode().unwrap();
        let decoded = Transaction::decode(&raw).unwrap();
        assert_eq!(decoded.kind(), tx.kind());
        assert_eq!(decoded, tx);
        // Format checks see the same fields after decoding.
        assert!(decoded.validate_format());
    }
}

// ---------------------------------------------------------------------------
// 2. Nonce Handling Across Variants
// ---------------------------------------------------------------------------

#[test]
fn nonce_table() {
    let app = app();
    // (raw tx with nonce 2 while next is 1, expected code)
    let ahead: Vec<(Vec<u8>, u32)> = vec![
        (encode(simple_transfer_tx(ALICE, id(BOB).into(), 1, 2)), simple_transfer::INVALID_NONCE.code),
        (encode(lock_tx(1, 0, BLOCK_TIME + 60, 2)), hashed_transfer::INVALID_NONCE.code),
        (encode(withdraw_tx(1, 0, 2)), withdraw::INVALID_NONCE.code),
        (encode(deposit_tx(CAROL, 10, 2)), deposit::INVALID_NONCE.code),
        (encode(contract_update_tx(CAROL, 1, 2)), contract_update::INVALID_NONCE.code),
        (encode(approval_tx(CAROL, &[0; 20], 2)), deposit_approval::INVALID_NONCE.code),
        (encode(claim_tx(BOB, &[0; 20], &SECRET, 2)), claim_hashed_transfer::INVALID_NONCE.code),
    ];
    for (raw, code) in ahead {
        assert_eq!(app.check_tx(&raw).code, code);
    }

    let mut stale = TransferTransaction {
        from: id(ALICE).into(),
        outputs: vec![TransferOutput { to: id(BOB).into(), value: BoundedAmount::from(1), remark: Vec::new() }],
        fee: BoundedAmount::zero(),
        nonce: 0,
        sig: unsigned(),
    };
    stale.sign(&keypair(ALICE), SignScheme::Json).unwrap();
    assert_eq!(app.check_tx(&encode(stale)).code, transfer::DUPLICATED.code);
}

/// One variant's deliver-side nonce behaviour: `ahead` carries nonce 2 while
/// the sender's next nonce is 1; `charged` carries nonce 1 and fails a
/// business rule.
struct NonceCase {
    name: &'static str,
    sender: u8,
    ahead: (Vec<u8>, u32),
    charged: (Vec<u8>, u32),
    duplicated: u32,
}

fn transfer_tx(from: u8, to: u8, value: u64, nonce: u64) -> TransferTransaction {
    let mut tx = TransferTransaction {
        from: id(from).into(),
        outputs: vec![TransferOutput { to: id(to).into(), value: BoundedAmount::from(value), remark: Vec::new() }],
        fee: BoundedAmount::zero(),
        nonce,
        sig: unsigned(),
    };
    tx.sign(&keypair(from), SignScheme::Json).unwrap();
    tx
}

fn nonce_cases() -> Vec<NonceCase> {
    vec![
        NonceCase {
            name: "transfer",
            sender: BOB,
            ahead: (encode(transfer_tx(BOB, ALICE, 1, 2)), transfer::INVALID_NONCE.code),
            charged: (encode(transfer_tx(BOB, ALICE, 1, 1)), transfer::NOT_ENOUGH_BALANCE.code),
            duplicated: transfer::DUPLICATED.code,
        },
        NonceCase {
            name: "simple_transfer",
            sender: BOB,
            ahead: (encode(simple_transfer_tx(BOB, id(ALICE).into(), 1, 2)), simple_transfer::INVALID_NONCE.code),
            charged: (
                encode(simple_transfer_tx(BOB, id(ALICE).into(), 1, 1)),
                simple_transfer::NOT_ENOUGH_BALANCE.code,
            ),
            duplicated: simple_transfer::DUPLICATED.code,
        },
        NonceCase {
            name: "withdraw",
            sender: ALICE,
            ahead: (encode(withdraw_tx(1, 0, 2)), withdraw::INVALID_NONCE.code),
            charged: (encode(withdraw_tx(100, 1, 1)), withdraw::NOT_ENOUGH_BALANCE.code),
            duplicated: withdraw::DUPLICATED.code,
        },
        NonceCase {
            name: "hashed_transfer",
            sender: ALICE,
            ahead: (encode(lock_tx(1, 0, BLOCK_TIME + 60, 2)), hashed_transfer::INVALID_NONCE.code),
            charged: (encode(lock_tx(1, 0, BLOCK_TIME, 1)), hashed_transfer::INVALID_EXPIRY.code),
            duplicated: hashed_transfer::DUPLICATED.code,
        },
        NonceCase {
            name: "claim_hashed_transfer",
            sender: BOB,
            ahead: (encode(claim_tx(BOB, &[9; 20], &SECRET, 2)), claim_hashed_transfer::INVALID_NONCE.code),
            charged: (encode(claim_tx(BOB, &[9; 20], &SECRET, 1)), claim_hashed_transfer::TX_NOT_EXIST.code),
            duplicated: claim_hashed_transfer::DUPLICATED.code,
        },
        NonceCase {
            name: "deposit",
            sender: ALICE,
            ahead: (encode(deposit_tx(ALICE, 10, 2)), deposit::INVALID_NONCE.code),
            charged: (encode(deposit_tx(ALICE, 10, 1)), deposit::NOT_APPROVER.code),
            duplicated: deposit::DUPLICATED.code,
        },
        NonceCase {
            name: "deposit_approval",
            sender: DAVE,
            ahead: (encode(approval_tx(DAVE, &[9; 20], 2)), deposit_approval::INVALID_NONCE.code),
            charged: (encode(approval_tx(DAVE, &[9; 20], 1)), deposit_approval::PROPOSAL_NOT_EXIST.code),
            duplicated: deposit_approval::DUPLICATED.code,
        },
        NonceCase {
            name: "contract_update",
            sender: ALICE,
            ahead: (encode(contract_update_tx(ALICE, 1, 2)), contract_update::INVALID_NONCE.code),
            charged: (encode(contract_update_tx(ALICE, 1, 1)), contract_update::NOT_UPDATER.code),
            duplicated: contract_update::DUPLICATED.code,
        },
    ]
}

#[test]
fn delivered_failures_consume_nonce_per_variant() {
    for case in nonce_cases() {
        let mut app = app();
        let sender = id(case.sender);
        let balance_before = balance(&app, sender);

        let r = app.deliver_tx(&case.ahead.0);
        assert_eq!(r.code, case.ahead.1, "{}: nonce ahead", case.name);
        assert_eq!(r.deliver_code(), case.ahead.1 + 1, "{}", case.name);
        assert!(!r.should_increment_nonce, "{}", case.name);
        assert_eq!(next_nonce(&app, &sender), 1, "{}: nonce ahead must not consume", case.name);

        let r = app.deliver_tx(&case.charged.0);
        assert_eq!(r.code, case.charged.1, "{}: business failure", case.name);
        assert_eq!(r.status, TxStatus::Fail, "{}", case.name);
        assert!(r.should_increment_nonce, "{}", case.name);
        assert_eq!(next_nonce(&app, &sender), 2, "{}: business failure must consume", case.name);
        assert_eq!(balance(&app, sender), balance_before, "{}: nothing is charged", case.name);

        // The consumed nonce now reads as a replay.
        let r = app.deliver_tx(&case.charged.0);
        assert_eq!(r.code, case.duplicated, "{}: replay", case.name);
        assert_eq!(next_nonce(&app, &sender), 2, "{}: replay must not consume", case.name);
    }
}

#[test]
fn register_failures_create_nothing() {
    let mut app = app();
    let before = app.chain().state.len();

    let mut forged = RegisterTransaction::new_signed(&keypair(8), SignScheme::Json).unwrap();
    forged.addr = keypair(7).address();
    assert_eq!(deliver(&mut app, forged).code, register::INVALID_SIGNATURE.code);

    let again = RegisterTransaction::new_signed(&keypair(ALICE), SignScheme::Json).unwrap();
    assert_eq!(deliver(&mut app, again).code, register::DUPLICATED.code);

    // Only the two status records were written.
    assert_eq!(app.chain().state.len(), before + 2);
    let info = app.query("address_info", keypair(7).address().to_string().as_bytes(), 0);
    assert!(json(&info).get("id").is_none());
}

#[test]
fn rejected_nonce_leaves_state_alone() {
    let mut app = app();
    let r = deliver(&mut app, simple_transfer_tx(ALICE, id(BOB).into(), 1, 5));
    assert_eq!(r.code, simple_transfer::INVALID_NONCE.code);
    assert_eq!(next_nonce(&app, &id(ALICE)), 1);
    assert_eq!(balance(&app, id(ALICE)), BoundedAmount::from(100));
}

// ---------------------------------------------------------------------------
// 3. Signatures
// ---------------------------------------------------------------------------

#[test]
fn tampered_transactions_fail_authentication() {
    let app = app();

    let mut tx = simple_transfer_tx(ALICE, id(BOB).into(), 10, 1);
    tx.value = BoundedAmount::from(11);
    assert_eq!(app.check_tx(&encode(tx)).code, simple_transfer::INVALID_SIGNATURE.code);

    let mut tx = simple_transfer_tx(ALICE, id(BOB).into(), 10, 1);
    if let Signature::Json(bytes) = &mut tx.sig {
        bytes[10] ^= 0x01;
    }
    assert_eq!(app.check_tx(&encode(tx)).code, simple_transfer::INVALID_SIGNATURE.code);

    // Bob's key signing for Alice's account.
    let mut tx = simple_transfer_tx(ALICE, id(BOB).into(), 10, 1);
    tx.sign(&keypair(BOB), SignScheme::Json).unwrap();
    assert_eq!(app.check_tx(&encode(tx)).code, simple_transfer::INVALID_SIGNATURE.code);
}

#[test]
fn register_signed_by_another_key() {
    let app = app();
    let mut tx = RegisterTransaction::new_signed(&keypair(8), SignScheme::Json).unwrap();
    tx.addr = keypair(7).address();
    assert_eq!(app.check_tx(&encode(tx)).code, register::INVALID_SIGNATURE.code);
}

#[test]
fn json_only_variants_refuse_eip712() {
    let mut tx = deposit_tx(CAROL, 10, 1);
    assert!(tx.sign(&keypair(CAROL), SignScheme::Eip712).is_err());
}

// ---------------------------------------------------------------------------
// 4. Hashed Transfers
// ---------------------------------------------------------------------------

#[test]
fn hashed_transfer_claim() {
    let mut app = app();
    let raw = encode(lock_tx(20, 1, BLOCK_TIME + 60, 1));
    let lock_hash = tx_hash(&raw);

    let r = app.deliver_tx(&raw);
    assert!(r.is_ok());
    assert_eq!(r.status, TxStatus::Pending);
    assert_eq!(txstatus::get_status(&app.chain().state, &lock_hash), TxStatus::Pending);
    assert_eq!(balance(&app, id(ALICE)), BoundedAmount::from(79));

    let r = deliver(&mut app, claim_tx(BOB, &lock_hash, &SECRET, 1));
    assert!(r.is_ok());
    assert_eq!(balance(&app, id(ALICE)), BoundedAmount::from(79));
    assert_eq!(balance(&app, id(BOB)), BoundedAmount::from(20));
    assert_eq!(txstatus::get_status(&app.chain().state, &lock_hash), TxStatus::Success);

    let state = app.query("tx_state", &lock_hash, 0);
    assert_eq!(json(&state)["status"], "success");
}

#[test]
fn hashed_transfer_revoke_after_expiry() {
    let mut app = app();
    let raw = encode(lock_tx(20, 1, BLOCK_TIME + 60, 1));
    let lock_hash = tx_hash(&raw);
    app.deliver_tx(&raw);
    app.commit().unwrap();

    app.begin_block(vec![0x43; 32], BLOCK_TIME + 59);
    let early = deliver(&mut app, claim_tx(ALICE, &lock_hash, &[], 2));
    assert_eq!(early.code, claim_hashed_transfer::NOT_YET_EXPIRED.code);
    app.commit().unwrap();

    app.begin_block(vec![0x44; 32], BLOCK_TIME + 60);
    let late_claim = app.check_tx(&encode(claim_tx(BOB, &lock_hash, &SECRET, 1)));
    assert_eq!(late_claim.code, claim_hashed_transfer::EXPIRED.code);

    assert!(deliver(&mut app, claim_tx(ALICE, &lock_hash, &[], 3)).is_ok());
    // The value comes back, the fee does not.
    assert_eq!(balance(&app, id(ALICE)), BoundedAmount::from(99));
    assert_eq!(txstatus::get_status(&app.chain().state, &lock_hash), TxStatus::Success);
}

#[test]
fn expiry_must_be_in_the_future() {
    let app = app();
    let raw = encode(lock_tx(20, 1, BLOCK_TIME, 1));
    assert_eq!(app.check_tx(&raw).code, hashed_transfer::INVALID_EXPIRY.code);
}

// ---------------------------------------------------------------------------
// 5. Weighted Approval
// ---------------------------------------------------------------------------

#[test]
fn deposit_needs_two_thirds() {
    let mut app = app();
    let raw = encode(deposit_tx(CAROL, 10, 1));
    let deposit_hash = tx_hash(&raw);

    let r = app.deliver_tx(&raw);
    assert!(r.is_ok());
    assert_eq!(r.status, TxStatus::Pending);
    assert!(balance(&app, id(BOB)).is_zero());

    let r = deliver(&mut app, approval_tx(DAVE, &deposit_hash, 1));
    assert!(r.is_ok());
    assert_eq!(r.tags.len(), 2);
    assert_eq!(balance(&app, id(BOB)), BoundedAmount::from(500));
    assert_eq!(txstatus::get_status(&app.chain().state, &deposit_hash), TxStatus::Success);

    // The slot is closed for any later proposal.
    let late = app.check_tx(&encode(deposit_tx(CAROL, 10, 2)));
    assert_eq!(late.code, deposit::ALREADY_EXECUTED.code);
}

#[test]
fn heavy_approver_executes_alone() {
    let mut app = app();
    let r = deliver(&mut app, deposit_tx(DAVE, 11, 1));
    assert!(r.is_ok());
    assert_eq!(r.status, TxStatus::Success);
    assert_eq!(balance(&app, id(BOB)), BoundedAmount::from(500));
}

#[test]
fn approvals_are_restricted() {
    let mut app = app();
    let raw = encode(deposit_tx(CAROL, 12, 1));
    let deposit_hash = tx_hash(&raw);
    app.deliver_tx(&raw);

    let outsider = app.check_tx(&encode(approval_tx(ALICE, &deposit_hash, 1)));
    assert_eq!(outsider.code, deposit_approval::NOT_APPROVER.code);

    let twice = app.check_tx(&encode(approval_tx(CAROL, &deposit_hash, 2)));
    assert_eq!(twice.code, deposit_approval::DOUBLE_APPROVAL.code);

    let unknown = app.check_tx(&encode(approval_tx(DAVE, &[9; 20], 1)));
    assert_eq!(unknown.code, deposit_approval::PROPOSAL_NOT_EXIST.code);
}

#[test]
fn contract_update_and_proof() {
    let mut app = app();
    assert!(deliver(&mut app, contract_update_tx(CAROL, 1, 1)).is_ok());
    let r = deliver(&mut app, contract_update_tx(DAVE, 1, 1));
    assert_eq!(r.tags.len(), 2);
    app.commit().unwrap();

    let index = 1u64.to_be_bytes();
    let proof = app.query("contract_update_proof", &index, 1);
    assert!(proof.is_ok());
    let answer = json(&proof);
    assert_eq!(answer["contract_address"], Address([0xc0; 20]).to_string());
    assert_eq!(answer["root"], hex::encode(app.chain().withdraw.root_hash()));

    let next = app.check_tx(&encode(contract_update_tx(CAROL, 3, 2)));
    assert_eq!(next.code, contract_update::INVALID_INDEX.code);
}

// ---------------------------------------------------------------------------
// 6. Withdrawals
// ---------------------------------------------------------------------------

#[test]
fn withdraw_is_provable_after_commit() {
    let mut app = app();
    let r = deliver(&mut app, withdraw_tx(60, 2, 1));
    assert!(r.is_ok());
    assert_eq!(r.data.len(), PACKED_LENGTH);
    assert_eq!(&r.data[..20], id(ALICE).as_bytes());
    assert_eq!(balance(&app, id(ALICE)), BoundedAmount::from(38));

    let before_commit = app.query("withdraw_proof", &r.data, 1);
    assert!(!before_commit.is_ok());

    app.commit().unwrap();
    let proof = app.query("withdraw_proof", &r.data, 1);
    assert!(proof.is_ok());
    assert_eq!(json(&proof)["height"], 1);

    let missing = app.query("withdraw_proof", &[0; 112], 1);
    assert!(!missing.is_ok());
}

#[test]
fn open_block_withdrawals_are_not_provable() {
    let mut app = app();
    let first = deliver(&mut app, withdraw_tx(10, 0, 1));
    app.commit().unwrap();
    let committed_root = app.chain().committed_withdraw.root_hash();

    app.begin_block(vec![0x43; 32], BLOCK_TIME + 1);
    let pending = deliver(&mut app, withdraw_tx(20, 0, 2));
    assert!(pending.is_ok());

    let r = app.query("withdraw_proof", &pending.data, 1);
    assert_eq!(r.code, query_codes::WITHDRAW_PROOF_NOT_EXIST.code);

    // Earlier withdrawals still prove against the committed root.
    let proof = app.query("withdraw_proof", &first.data, 1);
    assert_eq!(json(&proof)["root"], hex::encode(committed_root));
    assert_ne!(committed_root, app.chain().withdraw.root_hash());

    app.commit().unwrap();
    assert!(app.query("withdraw_proof", &pending.data, 2).is_ok());
}

// ---------------------------------------------------------------------------
// 7. Persistence
// ---------------------------------------------------------------------------

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let raw = encode(simple_transfer_tx(ALICE, id(BOB).into(), 25, 1));

    let committed = {
        let mut app = Application::with_db(ChainDB::open(dir.path()).unwrap()).unwrap();
        app.init_chain(&genesis()).unwrap();
        app.begin_block(vec![1; 32], BLOCK_TIME);
        assert!(app.deliver_tx(&raw).is_ok());
        app.commit().unwrap()
    };

    let mut app = Application::with_db(ChainDB::open(dir.path()).unwrap()).unwrap();
    assert_eq!(app.info().height, 1);
    assert_eq!(app.info().app_hash, committed);
    assert_eq!(balance(&app, id(BOB)), BoundedAmount::from(25));
    assert_eq!(app.check_tx(&raw).code, simple_transfer::DUPLICATED.code);

    app.begin_block(vec![2; 32], BLOCK_TIME + 1);
    assert!(deliver(&mut app, simple_transfer_tx(ALICE, id(BOB).into(), 5, 2)).is_ok());
    assert_ne!(app.commit().unwrap(), committed);
}

#[test]
fn replicas_agree_on_app_hash() {
    let txs = vec![
        encode(simple_transfer_tx(ALICE, id(BOB).into(), 10, 1)),
        encode(deposit_tx(DAVE, 3, 1)),
        encode(withdraw_tx(5, 1, 2)),
    ];
    let run = || {
        let mut app = app();
        for raw in &txs {
            app.deliver_tx(raw);
        }
        app.commit().unwrap()
    };
    assert_eq!(run(), run());
}
