//! # Responses and Result Codes
//!
//! Every `check`/`deliver`/`query` outcome is a [`Response`]. Failures come
//! from a fixed table of [`ResponseCode`]s; codes are consensus-visible and
//! must never be renumbered.
//!
//! ```text
//! 1 2 0 4 0
//! | | | | |
//! | | | +-+-- case
//! | +-+------ transaction kind (10-59) or query (60-99)
//! +---------- fixed leading digit
//! ```
//!
//! A failure either *consumes* the sender's nonce or not. Failures detected
//! before the nonce check (format, sender, signature, nonce itself) never do;
//! business-rule failures after it always do.

use serde::{Deserialize, Serialize};

use crate::txstatus::TxStatus;

// ---------------------------------------------------------------------------
// ResponseCode
// ---------------------------------------------------------------------------

/// A named failure: numeric code, human-readable info, nonce policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseCode {
    pub code: u32,
    pub info: &'static str,
    pub consumes_nonce: bool,
}

/// Failure detected before the nonce check.
const fn reject(code: u32, info: &'static str) -> ResponseCode {
    ResponseCode {
        code,
        info,
        consumes_nonce: false,
    }
}

/// Business-rule failure reached after the nonce check.
const fn charge(code: u32, info: &'static str) -> ResponseCode {
    ResponseCode {
        code,
        info,
        consumes_nonce: true,
    }
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// Indexed event attribute attached to a delivered transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Tag {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Tag whose value is a block height rendered in decimal.
    pub fn height(key: &str, height: i64) -> Self {
        Self::new(key, height.to_string())
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub info: String,
    pub tags: Vec<Tag>,
    pub status: TxStatus,
    pub should_increment_nonce: bool,
}

impl Response {
    /// Code 0, info `"OK"`, status `Success`, consumes the nonce.
    pub fn success() -> Self {
        Self {
            code: 0,
            info: "OK".to_string(),
            status: TxStatus::Success,
            should_increment_nonce: true,
            ..Self::default()
        }
    }

    pub fn failure(code: ResponseCode) -> Self {
        Self {
            code: code.code,
            info: code.info.to_string(),
            status: TxStatus::Fail,
            should_increment_nonce: code.consumes_nonce,
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Overlay `other`: non-zero code, non-empty data/log/info and a set
    /// status replace ours; tags are appended.
    pub fn merge(mut self, other: Response) -> Self {
        if other.code > 0 {
            self.code = other.code;
        }
        if !other.data.is_empty() {
            self.data = other.data;
        }
        if !other.log.is_empty() {
            self.log = other.log;
        }
        if !other.info.is_empty() {
            self.info = other.info;
        }
        self.tags.extend(other.tags);
        if other.status != TxStatus::NotSet {
            self.status = other.status;
        }
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_status(mut self, status: TxStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = log.into();
        self
    }

    /// Code as reported from the mempool check path.
    pub fn check_code(&self) -> u32 {
        self.code
    }

    /// Code as reported from block delivery: failures are shifted by one so
    /// a deliver-time failure is distinguishable from a check-time one.
    pub fn deliver_code(&self) -> u32 {
        if self.code == 0 {
            0
        } else {
            self.code + 1
        }
    }
}

impl From<ResponseCode> for Response {
    fn from(code: ResponseCode) -> Self {
        Response::failure(code)
    }
}

// ---------------------------------------------------------------------------
// Code Table
// ---------------------------------------------------------------------------

pub mod register {
    use super::*;
    pub const INVALID_FORMAT: ResponseCode = reject(10000, "Invalid RegisterTransaction format");
    pub const INVALID_SIGNATURE: ResponseCode = reject(10010, "Invalid RegisterTransaction signature");
    pub const DUPLICATED: ResponseCode = reject(10020, "Duplicated RegisterTransaction");
}

pub mod deposit {
    use super::*;
    pub const INVALID_FORMAT: ResponseCode = reject(11000, "Invalid DepositTransaction format");
    pub const INVALID_SIGNATURE: ResponseCode = reject(11010, "Invalid DepositTransaction signature");
    pub const DUPLICATED: ResponseCode = reject(11020, "Duplicated DepositTransaction");
    pub const SENDER_NOT_REGISTERED: ResponseCode =
        reject(11030, "Sender of DepositTransaction not register");
    pub const INVALID_NONCE: ResponseCode = reject(11040, "Invalid DepositTransaction nonce");
    pub const NOT_APPROVER: ResponseCode = charge(11050, "User is not a DepositApprover");
    pub const DOUBLE_APPROVAL: ResponseCode = charge(
        11060,
        "User already approved another DepositTransaction for the same block number",
    );
    pub const ALREADY_EXECUTED: ResponseCode = charge(
        11070,
        "The deposit proposal has already executed for the given block number",
    );
}

pub mod transfer {
    use super::*;
    pub const INVALID_FORMAT: ResponseCode = reject(12000, "Invalid TransferTransaction format");
    pub const INVALID_SIGNATURE: ResponseCode = reject(12010, "Invalid TransferTransaction signature");
    pub const DUPLICATED: ResponseCode = reject(12020, "Duplicated TransferTransaction");
    pub const SENDER_NOT_REGISTERED: ResponseCode =
        reject(12030, "Sender of TransferTransaction not register");
    pub const NOT_ENOUGH_BALANCE: ResponseCode =
        charge(12040, "Sender's balance of TransferTransaction not enough");
    pub const INVALID_RECEIVER: ResponseCode =
        charge(12050, "One or more receivers in TransferTransaction are invalid");
    pub const INVALID_NONCE: ResponseCode = reject(12060, "Invalid TransferTransaction nonce");
}

pub mod withdraw {
    use super::*;
    pub const INVALID_FORMAT: ResponseCode = reject(13000, "Invalid WithdrawTransaction format");
    pub const INVALID_SIGNATURE: ResponseCode = reject(13010, "Invalid WithdrawTransaction signature");
    pub const DUPLICATED: ResponseCode = reject(13020, "Duplicated WithdrawTransaction");
    pub const SENDER_NOT_REGISTERED: ResponseCode =
        reject(13030, "Sender of WithdrawTransaction not register");
    pub const NOT_ENOUGH_BALANCE: ResponseCode =
        charge(13040, "Sender's balance of WithdrawTransaction not enough");
    pub const INVALID_NONCE: ResponseCode = reject(13050, "Invalid WithdrawTransaction nonce");
}

pub mod deposit_approval {
    use super::*;
    pub const INVALID_FORMAT: ResponseCode = reject(14000, "Invalid DepositApprovalTransaction format");
    pub const INVALID_SIGNATURE: ResponseCode =
        reject(14010, "Invalid DepositApprovalTransaction signature");
    pub const DUPLICATED: ResponseCode = reject(14020, "Duplicated DepositApprovalTransaction");
    pub const SENDER_NOT_REGISTERED: ResponseCode =
        reject(14030, "Sender of DepositApprovalTransaction not register");
    pub const INVALID_NONCE: ResponseCode = reject(14040, "Invalid DepositApprovalTransaction nonce");
    pub const PROPOSAL_NOT_EXIST: ResponseCode =
        charge(14050, "The deposit proposal does not exist");
    pub const NOT_APPROVER: ResponseCode = charge(14060, "User is not a DepositApprover");
    pub const DOUBLE_APPROVAL: ResponseCode = charge(
        14070,
        "User already approved another DepositTransaction for the same block number",
    );
    pub const ALREADY_EXECUTED: ResponseCode = charge(
        14080,
        "The deposit proposal has already executed for the given block number",
    );
}

pub mod hashed_transfer {
    use super::*;
    pub const INVALID_FORMAT: ResponseCode = reject(15000, "Invalid HashedTransferTransaction format");
    pub const INVALID_SIGNATURE: ResponseCode =
        reject(15010, "Invalid HashedTransferTransaction signature");
    pub const DUPLICATED: ResponseCode = reject(15020, "Duplicated HashedTransferTransaction");
    pub const SENDER_NOT_REGISTERED: ResponseCode =
        reject(15030, "Sender of HashedTransferTransaction not register");
    pub const NOT_ENOUGH_BALANCE: ResponseCode =
        charge(15040, "Sender's balance of HashedTransferTransaction not enough");
    pub const INVALID_RECEIVER: ResponseCode =
        charge(15050, "The receiver in HashedTransferTransaction is invalid");
    pub const INVALID_NONCE: ResponseCode = reject(15060, "Invalid HashedTransferTransaction nonce");
    pub const INVALID_EXPIRY: ResponseCode =
        charge(15070, "Invalid HashedTransferTransaction expiry time");
}

pub mod claim_hashed_transfer {
    use super::*;
    pub const INVALID_FORMAT: ResponseCode =
        reject(16000, "Invalid ClaimHashedTransferTransaction format");
    pub const INVALID_SIGNATURE: ResponseCode =
        reject(16010, "Invalid ClaimHashedTransferTransaction signature");
    pub const DUPLICATED: ResponseCode = reject(16020, "Duplicated ClaimHashedTransferTransaction");
    pub const SENDER_NOT_REGISTERED: ResponseCode =
        reject(16030, "Sender of ClaimHashedTransferTransaction not register");
    pub const TX_NOT_EXIST: ResponseCode = charge(16040, "The HashedTransferTransaction does not exist");
    pub const EXPIRED: ResponseCode = charge(16050, "The HashedTransferTransaction has already expired");
    pub const INVALID_NONCE: ResponseCode =
        reject(16060, "Invalid ClaimHashedTransferTransaction nonce");
    pub const INVALID_SECRET: ResponseCode = charge(
        16070,
        "The secret does not match the committed hash of the HashedTransferTransaction",
    );
    pub const NOT_YET_EXPIRED: ResponseCode =
        charge(16080, "The HashedTransferTransaction is not yet expired");
    pub const INVALID_SENDER: ResponseCode = charge(
        16090,
        "The sender is neither the sender or receiver of the HashedTransferTransaction",
    );
}

pub mod simple_transfer {
    use super::*;
    pub const INVALID_FORMAT: ResponseCode = reject(17000, "Invalid SimpleTransferTransaction format");
    pub const INVALID_SIGNATURE: ResponseCode =
        reject(17010, "Invalid SimpleTransferTransaction signature");
    pub const DUPLICATED: ResponseCode = reject(17020, "Duplicated SimpleTransferTransaction");
    pub const SENDER_NOT_REGISTERED: ResponseCode =
        reject(17030, "Sender of SimpleTransferTransaction not register");
    pub const NOT_ENOUGH_BALANCE: ResponseCode =
        charge(17040, "Sender's balance of SimpleTransferTransaction not enough");
    pub const INVALID_RECEIVER: ResponseCode =
        charge(17050, "One or more receivers in SimpleTransferTransaction are invalid");
    pub const INVALID_NONCE: ResponseCode = reject(17060, "Invalid SimpleTransferTransaction nonce");
}

pub mod contract_update {
    use super::*;
    pub const INVALID_FORMAT: ResponseCode = reject(18000, "Invalid ContractUpdateTransaction format");
    pub const INVALID_SIGNATURE: ResponseCode =
        reject(18010, "Invalid ContractUpdateTransaction signature");
    pub const DUPLICATED: ResponseCode = reject(18020, "Duplicated ContractUpdateTransaction");
    pub const SENDER_NOT_REGISTERED: ResponseCode =
        reject(18030, "Sender of ContractUpdateTransaction not register");
    pub const INVALID_NONCE: ResponseCode = reject(18040, "Invalid ContractUpdateTransaction nonce");
    pub const NOT_UPDATER: ResponseCode = charge(18050, "User is not a ContractUpdater");
    pub const DOUBLE_APPROVAL: ResponseCode = charge(
        18060,
        "User already approved another ContractUpdateTransaction for the same contract index",
    );
    pub const INVALID_INDEX: ResponseCode =
        charge(18070, "The contract index is not the next contract index");
}

pub mod query {
    use super::*;
    pub const PATH_NOT_EXIST: ResponseCode = reject(60010, "Invalid query path");
    pub const PARSING_REQUEST_ERROR: ResponseCode =
        reject(60020, "Unable to parse request data in Query");
    pub const PARSING_RESPONSE_ERROR: ResponseCode =
        reject(60030, "Unable to parse response data in Query");
    pub const INVALID_IDENTIFIER: ResponseCode = reject(60040, "Identifier is invalid in Query");
    pub const WITHDRAW_PROOF_INVALID_HEIGHT: ResponseCode =
        reject(61000, "Invalid height in withdraw proof");
    pub const WITHDRAW_PROOF_NOT_EXIST: ResponseCode = reject(61010, "Withdraw record does not exist");
    pub const CONTRACT_UPDATE_PROOF_INVALID_HEIGHT: ResponseCode =
        reject(61100, "Invalid height in contract update proof");
    pub const CONTRACT_UPDATE_PROOF_NOT_EXIST: ResponseCode =
        reject(61110, "Contract update record does not exist");
    pub const TX_NOT_EXIST: ResponseCode = reject(62000, "Transaction status record does not exist");
}
