//! # CLI Interface
//!
//! Defines the command-line argument structure for `likechain-node` using
//! `clap` derive. Every subcommand works against the sled database in the
//! data directory: `init`, `check`, `deliver`, `query`, and `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// LikeChain application host.
///
/// Opens the persistent chain state, feeds hex-encoded transactions to the
/// application, commits blocks, and answers state queries.
#[derive(Parser, Debug)]
#[command(
    name = "likechain-node",
    about = "LikeChain application host",
    version,
    propagate_version = true
)]
pub struct LikechainNodeCli {
    /// Directory holding the chain database. Created on first use.
    #[arg(long, short = 'd', global = true, env = "LIKECHAIN_DATA_DIR", default_value = "./likechain-data")]
    pub data_dir: PathBuf,

    /// Log output format.
    #[arg(long, global = true, env = "LIKECHAIN_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a genesis document into an empty data directory.
    Init(InitArgs),
    /// Run the mempool check for one transaction without changing state.
    Check(CheckArgs),
    /// Deliver transactions as one block and commit it.
    Deliver(DeliverArgs),
    /// Query committed state.
    Query(QueryArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the genesis JSON document.
    #[arg(long, short = 'g')]
    pub genesis: PathBuf,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Hex-encoded transaction bytes (optional `0x` prefix).
    pub tx: String,
}

#[derive(Parser, Debug)]
pub struct DeliverArgs {
    /// Hex-encoded transactions, delivered in the given order.
    #[arg(required = true)]
    pub txs: Vec<String>,

    /// Block time in seconds. Defaults to the current wall-clock time.
    #[arg(long)]
    pub block_time: Option<i64>,

    /// Hex-encoded block hash. Defaults to the SHA-256 of the block's
    /// transaction hashes.
    #[arg(long)]
    pub block_hash: Option<String>,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Query path, e.g. `account_info` or `withdraw_proof`.
    pub path: String,

    /// Request data. Sent as UTF-8 unless `--hex` is given.
    pub data: String,

    /// Decode `data` as hex instead of sending it verbatim.
    #[arg(long)]
    pub hex: bool,

    /// Height the proof queries are answered for. Defaults to the last
    /// committed height.
    #[arg(long)]
    pub height: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
