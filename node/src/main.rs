// Copyright (c) 2026 LikeChain Developers. MIT License.
// See LICENSE for details.

//! # LikeChain Node
//!
//! Entry point for the `likechain-node` binary. Parses CLI arguments,
//! initializes logging, opens the chain database, and drives the
//! application through one command:
//!
//! - `init`    — load a genesis document
//! - `check`   — mempool check of one transaction
//! - `deliver` — deliver transactions as one block and commit
//! - `query`   — answer a state query
//! - `version` — print build version information
//!
//! Results are printed to stdout as one JSON document per line.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;

use likechain_protocol::config::{APP_NAME, PROTOCOL_VERSION};
use likechain_protocol::crypto::sha256;
use likechain_protocol::{tx_hash, Application, ChainDB, GenesisDocument, Response};

use cli::{Commands, LikechainNodeCli};

/// One response as printed by the CLI.
#[derive(Debug, Serialize)]
struct ResponseView {
    #[serde(skip_serializing_if = "Option::is_none")]
    tx_hash: Option<String>,
    code: u32,
    info: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    log: String,
    status: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    data: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<(String, String)>,
}

impl ResponseView {
    fn new(response: &Response, code: u32) -> Self {
        Self {
            tx_hash: None,
            code,
            info: response.info.clone(),
            log: response.log.clone(),
            status: response.status.as_str(),
            data: hex::encode(&response.data),
            tags: response
                .tags
                .iter()
                .map(|t| (String::from_utf8_lossy(&t.key).into_owned(), hex::encode(&t.value)))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitView {
    height: i64,
    app_hash: String,
}

fn main() -> Result<()> {
    let cli = LikechainNodeCli::parse();
    logging::init_logging(logging::DEFAULT_DIRECTIVE, cli.log_format.into());

    match cli.command {
        Commands::Init(args) => init_chain(&cli.data_dir, args),
        Commands::Check(args) => check_tx(&cli.data_dir, args),
        Commands::Deliver(args) => deliver_block(&cli.data_dir, args),
        Commands::Query(args) => query(&cli.data_dir, args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Opens (or creates) the database under `data_dir` and resumes the
/// application from its last commit.
fn open_app(data_dir: &Path) -> Result<Application> {
    let db_path = data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let db = ChainDB::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    let app = Application::with_db(db).context("failed to load chain state")?;
    tracing::info!(path = %db_path.display(), height = app.info().height, "database opened");
    Ok(app)
}

fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).with_context(|| format!("invalid hex input: {input:?}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value).context("failed to encode output")?);
    Ok(())
}

fn init_chain(data_dir: &Path, args: cli::InitArgs) -> Result<()> {
    let json = std::fs::read_to_string(&args.genesis)
        .with_context(|| format!("failed to read genesis file {}", args.genesis.display()))?;
    let genesis = GenesisDocument::from_json(&json).context("failed to parse genesis document")?;

    let mut app = open_app(data_dir)?;
    let app_hash = app.init_chain(&genesis).context("failed to initialize chain")?;

    print_json(&CommitView {
        height: app.info().height,
        app_hash: hex::encode(app_hash),
    })
}

fn check_tx(data_dir: &Path, args: cli::CheckArgs) -> Result<()> {
    let raw = decode_hex(&args.tx)?;
    let app = open_app(data_dir)?;
    let response = app.check_tx(&raw);

    let mut view = ResponseView::new(&response, response.check_code());
    view.tx_hash = Some(hex::encode(tx_hash(&raw)));
    print_json(&view)
}

fn deliver_block(data_dir: &Path, args: cli::DeliverArgs) -> Result<()> {
    let txs = args
        .txs
        .iter()
        .map(|tx| decode_hex(tx))
        .collect::<Result<Vec<_>>>()?;

    let block_hash = match &args.block_hash {
        Some(hash) => decode_hex(hash)?,
        None => {
            let hashes: Vec<u8> = txs.iter().flat_map(|raw| tx_hash(raw)).collect();
            sha256(&hashes).to_vec()
        }
    };
    let block_time = args.block_time.unwrap_or_else(|| chrono::Utc::now().timestamp());

    let mut app = open_app(data_dir)?;
    app.begin_block(block_hash, block_time);
    for raw in &txs {
        let response = app.deliver_tx(raw);
        let mut view = ResponseView::new(&response, response.deliver_code());
        view.tx_hash = Some(hex::encode(tx_hash(raw)));
        print_json(&view)?;
    }
    let app_hash = app.commit().context("failed to commit block")?;

    print_json(&CommitView {
        height: app.info().height,
        app_hash: hex::encode(app_hash),
    })
}

fn query(data_dir: &Path, args: cli::QueryArgs) -> Result<()> {
    let data = if args.hex {
        decode_hex(&args.data)?
    } else {
        args.data.into_bytes()
    };

    let app = open_app(data_dir)?;
    let height = args.height.unwrap_or(app.info().height);
    let response = app.query(&args.path, &data, height);

    // Query answers are JSON documents; print them inline.
    let answer: Option<serde_json::Value> = serde_json::from_slice(&response.data).ok();
    let mut view = ResponseView::new(&response, response.code);
    if answer.is_some() {
        view.data.clear();
    }
    print_json(&serde_json::json!({ "response": view, "answer": answer }))
}

/// Prints version information to stdout.
fn print_version() {
    println!("likechain-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol       {} ({})", PROTOCOL_VERSION, APP_NAME);
    println!("rustc          {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
