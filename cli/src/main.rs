//! chainscan CLI — run bounded block scans and inspect scan state.
//!
//! Usage:
//! ```bash
//! # Scan the consensus chain up to height 2,000,000
//! chainscan scan --chain consensus --url http://127.0.0.1:9944 --to 2000000
//!
//! # Scan a domain chain with two candidate endpoints and 8 workers
//! chainscan scan --chain domain-0 --preset domain \
//!     --url http://node-a:9944 --url http://node-b:9944 \
//!     --from 100000 --to 500000 --workers 8
//!
//! # Inspect / reset the persisted checkpoint
//! chainscan status --chain consensus --db ./chainscan.db
//! chainscan reset  --chain consensus --db ./chainscan.db
//! ```

use std::env;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use chainscan_core::{CheckpointStore, ScanConfigBuilder, Scanner};
use chainscan_storage::sqlite::SqliteStorage;
use chainscan_substrate::{
    consensus_matcher, domain_matcher, EventMatcher, ExtractSink, HttpNodeClient, SubstrateSource,
};

const DEFAULT_DB: &str = "./chainscan.db";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "scan" => cmd_scan(&args[2..]).await,
        "status" => cmd_status(&args[2..]).await,
        "reset" => cmd_reset(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("chainscan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainscan {}", env!("CARGO_PKG_VERSION"));
    println!("Resumable, concurrent block scanner with in-order checkpoints\n");
    println!("USAGE:");
    println!("    chainscan <COMMAND>\n");
    println!("COMMANDS:");
    println!("    scan     Scan a height range and extract events");
    println!("    status   Show the persisted checkpoint for a chain");
    println!("    reset    Delete the persisted checkpoint for a chain");
    println!("    version  Print version");
    println!("    help     Print this help\n");
    println!("SCAN FLAGS:");
    println!("    --chain <ID>            Chain slug, also the checkpoint key  [required]");
    println!("    --url <URL>             Node endpoint; repeatable, first reachable wins  [required]");
    println!("    --to <HEIGHT>           Last height to scan (inclusive)  [required]");
    println!("    --from <HEIGHT>         Requested first height  [default: 0]");
    println!("    --preset <NAME>         Event preset: consensus | domain  [default: from --chain]");
    println!("    --db <PATH>             SQLite database path  [default: {DEFAULT_DB}]");
    println!("    --workers <N>           Worker pool size  [default: 4]");
    println!("    --base-backoff-ms <MS>  Initial retry delay  [default: 500]");
    println!("    --max-backoff-ms <MS>   Retry delay ceiling  [default: 30000]");
}

async fn cmd_scan(args: &[String]) -> Result<(), String> {
    let chain = parse_flag(args, "--chain").ok_or("--chain is required")?;
    let urls = parse_flags(args, "--url");
    if urls.is_empty() {
        return Err("--url is required (repeatable)".into());
    }
    let to = parse_height(args, "--to")?.ok_or("--to is required")?;
    let from = parse_height(args, "--from")?.unwrap_or(0);
    let db = parse_flag(args, "--db").unwrap_or_else(|| DEFAULT_DB.into());

    let mut builder = ScanConfigBuilder::new()
        .chain(&chain)
        .from_height(from)
        .to_height(to);
    if let Some(workers) = parse_flag(args, "--workers") {
        builder = builder.workers(workers.parse().map_err(|_| "--workers must be a number")?);
    }
    if let Some(ms) = parse_flag(args, "--base-backoff-ms") {
        let ms: u64 = ms.parse().map_err(|_| "--base-backoff-ms must be a number")?;
        builder = builder.base_backoff(Duration::from_millis(ms));
    }
    if let Some(ms) = parse_flag(args, "--max-backoff-ms") {
        let ms: u64 = ms.parse().map_err(|_| "--max-backoff-ms must be a number")?;
        builder = builder.max_backoff(Duration::from_millis(ms));
    }
    let config = builder.build();

    let matcher = matcher_for(&chain, parse_flag(args, "--preset").as_deref())?;

    info!(chain = %chain, from, to, db = %db, "starting scan");

    let store = Arc::new(SqliteStorage::open(&db).await.map_err(|e| e.to_string())?);
    let client = HttpNodeClient::connect(&urls).await.map_err(|e| e.to_string())?;
    let source = Arc::new(SubstrateSource::new(client));
    let sink = Arc::new(ExtractSink::new(store.clone(), matcher));

    let scanner = Scanner::new(config, source, sink, store.clone());
    scanner.run().await.map_err(|e| e.to_string())?;

    match store.load(&chain).await.map_err(|e| e.to_string())? {
        Some(cp) => println!("Scan complete. {chain} checkpoint at height {}", cp.height),
        None => println!("Scan complete. No heights processed for {chain}"),
    }
    Ok(())
}

async fn cmd_status(args: &[String]) -> Result<(), String> {
    let chain = parse_flag(args, "--chain").ok_or("--chain is required")?;
    let db = parse_flag(args, "--db").unwrap_or_else(|| DEFAULT_DB.into());

    let store = SqliteStorage::open(&db).await.map_err(|e| e.to_string())?;
    match store.load(&chain).await.map_err(|e| e.to_string())? {
        Some(cp) => {
            println!("chain:      {}", cp.chain_id);
            println!("height:     {}", cp.height);
            println!("updated_at: {}", cp.updated_at);
        }
        None => println!("No checkpoint for chain '{chain}'"),
    }
    Ok(())
}

async fn cmd_reset(args: &[String]) -> Result<(), String> {
    let chain = parse_flag(args, "--chain").ok_or("--chain is required")?;
    let db = parse_flag(args, "--db").unwrap_or_else(|| DEFAULT_DB.into());

    let store = SqliteStorage::open(&db).await.map_err(|e| e.to_string())?;
    store.delete(&chain).await.map_err(|e| e.to_string())?;
    println!("Checkpoint for chain '{chain}' deleted");
    Ok(())
}

/// Pick the event preset: explicit `--preset` wins, otherwise inferred from
/// the chain slug.
fn matcher_for(chain: &str, preset: Option<&str>) -> Result<EventMatcher, String> {
    let name = match preset {
        Some(p) => p.to_string(),
        None if chain.starts_with("domain") => "domain".into(),
        None => "consensus".into(),
    };
    match name.as_str() {
        "consensus" => Ok(consensus_matcher()),
        "domain" => Ok(domain_matcher()),
        other => Err(format!("unknown preset '{other}' (expected consensus | domain)")),
    }
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_flags(args: &[String], flag: &str) -> Vec<String> {
    let mut values = vec![];
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        if arg == flag {
            if let Some(value) = iter.peek() {
                values.push((*value).clone());
            }
        }
    }
    values
}

fn parse_height(args: &[String], flag: &str) -> Result<Option<u64>, String> {
    match parse_flag(args, flag) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("{flag} must be a block height")),
        None => Ok(None),
    }
}
