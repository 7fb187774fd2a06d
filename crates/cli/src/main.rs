//! Example command-line front-end over `kybase-engine`. Not part of the
//! crate's stability contract — a thin demonstration of the library
//! surface, one workspace per invocation.

use clap::{Parser, Subcommand};
use kybase_engine::{Engine, EngineConfig, Error, OverwritePolicy, Value, WorkspaceType};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "kybase", about = "Embeddable key-value and queue store")]
struct Cli {
    /// Root directory holding one subdirectory per workspace.
    #[arg(long, env = "KYBASE_DATA_DIR", default_value = ".kybase")]
    data_dir: PathBuf,

    /// Workspace to operate on.
    #[arg(long, short = 'w', default_value = "default")]
    workspace: String,

    /// Master passphrase for at-rest encryption, if the store uses it.
    #[arg(long, env = "KYBASE_MASTER_KEY")]
    master_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save a key's value, optionally with a TTL in seconds.
    Save { key: String, value: String, #[arg(long)] ttl: Option<u64> },
    /// Get a key's value (optionally a dotted sub-path).
    Get { path: String },
    /// Delete a key, moving it to archive.
    Delete { key: String },
    /// Restore a key from archive or history.
    Restore { key: String, #[arg(long)] at_or_before: Option<u64> },
    /// List live keys, optionally filtered by a regex pattern.
    List { pattern: Option<String> },
    /// Full-text search over indexed values.
    Search { query: String, #[arg(long, default_value_t = 10)] limit: usize },
    /// Show a key's audit history, newest first. Pass "-h" for all keys.
    History { key: String },
    /// Set a workspace's collection mode. Write-once: a second call with
    /// a different mode fails.
    SetType { mode: String },
    /// Push a value onto a queue/stack/priority_queue workspace.
    Push { value: String, #[arg(long)] priority: Option<i64> },
    /// Pop the head item off a collection workspace.
    Pop,
    /// Export every live key's value to a CSV or JSON file.
    Export { path: PathBuf },
    /// Import key/value pairs from a CSV or JSON file.
    Import { path: PathBuf },
    /// Move a key to another workspace.
    Move { key: String, target: String, #[arg(long)] overwrite: bool },
    /// List workspace directories under the data directory.
    Workspaces,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = EngineConfig::new(&cli.data_dir);
    config.master_key = cli.master_key.clone();

    let engine = match Engine::open(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&engine, &cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(engine: &Engine, cli: &Cli) -> kybase_engine::Result<()> {
    match &cli.command {
        Command::Workspaces => {
            for name in engine.list()? {
                println!("{name}");
            }
            return Ok(());
        }
        Command::Move { key, target, overwrite } => {
            let policy = if *overwrite { OverwritePolicy::Overwrite } else { OverwritePolicy::Abort };
            engine.move_key(key, &cli.workspace, target, policy)?;
            return Ok(());
        }
        _ => {}
    }

    let ws = engine.workspace(&cli.workspace)?;
    match &cli.command {
        Command::Save { key, value, ttl } => {
            let parsed = Value::parse_literal(value);
            let outcome = ws.save(key, parsed, ttl.map(std::time::Duration::from_secs))?;
            println!("{outcome:?}");
        }
        Command::Get { path } => {
            let value = ws.getkey(path, true)?;
            println!("{}", serde_json::to_string_pretty(&value.to_json()).unwrap());
        }
        Command::Delete { key } => ws.delete(key)?,
        Command::Restore { key, at_or_before } => ws.restore(key, *at_or_before)?,
        Command::List { pattern } => {
            for key in ws.listkeys(pattern.as_deref())? {
                println!("{key}");
            }
        }
        Command::Search { query, limit } => {
            for hit in ws.search(query, *limit, true)? {
                println!("{}", hit.key);
            }
        }
        Command::History { key } => {
            for entry in ws.get_history(key)? {
                println!("{} {} {:?}", entry.seq, entry.op, entry.value);
            }
        }
        Command::SetType { mode } => {
            let ty: WorkspaceType = mode.parse().map_err(|_| {
                Error::Validation(format!("unknown workspace mode '{mode}'"))
            })?;
            ws.set_type(ty)?;
        }
        Command::Push { value, priority } => {
            ws.push(Value::parse_literal(value), *priority)?;
        }
        Command::Pop => match ws.pop()? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value.to_json()).unwrap()),
            None => println!("(empty)"),
        },
        Command::Export { path } => ws.export_data_auto(path)?,
        Command::Import { path } => {
            let count = ws.import_data(path)?;
            println!("imported {count} entries");
        }
        Command::Move { .. } | Command::Workspaces => unreachable!("handled above"),
    }
    Ok(())
}
