//! Hearth - grammar-checked smart home command interpreter
//!
//! # Usage
//!
//! ```bash
//! hearth turn on the kitchen fan
//! hearth --trace "turn living on lights"
//! hearth --config hearth.toml --events events.jsonl
//! hearth --check --grammar my_home.cfg
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hearth::{
    config::AssistantConfig,
    dispatch::{Assistant, Services},
    error::Result,
    repl::{self, ReplOptions},
    services::{
        EventStore, InMemoryDeviceRegistry, JsonLinesEventStore, MemoryEventStore, Reminder,
        ReminderId, ThreadTimer,
    },
};
use tracing_subscriber::EnvFilter;

/// Grammar-checked smart home command interpreter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Command to run once; reads commands from stdin when omitted
    #[arg(value_name = "COMMAND")]
    command: Vec<String>,

    /// Grammar file (.cfg) to use instead of the built-in home grammar
    #[arg(short, long)]
    grammar: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append action records to this JSON lines file
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Print the derivation trace for each command
    #[arg(short, long)]
    trace: bool,

    /// Print one JSON object per command
    #[arg(long)]
    json: bool,

    /// Enable the rule-based fallback classifier
    #[arg(long)]
    fallback: bool,

    /// Validate the grammar and exit
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AssistantConfig::load(path)?,
        None => AssistantConfig::default(),
    };
    if let Some(grammar) = args.grammar {
        config = config.with_grammar(grammar);
    }
    if let Some(events) = args.events {
        config = config.with_events(events);
    }
    if args.fallback {
        config = config.with_fallback(true);
    }

    if args.check {
        let grammar = config.load_grammar()?;
        println!(
            "Grammar OK: {} nonterminals, start symbol {}",
            grammar.len(),
            grammar.start()
        );
        return Ok(());
    }

    let store: Arc<dyn EventStore> = match &config.events {
        Some(path) => Arc::new(JsonLinesEventStore::open(path)?),
        None => Arc::new(MemoryEventStore::new()),
    };
    let timer = Arc::new(ThreadTimer::new(Box::new(|id: ReminderId, reminder: &Reminder| {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "\n🔔 Reminder {}: {}", id, reminder.task);
        let _ = stdout.flush();
    })));
    let services = Services::new(
        Arc::new(InMemoryDeviceRegistry::with_home_devices()),
        store,
        timer.clone(),
    );
    let assistant = Assistant::from_config(&config, services)?;

    let options = ReplOptions {
        trace: args.trace,
        json: args.json,
    };
    if args.command.is_empty() {
        let stdin = io::stdin();
        repl::run_interactive(&assistant, options, stdin.lock(), io::stdout())?;
    } else {
        let command = args.command.join(" ");
        repl::run_once_and_wait(&assistant, options, &command, &mut io::stdout(), &timer)?;
    }

    Ok(())
}
