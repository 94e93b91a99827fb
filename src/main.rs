//! sheetdrop CLI: runs one trigger through the responder, delivering into a local directory.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sheetdrop::logging;
use sheetdrop::{prepare, resolve, BotConfig, DirectoryDelivery, Responder, Trigger};

#[derive(Debug, Parser)]
#[command(name = "sheetdrop", version, about = "Send sample spreadsheets as CSV files or one ZIP")]
struct Cli {
    /// Bot token (required)
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Link embedded in the welcome message
    #[arg(long, env = "STOXEYE_URL")]
    url: Option<String>,

    /// Spreadsheet file or folder
    #[arg(long, env = "CSV_DIR")]
    source: Option<String>,

    /// Where converted CSVs and the archive are written while a request runs
    #[arg(long, env = "SCRATCH_DIR")]
    scratch_dir: Option<String>,

    /// Directory receiving delivered documents
    #[arg(long, default_value = "outbox")]
    out: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Link + all files as one ZIP
    Start,
    /// All files as one ZIP
    Zip,
    /// Each file individually
    Files,
    /// Free text, as if typed in the chat
    Say { text: String },
    /// Print resolved sources and their display names without delivering
    List,
}

impl Cli {
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "BOT_TOKEN" => self.token.clone(),
            "STOXEYE_URL" => self.url.clone(),
            "CSV_DIR" => self.source.clone(),
            "SCRATCH_DIR" => self.scratch_dir.clone(),
            _ => std::env::var(key).ok(),
        }
    }
}

fn main() {
    logging::init_logging();

    if let Err(err) = run() {
        eprintln!("sheetdrop error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = BotConfig::from_lookup(|key| cli.lookup(key)).context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let trigger = match &cli.command {
        CliCommand::List => return list(&config),
        CliCommand::Start => Trigger::Start,
        CliCommand::Zip => Trigger::Zip,
        CliCommand::Files => Trigger::Files,
        CliCommand::Say { text } => Trigger::Text(text.clone()),
    };

    let mut delivery = DirectoryDelivery::new(&cli.out, io::stdout());
    Responder::new(&config)
        .respond(&trigger, &mut delivery)
        .with_context(|| format!("failed to respond to {:?}", trigger))?;
    tracing::info!(out = %delivery.out_dir().display(), "delivered");
    Ok(())
}

fn list(config: &BotConfig) -> Result<()> {
    let paths = resolve(config.source())?;
    let prepared = prepare(&paths, &config.prepare_options())?;

    if prepared.is_empty() {
        println!("No CSV/Excel files found at {}", config.source().hint());
        return Ok(());
    }

    // non-empty means one entry per resolved path; failed conversions keep the original
    for (source, entry) in paths.iter().zip(&prepared.entries) {
        println!("{}\t{}", entry.display_name, source.display());
    }
    Ok(())
}
