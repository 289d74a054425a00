use std::path::PathBuf;

use anagram::{read_words_from_path, AnagramConfig, Pipeline};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "anagram")]
#[command(about = "Incremental anagram classification", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Group candidate words under the keys of the target dictionary
    Classify {
        /// Target dictionary, one word per line
        #[arg(long)]
        targets: PathBuf,
        /// Candidate word list, one word per line
        #[arg(long)]
        candidates: PathBuf,
    },

    /// Discard the ledger and rebuild it from the targets and stored groups
    #[command(name = "rebuild-ledger")]
    RebuildLedger {
        #[arg(long)]
        targets: PathBuf,
    },

    /// Write a compressed ledger snapshot
    #[command(name = "export-ledger")]
    ExportLedger { output: PathBuf },

    /// Replace the ledger with a snapshot
    #[command(name = "import-ledger")]
    ImportLedger { input: PathBuf },
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = match &cli.config {
        Some(path) => AnagramConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnagramConfig::default(),
    };
    let pipeline = Pipeline::open(config).context("opening store")?;

    match cli.command {
        Commands::Classify {
            targets,
            candidates,
        } => {
            let report = pipeline
                .classify_files(&targets, &candidates)
                .context("classification failed")?;
            println!("{}", serde_yaml::to_string(&report)?);
            if !report.is_complete() {
                bail!(
                    "{} words could not be stored; re-run to pick them up",
                    report.failed
                );
            }
        }
        Commands::RebuildLedger { targets } => {
            let targets = read_words_from_path(&targets)?;
            let ledger = pipeline.rebuild_ledger(&targets)?;
            println!("rebuilt ledger with {} keys", ledger.len());
        }
        Commands::ExportLedger { output } => {
            let snapshot = pipeline.export_ledger(&output)?;
            println!(
                "exported {} keys to {}",
                snapshot.entries.len(),
                output.display()
            );
        }
        Commands::ImportLedger { input } => {
            let ledger = pipeline.import_ledger(&input)?;
            println!("imported {} keys from {}", ledger.len(), input.display());
        }
    }
    Ok(())
}
