/*!
 * bucketscan CLI - Command Line Interface
 *
 * Author: Shane Wall <shaneawall@gmail.com>
 */

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bucketscan::{
    cli_style::{
        self, open_buckets_table, print_error, print_info, print_success, print_warning,
        runs_table, stats_table, Theme,
    },
    config::{LogLevel, ScanConfig},
    core::{CancelFlag, ScanPipeline},
    error::{ErrorCategory, Result, ScanError, EXIT_SUCCESS},
    logging, HttpProbe,
};
use scan_ledger::{Ledger, MemoryLedger, ProgressStore, ResultStore};

#[derive(Parser)]
#[command(name = "bucketscan")]
#[command(version, about = "Resumable discovery of publicly listable S3 buckets", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long = "log-level", value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write JSON logs to this file instead of stderr
    #[arg(long = "log", value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every candidate in a word list and record the results
    Scan {
        /// Candidate list, one name per line, sorted
        #[arg(short = 'i', long = "input-file", value_name = "PATH")]
        input_file: PathBuf,

        /// SQLite ledger path
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        /// Process kind tag stored on the run record
        #[arg(long, value_name = "TAG")]
        kind: Option<String>,

        /// Endpoint template with a {bucket} placeholder (repeatable)
        #[arg(long = "endpoint", value_name = "TEMPLATE")]
        endpoints: Vec<String>,

        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Hide the progress spinner
        #[arg(long)]
        no_progress: bool,

        /// Record results in memory only
        #[arg(long)]
        dry_run: bool,
    },

    /// List recent scan runs and where they stopped
    Runs {
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// List discovered open buckets
    Found {
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            print_error(&e.to_string(), hint_for(&e));
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn hint_for(error: &ScanError) -> Option<&'static str> {
    if error.is_input_error() {
        return Some("Nothing was scanned; check --input-file and --config, then rerun");
    }
    match error.category() {
        ErrorCategory::Network | ErrorCategory::Storage | ErrorCategory::Cancelled => {
            Some("Run `bucketscan runs` to see the last persisted line, then restart from the next one")
        }
        _ => None,
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => ScanConfig::from_file(path)?,
        None => ScanConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    config.verbose |= cli.verbose;

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| ScanError::Other(format!("Failed to start async runtime: {}", e)))?;

    match cli.command {
        Commands::Scan {
            input_file,
            db,
            kind,
            endpoints,
            timeout,
            no_progress,
            dry_run,
        } => {
            if let Some(db) = db {
                config.database_path = db;
            }
            if let Some(kind) = kind {
                config.process_kind = kind;
            }
            if !endpoints.is_empty() {
                config.probe.endpoints = endpoints;
            }
            if let Some(timeout) = timeout {
                config.probe.timeout_secs = timeout;
            }
            if no_progress {
                config.show_progress = false;
            }
            runtime.block_on(handle_scan(&config, &input_file, dry_run))
        }
        Commands::Runs { db, limit } => {
            let path = db.unwrap_or(config.database_path);
            runtime.block_on(handle_runs(&path, limit))
        }
        Commands::Found { db, limit } => {
            let path = db.unwrap_or(config.database_path);
            runtime.block_on(handle_found(&path, limit))
        }
    }
}

/// Open the input before anything touches the ledger
fn open_input(path: &Path) -> Result<BufReader<File>> {
    if !path.is_file() {
        return Err(ScanError::InputNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    Ok(BufReader::new(file))
}

async fn open_ledger(path: &Path) -> Result<Box<dyn Ledger>> {
    let ledger = scan_ledger::open(&path.to_string_lossy()).await?;
    Ok(ledger)
}

async fn handle_scan(config: &ScanConfig, input_file: &Path, dry_run: bool) -> Result<()> {
    let input = open_input(input_file)?;
    let probe = HttpProbe::new(config.probe.clone())?;

    let ledger: Box<dyn Ledger> = if dry_run {
        print_warning("Dry run: results are kept in memory and discarded on exit");
        Box::new(MemoryLedger::new())
    } else {
        open_ledger(&config.database_path).await?
    };

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current candidate");
            on_signal.cancel();
        }
    });

    let mut pipeline = ScanPipeline::new(&probe, ledger.as_ref()).with_cancel(cancel);
    if config.show_progress {
        pipeline = pipeline.with_progress_bar(cli_style::scan_spinner());
    }

    let input_id = input_file.display().to_string();
    let summary = pipeline
        .run(input, &input_id, &config.process_kind)
        .await?;

    println!("\n{}", Theme::header(format!("Scan #{} Summary", summary.run.id)));
    println!("{}", stats_table(&summary.stats.summary_items()));
    print_success(&format!(
        "Completed {} ({} open buckets)",
        input_id,
        summary.stats.open_found()
    ));
    Ok(())
}

async fn handle_runs(db: &Path, limit: usize) -> Result<()> {
    let ledger = open_ledger(db).await?;
    let runs = ledger.list_runs(limit).await?;

    if runs.is_empty() {
        print_info("No scan runs recorded yet");
        return Ok(());
    }

    println!("{}", runs_table(&runs));
    for run in runs.iter().filter(|r| r.is_failed()) {
        print_info(&format!(
            "Run #{} stopped; resume {} from line {}",
            run.id,
            run.input_id,
            run.resume_line()
        ));
    }
    Ok(())
}

async fn handle_found(db: &Path, limit: usize) -> Result<()> {
    let ledger = open_ledger(db).await?;
    let buckets = ledger.list_open_buckets(limit).await?;

    if buckets.is_empty() {
        print_info("No open buckets recorded yet");
        return Ok(());
    }

    println!("{}", open_buckets_table(&buckets));
    Ok(())
}
