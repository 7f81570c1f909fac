//! # targets-verifier-cli
//!
//! Command-line front end for the Targets metadata verifier.
//!
//! ## Usage
//!
//! ```text
//! targets-verifier-cli verify --roster roster.toml targets.json
//! targets-verifier-cli verify --roster roster.toml --json -
//! targets-verifier-cli check-roster roster.toml
//! ```

mod config;
mod report;

use std::io::Read as _;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use config::Roster;
use report::Report;
use targets_verifier_core::byte_source::ReaderSource;
use targets_verifier_core::context::{ContextInit, VerifierContext};

#[derive(Parser)]
#[command(name = "targets-verifier-cli")]
#[command(about = "Verify Uptane Director Targets metadata documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a Targets metadata document against a roster.
    Verify {
        /// Path to the TOML roster file (trust anchors + ECU identity).
        #[arg(long)]
        roster: PathBuf,
        /// Path to the document, or "-" for standard input.
        #[arg(default_value = "-")]
        document: String,
        /// Emit the result as JSON instead of a human-readable summary.
        #[arg(long)]
        json: bool,
    },

    /// Load and validate a roster file without verifying a document.
    CheckRoster {
        /// Path to the TOML roster file.
        roster: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Verify { roster, document, json } => cmd_verify(&roster, &document, json),
        Commands::CheckRoster { roster } => cmd_check_roster(&roster),
    };

    process::exit(exit_code);
}

fn cmd_check_roster(path: &PathBuf) -> i32 {
    match Roster::load(path) {
        Ok(roster) => {
            println!(
                "roster OK: {} key(s), threshold {}, ecu={}, hardware={}",
                roster.keys.len(),
                roster.threshold,
                roster.ecu_id,
                roster.hardware_id
            );
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

fn cmd_verify(roster_path: &PathBuf, document: &str, json: bool) -> i32 {
    debug!(roster = %roster_path.display(), document, "loading roster and document");

    let roster = match Roster::load(roster_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let now = roster.now.unwrap_or_else(chrono::Utc::now);

    let source = match open_document(document) {
        Ok(r) => ReaderSource::new(r),
        Err(e) => {
            eprintln!("error: cannot read {document}: {e}");
            return 1;
        }
    };

    let ctx: VerifierContext<_, { config::MAX_SIGS }, { config::BUF_SIZE }> = match VerifierContext::new(ContextInit {
        source,
        now,
        version_prev: roster.version_prev,
        ecu_id: roster.ecu_id.as_bytes(),
        hardware_id: roster.hardware_id.as_bytes(),
        trusted_keys: &roster.keys,
        threshold: roster.threshold,
    }) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: invalid roster: {e}");
            return 1;
        }
    };

    let outcome = ctx.process();
    let report = Report::new(&outcome);

    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_json()).unwrap());
    } else {
        println!("{}", report.to_human());
    }

    info!(result = %outcome, "verification complete");
    report.exit_code()
}

fn open_document(path: &str) -> std::io::Result<Box<dyn std::io::Read>> {
    if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(Box::new(std::io::Cursor::new(buf)))
    } else {
        Ok(Box::new(std::fs::File::open(path)?))
    }
}
