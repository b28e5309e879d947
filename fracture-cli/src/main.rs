//! # fracture
//!
//! Command line front end for the fracture chaos engine.
//!
//! ## Commands
//!
//! - `validate`: Check a test plan document
//! - `targets`: Preview the hosts an attack would select
//! - `verification`: List the checks bound to a system state
//! - `export`: Write a plan back out as JSON or YAML
//! - `schema`: Print, write or check the plan JSON Schema
//! - `attack`: Run the attack against the selected targets
//!
//! ## Example
//!
//! ```bash
//! # Check a plan
//! fracture validate plans/web-tier.yaml
//!
//! # Preview targets with a fixed seed
//! fracture targets plans/web-tier.yaml --seed 7
//!
//! # Dry run against the mock runner, then for real
//! fracture attack plans/web-tier.yaml --mock --seed 7
//! fracture attack plans/web-tier.yaml --config fracture.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use fracture_types::{DocumentFormat, SystemState};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{attack, export, schema, targets, validate, verification};

/// Command line front end for the fracture chaos engine.
#[derive(Parser, Debug)]
#[command(name = "fracture")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a test plan document
    Validate {
        /// Test plan file (.json, .yaml or .yml)
        plan: PathBuf,
    },

    /// Show the hosts an attack would select
    Targets {
        /// Test plan file
        plan: PathBuf,

        /// Seed the target selection for a reproducible result
        #[arg(long)]
        seed: Option<u64>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the verification checks that run in a system state
    Verification {
        /// Test plan file
        plan: PathBuf,

        /// System state, e.g. STEADY or CHAOS
        #[arg(long, short)]
        state: SystemState,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export a test plan as JSON or YAML
    Export {
        /// Test plan file
        plan: PathBuf,

        /// Output file
        #[arg(long, short)]
        output: PathBuf,

        /// Output format (default: from the output file extension)
        #[arg(long, short)]
        format: Option<DocumentFormat>,
    },

    /// Print, write or check the test plan JSON Schema
    Schema {
        /// Write the schema to this file instead of stdout
        #[arg(long, short, conflicts_with = "check")]
        output: Option<PathBuf>,

        /// Check a published schema file against the current model
        #[arg(long)]
        check: Option<PathBuf>,
    },

    /// Run the attack described by a test plan
    Attack {
        /// Test plan file
        plan: PathBuf,

        /// Configuration file (default: fracture.toml if present)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Use the mock runner instead of ssh (for testing/demo)
        #[arg(long)]
        mock: bool,

        /// Seed the target selection for a reproducible result
        #[arg(long)]
        seed: Option<u64>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { plan } => {
            validate::run(&plan)?;
        }
        Commands::Targets { plan, seed, json } => {
            targets::run(&plan, seed, json)?;
        }
        Commands::Verification { plan, state, json } => {
            verification::run(&plan, state, json)?;
        }
        Commands::Export {
            plan,
            output,
            format,
        } => {
            export::run(&plan, &output, format)?;
        }
        Commands::Schema { output, check } => {
            if let Some(published) = check {
                schema::check(&published)?;
            } else {
                schema::run(output.as_deref())?;
            }
        }
        Commands::Attack {
            plan,
            config,
            mock,
            seed,
            json,
        } => {
            let options = attack::AttackOptions {
                config,
                mock,
                seed,
                json,
            };
            let report = attack::run(&plan, &options).await?;
            attack::ensure_success(&report)?;
        }
    }

    Ok(())
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays parseable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
