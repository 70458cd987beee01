//! mini-ca - A small tool to help with creating certificate authorities
//!
//! ```bash
//! mini-ca new root --name root --out ca
//! mini-ca new mid  --name mid  --out ca --parent root --in ca
//! mini-ca new leaf --name web  --out ca --parent mid  --in ca
//! ```
//!
//! Subject fields and validity dates are prompted for on stdin. Set `RUST_LOG=debug`
//! to see what the library is doing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mini_ca::commands::{handle_new, NewArgs};
use mini_ca::configs::MiniCaConfig;
use mini_ca::prompt::Prompter;
use mini_ca::random::OsRandom;
use mini_ca::CaError;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status when the secure random source fails.
const EXIT_ENTROPY_EXHAUSTED: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "mini-ca",
    version,
    about = "A small tool to help with creating certificate authorities"
)]
struct Cli {
    /// Path to a TOML config file [default: mini-ca.toml if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new key/certificate pair
    New(NewArgs),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let fatal = e
                .chain()
                .any(|cause| cause.downcast_ref::<CaError>().is_some_and(CaError::is_fatal));
            if fatal {
                tracing::error!("secure random source failed, refusing to continue");
                eprintln!("fatal: {:#}", e);
                ExitCode::from(EXIT_ENTROPY_EXHAUSTED)
            } else {
                eprintln!("{:#}", e);
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = MiniCaConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::New(args) => {
            let stdin = io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), io::stdout());
            handle_new(&args, &config, &mut prompter, &OsRandom)?;
        }
    }
    Ok(())
}
