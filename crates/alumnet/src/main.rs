// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alumnet - mentorship call sessions from the command line.

mod health;
mod session;
mod shutdown;

use std::path::PathBuf;

use alumnet_core::{CallType, PRESET_REJECTION_REASONS};
use clap::{Args, Parser, Subcommand};

/// Alumnet - mentorship call sessions from the command line.
#[derive(Parser, Debug)]
#[command(name = "alumnet", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which request to act on, and as whom.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Acting user (the requester or the mentor).
    #[arg(long)]
    pub user: String,

    /// Mentorship request id.
    #[arg(long)]
    pub request: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the reconciled request and the completion action state.
    View(Target),
    /// Accept a pending request.
    Accept(Target),
    /// Reject a pending request with a reason.
    Reject {
        #[command(flatten)]
        target: Target,
        /// Free-text reason.
        #[arg(long, conflicts_with = "preset", required_unless_present = "preset")]
        reason: Option<String>,
        /// Index of one of the preset reasons.
        #[arg(long, value_parser = parse_preset)]
        preset: Option<usize>,
    },
    /// Start a call for an accepted, paid request.
    StartCall {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value = "video")]
        call_type: CallType,
    },
    /// End the running call.
    EndCall {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value = "video")]
        call_type: CallType,
    },
    /// Mark the request completed once the session rules allow it.
    Complete(Target),
    /// Follow a request until interrupted, printing state changes.
    Watch(Target),
    /// Check every collaborator and the local store.
    Health,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => alumnet_config::load_and_validate_path(path),
        None => alumnet_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            alumnet_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);

    let result = match cli.command {
        Commands::View(target) => session::run_view(&config, &target, cli.json).await,
        Commands::Accept(target) => session::run_accept(&config, &target, cli.json).await,
        Commands::Reject {
            target,
            reason,
            preset,
        } => {
            let reason = reason
                .or_else(|| {
                    preset
                        .and_then(|index| PRESET_REJECTION_REASONS.get(index))
                        .map(|preset| preset.to_string())
                })
                .unwrap_or_default();
            session::run_reject(&config, &target, &reason, cli.json).await
        }
        Commands::StartCall { target, call_type } => {
            session::run_start_call(&config, &target, call_type, cli.json).await
        }
        Commands::EndCall { target, call_type } => {
            session::run_end_call(&config, &target, call_type, cli.json).await
        }
        Commands::Complete(target) => session::run_complete(&config, &target, cli.json).await,
        Commands::Watch(target) => session::run_watch(&config, &target).await,
        Commands::Health => health::run_health(&config, cli.json).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn parse_preset(value: &str) -> Result<usize, String> {
    let index: usize = value.parse().map_err(|e| format!("{e}"))?;
    if index < PRESET_REJECTION_REASONS.len() {
        return Ok(index);
    }
    let choices = PRESET_REJECTION_REASONS
        .iter()
        .enumerate()
        .map(|(i, reason)| format!("  {i}: {reason}"))
        .collect::<Vec<_>>()
        .join("\n");
    Err(format!("no preset reason {index}, choose one of:\n{choices}"))
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("alumnet={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
