//! `linak-desk`: command-line control for LINAK desks.
//!
//! Exit codes: `0` success, `1` Bluetooth or storage failure, `2` usage
//! error (bad arguments, missing settings, or `scan` without a terminal),
//! `3` the desk disconnected during the command.

mod cli;
mod commands;
mod config;
mod style;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use linak_core::{Error, ErrorKind, Setting};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::OutputOptions;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Operator output goes to stdout; logs go to stderr.
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let out = OutputOptions {
        quiet: cli.quiet,
        no_color: cli.no_color,
    };

    match run(cli, out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e, out.no_color),
    }
}

async fn run(cli: Cli, out: OutputOptions) -> Result<()> {
    let store = config::open_store(cli.config.as_deref());

    match cli.command {
        Commands::Scan { seconds } => commands::cmd_scan(store, seconds, out).await,
        Commands::LowestPosMm { value } => commands::cmd_lowest_pos_mm(&store, value, out),
        Commands::DeviceId { value } => commands::cmd_device_id(&store, &value, out),
        Commands::Config => commands::cmd_config(&store),
        Commands::Position => commands::cmd_position(store, out).await,
        Commands::Positions => commands::cmd_positions(&store),
        Commands::Save { name, height_mm } => {
            commands::cmd_save(store, &name, height_mm, out).await
        }
        Commands::Del { name } => commands::cmd_delete(&store, &name, out),
    }
}

/// Print an error with hints and pick the exit code.
fn report_error(err: &anyhow::Error, no_color: bool) -> ExitCode {
    if err.downcast_ref::<commands::NotInteractive>().is_some() {
        eprintln!("{}", style::format_error(&format!("{:#}", err), no_color));
        return ExitCode::from(2);
    }

    let Some(desk_err) = err.downcast_ref::<Error>() else {
        eprintln!("{}", style::format_error(&format!("{:#}", err), no_color));
        return ExitCode::from(1);
    };

    match desk_err {
        Error::LinkLost { .. } => {
            eprintln!(
                "{}",
                style::format_error("Device is disconnected. Exit...", no_color)
            );
        }
        Error::NotConfigured { missing } => {
            eprintln!("{}", style::format_error(&format!("{:#}", err), no_color));
            let total = missing.len();
            for (i, setting) in missing.iter().enumerate() {
                let hint = match setting {
                    Setting::DeviceId => {
                        "Run `linak-desk scan` or `linak-desk device_id <id>` to choose the desk"
                    }
                    Setting::LowestPosMm => {
                        "Measure the desk at its lowest position and run `linak-desk lowest_pos_mm <mm>`"
                    }
                };
                eprintln!(
                    "{}",
                    style::format_hint(&format!("[Config {}/{}] {}", i + 1, total, hint), no_color)
                );
            }
        }
        _ => {
            eprintln!("{}", style::format_error(&format!("{:#}", err), no_color));
        }
    }

    match desk_err.kind() {
        ErrorKind::Usage => ExitCode::from(2),
        ErrorKind::LinkLost => ExitCode::from(3),
        _ => ExitCode::from(1),
    }
}
