//! Scan command implementation.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use linak_core::{BtlePlatform, Desk, JsonFileStore, ScanOptions};

use super::OutputOptions;
use crate::style;

/// `scan` needs an operator to pick a device, but stdin is not a terminal.
#[derive(Debug, thiserror::Error)]
#[error("Device selection needs an interactive terminal; run `linak-desk device_id <id>` instead")]
pub struct NotInteractive;

pub async fn cmd_scan(store: JsonFileStore, seconds: u64, out: OutputOptions) -> Result<()> {
    if !io::stdin().is_terminal() {
        return Err(NotInteractive.into());
    }

    let platform = BtlePlatform::new()
        .await
        .context("Failed to open Bluetooth adapter")?;
    let desk = Desk::new(platform, store);

    let spinner = style::scanning_spinner(seconds, out.quiet);
    let options = ScanOptions::new().duration_secs(seconds);
    let devices = desk
        .scan_with_progress(&options, |n, id| {
            style::print_suspended_stdout(spinner.as_ref(), &format!("{}: {}", n, id));
        })
        .await
        .context("Failed to scan for devices")?;
    style::finish(spinner);

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    let input = prompt(format!("Select device [1-{}]: ", devices.len())).await?;
    let identity = desk.select_and_save(&devices, &input)?;

    println!(
        "{}",
        style::format_success(
            &format!("Saved config.device_id = {}", identity),
            out.no_color
        )
    );
    Ok(())
}

async fn prompt(message: String) -> Result<String> {
    tokio::task::spawn_blocking(move || -> Result<String> {
        print!("{}", message);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(input)
    })
    .await
    .context("Prompt task failed")?
}
