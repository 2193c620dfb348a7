//! Position command implementation.

use anyhow::{Context, Result};
use linak_core::{BtlePlatform, Desk, DeskSettings, JsonFileStore};

use super::OutputOptions;
use crate::style;

pub async fn cmd_position(store: JsonFileStore, out: OutputOptions) -> Result<()> {
    let (desk, device_id) = open_desk(store).await?;

    let spinner = style::connecting_spinner(&device_id, out.quiet);
    let reading = desk.read_position().await;
    style::finish(spinner);

    let reading = reading?;
    tracing::debug!("Raw position {}", reading.raw.value());
    println!("Current position is {}", reading);
    Ok(())
}

/// Check settings, then open the adapter.
///
/// Returns the desk together with its stored identity.
pub(super) async fn open_desk(
    store: JsonFileStore,
) -> Result<(Desk<BtlePlatform, JsonFileStore>, String)> {
    let (device_id, _) = DeskSettings::new(&store).require()?;

    let platform = BtlePlatform::new()
        .await
        .context("Failed to open Bluetooth adapter")?;
    Ok((Desk::new(platform, store), device_id))
}
