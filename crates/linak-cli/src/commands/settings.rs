//! Settings commands: `lowest_pos_mm`, `device_id` and `config`.

use anyhow::Result;
use linak_core::{ConfigStore, DeskSettings};
use serde_json::Value;

use super::OutputOptions;
use crate::style;

pub fn cmd_lowest_pos_mm(store: &impl ConfigStore, value: i32, out: OutputOptions) -> Result<()> {
    DeskSettings::new(store).set_lowest_pos_mm(value)?;
    if !out.quiet {
        println!(
            "{}",
            style::format_success(&format!("Saved config.lowest_pos_mm = {}", value), out.no_color)
        );
    }
    Ok(())
}

pub fn cmd_device_id(store: &impl ConfigStore, value: &str, out: OutputOptions) -> Result<()> {
    let settings = DeskSettings::new(store);
    settings.set_device_id(value)?;
    if !out.quiet {
        let stored = settings.device_id()?.unwrap_or_default();
        println!(
            "{}",
            style::format_success(&format!("Saved config.device_id = {}", stored), out.no_color)
        );
    }
    Ok(())
}

pub fn cmd_config(store: &impl ConfigStore) -> Result<()> {
    let snapshot = DeskSettings::new(store).snapshot()?;
    println!("{}", serde_json::to_string_pretty(&Value::Object(snapshot))?);
    Ok(())
}
