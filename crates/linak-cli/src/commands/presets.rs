//! Preset commands: `positions`, `save` and `del`.

use anyhow::Result;
use linak_core::{ConfigStore, JsonFileStore, PresetChange, PresetRegistry, validate_name};
use tabled::{builder::Builder, settings::Style};

use super::OutputOptions;
use super::position::open_desk;
use crate::style;

pub fn cmd_positions(store: &impl ConfigStore) -> Result<()> {
    let presets = PresetRegistry::new(store).list()?;

    if presets.is_empty() {
        println!("No saved positions");
        return Ok(());
    }

    println!("Saved positions [{}]:", presets.len());
    let mut builder = Builder::default();
    builder.push_record(["Name", "Height (mm)"]);
    for preset in &presets {
        builder.push_record([preset.name.clone(), preset.height_mm.to_string()]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{}", table);
    Ok(())
}

pub async fn cmd_save(
    store: JsonFileStore,
    name: &str,
    height_mm: Option<i32>,
    out: OutputOptions,
) -> Result<()> {
    let change = match height_mm {
        Some(height) => PresetRegistry::new(&store).save(name, height)?,
        None => {
            // Reject the name before touching the radio.
            validate_name(name)?;
            let (desk, device_id) = open_desk(store).await?;

            let spinner = style::connecting_spinner(&device_id, out.quiet);
            let change = desk.save_preset(name, None).await;
            style::finish(spinner);
            change?
        }
    };
    report(&change, out);
    Ok(())
}

pub fn cmd_delete(store: &impl ConfigStore, name: &str, out: OutputOptions) -> Result<()> {
    let change = PresetRegistry::new(store).delete(name)?;
    report(&change, out);
    Ok(())
}

fn report(change: &PresetChange, out: OutputOptions) {
    if out.quiet {
        return;
    }

    let message = match change {
        PresetChange::Saved {
            preset,
            replaced: None,
        } => format!("Saved new position \"{}\": {} mm", preset.name, preset.height_mm),
        PresetChange::Saved {
            preset,
            replaced: Some(previous),
        } => format!(
            "Updated position \"{}\": {} mm (was {} mm)",
            preset.name, preset.height_mm, previous
        ),
        PresetChange::Deleted {
            name,
            existed: true,
        } => format!("Position \"{}\" deleted.", name),
        PresetChange::Deleted {
            name,
            existed: false,
        } => format!("Position \"{}\" not found, nothing to delete.", name),
    };
    println!("{}", style::format_success(&message, out.no_color));
}
