//! Command implementations for the CLI.

mod position;
mod presets;
mod scan;
mod settings;

pub use position::cmd_position;
pub use presets::{cmd_delete, cmd_positions, cmd_save};
pub use scan::{NotInteractive, cmd_scan};
pub use settings::{cmd_config, cmd_device_id, cmd_lowest_pos_mm};

/// Output options shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub quiet: bool,
    pub no_color: bool,
}
