//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "linak-desk")]
#[command(author, version, about = "Control a LINAK desk over Bluetooth LE", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "LINAK_DESK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan for nearby devices and choose the desk
    Scan {
        /// Scan duration in seconds
        #[arg(default_value_t = 10)]
        seconds: u64,
    },

    /// Set the desk's lowest height in millimeters
    #[command(name = "lowest_pos_mm")]
    LowestPosMm {
        /// Height of the desk at its lowest position
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },

    /// Set the desk's Bluetooth identity
    #[command(name = "device_id")]
    DeviceId {
        /// Bluetooth address (or CoreBluetooth UUID on macOS)
        value: String,
    },

    /// Show the stored settings
    Config,

    /// Read the current desk height
    #[command(visible_alias = "p")]
    Position,

    /// List saved positions
    #[command(visible_alias = "ps")]
    Positions,

    /// Save a named position (reads the current height if none is given)
    Save {
        /// Position name
        name: String,

        /// Height in millimeters; zero or less deletes the position
        #[arg(allow_negative_numbers = true)]
        height_mm: Option<i32>,
    },

    /// Delete a saved position
    #[command(name = "del", visible_alias = "delete")]
    Del {
        /// Position name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_aliases() {
        let cli = Cli::try_parse_from(["linak-desk", "p"]).unwrap();
        assert!(matches!(cli.command, Commands::Position));

        let cli = Cli::try_parse_from(["linak-desk", "ps"]).unwrap();
        assert!(matches!(cli.command, Commands::Positions));
    }

    #[test]
    fn test_parse_save_with_negative_height() {
        let cli = Cli::try_parse_from(["linak-desk", "save", "sit", "-1"]).unwrap();
        match cli.command {
            Commands::Save { name, height_mm } => {
                assert_eq!(name, "sit");
                assert_eq!(height_mm, Some(-1));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_scan_default_duration() {
        let cli = Cli::try_parse_from(["linak-desk", "scan"]).unwrap();
        assert!(matches!(cli.command, Commands::Scan { seconds: 10 }));
    }

    #[test]
    fn test_rejects_non_numeric_calibration() {
        assert!(Cli::try_parse_from(["linak-desk", "lowest_pos_mm", "low"]).is_err());
    }
}
