//! Visual styling utilities for the CLI.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Standard spinner tick characters (Braille dots animation)
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard spinner tick interval
const SPINNER_TICK_MS: u64 = 80;

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_TICK_CHARS);
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

/// Create a spinner for scanning, unless output is quiet.
pub fn scanning_spinner(seconds: u64, quiet: bool) -> Option<ProgressBar> {
    (!quiet).then(|| spinner(format!("Scanning for devices... ({}s)", seconds)))
}

/// Create a spinner while connecting to the desk, unless output is quiet.
pub fn connecting_spinner(device: &str, quiet: bool) -> Option<ProgressBar> {
    (!quiet).then(|| spinner(format!("Connecting to {}...", device)))
}

/// Stop and clear a spinner.
pub fn finish(spinner: Option<ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}

/// Print a message to stdout while suspending a spinner.
pub fn print_suspended_stdout(spinner: Option<&ProgressBar>, message: &str) {
    if let Some(pb) = spinner {
        pb.suspend(|| {
            println!("{}", message);
        });
    } else {
        println!("{}", message);
    }
}

/// Format a success message.
pub fn format_success(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[OK] {}", message)
    } else {
        format!("{} {}", "[OK]".green(), message)
    }
}

/// Format a hint shown after an error.
pub fn format_hint(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[--] {}", message)
    } else {
        format!("{} {}", "[--]".cyan(), message)
    }
}

/// Format an error line.
pub fn format_error(message: &str, no_color: bool) -> String {
    if no_color {
        format!("Error: {}", message)
    } else {
        format!("{} {}", "Error:".red().bold(), message)
    }
}
