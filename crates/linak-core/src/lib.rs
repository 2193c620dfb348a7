//! Core BLE library for LINAK desk controllers.
//!
//! This crate talks to a LINAK desk over Bluetooth Low Energy: it finds the
//! desk, connects for the duration of one action, reads the position
//! telemetry and converts it to millimeters. Settings and height presets are
//! kept in a pluggable [`ConfigStore`].
//!
//! # Features
//!
//! - **Discovery**: time-boxed, deduplicated, cancellable scan
//! - **Sessions**: connect, run one action, always disconnect
//! - **Link loss**: a dropped connection ends the action with [`Error::LinkLost`]
//! - **Telemetry**: raw position to millimeters with a per-desk calibration
//! - **Presets**: named heights stored next to the other settings
//!
//! # Platform Differences
//!
//! On Linux and Windows a desk is identified by its Bluetooth address. On
//! macOS CoreBluetooth hides the address, so the peripheral UUID is used
//! instead; it is stable on one Mac but differs between machines.
//!
//! # Quick Start
//!
//! ```no_run
//! use linak_core::{BtlePlatform, Desk, JsonFileStore, ScanOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = BtlePlatform::new().await?;
//!     let desk = Desk::new(platform, JsonFileStore::new("linak_desk.json"));
//!
//!     let devices = desk.scan(&ScanOptions::default()).await?;
//!     for (i, id) in devices.iter().enumerate() {
//!         println!("{}: {}", i + 1, id);
//!     }
//!     desk.select_and_save(&devices, "1")?;
//!     desk.set_calibration(620)?;
//!
//!     let reading = desk.read_position().await?;
//!     println!("Current position is {}", reading);
//!     Ok(())
//! }
//! ```

pub mod ble;
pub mod desk;
pub mod discovery;
pub mod error;
pub mod mock;
pub mod presets;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod traits;
pub mod util;

pub use linak_types::{
    Calibration, Millimeters, ParseError, PositionReading, Preset, RawPosition, uuids,
};

pub use ble::{BtleLink, BtlePlatform, get_adapter};
pub use desk::Desk;
pub use discovery::{
    DEFAULT_SCAN_DURATION, DiscoveredDevices, DiscoveryStream, ScanOptions, discover,
    discover_with_progress, start_discovery,
};
pub use error::{DeviceNotFoundReason, Error, ErrorKind, Result, Setting};
pub use mock::{MockLink, MockPlatform, MockPlatformBuilder};
pub use presets::{PresetChange, PresetRegistry, validate_name};
pub use session::{ConnectionConfig, Session, with_connection};
pub use store::{ConfigStore, DeskSettings, JsonFileStore, MemoryStore};
pub use telemetry::{read_current_position, read_position, read_raw_position};
pub use traits::{DeskLink, DisconnectObserver, GattService, IdentityStream, RadioPlatform};

// Cancels a discovery session.
pub use tokio_util::sync::CancellationToken;
