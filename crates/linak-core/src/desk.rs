//! High-level desk operations.
//!
//! [`Desk`] ties a radio platform and a settings store together and exposes
//! one method per operator command.

use serde_json::{Map, Value};
use tracing::info;

use linak_types::{Millimeters, PositionReading, Preset};

use crate::discovery::{DiscoveredDevices, ScanOptions, discover_with_progress};
use crate::error::Result;
use crate::presets::{PresetChange, PresetRegistry, validate_name};
use crate::session::ConnectionConfig;
use crate::store::{ConfigStore, DeskSettings};
use crate::telemetry::read_current_position;
use crate::traits::RadioPlatform;

/// A desk reachable through `P`, with settings kept in `S`.
///
/// # Example
///
/// ```
/// use linak_core::mock::MockPlatform;
/// use linak_core::{Desk, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> linak_core::Result<()> {
/// let platform = MockPlatform::builder()
///     .advertise_at(0, "E1:AA:BB:CC:DD:EE")
///     .position(3815)
///     .build();
/// let desk = Desk::new(platform, MemoryStore::new());
///
/// desk.set_device_id("E1:AA:BB:CC:DD:EE")?;
/// desk.set_calibration(620)?;
/// assert_eq!(desk.read_position().await?.height_mm, 1001);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Desk<P, S> {
    platform: P,
    store: S,
    config: ConnectionConfig,
}

impl<P: RadioPlatform, S: ConfigStore> Desk<P, S> {
    /// Create a desk with default connection timeouts.
    pub fn new(platform: P, store: S) -> Self {
        Self {
            platform,
            store,
            config: ConnectionConfig::default(),
        }
    }

    /// Replace the connection timeouts.
    #[must_use]
    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// The radio platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The settings store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The connection timeouts.
    pub fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Typed settings.
    pub fn settings(&self) -> DeskSettings<'_, S> {
        DeskSettings::new(&self.store)
    }

    /// The preset registry.
    pub fn presets(&self) -> PresetRegistry<'_, S> {
        PresetRegistry::new(&self.store)
    }

    /// Discover nearby devices.
    pub async fn scan(&self, options: &ScanOptions) -> Result<DiscoveredDevices> {
        self.scan_with_progress(options, |_, _| {}).await
    }

    /// Discover nearby devices, reporting each one as it appears.
    pub async fn scan_with_progress<F>(
        &self,
        options: &ScanOptions,
        on_found: F,
    ) -> Result<DiscoveredDevices>
    where
        F: FnMut(usize, &str),
    {
        discover_with_progress(&self.platform, options, on_found).await
    }

    /// Resolve the operator's selection and store it as the desk identity.
    ///
    /// Nothing is stored if the selection is invalid.
    pub fn select_and_save(&self, devices: &DiscoveredDevices, input: &str) -> Result<String> {
        let identity = devices.select(input)?.to_string();
        self.settings().set_device_id(&identity)?;
        info!("Selected device {}", identity);
        Ok(identity)
    }

    /// Store the desk's lowest height.
    pub fn set_calibration(&self, lowest_pos_mm: Millimeters) -> Result<()> {
        self.settings().set_lowest_pos_mm(lowest_pos_mm)
    }

    /// Store the desk identity.
    pub fn set_device_id(&self, device_id: &str) -> Result<()> {
        self.settings().set_device_id(device_id)
    }

    /// The whole settings document.
    pub fn settings_snapshot(&self) -> Result<Map<String, Value>> {
        self.settings().snapshot()
    }

    /// Connect, read the current height, and disconnect.
    ///
    /// Fails with [`crate::Error::NotConfigured`] before any radio activity if the
    /// identity or calibration is missing.
    pub async fn read_position(&self) -> Result<PositionReading> {
        let (device_id, calibration) = self.settings().require()?;
        read_current_position(&self.platform, Some(&device_id), calibration, &self.config).await
    }

    /// All presets, sorted by name.
    pub fn list_presets(&self) -> Result<Vec<Preset>> {
        self.presets().list()
    }

    /// Save a preset.
    ///
    /// Without `height_mm` the desk's current height is read first.
    pub async fn save_preset(
        &self,
        name: &str,
        height_mm: Option<Millimeters>,
    ) -> Result<PresetChange> {
        validate_name(name)?;

        let height_mm = match height_mm {
            Some(height) => height,
            None => self.read_position().await?.height_mm,
        };
        self.presets().save(name, height_mm)
    }

    /// Delete a preset.
    pub fn delete_preset(&self, name: &str) -> Result<PresetChange> {
        self.presets().delete(name)
    }
}
