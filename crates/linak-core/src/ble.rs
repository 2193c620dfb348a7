//! btleplug implementation of the radio platform.
//!
//! Device identities are Bluetooth addresses on Linux and Windows and
//! CoreBluetooth UUIDs on macOS (see [`create_identifier`]).

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::traits::{DeskLink, DisconnectObserver, GattService, IdentityStream, RadioPlatform};
use crate::util::{Guarded, create_identifier, format_peripheral_id, identities_match};

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter))
}

/// Radio platform backed by the first local Bluetooth adapter.
#[derive(Clone)]
pub struct BtlePlatform {
    adapter: Adapter,
}

impl std::fmt::Debug for BtlePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BtlePlatform").finish_non_exhaustive()
    }
}

impl BtlePlatform {
    /// Open the first available adapter.
    pub async fn new() -> Result<Self> {
        Ok(Self::with_adapter(get_adapter().await?))
    }

    /// Use a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Search the adapter's known peripherals for an identity.
    async fn find_peripheral(&self, identity: &str) -> Result<Option<Peripheral>> {
        for peripheral in self.adapter.peripherals().await? {
            let candidate = peripheral_identity(&peripheral);
            if identities_match(&candidate, identity) {
                debug!("Matched peripheral {}", candidate);
                return Ok(Some(peripheral));
            }
        }
        Ok(None)
    }
}

fn peripheral_identity(peripheral: &Peripheral) -> String {
    create_identifier(&peripheral.address().to_string(), &peripheral.id())
}

async fn identity_for(adapter: &Adapter, id: &PeripheralId) -> Option<String> {
    match adapter.peripheral(id).await {
        Ok(peripheral) => Some(peripheral_identity(&peripheral)),
        Err(e) => {
            debug!("Could not resolve peripheral {}: {}", format_peripheral_id(id), e);
            None
        }
    }
}

/// Stops the adapter scan when dropped.
struct ScanGuard {
    adapter: Adapter,
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        let adapter = self.adapter.clone();
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = adapter.stop_scan().await {
                    debug!("Failed to stop scan: {}", e);
                }
            });
        } else {
            warn!("No tokio runtime available to stop the BLE scan");
        }
    }
}

/// A connected peripheral that is not yet a [`BtleLink`].
///
/// Dropping it disconnects the peripheral.
struct PendingLink {
    peripheral: Peripheral,
    armed: bool,
}

impl PendingLink {
    fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            armed: true,
        }
    }

    /// Hand the peripheral over without disconnecting it.
    fn into_inner(mut self) -> Peripheral {
        self.armed = false;
        self.peripheral.clone()
    }

    /// Disconnect now instead of on drop.
    async fn release(mut self) {
        self.armed = false;
        if let Err(e) = self.peripheral.disconnect().await {
            debug!("Disconnect after failed service discovery failed: {}", e);
        }
    }
}

impl Drop for PendingLink {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let peripheral = self.peripheral.clone();
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = peripheral.disconnect().await {
                    debug!("Failed to disconnect abandoned connection: {}", e);
                }
            });
        } else {
            warn!("No tokio runtime available to disconnect abandoned connection");
        }
    }
}

#[async_trait]
impl RadioPlatform for BtlePlatform {
    type Link = BtleLink;

    async fn scan(&self) -> Result<IdentityStream> {
        let events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;
        info!("BLE scan started");

        let adapter = self.adapter.clone();
        let identities = events
            .filter_map(move |event| {
                let adapter = adapter.clone();
                async move {
                    match event {
                        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                            identity_for(&adapter, &id).await
                        }
                        _ => None,
                    }
                }
            })
            .boxed();

        let guard = ScanGuard {
            adapter: self.adapter.clone(),
        };
        Ok(Box::pin(Guarded::new(identities, guard)))
    }

    async fn connect(&self, identity: &str) -> Result<BtleLink> {
        if let Err(e) = self.adapter.stop_scan().await {
            debug!("stop_scan before connect failed: {}", e);
        }

        let peripheral = self
            .find_peripheral(identity)
            .await?
            .ok_or_else(|| Error::device_not_found(identity))?;

        info!("Connecting to device...");
        peripheral.connect().await?;
        info!("Connected!");

        // Disconnects if discovery fails or this future is dropped by a timeout.
        let pending = PendingLink::new(peripheral);

        info!("Discovering services...");
        if let Err(e) = pending.peripheral.discover_services().await {
            pending.release().await;
            return Err(e.into());
        }
        let peripheral = pending.into_inner();
        debug!("Found {} services", peripheral.services().len());

        Ok(BtleLink {
            adapter: self.adapter.clone(),
            identity: peripheral_identity(&peripheral),
            peripheral,
        })
    }
}

/// A connected desk over btleplug.
pub struct BtleLink {
    adapter: Adapter,
    peripheral: Peripheral,
    identity: String,
}

impl std::fmt::Debug for BtleLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BtleLink")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl BtleLink {
    fn find_characteristic(&self, service: &GattService, uuid: Uuid) -> Result<Characteristic> {
        self.peripheral
            .services()
            .into_iter()
            .filter(|s| s.uuid == service.uuid)
            .flat_map(|s| s.characteristics.into_iter())
            .find(|c| c.uuid == uuid)
            .ok_or_else(|| Error::characteristic_not_found(uuid, service.uuid))
    }
}

#[async_trait]
impl DeskLink for BtleLink {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn resolve_service(&self, uuid: Uuid) -> Result<GattService> {
        self.peripheral
            .services()
            .into_iter()
            .find(|s| s.uuid == uuid)
            .map(|s| {
                GattService::new(
                    s.uuid,
                    s.characteristics.iter().map(|c| c.uuid).collect(),
                )
            })
            .ok_or_else(|| Error::service_not_found(uuid))
    }

    async fn read(&self, service: &GattService, characteristic: Uuid) -> Result<Vec<u8>> {
        let characteristic = self.find_characteristic(service, characteristic)?;
        Ok(self.peripheral.read(&characteristic).await?)
    }

    async fn write(
        &self,
        service: &GattService,
        characteristic: Uuid,
        data: &[u8],
    ) -> Result<()> {
        let characteristic = self.find_characteristic(service, characteristic)?;
        self.peripheral
            .write(&characteristic, data, WriteType::WithResponse)
            .await?;
        Ok(())
    }

    async fn disconnect_observer(&self) -> Result<DisconnectObserver> {
        let events = self.adapter.events().await?;
        let target = self.peripheral.id();

        Ok(events
            .filter_map(move |event| {
                let lost = matches!(&event, CentralEvent::DeviceDisconnected(id) if *id == target);
                async move { lost.then_some(()) }
            })
            .boxed())
    }

    async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from device...");
        self.peripheral.disconnect().await?;
        Ok(())
    }
}
