//! Trait abstractions over the radio platform.
//!
//! [`RadioPlatform`] and [`DeskLink`] separate the session protocol from the
//! Bluetooth stack. [`crate::ble::BtlePlatform`] implements them on top of
//! btleplug; [`crate::mock::MockPlatform`] implements them in memory for tests.

use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::error::Result;

/// Stream of device identities reported by a running scan.
///
/// An identity may appear many times (once per advertisement). The scan
/// stops when the stream is dropped.
pub type IdentityStream = BoxStream<'static, String>;

/// Stream that yields once each time the link drops.
///
/// The observer is registered while the stream is alive and unregistered
/// when it is dropped.
pub type DisconnectObserver = BoxStream<'static, ()>;

/// A GATT service resolved on a connected desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattService {
    /// Service UUID.
    pub uuid: Uuid,
    /// UUIDs of the characteristics the service exposes.
    pub characteristics: Vec<Uuid>,
}

impl GattService {
    /// Create a service description.
    pub fn new(uuid: Uuid, characteristics: Vec<Uuid>) -> Self {
        Self {
            uuid,
            characteristics,
        }
    }

    /// Check whether the service exposes a characteristic.
    pub fn has_characteristic(&self, uuid: Uuid) -> bool {
        self.characteristics.contains(&uuid)
    }
}

/// Discovery and connection capability of a Bluetooth stack.
#[async_trait]
pub trait RadioPlatform: Send + Sync {
    /// Connected link type produced by [`connect`](Self::connect).
    type Link: DeskLink;

    /// Start an accept-all scan.
    async fn scan(&self) -> Result<IdentityStream>;

    /// Connect to a device previously seen by [`scan`](Self::scan).
    ///
    /// Returns once the link is up and its services are known. If this fails
    /// after the radio connected, or the future is dropped part way, the
    /// implementation disconnects on its own.
    async fn connect(&self, identity: &str) -> Result<Self::Link>;
}

/// An open GATT connection to a desk.
#[async_trait]
pub trait DeskLink: Send + Sync {
    /// Identity of the connected desk.
    fn identity(&self) -> &str;

    /// Look up a primary service.
    async fn resolve_service(&self, uuid: Uuid) -> Result<GattService>;

    /// Read a characteristic value.
    async fn read(&self, service: &GattService, characteristic: Uuid) -> Result<Vec<u8>>;

    /// Write a characteristic value (with response).
    async fn write(&self, service: &GattService, characteristic: Uuid, data: &[u8])
    -> Result<()>;

    /// Register a disconnect observer.
    async fn disconnect_observer(&self) -> Result<DisconnectObserver>;

    /// Close the link.
    async fn disconnect(&self) -> Result<()>;
}
