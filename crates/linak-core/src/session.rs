//! Connection sessions.
//!
//! [`with_connection`] finds the configured desk, connects, runs one action
//! against the open link and disconnects again. While the action runs, a
//! disconnect observer is registered; if the desk drops the link the action
//! is abandoned and the session returns [`Error::LinkLost`].
//!
//! # Example
//!
//! ```no_run
//! use linak_core::session::{ConnectionConfig, with_connection};
//! use linak_core::telemetry::read_raw_position;
//! use linak_core::BtlePlatform;
//!
//! # async fn example() -> linak_core::Result<()> {
//! let platform = BtlePlatform::new().await?;
//! let config = ConnectionConfig::default();
//! let raw = with_connection(&platform, Some("E1:AA:BB:CC:DD:EE"), &config, |session| {
//!     Box::pin(read_raw_position(session))
//! })
//! .await?;
//! println!("raw position: {}", raw.value());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use futures::future::BoxFuture;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use linak_types::uuids::CONTROL_SERVICE;

use crate::error::{DeviceNotFoundReason, Error, Result, Setting};
use crate::traits::{DeskLink, GattService, RadioPlatform};
use crate::util::identities_match;

/// Default time allowed for the target desk to show up in a scan.
const DEFAULT_FIND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for establishing the link, including service discovery.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for a single attribute read or write.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeouts applied by [`with_connection`].
///
/// ```
/// use std::time::Duration;
/// use linak_core::ConnectionConfig;
///
/// let config = ConnectionConfig::default()
///     .find_timeout(Duration::from_secs(20))
///     .read_timeout(Duration::from_secs(5));
/// assert_eq!(config.connection_timeout, Duration::from_secs(15));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// How long to scan for the target desk.
    pub find_timeout: Duration,
    /// Timeout for connecting and discovering services.
    pub connection_timeout: Duration,
    /// Timeout for each attribute read or write.
    pub read_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            find_timeout: DEFAULT_FIND_TIMEOUT,
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan timeout used to find the desk.
    #[must_use]
    pub fn find_timeout(mut self, timeout: Duration) -> Self {
        self.find_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the per-operation read/write timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// An open session handed to a [`with_connection`] action.
///
/// Holds the link and the resolved primary control service. Every read and
/// write goes through the configured read timeout.
pub struct Session<'a, L> {
    link: &'a L,
    primary: GattService,
    config: &'a ConnectionConfig,
}

impl<L> std::fmt::Debug for Session<'_, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("primary", &self.primary.uuid)
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl<'a, L: DeskLink> Session<'a, L> {
    /// Identity of the connected desk.
    pub fn identity(&self) -> &str {
        self.link.identity()
    }

    /// The underlying link.
    pub fn link(&self) -> &'a L {
        self.link
    }

    /// The primary control service.
    pub fn primary_service(&self) -> &GattService {
        &self.primary
    }

    /// Resolve another service on the desk.
    pub async fn service(&self, uuid: Uuid) -> Result<GattService> {
        bounded(
            self.config.read_timeout,
            "resolve service",
            self.link.resolve_service(uuid),
        )
        .await
    }

    /// Read a characteristic.
    pub async fn read(&self, service: &GattService, characteristic: Uuid) -> Result<Vec<u8>> {
        bounded(
            self.config.read_timeout,
            "read characteristic",
            self.link.read(service, characteristic),
        )
        .await
    }

    /// Write a characteristic.
    pub async fn write(
        &self,
        service: &GattService,
        characteristic: Uuid,
        data: &[u8],
    ) -> Result<()> {
        bounded(
            self.config.read_timeout,
            "write characteristic",
            self.link.write(service, characteristic, data),
        )
        .await
    }
}

async fn bounded<T>(
    duration: Duration,
    operation: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    timeout(duration, fut)
        .await
        .map_err(|_| Error::timeout(operation, duration))?
}

/// Connect to a desk, run `action`, and disconnect.
///
/// `device_id` is the stored desk identity; `None` or an empty string fails
/// with [`Error::NotConfigured`] before any radio activity.
///
/// The session:
///
/// 1. scans until a device with a matching identity advertises
///    ([`ConnectionConfig::find_timeout`]), then stops the scan;
/// 2. connects ([`ConnectionConfig::connection_timeout`]);
/// 3. registers a disconnect observer and resolves the control service;
/// 4. runs `action`;
/// 5. unregisters the observer and calls [`DeskLink::disconnect`] exactly once.
///
/// Step 5 runs whether the action succeeds, fails, or the link drops. A link
/// drop while steps 3 or 4 are in progress abandons the action and returns
/// [`Error::LinkLost`].
#[tracing::instrument(level = "info", skip_all, fields(device_id = device_id.unwrap_or_default()))]
pub async fn with_connection<P, T, F>(
    platform: &P,
    device_id: Option<&str>,
    config: &ConnectionConfig,
    action: F,
) -> Result<T>
where
    P: RadioPlatform,
    T: Send,
    F: for<'s> FnOnce(&'s Session<'s, P::Link>) -> BoxFuture<'s, Result<T>> + Send,
{
    let identity = device_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::not_configured(vec![Setting::DeviceId]))?;

    let target = find_device(platform, identity, config.find_timeout).await?;

    info!("Connecting to {}", target);
    let link = timeout(config.connection_timeout, platform.connect(&target))
        .await
        .map_err(|_| Error::timeout("connect to device", config.connection_timeout))??;

    let result = run_session(&link, config, action).await;

    if let Err(e) = link.disconnect().await {
        match &result {
            Err(Error::LinkLost { .. }) => debug!("Disconnect after link loss failed: {}", e),
            _ => warn!("Failed to disconnect from {}: {}", target, e),
        }
    }

    result
}

/// Scan until `identity` advertises or `find_timeout` elapses.
async fn find_device<P: RadioPlatform>(
    platform: &P,
    identity: &str,
    find_timeout: Duration,
) -> Result<String> {
    let mut scan = platform.scan().await?;
    debug!("Scanning for {}", identity);

    let found = timeout(find_timeout, async {
        while let Some(candidate) = scan.next().await {
            if identities_match(&candidate, identity) {
                return Some(candidate);
            }
        }
        None
    })
    .await;
    drop(scan);

    match found {
        Ok(Some(candidate)) => {
            debug!("Found {}", candidate);
            Ok(candidate)
        }
        Ok(None) => Err(Error::device_not_found(identity)),
        Err(_) => Err(Error::DeviceNotFound(DeviceNotFoundReason::ScanTimeout {
            identifier: identity.to_string(),
            duration: find_timeout,
        })),
    }
}

async fn run_session<L, T, F>(link: &L, config: &ConnectionConfig, action: F) -> Result<T>
where
    L: DeskLink,
    F: for<'s> FnOnce(&'s Session<'s, L>) -> BoxFuture<'s, Result<T>>,
{
    let mut observer = link.disconnect_observer().await?;

    let work = async {
        let primary = bounded(
            config.read_timeout,
            "resolve control service",
            link.resolve_service(CONTROL_SERVICE),
        )
        .await?;
        let session = Session {
            link,
            primary,
            config,
        };
        action(&session).await
    };

    tokio::select! {
        biased;
        Some(()) = observer.next() => {
            warn!("Device {} disconnected during the session", link.identity());
            Err(Error::LinkLost {
                device_id: link.identity().to_string(),
            })
        }
        result = work => result,
    }
}
