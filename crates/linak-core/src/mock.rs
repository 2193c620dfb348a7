//! Mock radio platform for testing.
//!
//! [`MockPlatform`] implements [`RadioPlatform`] without Bluetooth hardware.
//! It replays a scripted list of advertisements, serves characteristic values
//! from memory, and counts connects, disconnects, running scans and
//! registered disconnect observers so tests can check resource cleanup.
//!
//! # Features
//!
//! - **Scripted discovery**: advertisements arrive at fixed offsets from scan start
//! - **Failure injection**: missing services, failing reads, hanging connects,
//!   failing or hanging service discovery
//! - **Link loss**: drop the link in the middle of a read

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::time::Instant;
use uuid::Uuid;

use linak_types::uuids::{CONTROL_CHAR, CONTROL_SERVICE, POSITION_CHAR, POSITION_SERVICE};

use crate::error::{Error, Result};
use crate::traits::{DeskLink, DisconnectObserver, GattService, IdentityStream, RadioPlatform};
use crate::util::{Guarded, identities_match};

type ServiceTable = HashMap<Uuid, HashMap<Uuid, Vec<u8>>>;

struct MockState {
    advertisements: Mutex<Vec<(Duration, String)>>,
    services: Mutex<ServiceTable>,
    writes: Mutex<Vec<(Uuid, Vec<u8>)>>,
    read_error: Mutex<Option<String>>,
    connect_hangs: AtomicBool,
    discover_fails: AtomicBool,
    discover_hangs: AtomicBool,
    drop_link_on_read: AtomicBool,
    read_latency_ms: AtomicU32,
    connect_count: AtomicU32,
    disconnect_count: AtomicU32,
    read_count: AtomicU32,
    scan_count: AtomicU32,
    active_scans: AtomicUsize,
    active_observers: AtomicUsize,
    link_events: broadcast::Sender<()>,
}

/// A mock radio platform.
///
/// Cloning shares the underlying state, so a test can keep a handle for
/// assertions after moving a clone into a [`crate::Desk`].
///
/// # Example
///
/// ```
/// use linak_core::mock::MockPlatform;
///
/// let platform = MockPlatform::builder()
///     .advertise_at(1, "E1:AA:BB:CC:DD:EE")
///     .position(3815)
///     .build();
/// assert_eq!(platform.connect_count(), 0);
/// ```
#[derive(Clone)]
pub struct MockPlatform {
    state: Arc<MockState>,
}

impl std::fmt::Debug for MockPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPlatform")
            .field("connects", &self.connect_count())
            .field("disconnects", &self.disconnect_count())
            .field("active_scans", &self.active_scans())
            .field("active_observers", &self.active_observers())
            .finish()
    }
}

impl MockPlatform {
    /// Create a builder.
    pub fn builder() -> MockPlatformBuilder {
        MockPlatformBuilder::default()
    }

    /// Number of successful `connect` calls.
    pub fn connect_count(&self) -> u32 {
        self.state.connect_count.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls.
    pub fn disconnect_count(&self) -> u32 {
        self.state.disconnect_count.load(Ordering::SeqCst)
    }

    /// Number of characteristic reads attempted.
    pub fn read_count(&self) -> u32 {
        self.state.read_count.load(Ordering::SeqCst)
    }

    /// Number of scans started.
    pub fn scan_count(&self) -> u32 {
        self.state.scan_count.load(Ordering::SeqCst)
    }

    /// Number of scans whose stream is still alive.
    pub fn active_scans(&self) -> usize {
        self.state.active_scans.load(Ordering::SeqCst)
    }

    /// Number of disconnect observers still registered.
    pub fn active_observers(&self) -> usize {
        self.state.active_observers.load(Ordering::SeqCst)
    }

    /// Values written so far, in order.
    pub fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        lock(&self.state.writes).clone()
    }

    /// Change the raw position served by the position characteristic.
    pub fn set_position(&self, raw: u16) {
        lock(&self.state.services)
            .entry(POSITION_SERVICE)
            .or_default()
            .insert(POSITION_CHAR, raw.to_le_bytes().to_vec());
    }

    /// Make the desk drop the link now.
    pub fn trigger_disconnect(&self) {
        let _ = self.state.link_events.send(());
    }
}

/// Builder for [`MockPlatform`].
#[derive(Debug, Default)]
pub struct MockPlatformBuilder {
    advertisements: Vec<(Duration, String)>,
    services: ServiceTable,
    read_error: Option<String>,
    connect_hangs: bool,
    discover_fails: bool,
    discover_hangs: bool,
    drop_link_on_read: bool,
    read_latency_ms: u32,
}

impl MockPlatformBuilder {
    /// Advertise `identity` `secs` seconds after a scan starts.
    #[must_use]
    pub fn advertise_at(self, secs: u64, identity: &str) -> Self {
        self.advertise_after(Duration::from_secs(secs), identity)
    }

    /// Advertise `identity` `delay` after a scan starts.
    #[must_use]
    pub fn advertise_after(mut self, delay: Duration, identity: &str) -> Self {
        self.advertisements.push((delay, identity.to_string()));
        self
    }

    /// Expose the control service and a position service serving `raw`.
    #[must_use]
    pub fn position(mut self, raw: u16) -> Self {
        self = self.service(CONTROL_SERVICE, CONTROL_CHAR, vec![0x00]);
        self.service(POSITION_SERVICE, POSITION_CHAR, raw.to_le_bytes().to_vec())
    }

    /// Expose a characteristic with a fixed value.
    #[must_use]
    pub fn service(mut self, service: Uuid, characteristic: Uuid, value: Vec<u8>) -> Self {
        self.services
            .entry(service)
            .or_default()
            .insert(characteristic, value);
        self
    }

    /// Make every read fail with this message.
    #[must_use]
    pub fn read_error(mut self, message: &str) -> Self {
        self.read_error = Some(message.to_string());
        self
    }

    /// Make `connect` never complete.
    #[must_use]
    pub fn connect_hangs(mut self) -> Self {
        self.connect_hangs = true;
        self
    }

    /// Connect, then fail service discovery.
    #[must_use]
    pub fn discover_fails(mut self) -> Self {
        self.discover_fails = true;
        self
    }

    /// Connect, then never finish service discovery.
    #[must_use]
    pub fn discover_hangs(mut self) -> Self {
        self.discover_hangs = true;
        self
    }

    /// Drop the link during the first read; the read itself never completes.
    #[must_use]
    pub fn drop_link_on_read(mut self) -> Self {
        self.drop_link_on_read = true;
        self
    }

    /// Add latency to every read.
    #[must_use]
    pub fn read_latency_ms(mut self, ms: u32) -> Self {
        self.read_latency_ms = ms;
        self
    }

    /// Build the platform.
    pub fn build(self) -> MockPlatform {
        let (link_events, _) = broadcast::channel(8);
        let mut advertisements = self.advertisements;
        advertisements.sort_by_key(|(delay, _)| *delay);

        MockPlatform {
            state: Arc::new(MockState {
                advertisements: Mutex::new(advertisements),
                services: Mutex::new(self.services),
                writes: Mutex::new(Vec::new()),
                read_error: Mutex::new(self.read_error),
                connect_hangs: AtomicBool::new(self.connect_hangs),
                discover_fails: AtomicBool::new(self.discover_fails),
                discover_hangs: AtomicBool::new(self.discover_hangs),
                drop_link_on_read: AtomicBool::new(self.drop_link_on_read),
                read_latency_ms: AtomicU32::new(self.read_latency_ms),
                connect_count: AtomicU32::new(0),
                disconnect_count: AtomicU32::new(0),
                read_count: AtomicU32::new(0),
                scan_count: AtomicU32::new(0),
                active_scans: AtomicUsize::new(0),
                active_observers: AtomicUsize::new(0),
                link_events,
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Decrements a counter when dropped.
struct CountGuard {
    state: Arc<MockState>,
    counter: fn(&MockState) -> &AtomicUsize,
}

impl CountGuard {
    fn register(state: &Arc<MockState>, counter: fn(&MockState) -> &AtomicUsize) -> Self {
        counter(state).fetch_add(1, Ordering::SeqCst);
        Self {
            state: Arc::clone(state),
            counter,
        }
    }
}

impl Drop for CountGuard {
    fn drop(&mut self) {
        (self.counter)(&self.state).fetch_sub(1, Ordering::SeqCst);
    }
}

/// Counts a disconnect when dropped unless handed over.
struct PendingLink {
    state: Arc<MockState>,
    armed: bool,
}

impl PendingLink {
    fn into_inner(mut self) -> Arc<MockState> {
        self.armed = false;
        Arc::clone(&self.state)
    }
}

impl Drop for PendingLink {
    fn drop(&mut self) {
        if self.armed {
            self.state.disconnect_count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl RadioPlatform for MockPlatform {
    type Link = MockLink;

    async fn scan(&self) -> Result<IdentityStream> {
        self.state.scan_count.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        let script = lock(&self.state.advertisements).clone();

        let replay = futures::stream::iter(script)
            .then(move |(delay, identity)| async move {
                tokio::time::sleep_until(started + delay).await;
                identity
            })
            .chain(futures::stream::pending())
            .boxed();

        let guard = CountGuard::register(&self.state, |s| &s.active_scans);
        Ok(Box::pin(Guarded::new(replay, guard)))
    }

    async fn connect(&self, identity: &str) -> Result<MockLink> {
        if self.state.connect_hangs.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }

        let known = lock(&self.state.advertisements)
            .iter()
            .any(|(_, id)| identities_match(id, identity));
        if !known {
            return Err(Error::device_not_found(identity));
        }

        self.state.connect_count.fetch_add(1, Ordering::SeqCst);
        let pending = PendingLink {
            state: Arc::clone(&self.state),
            armed: true,
        };

        if self.state.discover_hangs.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        if self.state.discover_fails.load(Ordering::SeqCst) {
            return Err(Error::Bluetooth(btleplug::Error::Other(
                "service discovery failed".into(),
            )));
        }

        Ok(MockLink {
            state: pending.into_inner(),
            identity: identity.to_string(),
        })
    }
}

/// A mock link produced by [`MockPlatform`].
pub struct MockLink {
    state: Arc<MockState>,
    identity: String,
}

impl std::fmt::Debug for MockLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLink")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DeskLink for MockLink {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn resolve_service(&self, uuid: Uuid) -> Result<GattService> {
        lock(&self.state.services)
            .get(&uuid)
            .map(|chars| GattService::new(uuid, chars.keys().copied().collect()))
            .ok_or_else(|| Error::service_not_found(uuid))
    }

    async fn read(&self, service: &GattService, characteristic: Uuid) -> Result<Vec<u8>> {
        self.state.read_count.fetch_add(1, Ordering::SeqCst);

        let latency = self.state.read_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(u64::from(latency))).await;
        }

        if self.state.drop_link_on_read.swap(false, Ordering::SeqCst) {
            let _ = self.state.link_events.send(());
            futures::future::pending::<()>().await;
        }

        if let Some(message) = lock(&self.state.read_error).clone() {
            return Err(Error::InvalidData(message));
        }

        lock(&self.state.services)
            .get(&service.uuid)
            .and_then(|chars| chars.get(&characteristic))
            .cloned()
            .ok_or_else(|| Error::characteristic_not_found(characteristic, service.uuid))
    }

    async fn write(
        &self,
        service: &GattService,
        characteristic: Uuid,
        data: &[u8],
    ) -> Result<()> {
        if !service.has_characteristic(characteristic) {
            return Err(Error::characteristic_not_found(characteristic, service.uuid));
        }
        lock(&self.state.writes).push((characteristic, data.to_vec()));
        Ok(())
    }

    async fn disconnect_observer(&self) -> Result<DisconnectObserver> {
        let receiver = self.state.link_events.subscribe();
        let events = futures::stream::unfold(receiver, |mut receiver| async move {
            match receiver.recv().await {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => Some(((), receiver)),
                Err(broadcast::error::RecvError::Closed) => None,
            }
        })
        .boxed();

        let guard = CountGuard::register(&self.state, |s| &s.active_observers);
        Ok(Box::pin(Guarded::new(events, guard)))
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.disconnect_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
