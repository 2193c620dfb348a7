//! Device discovery.
//!
//! A discovery session runs an accept-all scan for a fixed window and yields
//! each device identity once, in first-seen order. The session is a
//! [`DiscoveryStream`]: it ends when the window closes or when its
//! [`CancellationToken`] fires, and the underlying scan stops when the stream
//! is dropped.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{BoxStream, Fuse};
use futures::{Stream, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::traits::{IdentityStream, RadioPlatform};
use crate::util::identities_match;

/// Default length of the scan window.
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(10);

/// Options for a discovery session.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to record discoveries.
    pub duration: Duration,
    /// Token that ends the session early.
    pub cancel: CancellationToken,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: DEFAULT_SCAN_DURATION,
            cancel: CancellationToken::new(),
        }
    }
}

impl ScanOptions {
    /// Create scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan window.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the scan window in seconds.
    #[must_use]
    pub fn duration_secs(self, secs: u64) -> Self {
        self.duration(Duration::from_secs(secs))
    }

    /// Use an existing cancellation token.
    #[must_use]
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

struct DiscoveryState {
    events: IdentityStream,
    seen: DiscoveredDevices,
    deadline: Instant,
    cancel: CancellationToken,
}

/// A finite stream of distinct device identities.
pub struct DiscoveryStream {
    inner: Fuse<BoxStream<'static, String>>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for DiscoveryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryStream")
            .field("terminated", &self.inner.is_done())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl DiscoveryStream {
    /// Wrap a raw scan in a discovery window.
    ///
    /// Events are recorded until `duration` has elapsed or `cancel` fires.
    /// When both the deadline and an event are ready at the same time the
    /// event is dropped.
    pub fn new(events: IdentityStream, duration: Duration, cancel: CancellationToken) -> Self {
        let state = DiscoveryState {
            events,
            seen: DiscoveredDevices::new(),
            deadline: Instant::now() + duration,
            cancel: cancel.clone(),
        };

        let inner = futures::stream::unfold(state, |mut state| async move {
            loop {
                tokio::select! {
                    biased;
                    _ = tokio::time::sleep_until(state.deadline) => {
                        debug!("Scan window closed with {} device(s)", state.seen.len());
                        return None;
                    }
                    _ = state.cancel.cancelled() => {
                        debug!("Discovery cancelled with {} device(s)", state.seen.len());
                        return None;
                    }
                    event = state.events.next() => {
                        let identity = event?;
                        if state.seen.push(identity.clone()) {
                            debug!("Discovered {}", identity);
                            return Some((identity, state));
                        }
                    }
                }
            }
        })
        .boxed()
        .fuse();

        Self { inner, cancel }
    }

    /// Token that ends this session early.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain the stream into a device list.
    pub async fn collect_devices(self) -> DiscoveredDevices {
        let mut devices = DiscoveredDevices::new();
        let mut stream = self;
        while let Some(identity) = stream.next().await {
            devices.push(identity);
        }
        devices
    }
}

impl Stream for DiscoveryStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.inner.poll_next_unpin(cx)
    }
}

/// Identities collected in one discovery session, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredDevices {
    identities: Vec<String>,
}

impl DiscoveredDevices {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an identity unless the exact same identity is already present.
    ///
    /// Returns `true` if the identity was added.
    pub fn push(&mut self, identity: String) -> bool {
        if self.identities.contains(&identity) {
            return false;
        }
        self.identities.push(identity);
        true
    }

    /// Check whether an operator-supplied identity has been seen.
    ///
    /// Letter case and the `-`/`:` separator are ignored.
    pub fn contains(&self, identity: &str) -> bool {
        self.identities
            .iter()
            .any(|known| identities_match(known, identity))
    }

    /// Number of distinct identities.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Whether nothing was discovered.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Iterate in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(String::as_str)
    }

    /// Resolve an operator's 1-based selection.
    ///
    /// `0`, anything above [`len`](Self::len), and non-numeric input are
    /// rejected with [`Error::InvalidSelection`].
    ///
    /// ```
    /// use linak_core::DiscoveredDevices;
    ///
    /// let mut devices = DiscoveredDevices::new();
    /// devices.push("AA".to_string());
    /// devices.push("BB".to_string());
    /// assert_eq!(devices.select("2").unwrap(), "BB");
    /// assert!(devices.select("0").is_err());
    /// ```
    pub fn select(&self, input: &str) -> Result<&str> {
        let input = input.trim();
        input
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| self.identities.get(index))
            .map(String::as_str)
            .ok_or_else(|| Error::InvalidSelection {
                input: input.to_string(),
                count: self.len(),
            })
    }
}

impl IntoIterator for DiscoveredDevices {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.identities.into_iter()
    }
}

/// Start a discovery session.
pub async fn start_discovery<P: RadioPlatform>(
    platform: &P,
    options: &ScanOptions,
) -> Result<DiscoveryStream> {
    let events = platform.scan().await?;
    info!("Scanning for {:?}", options.duration);
    Ok(DiscoveryStream::new(
        events,
        options.duration,
        options.cancel.clone(),
    ))
}

/// Run a discovery session to completion.
pub async fn discover<P: RadioPlatform>(
    platform: &P,
    options: &ScanOptions,
) -> Result<DiscoveredDevices> {
    discover_with_progress(platform, options, |_, _| {}).await
}

/// Run a discovery session, reporting each new identity as it arrives.
///
/// `on_found` receives the 1-based position and the identity.
pub async fn discover_with_progress<P, F>(
    platform: &P,
    options: &ScanOptions,
    mut on_found: F,
) -> Result<DiscoveredDevices>
where
    P: RadioPlatform,
    F: FnMut(usize, &str),
{
    let mut stream = start_discovery(platform, options).await?;
    let mut devices = DiscoveredDevices::new();

    while let Some(identity) = stream.next().await {
        if devices.push(identity.clone()) {
            on_found(devices.len(), &identity);
        }
    }

    info!("Discovery finished: {} device(s)", devices.len());
    Ok(devices)
}
