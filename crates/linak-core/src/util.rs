//! Utility functions for linak-core.

use std::pin::Pin;
use std::task::{Context, Poll};

use btleplug::platform::PeripheralId;
use futures::Stream;
use futures::stream::BoxStream;

/// Format a peripheral ID as a string.
///
/// On macOS, peripheral IDs are UUIDs. On other platforms, they may be
/// MAC addresses or other formats.
pub fn format_peripheral_id(id: &PeripheralId) -> String {
    format!("{:?}", id)
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
        .to_string()
}

/// Create an identity string from an address and peripheral ID.
///
/// On macOS where addresses are 00:00:00:00:00:00, uses the peripheral ID.
/// On other platforms, uses the Bluetooth address.
pub fn create_identifier(address: &str, peripheral_id: &PeripheralId) -> String {
    if is_zero_address(address) {
        format_peripheral_id(peripheral_id)
    } else {
        address.to_string()
    }
}

fn is_zero_address(address: &str) -> bool {
    address == "00:00:00:00:00:00"
}

/// Compare two device identities.
///
/// Case-insensitive; `:` and `-` separators are interchangeable so that
/// `E1-AA-BB-CC-DD-EE` matches `e1:aa:bb:cc:dd:ee`.
pub fn identities_match(a: &str, b: &str) -> bool {
    let normalize = |s: &str| -> String {
        s.trim()
            .chars()
            .map(|c| if c == '-' { ':' } else { c.to_ascii_lowercase() })
            .collect()
    };
    normalize(a) == normalize(b)
}

/// A boxed stream that keeps a guard alive until the stream is dropped.
///
/// Used to tie platform resources (a running scan, a registered observer)
/// to the lifetime of the stream that consumes them.
pub(crate) struct Guarded<T, G> {
    stream: BoxStream<'static, T>,
    _guard: G,
}

impl<T, G> Guarded<T, G> {
    pub(crate) fn new(stream: BoxStream<'static, T>, guard: G) -> Self {
        Self {
            stream,
            _guard: guard,
        }
    }
}

impl<T, G: Unpin> Stream for Guarded<T, G> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.stream.as_mut().poll_next(cx)
    }
}
