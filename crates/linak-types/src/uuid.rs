//! Bluetooth UUIDs for LINAK desk controllers.
//!
//! These identifiers are fixed by the desk firmware and must match exactly.

use uuid::{Uuid, uuid};

// --- Control ---

/// Main control service.
pub const CONTROL_SERVICE: Uuid = uuid!("99fa0001-338a-1024-8a49-009c0215f78a");

/// Control characteristic (movement commands).
pub const CONTROL_CHAR: Uuid = uuid!("99fa0002-338a-1024-8a49-009c0215f78a");

// --- Position ---

/// Position telemetry service.
pub const POSITION_SERVICE: Uuid = uuid!("99fa0020-338a-1024-8a49-009c0215f78a");

/// Position telemetry characteristic (raw height, u16 LE in the first two bytes).
pub const POSITION_CHAR: Uuid = uuid!("99fa0021-338a-1024-8a49-009c0215f78a");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_uuids() {
        assert_eq!(
            CONTROL_SERVICE.to_string(),
            "99fa0001-338a-1024-8a49-009c0215f78a"
        );
        assert_eq!(
            CONTROL_CHAR.to_string(),
            "99fa0002-338a-1024-8a49-009c0215f78a"
        );
    }

    #[test]
    fn test_position_uuids() {
        assert_eq!(
            POSITION_SERVICE.to_string(),
            "99fa0020-338a-1024-8a49-009c0215f78a"
        );
        assert_eq!(
            POSITION_CHAR.to_string(),
            "99fa0021-338a-1024-8a49-009c0215f78a"
        );
    }

    #[test]
    fn test_position_service_is_distinct_from_control() {
        assert_ne!(CONTROL_SERVICE, POSITION_SERVICE);
        assert_ne!(CONTROL_CHAR, POSITION_CHAR);
    }
}
