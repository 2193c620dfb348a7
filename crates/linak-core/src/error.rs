//! Error types for linak-core.
//!
//! Errors fall into three groups, reported by [`Error::kind`]:
//!
//! | Kind | Variants | Meaning |
//! |------|----------|---------|
//! | [`ErrorKind::Usage`] | [`Error::NotConfigured`], [`Error::EmptyPresetName`], [`Error::InvalidSelection`], [`Error::InvalidConfig`] | The operator has to fix something; nothing was attempted. |
//! | [`ErrorKind::Protocol`] | [`Error::Bluetooth`], [`Error::DeviceNotFound`], [`Error::ServiceNotFound`], [`Error::CharacteristicNotFound`], [`Error::Timeout`], ... | The radio exchange failed. |
//! | [`ErrorKind::LinkLost`] | [`Error::LinkLost`] | The desk dropped the connection mid-session. |
//!
//! Nothing in this crate retries. Every protocol failure is final for the
//! operation that produced it.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to a desk or its stored settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan or connection.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// The desk does not expose a required GATT service.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The service UUID that was not found.
        uuid: String,
    },

    /// Required characteristic not found in a service.
    #[error("Characteristic not found: {uuid} (in service {service})")]
    CharacteristicNotFound {
        /// The characteristic UUID that was not found.
        uuid: String,
        /// The service that was searched.
        service: String,
    },

    /// Data received from the desk could not be interpreted.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Telemetry value too short.
    #[error("Invalid reading format: expected {expected} bytes, got {actual}")]
    InvalidReadingFormat {
        /// Expected data size.
        expected: usize,
        /// Actual data size received.
        actual: usize,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// The desk disconnected while a session action was running.
    #[error("Device {device_id} disconnected during the session")]
    LinkLost {
        /// Identity of the desk that dropped the link.
        device_id: String,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The stored settings document is not valid JSON.
    #[error("Invalid settings document: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored setting has an unusable value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Required settings are missing.
    #[error("Missing configuration: {}", join_settings(.missing))]
    NotConfigured {
        /// Every setting that still has to be provided.
        missing: Vec<Setting>,
    },

    /// A preset name was empty.
    #[error("Position name can not be empty")]
    EmptyPresetName,

    /// The operator picked something that is not in the discovered list.
    #[error("Can't find device with index [{input}] (expected 1 - {count})")]
    InvalidSelection {
        /// What the operator typed.
        input: String,
        /// Number of devices that were offered.
        count: usize,
    },
}

/// Reason why a device was not found.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// No Bluetooth adapter available.
    NoAdapter,
    /// The scan ended without the device advertising.
    NotFound { identifier: String },
    /// Scan timed out before finding the device.
    ScanTimeout {
        identifier: String,
        duration: Duration,
    },
}

impl fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
            Self::NotFound { identifier } => write!(f, "device '{}' not found", identifier),
            Self::ScanTimeout {
                identifier,
                duration,
            } => write!(
                f,
                "device '{}' did not advertise within {:?}",
                identifier, duration
            ),
        }
    }
}

/// A setting that must be present before talking to the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// The desk's Bluetooth identity.
    DeviceId,
    /// The desk's lowest height in millimeters.
    LowestPosMm,
}

impl Setting {
    /// Key under which the setting is stored.
    pub fn key(self) -> &'static str {
        match self {
            Setting::DeviceId => crate::store::keys::DEVICE_ID,
            Setting::LowestPosMm => crate::store::keys::LOWEST_POS_MM,
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn join_settings(settings: &[Setting]) -> String {
    settings
        .iter()
        .map(|s| s.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operator error; fix the input or settings and run again.
    Usage,
    /// Radio or storage failure.
    Protocol,
    /// The desk disconnected mid-session.
    LinkLost,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotConfigured { .. }
            | Error::EmptyPresetName
            | Error::InvalidSelection { .. }
            | Error::InvalidConfig(_) => ErrorKind::Usage,
            Error::LinkLost { .. } => ErrorKind::LinkLost,
            _ => ErrorKind::Protocol,
        }
    }

    /// Create a device not found error for a specific identifier.
    pub fn device_not_found(identifier: impl Into<String>) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::NotFound {
            identifier: identifier.into(),
        })
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a service not found error.
    pub fn service_not_found(uuid: impl ToString) -> Self {
        Self::ServiceNotFound {
            uuid: uuid.to_string(),
        }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: impl ToString, service: impl ToString) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.to_string(),
            service: service.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a missing-settings error.
    pub fn not_configured(missing: Vec<Setting>) -> Self {
        Self::NotConfigured { missing }
    }
}

impl From<linak_types::ParseError> for Error {
    fn from(err: linak_types::ParseError) -> Self {
        match err {
            linak_types::ParseError::InsufficientBytes { expected, actual } => {
                Error::InvalidReadingFormat { expected, actual }
            }
            linak_types::ParseError::InvalidValue(msg) => Error::InvalidData(msg),
            _ => Error::InvalidData(format!("Parse error: {}", err)),
        }
    }
}

/// Result type alias using linak-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::device_not_found("E1:AA:BB:CC:DD:EE");
        assert!(err.to_string().contains("E1:AA:BB:CC:DD:EE"));

        let err = Error::service_not_found(linak_types::uuids::POSITION_SERVICE);
        assert!(err.to_string().contains("99fa0020"));

        let err = Error::characteristic_not_found(
            linak_types::uuids::POSITION_CHAR,
            linak_types::uuids::POSITION_SERVICE,
        );
        assert!(err.to_string().contains("99fa0021"));
        assert!(err.to_string().contains("99fa0020"));

        let err = Error::timeout("connect to device", Duration::from_secs(15));
        assert!(err.to_string().contains("connect to device"));
        assert!(err.to_string().contains("15s"));

        let err = Error::EmptyPresetName;
        assert_eq!(err.to_string(), "Position name can not be empty");
    }

    #[test]
    fn test_not_configured_lists_keys() {
        let err = Error::not_configured(vec![Setting::DeviceId, Setting::LowestPosMm]);
        assert_eq!(
            err.to_string(),
            "Missing configuration: device_id, lowest_pos_mm"
        );
    }

    #[test]
    fn test_invalid_selection_display() {
        let err = Error::InvalidSelection {
            input: "7".to_string(),
            count: 3,
        };
        assert!(err.to_string().contains("[7]"));
        assert!(err.to_string().contains("1 - 3"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::EmptyPresetName.kind(), ErrorKind::Usage);
        assert_eq!(
            Error::not_configured(vec![Setting::DeviceId]).kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            Error::InvalidSelection {
                input: "0".into(),
                count: 1
            }
            .kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            Error::LinkLost {
                device_id: "x".into()
            }
            .kind(),
            ErrorKind::LinkLost
        );
        assert_eq!(
            Error::service_not_found("99fa0001").kind(),
            ErrorKind::Protocol
        );
        assert_eq!(
            Error::timeout("read", Duration::from_secs(1)).kind(),
            ErrorKind::Protocol
        );
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Error = linak_types::ParseError::InsufficientBytes {
            expected: 2,
            actual: 1,
        }
        .into();
        assert!(matches!(
            err,
            Error::InvalidReadingFormat {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_btleplug_error_conversion() {
        fn _assert_from_impl<T: From<btleplug::Error>>() {}
        _assert_from_impl::<Error>();
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }
}
