//! Platform-agnostic types for LINAK desk controllers.
//!
//! This crate holds everything about the desk protocol that does not need a
//! Bluetooth stack: service and characteristic UUIDs, raw telemetry parsing,
//! the calibration transform and the preset model.
//!
//! # Example
//!
//! ```
//! use linak_types::{Calibration, RawPosition};
//!
//! let raw = RawPosition::from_bytes(&[0x8F, 0x1A]).unwrap();
//! let height = Calibration::new(620).decode(raw);
//! assert_eq!(height, 1299);
//! ```

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{ParseError, ParseResult};
pub use types::{
    Calibration, HEIGHT_SLOPE_DEN, HEIGHT_SLOPE_NUM, Millimeters, PositionReading, Preset,
    RawPosition, round_mm,
};
pub use uuid as uuids;
