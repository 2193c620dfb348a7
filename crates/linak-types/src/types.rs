//! Core types for desk telemetry and presets.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Height in millimeters.
pub type Millimeters = i32;

/// Numerator of the raw-to-millimeter slope.
pub const HEIGHT_SLOPE_NUM: u32 = 381;

/// Denominator of the raw-to-millimeter slope.
pub const HEIGHT_SLOPE_DEN: u32 = 3815;

/// Minimum number of bytes in a position characteristic value.
pub const MIN_POSITION_BYTES: usize = 2;

/// Raw 16-bit position sample read from the position characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawPosition(pub u16);

impl RawPosition {
    /// Parse a raw position from a characteristic value.
    ///
    /// The first two bytes are an unsigned little-endian integer. Any trailing
    /// bytes (speed, status) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InsufficientBytes`] if `data` has fewer than
    /// [`MIN_POSITION_BYTES`] bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use linak_types::RawPosition;
    ///
    /// assert_eq!(RawPosition::from_bytes(&[0x04, 0x29]).unwrap(), RawPosition(10500));
    /// assert!(RawPosition::from_bytes(&[0x04]).is_err());
    /// ```
    #[must_use = "parsing returns a Result that should be handled"]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        use bytes::Buf;

        if data.len() < MIN_POSITION_BYTES {
            return Err(ParseError::InsufficientBytes {
                expected: MIN_POSITION_BYTES,
                actual: data.len(),
            });
        }

        let mut buf = data;
        Ok(RawPosition(buf.get_u16_le()))
    }

    /// Get the raw sample value.
    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }
}

impl From<u16> for RawPosition {
    fn from(value: u16) -> Self {
        RawPosition(value)
    }
}

/// Operator-measured calibration for one desk.
///
/// `lowest_pos_mm` is the absolute height of the desk at raw position 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    /// Height of the lowest reachable position, in millimeters.
    pub lowest_pos_mm: Millimeters,
}

impl Calibration {
    /// Create a calibration from the desk's lowest height.
    #[must_use]
    pub fn new(lowest_pos_mm: Millimeters) -> Self {
        Self { lowest_pos_mm }
    }

    /// Convert a raw sample to an absolute height.
    ///
    /// Computes `round(381 / 3815 * raw + lowest_pos_mm)` in `f64`, rounding
    /// half away from zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use linak_types::{Calibration, RawPosition};
    ///
    /// let cal = Calibration::new(617);
    /// assert_eq!(cal.decode(RawPosition(0)), 617);
    /// assert_eq!(cal.decode(RawPosition(3815)), 998);
    /// ```
    #[must_use]
    pub fn decode(&self, raw: RawPosition) -> Millimeters {
        let slope = f64::from(HEIGHT_SLOPE_NUM) / f64::from(HEIGHT_SLOPE_DEN);
        round_mm(slope * f64::from(raw.0) + f64::from(self.lowest_pos_mm))
    }

    /// Decode a raw sample into a [`PositionReading`].
    #[must_use]
    pub fn reading(&self, raw: RawPosition) -> PositionReading {
        PositionReading {
            raw,
            height_mm: self.decode(raw),
        }
    }
}

/// Round a millimeter value to the nearest integer, ties away from zero.
///
/// Values outside the `i32` range saturate.
#[must_use]
pub fn round_mm(value: f64) -> Millimeters {
    value.round() as Millimeters
}

/// One decoded position sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositionReading {
    /// Raw sample as read from the desk.
    pub raw: RawPosition,
    /// Absolute height in millimeters.
    pub height_mm: Millimeters,
}

impl fmt::Display for PositionReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mm", self.height_mm)
    }
}

/// A named, saved desk height.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Preset {
    /// Operator-chosen name, unique within the registry.
    pub name: String,
    /// Saved height in millimeters. Always positive once stored.
    pub height_mm: Millimeters,
}

impl Preset {
    /// Create a preset.
    pub fn new(name: impl Into<String>, height_mm: Millimeters) -> Self {
        Self {
            name: name.into(),
            height_mm,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} mm", self.name, self.height_mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Exact `round(381 * raw / 3815) + offset` in integer arithmetic.
    fn exact_height(raw: u16, offset: i32) -> i64 {
        let num = i64::from(HEIGHT_SLOPE_NUM) * i64::from(raw);
        let den = i64::from(HEIGHT_SLOPE_DEN);
        (2 * num + den) / (2 * den) + i64::from(offset)
    }

    #[test]
    fn test_raw_position_from_bytes() {
        assert_eq!(RawPosition::from_bytes(&[0x00, 0x00]).unwrap(), RawPosition(0));
        assert_eq!(
            RawPosition::from_bytes(&[0xFF, 0xFF]).unwrap(),
            RawPosition(u16::MAX)
        );
        // Little-endian: low byte first.
        assert_eq!(
            RawPosition::from_bytes(&[0x01, 0x02]).unwrap(),
            RawPosition(0x0201)
        );
    }

    #[test]
    fn test_raw_position_ignores_trailing_bytes() {
        let data = [0xE8, 0x03, 0x00, 0x00];
        assert_eq!(RawPosition::from_bytes(&data).unwrap(), RawPosition(1000));
    }

    #[test]
    fn test_raw_position_insufficient_bytes() {
        let err = RawPosition::from_bytes(&[0x10]).unwrap_err();
        assert_eq!(
            err,
            ParseError::InsufficientBytes {
                expected: 2,
                actual: 1
            }
        );
        assert!(err.to_string().contains("requires 2 bytes"));

        assert!(RawPosition::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_decode_zero_is_offset() {
        assert_eq!(Calibration::new(617).decode(RawPosition(0)), 617);
        assert_eq!(Calibration::new(0).decode(RawPosition(0)), 0);
    }

    #[test]
    fn test_decode_known_values() {
        let cal = Calibration::new(617);
        // 381 / 3815 * 3815 = 381 exactly
        assert_eq!(cal.decode(RawPosition(3815)), 998);
        // 381 / 3815 * 1000 = 99.869... -> 100
        assert_eq!(cal.decode(RawPosition(1000)), 717);
        // 381 / 3815 * 6500 = 649.148... -> 649
        assert_eq!(cal.decode(RawPosition(6500)), 1266);
    }

    #[test]
    fn test_round_mm_ties_away_from_zero() {
        assert_eq!(round_mm(700.5), 701);
        assert_eq!(round_mm(700.4999), 700);
        assert_eq!(round_mm(-0.5), -1);
        assert_eq!(round_mm(-700.5), -701);
        assert_eq!(round_mm(0.5), 1);
    }

    #[test]
    fn test_no_raw_sample_lands_on_a_tie() {
        // 3815 is odd, so 381 * raw / 3815 never has a fractional part of exactly 0.5.
        for raw in 0..=u16::MAX {
            let rem = (u64::from(HEIGHT_SLOPE_NUM) * u64::from(raw)) % u64::from(HEIGHT_SLOPE_DEN);
            assert_ne!(2 * rem, u64::from(HEIGHT_SLOPE_DEN), "tie at raw={raw}");
        }
    }

    #[test]
    fn test_decode_matches_exact_rounding_for_every_sample() {
        for offset in [0, 617, 650, -100] {
            let cal = Calibration::new(offset);
            for raw in 0..=u16::MAX {
                assert_eq!(
                    i64::from(cal.decode(RawPosition(raw))),
                    exact_height(raw, offset),
                    "raw={raw} offset={offset}"
                );
            }
        }
    }

    #[test]
    fn test_reading_carries_raw_and_height() {
        let reading = Calibration::new(620).reading(RawPosition(3815));
        assert_eq!(reading.raw, RawPosition(3815));
        assert_eq!(reading.height_mm, 1001);
        assert_eq!(reading.to_string(), "1001 mm");
    }

    #[test]
    fn test_preset_display() {
        let preset = Preset::new("desk_sit", 700);
        assert_eq!(preset.to_string(), "desk_sit: 700 mm");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_preset_serialization() {
        let preset = Preset::new("desk_stand", 1120);
        let json = serde_json::to_string(&preset).unwrap();
        assert_eq!(json, r#"{"name":"desk_stand","height_mm":1120}"#);
    }

    proptest! {
        #[test]
        fn prop_decode_matches_formula(raw in any::<u16>(), offset in -5_000i32..5_000) {
            let cal = Calibration::new(offset);
            let expected = (381.0 / 3815.0 * f64::from(raw) + f64::from(offset)).round() as i64;
            prop_assert_eq!(i64::from(cal.decode(RawPosition(raw))), expected);
            prop_assert_eq!(i64::from(cal.decode(RawPosition(raw))), exact_height(raw, offset));
        }

        #[test]
        fn prop_decode_is_monotonic(raw in 0u16..u16::MAX, offset in 0i32..2_000) {
            let cal = Calibration::new(offset);
            prop_assert!(cal.decode(RawPosition(raw)) <= cal.decode(RawPosition(raw + 1)));
        }
    }
}
