//! Position telemetry.
//!
//! These are session actions: run them inside
//! [`with_connection`](crate::session::with_connection).

use tracing::debug;

use linak_types::uuids::{POSITION_CHAR, POSITION_SERVICE};
use linak_types::{Calibration, PositionReading, RawPosition};

use crate::error::Result;
use crate::session::{ConnectionConfig, Session, with_connection};
use crate::traits::{DeskLink, RadioPlatform};

/// Read the raw 16-bit position sample.
pub async fn read_raw_position<L: DeskLink>(session: &Session<'_, L>) -> Result<RawPosition> {
    let service = session.service(POSITION_SERVICE).await?;
    let data = session.read(&service, POSITION_CHAR).await?;
    let raw = RawPosition::from_bytes(&data)?;
    debug!("Raw position {} ({} bytes)", raw.value(), data.len());
    Ok(raw)
}

/// Read the current position and convert it to millimeters.
pub async fn read_position<L: DeskLink>(
    session: &Session<'_, L>,
    calibration: Calibration,
) -> Result<PositionReading> {
    let raw = read_raw_position(session).await?;
    Ok(calibration.reading(raw))
}

/// Connect to `device_id`, read its position once, and disconnect.
pub async fn read_current_position<P: RadioPlatform>(
    platform: &P,
    device_id: Option<&str>,
    calibration: Calibration,
    config: &ConnectionConfig,
) -> Result<PositionReading> {
    with_connection(platform, device_id, config, move |session| {
        Box::pin(read_position(session, calibration))
    })
    .await
}
