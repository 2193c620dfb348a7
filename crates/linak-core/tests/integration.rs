//! Integration tests for linak-core
//!
//! These tests require a LINAK desk in range and should be run with:
//! `cargo test --package linak-core -- --ignored --nocapture`
//!
//! Set `LINAK_DESK_DEVICE` to the desk's identity (Bluetooth address, or
//! CoreBluetooth UUID on macOS) and `LINAK_DESK_LOWEST_MM` to its lowest
//! height. Without `LINAK_DESK_DEVICE` the read test is skipped.

use std::env;
use std::time::Duration;

use linak_core::{
    BtlePlatform, Calibration, ConnectionConfig, ScanOptions, discover_with_progress,
    read_current_position,
};
use tokio::time::timeout;

/// Upper bound for a whole hardware test.
const BLE_TIMEOUT: Duration = Duration::from_secs(45);

fn device_id() -> Option<String> {
    env::var("LINAK_DESK_DEVICE").ok().filter(|s| !s.is_empty())
}

fn lowest_mm() -> i32 {
    env::var("LINAK_DESK_LOWEST_MM")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(620)
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_scan_lists_devices() {
    let platform = BtlePlatform::new().await.expect("no Bluetooth adapter");
    let options = ScanOptions::new().duration_secs(10);

    let devices = timeout(
        BLE_TIMEOUT,
        discover_with_progress(&platform, &options, |n, id| println!("{}: {}", n, id)),
    )
    .await
    .expect("scan did not finish")
    .expect("scan failed");

    println!("Found {} device(s)", devices.len());
    if let Some(id) = device_id() {
        assert!(
            devices.contains(&id),
            "{id} did not advertise during the scan"
        );
    }
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_read_position() {
    let Some(id) = device_id() else {
        println!("LINAK_DESK_DEVICE not set, skipping");
        return;
    };

    let platform = BtlePlatform::new().await.expect("no Bluetooth adapter");
    let reading = timeout(
        BLE_TIMEOUT,
        read_current_position(
            &platform,
            Some(&id),
            Calibration::new(lowest_mm()),
            &ConnectionConfig::default(),
        ),
    )
    .await
    .expect("read did not finish")
    .expect("read failed");

    println!("Current position is {} (raw {})", reading, reading.raw.value());
    assert!(reading.height_mm >= lowest_mm());
}
