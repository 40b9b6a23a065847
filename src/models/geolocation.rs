use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest horizontal accuracy (in meters) accepted for a verification.
pub const MAX_ACCURACY_METERS: f64 = 50.0;

/// A position fix accepted for verification.
///
/// Only ever built by the geolocation acquirer after the accuracy check, so
/// holding one means `accuracy_meters <= MAX_ACCURACY_METERS`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
}

/// Raw reading as produced by the device's location API
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionReading {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

/// Coded failures reported by the device's location API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached reading the source may return. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}
