use std::future::Future;

use crate::models::geolocation::{
    GeoLocation, PositionErrorCode, PositionOptions, PositionReading, MAX_ACCURACY_METERS,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Location permission denied. Allow location access for this site and try again.")]
    PermissionDenied,

    #[error("Location information is unavailable. Check that location services are on.")]
    PositionUnavailable,

    #[error("Timed out while getting your location. Move to an open area and try again.")]
    Timeout,

    #[error("Location accuracy is {accuracy:.0}m, more than the {max:.0}m allowed. Enable GPS and try again.")]
    InsufficientAccuracy { accuracy: f64, max: f64 },
}

impl LocationError {
    /// Location failures are never retried automatically; the agent re-runs
    /// the scan.
    pub fn retryable(&self) -> bool {
        true
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "permission_denied",
            LocationError::PositionUnavailable => "position_unavailable",
            LocationError::Timeout => "timeout",
            LocationError::InsufficientAccuracy { .. } => "insufficient_accuracy",
        }
    }
}

impl From<PositionErrorCode> for LocationError {
    fn from(code: PositionErrorCode) -> Self {
        match code {
            PositionErrorCode::PermissionDenied => LocationError::PermissionDenied,
            PositionErrorCode::PositionUnavailable => LocationError::PositionUnavailable,
            PositionErrorCode::Timeout => LocationError::Timeout,
        }
    }
}

/// Anything that can produce a device position fix
pub trait PositionSource {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<PositionReading, PositionErrorCode>> + Send;
}

/// The fix (or coded failure) a device posted along with its scan
#[derive(Debug, Clone, Copy)]
pub struct ReportedPosition(pub Result<PositionReading, PositionErrorCode>);

impl PositionSource for ReportedPosition {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<PositionReading, PositionErrorCode> {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeolocationAcquirer {
    options: PositionOptions,
}

impl GeolocationAcquirer {
    pub fn new(options: PositionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Requests a fresh fix and applies the accuracy threshold.
    ///
    /// A reading less precise than [`MAX_ACCURACY_METERS`] is discarded; its
    /// coordinates never leave this function.
    #[tracing::instrument(skip_all)]
    pub async fn acquire<S: PositionSource>(&self, source: &S) -> Result<GeoLocation, LocationError> {
        let reading = tokio::time::timeout(self.options.timeout, source.current_position(&self.options))
            .await
            .map_err(|_| {
                tracing::warn!(timeout_secs = self.options.timeout.as_secs(), "Position request timed out");
                LocationError::Timeout
            })?
            .map_err(|code| {
                tracing::warn!(?code, "Position request failed");
                LocationError::from(code)
            })?;

        if !reading.accuracy.is_finite() || reading.accuracy > MAX_ACCURACY_METERS {
            tracing::warn!(accuracy = reading.accuracy, "Rejected low-precision location");
            return Err(LocationError::InsufficientAccuracy {
                accuracy: reading.accuracy,
                max: MAX_ACCURACY_METERS,
            });
        }

        tracing::debug!(accuracy = reading.accuracy, "Location received");

        Ok(GeoLocation {
            latitude: reading.latitude,
            longitude: reading.longitude,
            accuracy_meters: reading.accuracy,
        })
    }
}
