use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::models::{geolocation::GeoLocation, scan_attempt::ScanAttempt, vehicle::VerifiedScan};
use crate::services::{backend::BackendClient, scan_history::ScanHistory};

pub const CANCELLED_MESSAGE: &str = "Scan cancelled";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanResult {
    Verified { data: VerifiedScan },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub code: String,
    #[serde(flatten)]
    pub result: ScanResult,
    /// Set when the attempt could not be written to the history log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_error: Option<String>,
}

impl ScanOutcome {
    pub fn success(&self) -> bool {
        matches!(self.result, ScanResult::Verified { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.result {
            ScanResult::Failed { error } => Some(error),
            ScanResult::Verified { .. } => None,
        }
    }
}

/// Forwards scans to the backend compliance endpoint and logs every attempt
#[derive(Clone)]
pub struct ScanVerifier {
    backend: BackendClient,
    history: Arc<ScanHistory>,
}

impl ScanVerifier {
    pub fn new(backend: BackendClient, history: Arc<ScanHistory>) -> Self {
        Self { backend, history }
    }

    pub fn history(&self) -> &Arc<ScanHistory> {
        &self.history
    }

    /// Writes one attempt to the history log, reporting (not raising) a
    /// storage failure.
    pub fn record(&self, attempt: ScanAttempt) -> Option<String> {
        let code = attempt.code.clone();
        match self.history.append(attempt) {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(code = %code, error = %e, "Failed to record scan attempt");
                Some(e.to_string())
            }
        }
    }

    pub async fn verify(
        &self,
        agent_token: Option<&str>,
        code: &str,
        location: &GeoLocation,
    ) -> ScanOutcome {
        self.verify_until(agent_token, code, location, std::future::pending())
            .await
    }

    /// Verifies a scanned code, giving up when `cancelled` resolves first.
    ///
    /// Whatever happens (verdict, backend failure, cancellation) the attempt
    /// is in the history log before this returns.
    #[tracing::instrument(skip(self, agent_token, location, cancelled))]
    pub async fn verify_until<C>(
        &self,
        agent_token: Option<&str>,
        code: &str,
        location: &GeoLocation,
        cancelled: C,
    ) -> ScanOutcome
    where
        C: Future<Output = ()>,
    {
        let code = code.trim();

        let result = if code.is_empty() {
            ScanResult::Failed {
                error: "Scanned code is empty".to_string(),
            }
        } else {
            tokio::select! {
                response = self.backend.verify_scan(agent_token, code, location.latitude, location.longitude) => {
                    match response {
                        Ok(data) => ScanResult::Verified { data },
                        Err(e) => {
                            tracing::error!(error = ?e, "Scan verification failed");
                            ScanResult::Failed { error: e.user_message() }
                        }
                    }
                }
                _ = cancelled => {
                    tracing::info!("Scan verification cancelled");
                    ScanResult::Failed { error: CANCELLED_MESSAGE.to_string() }
                }
            }
        };

        let attempt = match &result {
            ScanResult::Verified { data } => ScanAttempt::succeeded(code, Some(data.vehicle.id.clone())),
            ScanResult::Failed { error } => ScanAttempt::failed(code, error.clone()),
        };
        let history_error = self.record(attempt);

        tracing::info!(success = matches!(result, ScanResult::Verified { .. }), "Scan verified");

        ScanOutcome {
            code: code.to_string(),
            result,
            history_error,
        }
    }
}
