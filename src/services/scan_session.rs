use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::models::scan_attempt::ScanAttempt;
use crate::services::{
    backend::BackendClient,
    geolocation::{GeolocationAcquirer, LocationError, PositionSource},
    scan_presenter::{self, ScanFailure, ScanView},
    scan_verifier::{ScanResult, ScanVerifier, CANCELLED_MESSAGE},
};

/// How a scan session ended.
///
/// `history_error` is set on any variant when the attempt could not be
/// written to the history log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanReport {
    /// No usable location; verification was never attempted
    Location {
        code: String,
        error: String,
        reason: &'static str,
        retryable: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        history_error: Option<String>,
    },
    View {
        view: ScanView,
        #[serde(skip_serializing_if = "Option::is_none")]
        history_error: Option<String>,
    },
    Failure {
        failure: ScanFailure,
        #[serde(skip_serializing_if = "Option::is_none")]
        history_error: Option<String>,
    },
}

impl ScanReport {
    pub fn history_error(&self) -> Option<&str> {
        match self {
            ScanReport::Location { history_error, .. }
            | ScanReport::View { history_error, .. }
            | ScanReport::Failure { history_error, .. } => history_error.as_deref(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("A scan with id {0} is already in progress")]
    AlreadyActive(Uuid),

    #[error("No scan in progress for {0}")]
    NotFound(Uuid),

    #[error("Scan {0} belongs to another agent")]
    NotOwner(Uuid),
}

#[derive(Debug)]
struct ActiveScan {
    owner: String,
    cancel_tx: watch::Sender<bool>,
}

/// Registry of in-flight scans so the agent who started one can abandon it
#[derive(Debug, Default)]
pub struct ScanSessions {
    active: Mutex<HashMap<Uuid, ActiveScan>>,
}

impl ScanSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session for `owner`. An id that is still running is
    /// refused. The entry is removed when the returned handle is dropped.
    pub fn begin(self: &Arc<Self>, id: Uuid, owner: &str) -> Result<ScanSession, SessionError> {
        let (tx, rx) = watch::channel(false);
        let mut active = match self.active.lock() {
            Ok(active) => active,
            Err(poisoned) => poisoned.into_inner(),
        };
        if active.contains_key(&id) {
            tracing::warn!(session_id = %id, "Rejecting duplicate scan session");
            return Err(SessionError::AlreadyActive(id));
        }
        active.insert(
            id,
            ActiveScan {
                owner: owner.to_string(),
                cancel_tx: tx,
            },
        );

        Ok(ScanSession {
            id,
            cancel_rx: rx,
            registry: Arc::clone(self),
        })
    }

    /// Signals cancellation to a running session started by `owner`
    pub fn cancel(&self, id: Uuid, owner: &str) -> Result<(), SessionError> {
        let active = match self.active.lock() {
            Ok(active) => active,
            Err(poisoned) => poisoned.into_inner(),
        };
        let scan = active.get(&id).ok_or(SessionError::NotFound(id))?;
        if scan.owner != owner {
            tracing::warn!(session_id = %id, agent_id = %owner, "Cancel refused for foreign scan");
            return Err(SessionError::NotOwner(id));
        }

        tracing::info!(session_id = %id, "Cancelling scan session");
        scan.cancel_tx
            .send(true)
            .map_err(|_| SessionError::NotFound(id))
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().map(|a| a.len()).unwrap_or(0)
    }
}

pub struct ScanSession {
    id: Uuid,
    cancel_rx: watch::Receiver<bool>,
    registry: Arc<ScanSessions>,
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        // `begin` refuses live ids, so the entry under this id is ours
        if let Ok(mut active) = self.registry.active.lock() {
            active.remove(&self.id);
        }
    }
}

impl ScanSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Resolves once the session is cancelled. Never resolves otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel_rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    fn cancelled_report(code: &str, history_error: Option<String>) -> ScanReport {
        ScanReport::Failure {
            failure: ScanFailure {
                code: code.to_string(),
                message: CANCELLED_MESSAGE.to_string(),
                retryable: true,
            },
            history_error,
        }
    }

    /// Location, then verification, then (on failure) a sticker lookup to
    /// tell an unattached sticker or an unknown code apart from a plain
    /// call failure.
    #[tracing::instrument(skip_all, fields(session_id = %self.id, code = %code))]
    pub async fn run<S: PositionSource>(
        &self,
        acquirer: &GeolocationAcquirer,
        source: &S,
        verifier: &ScanVerifier,
        backend: &BackendClient,
        agent_token: Option<&str>,
        code: &str,
    ) -> ScanReport {
        let location = tokio::select! {
            location = acquirer.acquire(source) => location,
            _ = self.cancelled() => {
                let history_error = verifier.record(ScanAttempt::failed(code, CANCELLED_MESSAGE));
                return Self::cancelled_report(code, history_error);
            }
        };

        let location = match location {
            Ok(location) => location,
            Err(e) => {
                let history_error = verifier.record(ScanAttempt::failed(code, e.to_string()));
                return location_report(code, &e, history_error);
            }
        };

        let outcome = verifier
            .verify_until(agent_token, code, &location, self.cancelled())
            .await;
        let history_error = outcome.history_error;

        let error = match outcome.result {
            ScanResult::Verified { data } => {
                return ScanReport::View {
                    view: scan_presenter::present_verified(data),
                    history_error,
                };
            }
            ScanResult::Failed { error } => error,
        };

        if error == CANCELLED_MESSAGE {
            return Self::cancelled_report(&outcome.code, history_error);
        }

        let failure = ScanFailure {
            code: outcome.code.clone(),
            message: error,
            retryable: true,
        };

        let lookup = tokio::select! {
            lookup = backend.lookup_sticker(agent_token, &outcome.code) => lookup,
            _ = self.cancelled() => return Self::cancelled_report(&outcome.code, history_error),
        };

        let view = match lookup {
            Ok(sticker) => {
                scan_presenter::present_lookup(&outcome.code, sticker.as_ref(), Utc::now())
            }
            Err(e) => {
                tracing::warn!(error = ?e, "Sticker lookup after failed verification also failed");
                None
            }
        };

        match view {
            Some(view) => ScanReport::View { view, history_error },
            None => ScanReport::Failure {
                failure,
                history_error,
            },
        }
    }
}

fn location_report(code: &str, error: &LocationError, history_error: Option<String>) -> ScanReport {
    ScanReport::Location {
        code: code.to_string(),
        error: error.to_string(),
        reason: error.kind(),
        retryable: error.retryable(),
        history_error,
    }
}
