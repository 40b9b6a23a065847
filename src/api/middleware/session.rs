use std::sync::Arc;

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::services::{
    backend::BackendClient, geolocation::GeolocationAcquirer, scan_history::ScanHistory,
    scan_session::ScanSessions, scan_verifier::ScanVerifier,
};

/// Session keys used in the application
pub const SESSION_KEY_AGENT: &str = "agent";
pub const SESSION_KEY_SESSION_STARTED_AT: &str = "session_started_at";

/// Creates a session layer for Axum
pub fn create_session_layer(secure: bool) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(24)))
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub history: Arc<ScanHistory>,
    pub verifier: ScanVerifier,
    pub sessions: Arc<ScanSessions>,
    pub acquirer: GeolocationAcquirer,
}

impl AppState {
    pub fn new(config: Config, backend: BackendClient, history: Arc<ScanHistory>) -> Self {
        let verifier = ScanVerifier::new(backend.clone(), Arc::clone(&history));

        Self {
            config,
            backend,
            history,
            verifier,
            sessions: Arc::new(ScanSessions::new()),
            acquirer: GeolocationAcquirer::default(),
        }
    }
}
