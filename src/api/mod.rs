// API module - HTTP endpoints

pub mod auth;
pub mod health;
pub mod middleware;
pub mod scan;
pub mod stickers;
pub mod views;

use axum::Router;
use tower_http::trace::TraceLayer;

use middleware::session::{create_session_layer, AppState};

/// Full application router with sessions and request tracing
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config.secure_cookies);

    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(scan::router())
        .merge(stickers::router())
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
