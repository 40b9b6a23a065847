use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::SESSION_KEY_AGENT;
use crate::models::role::{capabilities_for, Capabilities, Role};

/// Authentication error responses
#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
    Forbidden,
    SessionError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required. Please log in.",
            )
                .into_response(),
            AuthError::Forbidden => {
                (StatusCode::FORBIDDEN, "Your role does not allow this action.").into_response()
            }
            AuthError::SessionError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Session error occurred.").into_response()
            }
        }
    }
}

/// Agent identity held in the session after login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedAgent {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Backend bearer token issued at login
    pub token: String,
}

impl AuthenticatedAgent {
    pub fn capabilities(&self) -> Capabilities {
        capabilities_for(self.role)
    }

    /// Fails with `Forbidden` unless `check` grants the action
    pub fn require(&self, check: impl Fn(&Capabilities) -> bool) -> Result<(), AuthError> {
        if check(&self.capabilities()) {
            Ok(())
        } else {
            tracing::warn!(agent_id = %self.id, role = ?self.role, "Action denied for role");
            Err(AuthError::Forbidden)
        }
    }
}

/// Middleware that requires the user to be authenticated
pub async fn require_auth(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if current_agent(&session).await?.is_none() {
        return Err(AuthError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// The logged-in agent, if any
pub async fn current_agent(session: &Session) -> Result<Option<AuthenticatedAgent>, AuthError> {
    session
        .get(SESSION_KEY_AGENT)
        .await
        .map_err(|_| AuthError::SessionError)
}

/// Extracts the authenticated agent from the session
pub async fn get_authenticated_agent(session: &Session) -> Result<AuthenticatedAgent, AuthError> {
    current_agent(session).await?.ok_or(AuthError::Unauthorized)
}
