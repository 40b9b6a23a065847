use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::middleware::{
    auth::{get_authenticated_agent, AuthenticatedAgent},
    session::{AppState, SESSION_KEY_AGENT, SESSION_KEY_SESSION_STARTED_AT},
};
use crate::error::{AppError, Result};
use crate::models::role::{Capabilities, Role};
use crate::services::backend::BackendError;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub capabilities: Capabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_started_at: Option<String>,
}

impl AgentResponse {
    fn new(agent: &AuthenticatedAgent, session_started_at: Option<String>) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            role: agent.role,
            capabilities: agent.capabilities(),
            session_started_at,
        }
    }
}

/// Exchanges agent credentials with the backend and opens a session
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<AgentResponse>> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".to_string()));
    }

    let login = match state.backend.login(form.email.trim(), &form.password).await {
        Ok(login) => login,
        Err(BackendError::ApiError(_)) | Err(BackendError::NotFound { .. }) => {
            return Err(AppError::Unauthorized);
        }
        Err(BackendError::Status { status, .. }) if status.as_u16() == 401 => {
            return Err(AppError::Unauthorized);
        }
        Err(e) => return Err(e.into()),
    };

    let agent = AuthenticatedAgent {
        id: login.user.id,
        name: login.user.name,
        role: login.user.role,
        token: login.token,
    };

    // New id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Session(e.to_string()))?;
    session
        .insert(SESSION_KEY_AGENT, &agent)
        .await
        .map_err(|e| AppError::Session(e.to_string()))?;
    let started_at = Utc::now().to_rfc3339();
    session
        .insert(SESSION_KEY_SESSION_STARTED_AT, &started_at)
        .await
        .map_err(|e| AppError::Session(e.to_string()))?;

    tracing::info!(agent_id = %agent.id, role = ?agent.role, "Agent logged in");

    Ok(Json(AgentResponse::new(&agent, Some(started_at))))
}

/// Logs out the agent
async fn logout(session: Session) -> Result<StatusCode> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Session(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn me(session: Session) -> Result<Json<AgentResponse>> {
    let agent = get_authenticated_agent(&session).await?;
    let started_at: Option<String> = session
        .get(SESSION_KEY_SESSION_STARTED_AT)
        .await
        .map_err(|e| AppError::Session(e.to_string()))?;

    Ok(Json(AgentResponse::new(&agent, started_at)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
