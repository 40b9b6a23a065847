use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{
    auth::{current_agent, get_authenticated_agent},
    session::AppState,
};
use crate::api::views::{self, HistoryTemplate, PublicVehicleTemplate, ScannerTemplate, VehicleCard};
use crate::error::{AppError, Result};
use crate::models::{
    geolocation::{PositionErrorCode, PositionReading},
    scan_attempt::ScanAttempt,
};
use crate::services::{
    geolocation::ReportedPosition,
    scan_presenter::{self, ScanFailure},
};

/// What the device sends after asking for its position
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub session_id: Option<Uuid>,
    pub position: Option<PositionReading>,
    pub position_error: Option<PositionErrorCode>,
}

impl VerifyRequest {
    fn reported_position(&self) -> Result<ReportedPosition> {
        match (self.position_error, self.position) {
            (Some(code), _) => Ok(ReportedPosition(Err(code))),
            (None, Some(reading)) => Ok(ReportedPosition(Ok(reading))),
            (None, None) => Err(AppError::Validation(
                "Either position or position_error is required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub session_id: Uuid,
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub attempts: Vec<ScanAttempt>,
    pub success_count: usize,
    pub failed_count: usize,
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

/// Landing point of a sticker's QR code.
///
/// Agents get the scanner page; everyone else gets the public read-only
/// lookup.
async fn scan_landing(
    State(state): State<AppState>,
    Path(code): Path<String>,
    session: Session,
) -> Result<Response> {
    if let Some(agent) = current_agent(&session).await? {
        agent.require(|caps| caps.can_scan)?;

        tracing::debug!(code = %code, agent_id = %agent.id, "Opening scanner");

        return Ok(ScannerTemplate::new(
            &code,
            Uuid::new_v4(),
            &agent.name,
            state.acquirer.options().timeout,
        )
        .into_response());
    }

    public_lookup(&state, &code).await
}

#[tracing::instrument(skip(state))]
async fn public_lookup(state: &AppState, code: &str) -> Result<Response> {
    let sticker = match state.backend.lookup_sticker(None, code).await {
        Ok(sticker) => sticker,
        Err(e) => {
            tracing::error!(error = ?e, "Public sticker lookup failed");
            return Ok((
                StatusCode::BAD_GATEWAY,
                views::render_failure(
                    ScanFailure {
                        code: code.to_string(),
                        message: e.user_message(),
                        retryable: true,
                    },
                    None,
                ),
            )
                .into_response());
        }
    };

    if let Some(view) = scan_presenter::present_lookup(code, sticker.as_ref(), Utc::now()) {
        return Ok(views::render_view(view, None));
    }

    match sticker.and_then(|s| s.vehicle) {
        Some(vehicle) => Ok(PublicVehicleTemplate {
            code: code.to_string(),
            vehicle: VehicleCard::from(&vehicle),
        }
        .into_response()),
        None => Ok(views::render_failure(
            ScanFailure {
                code: code.to_string(),
                message: "This sticker is registered, but vehicle details are unavailable."
                    .to_string(),
                retryable: true,
            },
            None,
        )),
    }
}

/// Runs one scan session: location check, verification, presentation
async fn verify_scan(
    State(state): State<AppState>,
    Path(code): Path<String>,
    session: Session,
    headers: HeaderMap,
    Json(request): Json<VerifyRequest>,
) -> Result<Response> {
    let agent = get_authenticated_agent(&session).await?;
    agent.require(|caps| caps.can_scan)?;

    let source = request.reported_position()?;
    let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);

    let scan = state.sessions.begin(session_id, &agent.id)?;
    let report = scan
        .run(
            &state.acquirer,
            &source,
            &state.verifier,
            &state.backend,
            Some(agent.token.as_str()),
            &code,
        )
        .await;

    tracing::info!(
        session_id = %session_id,
        agent_id = %agent.id,
        "Scan session finished"
    );

    if wants_json(&headers) {
        return Ok(Json(report).into_response());
    }

    Ok(views::render_report(report))
}

async fn cancel_scan(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    session: Session,
) -> Result<Json<CancelResponse>> {
    let agent = get_authenticated_agent(&session).await?;
    agent.require(|caps| caps.can_scan)?;

    state.sessions.cancel(session_id, &agent.id)?;

    Ok(Json(CancelResponse {
        session_id,
        cancelled: true,
    }))
}

async fn scan_history(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let agent = get_authenticated_agent(&session).await?;
    agent.require(|caps| caps.can_view_history)?;

    let attempts = state.history.list()?;

    if wants_json(&headers) {
        let success_count = attempts.iter().filter(|a| a.success).count();
        let failed_count = attempts.len() - success_count;
        return Ok(Json(HistoryResponse {
            attempts,
            success_count,
            failed_count,
        })
        .into_response());
    }

    Ok(HistoryTemplate::new(&attempts, agent.capabilities().can_clear_history).into_response())
}

async fn clear_history(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    let agent = get_authenticated_agent(&session).await?;
    agent.require(|caps| caps.can_clear_history)?;

    state.history.clear()?;

    tracing::info!(agent_id = %agent.id, "Agent cleared scan history");

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scan/history", get(scan_history).delete(clear_history))
        .route("/scan/sessions/:session_id/cancel", post(cancel_scan))
        .route("/scan/:code", get(scan_landing))
        .route("/scan/:code/verify", post(verify_scan))
}
