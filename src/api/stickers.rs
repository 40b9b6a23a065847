use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::middleware::{
    auth::{get_authenticated_agent, require_auth},
    session::AppState,
};
use crate::error::{AppError, Result};
use crate::models::sticker::{Sticker, StickerState};
use crate::services::{qr_generator, sticker_service};

#[derive(Debug, Deserialize)]
pub struct AttachForm {
    pub vehicle_id: String,
}

#[derive(Debug, Serialize)]
pub struct StickerResponse {
    #[serde(flatten)]
    pub sticker: Sticker,
    pub state: StickerState,
}

impl From<Sticker> for StickerResponse {
    fn from(sticker: Sticker) -> Self {
        let state = sticker.state();
        Self { sticker, state }
    }
}

async fn show_sticker(
    State(state): State<AppState>,
    Path(code): Path<String>,
    session: Session,
) -> Result<Json<StickerResponse>> {
    let agent = get_authenticated_agent(&session).await?;

    let sticker = state
        .backend
        .lookup_sticker(Some(agent.token.as_str()), &code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sticker {} not found", code)))?;

    Ok(Json(StickerResponse::from(sticker)))
}

async fn sticker_qr(State(state): State<AppState>, Path(code): Path<String>) -> Result<Response> {
    let svg = qr_generator::generate_sticker_svg(&state.config.base_url, &code)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/svg+xml")],
        svg,
    )
        .into_response())
}

async fn attach_sticker(
    State(state): State<AppState>,
    Path(code): Path<String>,
    session: Session,
    Json(form): Json<AttachForm>,
) -> Result<Json<StickerResponse>> {
    let agent = get_authenticated_agent(&session).await?;
    agent.require(|caps| caps.can_attach_sticker)?;

    let sticker = sticker_service::attach(&state.backend, &agent.token, &code, &form.vehicle_id).await?;

    tracing::info!(agent_id = %agent.id, code = %code, "Sticker attach completed");

    Ok(Json(StickerResponse::from(sticker)))
}

async fn restore_sticker(
    State(state): State<AppState>,
    Path(code): Path<String>,
    session: Session,
) -> Result<Json<StickerResponse>> {
    let agent = get_authenticated_agent(&session).await?;
    agent.require(|caps| caps.can_restore_sticker)?;

    let sticker = sticker_service::restore(&state.backend, &agent.token, &code).await?;

    Ok(Json(StickerResponse::from(sticker)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stickers/:code", get(show_sticker))
        .route("/stickers/:code/qr", get(sticker_qr))
        .route("/stickers/:code/attach", post(attach_sticker))
        .route("/stickers/:code/restore", post(restore_sticker))
        .route_layer(middleware::from_fn(require_auth))
}
