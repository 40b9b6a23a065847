use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::api::middleware::auth::AuthError;
use crate::services::{
    backend::BackendError, qr_generator::QrGenerationError, scan_history::HistoryError,
    scan_session::SessionError, sticker_service::StickerError,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Sticker error: {0}")]
    Sticker(#[from] StickerError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Scan session error: {0}")]
    ScanSession(#[from] SessionError),

    #[error("QR error: {0}")]
    Qr(#[from] QrGenerationError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthorized => AppError::Unauthorized,
            AuthError::Forbidden => AppError::Forbidden,
            AuthError::SessionError => AppError::Session("session store unavailable".to_string()),
        }
    }
}

fn backend_status(e: &BackendError) -> StatusCode {
    match e {
        BackendError::NotFound { .. } => StatusCode::NOT_FOUND,
        BackendError::ApiError(_) => StatusCode::BAD_REQUEST,
        BackendError::Status { status, .. } if status.is_client_error() => {
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_debug = format!("{:?}", self);

        let (status, error_message) = match self {
            AppError::Backend(e) => (backend_status(&e), e.user_message()),
            AppError::Sticker(StickerError::Backend(e)) => (backend_status(&e), e.user_message()),
            AppError::Sticker(e @ StickerError::NotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Sticker(e @ StickerError::MissingVehicle) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Sticker(e) => (StatusCode::CONFLICT, e.to_string()),
            AppError::History(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Scan history is unavailable".to_string(),
            ),
            AppError::ScanSession(e) => {
                let status = match e {
                    SessionError::AlreadyActive(_) => StatusCode::CONFLICT,
                    SessionError::NotFound(_) => StatusCode::NOT_FOUND,
                    SessionError::NotOwner(_) => StatusCode::FORBIDDEN,
                };
                (status, e.to_string())
            }
            AppError::Qr(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Session(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Session error".to_string(),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Your role does not allow this action".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %error_debug, "Request failed");
        }

        let body = Json(json!({
            "error": error_debug,
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_session_statuses() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            AppError::from(SessionError::AlreadyActive(id)).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(SessionError::NotOwner(id)).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(SessionError::NotFound(id)).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_attach_conflict_status() {
        let err = AppError::from(StickerError::AlreadyAttached {
            code: "STK-001".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unreachable_backend_is_bad_gateway() {
        let err = AppError::from(BackendError::InvalidResponse("truncated".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_forbidden_status() {
        assert_eq!(AppError::Forbidden.into_response().status(), StatusCode::FORBIDDEN);
    }
}
