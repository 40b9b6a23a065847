use crate::models::sticker::{Sticker, StickerState};
use crate::services::backend::{BackendClient, BackendError};

#[derive(thiserror::Error, Debug)]
pub enum StickerError {
    #[error("Sticker {0} not found")]
    NotFound(String),

    #[error("Sticker {code} is already attached to a vehicle")]
    AlreadyAttached { code: String },

    #[error("Sticker {0} has been deleted; restore it first")]
    Deleted(String),

    #[error("Sticker {0} is not deleted")]
    NotDeleted(String),

    #[error("Vehicle id is required")]
    MissingVehicle,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Rejects an attach before it reaches the backend unless the sticker is
/// available.
pub fn ensure_attachable(sticker: &Sticker) -> Result<(), StickerError> {
    match sticker.state() {
        StickerState::Available => Ok(()),
        StickerState::Assigned => Err(StickerError::AlreadyAttached {
            code: sticker.code.clone(),
        }),
        StickerState::Deleted => Err(StickerError::Deleted(sticker.code.clone())),
    }
}

/// Links an available sticker to a vehicle
#[tracing::instrument(skip(backend, agent_token))]
pub async fn attach(
    backend: &BackendClient,
    agent_token: &str,
    code: &str,
    vehicle_id: &str,
) -> Result<Sticker, StickerError> {
    let vehicle_id = vehicle_id.trim();
    if vehicle_id.is_empty() {
        return Err(StickerError::MissingVehicle);
    }

    let sticker = backend
        .lookup_sticker(Some(agent_token), code)
        .await?
        .ok_or_else(|| StickerError::NotFound(code.to_string()))?;

    ensure_attachable(&sticker)?;

    let attached = backend.attach_sticker(agent_token, code, vehicle_id).await?;

    tracing::info!(code = %code, vehicle_id = %vehicle_id, "Sticker attached");

    Ok(attached)
}

/// Brings a soft-deleted sticker back into circulation
#[tracing::instrument(skip(backend, agent_token))]
pub async fn restore(backend: &BackendClient, agent_token: &str, code: &str) -> Result<Sticker, StickerError> {
    // Deleted stickers are excluded from the default lookup, so an unknown
    // code is passed through and the backend decides.
    if let Some(sticker) = backend.lookup_sticker(Some(agent_token), code).await? {
        if sticker.state() != StickerState::Deleted {
            return Err(StickerError::NotDeleted(code.to_string()));
        }
    }

    let restored = backend.restore_sticker(agent_token, code).await?;

    tracing::info!(code = %code, "Sticker restored");

    Ok(restored)
}
