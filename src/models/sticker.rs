use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::vehicle::Vehicle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sticker {
    pub code: String,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    /// Usage marker set by the backend on attach. Its shape varies between
    /// backend versions (timestamp or bool), so only presence is inspected.
    #[serde(default)]
    pub is_used: Option<JsonValue>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vehicle: Option<Vehicle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerState {
    Available,
    Assigned,
    /// Soft-deleted; recoverable through the restore action
    Deleted,
}

impl Sticker {
    fn used(&self) -> bool {
        !matches!(
            self.is_used,
            None | Some(JsonValue::Null) | Some(JsonValue::Bool(false))
        )
    }

    pub fn state(&self) -> StickerState {
        if self.deleted_at.is_some() {
            StickerState::Deleted
        } else if self.vehicle_id.is_some() || self.used() {
            StickerState::Assigned
        } else {
            StickerState::Available
        }
    }

    /// Known, live, and free to attach: the same test attach applies
    pub fn is_unattached(&self) -> bool {
        self.state() == StickerState::Available
    }
}
