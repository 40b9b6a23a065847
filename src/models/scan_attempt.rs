use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry in the local scan history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanAttempt {
    pub id: Uuid,
    #[serde(alias = "url")]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanAttempt {
    pub fn succeeded(code: &str, vehicle_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.to_string(),
            vehicle_id,
            timestamp: Utc::now(),
            success: true,
            error: None,
        }
    }

    pub fn failed(code: &str, error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.to_string(),
            vehicle_id: None,
            timestamp: Utc::now(),
            success: false,
            error: Some(error.into()),
        }
    }
}
