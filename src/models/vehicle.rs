use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only vehicle projection returned by the levy backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub plate_number: String,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub security_code: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub blacklisted: bool,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub wallet: Option<WalletSummary>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub lga: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub amount_due: f64,
    #[serde(default)]
    pub next_payment_due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Blacklisted,
    Flagged,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ComplianceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "Compliant",
            ComplianceStatus::NonCompliant => "Non-compliant",
            ComplianceStatus::Blacklisted => "Blacklisted",
            ComplianceStatus::Flagged => "Flagged",
            ComplianceStatus::Unknown => "Not reported",
        }
    }
}

/// Verdict as reported by the backend. The reasons are shown verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compliance {
    #[serde(default)]
    pub status: ComplianceStatus,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub checked_at: Option<DateTime<Utc>>,
}

/// Payload of a successful verify-scan call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedScan {
    pub vehicle: Vehicle,
    #[serde(default)]
    pub compliance: Compliance,
}

impl VerifiedScan {
    /// A scan passes only when the backend says compliant and neither vehicle
    /// flag is raised. A missing verdict does not pass.
    pub fn passes(&self) -> bool {
        self.compliance.status == ComplianceStatus::Compliant
            && !self.vehicle.blacklisted
            && !self.vehicle.flagged
    }
}
