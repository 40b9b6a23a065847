use std::time::Duration;

use askama::Template;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::models::{scan_attempt::ScanAttempt, vehicle::Vehicle};
use crate::services::{
    scan_presenter::{ScanFailure, ScanView},
    scan_session::ScanReport,
};

const BLANK: &str = "-";

/// Display-ready vehicle fields
#[derive(Debug, Clone)]
pub struct VehicleCard {
    pub plate_number: String,
    pub vin: String,
    pub security_code: String,
    pub category: String,
    pub status: String,
    pub owner_name: String,
    pub lga: String,
    pub barcode: String,
    pub blacklisted: bool,
    pub flagged: bool,
    pub wallet_balance: String,
    pub amount_due: String,
    pub next_payment_due: String,
}

fn or_blank(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| BLANK.to_string())
}

impl From<&Vehicle> for VehicleCard {
    fn from(v: &Vehicle) -> Self {
        let (wallet_balance, amount_due, next_payment_due) = match &v.wallet {
            Some(w) => (
                format!("{:.2}", w.balance),
                format!("{:.2}", w.amount_due),
                w.next_payment_due
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| BLANK.to_string()),
            ),
            None => (BLANK.to_string(), BLANK.to_string(), BLANK.to_string()),
        };

        Self {
            plate_number: v.plate_number.clone(),
            vin: or_blank(&v.vin),
            security_code: or_blank(&v.security_code),
            category: or_blank(&v.category),
            status: or_blank(&v.status),
            owner_name: or_blank(&v.owner_name),
            lga: or_blank(&v.lga),
            barcode: or_blank(&v.barcode),
            blacklisted: v.blacklisted,
            flagged: v.flagged,
            wallet_balance,
            amount_due,
            next_payment_due,
        }
    }
}

#[derive(Template)]
#[template(path = "scan/scanner.html")]
pub struct ScannerTemplate {
    pub code: String,
    /// `code` as a JS string literal, safe inside a script element
    pub code_json: String,
    pub session_id: String,
    pub agent_name: String,
    pub timeout_ms: u128,
}

#[derive(Template)]
#[template(path = "scan/compliant.html")]
pub struct CompliantTemplate {
    pub vehicle: VehicleCard,
    pub status_label: String,
    pub message: String,
    pub history_error: Option<String>,
}

#[derive(Template)]
#[template(path = "scan/non_compliant.html")]
pub struct NonCompliantTemplate {
    pub vehicle: VehicleCard,
    pub status_label: String,
    pub reasons: Vec<String>,
    pub history_error: Option<String>,
}

#[derive(Template)]
#[template(path = "scan/unattached.html")]
pub struct UnattachedTemplate {
    pub code: String,
    pub history_error: Option<String>,
}

#[derive(Template)]
#[template(path = "scan/counterfeit.html")]
pub struct CounterfeitTemplate {
    pub code: String,
    pub reference_id: String,
    pub history_error: Option<String>,
}

#[derive(Template)]
#[template(path = "scan/failure.html")]
pub struct FailureTemplate {
    pub code: String,
    pub title: String,
    pub message: String,
    pub retryable: bool,
    pub history_error: Option<String>,
}

#[derive(Template)]
#[template(path = "scan/public_vehicle.html")]
pub struct PublicVehicleTemplate {
    pub code: String,
    pub vehicle: VehicleCard,
}

impl ScannerTemplate {
    pub fn new(code: &str, session_id: Uuid, agent_name: &str, timeout: Duration) -> Self {
        let code_json = serde_json::to_string(code)
            .unwrap_or_else(|_| "\"\"".to_string())
            .replace('<', "\\u003c");

        Self {
            code: code.to_string(),
            code_json,
            session_id: session_id.to_string(),
            agent_name: agent_name.to_string(),
            timeout_ms: timeout.as_millis(),
        }
    }
}

pub struct HistoryRow {
    pub timestamp: String,
    pub code: String,
    pub vehicle_id: String,
    pub success: bool,
    pub error: String,
}

impl From<&ScanAttempt> for HistoryRow {
    fn from(a: &ScanAttempt) -> Self {
        Self {
            timestamp: a.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            code: a.code.clone(),
            vehicle_id: or_blank(&a.vehicle_id),
            success: a.success,
            error: a.error.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "scan/history.html")]
pub struct HistoryTemplate {
    pub rows: Vec<HistoryRow>,
    pub success_count: usize,
    pub failed_count: usize,
    pub can_clear: bool,
}

impl HistoryTemplate {
    pub fn new(attempts: &[ScanAttempt], can_clear: bool) -> Self {
        let success_count = attempts.iter().filter(|a| a.success).count();
        Self {
            rows: attempts.iter().map(HistoryRow::from).collect(),
            success_count,
            failed_count: attempts.len() - success_count,
            can_clear,
        }
    }
}

/// Renders an outcome card. `history_error` adds a notice that the attempt
/// is missing from the scan log.
pub fn render_view(view: ScanView, history_error: Option<String>) -> Response {
    match view {
        ScanView::Compliant {
            vehicle,
            compliance,
        } => CompliantTemplate {
            vehicle: VehicleCard::from(&vehicle),
            status_label: compliance.status.label().to_string(),
            message: compliance.message.unwrap_or_default(),
            history_error,
        }
        .into_response(),
        ScanView::NonCompliant {
            vehicle,
            compliance,
            reasons,
        } => NonCompliantTemplate {
            vehicle: VehicleCard::from(&vehicle),
            status_label: compliance.status.label().to_string(),
            reasons,
            history_error,
        }
        .into_response(),
        ScanView::Unattached { code } => UnattachedTemplate {
            code,
            history_error,
        }
        .into_response(),
        ScanView::Counterfeit { code, reference_id } => CounterfeitTemplate {
            code,
            reference_id,
            history_error,
        }
        .into_response(),
    }
}

pub fn render_failure(failure: ScanFailure, history_error: Option<String>) -> Response {
    FailureTemplate {
        code: failure.code,
        title: "Verification failed".to_string(),
        message: failure.message,
        retryable: failure.retryable,
        history_error,
    }
    .into_response()
}

pub fn render_report(report: ScanReport) -> Response {
    match report {
        ScanReport::View {
            view,
            history_error,
        } => render_view(view, history_error),
        ScanReport::Failure {
            failure,
            history_error,
        } => render_failure(failure, history_error),
        ScanReport::Location {
            code,
            error,
            retryable,
            history_error,
            ..
        } => FailureTemplate {
            code,
            title: "Location required".to_string(),
            message: error,
            retryable,
            history_error,
        }
        .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::Compliance;

    fn vehicle() -> Vehicle {
        serde_json::from_value(serde_json::json!({
            "id": "veh_1",
            "plateNumber": "ABJ-204-KD",
            "blacklisted": true,
            "wallet": { "balance": 1500.5, "amountDue": 250 }
        }))
        .unwrap()
    }

    #[test]
    fn test_vehicle_card_fills_blanks() {
        let card = VehicleCard::from(&vehicle());
        assert_eq!(card.plate_number, "ABJ-204-KD");
        assert_eq!(card.vin, "-");
        assert_eq!(card.wallet_balance, "1500.50");
        assert_eq!(card.amount_due, "250.00");
        assert_eq!(card.next_payment_due, "-");
    }

    #[test]
    fn test_non_compliant_page_shows_reasons() {
        let html = NonCompliantTemplate {
            vehicle: VehicleCard::from(&vehicle()),
            status_label: "Blacklisted".to_string(),
            reasons: vec!["Vehicle is blacklisted by LGA".to_string()],
            history_error: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("Vehicle is blacklisted by LGA"));
        assert!(html.contains("ABJ-204-KD"));
    }

    #[test]
    fn test_counterfeit_page_shows_reference() {
        let html = CounterfeitTemplate {
            code: "ABC123".to_string(),
            reference_id: "CF-ABC123-0042".to_string(),
            history_error: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("CF-ABC123-0042"));
    }

    #[test]
    fn test_scanner_escapes_code_for_script() {
        let page = ScannerTemplate::new("</script>", Uuid::nil(), "Ada", Duration::from_secs(10));
        assert_eq!(page.code_json, "\"\\u003c/script>\"");
        assert_eq!(page.timeout_ms, 10_000);
    }

    #[test]
    fn test_history_counts() {
        let attempts = vec![
            ScanAttempt::succeeded("STK-1", Some("veh_1".to_string())),
            ScanAttempt::failed("STK-2", "Network error"),
            ScanAttempt::failed("STK-3", "Scan cancelled"),
        ];
        let page = HistoryTemplate::new(&attempts, false);
        assert_eq!(page.success_count, 1);
        assert_eq!(page.failed_count, 2);
        assert!(page.render().unwrap().contains("Network error"));
    }

    #[test]
    fn test_compliant_view_renders_ok() {
        let mut v = vehicle();
        v.blacklisted = false;
        let response = render_view(
            ScanView::Compliant {
                vehicle: v,
                compliance: Compliance::default(),
            },
            None,
        );
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[test]
    fn test_unlogged_attempt_is_flagged_on_result_page() {
        let html = UnattachedTemplate {
            code: "STK-001".to_string(),
            history_error: Some("Storage error: disk full".to_string()),
        }
        .render()
        .unwrap();
        assert!(html.contains("not saved to the scan history"));
        assert!(html.contains("disk full"));

        let clean = UnattachedTemplate {
            code: "STK-001".to_string(),
            history_error: None,
        }
        .render()
        .unwrap();
        assert!(!clean.contains("not saved to the scan history"));
    }
}
