use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    sticker::Sticker,
    vehicle::{Compliance, Vehicle, VerifiedScan},
};

/// What the scan screen shows. Exactly one applies per lookup or verify
/// call; switching to another takes a fresh call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScanView {
    Compliant {
        vehicle: Vehicle,
        compliance: Compliance,
    },
    /// Non-compliant, flagged or blacklisted. Reasons come from the backend.
    NonCompliant {
        vehicle: Vehicle,
        compliance: Compliance,
        reasons: Vec<String>,
    },
    Unattached { code: String },
    Counterfeit { code: String, reference_id: String },
}

impl ScanView {
    pub fn state_name(&self) -> &'static str {
        match self {
            ScanView::Compliant { .. } => "compliant",
            ScanView::NonCompliant { .. } => "non_compliant",
            ScanView::Unattached { .. } => "unattached",
            ScanView::Counterfeit { .. } => "counterfeit",
        }
    }
}

/// A call that failed outright. Distinct from a negative verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFailure {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

/// `CF-<last 6 of code>-<last 4 digits of the millisecond timestamp>`.
///
/// Only used to correlate support tickets; it is neither unique nor
/// tamper-proof.
pub fn counterfeit_reference(code: &str, at: DateTime<Utc>) -> String {
    let chars: Vec<char> = code.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(6)..].iter().collect();
    let millis = at.timestamp_millis().unsigned_abs().to_string();
    let stamp = &millis[millis.len().saturating_sub(4)..];
    format!("CF-{}-{:0>4}", tail, stamp)
}

/// View for a successful verify call. HTTP success alone is not a pass.
pub fn present_verified(scan: VerifiedScan) -> ScanView {
    if scan.passes() {
        return ScanView::Compliant {
            vehicle: scan.vehicle,
            compliance: scan.compliance,
        };
    }

    let mut reasons = scan.compliance.reasons.clone();
    if reasons.is_empty() {
        if let Some(message) = &scan.compliance.message {
            reasons.push(message.clone());
        }
    }

    ScanView::NonCompliant {
        vehicle: scan.vehicle,
        compliance: scan.compliance,
        reasons,
    }
}

/// View for a code lookup (public path, or the fallback after a failed
/// verification).
///
/// Returns `None` when the sticker is attached but no vehicle came back;
/// the caller then shows whatever it already has (a failure, or the public
/// vehicle page).
pub fn present_lookup(code: &str, sticker: Option<&Sticker>, at: DateTime<Utc>) -> Option<ScanView> {
    match sticker {
        None => Some(ScanView::Counterfeit {
            code: code.to_string(),
            reference_id: counterfeit_reference(code, at),
        }),
        Some(s) if s.deleted_at.is_some() => Some(ScanView::Counterfeit {
            code: code.to_string(),
            reference_id: counterfeit_reference(code, at),
        }),
        Some(s) if s.is_unattached() => Some(ScanView::Unattached {
            code: s.code.clone(),
        }),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn verified(json: serde_json::Value) -> VerifiedScan {
        serde_json::from_value(json).unwrap()
    }

    fn sticker(json: serde_json::Value) -> Sticker {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_reference_id_format() {
        let at = Utc.timestamp_millis_opt(1_709_287_654_321).unwrap();
        assert_eq!(counterfeit_reference("ABC123", at), "CF-ABC123-4321");
        assert_eq!(counterfeit_reference("LONGCODE-987654", at), "CF-987654-4321");
        assert_eq!(counterfeit_reference("X9", at), "CF-X9-4321");
    }

    #[test]
    fn test_reference_id_pads_short_timestamps() {
        let at = Utc.timestamp_millis_opt(42).unwrap();
        assert_eq!(counterfeit_reference("ABC123", at), "CF-ABC123-0042");
    }

    #[test]
    fn test_blacklisted_success_is_not_compliant() {
        let view = present_verified(verified(serde_json::json!({
            "vehicle": { "id": "veh_1", "plateNumber": "KJA-123-XY", "blacklisted": true }
        })));

        assert_eq!(view.state_name(), "non_compliant");
    }

    #[test]
    fn test_backend_reasons_are_passed_through() {
        let view = present_verified(verified(serde_json::json!({
            "vehicle": { "id": "veh_1", "plateNumber": "KJA-123-XY", "flagged": true },
            "compliance": {
                "status": "FLAGGED",
                "reasons": ["Reported stolen", "Levy overdue 45 days"]
            }
        })));

        match view {
            ScanView::NonCompliant { reasons, .. } => {
                assert_eq!(reasons, vec!["Reported stolen", "Levy overdue 45 days"]);
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn test_message_used_when_no_reasons() {
        let view = present_verified(verified(serde_json::json!({
            "vehicle": { "id": "veh_1", "plateNumber": "KJA-123-XY" },
            "compliance": { "status": "NON_COMPLIANT", "message": "Payment due" }
        })));

        match view {
            ScanView::NonCompliant { reasons, .. } => assert_eq!(reasons, vec!["Payment due"]),
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn test_clean_vehicle_is_compliant() {
        let view = present_verified(verified(serde_json::json!({
            "vehicle": { "id": "veh_1", "plateNumber": "KJA-123-XY" },
            "compliance": { "status": "COMPLIANT" }
        })));

        assert_eq!(view.state_name(), "compliant");
    }

    #[test]
    fn test_unknown_code_is_counterfeit() {
        let view = present_lookup("ABC123", None, Utc::now()).unwrap();
        match view {
            ScanView::Counterfeit { reference_id, .. } => {
                assert!(reference_id.starts_with("CF-ABC123-"));
                let digits = reference_id.trim_start_matches("CF-ABC123-");
                assert_eq!(digits.len(), 4);
                assert!(digits.chars().all(|c| c.is_ascii_digit()));
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn test_unlinked_sticker_is_unattached() {
        let s = sticker(serde_json::json!({ "code": "STK-001", "vehicleId": null }));
        let view = present_lookup("STK-001", Some(&s), Utc::now()).unwrap();
        assert_eq!(
            view,
            ScanView::Unattached {
                code: "STK-001".to_string()
            }
        );
    }

    #[test]
    fn test_attached_sticker_has_no_lookup_view() {
        let s = sticker(serde_json::json!({ "code": "STK-002", "vehicleId": "veh_3" }));
        assert!(present_lookup("STK-002", Some(&s), Utc::now()).is_none());
    }

    #[test]
    fn test_used_sticker_is_not_offered_for_attach() {
        // Attach refuses a used sticker, so it must not read as unattached
        let s = sticker(serde_json::json!({
            "code": "STK-004",
            "vehicleId": null,
            "isUsed": true
        }));
        assert!(present_lookup("STK-004", Some(&s), Utc::now()).is_none());
    }

    #[test]
    fn test_deleted_sticker_is_treated_as_unknown() {
        let s = sticker(serde_json::json!({
            "code": "STK-005",
            "deletedAt": "2024-01-10T09:00:00Z"
        }));
        let view = present_lookup("STK-005", Some(&s), Utc::now()).unwrap();
        assert_eq!(view.state_name(), "counterfeit");
    }
}
