use super::super::content::JouveContent;
use super::super::domain::{FraudItem, FraudReasonCode};
use super::config::EvaluationConfig;

/// A control field passes unless the scan explicitly flagged it.
fn control_item(value: Option<&str>, field: &str) -> FraudItem {
    let flagged = value.is_some_and(|value| value.trim().eq_ignore_ascii_case("KO"));
    if flagged {
        FraudItem::suspicious(
            format!("Field {field} is KO"),
            FraudReasonCode::IdCheckInvalid,
        )
    } else {
        FraudItem::ok(format!("Field {field} is {}", value.unwrap_or("empty")))
    }
}

/// A level field passes only with a readable score at or above the threshold.
fn level_item(value: Option<i64>, field: &str, threshold: i64) -> FraudItem {
    match value {
        Some(level) if level >= threshold => {
            FraudItem::ok(format!("Field {field} has score {level}"))
        }
        Some(level) => FraudItem::suspicious(
            format!("Field {field} has score {level} (minimum {threshold})"),
            FraudReasonCode::IdCheckInvalid,
        ),
        None => FraudItem::suspicious(
            format!("Field {field} has no score (minimum {threshold})"),
            FraudReasonCode::IdCheckInvalid,
        ),
    }
}

/// Scan controls, only run when the legacy controls are switched on.
pub fn id_check_items(content: &JouveContent, config: &EvaluationConfig) -> Vec<FraudItem> {
    if !config.flags.enable_idcheck_fraud_controls {
        return Vec::new();
    }

    let thresholds = &config.jouve;
    vec![
        control_item(content.birth_location_ctrl.as_deref(), "birthLocationCtrl"),
        control_item(content.body_birth_date_ctrl.as_deref(), "bodyBirthDateCtrl"),
        control_item(content.body_name_ctrl.as_deref(), "bodyNameCtrl"),
        control_item(content.body_piece_number_ctrl.as_deref(), "bodyPieceNumberCtrl"),
        level_item(
            content.body_birth_date_level,
            "bodyBirthDateLevel",
            thresholds.body_birth_date_level,
        ),
        level_item(content.body_name_level, "bodyNameLevel", thresholds.body_name_level),
        level_item(
            content.body_piece_number_level,
            "bodyPieceNumberLevel",
            thresholds.body_piece_number_level,
        ),
    ]
}
