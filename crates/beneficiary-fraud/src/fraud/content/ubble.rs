use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::parsers::{deserialize_date, deserialize_datetime, deserialize_score};
use super::IdentityCheckContent;
use crate::fraud::domain::FraudReasonCode;

/// Identifications opened on the newer API carry this prefix and are decided by status.
const STATUS_DECISION_PREFIX: &str = "idv_";

/// Tri-state score returned by the document-verification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UbbleScore {
    Valid,
    Invalid,
    Undecidable,
}

impl UbbleScore {
    pub fn from_value(value: f64) -> Option<Self> {
        if value == 1.0 {
            Some(UbbleScore::Valid)
        } else if value == 0.0 {
            Some(UbbleScore::Invalid)
        } else if value == -1.0 {
            Some(UbbleScore::Undecidable)
        } else {
            None
        }
    }

    pub fn of(value: Option<f64>) -> Option<Self> {
        value.and_then(Self::from_value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UbbleIdentificationStatus {
    Uninitiated,
    Initiated,
    Processing,
    Processed,
    Aborted,
    Expired,
    Pending,
    CaptureInProgress,
    ChecksInProgress,
    Approved,
    RetryRequired,
    Declined,
    Inconclusive,
    Refused,
}

impl UbbleIdentificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            UbbleIdentificationStatus::Uninitiated => "uninitiated",
            UbbleIdentificationStatus::Initiated => "initiated",
            UbbleIdentificationStatus::Processing => "processing",
            UbbleIdentificationStatus::Processed => "processed",
            UbbleIdentificationStatus::Aborted => "aborted",
            UbbleIdentificationStatus::Expired => "expired",
            UbbleIdentificationStatus::Pending => "pending",
            UbbleIdentificationStatus::CaptureInProgress => "capture_in_progress",
            UbbleIdentificationStatus::ChecksInProgress => "checks_in_progress",
            UbbleIdentificationStatus::Approved => "approved",
            UbbleIdentificationStatus::RetryRequired => "retry_required",
            UbbleIdentificationStatus::Declined => "declined",
            UbbleIdentificationStatus::Inconclusive => "inconclusive",
            UbbleIdentificationStatus::Refused => "refused",
        }
    }
}

/// Result of one document or face sub-check, kept for audit only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UbbleSubCheck {
    pub kind: String,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Normalised document-verification result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UbbleContent {
    #[serde(default)]
    pub identification_id: Option<String>,
    #[serde(default)]
    pub identification_url: Option<String>,
    #[serde(default)]
    pub status: Option<UbbleIdentificationStatus>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub reference_data_check_score: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub supported: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub expiry_date_score: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub authenticity_score: Option<f64>,
    #[serde(default)]
    pub reason_codes: Vec<FraudReasonCode>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub married_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub id_document_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub registration_datetime: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub processed_datetime: Option<NaiveDateTime>,
    #[serde(default)]
    pub included_checks: Vec<UbbleSubCheck>,
}

impl UbbleContent {
    /// Whether the identification is decided by its status rather than its score.
    pub fn uses_status_decision(&self) -> bool {
        self.identification_id
            .as_deref()
            .is_some_and(|id| id.starts_with(STATUS_DECISION_PREFIX))
    }
}

impl IdentityCheckContent for UbbleContent {
    fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    fn married_name(&self) -> Option<&str> {
        self.married_name.as_deref()
    }

    fn civility(&self) -> Option<&str> {
        self.gender.as_deref()
    }

    fn id_piece_number(&self) -> Option<&str> {
        self.id_document_number.as_deref()
    }

    fn registration_datetime(&self) -> Option<NaiveDateTime> {
        self.registration_datetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_sentinels_are_three_way() {
        assert_eq!(UbbleScore::of(Some(1.0)), Some(UbbleScore::Valid));
        assert_eq!(UbbleScore::of(Some(0.0)), Some(UbbleScore::Invalid));
        assert_eq!(UbbleScore::of(Some(-1.0)), Some(UbbleScore::Undecidable));
        assert_eq!(UbbleScore::of(Some(0.5)), None);
        assert_eq!(UbbleScore::of(None), None);
    }

    #[test]
    fn parses_string_scores_and_prefixed_ids() {
        let content: UbbleContent = serde_json::from_value(json!({
            "identification_id": "idv_01h",
            "status": "retry_required",
            "score": "-1.0",
            "birth_date": "2004-05-01",
            "reason_codes": ["ID_CHECK_EXPIRED"],
            "included_checks": [{"kind": "face-check", "score": 1.0}],
        }))
        .expect("payload parses");

        assert!(content.uses_status_decision());
        assert_eq!(content.score, Some(-1.0));
        assert_eq!(content.status, Some(UbbleIdentificationStatus::RetryRequired));
        assert_eq!(content.reason_codes, vec![FraudReasonCode::IdCheckExpired]);
        assert_eq!(content.included_checks.len(), 1);
    }
}
