use serde::{Deserialize, Serialize};

use super::super::domain::{FraudItem, FraudReasonCode, FraudStatus};

/// Separator placed between reasons of different items or evaluation passes.
pub const FRAUD_RESULT_REASON_SEPARATOR: &str = ";";

/// Combined verdict of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateVerdict {
    pub status: FraudStatus,
    pub reason: String,
    pub reason_codes: Vec<FraudReasonCode>,
}

impl AggregateVerdict {
    pub fn from_items(items: &[FraudItem]) -> Self {
        Self {
            status: aggregate_status(items),
            reason: joined_reason(items),
            reason_codes: collected_reason_codes(items),
        }
    }
}

/// OK only when every item passes; a single KO outweighs any number of SUSPICIOUS items.
pub fn aggregate_status(items: &[FraudItem]) -> FraudStatus {
    if items.iter().all(FraudItem::is_ok) {
        FraudStatus::Ok
    } else if items.iter().any(|item| item.status == FraudStatus::Ko) {
        FraudStatus::Ko
    } else {
        FraudStatus::Suspicious
    }
}

/// Details of the failing items, in evaluation order.
pub fn joined_reason(items: &[FraudItem]) -> String {
    items
        .iter()
        .filter(|item| !item.is_ok())
        .map(|item| item.detail.as_str())
        .collect::<Vec<_>>()
        .join(&format!(" {FRAUD_RESULT_REASON_SEPARATOR} "))
}

/// Reason codes of the failing items, first occurrence wins.
pub fn collected_reason_codes(items: &[FraudItem]) -> Vec<FraudReasonCode> {
    let mut codes = Vec::new();
    for code in items
        .iter()
        .filter(|item| !item.is_ok())
        .flat_map(|item| item.reason_codes.iter().copied())
    {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

/// Appends `reason` unless it repeats the most recent segment of `existing`.
pub fn append_reason(existing: &str, reason: &str) -> String {
    let reason = reason.trim();
    let existing = existing.trim();
    if reason.is_empty() {
        return existing.to_string();
    }
    if existing.is_empty() {
        return reason.to_string();
    }

    let repeated = existing == reason
        || existing
            .strip_suffix(reason)
            .is_some_and(|head| head.trim_end().ends_with(FRAUD_RESULT_REASON_SEPARATOR));
    if repeated {
        existing.to_string()
    } else {
        format!("{existing} {FRAUD_RESULT_REASON_SEPARATOR} {reason}")
    }
}
