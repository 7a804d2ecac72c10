//! Decision for document-verification results.
//!
//! Identifications opened on the newer API are decided by their status; older ones by the
//! tri-state score and its sub-scores.

use chrono::NaiveDateTime;
use tracing::warn;

use super::super::content::{
    IdentityCheckContent, UbbleContent, UbbleIdentificationStatus, UbbleScore,
};
use super::super::domain::{EligibilityType, FraudItem, FraudReasonCode, FraudStatus};
use super::super::eligibility::age_at;
use super::super::error::FraudError;
use super::config::EvaluationConfig;

/// User-facing explanation for provider reason codes.
pub fn reason_code_message(code: FraudReasonCode) -> Option<&'static str> {
    let message = match code {
        FraudReasonCode::IdCheckDataMatch => {
            "the information on the document does not match the declared identity"
        }
        FraudReasonCode::IdCheckExpired => "the identity document is expired",
        FraudReasonCode::IdCheckNotAuthentic => "the identity document does not look authentic",
        FraudReasonCode::IdCheckNotSupported => "this type of identity document is not supported",
        FraudReasonCode::IdCheckUnprocessable => "the identity document could not be read",
        FraudReasonCode::IdCheckBlockedOther => "the identity check could not be completed",
        _ => return None,
    };
    Some(message)
}

fn describe(codes: &[FraudReasonCode]) -> String {
    let messages: Vec<&str> = codes.iter().copied().filter_map(reason_code_message).collect();
    if messages.is_empty() {
        "Identity check failed".to_string()
    } else {
        format!("Identity check failed: {}", messages.join(", "))
    }
}

fn push_unique(codes: &mut Vec<FraudReasonCode>, code: FraudReasonCode) {
    if !codes.contains(&code) {
        codes.push(code);
    }
}

/// Item for an approved identity whose age fits no program.
pub fn ineligible_item(
    content: &UbbleContent,
    config: &EvaluationConfig,
    now: NaiveDateTime,
) -> FraudItem {
    let Some(birth_date) = content.birth_date() else {
        return FraudItem::suspicious(
            "Birth date is missing from the identity check",
            FraudReasonCode::MissingRequiredData,
        );
    };

    let age = age_at(birth_date, now.date());
    let minimum = config.ubble_minimum_age(now);
    if age < minimum {
        FraudItem::ko(
            format!("User is {age} years old and must be at least {minimum} years old"),
            FraudReasonCode::AgeTooYoung,
        )
    } else if age > config.adult_age {
        FraudItem::ko(
            format!(
                "User is {age} years old and must be at most {} years old",
                config.adult_age
            ),
            FraudReasonCode::AgeTooOld,
        )
    } else {
        FraudItem::ko(
            format!("User is {age} years old and is not eligible to any program"),
            FraudReasonCode::NotEligible,
        )
    }
}

fn approved_item(
    content: &UbbleContent,
    eligibility: Option<EligibilityType>,
    config: &EvaluationConfig,
    now: NaiveDateTime,
) -> FraudItem {
    match eligibility {
        Some(eligibility) => FraudItem::ok(format!(
            "Identity approved for the {}",
            eligibility.program_name()
        )),
        None => ineligible_item(content, config, now),
    }
}

fn status_decision(
    content: &UbbleContent,
    eligibility: Option<EligibilityType>,
    config: &EvaluationConfig,
    now: NaiveDateTime,
) -> Result<FraudItem, FraudError> {
    let codes = content.reason_codes.clone();
    match content.status {
        Some(UbbleIdentificationStatus::Approved) => {
            Ok(approved_item(content, eligibility, config, now))
        }
        Some(UbbleIdentificationStatus::RetryRequired) => Ok(FraudItem::new(
            FraudStatus::Suspicious,
            describe(&codes),
            codes,
        )),
        Some(UbbleIdentificationStatus::Declined) => {
            Ok(FraudItem::new(FraudStatus::Ko, describe(&codes), codes))
        }
        Some(other) => Err(FraudError::UnhandledProviderStatus(other.label().to_string())),
        None => Err(FraudError::UnhandledProviderStatus("missing".to_string())),
    }
}

fn score_decision(
    content: &UbbleContent,
    eligibility: Option<EligibilityType>,
    config: &EvaluationConfig,
    now: NaiveDateTime,
) -> FraudItem {
    let mut codes: Vec<FraudReasonCode> = Vec::new();
    for code in &content.reason_codes {
        push_unique(&mut codes, *code);
    }

    match UbbleScore::of(content.score) {
        Some(UbbleScore::Valid) => approved_item(content, eligibility, config, now),
        Some(UbbleScore::Invalid) => {
            let sub_scores = [
                (content.reference_data_check_score, FraudReasonCode::IdCheckDataMatch),
                (content.supported, FraudReasonCode::IdCheckNotSupported),
                (content.expiry_date_score, FraudReasonCode::IdCheckExpired),
                (content.authenticity_score, FraudReasonCode::IdCheckNotAuthentic),
            ];
            let mut escalated = false;
            for (score, code) in sub_scores {
                if UbbleScore::of(score) == Some(UbbleScore::Invalid) {
                    push_unique(&mut codes, code);
                    escalated = true;
                }
            }

            if escalated {
                FraudItem::new(FraudStatus::Suspicious, describe(&codes), codes)
            } else {
                push_unique(&mut codes, FraudReasonCode::IdCheckBlockedOther);
                FraudItem::new(
                    FraudStatus::Ko,
                    format!(
                        "Identity check blocked (reference data check: {:?}, supported: {:?}, \
                         expiry date: {:?}, authenticity: {:?})",
                        content.reference_data_check_score,
                        content.supported,
                        content.expiry_date_score,
                        content.authenticity_score
                    ),
                    codes,
                )
            }
        }
        Some(UbbleScore::Undecidable) => {
            if codes.is_empty() {
                codes.push(FraudReasonCode::IdCheckUnprocessable);
            }
            FraudItem::new(FraudStatus::Suspicious, describe(&codes), codes)
        }
        None => {
            warn!(
                identification_id = content.identification_id.as_deref().unwrap_or_default(),
                score = ?content.score,
                status = ?content.status,
                "unexpected identification score"
            );
            push_unique(&mut codes, FraudReasonCode::IdCheckBlockedOther);
            FraudItem::new(
                FraudStatus::Ko,
                format!("Unexpected identification score {:?}", content.score),
                codes,
            )
        }
    }
}

/// Decision item for one identification, selecting the status or score path.
pub fn decision_item(
    content: &UbbleContent,
    eligibility: Option<EligibilityType>,
    config: &EvaluationConfig,
    now: NaiveDateTime,
) -> Result<FraudItem, FraudError> {
    if content.uses_status_decision() {
        status_decision(content, eligibility, config, now)
    } else {
        Ok(score_decision(content, eligibility, config, now))
    }
}
