//! State transitions of check and result records, kept free of persistence.

use chrono::NaiveDateTime;

use super::domain::{
    EligibilityType, FraudCheckRecord, FraudCheckStatus, FraudReasonCode, FraudResultRecord,
    FraudStatus, UserId,
};
use super::error::FraudError;
use super::evaluation::{append_reason, AggregateVerdict};

/// Writes an aggregated verdict onto the evaluated check.
pub fn apply_verdict(
    check: &mut FraudCheckRecord,
    verdict: &AggregateVerdict,
    eligibility: Option<EligibilityType>,
) {
    check.status = verdict.status.check_status();
    check.reason = (!verdict.reason.is_empty()).then(|| verdict.reason.clone());
    check.reason_codes = verdict.reason_codes.clone();
    if eligibility.is_some() {
        check.eligibility = eligibility;
    }
}

/// Forces a check to KO with the supplied causes, without running the battery.
pub fn mark_failed(
    check: &mut FraudCheckRecord,
    reason_codes: Vec<FraudReasonCode>,
    reason: Option<String>,
) {
    check.status = FraudCheckStatus::Ko;
    check.reason_codes = reason_codes;
    check.reason = reason;
}

pub fn cancel(check: &mut FraudCheckRecord) -> Result<(), FraudError> {
    if check.status != FraudCheckStatus::Pending {
        return Err(FraudError::CheckNotPending(check.id));
    }
    check.status = FraudCheckStatus::Canceled;
    Ok(())
}

/// Requested change of the cumulative result for one (user, eligibility) pair.
#[derive(Debug, Clone)]
pub struct ResultUpdate {
    pub user_id: UserId,
    pub eligibility: Option<EligibilityType>,
    pub status: FraudStatus,
    pub reason: String,
    pub reason_codes: Vec<FraudReasonCode>,
    /// Only the override path may move an OK result to a worse status.
    pub allow_downgrade: bool,
}

/// Next state of a fraud result.
///
/// A fresh result takes any status. An existing OK result refuses a worse status unless the
/// update allows downgrades. Reasons accumulate without repeating the latest one.
pub fn next_result(
    current: Option<&FraudResultRecord>,
    update: ResultUpdate,
    now: NaiveDateTime,
) -> Result<FraudResultRecord, FraudError> {
    let Some(current) = current else {
        return Ok(FraudResultRecord {
            user_id: update.user_id,
            status: update.status,
            reason: update.reason.trim().to_string(),
            reason_codes: update.reason_codes,
            eligibility: update.eligibility,
            created_at: now,
            updated_at: now,
        });
    };

    let downgrade = current.status == FraudStatus::Ok && update.status != FraudStatus::Ok;
    if downgrade && !update.allow_downgrade {
        return Err(FraudError::CannotBeDowngraded {
            user_id: current.user_id,
            status: update.status,
        });
    }

    Ok(FraudResultRecord {
        status: update.status,
        reason: append_reason(&current.reason, &update.reason),
        reason_codes: update.reason_codes,
        updated_at: now,
        ..current.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraud::domain::{FraudCheckId, FraudCheckType};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 5, 1)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .expect("valid datetime")
    }

    fn update(status: FraudStatus, reason: &str) -> ResultUpdate {
        ResultUpdate {
            user_id: UserId(7),
            eligibility: Some(EligibilityType::Age18),
            status,
            reason: reason.to_string(),
            reason_codes: Vec::new(),
            allow_downgrade: false,
        }
    }

    #[test]
    fn ok_results_refuse_silent_downgrades() {
        let ok = next_result(None, update(FraudStatus::Ok, ""), now()).expect("created");
        match next_result(Some(&ok), update(FraudStatus::Suspicious, "late duplicate"), now()) {
            Err(FraudError::CannotBeDowngraded { user_id, status }) => {
                assert_eq!(user_id, UserId(7));
                assert_eq!(status, FraudStatus::Suspicious);
            }
            other => panic!("expected downgrade refusal, got {other:?}"),
        }

        let overridden = next_result(
            Some(&ok),
            ResultUpdate {
                allow_downgrade: true,
                ..update(FraudStatus::Ko, "manual rejection")
            },
            now(),
        )
        .expect("override path may downgrade");
        assert_eq!(overridden.status, FraudStatus::Ko);
    }

    #[test]
    fn non_ok_results_move_freely_and_keep_history() {
        let ko = next_result(None, update(FraudStatus::Ko, "email not validated"), now())
            .expect("created");
        let suspicious = next_result(Some(&ko), update(FraudStatus::Suspicious, "duplicate"), now())
            .expect("updated");
        assert_eq!(suspicious.reason, "email not validated ; duplicate");

        let repeated = next_result(
            Some(&suspicious),
            update(FraudStatus::Suspicious, "duplicate"),
            now(),
        )
        .expect("updated");
        assert_eq!(repeated.reason, "email not validated ; duplicate");

        let ok = next_result(Some(&repeated), update(FraudStatus::Ok, ""), now()).expect("upgraded");
        assert_eq!(ok.status, FraudStatus::Ok);
        assert_eq!(ok.reason, "email not validated ; duplicate");
        assert_eq!(ok.created_at, ko.created_at);
    }

    #[test]
    fn only_pending_checks_can_be_canceled() {
        let mut check = FraudCheckRecord::new(
            UserId(1),
            FraudCheckType::Ubble,
            "idv_1",
            FraudCheckStatus::Pending,
            now(),
        );
        check.id = FraudCheckId(3);
        cancel(&mut check).expect("pending check cancels");
        assert_eq!(check.status, FraudCheckStatus::Canceled);

        match cancel(&mut check) {
            Err(FraudError::CheckNotPending(FraudCheckId(3))) => {}
            other => panic!("expected not pending error, got {other:?}"),
        }
    }
}
