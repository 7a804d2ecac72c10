use super::super::content::UserProfilingRiskRating;
use super::super::domain::{FraudCheckStatus, FraudStatus};

/// Journey-level verdict for a profiling risk rating.
pub const fn risk_fraud_status(rating: UserProfilingRiskRating) -> FraudStatus {
    match rating {
        UserProfilingRiskRating::Trusted
        | UserProfilingRiskRating::Neutral
        | UserProfilingRiskRating::Low => FraudStatus::Ok,
        UserProfilingRiskRating::Medium => FraudStatus::Suspicious,
        UserProfilingRiskRating::High => FraudStatus::Ko,
    }
}

/// Status stored on the profiling check itself. Kept separate from
/// [`risk_fraud_status`]: the check may pass while the journey is stopped.
pub const fn risk_check_status(rating: UserProfilingRiskRating) -> FraudCheckStatus {
    match rating {
        UserProfilingRiskRating::Trusted
        | UserProfilingRiskRating::Neutral
        | UserProfilingRiskRating::Low => FraudCheckStatus::Ok,
        UserProfilingRiskRating::Medium => FraudCheckStatus::Suspicious,
        UserProfilingRiskRating::High => FraudCheckStatus::Ko,
    }
}
