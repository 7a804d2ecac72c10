use axum::http::StatusCode;

use super::content::ContentError;
use super::domain::{EligibilityType, FraudCheckId, FraudCheckType, FraudStatus, UserId};
use super::repository::{ActivationError, GatewayError, RepositoryError};

/// Failures while resolving or granting an eligibility program.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("no eligibility program could be determined for the user")]
    Undetermined,
    #[error("the eligibility type is not valid for this user")]
    InvalidEligibilityType(#[source] ActivationError),
    #[error("the user age does not match the {}", .eligibility.program_name())]
    InvalidAge {
        eligibility: EligibilityType,
        #[source]
        source: ActivationError,
    },
    #[error("the user role cannot be upgraded")]
    CannotUpgradeRole(#[source] ActivationError),
    #[error("the user already received a deposit for the {}", .eligibility.program_name())]
    DepositAlreadyGranted {
        eligibility: EligibilityType,
        #[source]
        source: ActivationError,
    },
}

/// Invariant violations and operator errors raised by the fraud pipeline.
#[derive(Debug, thiserror::Error)]
pub enum FraudError {
    #[error("a {check_type} check with third party id {third_party_id} was already started")]
    AlreadyStarted {
        check_type: FraudCheckType,
        third_party_id: String,
    },
    #[error("fraud result of user {user_id} is OK and cannot be downgraded to {status}")]
    CannotBeDowngraded {
        user_id: UserId,
        status: FraudStatus,
    },
    #[error("feature {0} is disabled")]
    FeatureDisabled(&'static str),
    #[error("check type {0} is not supported here")]
    UnsupportedCheckType(FraudCheckType),
    #[error("unhandled identification status {0}")]
    UnhandledProviderStatus(String),
    #[error("no identity check was performed for user {0}")]
    NoIdentityCheckPerformed(UserId),
    #[error("id piece number already used by user {0}")]
    DuplicateIdPieceNumber(UserId),
    #[error("INE already used by user {0}")]
    DuplicateIne(UserId),
    #[error("a reason is required for a {0} fraud result")]
    MissingReason(FraudStatus),
    #[error("check {0} is no longer pending")]
    CheckNotPending(FraudCheckId),
    #[error("check {0} not found")]
    CheckNotFound(FraudCheckId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Activation(#[from] ActivationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for FraudError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Conflict {
                check_type,
                third_party_id,
            } => FraudError::AlreadyStarted {
                check_type,
                third_party_id,
            },
            other => FraudError::Repository(other),
        }
    }
}

impl FraudError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FraudError::AlreadyStarted { .. }
            | FraudError::CannotBeDowngraded { .. }
            | FraudError::DuplicateIdPieceNumber(_)
            | FraudError::DuplicateIne(_) => StatusCode::CONFLICT,
            FraudError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            FraudError::CheckNotFound(_) | FraudError::UserNotFound(_) => StatusCode::NOT_FOUND,
            FraudError::NoIdentityCheckPerformed(_)
            | FraudError::MissingReason(_)
            | FraudError::CheckNotPending(_)
            | FraudError::Eligibility(_)
            | FraudError::Content(_)
            | FraudError::UnsupportedCheckType(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FraudError::UnhandledProviderStatus(_)
            | FraudError::Activation(_)
            | FraudError::Gateway(_)
            | FraudError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
