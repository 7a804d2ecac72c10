use chrono::NaiveDate;

use super::domain::{
    EligibilityType, FraudCheckId, FraudCheckRecord, FraudCheckReference, FraudCheckType,
    FraudResultRecord, FraudReviewRecord, UserAccount, UserId,
};

/// Storage abstraction for checks, results, reviews and the user directory.
pub trait FraudRepository: Send + Sync {
    /// Stores a check and assigns its identifier.
    fn insert_check(&self, record: FraudCheckRecord) -> Result<FraudCheckRecord, RepositoryError>;

    /// Same as [`FraudRepository::insert_check`] but atomically refuses a second record for
    /// the same user, type and third-party id with [`RepositoryError::Conflict`].
    fn insert_unique_check(
        &self,
        record: FraudCheckRecord,
    ) -> Result<FraudCheckRecord, RepositoryError>;

    fn update_check(&self, record: &FraudCheckRecord) -> Result<(), RepositoryError>;
    fn get_check(&self, id: FraudCheckId) -> Result<Option<FraudCheckRecord>, RepositoryError>;
    fn find_check(
        &self,
        user_id: UserId,
        check_type: FraudCheckType,
        third_party_id: &str,
    ) -> Result<Option<FraudCheckRecord>, RepositoryError>;
    /// Checks of a user, oldest first.
    fn checks_for_user(&self, user_id: UserId) -> Result<Vec<FraudCheckRecord>, RepositoryError>;

    fn current_result(
        &self,
        user_id: UserId,
        eligibility: Option<EligibilityType>,
    ) -> Result<Option<FraudResultRecord>, RepositoryError>;
    /// Creates or replaces the result for the record's (user, eligibility) pair.
    fn save_result(&self, record: FraudResultRecord) -> Result<(), RepositoryError>;
    fn results_for_user(&self, user_id: UserId)
        -> Result<Vec<FraudResultRecord>, RepositoryError>;

    fn insert_review(&self, record: FraudReviewRecord) -> Result<(), RepositoryError>;
    fn reviews_for_user(&self, user_id: UserId)
        -> Result<Vec<FraudReviewRecord>, RepositoryError>;

    fn user(&self, user_id: UserId) -> Result<Option<UserAccount>, RepositoryError>;
    fn save_user(&self, user: UserAccount) -> Result<(), RepositoryError>;

    /// Confirmed beneficiaries born on `birth_date`, other than `excluded`.
    fn beneficiaries_born_on(
        &self,
        birth_date: NaiveDate,
        excluded: UserId,
    ) -> Result<Vec<UserAccount>, RepositoryError>;
    /// Another user whose id piece number is `normalized` once whitespace is removed.
    fn user_by_id_piece_number(
        &self,
        normalized: &str,
        excluded: UserId,
    ) -> Result<Option<UserId>, RepositoryError>;
    fn user_by_ine_hash(
        &self,
        ine_hash: &str,
        excluded: UserId,
    ) -> Result<Option<UserId>, RepositoryError>;
    fn is_ine_whitelisted(&self, ine_hash: &str) -> Result<bool, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("a {check_type} check with third party id {third_party_id} already exists")]
    Conflict {
        check_type: FraudCheckType,
        third_party_id: String,
    },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Template of the transactional email sent when a document could not be read.
pub const UNREAD_DOCUMENT_EMAIL: &str = "unread-document";

/// Comment attached to accounts suspended as suspected duplicates.
pub const DUPLICATE_SUSPENSION_COMMENT: &str = "Account automatically suspended on duplicate suspicion";

/// Outbound subscription hooks: activation, messaging states and emails.
pub trait SubscriptionGateway: Send + Sync {
    fn activate_beneficiary(
        &self,
        user: &UserAccount,
        source: &FraudCheckReference,
        eligibility: EligibilityType,
    ) -> Result<(), ActivationError>;
    fn on_journey_stopped(&self, user_id: UserId) -> Result<(), GatewayError>;
    fn on_redirected_to_dms(&self, user_id: UserId) -> Result<(), GatewayError>;
    fn on_review_rejected(&self, user_id: UserId) -> Result<(), GatewayError>;
    fn send_document_error_email(&self, email: &str, template: &str) -> Result<(), GatewayError>;
    /// Suspends an account on fraud suspicion.
    fn suspend_account(&self, user_id: UserId, comment: &str) -> Result<(), GatewayError>;
    /// Tells the fraud team that `user` duplicates `duplicate`.
    fn send_duplicate_fraud_email(
        &self,
        user: &UserAccount,
        duplicate: &UserAccount,
    ) -> Result<(), GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("subscription gateway unavailable: {0}")]
    Transport(String),
}

/// Reasons the subscription layer may refuse an activation.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("invalid eligibility type {0:?}")]
    InvalidEligibilityType(EligibilityType),
    #[error("invalid age for eligibility {0:?}")]
    InvalidAgeForEligibility(EligibilityType),
    #[error("role cannot be upgraded")]
    CannotUpgradeRole,
    #[error("deposit of type {0:?} already granted")]
    DepositTypeAlreadyGranted(EligibilityType),
    #[error("activation unavailable: {0}")]
    Unavailable(String),
}
