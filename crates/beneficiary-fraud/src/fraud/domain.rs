use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for platform users (applicants, beneficiaries and staff reviewers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for identity-check attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FraudCheckId(pub u64);

impl fmt::Display for FraudCheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credit program a user is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EligibilityType {
    Underage,
    Age18,
}

impl EligibilityType {
    pub const fn label(self) -> &'static str {
        match self {
            EligibilityType::Underage => "UNDERAGE",
            EligibilityType::Age18 => "AGE18",
        }
    }

    pub const fn program_name(self) -> &'static str {
        match self {
            EligibilityType::Underage => "15-17 program",
            EligibilityType::Age18 => "18 program",
        }
    }
}

/// One value per identity-check source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudCheckType {
    /// Legacy document-scan provider.
    Jouve,
    /// Manual document procedure.
    Dms,
    /// Document-verification service.
    Ubble,
    /// Government education identity federation.
    Educonnect,
    UserProfiling,
    PhoneValidation,
    ProfileCompletion,
    HonorStatement,
    InternalReview,
}

/// Check types able to establish the legal identity of a user.
pub const IDENTITY_CHECK_TYPES: [FraudCheckType; 4] = [
    FraudCheckType::Jouve,
    FraudCheckType::Dms,
    FraudCheckType::Ubble,
    FraudCheckType::Educonnect,
];

impl FraudCheckType {
    pub fn is_identity_check(self) -> bool {
        IDENTITY_CHECK_TYPES.contains(&self)
    }

    pub const fn label(self) -> &'static str {
        match self {
            FraudCheckType::Jouve => "JOUVE",
            FraudCheckType::Dms => "DMS",
            FraudCheckType::Ubble => "UBBLE",
            FraudCheckType::Educonnect => "EDUCONNECT",
            FraudCheckType::UserProfiling => "USER_PROFILING",
            FraudCheckType::PhoneValidation => "PHONE_VALIDATION",
            FraudCheckType::ProfileCompletion => "PROFILE_COMPLETION",
            FraudCheckType::HonorStatement => "HONOR_STATEMENT",
            FraudCheckType::InternalReview => "INTERNAL_REVIEW",
        }
    }
}

impl fmt::Display for FraudCheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a single identity-check attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudCheckStatus {
    Pending,
    Ok,
    Ko,
    Suspicious,
    Canceled,
}

impl FraudCheckStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, FraudCheckStatus::Pending)
    }
}

/// Verdict carried by fraud items and cumulative fraud results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudStatus {
    Ok,
    Ko,
    Suspicious,
    SubscriptionOnHold,
}

impl FraudStatus {
    pub const fn label(self) -> &'static str {
        match self {
            FraudStatus::Ok => "OK",
            FraudStatus::Ko => "KO",
            FraudStatus::Suspicious => "SUSPICIOUS",
            FraudStatus::SubscriptionOnHold => "SUBSCRIPTION_ON_HOLD",
        }
    }

    /// Check-level equivalent of an item verdict.
    pub const fn check_status(self) -> FraudCheckStatus {
        match self {
            FraudStatus::Ok => FraudCheckStatus::Ok,
            FraudStatus::Ko => FraudCheckStatus::Ko,
            FraudStatus::Suspicious | FraudStatus::SubscriptionOnHold => {
                FraudCheckStatus::Suspicious
            }
        }
    }
}

impl fmt::Display for FraudStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejection and suspicion causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudReasonCode {
    AgeNotValid,
    AgeTooOld,
    AgeTooYoung,
    AlreadyBeneficiary,
    AlreadyHasActiveDeposit,
    BlacklistedPhoneNumber,
    DuplicateIdPieceNumber,
    DuplicateIne,
    DuplicateUser,
    EmailNotValidated,
    EmptyIdPieceNumber,
    IdCheckBlockedOther,
    IdCheckDataMatch,
    IdCheckExpired,
    IdCheckInvalid,
    IdCheckNotAuthentic,
    IdCheckNotSupported,
    IdCheckUnprocessable,
    IneNotWhitelisted,
    InvalidIdPieceNumber,
    InvalidPhoneCountryCode,
    MissingRequiredData,
    NameIncorrect,
    NotEligible,
    PhoneAlreadyExists,
    PhoneNotValidated,
    PhoneValidationAttemptsLimitReached,
    SmsSendingLimitReached,
}

/// One atomic verdict produced by a single evaluator. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudItem {
    pub status: FraudStatus,
    pub detail: String,
    #[serde(default)]
    pub reason_codes: Vec<FraudReasonCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_user_id: Option<UserId>,
}

impl FraudItem {
    pub fn new(
        status: FraudStatus,
        detail: impl Into<String>,
        reason_codes: Vec<FraudReasonCode>,
    ) -> Self {
        Self {
            status,
            detail: detail.into(),
            reason_codes,
            duplicate_user_id: None,
        }
    }

    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            status: FraudStatus::Ok,
            detail: detail.into(),
            reason_codes: Vec::new(),
            duplicate_user_id: None,
        }
    }

    pub fn suspicious(detail: impl Into<String>, code: FraudReasonCode) -> Self {
        Self {
            status: FraudStatus::Suspicious,
            detail: detail.into(),
            reason_codes: vec![code],
            duplicate_user_id: None,
        }
    }

    pub fn ko(detail: impl Into<String>, code: FraudReasonCode) -> Self {
        Self {
            status: FraudStatus::Ko,
            detail: detail.into(),
            reason_codes: vec![code],
            duplicate_user_id: None,
        }
    }

    pub(crate) fn with_duplicate(mut self, user_id: UserId) -> Self {
        self.duplicate_user_id = Some(user_id);
        self
    }

    /// An item passes only when its status is OK.
    pub fn is_ok(&self) -> bool {
        self.status == FraudStatus::Ok
    }
}

/// Persisted identity-check attempt, one per (user, type, third-party id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudCheckRecord {
    pub id: FraudCheckId,
    pub user_id: UserId,
    pub check_type: FraudCheckType,
    pub third_party_id: String,
    #[serde(default)]
    pub result_content: Option<serde_json::Value>,
    pub status: FraudCheckStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reason_codes: Vec<FraudReasonCode>,
    #[serde(default)]
    pub eligibility: Option<EligibilityType>,
    pub created_at: NaiveDateTime,
}

impl FraudCheckRecord {
    /// Builds a record that still needs an identifier from the repository.
    pub fn new(
        user_id: UserId,
        check_type: FraudCheckType,
        third_party_id: impl Into<String>,
        status: FraudCheckStatus,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: FraudCheckId(0),
            user_id,
            check_type,
            third_party_id: third_party_id.into(),
            result_content: None,
            status,
            reason: None,
            reason_codes: Vec::new(),
            eligibility: None,
            created_at,
        }
    }

    pub fn reference(&self) -> FraudCheckReference {
        FraudCheckReference {
            check_id: self.id,
            check_type: self.check_type,
            third_party_id: self.third_party_id.clone(),
        }
    }
}

/// Reference to the check a beneficiary activation originates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudCheckReference {
    pub check_id: FraudCheckId,
    pub check_type: FraudCheckType,
    pub third_party_id: String,
}

/// Cumulative, user-facing verdict for one eligibility window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudResultRecord {
    pub user_id: UserId,
    pub status: FraudStatus,
    pub reason: String,
    #[serde(default)]
    pub reason_codes: Vec<FraudReasonCode>,
    #[serde(default)]
    pub eligibility: Option<EligibilityType>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Decision taken by a staff reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudReviewStatus {
    Ok,
    RedirectedToDms,
    Ko,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudReviewRecord {
    pub user_id: UserId,
    pub author_id: UserId,
    pub review: FraudReviewStatus,
    pub reason: Option<String>,
    pub eligibility: Option<EligibilityType>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    UnderageBeneficiary,
    Beneficiary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositType {
    Grant15_17,
    Grant18,
}

/// Credit granted to a beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub deposit_type: DepositType,
    #[serde(default)]
    pub expiration_date: Option<NaiveDateTime>,
}

/// Snapshot of the user fields the fraud pipeline reads and updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub married_name: Option<String>,
    #[serde(default)]
    pub civility: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub validated_birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub id_piece_number: Option<String>,
    #[serde(default)]
    pub ine_hash: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub is_email_validated: bool,
    #[serde(default)]
    pub is_phone_validated: bool,
    #[serde(default)]
    pub roles: Vec<UserRole>,
    #[serde(default)]
    pub deposit: Option<Deposit>,
}

impl UserAccount {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            first_name: None,
            last_name: None,
            married_name: None,
            civility: None,
            birth_date: None,
            validated_birth_date: None,
            id_piece_number: None,
            ine_hash: None,
            phone_number: None,
            address: None,
            postal_code: None,
            city: None,
            is_email_validated: false,
            is_phone_validated: false,
            roles: Vec::new(),
            deposit: None,
        }
    }

    pub fn is_beneficiary(&self) -> bool {
        !self.roles.is_empty()
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    /// Birth date used for eligibility: the validated one wins over the declared one.
    pub fn eligibility_birth_date(&self) -> Option<NaiveDate> {
        self.validated_birth_date.or(self.birth_date)
    }

    pub fn has_active_deposit(&self, now: NaiveDateTime) -> bool {
        self.deposit.as_ref().is_some_and(|deposit| {
            deposit
                .expiration_date
                .map_or(true, |expiration| expiration > now)
        })
    }
    pub fn has_deposit_type(&self, deposit_type: DepositType) -> bool {
        self.deposit
            .as_ref()
            .is_some_and(|deposit| deposit.deposit_type == deposit_type)
    }
}
