use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::clock::{Clock, SystemClock};
use super::content::{
    CheckContent, ContentError, IdentityCheckContent, IdentityContent, PhoneValidationContent,
    ProfileCompletionContent, UserProfilingContent, UserProfilingRiskRating,
};
use super::domain::{
    DepositType, EligibilityType, FraudCheckId, FraudCheckRecord, FraudCheckStatus, FraudCheckType,
    FraudItem, FraudReasonCode, FraudResultRecord, FraudStatus, UserAccount, UserId, UserRole,
};
use super::eligibility::{decide_eligibility, DefaultEligibilityCalculator, EligibilityCalculator};
use super::error::FraudError;
use super::evaluation::{
    append_reason, find_duplicate_beneficiary, risk_check_status, risk_fraud_status,
    AggregateVerdict, EvaluationConfig, EvaluationContext, LatinNameValidator, NameValidator,
    PersonQuery,
};
use super::lifecycle::{self, ResultUpdate};
use super::repository::{
    FraudRepository, RepositoryError, SubscriptionGateway, DUPLICATE_SUSPENSION_COMMENT,
};

/// Outcome of evaluating one identity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckVerdict {
    pub check: FraudCheckRecord,
    pub items: Vec<FraudItem>,
    pub result: FraudResultRecord,
}

/// Ways a phone validation attempt can fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhoneValidationFailure {
    AlreadyExists {
        phone_number: String,
        existing_user: UserId,
    },
    Blacklisted {
        phone_number: String,
    },
    InvalidCountryCode {
        phone_number: String,
    },
    SmsSendingLimitReached,
    AttemptsLimitReached {
        attempts: u32,
    },
}

impl PhoneValidationFailure {
    fn reason_code(&self) -> FraudReasonCode {
        match self {
            PhoneValidationFailure::AlreadyExists { .. } => FraudReasonCode::PhoneAlreadyExists,
            PhoneValidationFailure::Blacklisted { .. } => FraudReasonCode::BlacklistedPhoneNumber,
            PhoneValidationFailure::InvalidCountryCode { .. } => {
                FraudReasonCode::InvalidPhoneCountryCode
            }
            PhoneValidationFailure::SmsSendingLimitReached => {
                FraudReasonCode::SmsSendingLimitReached
            }
            PhoneValidationFailure::AttemptsLimitReached { .. } => {
                FraudReasonCode::PhoneValidationAttemptsLimitReached
            }
        }
    }

    fn reason(&self) -> String {
        match self {
            PhoneValidationFailure::AlreadyExists { existing_user, .. } => {
                format!("Phone number is already used by user {existing_user}")
            }
            PhoneValidationFailure::Blacklisted { .. } => "Phone number is blacklisted".to_string(),
            PhoneValidationFailure::InvalidCountryCode { .. } => {
                "Phone number country code is not accepted".to_string()
            }
            PhoneValidationFailure::SmsSendingLimitReached => {
                "Maximum number of sent SMS reached".to_string()
            }
            PhoneValidationFailure::AttemptsLimitReached { attempts } => {
                format!("Maximum number of validation attempts reached: {attempts}")
            }
        }
    }

    fn phone_number<'a>(&'a self, user: &'a UserAccount) -> Option<&'a str> {
        match self {
            PhoneValidationFailure::AlreadyExists { phone_number, .. }
            | PhoneValidationFailure::Blacklisted { phone_number }
            | PhoneValidationFailure::InvalidCountryCode { phone_number } => Some(phone_number),
            PhoneValidationFailure::SmsSendingLimitReached
            | PhoneValidationFailure::AttemptsLimitReached { .. } => user.phone_number.as_deref(),
        }
    }

    /// Limits flag the whole journey, not only the phone step.
    fn flags_journey(&self) -> bool {
        matches!(
            self,
            PhoneValidationFailure::SmsSendingLimitReached
                | PhoneValidationFailure::AttemptsLimitReached { .. }
        )
    }
}

/// Facade over the evaluators, lifecycles and collaborators.
pub struct FraudService<R, G> {
    pub(crate) repository: Arc<R>,
    pub(crate) gateway: Arc<G>,
    pub(crate) config: Arc<EvaluationConfig>,
    calculator: Arc<dyn EligibilityCalculator>,
    names: Arc<dyn NameValidator>,
    clock: Arc<dyn Clock>,
}

impl<R, G> FraudService<R, G>
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    pub fn new(repository: Arc<R>, gateway: Arc<G>, config: EvaluationConfig) -> Self {
        let calculator =
            DefaultEligibilityCalculator::new(config.underage_ages.clone(), config.adult_age);
        Self {
            repository,
            gateway,
            config: Arc::new(config),
            calculator: Arc::new(calculator),
            names: Arc::new(LatinNameValidator),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn EligibilityCalculator>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_name_validator(mut self, names: Arc<dyn NameValidator>) -> Self {
        self.names = names;
        self
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub(crate) fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub(crate) fn load_user(&self, user_id: UserId) -> Result<UserAccount, FraudError> {
        self.repository
            .user(user_id)?
            .ok_or(FraudError::UserNotFound(user_id))
    }

    fn load_check(&self, check_id: FraudCheckId) -> Result<FraudCheckRecord, FraudError> {
        self.repository
            .get_check(check_id)?
            .ok_or(FraudError::CheckNotFound(check_id))
    }

    /// Opens a pending identity check; a second check with the same key is refused.
    pub fn start_check(
        &self,
        user_id: UserId,
        check_type: FraudCheckType,
        third_party_id: &str,
        content: Option<Value>,
    ) -> Result<FraudCheckRecord, FraudError> {
        if !check_type.is_identity_check() {
            return Err(FraudError::UnsupportedCheckType(check_type));
        }
        let user = self.load_user(user_id)?;
        CheckContent::parse(check_type, content.as_ref())?;

        let mut record = FraudCheckRecord::new(
            user.id,
            check_type,
            third_party_id,
            FraudCheckStatus::Pending,
            self.now(),
        );
        record.result_content = content;
        record.eligibility = self.eligibility_today(&user);

        let stored = self.repository.insert_unique_check(record)?;
        info!(
            user_id = %stored.user_id,
            check_id = %stored.id,
            check_type = %stored.check_type,
            "identity check started"
        );
        Ok(stored)
    }

    /// Runs the evaluator battery for a check and folds the verdict into the user's result.
    pub fn on_check_result(
        &self,
        check_id: FraudCheckId,
        content: Option<Value>,
    ) -> Result<CheckVerdict, FraudError> {
        let mut check = self.load_check(check_id)?;
        if check.status == FraudCheckStatus::Canceled {
            return Err(FraudError::CheckNotPending(check.id));
        }
        if content.is_some() {
            check.result_content = content;
        }

        let value = check
            .result_content
            .as_ref()
            .ok_or(ContentError::Missing(check.check_type))?;
        let identity = IdentityContent::parse(check.check_type, value)?;
        let user = self.load_user(check.user_id)?;
        let eligibility = self.check_eligibility(&user, &check, &identity)?;

        let context = EvaluationContext {
            user: &user,
            config: &self.config,
            repository: self.repository.as_ref(),
            calculator: self.calculator.as_ref(),
            names: self.names.as_ref(),
            eligibility,
            now: self.now(),
        };
        let items = context.evaluate(&identity)?;
        let verdict = AggregateVerdict::from_items(&items);
        self.handle_duplicate(&user, &items)?;

        lifecycle::apply_verdict(&mut check, &verdict, eligibility);
        self.repository.update_check(&check)?;

        let result_status = if check.check_type == FraudCheckType::Jouve
            && self.config.flags.pause_jouve_subscription
        {
            FraudStatus::SubscriptionOnHold
        } else {
            verdict.status
        };

        let current = self.repository.current_result(user.id, eligibility)?;
        let result = lifecycle::next_result(
            current.as_ref(),
            ResultUpdate {
                user_id: user.id,
                eligibility,
                status: result_status,
                reason: verdict.reason.clone(),
                reason_codes: verdict.reason_codes.clone(),
                allow_downgrade: false,
            },
            self.now(),
        )?;
        self.repository.save_result(result.clone())?;

        info!(
            user_id = %user.id,
            check_id = %check.id,
            check_type = %check.check_type,
            status = %verdict.status,
            "identity check evaluated"
        );

        Ok(CheckVerdict {
            check,
            items,
            result,
        })
    }

    /// Records a definitive upstream failure as KO without evaluating anything.
    pub fn mark_check_failed(
        &self,
        user_id: UserId,
        check_type: FraudCheckType,
        third_party_id: &str,
        content: Option<Value>,
        reason_codes: Vec<FraudReasonCode>,
        reason: Option<String>,
    ) -> Result<FraudCheckRecord, FraudError> {
        let user = self.load_user(user_id)?;
        let mut check = match self
            .repository
            .find_check(user.id, check_type, third_party_id)?
        {
            Some(existing) => existing,
            None => self.repository.insert_check(FraudCheckRecord::new(
                user.id,
                check_type,
                third_party_id,
                FraudCheckStatus::Pending,
                self.now(),
            ))?,
        };

        if content.is_some() {
            check.result_content = content;
        }
        lifecycle::mark_failed(&mut check, reason_codes, reason);
        self.repository.update_check(&check)?;

        warn!(
            user_id = %user.id,
            check_id = %check.id,
            check_type = %check.check_type,
            "identity check failed upstream"
        );
        Ok(check)
    }

    pub fn cancel_check(&self, check_id: FraudCheckId) -> Result<FraudCheckRecord, FraudError> {
        let mut check = self.load_check(check_id)?;
        lifecycle::cancel(&mut check)?;
        self.repository.update_check(&check)?;
        Ok(check)
    }

    pub fn create_honor_statement_check(
        &self,
        user_id: UserId,
        origin: &str,
        eligibility: Option<EligibilityType>,
    ) -> Result<FraudCheckRecord, FraudError> {
        let user = self.load_user(user_id)?;
        let mut record = FraudCheckRecord::new(
            user.id,
            FraudCheckType::HonorStatement,
            format!("internal_check_{}", user.id),
            FraudCheckStatus::Ok,
            self.now(),
        );
        record.reason = Some(origin.to_string());
        record.eligibility = eligibility.or_else(|| self.eligibility_today(&user));
        Ok(self.repository.insert_check(record)?)
    }

    /// Idempotent for a given eligibility: an existing completion check is returned as is.
    pub fn create_profile_completion_check(
        &self,
        user_id: UserId,
        eligibility: Option<EligibilityType>,
        content: ProfileCompletionContent,
    ) -> Result<FraudCheckRecord, FraudError> {
        let user = self.load_user(user_id)?;
        let third_party_id = format!("profile-completion-{}", user.id);

        let existing = self
            .repository
            .checks_for_user(user.id)?
            .into_iter()
            .find(|check| {
                check.check_type == FraudCheckType::ProfileCompletion
                    && check.third_party_id == third_party_id
                    && check.eligibility == eligibility
            });
        if let Some(existing) = existing {
            warn!(
                user_id = %user.id,
                check_id = %existing.id,
                "profile completion check already exists"
            );
            return Ok(existing);
        }

        let mut record = FraudCheckRecord::new(
            user.id,
            FraudCheckType::ProfileCompletion,
            third_party_id,
            FraudCheckStatus::Ok,
            self.now(),
        );
        record.reason = Some(format!("Completed in application step ; {}", content.origin));
        record.eligibility = eligibility;
        record.result_content = Some(serde_json::to_value(&content).map_err(|source| {
            ContentError::Malformed {
                check_type: FraudCheckType::ProfileCompletion,
                source,
            }
        })?);
        Ok(self.repository.insert_check(record)?)
    }

    /// Stores a profiling result and stops the journey when the risk is not acceptable.
    pub fn on_user_profiling_result(
        &self,
        user_id: UserId,
        content: UserProfilingContent,
    ) -> Result<FraudCheckRecord, FraudError> {
        let user = self.load_user(user_id)?;
        let rating = content.risk_rating;
        let mut record = FraudCheckRecord::new(
            user.id,
            FraudCheckType::UserProfiling,
            content.session_id.clone(),
            risk_check_status(rating),
            self.now(),
        );
        record.eligibility = self.eligibility_today(&user);
        record.result_content = Some(serde_json::to_value(&content).map_err(|source| {
            ContentError::Malformed {
                check_type: FraudCheckType::UserProfiling,
                source,
            }
        })?);
        let stored = self.repository.insert_check(record)?;

        let status = risk_fraud_status(rating);
        if status != FraudStatus::Ok {
            self.upsert_fraud_result(
                user.id,
                status,
                stored.eligibility,
                Some(&format!("User profiling risk rating is {rating:?}")),
                Vec::new(),
            )?;
            self.gateway.on_journey_stopped(user.id)?;
            warn!(user_id = %user.id, ?rating, "journey stopped by profiling risk");
        }
        Ok(stored)
    }

    /// Override path for the cumulative result; unlike evaluations it may downgrade.
    pub fn upsert_fraud_result(
        &self,
        user_id: UserId,
        status: FraudStatus,
        eligibility: Option<EligibilityType>,
        reason: Option<&str>,
        reason_codes: Vec<FraudReasonCode>,
    ) -> Result<FraudResultRecord, FraudError> {
        let reason = reason.map(str::trim).unwrap_or_default();
        if status != FraudStatus::Ok && reason.is_empty() {
            return Err(FraudError::MissingReason(status));
        }
        let eligibility = Some(eligibility.unwrap_or(EligibilityType::Age18));

        let current = self.repository.current_result(user_id, eligibility)?;
        let result = lifecycle::next_result(
            current.as_ref(),
            ResultUpdate {
                user_id,
                eligibility,
                status,
                reason: reason.to_string(),
                reason_codes,
                allow_downgrade: true,
            },
            self.now(),
        )?;
        self.repository.save_result(result.clone())?;
        info!(user_id = %user_id, status = %status, "fraud result upserted");
        Ok(result)
    }

    pub fn record_phone_validation_failure(
        &self,
        user_id: UserId,
        failure: PhoneValidationFailure,
    ) -> Result<FraudCheckRecord, FraudError> {
        let user = self.load_user(user_id)?;
        let reason = failure.reason();
        let mut record = FraudCheckRecord::new(
            user.id,
            FraudCheckType::PhoneValidation,
            format!("PC-{}", user.id),
            FraudCheckStatus::Ko,
            self.now(),
        );
        record.reason = Some(reason.clone());
        record.reason_codes = vec![failure.reason_code()];
        record.eligibility = self.eligibility_today(&user);
        if let Some(phone_number) = failure.phone_number(&user) {
            let content = PhoneValidationContent {
                phone_number: phone_number.to_string(),
            };
            record.result_content = Some(serde_json::to_value(&content).map_err(|source| {
                ContentError::Malformed {
                    check_type: FraudCheckType::PhoneValidation,
                    source,
                }
            })?);
        }
        let stored = self.repository.insert_check(record)?;

        if failure.flags_journey() {
            self.upsert_fraud_result(
                user.id,
                FraudStatus::Suspicious,
                stored.eligibility,
                Some(&reason),
                vec![failure.reason_code()],
            )?;
        }
        Ok(stored)
    }

    /// Replaces the document number on the latest scan or manual-procedure check.
    pub fn admin_update_id_piece_number(
        &self,
        user_id: UserId,
        id_piece_number: &str,
    ) -> Result<Option<FraudCheckRecord>, FraudError> {
        let latest = self
            .repository
            .checks_for_user(user_id)?
            .into_iter()
            .rev()
            .find(|check| matches!(check.check_type, FraudCheckType::Jouve | FraudCheckType::Dms));
        let Some(mut check) = latest else {
            return Ok(None);
        };
        let Some(Value::Object(fields)) = check.result_content.as_mut() else {
            return Err(ContentError::Missing(check.check_type).into());
        };

        let number = Value::String(id_piece_number.to_string());
        if check.check_type == FraudCheckType::Jouve {
            fields.insert("bodyPieceNumber".to_string(), number);
            fields.insert("bodyPieceNumberCtrl".to_string(), Value::from("OK"));
            fields.insert("bodyPieceNumberLevel".to_string(), Value::from(100));
        } else {
            fields.insert("id_piece_number".to_string(), number);
        }
        self.repository.update_check(&check)?;
        Ok(Some(check))
    }

    /// Whether the user went through an identity check that was not abandoned.
    pub fn has_user_performed_identity_check(&self, user_id: UserId) -> Result<bool, FraudError> {
        let user = self.load_user(user_id)?;
        if user.has_role(UserRole::Beneficiary) {
            return Ok(true);
        }
        Ok(self
            .repository
            .checks_for_user(user_id)?
            .iter()
            .any(|check| {
                check.check_type.is_identity_check() && check.status != FraudCheckStatus::Canceled
            }))
    }

    pub fn has_user_pending_identity_check(&self, user_id: UserId) -> Result<bool, FraudError> {
        Ok(self
            .repository
            .checks_for_user(user_id)?
            .iter()
            .any(|check| {
                check.check_type.is_identity_check() && check.status == FraudCheckStatus::Pending
            }))
    }

    /// Most recent identity check whose content supplies names and birth date.
    pub fn get_last_filled_identity_check(
        &self,
        user_id: UserId,
    ) -> Result<Option<(FraudCheckRecord, IdentityContent)>, FraudError> {
        let filled = self
            .repository
            .checks_for_user(user_id)?
            .into_iter()
            .rev()
            .filter(|check| check.check_type.is_identity_check())
            .find_map(|check| {
                let content = IdentityContent::parse(check.check_type, check.result_content.as_ref()?).ok()?;
                content.has_required_identity().then_some((check, content))
            });
        Ok(filled)
    }

    /// HIGH profiling risk, or no profiling at all when an empty profile is not accepted.
    pub fn is_risky_user_profile(&self, user_id: UserId) -> Result<bool, FraudError> {
        let latest = self
            .repository
            .checks_for_user(user_id)?
            .into_iter()
            .rev()
            .find(|check| check.check_type == FraudCheckType::UserProfiling);

        let Some(check) = latest else {
            return Ok(!self.config.flags.allow_empty_user_profiling);
        };
        match CheckContent::parse(check.check_type, check.result_content.as_ref())? {
            CheckContent::UserProfiling(content) => {
                Ok(content.risk_rating == UserProfilingRiskRating::High)
            }
            _ => Ok(!self.config.flags.allow_empty_user_profiling),
        }
    }

    pub fn is_user_fraudster(&self, user_id: UserId) -> Result<bool, FraudError> {
        Ok(self
            .repository
            .results_for_user(user_id)?
            .iter()
            .any(|result| result.status != FraudStatus::Ok))
    }

    pub fn get_duplicate_beneficiary(
        &self,
        check_id: FraudCheckId,
    ) -> Result<Option<UserAccount>, FraudError> {
        let check = self.load_check(check_id)?;
        let value = check
            .result_content
            .as_ref()
            .ok_or(ContentError::Missing(check.check_type))?;
        let content = IdentityContent::parse(check.check_type, value)?;

        let (Some(first_name), Some(last_name), Some(birth_date)) =
            (content.first_name(), content.last_name(), content.birth_date())
        else {
            return Ok(None);
        };
        let query = PersonQuery {
            first_name,
            last_name,
            married_name: content.married_name(),
            birth_date,
        };
        Ok(find_duplicate_beneficiary(
            self.repository.as_ref(),
            check.user_id,
            query,
        )?)
    }

    /// Flags an evaluated check as the duplicate of an existing beneficiary.
    pub fn invalidate_fraud_check_for_duplicate_user(
        &self,
        check_id: FraudCheckId,
        duplicate_user_id: UserId,
    ) -> Result<FraudCheckRecord, FraudError> {
        let mut check = self.load_check(check_id)?;
        check.status = FraudCheckStatus::Suspicious;
        if !check.reason_codes.contains(&FraudReasonCode::DuplicateUser) {
            check.reason_codes.push(FraudReasonCode::DuplicateUser);
        }
        check.reason = Some(append_reason(
            check.reason.as_deref().unwrap_or_default(),
            &format!("Account is a duplicate of user {duplicate_user_id}"),
        ));
        self.repository.update_check(&check)?;
        Ok(check)
    }

    /// Suspends an underage beneficiary and the account it duplicates when both were granted
    /// the underage credit.
    fn handle_duplicate(&self, user: &UserAccount, items: &[FraudItem]) -> Result<(), FraudError> {
        let Some(duplicate_id) = items
            .iter()
            .filter(|item| {
                item.reason_codes.contains(&FraudReasonCode::DuplicateUser)
                    || item
                        .reason_codes
                        .contains(&FraudReasonCode::DuplicateIdPieceNumber)
            })
            .find_map(|item| item.duplicate_user_id)
        else {
            return Ok(());
        };
        if !user.has_deposit_type(DepositType::Grant15_17) {
            return Ok(());
        }
        let Some(duplicate) = self.repository.user(duplicate_id)? else {
            return Ok(());
        };
        if !duplicate.has_deposit_type(DepositType::Grant15_17) {
            return Ok(());
        }

        self.gateway.suspend_account(user.id, DUPLICATE_SUSPENSION_COMMENT)?;
        self.gateway.suspend_account(duplicate.id, DUPLICATE_SUSPENSION_COMMENT)?;
        self.gateway.send_duplicate_fraud_email(user, &duplicate)?;
        warn!(
            user_id = %user.id,
            duplicate_user_id = %duplicate.id,
            "underage duplicates suspended"
        );
        Ok(())
    }

    /// Program the user qualifies for today, from the validated or declared birth date.
    pub fn eligibility_today(&self, user: &UserAccount) -> Option<EligibilityType> {
        let birth_date = user.eligibility_birth_date()?;
        self.calculator.eligibility_at(birth_date, self.now())
    }

    /// Registration date of the user's earliest identity check evaluated for the adult program.
    fn earliest_adult_registration(
        &self,
        user_id: UserId,
    ) -> Result<Option<NaiveDateTime>, RepositoryError> {
        let checks = self.repository.checks_for_user(user_id)?;
        Ok(checks
            .iter()
            .filter(|check| {
                check.check_type.is_identity_check()
                    && check.eligibility == Some(EligibilityType::Age18)
            })
            .map(|check| {
                check
                    .result_content
                    .as_ref()
                    .and_then(|value| IdentityContent::parse(check.check_type, value).ok())
                    .and_then(|content| content.registration_datetime())
                    .unwrap_or(check.created_at)
            })
            .min())
    }

    /// Eligibility decided from an identity's birth date and registration timestamp.
    pub(crate) fn decide_user_eligibility(
        &self,
        user_id: UserId,
        content: &dyn IdentityCheckContent,
    ) -> Result<Option<EligibilityType>, RepositoryError> {
        let Some(birth_date) = content.birth_date() else {
            return Ok(None);
        };
        decide_eligibility(
            self.calculator.as_ref(),
            birth_date,
            content.registration_datetime(),
            self.now(),
            || self.earliest_adult_registration(user_id),
        )
    }

    fn check_eligibility(
        &self,
        user: &UserAccount,
        check: &FraudCheckRecord,
        content: &IdentityContent,
    ) -> Result<Option<EligibilityType>, RepositoryError> {
        if content.birth_date().is_some() {
            return self.decide_user_eligibility(user.id, content);
        }
        Ok(check.eligibility.or_else(|| self.eligibility_today(user)))
    }
}
