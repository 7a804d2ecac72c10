use serde::{Deserialize, Serialize};
use tracing::info;

use super::content::IdentityCheckContent;
use super::domain::{
    EligibilityType, FraudReviewRecord, FraudReviewStatus, UserAccount, UserId,
};
use super::error::{EligibilityError, FraudError};
use super::evaluation::normalize_id_piece_number;
use super::repository::{
    ActivationError, FraudRepository, SubscriptionGateway, UNREAD_DOCUMENT_EMAIL,
};
use super::service::FraudService;

/// Note appended to the reason of a review redirecting the user.
pub const REDIRECTED_TO_DMS_NOTE: &str = "Redirected to the manual document procedure";

/// Decision submitted by a staff reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualReviewRequest {
    pub user_id: UserId,
    pub reviewer_id: UserId,
    pub decision: FraudReviewStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub eligibility: Option<EligibilityType>,
}

type ReviewHandler<R, G> =
    fn(&FraudService<R, G>, &UserAccount, &mut FraudReviewRecord) -> Result<(), FraudError>;

fn review_handler<R, G>(decision: FraudReviewStatus) -> ReviewHandler<R, G>
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    match decision {
        FraudReviewStatus::Ok => handle_ok_review::<R, G>,
        FraudReviewStatus::RedirectedToDms => handle_redirect_review::<R, G>,
        FraudReviewStatus::Ko => handle_ko_review::<R, G>,
    }
}

impl<R, G> FraudService<R, G>
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    /// Applies a reviewer decision and stores the review once its side effects succeeded.
    pub fn record_manual_review(
        &self,
        request: ManualReviewRequest,
    ) -> Result<FraudReviewRecord, FraudError> {
        if !self.config.flags.beneficiary_validation_after_fraud_checks {
            return Err(FraudError::FeatureDisabled(
                "beneficiary validation after fraud checks",
            ));
        }

        let user = self.load_user(request.user_id)?;
        let mut review = FraudReviewRecord {
            user_id: user.id,
            author_id: request.reviewer_id,
            review: request.decision,
            reason: request.reason.filter(|reason| !reason.trim().is_empty()),
            eligibility: request.eligibility,
            created_at: self.now(),
        };

        review_handler::<R, G>(request.decision)(self, &user, &mut review)?;
        self.repository.insert_review(review.clone())?;

        info!(
            user_id = %user.id,
            reviewer_id = %review.author_id,
            decision = ?review.review,
            "manual review recorded"
        );
        Ok(review)
    }
}

fn handle_ok_review<R, G>(
    service: &FraudService<R, G>,
    user: &UserAccount,
    review: &mut FraudReviewRecord,
) -> Result<(), FraudError>
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    let (check, content) = service
        .get_last_filled_identity_check(user.id)?
        .ok_or(FraudError::NoIdentityCheckPerformed(user.id))?;

    let id_piece_number = user
        .id_piece_number
        .as_deref()
        .filter(|number| !number.trim().is_empty())
        .or_else(|| {
            content
                .id_piece_number()
                .filter(|number| !number.trim().is_empty())
        });
    if let Some(number) = id_piece_number {
        let normalized = normalize_id_piece_number(number);
        if let Some(duplicate) = service
            .repository
            .user_by_id_piece_number(&normalized, user.id)?
        {
            return Err(FraudError::DuplicateIdPieceNumber(duplicate));
        }
    }
    if let Some(ine_hash) = content.ine_hash() {
        if let Some(duplicate) = service.repository.user_by_ine_hash(ine_hash, user.id)? {
            return Err(FraudError::DuplicateIne(duplicate));
        }
    }

    let eligibility = match review.eligibility {
        Some(eligibility) => eligibility,
        None => service
            .decide_user_eligibility(user.id, &content)?
            .ok_or(EligibilityError::Undetermined)?,
    };
    review.eligibility = Some(eligibility);

    // The profile is only persisted once the activation went through.
    let mut updated = user.clone();
    apply_identity(&mut updated, &content);
    service
        .gateway
        .activate_beneficiary(&updated, &check.reference(), eligibility)
        .map_err(|error| activation_failure(error, eligibility))?;
    service.repository.save_user(updated)?;
    Ok(())
}

fn handle_redirect_review<R, G>(
    service: &FraudService<R, G>,
    user: &UserAccount,
    review: &mut FraudReviewRecord,
) -> Result<(), FraudError>
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    review.reason = Some(match review.reason.take() {
        Some(reason) => format!("{reason} ; {REDIRECTED_TO_DMS_NOTE}"),
        None => REDIRECTED_TO_DMS_NOTE.to_string(),
    });
    service
        .gateway
        .send_document_error_email(&user.email, UNREAD_DOCUMENT_EMAIL)?;
    service.gateway.on_redirected_to_dms(user.id)?;
    Ok(())
}

fn handle_ko_review<R, G>(
    service: &FraudService<R, G>,
    user: &UserAccount,
    _review: &mut FraudReviewRecord,
) -> Result<(), FraudError>
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    service.gateway.on_review_rejected(user.id)?;
    Ok(())
}

/// Known activation refusals become operator-facing errors; anything else propagates as is.
fn activation_failure(error: ActivationError, eligibility: EligibilityType) -> FraudError {
    let refusal = match error {
        ActivationError::InvalidEligibilityType(_) => {
            EligibilityError::InvalidEligibilityType(error)
        }
        ActivationError::InvalidAgeForEligibility(_) => EligibilityError::InvalidAge {
            eligibility,
            source: error,
        },
        ActivationError::CannotUpgradeRole => EligibilityError::CannotUpgradeRole(error),
        ActivationError::DepositTypeAlreadyGranted(_) => EligibilityError::DepositAlreadyGranted {
            eligibility,
            source: error,
        },
        ActivationError::Unavailable(_) => return FraudError::Activation(error),
    };
    FraudError::Eligibility(refusal)
}

/// Copies the identity fields supplied by a check onto the user profile.
pub(crate) fn apply_identity(user: &mut UserAccount, content: &dyn IdentityCheckContent) {
    fn set(target: &mut Option<String>, value: Option<&str>) {
        if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
            *target = Some(value.to_string());
        }
    }

    set(&mut user.first_name, content.first_name());
    set(&mut user.last_name, content.last_name());
    set(&mut user.married_name, content.married_name());
    set(&mut user.civility, content.civility());
    set(&mut user.address, content.address());
    set(&mut user.postal_code, content.postal_code());
    set(&mut user.city, content.city());
    set(&mut user.phone_number, content.phone_number());
    set(&mut user.id_piece_number, content.id_piece_number());
    set(&mut user.ine_hash, content.ine_hash());
    if let Some(birth_date) = content.birth_date() {
        user.validated_birth_date = Some(birth_date);
    }
}
