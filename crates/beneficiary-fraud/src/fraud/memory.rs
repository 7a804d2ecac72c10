//! In-process implementations of the storage and subscription seams.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    EligibilityType, FraudCheckId, FraudCheckRecord, FraudCheckReference, FraudCheckType,
    FraudResultRecord, FraudReviewRecord, UserAccount, UserId,
};
use super::evaluation::normalize_id_piece_number;
use super::repository::{
    ActivationError, FraudRepository, GatewayError, RepositoryError, SubscriptionGateway,
};

static CHECK_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_check_id() -> FraudCheckId {
    FraudCheckId(CHECK_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Default)]
struct StoreState {
    checks: BTreeMap<FraudCheckId, FraudCheckRecord>,
    results: Vec<FraudResultRecord>,
    reviews: Vec<FraudReviewRecord>,
    users: BTreeMap<UserId, UserAccount>,
    ine_whitelist: BTreeSet<String>,
}

/// Mutex-guarded store used by the API binary, the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryFraudStore {
    state: Mutex<StoreState>,
}

impl InMemoryFraudStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserAccount>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state
                .users
                .extend(users.into_iter().map(|user| (user.id, user)));
        }
        store
    }

    pub fn whitelist_ine(&self, ine_hash: impl Into<String>) -> Result<(), RepositoryError> {
        self.lock()?.ine_whitelist.insert(ine_hash.into());
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("fraud store lock poisoned".to_string()))
    }
}

impl FraudRepository for InMemoryFraudStore {
    fn insert_check(&self, mut record: FraudCheckRecord) -> Result<FraudCheckRecord, RepositoryError> {
        record.id = next_check_id();
        self.lock()?.checks.insert(record.id, record.clone());
        Ok(record)
    }

    fn insert_unique_check(
        &self,
        mut record: FraudCheckRecord,
    ) -> Result<FraudCheckRecord, RepositoryError> {
        let mut state = self.lock()?;
        let taken = state.checks.values().any(|existing| {
            existing.user_id == record.user_id
                && existing.check_type == record.check_type
                && existing.third_party_id == record.third_party_id
        });
        if taken {
            return Err(RepositoryError::Conflict {
                check_type: record.check_type,
                third_party_id: record.third_party_id,
            });
        }
        record.id = next_check_id();
        state.checks.insert(record.id, record.clone());
        Ok(record)
    }

    fn update_check(&self, record: &FraudCheckRecord) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let stored = state
            .checks
            .get_mut(&record.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = record.clone();
        Ok(())
    }

    fn get_check(&self, id: FraudCheckId) -> Result<Option<FraudCheckRecord>, RepositoryError> {
        Ok(self.lock()?.checks.get(&id).cloned())
    }

    fn find_check(
        &self,
        user_id: UserId,
        check_type: FraudCheckType,
        third_party_id: &str,
    ) -> Result<Option<FraudCheckRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .checks
            .values()
            .find(|check| {
                check.user_id == user_id
                    && check.check_type == check_type
                    && check.third_party_id == third_party_id
            })
            .cloned())
    }

    fn checks_for_user(&self, user_id: UserId) -> Result<Vec<FraudCheckRecord>, RepositoryError> {
        let mut checks: Vec<FraudCheckRecord> = self
            .lock()?
            .checks
            .values()
            .filter(|check| check.user_id == user_id)
            .cloned()
            .collect();
        checks.sort_by_key(|check| (check.created_at, check.id));
        Ok(checks)
    }

    fn current_result(
        &self,
        user_id: UserId,
        eligibility: Option<EligibilityType>,
    ) -> Result<Option<FraudResultRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .results
            .iter()
            .find(|result| result.user_id == user_id && result.eligibility == eligibility)
            .cloned())
    }

    fn save_result(&self, record: FraudResultRecord) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state.results.iter_mut().find(|result| {
            result.user_id == record.user_id && result.eligibility == record.eligibility
        }) {
            Some(existing) => *existing = record,
            None => state.results.push(record),
        }
        Ok(())
    }

    fn results_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<FraudResultRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .results
            .iter()
            .filter(|result| result.user_id == user_id)
            .cloned()
            .collect())
    }

    fn insert_review(&self, record: FraudReviewRecord) -> Result<(), RepositoryError> {
        self.lock()?.reviews.push(record);
        Ok(())
    }

    fn reviews_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<FraudReviewRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .reviews
            .iter()
            .filter(|review| review.user_id == user_id)
            .cloned()
            .collect())
    }

    fn user(&self, user_id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    fn save_user(&self, user: UserAccount) -> Result<(), RepositoryError> {
        self.lock()?.users.insert(user.id, user);
        Ok(())
    }

    fn beneficiaries_born_on(
        &self,
        birth_date: NaiveDate,
        excluded: UserId,
    ) -> Result<Vec<UserAccount>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .filter(|user| {
                user.id != excluded
                    && user.is_beneficiary()
                    && user.eligibility_birth_date() == Some(birth_date)
            })
            .cloned()
            .collect())
    }

    fn user_by_id_piece_number(
        &self,
        normalized: &str,
        excluded: UserId,
    ) -> Result<Option<UserId>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| {
                user.id != excluded
                    && user
                        .id_piece_number
                        .as_deref()
                        .is_some_and(|number| normalize_id_piece_number(number) == normalized)
            })
            .map(|user| user.id))
    }

    fn user_by_ine_hash(
        &self,
        ine_hash: &str,
        excluded: UserId,
    ) -> Result<Option<UserId>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.id != excluded && user.ine_hash.as_deref() == Some(ine_hash))
            .map(|user| user.id))
    }

    fn is_ine_whitelisted(&self, ine_hash: &str) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.ine_whitelist.contains(ine_hash))
    }
}

/// Side effect captured by [`RecordingGateway`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GatewayEvent {
    Activated {
        user_id: UserId,
        source: FraudCheckReference,
        eligibility: EligibilityType,
    },
    JourneyStopped {
        user_id: UserId,
    },
    RedirectedToDms {
        user_id: UserId,
    },
    ReviewRejected {
        user_id: UserId,
    },
    Email {
        email: String,
        template: String,
    },
    Suspended {
        user_id: UserId,
        comment: String,
    },
    DuplicateFraudEmail {
        user_id: UserId,
        duplicate_user_id: UserId,
    },
}

/// Gateway that records every call, optionally refusing the next activation.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    events: Mutex<Vec<GatewayEvent>>,
    activation_failure: Mutex<Option<ActivationError>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GatewayEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn fail_next_activation(&self, error: ActivationError) {
        if let Ok(mut failure) = self.activation_failure.lock() {
            *failure = Some(error);
        }
    }

    fn record(&self, event: GatewayEvent) -> Result<(), GatewayError> {
        self.events
            .lock()
            .map_err(|_| GatewayError::Transport("event log lock poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}

impl SubscriptionGateway for RecordingGateway {
    fn activate_beneficiary(
        &self,
        user: &UserAccount,
        source: &FraudCheckReference,
        eligibility: EligibilityType,
    ) -> Result<(), ActivationError> {
        let failure = self
            .activation_failure
            .lock()
            .map_err(|_| ActivationError::Unavailable("activation lock poisoned".to_string()))?
            .take();
        if let Some(error) = failure {
            return Err(error);
        }
        self.record(GatewayEvent::Activated {
            user_id: user.id,
            source: source.clone(),
            eligibility,
        })
        .map_err(|error| ActivationError::Unavailable(error.to_string()))
    }

    fn on_journey_stopped(&self, user_id: UserId) -> Result<(), GatewayError> {
        self.record(GatewayEvent::JourneyStopped { user_id })
    }

    fn on_redirected_to_dms(&self, user_id: UserId) -> Result<(), GatewayError> {
        self.record(GatewayEvent::RedirectedToDms { user_id })
    }

    fn on_review_rejected(&self, user_id: UserId) -> Result<(), GatewayError> {
        self.record(GatewayEvent::ReviewRejected { user_id })
    }

    fn send_document_error_email(&self, email: &str, template: &str) -> Result<(), GatewayError> {
        self.record(GatewayEvent::Email {
            email: email.to_string(),
            template: template.to_string(),
        })
    }

    fn suspend_account(&self, user_id: UserId, comment: &str) -> Result<(), GatewayError> {
        self.record(GatewayEvent::Suspended {
            user_id,
            comment: comment.to_string(),
        })
    }

    fn send_duplicate_fraud_email(
        &self,
        user: &UserAccount,
        duplicate: &UserAccount,
    ) -> Result<(), GatewayError> {
        self.record(GatewayEvent::DuplicateFraudEmail {
            user_id: user.id,
            duplicate_user_id: duplicate.id,
        })
    }
}
