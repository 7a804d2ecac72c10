//! Identity and fraud evaluation for beneficiary subscriptions.
//!
//! Identity checks arrive from four providers, are evaluated by a battery of
//! deterministic rules and folded into one cumulative fraud result per user and
//! eligibility program. Manual reviews close the loop by activating, redirecting
//! or rejecting the beneficiary.

pub mod clock;
pub mod content;
pub mod domain;
pub mod eligibility;
pub mod error;
pub mod evaluation;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod review;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use content::{CheckContent, ContentError, IdentityCheckContent, IdentityContent};
pub use domain::{
    EligibilityType, FraudCheckId, FraudCheckRecord, FraudCheckStatus, FraudCheckType, FraudItem,
    FraudReasonCode, FraudResultRecord, FraudReviewRecord, FraudReviewStatus, FraudStatus,
    UserAccount, UserId, UserRole,
};
pub use eligibility::{DefaultEligibilityCalculator, EligibilityCalculator};
pub use error::{EligibilityError, FraudError};
pub use evaluation::{EvaluationConfig, JouveThresholds};
pub use memory::{GatewayEvent, InMemoryFraudStore, RecordingGateway};
pub use repository::{
    ActivationError, FraudRepository, GatewayError, RepositoryError, SubscriptionGateway,
};
pub use review::ManualReviewRequest;
pub use router::fraud_router;
pub use service::{CheckVerdict, FraudService, PhoneValidationFailure};
