use serde::{Deserialize, Serialize};

/// Ordinal risk rating returned by the profiling vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserProfilingRiskRating {
    Trusted,
    Neutral,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfilingContent {
    pub risk_rating: UserProfilingRiskRating,
    pub session_id: String,
    #[serde(default)]
    pub account_email: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub policy_score: Option<i64>,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Answers of the profile completion form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCompletionContent {
    pub first_name: String,
    pub last_name: String,
    pub activity: String,
    pub city: String,
    pub postal_code: String,
    pub origin: String,
    #[serde(default)]
    pub school_type: Option<String>,
}

/// Phone number involved in a failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneValidationContent {
    pub phone_number: String,
}
