use std::ops::RangeInclusive;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::FeatureFlags;

/// Minimum scores the legacy document scan must reach on each level field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JouveThresholds {
    pub body_birth_date_level: i64,
    pub body_name_level: i64,
    pub body_piece_number_level: i64,
}

impl Default for JouveThresholds {
    fn default() -> Self {
        Self {
            body_birth_date_level: 100,
            body_name_level: 50,
            body_piece_number_level: 50,
        }
    }
}

/// Age bounds, thresholds and switches handed to the evaluator battery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub underage_ages: RangeInclusive<i32>,
    pub adult_age: i32,
    /// Minimum age accepted by the document-verification service once the newer credit
    /// regime is active.
    pub credit_v3_minimum_age: i32,
    pub jouve: JouveThresholds,
    pub flags: FeatureFlags,
}

impl EvaluationConfig {
    pub fn with_flags(flags: FeatureFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    pub fn credit_v3_active(&self, now: NaiveDateTime) -> bool {
        self.flags
            .credit_v3_cutover
            .is_some_and(|cutover| now.date() >= cutover)
    }

    /// Youngest age the document-verification service may onboard at `now`.
    pub fn ubble_minimum_age(&self, now: NaiveDateTime) -> i32 {
        if self.credit_v3_active(now) {
            self.credit_v3_minimum_age
        } else {
            *self.underage_ages.start()
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            underage_ages: 15..=17,
            adult_age: 18,
            credit_v3_minimum_age: 17,
            jouve: JouveThresholds::default(),
            flags: FeatureFlags::default(),
        }
    }
}
