use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::IdentityCheckContent;

/// Identity asserted by the education identity federation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EduconnectContent {
    pub birth_date: NaiveDate,
    pub educonnect_id: String,
    pub first_name: String,
    pub last_name: String,
    pub ine_hash: String,
    pub registration_datetime: NaiveDateTime,
    #[serde(default)]
    pub civility: Option<String>,
    #[serde(default)]
    pub school_uai: Option<String>,
    #[serde(default)]
    pub student_level: Option<String>,
}

impl IdentityCheckContent for EduconnectContent {
    fn birth_date(&self) -> Option<NaiveDate> {
        Some(self.birth_date)
    }

    fn first_name(&self) -> Option<&str> {
        Some(&self.first_name)
    }

    fn last_name(&self) -> Option<&str> {
        Some(&self.last_name)
    }

    fn civility(&self) -> Option<&str> {
        self.civility.as_deref()
    }

    fn ine_hash(&self) -> Option<&str> {
        Some(&self.ine_hash)
    }

    fn registration_datetime(&self) -> Option<NaiveDateTime> {
        Some(self.registration_datetime)
    }
}
