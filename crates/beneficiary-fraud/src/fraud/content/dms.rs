use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::parsers::{deserialize_date, deserialize_datetime};
use super::IdentityCheckContent;

/// Application filed through the manual document procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmsContent {
    pub application_number: u64,
    pub procedure_number: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub civility: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub id_piece_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub registration_datetime: Option<NaiveDateTime>,
}

impl IdentityCheckContent for DmsContent {
    fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
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

    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }

    fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    fn phone_number(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    fn id_piece_number(&self) -> Option<&str> {
        self.id_piece_number.as_deref()
    }

    fn registration_datetime(&self) -> Option<NaiveDateTime> {
        self.registration_datetime
    }
}
