use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::parsers::{deserialize_date, deserialize_datetime, deserialize_level};
use super::IdentityCheckContent;

/// Legacy document-scan payload. Controls are "OK"/"KO" strings, levels are 0-100 scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JouveContent {
    pub id: Option<u64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub body_piece_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub registration_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub birth_location_ctrl: Option<String>,
    #[serde(default)]
    pub body_birth_date_ctrl: Option<String>,
    #[serde(default)]
    pub body_name_ctrl: Option<String>,
    #[serde(default)]
    pub body_piece_number_ctrl: Option<String>,
    #[serde(default, deserialize_with = "deserialize_level")]
    pub body_birth_date_level: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_level")]
    pub body_name_level: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_level")]
    pub body_piece_number_level: Option<i64>,
}

impl IdentityCheckContent for JouveContent {
    fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    fn civility(&self) -> Option<&str> {
        self.gender.as_deref()
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
        self.phone_number.as_deref()
    }

    fn id_piece_number(&self) -> Option<&str> {
        self.body_piece_number.as_deref()
    }

    fn registration_datetime(&self) -> Option<NaiveDateTime> {
        self.registration_date
    }
}
