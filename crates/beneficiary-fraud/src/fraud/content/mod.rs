//! Normalised identity content, one variant per identity-check source.

mod dms;
mod educonnect;
mod jouve;
pub mod parsers;
mod profiling;
mod ubble;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use dms::DmsContent;
pub use educonnect::EduconnectContent;
pub use jouve::JouveContent;
pub use profiling::{
    PhoneValidationContent, ProfileCompletionContent, UserProfilingContent,
    UserProfilingRiskRating,
};
pub use ubble::{UbbleContent, UbbleIdentificationStatus, UbbleScore, UbbleSubCheck};

use super::domain::{EligibilityType, FraudCheckType};
use super::eligibility::EligibilityCalculator;

/// Accessors shared by every identity source.
///
/// Birth date and names are required methods so each variant states how it supplies them;
/// `None` means the payload lacked the field and evaluators report missing data.
pub trait IdentityCheckContent {
    fn birth_date(&self) -> Option<NaiveDate>;
    fn first_name(&self) -> Option<&str>;
    fn last_name(&self) -> Option<&str>;

    fn married_name(&self) -> Option<&str> {
        None
    }

    fn civility(&self) -> Option<&str> {
        None
    }

    fn address(&self) -> Option<&str> {
        None
    }

    fn postal_code(&self) -> Option<&str> {
        None
    }

    fn city(&self) -> Option<&str> {
        None
    }

    fn phone_number(&self) -> Option<&str> {
        None
    }

    fn id_piece_number(&self) -> Option<&str> {
        None
    }

    fn ine_hash(&self) -> Option<&str> {
        None
    }

    fn registration_datetime(&self) -> Option<NaiveDateTime> {
        None
    }

    /// Eligibility at registration time, unknown when either input is missing.
    fn registration_eligibility(
        &self,
        calculator: &dyn EligibilityCalculator,
    ) -> Option<EligibilityType> {
        let birth_date = self.birth_date()?;
        let registered_at = self.registration_datetime()?;
        calculator.eligibility_at(birth_date, registered_at)
    }

    /// True when first name, last name and birth date are all usable.
    fn has_required_identity(&self) -> bool {
        let filled = |value: Option<&str>| value.is_some_and(|text| !text.trim().is_empty());
        filled(self.first_name()) && filled(self.last_name()) && self.birth_date().is_some()
    }
}

/// Closed set of identity content variants.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityContent {
    Educonnect(EduconnectContent),
    Dms(DmsContent),
    Jouve(JouveContent),
    Ubble(UbbleContent),
}

impl IdentityContent {
    pub fn parse(check_type: FraudCheckType, value: &Value) -> Result<Self, ContentError> {
        let decode_error = |source| ContentError::Malformed { check_type, source };
        let content = match check_type {
            FraudCheckType::Educonnect => IdentityContent::Educonnect(
                EduconnectContent::deserialize(value).map_err(decode_error)?,
            ),
            FraudCheckType::Dms => {
                IdentityContent::Dms(DmsContent::deserialize(value).map_err(decode_error)?)
            }
            FraudCheckType::Jouve => {
                IdentityContent::Jouve(JouveContent::deserialize(value).map_err(decode_error)?)
            }
            FraudCheckType::Ubble => {
                IdentityContent::Ubble(UbbleContent::deserialize(value).map_err(decode_error)?)
            }
            FraudCheckType::UserProfiling
            | FraudCheckType::PhoneValidation
            | FraudCheckType::ProfileCompletion
            | FraudCheckType::HonorStatement
            | FraudCheckType::InternalReview => {
                return Err(ContentError::NotAnIdentityCheck(check_type))
            }
        };
        Ok(content)
    }

    pub fn check_type(&self) -> FraudCheckType {
        match self {
            IdentityContent::Educonnect(_) => FraudCheckType::Educonnect,
            IdentityContent::Dms(_) => FraudCheckType::Dms,
            IdentityContent::Jouve(_) => FraudCheckType::Jouve,
            IdentityContent::Ubble(_) => FraudCheckType::Ubble,
        }
    }

    pub fn to_value(&self) -> Result<Value, ContentError> {
        let encoded = match self {
            IdentityContent::Educonnect(content) => serde_json::to_value(content),
            IdentityContent::Dms(content) => serde_json::to_value(content),
            IdentityContent::Jouve(content) => serde_json::to_value(content),
            IdentityContent::Ubble(content) => serde_json::to_value(content),
        };
        encoded.map_err(|source| ContentError::Malformed {
            check_type: self.check_type(),
            source,
        })
    }

    fn inner(&self) -> &dyn IdentityCheckContent {
        match self {
            IdentityContent::Educonnect(content) => content,
            IdentityContent::Dms(content) => content,
            IdentityContent::Jouve(content) => content,
            IdentityContent::Ubble(content) => content,
        }
    }
}

impl IdentityCheckContent for IdentityContent {
    fn birth_date(&self) -> Option<NaiveDate> {
        self.inner().birth_date()
    }

    fn first_name(&self) -> Option<&str> {
        self.inner().first_name()
    }

    fn last_name(&self) -> Option<&str> {
        self.inner().last_name()
    }

    fn married_name(&self) -> Option<&str> {
        self.inner().married_name()
    }

    fn civility(&self) -> Option<&str> {
        self.inner().civility()
    }

    fn address(&self) -> Option<&str> {
        self.inner().address()
    }

    fn postal_code(&self) -> Option<&str> {
        self.inner().postal_code()
    }

    fn city(&self) -> Option<&str> {
        self.inner().city()
    }

    fn phone_number(&self) -> Option<&str> {
        self.inner().phone_number()
    }

    fn id_piece_number(&self) -> Option<&str> {
        self.inner().id_piece_number()
    }

    fn ine_hash(&self) -> Option<&str> {
        self.inner().ine_hash()
    }

    fn registration_datetime(&self) -> Option<NaiveDateTime> {
        self.inner().registration_datetime()
    }
}

/// Content stored on any check, parsed back according to the check type.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckContent {
    Identity(IdentityContent),
    UserProfiling(UserProfilingContent),
    ProfileCompletion(ProfileCompletionContent),
    PhoneValidation(PhoneValidationContent),
    Empty,
}

impl CheckContent {
    pub fn parse(check_type: FraudCheckType, value: Option<&Value>) -> Result<Self, ContentError> {
        let Some(value) = value.filter(|value| !value.is_null()) else {
            return Ok(CheckContent::Empty);
        };
        let decode_error = |source| ContentError::Malformed { check_type, source };
        match check_type {
            FraudCheckType::Educonnect
            | FraudCheckType::Dms
            | FraudCheckType::Jouve
            | FraudCheckType::Ubble => {
                IdentityContent::parse(check_type, value).map(CheckContent::Identity)
            }
            FraudCheckType::UserProfiling => UserProfilingContent::deserialize(value)
                .map(CheckContent::UserProfiling)
                .map_err(decode_error),
            FraudCheckType::ProfileCompletion => ProfileCompletionContent::deserialize(value)
                .map(CheckContent::ProfileCompletion)
                .map_err(decode_error),
            FraudCheckType::PhoneValidation => PhoneValidationContent::deserialize(value)
                .map(CheckContent::PhoneValidation)
                .map_err(decode_error),
            FraudCheckType::HonorStatement | FraudCheckType::InternalReview => {
                Ok(CheckContent::Empty)
            }
        }
    }

    pub fn identity(&self) -> Option<&IdentityContent> {
        match self {
            CheckContent::Identity(content) => Some(content),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{check_type} content is malformed: {source}")]
    Malformed {
        check_type: FraudCheckType,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} checks carry no identity content")]
    NotAnIdentityCheck(FraudCheckType),
    #[error("{0} check has no content")]
    Missing(FraudCheckType),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedEligibility(Option<EligibilityType>);

    impl EligibilityCalculator for FixedEligibility {
        fn underage_ages(&self) -> std::ops::RangeInclusive<i32> {
            15..=17
        }

        fn adult_age(&self) -> i32 {
            18
        }

        fn eligibility_at(&self, _: NaiveDate, _: NaiveDateTime) -> Option<EligibilityType> {
            self.0
        }
    }

    #[test]
    fn educonnect_payload_round_trips_through_the_check_blob() {
        let value = json!({
            "birth_date": "2006-02-01",
            "educonnect_id": "edu-1",
            "first_name": "Lucie",
            "last_name": "Ellingson",
            "ine_hash": "5ba682c0fc6a05edf07cd8ed0219258f",
            "registration_datetime": "2022-03-01T10:00:00",
        });

        let content = IdentityContent::parse(FraudCheckType::Educonnect, &value).expect("parses");
        assert_eq!(content.check_type(), FraudCheckType::Educonnect);
        assert_eq!(content.ine_hash(), Some("5ba682c0fc6a05edf07cd8ed0219258f"));
        assert!(content.has_required_identity());

        let reparsed = IdentityContent::parse(
            FraudCheckType::Educonnect,
            &content.to_value().expect("encodes"),
        )
        .expect("re-parses");
        assert_eq!(reparsed, content);
    }

    #[test]
    fn jouve_accepts_legacy_dates_and_text_levels() {
        let value = json!({
            "firstName": "Charles-Apollon",
            "lastName": "Martin",
            "birthDate": "09/03/2004",
            "registrationDate": "03/09/2022 11:45 PM",
            "bodyNameLevel": "illisible",
            "bodyBirthDateLevel": 100,
            "bodyPieceNumber": "U 13884935",
        });

        let content = IdentityContent::parse(FraudCheckType::Jouve, &value).expect("parses");
        let IdentityContent::Jouve(jouve) = &content else {
            panic!("expected jouve content, got {content:?}");
        };
        assert_eq!(jouve.body_name_level, None);
        assert_eq!(jouve.body_birth_date_level, Some(100));
        assert_eq!(
            content.birth_date(),
            NaiveDate::from_ymd_opt(2004, 3, 9)
        );
        assert_eq!(content.id_piece_number(), Some("U 13884935"));
    }

    #[test]
    fn registration_eligibility_is_unknown_without_timestamp() {
        let content = UbbleContent {
            birth_date: NaiveDate::from_ymd_opt(2004, 1, 1),
            ..UbbleContent::default()
        };
        let calculator = FixedEligibility(Some(EligibilityType::Age18));
        assert_eq!(content.registration_eligibility(&calculator), None);

        let content = UbbleContent {
            registration_datetime: NaiveDate::from_ymd_opt(2022, 1, 1)
                .and_then(|date| date.and_hms_opt(0, 0, 0)),
            ..content
        };
        assert_eq!(
            content.registration_eligibility(&calculator),
            Some(EligibilityType::Age18)
        );
    }

    #[test]
    fn missing_names_are_not_required_identity() {
        let content = JouveContent {
            first_name: Some("  ".to_string()),
            last_name: Some("Martin".to_string()),
            birth_date: NaiveDate::from_ymd_opt(2004, 1, 1),
            ..JouveContent::default()
        };
        assert!(!content.has_required_identity());
    }

    #[test]
    fn non_identity_types_are_rejected() {
        match IdentityContent::parse(FraudCheckType::HonorStatement, &json!({})) {
            Err(ContentError::NotAnIdentityCheck(FraudCheckType::HonorStatement)) => {}
            other => panic!("expected non identity error, got {other:?}"),
        }
    }

    #[test]
    fn profiling_content_is_parsed_by_type() {
        let content = CheckContent::parse(
            FraudCheckType::UserProfiling,
            Some(&json!({"risk_rating": "high", "session_id": "s-1"})),
        )
        .expect("parses");
        match content {
            CheckContent::UserProfiling(profiling) => {
                assert_eq!(profiling.risk_rating, UserProfilingRiskRating::High)
            }
            other => panic!("expected profiling content, got {other:?}"),
        }
        assert_eq!(
            CheckContent::parse(FraudCheckType::Dms, None).expect("empty"),
            CheckContent::Empty
        );
    }
}
