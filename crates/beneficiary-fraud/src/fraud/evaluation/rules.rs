use chrono::{NaiveDate, NaiveDateTime};

use super::super::domain::{EligibilityType, FraudItem, FraudReasonCode, UserAccount};
use super::super::eligibility::{age_at, EligibilityCalculator};
use super::config::EvaluationConfig;
use super::names::NameValidator;

pub fn missing_required_data_item() -> FraudItem {
    FraudItem::suspicious(
        "First name, last name or birth date is missing from the identity check",
        FraudReasonCode::MissingRequiredData,
    )
}

pub fn underage_range_item(
    birth_date: Option<NaiveDate>,
    today: NaiveDate,
    config: &EvaluationConfig,
) -> FraudItem {
    let Some(birth_date) = birth_date else {
        return missing_required_data_item();
    };
    let age = age_at(birth_date, today);
    if config.underage_ages.contains(&age) {
        FraudItem::ok(format!("Age {age} is within the underage program range"))
    } else {
        FraudItem::ko(
            format!(
                "Age {age} is outside the underage program range ({}-{})",
                config.underage_ages.start(),
                config.underage_ages.end()
            ),
            FraudReasonCode::AgeNotValid,
        )
    }
}

pub fn active_deposit_item(
    user: &UserAccount,
    eligibility: Option<EligibilityType>,
    now: NaiveDateTime,
) -> FraudItem {
    if !user.has_active_deposit(now) {
        return FraudItem::ok("User has no active deposit");
    }
    let detail = match eligibility {
        Some(EligibilityType::Underage) => {
            "User already has an active deposit and cannot receive another underage credit"
        }
        _ => "User already has an active deposit and cannot receive the 18 program credit",
    };
    FraudItem::ko(detail, FraudReasonCode::AlreadyHasActiveDeposit)
}

pub fn eligibility_item(
    user: &UserAccount,
    eligibility: Option<EligibilityType>,
    calculator: &dyn EligibilityCalculator,
) -> FraudItem {
    let Some(eligibility) = eligibility else {
        return FraudItem::ko(
            "User is not eligible to any program",
            FraudReasonCode::NotEligible,
        );
    };
    if calculator.is_eligible_for_upgrade(user, eligibility) {
        FraudItem::ok(format!("User is eligible to the {}", eligibility.program_name()))
    } else {
        FraudItem::ko(
            format!(
                "User is already beneficiary of the {}",
                eligibility.program_name()
            ),
            FraudReasonCode::AlreadyBeneficiary,
        )
    }
}

pub fn names_item(
    first_name: &str,
    last_name: &str,
    validator: &dyn NameValidator,
    config: &EvaluationConfig,
) -> FraudItem {
    if config.flags.disable_name_validation {
        return FraudItem::ok("Name validation is disabled");
    }

    let first_valid = validator.is_valid_name(first_name);
    let last_valid = validator.is_valid_name(last_name);
    let detail = match (first_valid, last_valid) {
        (true, true) => return FraudItem::ok("First and last names are valid"),
        (false, true) => format!("First name \"{first_name}\" contains forbidden characters"),
        (true, false) => format!("Last name \"{last_name}\" contains forbidden characters"),
        (false, false) => format!(
            "First name \"{first_name}\" and last name \"{last_name}\" contain forbidden characters"
        ),
    };
    FraudItem::ko(detail, FraudReasonCode::NameIncorrect)
}

pub fn email_validated_item(user: &UserAccount) -> FraudItem {
    if user.is_email_validated {
        FraudItem::ok("Email is validated")
    } else {
        FraudItem::ko("Email is not validated", FraudReasonCode::EmailNotValidated)
    }
}

pub fn phone_validated_item(user: &UserAccount) -> FraudItem {
    if user.is_phone_validated {
        FraudItem::ok("Phone number is validated")
    } else {
        FraudItem::ko(
            "Phone number is not validated",
            FraudReasonCode::PhoneNotValidated,
        )
    }
}
