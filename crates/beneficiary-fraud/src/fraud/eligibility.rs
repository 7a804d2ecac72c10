//! Age computation and the eligibility-at-date decision.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::domain::{EligibilityType, UserAccount, UserRole};

/// Full years elapsed between `birth_date` and `at`.
pub fn age_at(birth_date: NaiveDate, at: NaiveDate) -> i32 {
    let mut age = at.year() - birth_date.year();
    if (at.month(), at.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Age and role rules that decide which program applies at a given date.
pub trait EligibilityCalculator: Send + Sync {
    /// Ages granted the underage program.
    fn underage_ages(&self) -> RangeInclusive<i32>;

    /// Age granted the adult program.
    fn adult_age(&self) -> i32;

    fn eligibility_at(&self, birth_date: NaiveDate, at: NaiveDateTime) -> Option<EligibilityType>;

    /// Whether the user can still be granted `eligibility`.
    fn is_eligible_for_upgrade(&self, user: &UserAccount, eligibility: EligibilityType) -> bool {
        match eligibility {
            EligibilityType::Underage => {
                !user.has_role(UserRole::UnderageBeneficiary)
                    && !user.has_role(UserRole::Beneficiary)
            }
            EligibilityType::Age18 => !user.has_role(UserRole::Beneficiary),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DefaultEligibilityCalculator {
    underage_ages: RangeInclusive<i32>,
    adult_age: i32,
}

impl DefaultEligibilityCalculator {
    pub fn new(underage_ages: RangeInclusive<i32>, adult_age: i32) -> Self {
        Self {
            underage_ages,
            adult_age,
        }
    }
}

impl Default for DefaultEligibilityCalculator {
    fn default() -> Self {
        Self::new(15..=17, 18)
    }
}

impl EligibilityCalculator for DefaultEligibilityCalculator {
    fn underage_ages(&self) -> RangeInclusive<i32> {
        self.underage_ages.clone()
    }

    fn adult_age(&self) -> i32 {
        self.adult_age
    }

    fn eligibility_at(&self, birth_date: NaiveDate, at: NaiveDateTime) -> Option<EligibilityType> {
        let age = age_at(birth_date, at.date());
        if self.underage_ages.contains(&age) {
            Some(EligibilityType::Underage)
        } else if age == self.adult_age {
            Some(EligibilityType::Age18)
        } else {
            None
        }
    }
}

/// Reconciles eligibility today with eligibility at registration.
///
/// `earliest_adult_registration` is only consulted for users aged exactly one year past
/// the adult age whose other inputs resolve to nothing. A failing lookup is returned as is.
pub fn decide_eligibility<E>(
    calculator: &dyn EligibilityCalculator,
    birth_date: NaiveDate,
    registered_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
    earliest_adult_registration: impl FnOnce() -> Result<Option<NaiveDateTime>, E>,
) -> Result<Option<EligibilityType>, E> {
    let underage_minimum = *calculator.underage_ages().start();
    let adult_age = calculator.adult_age();

    let age = age_at(birth_date, now.date());
    if age < underage_minimum {
        return Ok(None);
    }
    if age < adult_age {
        return Ok(Some(EligibilityType::Underage));
    }
    if age == adult_age {
        return Ok(Some(EligibilityType::Age18));
    }

    let today = calculator.eligibility_at(birth_date, now);
    if today == Some(EligibilityType::Age18) {
        return Ok(today);
    }

    let at_registration = registered_at
        .and_then(|registered_at| calculator.eligibility_at(birth_date, registered_at));

    if today.is_none() && at_registration.is_none() && age == adult_age + 1 {
        return Ok(earliest_adult_registration()?
            .and_then(|registered_at| calculator.eligibility_at(birth_date, registered_at)));
    }

    Ok(at_registration)
}
