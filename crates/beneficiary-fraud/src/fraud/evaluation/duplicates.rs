use chrono::NaiveDate;

use super::super::domain::{FraudItem, FraudReasonCode, UserAccount, UserId};
use super::super::repository::{FraudRepository, RepositoryError};
use super::names::names_match;

/// Identity fields a duplicate-person search runs on.
#[derive(Debug, Clone, Copy)]
pub struct PersonQuery<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub married_name: Option<&'a str>,
    pub birth_date: NaiveDate,
}

/// Finds a confirmed beneficiary describing the same person.
///
/// Candidates must share the first name and birth date. Last names are then compared
/// last-to-last, then the beneficiary's married name against the candidate's last name,
/// then the beneficiary's last name against the candidate's married name.
pub fn find_duplicate_beneficiary(
    repository: &dyn FraudRepository,
    user_id: UserId,
    query: PersonQuery<'_>,
) -> Result<Option<UserAccount>, RepositoryError> {
    let candidates: Vec<UserAccount> = repository
        .beneficiaries_born_on(query.birth_date, user_id)?
        .into_iter()
        .filter(|beneficiary| beneficiary.id != user_id && beneficiary.is_beneficiary())
        .filter(|beneficiary| {
            beneficiary
                .first_name
                .as_deref()
                .is_some_and(|first_name| names_match(first_name, query.first_name))
        })
        .collect();

    let by_last_name = |beneficiary: &&UserAccount| {
        beneficiary
            .last_name
            .as_deref()
            .is_some_and(|last_name| names_match(last_name, query.last_name))
    };
    let by_married_name = |beneficiary: &&UserAccount| {
        beneficiary
            .married_name
            .as_deref()
            .is_some_and(|married_name| names_match(married_name, query.last_name))
    };
    let by_candidate_married_name = |beneficiary: &&UserAccount| {
        query.married_name.is_some_and(|married_name| {
            beneficiary
                .last_name
                .as_deref()
                .is_some_and(|last_name| names_match(last_name, married_name))
        })
    };

    let found = candidates
        .iter()
        .find(by_last_name)
        .or_else(|| candidates.iter().find(by_married_name))
        .or_else(|| candidates.iter().find(by_candidate_married_name));

    Ok(found.cloned())
}

pub fn duplicate_user_item(
    repository: &dyn FraudRepository,
    user_id: UserId,
    query: PersonQuery<'_>,
) -> Result<FraudItem, RepositoryError> {
    match find_duplicate_beneficiary(repository, user_id, query)? {
        Some(duplicate) => Ok(FraudItem::suspicious(
            format!("Duplicate user of beneficiary {}", duplicate.id),
            FraudReasonCode::DuplicateUser,
        )
        .with_duplicate(duplicate.id)),
        None => Ok(FraudItem::ok("No duplicate user found")),
    }
}

pub fn duplicate_ine_item(
    repository: &dyn FraudRepository,
    user_id: UserId,
    ine_hash: &str,
) -> Result<FraudItem, RepositoryError> {
    match repository.user_by_ine_hash(ine_hash, user_id)? {
        Some(duplicate) => Ok(FraudItem::suspicious(
            format!("INE hash is already used by user {duplicate}"),
            FraudReasonCode::DuplicateIne,
        )
        .with_duplicate(duplicate)),
        None => Ok(FraudItem::ok("INE hash is unique")),
    }
}

pub fn ine_whitelist_item(
    repository: &dyn FraudRepository,
    ine_hash: &str,
) -> Result<FraudItem, RepositoryError> {
    if repository.is_ine_whitelisted(ine_hash)? {
        Ok(FraudItem::ok("INE is whitelisted"))
    } else {
        Ok(FraudItem::suspicious(
            "INE is not whitelisted",
            FraudReasonCode::IneNotWhitelisted,
        ))
    }
}
