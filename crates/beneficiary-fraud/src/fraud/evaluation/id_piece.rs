use std::sync::LazyLock;

use regex::Regex;

use super::super::domain::{FraudItem, FraudReasonCode, UserId};
use super::super::repository::{FraudRepository, RepositoryError};

/// National identity document layouts, anchored so only a full match counts.
const ID_PIECE_NUMBER_PATTERN: &str = concat!(
    r"^(?:",
    r"\d{18}",              // 18 digits
    r"|\w{8,12}",           // 8 to 12 alphanumerics
    r"|[\s\w]{14}",         // French card with inner spaces
    r"|\w\d{6}",            // one letter, 6 digits
    r"|\w\s*\d{8}",         // one letter, 8 digits
    r"|\w{2}\s*\d{7}",      // two letters, 7 digits
    r"|\d{3}-\d{7}-\d{2}",  // Belgium
    r"|\d{7}",              // 7 digits
    r"|[A-Z]{3}\s*\d{6}",   // Poland
    r"|(?:\d\s*){16}\d",    // 17 digits
    r"|\d{6}[A-Za-z]",      // French residence permit
    r"|\d{6,8}-\d{4}",      // Sweden
    r")$",
);

static ID_PIECE_NUMBER_FORMAT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(ID_PIECE_NUMBER_PATTERN).ok());

/// Whitespace-free, uppercase form used for duplicate lookups.
pub fn normalize_id_piece_number(number: &str) -> String {
    number
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Accepts a number matching one of the layouts either as typed or once its spaces are removed.
pub fn is_valid_id_piece_number(number: &str) -> bool {
    let trimmed = number.trim();
    ID_PIECE_NUMBER_FORMAT.as_ref().is_some_and(|format| {
        format.is_match(trimmed) || format.is_match(&normalize_id_piece_number(trimmed))
    })
}

pub fn id_piece_number_format_item(number: Option<&str>) -> FraudItem {
    let number = number.map(str::trim).unwrap_or_default();
    if number.is_empty() {
        return FraudItem::suspicious(
            "Empty id piece number",
            FraudReasonCode::EmptyIdPieceNumber,
        );
    }
    if !is_valid_id_piece_number(number) {
        return FraudItem::suspicious(
            format!("Id piece number format ({number}) is invalid"),
            FraudReasonCode::InvalidIdPieceNumber,
        );
    }
    FraudItem::ok("Id piece number is valid")
}

pub fn duplicate_id_piece_number_item(
    repository: &dyn FraudRepository,
    user_id: UserId,
    number: &str,
) -> Result<FraudItem, RepositoryError> {
    let normalized = normalize_id_piece_number(number);
    match repository.user_by_id_piece_number(&normalized, user_id)? {
        Some(duplicate) => Ok(FraudItem::suspicious(
            format!("Id piece number ({number}) is already used by user {duplicate}"),
            FraudReasonCode::DuplicateIdPieceNumber,
        )
        .with_duplicate(duplicate)),
        None => Ok(FraudItem::ok("Id piece number is unique")),
    }
}
