mod config;
mod duplicates;
mod id_piece;
mod jouve;
mod names;
mod policy;
mod profiling;
mod rules;
mod ubble;

pub use config::{EvaluationConfig, JouveThresholds};
pub use duplicates::{find_duplicate_beneficiary, PersonQuery};
pub use id_piece::{is_valid_id_piece_number, normalize_id_piece_number};
pub use names::{fold_name, names_match, LatinNameValidator, NameValidator};
pub use policy::{
    aggregate_status, append_reason, AggregateVerdict, FRAUD_RESULT_REASON_SEPARATOR,
};
pub use profiling::{risk_check_status, risk_fraud_status};
pub use ubble::reason_code_message;

use chrono::NaiveDateTime;

use super::content::{
    DmsContent, EduconnectContent, IdentityCheckContent, IdentityContent, JouveContent,
    UbbleContent,
};
use super::domain::{EligibilityType, FraudItem, UserAccount};
use super::eligibility::EligibilityCalculator;
use super::error::FraudError;
use super::repository::FraudRepository;

/// Everything one evaluation pass reads, passed explicitly to every evaluator.
pub struct EvaluationContext<'a> {
    pub user: &'a UserAccount,
    pub config: &'a EvaluationConfig,
    pub repository: &'a dyn FraudRepository,
    pub calculator: &'a dyn EligibilityCalculator,
    pub names: &'a dyn NameValidator,
    /// Program the check is evaluated against.
    pub eligibility: Option<EligibilityType>,
    pub now: NaiveDateTime,
}

impl EvaluationContext<'_> {
    /// Runs the source battery followed by the checks shared by every identity source.
    pub fn evaluate(&self, content: &IdentityContent) -> Result<Vec<FraudItem>, FraudError> {
        let mut items = Vec::new();
        let person_checked = match content {
            IdentityContent::Educonnect(educonnect) => {
                self.educonnect_items(educonnect, &mut items)?
            }
            IdentityContent::Dms(dms) => self.dms_items(dms, &mut items)?,
            IdentityContent::Ubble(ubble) => self.ubble_items(ubble, &mut items)?,
            IdentityContent::Jouve(scan) => self.jouve_items(scan, &mut items)?,
        };
        self.shared_items(content, person_checked, &mut items)?;
        Ok(items)
    }

    fn person_query<'c>(&self, content: &'c dyn IdentityCheckContent) -> Option<PersonQuery<'c>> {
        if !content.has_required_identity() {
            return None;
        }
        Some(PersonQuery {
            first_name: content.first_name()?,
            last_name: content.last_name()?,
            married_name: content.married_name(),
            birth_date: content.birth_date()?,
        })
    }

    /// Pushes the duplicate-person item when the identity is complete, reporting whether it ran.
    fn push_duplicate_person(
        &self,
        content: &dyn IdentityCheckContent,
        items: &mut Vec<FraudItem>,
    ) -> Result<bool, FraudError> {
        let Some(query) = self.person_query(content) else {
            return Ok(false);
        };
        items.push(duplicates::duplicate_user_item(
            self.repository,
            self.user.id,
            query,
        )?);
        Ok(true)
    }

    fn push_duplicate_id_piece_number(
        &self,
        number: Option<&str>,
        items: &mut Vec<FraudItem>,
    ) -> Result<(), FraudError> {
        if let Some(number) = number.filter(|number| !number.trim().is_empty()) {
            items.push(id_piece::duplicate_id_piece_number_item(
                self.repository,
                self.user.id,
                number,
            )?);
        }
        Ok(())
    }

    fn educonnect_items(
        &self,
        content: &EduconnectContent,
        items: &mut Vec<FraudItem>,
    ) -> Result<bool, FraudError> {
        items.push(rules::underage_range_item(
            content.birth_date(),
            self.now.date(),
            self.config,
        ));
        items.push(duplicates::duplicate_ine_item(
            self.repository,
            self.user.id,
            &content.ine_hash,
        )?);
        if self.config.flags.enable_ine_whitelist_filter {
            items.push(duplicates::ine_whitelist_item(
                self.repository,
                &content.ine_hash,
            )?);
        }
        self.push_duplicate_person(content, items)
    }

    fn dms_items(
        &self,
        content: &DmsContent,
        items: &mut Vec<FraudItem>,
    ) -> Result<bool, FraudError> {
        let foreign_procedure = self.config.flags.dms_foreign_id_procedure;
        if foreign_procedure == Some(content.procedure_number) {
            items.push(FraudItem::ok("Identity document is not French"));
        } else {
            items.push(id_piece::id_piece_number_format_item(
                content.id_piece_number(),
            ));
        }
        self.push_duplicate_id_piece_number(content.id_piece_number(), items)?;
        Ok(false)
    }

    fn ubble_items(
        &self,
        content: &UbbleContent,
        items: &mut Vec<FraudItem>,
    ) -> Result<bool, FraudError> {
        let decision = ubble::decision_item(content, self.eligibility, self.config, self.now)?;
        let number = content
            .id_piece_number()
            .filter(|number| !number.trim().is_empty());
        let chain_id_piece_checks = decision.is_ok() || number.is_some();
        items.push(decision);

        if chain_id_piece_checks {
            items.push(id_piece::id_piece_number_format_item(number));
            self.push_duplicate_id_piece_number(number, items)?;
        }
        Ok(false)
    }

    fn jouve_items(
        &self,
        content: &JouveContent,
        items: &mut Vec<FraudItem>,
    ) -> Result<bool, FraudError> {
        items.push(rules::phone_validated_item(self.user));
        let person_checked = self.push_duplicate_person(content, items)?;
        items.push(id_piece::id_piece_number_format_item(
            content.id_piece_number(),
        ));
        self.push_duplicate_id_piece_number(content.id_piece_number(), items)?;
        items.extend(jouve::id_check_items(content, self.config));
        Ok(person_checked)
    }

    fn shared_items(
        &self,
        content: &IdentityContent,
        person_checked: bool,
        items: &mut Vec<FraudItem>,
    ) -> Result<(), FraudError> {
        match (content.first_name(), content.last_name()) {
            (Some(first_name), Some(last_name)) if content.has_required_identity() => {
                if !person_checked {
                    self.push_duplicate_person(content, items)?;
                }
                items.push(rules::names_item(
                    first_name,
                    last_name,
                    self.names,
                    self.config,
                ));
                items.push(rules::eligibility_item(
                    self.user,
                    self.eligibility,
                    self.calculator,
                ));
            }
            _ => items.push(rules::missing_required_data_item()),
        }

        items.push(rules::active_deposit_item(
            self.user,
            self.eligibility,
            self.now,
        ));
        items.push(rules::email_validated_item(self.user));
        Ok(())
    }
}
