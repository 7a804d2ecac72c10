use serde_json::{json, Value};

use super::common::*;
use crate::config::FeatureFlags;
use crate::fraud::content::IdentityContent;
use crate::fraud::domain::{
    Deposit, DepositType, EligibilityType, FraudCheckType, FraudItem, FraudReasonCode,
    FraudStatus, UserAccount, UserId, UserRole,
};
use crate::fraud::eligibility::DefaultEligibilityCalculator;
use crate::fraud::error::FraudError;
use crate::fraud::evaluation::{EvaluationConfig, EvaluationContext, LatinNameValidator};
use crate::fraud::memory::InMemoryFraudStore;

fn evaluate_with(
    store: &InMemoryFraudStore,
    user: &UserAccount,
    config: &EvaluationConfig,
    eligibility: Option<EligibilityType>,
    check_type: FraudCheckType,
    payload: &Value,
) -> Result<Vec<FraudItem>, FraudError> {
    let content = IdentityContent::parse(check_type, payload).expect("payload parses");
    let context = EvaluationContext {
        user,
        config,
        repository: store,
        calculator: &DefaultEligibilityCalculator::default(),
        names: &LatinNameValidator,
        eligibility,
        now: now(),
    };
    context.evaluate(&content)
}

fn evaluate(
    user: &UserAccount,
    eligibility: Option<EligibilityType>,
    check_type: FraudCheckType,
    payload: &Value,
) -> Vec<FraudItem> {
    let store = InMemoryFraudStore::new();
    evaluate_with(
        &store,
        user,
        &EvaluationConfig::default(),
        eligibility,
        check_type,
        payload,
    )
    .expect("evaluation succeeds")
}

fn with_code(items: &[FraudItem], code: FraudReasonCode) -> Option<&FraudItem> {
    items.iter().find(|item| item.reason_codes.contains(&code))
}

#[test]
fn ubble_valid_score_with_eligibility_passes_without_codes() {
    let user = applicant(1, 18);
    let items = evaluate(
        &user,
        Some(EligibilityType::Age18),
        FraudCheckType::Ubble,
        &ubble_score_payload(18, 1.0),
    );

    let decision = &items[0];
    assert_eq!(decision.status, FraudStatus::Ok);
    assert!(decision.reason_codes.is_empty());
    assert!(items.iter().all(FraudItem::is_ok), "unexpected items: {items:?}");
}

#[test]
fn ubble_valid_score_without_eligibility_reports_age_bounds() {
    let user = applicant(1, 14);
    let too_young = evaluate(&user, None, FraudCheckType::Ubble, &ubble_score_payload(14, 1.0));
    assert_eq!(too_young[0].status, FraudStatus::Ko);
    assert_eq!(too_young[0].reason_codes, vec![FraudReasonCode::AgeTooYoung]);

    let too_old = evaluate(&user, None, FraudCheckType::Ubble, &ubble_score_payload(25, 1.0));
    assert_eq!(too_old[0].status, FraudStatus::Ko);
    assert_eq!(too_old[0].reason_codes, vec![FraudReasonCode::AgeTooOld]);
}

#[test]
fn ubble_minimum_age_follows_the_credit_cutover() {
    let user = applicant(1, 15);
    let store = InMemoryFraudStore::new();
    let config = EvaluationConfig::with_flags(FeatureFlags {
        credit_v3_cutover: chrono::NaiveDate::from_ymd_opt(2026, 1, 1),
        ..FeatureFlags::default()
    });

    let items = evaluate_with(
        &store,
        &user,
        &config,
        None,
        FraudCheckType::Ubble,
        &ubble_score_payload(15, 1.0),
    )
    .expect("evaluation succeeds");
    assert_eq!(items[0].reason_codes, vec![FraudReasonCode::AgeTooYoung]);
    assert!(items[0].detail.contains("at least 17"));
}

#[test]
fn ubble_invalid_score_with_passing_sub_scores_is_blocked() {
    let user = applicant(1, 18);
    let items = evaluate(
        &user,
        Some(EligibilityType::Age18),
        FraudCheckType::Ubble,
        &ubble_score_payload(18, 0.0),
    );
    assert_eq!(items[0].status, FraudStatus::Ko);
    assert_eq!(items[0].reason_codes, vec![FraudReasonCode::IdCheckBlockedOther]);
}

#[test]
fn ubble_invalid_sub_scores_escalate_to_suspicious() {
    let user = applicant(1, 18);
    let mut payload = ubble_score_payload(18, 0.0);
    payload["expiry_date_score"] = json!(0.0);
    payload["authenticity_score"] = json!("0.0");

    let items = evaluate(&user, Some(EligibilityType::Age18), FraudCheckType::Ubble, &payload);
    assert_eq!(items[0].status, FraudStatus::Suspicious);
    assert_eq!(
        items[0].reason_codes,
        vec![
            FraudReasonCode::IdCheckExpired,
            FraudReasonCode::IdCheckNotAuthentic
        ]
    );
    assert!(items[0].detail.contains("expired"));
}

#[test]
fn ubble_undecidable_score_without_codes_is_unprocessable() {
    let user = applicant(1, 18);
    let items = evaluate(
        &user,
        Some(EligibilityType::Age18),
        FraudCheckType::Ubble,
        &ubble_score_payload(18, -1.0),
    );
    assert_eq!(items[0].status, FraudStatus::Suspicious);
    assert_eq!(items[0].reason_codes, vec![FraudReasonCode::IdCheckUnprocessable]);
}

#[test]
fn ubble_unexpected_score_falls_back_to_blocked() {
    let user = applicant(1, 18);
    let items = evaluate(
        &user,
        Some(EligibilityType::Age18),
        FraudCheckType::Ubble,
        &ubble_score_payload(18, 0.5),
    );
    assert_eq!(items[0].status, FraudStatus::Ko);
    assert_eq!(items[0].reason_codes, vec![FraudReasonCode::IdCheckBlockedOther]);
}

#[test]
fn ubble_status_path_decides_on_status() {
    let user = applicant(1, 18);
    let mut payload = ubble_score_payload(18, -1.0);
    payload["identification_id"] = json!("idv_01hq");
    payload["status"] = json!("approved");
    let approved = evaluate(&user, Some(EligibilityType::Age18), FraudCheckType::Ubble, &payload);
    assert_eq!(approved[0].status, FraudStatus::Ok);

    payload["status"] = json!("declined");
    payload["reason_codes"] = json!(["ID_CHECK_DATA_MATCH"]);
    payload["id_document_number"] = Value::Null;
    let declined = evaluate(&user, Some(EligibilityType::Age18), FraudCheckType::Ubble, &payload);
    assert_eq!(declined[0].status, FraudStatus::Ko);
    assert_eq!(declined[0].reason_codes, vec![FraudReasonCode::IdCheckDataMatch]);
    assert!(
        with_code(&declined, FraudReasonCode::EmptyIdPieceNumber).is_none(),
        "document checks only run on an approved identity or a supplied number"
    );

    payload["status"] = json!("retry_required");
    let retry = evaluate(&user, Some(EligibilityType::Age18), FraudCheckType::Ubble, &payload);
    assert_eq!(retry[0].status, FraudStatus::Suspicious);
}

#[test]
fn ubble_status_path_refuses_intermediate_statuses() {
    let user = applicant(1, 18);
    let store = InMemoryFraudStore::new();
    let mut payload = ubble_score_payload(18, 1.0);
    payload["identification_id"] = json!("idv_01hq");
    payload["status"] = json!("processing");

    match evaluate_with(
        &store,
        &user,
        &EvaluationConfig::default(),
        Some(EligibilityType::Age18),
        FraudCheckType::Ubble,
        &payload,
    ) {
        Err(FraudError::UnhandledProviderStatus(status)) => assert_eq!(status, "processing"),
        other => panic!("expected unhandled status, got {other:?}"),
    }
}

#[test]
fn educonnect_rejects_ages_outside_the_underage_range() {
    for age in [14, 18] {
        let user = applicant(1, age);
        let items = evaluate(
            &user,
            None,
            FraudCheckType::Educonnect,
            &educonnect_payload("Lucie", "Martin", age, "ine-1"),
        );
        let age_item = with_code(&items, FraudReasonCode::AgeNotValid).expect("age item");
        assert_eq!(age_item.status, FraudStatus::Ko);
        assert!(age_item.detail.contains(&format!("Age {age}")));
    }
}

#[test]
fn educonnect_flags_reused_ine_and_whitelist() {
    let mut other = applicant(2, 16);
    other.ine_hash = Some("ine-shared".to_string());
    let store = InMemoryFraudStore::with_users([other]);
    let user = applicant(1, 16);
    let config = EvaluationConfig::with_flags(FeatureFlags {
        enable_ine_whitelist_filter: true,
        ..FeatureFlags::default()
    });

    let items = evaluate_with(
        &store,
        &user,
        &config,
        Some(EligibilityType::Underage),
        FraudCheckType::Educonnect,
        &educonnect_payload("Lucie", "Martin", 16, "ine-shared"),
    )
    .expect("evaluation succeeds");

    let duplicate = with_code(&items, FraudReasonCode::DuplicateIne).expect("duplicate item");
    assert_eq!(duplicate.status, FraudStatus::Suspicious);
    assert_eq!(duplicate.duplicate_user_id, Some(UserId(2)));
    assert!(with_code(&items, FraudReasonCode::IneNotWhitelisted).is_some());

    store.whitelist_ine("ine-shared").expect("whitelisted");
    let items = evaluate_with(
        &store,
        &user,
        &config,
        Some(EligibilityType::Underage),
        FraudCheckType::Educonnect,
        &educonnect_payload("Lucie", "Martin", 16, "ine-shared"),
    )
    .expect("evaluation succeeds");
    assert!(with_code(&items, FraudReasonCode::IneNotWhitelisted).is_none());
}

#[test]
fn duplicate_person_matches_folded_names() {
    let existing = beneficiary(7, "Léa", "Ménard", 16);
    let store = InMemoryFraudStore::with_users([existing]);
    let user = applicant(1, 16);

    let items = evaluate_with(
        &store,
        &user,
        &EvaluationConfig::default(),
        Some(EligibilityType::Underage),
        FraudCheckType::Educonnect,
        &educonnect_payload("LEA", "menard", 16, "ine-1"),
    )
    .expect("evaluation succeeds");

    let duplicate = with_code(&items, FraudReasonCode::DuplicateUser).expect("duplicate item");
    assert_eq!(duplicate.status, FraudStatus::Suspicious);
    assert_eq!(duplicate.duplicate_user_id, Some(UserId(7)));
    assert_eq!(
        items
            .iter()
            .filter(|item| item.detail.to_lowercase().contains("duplicate user"))
            .count(),
        1,
        "the duplicate search runs once per evaluation"
    );
}

#[test]
fn duplicate_person_matches_married_name() {
    let mut existing = beneficiary(7, "Alice", "Ravineau", 18);
    existing.married_name = Some("Durand".to_string());
    let store = InMemoryFraudStore::with_users([existing]);
    let user = applicant(1, 18);

    let items = evaluate_with(
        &store,
        &user,
        &EvaluationConfig::default(),
        Some(EligibilityType::Age18),
        FraudCheckType::Dms,
        &dms_payload("Alice", "DURAND ", 18, "321070751234"),
    )
    .expect("evaluation succeeds");
    let duplicate = with_code(&items, FraudReasonCode::DuplicateUser).expect("duplicate item");
    assert_eq!(duplicate.duplicate_user_id, Some(UserId(7)));
}

#[test]
fn dms_document_number_is_checked_unless_foreign() {
    let user = applicant(1, 18);
    let empty = evaluate(
        &user,
        Some(EligibilityType::Age18),
        FraudCheckType::Dms,
        &dms_payload("Lucie", "Martin", 18, "  "),
    );
    let item = with_code(&empty, FraudReasonCode::EmptyIdPieceNumber).expect("empty item");
    assert_eq!(item.status, FraudStatus::Suspicious);

    let invalid = evaluate(
        &user,
        Some(EligibilityType::Age18),
        FraudCheckType::Dms,
        &dms_payload("Lucie", "Martin", 18, "Passeport n: XXXXX"),
    );
    assert!(with_code(&invalid, FraudReasonCode::InvalidIdPieceNumber).is_some());

    let store = InMemoryFraudStore::new();
    let config = EvaluationConfig::with_flags(FeatureFlags {
        dms_foreign_id_procedure: Some(44623),
        ..FeatureFlags::default()
    });
    let foreign = evaluate_with(
        &store,
        &user,
        &config,
        Some(EligibilityType::Age18),
        FraudCheckType::Dms,
        &dms_payload("Lucie", "Martin", 18, "Passeport n: XXXXX"),
    )
    .expect("evaluation succeeds");
    assert!(with_code(&foreign, FraudReasonCode::InvalidIdPieceNumber).is_none());
    assert!(foreign
        .iter()
        .any(|item| item.is_ok() && item.detail.contains("not French")));
}

#[test]
fn missing_birth_date_reports_missing_data_only() {
    let user = applicant(1, 18);
    let mut payload = dms_payload("Lucie", "Martin", 18, "321070751234");
    payload["birth_date"] = Value::Null;

    let items = evaluate(&user, Some(EligibilityType::Age18), FraudCheckType::Dms, &payload);
    let missing = with_code(&items, FraudReasonCode::MissingRequiredData).expect("missing item");
    assert_eq!(missing.status, FraudStatus::Suspicious);
    assert!(with_code(&items, FraudReasonCode::NameIncorrect).is_none());
    assert!(with_code(&items, FraudReasonCode::NotEligible).is_none());
}

#[test]
fn invalid_names_are_rejected_unless_validation_is_disabled() {
    let user = applicant(1, 18);
    let payload = dms_payload("J0hn", "Martin", 18, "321070751234");
    let items = evaluate(&user, Some(EligibilityType::Age18), FraudCheckType::Dms, &payload);
    let names = with_code(&items, FraudReasonCode::NameIncorrect).expect("names item");
    assert_eq!(names.status, FraudStatus::Ko);
    assert!(names.detail.starts_with("First name \"J0hn\""));

    let store = InMemoryFraudStore::new();
    let config = EvaluationConfig::with_flags(FeatureFlags {
        disable_name_validation: true,
        ..FeatureFlags::default()
    });
    let items = evaluate_with(
        &store,
        &user,
        &config,
        Some(EligibilityType::Age18),
        FraudCheckType::Dms,
        &payload,
    )
    .expect("evaluation succeeds");
    assert!(with_code(&items, FraudReasonCode::NameIncorrect).is_none());
}

#[test]
fn active_deposit_and_unvalidated_email_are_rejected() {
    let mut user = applicant(1, 18);
    user.is_email_validated = false;
    user.deposit = Some(Deposit {
        deposit_type: DepositType::Grant15_17,
        expiration_date: None,
    });

    let items = evaluate(
        &user,
        Some(EligibilityType::Age18),
        FraudCheckType::Dms,
        &dms_payload("Lucie", "Martin", 18, "321070751234"),
    );
    let deposit =
        with_code(&items, FraudReasonCode::AlreadyHasActiveDeposit).expect("deposit item");
    assert_eq!(deposit.status, FraudStatus::Ko);
    assert!(deposit.detail.contains("18 program"));
    assert!(with_code(&items, FraudReasonCode::EmailNotValidated).is_some());
}

#[test]
fn existing_beneficiary_cannot_be_upgraded_again() {
    let mut user = applicant(1, 18);
    user.roles = vec![UserRole::Beneficiary];

    let items = evaluate(
        &user,
        Some(EligibilityType::Age18),
        FraudCheckType::Dms,
        &dms_payload("Lucie", "Martin", 18, "321070751234"),
    );
    let already = with_code(&items, FraudReasonCode::AlreadyBeneficiary).expect("upgrade item");
    assert_eq!(already.status, FraudStatus::Ko);
}

#[test]
fn jouve_controls_run_only_when_enabled() {
    let mut user = applicant(1, 18);
    user.is_phone_validated = false;
    let mut payload = jouve_payload(18);
    payload["bodyNameLevel"] = json!("20");
    payload["bodyNameCtrl"] = json!("KO");

    let disabled = evaluate(&user, Some(EligibilityType::Age18), FraudCheckType::Jouve, &payload);
    assert!(with_code(&disabled, FraudReasonCode::IdCheckInvalid).is_none());
    assert!(with_code(&disabled, FraudReasonCode::PhoneNotValidated).is_some());

    let store = InMemoryFraudStore::new();
    let config = EvaluationConfig::with_flags(FeatureFlags {
        enable_idcheck_fraud_controls: true,
        ..FeatureFlags::default()
    });
    let enabled = evaluate_with(
        &store,
        &user,
        &config,
        Some(EligibilityType::Age18),
        FraudCheckType::Jouve,
        &payload,
    )
    .expect("evaluation succeeds");
    let flagged: Vec<&FraudItem> = enabled
        .iter()
        .filter(|item| item.reason_codes.contains(&FraudReasonCode::IdCheckInvalid))
        .collect();
    assert_eq!(flagged.len(), 2, "unexpected items: {flagged:?}");
    assert!(flagged.iter().all(|item| item.status == FraudStatus::Suspicious));
}
