use std::sync::Arc;

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};

use crate::config::FeatureFlags;
use crate::fraud::clock::FixedClock;
use crate::fraud::domain::{
    FraudCheckRecord, FraudCheckStatus, FraudCheckType, UserAccount, UserId, UserRole,
};
use crate::fraud::memory::{InMemoryFraudStore, RecordingGateway};
use crate::fraud::repository::FraudRepository;
use crate::fraud::{fraud_router, EvaluationConfig, FraudService};

pub(super) type TestService = FraudService<InMemoryFraudStore, RecordingGateway>;

pub(super) fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 15)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .expect("valid timestamp")
}

/// Birth date of someone who turned `age` in January of the fixture year.
pub(super) fn born_aged(age: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026 - age, 1, 10).expect("valid date")
}

pub(super) fn applicant(id: u64, age: i32) -> UserAccount {
    let mut user = UserAccount::new(UserId(id), format!("applicant{id}@example.org"));
    user.first_name = Some("Lucie".to_string());
    user.last_name = Some(format!("Martin{id}"));
    user.birth_date = Some(born_aged(age));
    user.is_email_validated = true;
    user.is_phone_validated = true;
    user
}

pub(super) fn beneficiary(id: u64, first_name: &str, last_name: &str, age: i32) -> UserAccount {
    let mut user = UserAccount::new(UserId(id), format!("beneficiary{id}@example.org"));
    user.first_name = Some(first_name.to_string());
    user.last_name = Some(last_name.to_string());
    user.validated_birth_date = Some(born_aged(age));
    user.is_email_validated = true;
    user.roles = vec![UserRole::Beneficiary];
    user
}

pub(super) fn educonnect_payload(first_name: &str, last_name: &str, age: i32, ine: &str) -> Value {
    json!({
        "birth_date": born_aged(age).to_string(),
        "educonnect_id": format!("edu-{ine}"),
        "first_name": first_name,
        "last_name": last_name,
        "ine_hash": ine,
        "registration_datetime": "2026-03-01T09:00:00",
    })
}

pub(super) fn dms_payload(first_name: &str, last_name: &str, age: i32, number: &str) -> Value {
    json!({
        "application_number": 4512,
        "procedure_number": 44623,
        "email": "applicant@example.org",
        "first_name": first_name,
        "last_name": last_name,
        "birth_date": born_aged(age).to_string(),
        "id_piece_number": number,
        "postal_code": "75011",
        "city": "Paris",
        "registration_datetime": "2026-03-01T09:00:00+01:00",
    })
}

/// Score-path identification (no status prefix) with the given global score.
pub(super) fn ubble_score_payload(age: i32, score: f64) -> Value {
    json!({
        "identification_id": "29d9eca4-dce6-49ed-b1b5-8bb0179493a8",
        "score": score,
        "reference_data_check_score": 1.0,
        "supported": 1.0,
        "expiry_date_score": 1.0,
        "authenticity_score": 1.0,
        "first_name": "Lucie",
        "last_name": "Martin",
        "birth_date": born_aged(age).to_string(),
        "id_document_number": "120761108567",
        "registration_datetime": "2026-03-01T09:00:00",
    })
}

pub(super) fn jouve_payload(age: i32) -> Value {
    json!({
        "id": 35,
        "firstName": "Lucie",
        "lastName": "Martin",
        "birthDate": born_aged(age).format("%d/%m/%Y").to_string(),
        "bodyPieceNumber": "140767100016",
        "registrationDate": "03/01/2026 09:00 AM",
        "bodyBirthDateCtrl": "OK",
        "bodyNameCtrl": "OK",
        "bodyPieceNumberCtrl": "OK",
        "birthLocationCtrl": "OK",
        "bodyBirthDateLevel": 100,
        "bodyNameLevel": 80,
        "bodyPieceNumberLevel": 90,
    })
}

pub(super) fn build_service(
    users: Vec<UserAccount>,
) -> (TestService, Arc<InMemoryFraudStore>, Arc<RecordingGateway>) {
    build_service_with_flags(users, FeatureFlags::default())
}

pub(super) fn build_service_with_flags(
    users: Vec<UserAccount>,
    flags: FeatureFlags,
) -> (TestService, Arc<InMemoryFraudStore>, Arc<RecordingGateway>) {
    let store = Arc::new(InMemoryFraudStore::with_users(users));
    let gateway = Arc::new(RecordingGateway::new());
    let service = FraudService::new(
        store.clone(),
        gateway.clone(),
        EvaluationConfig::with_flags(flags),
    )
    .with_clock(Arc::new(FixedClock(now())));
    (service, store, gateway)
}

/// Stores an already evaluated identity check, bypassing the provider round trip.
pub(super) fn seed_check(
    store: &InMemoryFraudStore,
    user_id: UserId,
    check_type: FraudCheckType,
    third_party_id: &str,
    content: Option<Value>,
    status: FraudCheckStatus,
) -> FraudCheckRecord {
    let mut record = FraudCheckRecord::new(user_id, check_type, third_party_id, status, now());
    record.result_content = content;
    store.insert_check(record).expect("check stored")
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    fraud_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
