use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Json,
};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::fraud::domain::{FraudCheckStatus, FraudCheckType, UserId};
use crate::fraud::repository::FraudRepository;
use crate::fraud::router::{
    cancel_handler, check_result_handler, id_piece_number_handler, start_check_handler,
    IdPieceNumberRequest, StartCheckRequest,
};

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn start_check_handler_creates_then_refuses_the_same_key() {
    let (service, _, _) = build_service(vec![applicant(1, 18)]);
    let service = Arc::new(service);
    let request = || StartCheckRequest {
        user_id: UserId(1),
        check_type: FraudCheckType::Ubble,
        third_party_id: "ubble-1".to_string(),
        content: None,
    };

    let created = start_check_handler(State(service.clone()), Json(request())).await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let conflict = start_check_handler(State(service), Json(request())).await;
    assert_eq!(conflict.status(), StatusCode::CONFLICT);
    let body = read_json_body(conflict).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("ubble-1")));
}

#[tokio::test]
async fn unknown_checks_are_not_found() {
    let (service, _, _) = build_service(vec![applicant(1, 18)]);
    let service = Arc::new(service);

    let response = cancel_handler(State(service.clone()), Path(404)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = check_result_handler(State(service), Path(404), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn id_piece_number_update_without_check_has_no_content() {
    let (service, _, _) = build_service(vec![applicant(1, 18)]);

    let response = id_piece_number_handler(
        State(Arc::new(service)),
        Path(1),
        Json(IdPieceNumberRequest {
            id_piece_number: "321070751234".to_string(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn router_evaluates_a_started_check() {
    let (service, _, _) = build_service(vec![applicant(1, 16)]);
    let router = router_with_service(service);

    let started = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/fraud/checks",
            json!({
                "user_id": 1,
                "check_type": "EDUCONNECT",
                "third_party_id": "edu-1",
                "content": educonnect_payload("Lucie", "Martin", 16, "ine-1"),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(started.status(), StatusCode::CREATED);
    let check = read_json_body(started).await;
    let check_id = check["id"].as_u64().expect("check id");

    let evaluated = router
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/fraud/checks/{check_id}/result"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(evaluated.status(), StatusCode::OK);
    let verdict = read_json_body(evaluated).await;
    assert_eq!(verdict["result"]["status"], "OK");
    assert_eq!(verdict["result"]["eligibility"], "UNDERAGE");

    let status = router
        .oneshot(
            Request::get("/api/v1/fraud/users/1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(status.status(), StatusCode::OK);
    let view = read_json_body(status).await;
    assert_eq!(view["has_performed_identity_check"], true);
    assert_eq!(view["has_pending_identity_check"], false);
    assert_eq!(view["is_fraudster"], false);
}

#[tokio::test]
async fn router_rejects_unreasoned_overrides() {
    let (service, _, _) = build_service(vec![applicant(1, 18)]);
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/fraud/users/1/result",
            json!({ "status": "KO" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn router_records_phone_failures_and_profiling() {
    let (service, store, gateway) = build_service(vec![applicant(1, 18)]);
    let router = router_with_service(service);

    let failure = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/fraud/users/1/phone-validation-failures",
            json!({ "kind": "sms_sending_limit_reached" }),
        ))
        .await
        .unwrap();
    assert_eq!(failure.status(), StatusCode::CREATED);

    let profiling = router
        .oneshot(json_request(
            "POST",
            "/api/v1/fraud/users/1/profiling",
            json!({ "risk_rating": "high", "session_id": "session-9" }),
        ))
        .await
        .unwrap();
    assert_eq!(profiling.status(), StatusCode::CREATED);

    let checks = store.checks_for_user(UserId(1)).expect("checks");
    assert_eq!(checks.len(), 2);
    assert!(checks
        .iter()
        .all(|check| check.status == FraudCheckStatus::Ko));
    assert_eq!(gateway.events().len(), 1);
}

#[tokio::test]
async fn router_records_a_manual_review() {
    let (service, store, _) = build_service(vec![applicant(1, 18)]);
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/fraud/reviews",
            json!({
                "user_id": 1,
                "reviewer_id": 900,
                "decision": "KO",
                "reason": "forged document",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(store.reviews_for_user(UserId(1)).expect("reviews").len(), 1);
}
