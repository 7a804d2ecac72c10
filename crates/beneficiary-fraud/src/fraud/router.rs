use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::content::{ProfileCompletionContent, UserProfilingContent};
use super::domain::{
    EligibilityType, FraudCheckId, FraudCheckType, FraudReasonCode, FraudResultRecord,
    FraudStatus, UserId,
};
use super::error::FraudError;
use super::repository::{FraudRepository, SubscriptionGateway};
use super::review::ManualReviewRequest;
use super::service::{FraudService, PhoneValidationFailure};

/// Router builder exposing the inbound fraud operations as JSON endpoints.
pub fn fraud_router<R, G>(service: Arc<FraudService<R, G>>) -> Router
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    Router::new()
        .route("/api/v1/fraud/checks", post(start_check_handler::<R, G>))
        .route(
            "/api/v1/fraud/checks/failed",
            post(mark_failed_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/checks/:check_id/result",
            post(check_result_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/checks/:check_id/cancel",
            post(cancel_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/checks/:check_id/duplicate",
            get(duplicate_handler::<R, G>).post(invalidate_duplicate_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/users/:user_id/honor-statement",
            post(honor_statement_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/users/:user_id/profile-completion",
            post(profile_completion_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/users/:user_id/profiling",
            post(profiling_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/users/:user_id/phone-validation-failures",
            post(phone_failure_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/users/:user_id/result",
            put(upsert_result_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/users/:user_id/id-piece-number",
            put(id_piece_number_handler::<R, G>),
        )
        .route(
            "/api/v1/fraud/users/:user_id/status",
            get(status_handler::<R, G>),
        )
        .route("/api/v1/fraud/reviews", post(review_handler::<R, G>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct StartCheckRequest {
    pub user_id: UserId,
    pub check_type: FraudCheckType,
    pub third_party_id: String,
    #[serde(default)]
    pub content: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckResultRequest {
    #[serde(default)]
    pub content: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct MarkFailedRequest {
    pub user_id: UserId,
    pub check_type: FraudCheckType,
    pub third_party_id: String,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub reason_codes: Vec<FraudReasonCode>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateRequest {
    pub duplicate_user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct HonorStatementRequest {
    pub origin: String,
    #[serde(default)]
    pub eligibility: Option<EligibilityType>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileCompletionRequest {
    #[serde(default)]
    pub eligibility: Option<EligibilityType>,
    pub content: ProfileCompletionContent,
}

#[derive(Debug, Deserialize)]
pub struct UpsertResultRequest {
    pub status: FraudStatus,
    #[serde(default)]
    pub eligibility: Option<EligibilityType>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reason_codes: Vec<FraudReasonCode>,
}

#[derive(Debug, Deserialize)]
pub struct IdPieceNumberRequest {
    pub id_piece_number: String,
}

/// Read-only summary of a user's fraud state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFraudStatusView {
    pub user_id: UserId,
    pub has_performed_identity_check: bool,
    pub has_pending_identity_check: bool,
    pub is_risky_profile: bool,
    pub is_fraudster: bool,
    pub results: Vec<FraudResultRecord>,
}

pub(crate) async fn start_check_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Json(request): Json<StartCheckRequest>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    let started = service.start_check(
        request.user_id,
        request.check_type,
        &request.third_party_id,
        request.content,
    );
    respond(StatusCode::CREATED, started)
}

pub(crate) async fn check_result_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(check_id): Path<u64>,
    request: Option<Json<CheckResultRequest>>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    let request = request.map(|Json(request)| request).unwrap_or_default();
    respond(
        StatusCode::OK,
        service.on_check_result(FraudCheckId(check_id), request.content),
    )
}

pub(crate) async fn mark_failed_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Json(request): Json<MarkFailedRequest>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    let failed = service.mark_check_failed(
        request.user_id,
        request.check_type,
        &request.third_party_id,
        request.content,
        request.reason_codes,
        request.reason,
    );
    respond(StatusCode::OK, failed)
}

pub(crate) async fn cancel_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(check_id): Path<u64>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    respond(StatusCode::OK, service.cancel_check(FraudCheckId(check_id)))
}

pub(crate) async fn duplicate_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(check_id): Path<u64>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    let duplicate = service
        .get_duplicate_beneficiary(FraudCheckId(check_id))
        .map(|user| json!({ "duplicate_user_id": user.map(|user| user.id) }));
    respond(StatusCode::OK, duplicate)
}

pub(crate) async fn invalidate_duplicate_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(check_id): Path<u64>,
    Json(request): Json<DuplicateRequest>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    respond(
        StatusCode::OK,
        service.invalidate_fraud_check_for_duplicate_user(
            FraudCheckId(check_id),
            request.duplicate_user_id,
        ),
    )
}

pub(crate) async fn honor_statement_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(user_id): Path<u64>,
    Json(request): Json<HonorStatementRequest>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_honor_statement_check(UserId(user_id), &request.origin, request.eligibility),
    )
}

pub(crate) async fn profile_completion_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(user_id): Path<u64>,
    Json(request): Json<ProfileCompletionRequest>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    respond(
        StatusCode::OK,
        service.create_profile_completion_check(
            UserId(user_id),
            request.eligibility,
            request.content,
        ),
    )
}

pub(crate) async fn profiling_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(user_id): Path<u64>,
    Json(content): Json<UserProfilingContent>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    respond(
        StatusCode::CREATED,
        service.on_user_profiling_result(UserId(user_id), content),
    )
}

pub(crate) async fn phone_failure_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(user_id): Path<u64>,
    Json(failure): Json<PhoneValidationFailure>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    respond(
        StatusCode::CREATED,
        service.record_phone_validation_failure(UserId(user_id), failure),
    )
}

pub(crate) async fn upsert_result_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(user_id): Path<u64>,
    Json(request): Json<UpsertResultRequest>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    let upserted = service.upsert_fraud_result(
        UserId(user_id),
        request.status,
        request.eligibility,
        request.reason.as_deref(),
        request.reason_codes,
    );
    respond(StatusCode::OK, upserted)
}

pub(crate) async fn id_piece_number_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(user_id): Path<u64>,
    Json(request): Json<IdPieceNumberRequest>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    match service.admin_update_id_piece_number(UserId(user_id), &request.id_piece_number) {
        Ok(Some(check)) => (StatusCode::OK, Json(check)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Path(user_id): Path<u64>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    respond(StatusCode::OK, status_view(&service, UserId(user_id)))
}

pub(crate) async fn review_handler<R, G>(
    State(service): State<Arc<FraudService<R, G>>>,
    Json(request): Json<ManualReviewRequest>,
) -> Response
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    respond(StatusCode::CREATED, service.record_manual_review(request))
}

fn status_view<R, G>(
    service: &FraudService<R, G>,
    user_id: UserId,
) -> Result<UserFraudStatusView, FraudError>
where
    R: FraudRepository + 'static,
    G: SubscriptionGateway + 'static,
{
    Ok(UserFraudStatusView {
        user_id,
        has_performed_identity_check: service.has_user_performed_identity_check(user_id)?,
        has_pending_identity_check: service.has_user_pending_identity_check(user_id)?,
        is_risky_profile: service.is_risky_user_profile(user_id)?,
        is_fraudster: service.is_user_fraudster(user_id)?,
        results: service.repository().results_for_user(user_id)?,
    })
}

fn respond<T: Serialize>(status: StatusCode, outcome: Result<T, FraudError>) -> Response {
    match outcome {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: FraudError) -> Response {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(%error, "fraud request failed");
    }
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
