//! HTTP request handlers for the Tip Pool Engine API.
//!
//! Handlers are thin: they decode the request, call one engine operation,
//! and map [`EngineError`](crate::error::EngineError) through
//! [`ApiErrorResponse`].

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{
    DistributionRule, FinalizeOutcome, NewDistributionRule, PoolCalculation, Shift, TipDispute,
    TipPoolDetails, TipPoolSummary, UserPayout,
};
use crate::store::TipStore;

use super::request::{
    CalculatePoolRequest, FinalizePoolRequest, OpenDisputeRequest, PoolSummaryQuery,
    RecordShiftRequest, ResolveDisputeRequest, UserPayoutsQuery,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

type ApiResult<T> = Result<T, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router<S: TipStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tip-pools", get(list_pools::<S>))
        .route("/tip-pools/calculate", post(calculate_pool::<S>))
        .route("/tip-pools/:id", get(get_pool::<S>))
        .route("/tip-pools/:id/finalize", post(finalize_pool::<S>))
        .route("/tip-pools/:id/payout-count", get(count_payouts::<S>))
        .route("/tip-pools/:id/disputes", get(list_pool_disputes::<S>))
        .route("/users/:id/payouts", get(user_payouts::<S>))
        .route(
            "/distribution-rules",
            get(list_rules::<S>).post(create_rule::<S>),
        )
        .route("/shifts", post(record_shift::<S>))
        .route("/payouts/:id/disputes", post(open_dispute::<S>))
        .route("/disputes/:id/resolve", post(resolve_dispute::<S>))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Unwraps a JSON body, turning serde failures into the API error body.
fn body<T>(correlation_id: Uuid, payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(correlation_id = %correlation_id, error = %body_text, "JSON data error");
                    if body_text.contains("missing field") {
                        ApiError::new("VALIDATION_ERROR", body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            Err(ApiErrorResponse::bad_request(error))
        }
    }
}

fn query<T>(correlation_id: Uuid, params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params.map(|Query(value)| value).map_err(|rejection| {
        warn!(correlation_id = %correlation_id, error = %rejection, "Invalid query string");
        ApiErrorResponse::bad_request(ApiError::invalid_query(rejection.body_text()))
    })
}

fn failed(correlation_id: Uuid, operation: &'static str, err: EngineError) -> ApiErrorResponse {
    warn!(correlation_id = %correlation_id, operation, error = %err, "Request failed");
    err.into()
}

/// Handler for `POST /tip-pools/calculate`.
async fn calculate_pool<S: TipStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CalculatePoolRequest>, JsonRejection>,
) -> ApiResult<Json<PoolCalculation>> {
    let correlation_id = Uuid::new_v4();
    let request = body(correlation_id, payload)?;
    info!(
        correlation_id = %correlation_id,
        shift_date = %request.date,
        distribution_rule_id = request.distribution_rule_id,
        "Processing tip pool calculation"
    );

    state
        .engine()
        .calculate_tip_pool(
            request.date,
            request.distribution_rule_id,
            request.calculated_by,
        )
        .await
        .map(Json)
        .map_err(|err| failed(correlation_id, "calculate_tip_pool", err))
}

/// Handler for `POST /tip-pools/{id}/finalize`.
async fn finalize_pool<S: TipStore>(
    State(state): State<AppState<S>>,
    Path(pool_id): Path<i64>,
    payload: Result<Json<FinalizePoolRequest>, JsonRejection>,
) -> ApiResult<Json<FinalizeOutcome>> {
    let correlation_id = Uuid::new_v4();
    let request = body(correlation_id, payload)?;

    state
        .engine()
        .finalize_tip_pool(pool_id, request.finalized_by)
        .await
        .map(Json)
        .map_err(|err| failed(correlation_id, "finalize_tip_pool", err))
}

/// Handler for `GET /tip-pools`.
async fn list_pools<S: TipStore>(
    State(state): State<AppState<S>>,
    params: Result<Query<PoolSummaryQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TipPoolSummary>>> {
    let correlation_id = Uuid::new_v4();
    let params = query(correlation_id, params)?;

    state
        .engine()
        .get_tip_pool_summary(params.start_date, params.end_date, params.user_id)
        .await
        .map(Json)
        .map_err(|err| failed(correlation_id, "get_tip_pool_summary", err))
}

/// Handler for `GET /tip-pools/{id}`.
async fn get_pool<S: TipStore>(
    State(state): State<AppState<S>>,
    Path(pool_id): Path<i64>,
) -> ApiResult<Json<TipPoolDetails>> {
    state
        .engine()
        .get_tip_pool(pool_id)
        .await
        .map(Json)
        .map_err(|err| failed(Uuid::new_v4(), "get_tip_pool", err))
}

/// Handler for `GET /tip-pools/{id}/payout-count`.
async fn count_payouts<S: TipStore>(
    State(state): State<AppState<S>>,
    Path(pool_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let count = state
        .engine()
        .count_payouts(pool_id)
        .await
        .map_err(|err| failed(Uuid::new_v4(), "count_payouts", err))?;
    Ok(Json(json!({ "tip_pool_id": pool_id, "count": count })))
}

/// Handler for `GET /tip-pools/{id}/disputes`.
async fn list_pool_disputes<S: TipStore>(
    State(state): State<AppState<S>>,
    Path(pool_id): Path<i64>,
) -> ApiResult<Json<Vec<TipDispute>>> {
    state
        .engine()
        .list_disputes(pool_id)
        .await
        .map(Json)
        .map_err(|err| failed(Uuid::new_v4(), "list_disputes", err))
}

/// Handler for `GET /users/{id}/payouts`.
async fn user_payouts<S: TipStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<i64>,
    params: Result<Query<UserPayoutsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<UserPayout>>> {
    let correlation_id = Uuid::new_v4();
    let params = query(correlation_id, params)?;

    state
        .engine()
        .get_user_payouts(user_id, params.start_date, params.end_date)
        .await
        .map(Json)
        .map_err(|err| failed(correlation_id, "get_user_payouts", err))
}

/// Handler for `GET /distribution-rules`.
async fn list_rules<S: TipStore>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<Vec<DistributionRule>>> {
    state
        .engine()
        .get_distribution_rules()
        .await
        .map(Json)
        .map_err(|err| failed(Uuid::new_v4(), "get_distribution_rules", err))
}

/// Handler for `POST /distribution-rules`.
async fn create_rule<S: TipStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<NewDistributionRule>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DistributionRule>)> {
    let correlation_id = Uuid::new_v4();
    let rule = body(correlation_id, payload)?;

    state
        .engine()
        .create_distribution_rule(rule)
        .await
        .map(|created| (StatusCode::CREATED, Json(created)))
        .map_err(|err| failed(correlation_id, "create_distribution_rule", err))
}

/// Handler for `POST /shifts`.
async fn record_shift<S: TipStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<RecordShiftRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Shift>)> {
    let correlation_id = Uuid::new_v4();
    let request = body(correlation_id, payload)?;

    state
        .engine()
        .record_shift(request.into())
        .await
        .map(|shift| (StatusCode::CREATED, Json(shift)))
        .map_err(|err| failed(correlation_id, "record_shift", err))
}

/// Handler for `POST /payouts/{id}/disputes`.
async fn open_dispute<S: TipStore>(
    State(state): State<AppState<S>>,
    Path(payout_id): Path<i64>,
    payload: Result<Json<OpenDisputeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TipDispute>)> {
    let correlation_id = Uuid::new_v4();
    let request = body(correlation_id, payload)?;

    state
        .engine()
        .open_dispute(payout_id, request.user_id, request.reason)
        .await
        .map(|dispute| (StatusCode::CREATED, Json(dispute)))
        .map_err(|err| failed(correlation_id, "open_dispute", err))
}

/// Handler for `POST /disputes/{id}/resolve`.
async fn resolve_dispute<S: TipStore>(
    State(state): State<AppState<S>>,
    Path(dispute_id): Path<i64>,
    payload: Result<Json<ResolveDisputeRequest>, JsonRejection>,
) -> ApiResult<Json<TipDispute>> {
    let correlation_id = Uuid::new_v4();
    let request = body(correlation_id, payload)?;

    state
        .engine()
        .resolve_dispute(dispute_id, request.into())
        .await
        .map(Json)
        .map_err(|err| failed(correlation_id, "resolve_dispute", err))
}
