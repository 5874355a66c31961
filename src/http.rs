//! HTTP surface: executor delegation and financial record endpoints
//!
//! Record handlers never use the session id directly; they go through the
//! access scope resolver, so an approved executor session transparently
//! operates on the principal's records.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Session;
use crate::delegation::{CreatedExecutor, InviteOutcome};
use crate::error::Result;
use crate::models::{
    CreateExecutorRequest, CreateRecordRequest, DelegationRecord, ExecutorQuery,
    FinancialRecord, InviteActionRequest, RecordCategory, RecordQuery, UpdateExecutorRequest,
    UpdateRecordRequest,
};
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/executors", post(create_executor).get(list_executors))
        .route("/executors/invite", post(invite_action))
        .route(
            "/executors/:id",
            get(get_executor).put(update_executor).delete(delete_executor),
        )
        .route("/records/:category", post(create_record).get(list_records))
        .route(
            "/records/:category/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct ExecutorList {
    count: usize,
    data: Vec<DelegationRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordList {
    count: usize,
    total_amount: f64,
    data: Vec<FinancialRecord>,
}

// Executor delegation

async fn create_executor(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<CreateExecutorRequest>,
) -> Result<(StatusCode, Json<CreatedExecutor>)> {
    let created = state.delegations.create_executor(&session, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Unauthenticated: the token in the body is the credential.
async fn invite_action(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InviteActionRequest>,
) -> Result<Json<InviteOutcome>> {
    let outcome = state
        .delegations
        .handle_invite_action(&req.action, &req.token)
        .await?;
    Ok(Json(outcome))
}

async fn list_executors(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ExecutorQuery>,
) -> Result<Json<ExecutorList>> {
    let data = state.delegations.list(&session, &query).await?;
    Ok(Json(ExecutorList {
        count: data.len(),
        data,
    }))
}

async fn get_executor(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<DelegationRecord>> {
    Ok(Json(state.delegations.get(&session, id).await?))
}

async fn update_executor(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateExecutorRequest>,
) -> Result<Json<DelegationRecord>> {
    Ok(Json(state.delegations.update(&session, id, patch).await?))
}

async fn delete_executor(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.delegations.delete(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Financial records

async fn create_record(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(category): Path<RecordCategory>,
    Json(req): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<FinancialRecord>)> {
    let owner = state.scope.resolve(&session).await?;
    let record = state.records.create(owner, category, req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_records(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(category): Path<RecordCategory>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<RecordList>> {
    let owner = state.scope.resolve(&session).await?;
    let data = state.records.list(owner, category, &query).await?;
    let total_amount = state.records.total_amount(owner, category).await?;
    Ok(Json(RecordList {
        count: data.len(),
        total_amount,
        data,
    }))
}

async fn get_record(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path((category, id)): Path<(RecordCategory, Uuid)>,
) -> Result<Json<FinancialRecord>> {
    let owner = state.scope.resolve(&session).await?;
    Ok(Json(state.records.get(owner, category, id).await?))
}

async fn update_record(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path((category, id)): Path<(RecordCategory, Uuid)>,
    Json(patch): Json<UpdateRecordRequest>,
) -> Result<Json<FinancialRecord>> {
    let owner = state.scope.resolve(&session).await?;
    Ok(Json(state.records.update(owner, category, id, patch).await?))
}

async fn delete_record(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path((category, id)): Path<(RecordCategory, Uuid)>,
) -> Result<StatusCode> {
    let owner = state.scope.resolve(&session).await?;
    state.records.delete(owner, category, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
