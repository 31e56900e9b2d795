//! Administrative REST surface: ACL rule management, quota overrides, and
//! dead-letter-queue inspection/replay.
//!
//! Nested under `/admin` and gated by [`crate::middleware::RequireScopeGate`]
//! requiring the `"admin"` scope, behind the same [`crate::middleware::AuthGate`]
//! `/auth/validate` uses.

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::get};
use config::{AclRule, QuotaLimit};
use http::StatusCode;
use jiff::Timestamp;
use quota::QuotaManager;
use serde::{Deserialize, Serialize};
use storage::{DlqStorage, NewDlqEntry, QuotaStorage};

use crate::state::AppState;
use crate::storage_backend::AnyStorage;

/// Builds the `/admin` sub-router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/acl", get(list_acl_rules).post(upsert_acl_rule))
        .route("/acl/{lease_id}", get(get_acl_rule).delete(delete_acl_rule))
        .route("/quota/{key_id}", get(get_quota_status).post(set_quota_limit))
        .route("/quota/{key_id}/reset", axum::routing::post(reset_quota))
        .route("/dlq", get(list_dlq))
        .route("/dlq/{id}", get(get_dlq_entry).delete(delete_dlq_entry))
        .route("/dlq/{id}/retry", axum::routing::post(retry_dlq_entry))
}

#[derive(Serialize)]
struct AclRuleList {
    rules: Vec<AclRule>,
}

async fn list_acl_rules(State(state): State<AppState>) -> Json<AclRuleList> {
    let rules = state.acl.read().expect("acl lock poisoned").rules().to_vec();
    Json(AclRuleList { rules })
}

async fn upsert_acl_rule(State(state): State<AppState>, Json(rule): Json<AclRule>) -> Result<(StatusCode, Json<AclRule>), StatusCode> {
    rule.validate().map_err(|_| StatusCode::BAD_REQUEST)?;

    state.acl.write().expect("acl lock poisoned").upsert_rule(rule.clone());

    Ok((StatusCode::CREATED, Json(rule)))
}

async fn get_acl_rule(State(state): State<AppState>, Path(lease_id): Path<String>) -> Result<Json<AclRule>, StatusCode> {
    state.acl.read().expect("acl lock poisoned").rule(&lease_id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_acl_rule(State(state): State<AppState>, Path(lease_id): Path<String>) -> StatusCode {
    let removed = state.acl.write().expect("acl lock poisoned").remove_rule(&lease_id);

    if removed { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

async fn get_quota_status(State(state): State<AppState>, Path(key_id): Path<String>) -> Result<Json<quota::QuotaStatus>, StatusCode> {
    state.quota.status(&key_id).await.map(Json).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn set_quota_limit(State(state): State<AppState>, Path(key_id): Path<String>, Json(limit): Json<QuotaLimit>) -> StatusCode {
    state.quota.set_limit(&key_id, limit);
    StatusCode::OK
}

async fn reset_quota(State(state): State<AppState>, Path(key_id): Path<String>) -> StatusCode {
    match state.quota.reset(&key_id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Deserialize)]
struct DlqPage {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_limit() -> u32 {
    50
}

#[derive(Serialize)]
struct DlqEntryList {
    entries: Vec<storage::DlqEntry>,
    total: u64,
}

async fn list_dlq(State(state): State<AppState>, Query(page): Query<DlqPage>) -> Result<Json<DlqEntryList>, StatusCode> {
    let (entries, total) = state.quota.storage().list(page.limit, page.offset).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(DlqEntryList { entries, total }))
}

async fn get_dlq_entry(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<storage::DlqEntry>, StatusCode> {
    state.quota.storage().get(id).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_dlq_entry(State(state): State<AppState>, Path(id): Path<i64>) -> StatusCode {
    match state.quota.storage().delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(storage::StorageError::NotFound) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Replays a frozen request against the placeholder terminal handler. Since
/// that handler never fails (there is no upstream to route to — see the
/// terminal handler's doc comment), every replay of an existing entry
/// succeeds: `record_attempt` is called first so the returned snapshot
/// reflects the attempt, then the entry is deleted.
async fn retry_dlq_entry(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<storage::DlqEntry>, StatusCode> {
    let storage = state.quota.storage();

    let Some(_) = storage.get(id).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)? else {
        return Err(StatusCode::NOT_FOUND);
    };

    storage
        .record_attempt(id, Some(200), None, Timestamp::now())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let delivered = storage.get(id).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?.ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    storage.delete(id).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(delivered))
}

/// Enqueues `entry` to the dead-letter queue. Called by the pipeline when a
/// request exhausts its delivery attempts against a lease.
pub async fn enqueue(quota: &QuotaManager<AnyStorage>, entry: NewDlqEntry) -> Result<i64, storage::StorageError> {
    quota.storage().enqueue(entry, Timestamp::now()).await
}
