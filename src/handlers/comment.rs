//! Comment CRUD and relink handlers.

use crate::error::AppError;
use crate::handlers::DEFAULT_PAGE_SIZE;
use crate::model::CommentSortField;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{CommentService, NewComment};
use crate::state::{AppState, RequestContext};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
    pub descending: Option<bool>,
}

/// Relink body. For previous/next an omitted field keeps the current link
/// and an explicit null detaches that side; an absent owner keeps the
/// current owner.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelinkBody {
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub previous_id: Option<Option<i64>>,
    #[serde(default)]
    pub next_id: Option<Option<i64>>,
}

fn parse_sort(sort: Option<&str>) -> Result<CommentSortField, AppError> {
    match sort {
        Some(s) if !s.trim().is_empty() => CommentSortField::parse(s),
        _ => Ok(CommentSortField::Id),
    }
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let view = CommentService::get(&state.pool, ctx, id).await?;
    Ok(success_one_ok(view))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewComment>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let id = CommentService::create(&state.pool, ctx, body).await?;
    Ok(success_one(serde_json::json!({ "id": id })))
}

pub async fn relink(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RelinkBody>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let id = CommentService::relink(
        &state.pool,
        ctx,
        id,
        body.owner_id,
        body.previous_id,
        body.next_id,
    )
    .await?;
    Ok(success_one_ok(serde_json::json!({ "id": id })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let deleted = CommentService::soft_delete(&state.pool, ctx, id).await?;
    Ok(success_one_ok(serde_json::json!({ "deleted": deleted })))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let sort = parse_sort(params.sort.as_deref())?;
    let views = CommentService::page(
        &state.pool,
        ctx,
        params.page.unwrap_or(0),
        params.size.unwrap_or(DEFAULT_PAGE_SIZE),
        sort,
        params.descending.unwrap_or(false),
    )
    .await?;
    Ok(success_many(views))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let id = CommentService::retrieve(&state.pool, ctx, id).await?;
    Ok(success_one_ok(serde_json::json!({ "id": id })))
}

pub async fn retrieve_all(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let count = CommentService::retrieve_all(&state.pool, ctx).await?;
    Ok(success_one_ok(serde_json::json!({ "retrieved": count })))
}
