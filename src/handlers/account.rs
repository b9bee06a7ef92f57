//! Account CRUD handlers.

use crate::error::AppError;
use crate::handlers::{DEFAULT_COMMENT_LIMIT, DEFAULT_PAGE_SIZE};
use crate::model::AccountSortField;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{AccountService, NewAccount};
use crate::state::{AppState, RequestContext};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetParams {
    pub comment_limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
    pub descending: Option<bool>,
    pub comment_limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub email: Option<String>,
    pub username: Option<String>,
}

fn parse_sort(sort: Option<&str>) -> Result<AccountSortField, AppError> {
    match sort {
        Some(s) if !s.trim().is_empty() => AccountSortField::parse(s),
        _ => Ok(AccountSortField::Id),
    }
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<GetParams>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let limit = params.comment_limit.unwrap_or(DEFAULT_COMMENT_LIMIT);
    let view = AccountService::get(&state.pool, ctx, id, limit).await?;
    Ok(success_one_ok(view))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewAccount>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let id = AccountService::create(&state.pool, ctx, body).await?;
    Ok(success_one(serde_json::json!({ "id": id })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBody>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let id = AccountService::update_fields(&state.pool, ctx, id, body.email, body.username).await?;
    Ok(success_one_ok(serde_json::json!({ "id": id })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let deleted = AccountService::soft_delete(&state.pool, ctx, id).await?;
    Ok(success_one_ok(serde_json::json!({ "deleted": deleted })))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let sort = parse_sort(params.sort.as_deref())?;
    let views = AccountService::page(
        &state.pool,
        ctx,
        params.page.unwrap_or(0),
        params.size.unwrap_or(DEFAULT_PAGE_SIZE),
        sort,
        params.descending.unwrap_or(false),
        params.comment_limit.unwrap_or(DEFAULT_COMMENT_LIMIT),
    )
    .await?;
    Ok(success_many(views))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let id = AccountService::retrieve(&state.pool, ctx, id).await?;
    Ok(success_one_ok(serde_json::json!({ "id": id })))
}

pub async fn retrieve_all(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let count = AccountService::retrieve_all(&state.pool, ctx).await?;
    Ok(success_one_ok(serde_json::json!({ "retrieved": count })))
}
