//! Post handlers: filtered listing plus policy-validated writes.

use crate::error::AppError;
use crate::handlers::DEFAULT_PAGE_SIZE;
use crate::model::PostSortField;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::PostService;
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
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub topic_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub topic_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub title: String,
    pub body: String,
    pub topic_id: Option<i64>,
}

fn parse_sort(sort: Option<&str>) -> Result<PostSortField, AppError> {
    match sort {
        Some(s) if !s.trim().is_empty() => PostSortField::parse(s),
        _ => Ok(PostSortField::Id),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let sort = parse_sort(params.sort.as_deref())?;
    let views = PostService::page(
        &state.pool,
        ctx,
        params.page.unwrap_or(0),
        params.size.unwrap_or(DEFAULT_PAGE_SIZE),
        sort,
        params.descending.unwrap_or(false),
        params.user_id,
        params.title,
        params.topic_id,
    )
    .await?;
    Ok(success_many(views))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let id = PostService::create(
        &state.pool,
        ctx,
        body.user_id,
        body.title,
        body.body,
        body.topic_id,
    )
    .await?;
    Ok(success_one(serde_json::json!({ "id": id })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBody>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let view = PostService::update(&state.pool, ctx, id, body.title, body.body, body.topic_id).await?;
    Ok(success_one_ok(view))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = RequestContext::new();
    let deleted = PostService::soft_delete(&state.pool, ctx, id).await?;
    Ok(success_one_ok(serde_json::json!({ "deleted": deleted })))
}
