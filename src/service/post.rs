//! Post operations: filtered pagination plus policy-validated writes.

use crate::error::AppError;
use crate::model::{Post, PostSortField, PostView};
use crate::service::{db_err, ContentPolicy};
use crate::sql::{select_page, Filter};
use crate::state::RequestContext;
use sqlx::PgPool;

const POST_COLUMNS: &str = "id, user_id, title, body, topic_id, create_time, update_time, deleted";

pub struct PostService;

impl PostService {
    /// One page of active posts. Each supplied filter becomes a conjunct in
    /// the order (userId, title, topicId); absent or empty values are
    /// omitted. The not-deleted predicate is appended by the builder and
    /// cannot be disabled.
    #[allow(clippy::too_many_arguments)]
    pub async fn page(
        pool: &PgPool,
        ctx: RequestContext,
        page: u32,
        size: u32,
        sort: PostSortField,
        descending: bool,
        user_id: Option<i64>,
        title: Option<String>,
        topic_id: Option<i64>,
    ) -> Result<Vec<PostView>, AppError> {
        let mut filters = Vec::new();
        if let Some(uid) = user_id {
            filters.push(Filter::Eq("user_id", uid.into()));
        }
        if let Some(needle) = title {
            if !needle.is_empty() {
                filters.push(Filter::Contains("title", needle));
            }
        }
        if let Some(tid) = topic_id {
            filters.push(Filter::Eq("topic_id", tid.into()));
        }

        let q = select_page("post", POST_COLUMNS, &filters, sort.column(), descending, page, size);
        tracing::debug!(request_id = %ctx.request_id, sql = %q.sql, "page posts");
        let mut query = sqlx::query_as::<_, Post>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let rows = query.fetch_all(pool).await.map_err(db_err(ctx, "page posts"))?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }

    pub async fn create(
        pool: &PgPool,
        ctx: RequestContext,
        user_id: i64,
        title: String,
        body: String,
        topic_id: Option<i64>,
    ) -> Result<i64, AppError> {
        ContentPolicy::validate_post(&title, &body)?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO post (user_id, title, body, topic_id, create_time, update_time) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING id",
        )
        .bind(user_id)
        .bind(&title)
        .bind(&body)
        .bind(topic_id)
        .fetch_one(pool)
        .await
        .map_err(db_err(ctx, "create post"))?;
        tracing::debug!(request_id = %ctx.request_id, id, "post created");
        Ok(id)
    }

    /// Replace title and body (policy-validated), optionally move topics,
    /// bump the update timestamp. Returns the updated view.
    pub async fn update(
        pool: &PgPool,
        ctx: RequestContext,
        id: i64,
        title: String,
        body: String,
        topic_id: Option<i64>,
    ) -> Result<PostView, AppError> {
        ContentPolicy::validate_post(&title, &body)?;
        let sql = format!(
            "UPDATE post SET title = $2, body = $3, topic_id = COALESCE($4, topic_id), \
             update_time = NOW() WHERE id = $1 AND NOT deleted RETURNING {}",
            POST_COLUMNS
        );
        let row: Option<Post> = sqlx::query_as(&sql)
            .bind(id)
            .bind(&title)
            .bind(&body)
            .bind(topic_id)
            .fetch_optional(pool)
            .await
            .map_err(db_err(ctx, "update post"))?;
        row.map(PostView::from)
            .ok_or_else(|| AppError::NotFound(format!("post with id = {} does not exist", id)))
    }

    pub async fn soft_delete(pool: &PgPool, ctx: RequestContext, id: i64) -> Result<bool, AppError> {
        let affected = sqlx::query("UPDATE post SET deleted = TRUE WHERE id = $1 AND NOT deleted")
            .bind(id)
            .execute(pool)
            .await
            .map_err(db_err(ctx, "soft delete post"))?
            .rows_affected();
        if affected == 0 {
            return Err(AppError::NotFound(format!(
                "post with id = {} does not exist",
                id
            )));
        }
        Ok(true)
    }
}
