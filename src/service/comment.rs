//! Comment operations, including chain maintenance. All link changes write
//! both sides of each affected pair inside one transaction.

use crate::error::AppError;
use crate::model::{Comment, CommentSortField, CommentView};
use crate::service::chain::{CycleGuard, LinkWrite, RelinkPlan};
use crate::service::{db_err, ContentPolicy};
use crate::sql::select_page;
use crate::state::RequestContext;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};

const COMMENT_COLUMNS: &str = "id, content, owner_id, previous_id, next_id, deleted";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub owner_id: i64,
    pub previous_id: Option<i64>,
    pub next_id: Option<i64>,
}

pub struct CommentService;

impl CommentService {
    pub async fn get(pool: &PgPool, ctx: RequestContext, id: i64) -> Result<CommentView, AppError> {
        let sql = format!(
            "SELECT {} FROM comment WHERE id = $1 AND NOT deleted",
            COMMENT_COLUMNS
        );
        let comment: Option<Comment> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(db_err(ctx, "get comment"))?;
        comment
            .map(CommentView::from)
            .ok_or_else(|| AppError::NotFound(format!("comment with id = {} does not exist", id)))
    }

    /// Insert a comment; when previous/next are supplied the chain-link
    /// routine runs in the same transaction as the insert.
    pub async fn create(
        pool: &PgPool,
        ctx: RequestContext,
        new: NewComment,
    ) -> Result<i64, AppError> {
        ContentPolicy::validate_comment_content(&new.content)?;

        let mut tx = pool.begin().await.map_err(db_err(ctx, "begin create comment"))?;
        let owner_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM account WHERE id = $1 AND NOT deleted)",
        )
        .bind(new.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err(ctx, "check comment owner"))?;
        if !owner_exists {
            return Err(AppError::NotFound(format!(
                "account with id = {} does not exist",
                new.owner_id
            )));
        }

        let sql = format!(
            "INSERT INTO comment (content, owner_id) VALUES ($1, $2) RETURNING {}",
            COMMENT_COLUMNS
        );
        let row: Comment = sqlx::query_as(&sql)
            .bind(&new.content)
            .bind(new.owner_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err(ctx, "insert comment"))?;

        if new.previous_id.is_some() || new.next_id.is_some() {
            Self::apply_links(&mut tx, ctx, &row, None, new.previous_id, new.next_id).await?;
        }

        tx.commit().await.map_err(db_err(ctx, "commit create comment"))?;
        tracing::debug!(request_id = %ctx.request_id, id = row.id, "comment created");
        Ok(row.id)
    }

    /// Move a comment to a new (previous, next) pair and optionally a new
    /// owner. The outer Option distinguishes "keep the current link" (None)
    /// from "replace it" (Some), where Some(None) detaches that side. An
    /// absent owner keeps the current one. Cycles and self-references are
    /// rejected before any write.
    pub async fn relink(
        pool: &PgPool,
        ctx: RequestContext,
        id: i64,
        owner_id: Option<i64>,
        previous: Option<Option<i64>>,
        next: Option<Option<i64>>,
    ) -> Result<i64, AppError> {
        let mut tx = pool.begin().await.map_err(db_err(ctx, "begin relink comment"))?;
        let target = Self::lock_active(&mut tx, ctx, id).await?;
        let previous_id = previous.unwrap_or(target.previous_id);
        let next_id = next.unwrap_or(target.next_id);

        if let Some(owner) = owner_id {
            let owner_exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM account WHERE id = $1 AND NOT deleted)",
            )
            .bind(owner)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err(ctx, "check comment owner"))?;
            if !owner_exists {
                return Err(AppError::NotFound(format!(
                    "account with id = {} does not exist",
                    owner
                )));
            }
        }

        Self::apply_links(&mut tx, ctx, &target, owner_id, previous_id, next_id).await?;
        tx.commit().await.map_err(db_err(ctx, "commit relink comment"))?;
        Ok(id)
    }

    pub async fn soft_delete(pool: &PgPool, ctx: RequestContext, id: i64) -> Result<bool, AppError> {
        let affected = sqlx::query("UPDATE comment SET deleted = TRUE WHERE id = $1 AND NOT deleted")
            .bind(id)
            .execute(pool)
            .await
            .map_err(db_err(ctx, "soft delete comment"))?
            .rows_affected();
        if affected == 0 {
            return Err(AppError::NotFound(format!(
                "comment with id = {} does not exist",
                id
            )));
        }
        Ok(true)
    }

    pub async fn page(
        pool: &PgPool,
        ctx: RequestContext,
        page: u32,
        size: u32,
        sort: CommentSortField,
        descending: bool,
    ) -> Result<Vec<CommentView>, AppError> {
        let q = select_page("comment", COMMENT_COLUMNS, &[], sort.column(), descending, page, size);
        tracing::debug!(request_id = %ctx.request_id, sql = %q.sql, "page comments");
        let mut query = sqlx::query_as::<_, Comment>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let rows = query
            .fetch_all(pool)
            .await
            .map_err(db_err(ctx, "page comments"))?;
        Ok(rows.into_iter().map(CommentView::from).collect())
    }

    pub async fn retrieve(pool: &PgPool, ctx: RequestContext, id: i64) -> Result<i64, AppError> {
        sqlx::query("UPDATE comment SET deleted = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(db_err(ctx, "retrieve comment"))?;
        Ok(id)
    }

    pub async fn retrieve_all(pool: &PgPool, ctx: RequestContext) -> Result<u64, AppError> {
        let affected = sqlx::query("UPDATE comment SET deleted = FALSE WHERE deleted")
            .execute(pool)
            .await
            .map_err(db_err(ctx, "retrieve all comments"))?
            .rows_affected();
        Ok(affected)
    }

    async fn lock_active(
        tx: &mut PgConnection,
        ctx: RequestContext,
        id: i64,
    ) -> Result<Comment, AppError> {
        let sql = format!(
            "SELECT {} FROM comment WHERE id = $1 AND NOT deleted FOR UPDATE",
            COMMENT_COLUMNS
        );
        let comment: Option<Comment> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err(ctx, "lock comment"))?;
        comment.ok_or_else(|| AppError::NotFound(format!("comment with id = {} does not exist", id)))
    }

    /// Validate, plan, cycle-check, then write the reciprocal link set and
    /// the target row. Runs inside the caller's transaction.
    async fn apply_links(
        tx: &mut PgConnection,
        ctx: RequestContext,
        target: &Comment,
        new_owner: Option<i64>,
        previous_id: Option<i64>,
        next_id: Option<i64>,
    ) -> Result<(), AppError> {
        let new_previous = match previous_id {
            Some(pid) => Some(Self::lock_active(tx, ctx, pid).await?),
            None => None,
        };
        let new_next = match next_id {
            Some(nid) => Some(Self::lock_active(tx, ctx, nid).await?),
            None => None,
        };

        let plan = RelinkPlan::build(target, new_previous.as_ref(), new_next.as_ref())?;

        // Walk next pointers from the modified node over the proposed state;
        // a revisit means the new links close a loop.
        let mut guard = CycleGuard::new(target.id);
        let mut cur = plan.new_next;
        while let Some(cid) = cur {
            guard.check(cid)?;
            cur = match plan.next_overrides.get(&cid) {
                Some(v) => *v,
                None => sqlx::query_scalar::<_, Option<i64>>(
                    "SELECT next_id FROM comment WHERE id = $1",
                )
                .bind(cid)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err(ctx, "walk chain"))?
                .flatten(),
            };
        }

        for write in &plan.writes {
            match *write {
                LinkWrite::ClearNext(cid) => {
                    sqlx::query("UPDATE comment SET next_id = NULL WHERE id = $1")
                        .bind(cid)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err(ctx, "clear next link"))?;
                }
                LinkWrite::ClearPrevious(cid) => {
                    sqlx::query("UPDATE comment SET previous_id = NULL WHERE id = $1")
                        .bind(cid)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err(ctx, "clear previous link"))?;
                }
                LinkWrite::SetNext { id, next } => {
                    sqlx::query("UPDATE comment SET next_id = $2 WHERE id = $1")
                        .bind(id)
                        .bind(next)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err(ctx, "set next link"))?;
                }
                LinkWrite::SetPrevious { id, previous } => {
                    sqlx::query("UPDATE comment SET previous_id = $2 WHERE id = $1")
                        .bind(id)
                        .bind(previous)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err(ctx, "set previous link"))?;
                }
            }
        }

        sqlx::query(
            "UPDATE comment SET previous_id = $2, next_id = $3, owner_id = COALESCE($4, owner_id) WHERE id = $1",
        )
        .bind(target.id)
        .bind(plan.new_previous)
        .bind(plan.new_next)
        .bind(new_owner)
        .execute(&mut *tx)
        .await
        .map_err(db_err(ctx, "update comment links"))?;

        Ok(())
    }
}
