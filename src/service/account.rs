//! Account operations: reads are active-only, uniqueness is scoped to
//! active rows, deletion is a reversible flag.

use crate::error::{duplicate_field_for_constraint, AppError};
use crate::model::{Account, AccountSortField, AccountView, Comment, CommentView};
use crate::service::{db_err, ContentPolicy};
use crate::sql::select_page;
use crate::state::RequestContext;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

const ACCOUNT_COLUMNS: &str = "id, email, username, comment_count, deleted";
const COMMENT_COLUMNS: &str = "id, content, owner_id, previous_id, next_id, deleted";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    /// Initial comment set, persisted with the account in one transaction.
    /// Chain pointers are stored exactly as given.
    #[serde(default)]
    pub comments: Vec<NewEmbeddedComment>,
    /// Denormalized counter, caller-maintained.
    #[serde(default)]
    pub comment_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmbeddedComment {
    pub content: String,
    pub previous_id: Option<i64>,
    pub next_id: Option<i64>,
}

pub struct AccountService;

impl AccountService {
    /// Fetch one active account with at most `comment_limit` of its active
    /// comments (an unordered subset; chain order is not materialized).
    pub async fn get(
        pool: &PgPool,
        ctx: RequestContext,
        id: i64,
        comment_limit: usize,
    ) -> Result<AccountView, AppError> {
        let sql = format!(
            "SELECT {} FROM account WHERE id = $1 AND NOT deleted",
            ACCOUNT_COLUMNS
        );
        let account: Option<Account> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(db_err(ctx, "get account"))?;
        let account = account
            .ok_or_else(|| AppError::NotFound(format!("account with id = {} does not exist", id)))?;

        let mut comments = Self::comments_by_owner(pool, ctx, &[id], comment_limit).await?;
        Ok(Self::view(account, comments.remove(&id).unwrap_or_default()))
    }

    /// Create an account plus its initial comments in one transaction.
    /// Email is checked before username; the partial unique indexes are the
    /// authoritative signal if a concurrent create slips past the pre-check.
    pub async fn create(
        pool: &PgPool,
        ctx: RequestContext,
        new: NewAccount,
    ) -> Result<i64, AppError> {
        ContentPolicy::validate_email(&new.email)?;
        for c in &new.comments {
            ContentPolicy::validate_comment_content(&c.content)?;
        }

        let mut tx = pool.begin().await.map_err(db_err(ctx, "begin create account"))?;
        Self::assert_unique(&mut tx, ctx, "email", &new.email, None).await?;
        Self::assert_unique(&mut tx, ctx, "username", &new.username, None).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO account (email, username, comment_count) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&new.email)
        .bind(&new.username)
        .bind(new.comment_count)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Self::map_unique_violation(e, &new.email, &new.username))?;

        for c in &new.comments {
            sqlx::query(
                "INSERT INTO comment (content, owner_id, previous_id, next_id) VALUES ($1, $2, $3, $4)",
            )
            .bind(&c.content)
            .bind(id)
            .bind(c.previous_id)
            .bind(c.next_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err(ctx, "insert initial comment"))?;
        }

        tx.commit().await.map_err(db_err(ctx, "commit create account"))?;
        tracing::debug!(request_id = %ctx.request_id, id, "account created");
        Ok(id)
    }

    /// Update email and/or username. Only the supplied fields are
    /// re-validated for uniqueness, email first.
    pub async fn update_fields(
        pool: &PgPool,
        ctx: RequestContext,
        id: i64,
        email: Option<String>,
        username: Option<String>,
    ) -> Result<i64, AppError> {
        let mut tx = pool.begin().await.map_err(db_err(ctx, "begin update account"))?;
        let sql = format!(
            "SELECT {} FROM account WHERE id = $1 AND NOT deleted FOR UPDATE",
            ACCOUNT_COLUMNS
        );
        let current: Option<Account> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err(ctx, "get account"))?;
        let current = current
            .ok_or_else(|| AppError::NotFound(format!("account with id = {} does not exist", id)))?;

        if let Some(email) = &email {
            ContentPolicy::validate_email(email)?;
            Self::assert_unique(&mut tx, ctx, "email", email, Some(id)).await?;
        }
        if let Some(username) = &username {
            Self::assert_unique(&mut tx, ctx, "username", username, Some(id)).await?;
        }

        let new_email = email.unwrap_or(current.email);
        let new_username = username.unwrap_or(current.username);
        sqlx::query("UPDATE account SET email = $2, username = $3 WHERE id = $1")
            .bind(id)
            .bind(&new_email)
            .bind(&new_username)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::map_unique_violation(e, &new_email, &new_username))?;

        tx.commit().await.map_err(db_err(ctx, "commit update account"))?;
        Ok(id)
    }

    /// Soft delete: a single conditional update, so the existence check and
    /// the flag write cannot interleave with a concurrent delete.
    pub async fn soft_delete(pool: &PgPool, ctx: RequestContext, id: i64) -> Result<bool, AppError> {
        let affected = sqlx::query("UPDATE account SET deleted = TRUE WHERE id = $1 AND NOT deleted")
            .bind(id)
            .execute(pool)
            .await
            .map_err(db_err(ctx, "soft delete account"))?
            .rows_affected();
        if affected == 0 {
            return Err(AppError::NotFound(format!(
                "account with id = {} does not exist",
                id
            )));
        }
        Ok(true)
    }

    /// One page of active accounts, each with a bounded comment subset.
    /// Exhaustion shows up as a short or empty page; no total is reported.
    pub async fn page(
        pool: &PgPool,
        ctx: RequestContext,
        page: u32,
        size: u32,
        sort: AccountSortField,
        descending: bool,
        comment_limit: usize,
    ) -> Result<Vec<AccountView>, AppError> {
        let q = select_page("account", ACCOUNT_COLUMNS, &[], sort.column(), descending, page, size);
        tracing::debug!(request_id = %ctx.request_id, sql = %q.sql, "page accounts");
        let mut query = sqlx::query_as::<_, Account>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let accounts = query
            .fetch_all(pool)
            .await
            .map_err(db_err(ctx, "page accounts"))?;

        let ids: Vec<i64> = accounts.iter().map(|a| a.id).collect();
        let mut by_owner = Self::comments_by_owner(pool, ctx, &ids, comment_limit).await?;
        Ok(accounts
            .into_iter()
            .map(|a| {
                let comments = by_owner.remove(&a.id).unwrap_or_default();
                Self::view(a, comments)
            })
            .collect())
    }

    /// Clear the deletion flag on one account. Idempotent; a missing id is a
    /// no-op success.
    pub async fn retrieve(pool: &PgPool, ctx: RequestContext, id: i64) -> Result<i64, AppError> {
        sqlx::query("UPDATE account SET deleted = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(db_err(ctx, "retrieve account"))?;
        Ok(id)
    }

    /// Clear the deletion flag on every account in one statement.
    pub async fn retrieve_all(pool: &PgPool, ctx: RequestContext) -> Result<u64, AppError> {
        let affected = sqlx::query("UPDATE account SET deleted = FALSE WHERE deleted")
            .execute(pool)
            .await
            .map_err(db_err(ctx, "retrieve all accounts"))?
            .rows_affected();
        Ok(affected)
    }

    /// Uniqueness guard: no other active account may hold `value` in
    /// `field`. The fast-path error for callers; the partial index is the
    /// guarantee under concurrency.
    async fn assert_unique(
        tx: &mut PgConnection,
        ctx: RequestContext,
        field: &'static str,
        value: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), AppError> {
        // field comes from the two call sites above, never from input
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM account WHERE {} = $1 AND NOT deleted AND ($2::bigint IS NULL OR id <> $2))",
            field
        );
        let taken: bool = sqlx::query_scalar(&sql)
            .bind(value)
            .bind(exclude_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err(ctx, "uniqueness check"))?;
        if taken {
            return Err(AppError::Duplicate {
                field,
                value: value.to_string(),
            });
        }
        Ok(())
    }

    fn map_unique_violation(e: sqlx::Error, email: &str, username: &str) -> AppError {
        if let sqlx::Error::Database(ref db) = e {
            if db.code().as_deref() == Some("23505") {
                match db.constraint().and_then(duplicate_field_for_constraint) {
                    Some("email") => {
                        return AppError::Duplicate {
                            field: "email",
                            value: email.to_string(),
                        }
                    }
                    Some("username") => {
                        return AppError::Duplicate {
                            field: "username",
                            value: username.to_string(),
                        }
                    }
                    _ => {}
                }
            }
        }
        AppError::Db(e)
    }

    /// Batch-load active comments for a set of owners, truncated per owner.
    async fn comments_by_owner(
        pool: &PgPool,
        ctx: RequestContext,
        owner_ids: &[i64],
        limit: usize,
    ) -> Result<HashMap<i64, Vec<CommentView>>, AppError> {
        let mut by_owner: HashMap<i64, Vec<CommentView>> = HashMap::new();
        if owner_ids.is_empty() || limit == 0 {
            return Ok(by_owner);
        }
        let sql = format!(
            "SELECT {} FROM comment WHERE owner_id = ANY($1) AND NOT deleted",
            COMMENT_COLUMNS
        );
        let rows: Vec<Comment> = sqlx::query_as(&sql)
            .bind(owner_ids.to_vec())
            .fetch_all(pool)
            .await
            .map_err(db_err(ctx, "load account comments"))?;
        for row in rows {
            let bucket = by_owner.entry(row.owner_id).or_default();
            if bucket.len() < limit {
                bucket.push(row.into());
            }
        }
        Ok(by_owner)
    }

    fn view(account: Account, comments: Vec<CommentView>) -> AccountView {
        AccountView {
            id: account.id,
            email: account.email,
            username: account.username,
            comments,
            comment_count: account.comment_count,
        }
    }
}
