//! Schema DDL for the three record kinds. Idempotent: CREATE TABLE / CREATE
//! INDEX with IF NOT EXISTS, safe to run on every startup.

use crate::error::AppError;
use sqlx::PgPool;

/// Uniqueness is scoped to active rows: two soft-deleted accounts (or one
/// active and one deleted) may share an email or username, so the unique
/// indexes are partial on NOT deleted. These indexes, not the in-service
/// pre-checks, are what holds under concurrent writes.
const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS account (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL,
        username TEXT NOT NULL,
        comment_count BIGINT NOT NULL DEFAULT 0,
        deleted BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS account_email_active_idx ON account (email) WHERE NOT deleted",
    "CREATE UNIQUE INDEX IF NOT EXISTS account_username_active_idx ON account (username) WHERE NOT deleted",
    r#"
    CREATE TABLE IF NOT EXISTS comment (
        id BIGSERIAL PRIMARY KEY,
        content TEXT NOT NULL,
        owner_id BIGINT NOT NULL REFERENCES account (id),
        previous_id BIGINT,
        next_id BIGINT,
        deleted BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS comment_owner_idx ON comment (owner_id) WHERE NOT deleted",
    r#"
    CREATE TABLE IF NOT EXISTS post (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        topic_id BIGINT,
        create_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        update_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        deleted BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS post_user_idx ON post (user_id) WHERE NOT deleted",
    "CREATE INDEX IF NOT EXISTS post_topic_idx ON post (topic_id) WHERE NOT deleted",
];

/// Apply the schema to the database.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    for ddl in DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
