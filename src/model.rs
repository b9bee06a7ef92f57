//! Typed rows, API views, and the closed sort-field sets per record kind.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub comment_count: i64,
    pub deleted: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub owner_id: i64,
    pub previous_id: Option<i64>,
    pub next_id: Option<i64>,
    pub deleted: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub topic_id: Option<i64>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub deleted: bool,
}

/// Account as returned to callers: comments are a bounded, unordered subset
/// of the account's active comments, loaded at read time.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub comments: Vec<CommentView>,
    pub comment_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub owner_id: i64,
    pub previous_id: Option<i64>,
    pub next_id: Option<i64>,
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        CommentView {
            id: c.id,
            content: c.content,
            owner_id: c.owner_id,
            previous_id: c.previous_id,
            next_id: c.next_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub topic_id: Option<i64>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl From<Post> for PostView {
    fn from(p: Post) -> Self {
        PostView {
            id: p.id,
            user_id: p.user_id,
            title: p.title,
            body: p.body,
            topic_id: p.topic_id,
            create_time: p.create_time,
            update_time: p.update_time,
        }
    }
}

/// Sortable columns per kind. Free-form field names from the request never
/// reach the SQL builder; handlers parse them into these enums first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSortField {
    Id,
    Email,
    Username,
    CommentCount,
}

impl AccountSortField {
    pub fn column(self) -> &'static str {
        match self {
            AccountSortField::Id => "id",
            AccountSortField::Email => "email",
            AccountSortField::Username => "username",
            AccountSortField::CommentCount => "comment_count",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "id" => Ok(AccountSortField::Id),
            "email" => Ok(AccountSortField::Email),
            "username" => Ok(AccountSortField::Username),
            "commentCount" | "comment_count" => Ok(AccountSortField::CommentCount),
            other => Err(AppError::BadRequest(format!("unknown sort field: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSortField {
    Id,
    Content,
    OwnerId,
}

impl CommentSortField {
    pub fn column(self) -> &'static str {
        match self {
            CommentSortField::Id => "id",
            CommentSortField::Content => "content",
            CommentSortField::OwnerId => "owner_id",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "id" => Ok(CommentSortField::Id),
            "content" => Ok(CommentSortField::Content),
            "owner" | "ownerId" | "owner_id" => Ok(CommentSortField::OwnerId),
            other => Err(AppError::BadRequest(format!("unknown sort field: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSortField {
    Id,
    UserId,
    Title,
    TopicId,
    CreateTime,
    UpdateTime,
}

impl PostSortField {
    pub fn column(self) -> &'static str {
        match self {
            PostSortField::Id => "id",
            PostSortField::UserId => "user_id",
            PostSortField::Title => "title",
            PostSortField::TopicId => "topic_id",
            PostSortField::CreateTime => "create_time",
            PostSortField::UpdateTime => "update_time",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "id" => Ok(PostSortField::Id),
            "userId" | "user_id" => Ok(PostSortField::UserId),
            "title" => Ok(PostSortField::Title),
            "topicId" | "topic_id" => Ok(PostSortField::TopicId),
            "createTime" | "create_time" => Ok(PostSortField::CreateTime),
            "updateTime" | "update_time" => Ok(PostSortField::UpdateTime),
            other => Err(AppError::BadRequest(format!("unknown sort field: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_fields_accept_both_casings() {
        assert_eq!(
            AccountSortField::parse("commentCount").unwrap(),
            AccountSortField::CommentCount
        );
        assert_eq!(
            PostSortField::parse("create_time").unwrap(),
            PostSortField::CreateTime
        );
        assert_eq!(
            CommentSortField::parse("owner").unwrap(),
            CommentSortField::OwnerId
        );
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        assert!(matches!(
            AccountSortField::parse("deleted"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            PostSortField::parse("body; DROP TABLE post"),
            Err(AppError::BadRequest(_))
        ));
    }
}
