//! Tribune: forum-style REST backend with PostgreSQL.
//!
//! Accounts, doubly-linked comment chains, and posts, all soft-deleted
//! rather than removed. Reads are active-only by default; uniqueness is
//! scoped to active rows and backed by partial unique indexes.

pub mod error;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use error::AppError;
pub use migration::apply_migrations;
pub use response::{success_many, success_one, success_one_ok};
pub use routes::{account_routes, comment_routes, common_routes, common_routes_with_ready, post_routes};
pub use service::{AccountService, CommentService, PostService};
pub use state::{AppState, RequestContext};
pub use store::ensure_database_exists;
