//! Services: typed operations over the record store.

mod account;
mod chain;
mod comment;
mod post;
mod validation;

pub use account::{AccountService, NewAccount, NewEmbeddedComment};
pub use chain::{CycleGuard, LinkWrite, RelinkPlan};
pub use comment::{CommentService, NewComment};
pub use post::PostService;
pub use validation::ContentPolicy;

use crate::error::AppError;
use crate::state::RequestContext;

/// A store failure is logged with its context where it happens, then
/// re-raised; it never turns into a successful-looking empty result.
pub(crate) fn db_err(ctx: RequestContext, op: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!(request_id = %ctx.request_id, op, error = %e, "database operation failed");
        AppError::Db(e)
    }
}
