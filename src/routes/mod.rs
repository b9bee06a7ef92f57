//! Routers: per-resource API routes plus common service routes.

mod api;
mod common;

pub use api::{account_routes, comment_routes, post_routes};
pub use common::{common_routes, common_routes_with_ready};
