//! Resource routes. The static /retrieve segment is registered alongside
//! the /:id capture; the router prefers the static match.

use crate::handlers::{account, comment, post};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post as post_method},
    Router,
};

pub fn account_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(account::list).post(account::create))
        .route("/retrieve", post_method(account::retrieve_all))
        .route(
            "/:id",
            get(account::get)
                .patch(account::update)
                .delete(account::delete),
        )
        .route("/:id/retrieve", post_method(account::retrieve))
        .with_state(state)
}

pub fn comment_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(comment::list).post(comment::create))
        .route("/retrieve", post_method(comment::retrieve_all))
        .route(
            "/:id",
            get(comment::get)
                .patch(comment::relink)
                .delete(comment::delete),
        )
        .route("/:id/retrieve", post_method(comment::retrieve))
        .with_state(state)
}

pub fn post_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(post::list).post(post::create))
        .route("/:id", patch(post::update).delete(post::delete))
        .with_state(state)
}
