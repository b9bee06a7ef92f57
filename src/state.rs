//! Shared application state and per-request context.

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

/// Correlation handle threaded through every service call. Handlers mint one
/// per request; services record it on their log events. There is no
/// process-wide mutable equivalent.
#[derive(Clone, Copy, Debug)]
pub struct RequestContext {
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn new() -> Self {
        RequestContext {
            request_id: Uuid::new_v4(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
