//! Server binary: env config, database bootstrap, schema DDL, route mounting.

use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tracing_subscriber::EnvFilter;
use tribune::{
    account_routes, apply_migrations, comment_routes, common_routes_with_ready,
    ensure_database_exists, post_routes, AppState,
};

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tribune=info".parse()?))
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/tribune".into());
    ensure_database_exists(&database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    apply_migrations(&pool).await?;
    let state = AppState { pool };

    let api = Router::new()
        .nest("/api/account", account_routes(state.clone()))
        .nest("/api/comment", comment_routes(state.clone()))
        .nest("/api/post", post_routes(state.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    let app = Router::new()
        .merge(common_routes_with_ready(state))
        .merge(api);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
