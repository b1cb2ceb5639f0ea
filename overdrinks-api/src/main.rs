use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use overdrinks_shared::clients::db::{create_pool, DbPool};

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    overdrinks_shared::middleware::init_tracing("overdrinks-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let db = create_pool(&config.database_url, config.db_pool_size)?;
    let metrics_handle = overdrinks_shared::middleware::init_metrics();

    let state = Arc::new(AppState { db, config });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/metrics",
            get(move || std::future::ready(metrics_handle.render())),
        )
        .route("/api/auth/user", get(routes::auth::get_current_user))
        .route(
            "/api/profile",
            get(routes::profile::get_profile)
                .post(routes::profile::create_profile)
                .put(routes::profile::update_profile),
        )
        .route(
            "/api/venues",
            get(routes::venues::list_venues).post(routes::venues::create_venue),
        )
        .route("/api/venues/initialize", post(routes::venues::initialize_venues))
        .route("/api/venues/:venue_id", get(routes::venues::get_venue))
        .route("/api/venues/:venue_id/users", get(routes::venues::get_venue_users))
        .route(
            "/api/venues/:venue_id/popularity",
            get(routes::venues::get_venue_popularity),
        )
        .route("/api/checkin", post(routes::checkins::check_in))
        .route("/api/checkin/current", get(routes::checkins::current_check_in))
        .route("/api/checkout", post(routes::checkins::check_out))
        .route(
            "/api/matches",
            get(routes::matches::list_matches).post(routes::matches::create_match),
        )
        .layer(middleware::from_fn(
            overdrinks_shared::middleware::metrics_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "overdrinks-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
