use axum::{
    Router,
    routing::{get, post},
};
use axum::http::{HeaderValue, Method};
use kindred::models::MatchConfig;
use kindred::{Config, get_db_pool, handlers, utils};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let match_config = config.load_match_config()?;
    let db_config = kindred::db::DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Run migrations
    kindred::db::migrations::run_migrations(&pool).await?;

    let port = config.port;
    let app = create_router(pool, Arc::new(match_config), config);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(pool: SqlitePool, match_config: Arc<MatchConfig>, config: Config) -> Router {
    let cors_layer = create_cors_layer(&config);
    let app_state = (pool, match_config);

    Router::new()
        .route("/health", get(health_check))
        // Matchmaking endpoints
        .route("/api/match/find", post(handlers::find_match))
        .route("/api/match/respond", post(handlers::respond))
        .route("/api/match/notification", post(handlers::record_notification))
        .route("/api/match/unmatch", post(handlers::unmatch))
        .route("/api/match/status", post(handlers::match_status))
        .route("/api/match/preferences", post(handlers::set_preferences))
        .layer(cors_layer)
        .with_state(app_state)
}

fn create_cors_layer(_config: &Config) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    // Check if ALLOWED_ORIGINS environment variable is set for multiple domains
    if let Ok(cors_origins) = std::env::var("ALLOWED_ORIGINS") {
        let origins: Vec<HeaderValue> = cors_origins
            .split(',')
            .filter_map(|origin| {
                let trimmed = origin.trim();
                if !trimmed.is_empty() {
                    trimmed.parse().ok()
                } else {
                    None
                }
            })
            .collect();

        if !origins.is_empty() {
            cors = cors.allow_origin(origins);
        } else {
            // Fallback to permissive if parsing fails
            cors = cors.allow_origin(Any);
        }
    } else {
        // Default to permissive for development
        cors = cors.allow_origin(Any);
    }

    cors
}

async fn health_check() -> &'static str {
    "OK"
}
