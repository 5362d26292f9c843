// main.rs - Pixelpress server

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use pixelpress::error::ApiError;
use pixelpress::history::{BackendKind, HistoryStore, MemoryStore, SqliteStore, SupabaseStore};
use pixelpress::logger::Logger;
use pixelpress::models::{HistoryRecord, ImageInfo};

/// Application state shared across requests
#[derive(Clone)]
struct AppState {
    store: Arc<dyn HistoryStore>,
    logger: Logger,
}

/// Server configuration
#[derive(Clone, Debug)]
struct ServerConfig {
    port: u16,
    backend: String,
    sqlite_path: String,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            backend: std::env::var("HISTORY_BACKEND").unwrap_or_else(|_| "sqlite".to_string()),
            sqlite_path: std::env::var("SQLITE_PATH")
                .unwrap_or_else(|_| "pixelpress.db".to_string()),
            supabase_url: std::env::var("SUPABASE_URL").ok(),
            supabase_anon_key: std::env::var("SUPABASE_ANON_KEY").ok(),
        }
    }
}

/// Build the configured history backend, once, at startup
fn open_store(
    config: &ServerConfig,
    logger: &Logger,
) -> anyhow::Result<(BackendKind, Arc<dyn HistoryStore>)> {
    let kind = BackendKind::from_str(&config.backend).map_err(|e| anyhow::anyhow!(e))?;

    let store: Arc<dyn HistoryStore> = match kind {
        BackendKind::Memory => Arc::new(MemoryStore::new()),
        BackendKind::Sqlite => Arc::new(SqliteStore::open_at(std::path::Path::new(
            &config.sqlite_path,
        ))?),
        BackendKind::Supabase => {
            let (url, key) = config
                .supabase_url
                .as_deref()
                .zip(config.supabase_anon_key.as_deref())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "SUPABASE_URL and SUPABASE_ANON_KEY must be set for the supabase backend"
                    )
                })?;
            Arc::new(SupabaseStore::new(
                reqwest::Client::new(),
                url,
                key,
                logger.clone(),
            ))
        }
    };

    Ok((kind, store))
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// List all compression history records, most recent first
async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let records = state.store.list().await.map_err(|e| {
        state.logger.error(
            "Error fetching compression history",
            &serde_json::json!({ "error": e.to_string() }),
        );
        ApiError::from(e)
    })?;

    state
        .logger
        .log_history("list", &format!("{} records", records.len()));
    Ok(Json(records))
}

/// Save one compression result
///
/// The body must carry `image_info` matching the ImageInfo shape; nothing is
/// persisted until validation passes.
async fn save_history(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<HistoryRecord>), ApiError> {
    let image_info = body
        .get("image_info")
        .cloned()
        .ok_or_else(|| ApiError::Validation("missing field `image_info`".to_string()))?;

    let image_info: ImageInfo =
        serde_json::from_value(image_info).map_err(|e| ApiError::Validation(e.to_string()))?;

    if let Some(settings) = &image_info.settings {
        settings.validate().map_err(ApiError::Validation)?;
    }

    let record = state.store.create(image_info).await.map_err(|e| {
        state.logger.error(
            "Error saving compression history",
            &serde_json::json!({ "error": e.to_string() }),
        );
        ApiError::from(e)
    })?;

    state.logger.log_history(
        "save",
        &format!("{} ({})", record.image_info.original_name, record.id),
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// Delete one record by id; absent ids still answer 204
async fn delete_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&id).await.map_err(|e| {
        state.logger.error(
            "Error deleting compression history",
            &serde_json::json!({ "id": id, "error": e.to_string() }),
        );
        ApiError::from(e)
    })?;

    state.logger.log_history("delete", &id);
    Ok(StatusCode::NO_CONTENT)
}

/// Create the application router
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .route(
            "/api/compression-history",
            get(list_history).post(save_history),
        )
        .route("/api/compression-history/{id}", delete(delete_history))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
    let log_enabled = std::env::var("LOG_ENABLED").unwrap_or_else(|_| "true".to_string()) != "false";
    Logger::init(&log_level, log_enabled);

    let logger = Logger::new(&log_level, log_enabled);

    // Create server configuration and the configured history backend
    let config = ServerConfig::default();
    let (backend, store) = open_store(&config, &logger)?;

    let state = AppState {
        store,
        logger: logger.clone(),
    };

    let app = create_router(state);

    // Bind address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let address = format!("0.0.0.0:{}", config.port);

    logger.log_startup(env!("CARGO_PKG_VERSION"), &address, backend.as_str());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
