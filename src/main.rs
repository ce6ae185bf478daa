// src/main.rs
use axum::{extract::Extension, middleware, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod auth;
mod chat;
mod common;
mod logging_middleware;
mod services;

#[cfg(test)]
mod test_support;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use chat::{ChatStore, ProviderRegistry, QuotaGuardedChatService, SqliteChatStore};
use common::dev_mode::{apply_cli_override, log_dev_mode_status, DevModeConfig};
use common::{AppConfig, AppState};
use services::{GoogleIdentityVerifier, OpenAIService};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = AppConfig::from_env();
    info!(
        port = config.port,
        daily_chat_limit = config.daily_chat_limit,
        openai_model = %config.openai.model,
        "Configuration loaded"
    );

    // ========================================================================
    // DEV MODE CONFIGURATION
    // ========================================================================

    let dev_mode = apply_cli_override(DevModeConfig::from_env());
    log_dev_mode_status(&dev_mode);

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = config.database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    // Run database migrations
    if config.reset_db {
        warn!("RESET_DB is set, dropping all chat data");
    }
    common::migrations::run_migrations(&pool, config.reset_db).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let store: Arc<dyn ChatStore> = Arc::new(SqliteChatStore::new(pool));

    let openai_service = OpenAIService::new(config.openai.clone())?;
    if !openai_service.is_configured() {
        warn!("OPENAI_API_KEY not set, gpt-4o chats will fail until it is configured");
    }
    info!("OpenAIService initialized");

    let providers = ProviderRegistry::new(Arc::new(openai_service));
    let chat_service = Arc::new(QuotaGuardedChatService::new(
        store.clone(),
        providers,
        config.daily_chat_limit,
    ));
    info!("QuotaGuardedChatService initialized");

    let identity = Arc::new(GoogleIdentityVerifier::new(config.google.clone()));
    info!("GoogleIdentityVerifier initialized");

    let dev_user = if dev_mode.is_enabled() {
        let user = store.upsert_user(&dev_mode.dev_identity()).await?;
        info!(user_id = %user.id, "DEV MODE: dev user ready");
        Some(user)
    } else {
        None
    };

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let port = config.port;
    let app_state = AppState {
        config: Arc::new(config),
        store,
        identity,
        chat_service,
        dev_user,
    };

    let app = build_router(app_state);

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

// ============================================================================
// ROUTER COMPOSITION
// ============================================================================

pub fn build_router(app_state: AppState) -> Router {
    let log_bodies = app_state.config.log_http_bodies;
    let cors = cors_layer(&app_state.config.cors_origins);
    let shared = Arc::new(RwLock::new(app_state));

    let mut app = Router::new()
        // ====================================================================
        // AUTHENTICATION ROUTES
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // CHAT ROUTES (Chat, Usage, History)
        // ====================================================================
        .merge(chat::chat_routes());

    // ====================================================================
    // MIDDLEWARE AND LAYERS
    // ====================================================================
    if log_bodies {
        app = app.layer(middleware::from_fn(logging_middleware::log_request_response));
    }

    app.layer(Extension(shared))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}
