mod config;

use axum::{Json, Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use bazar_api::mailer::Mailer;
use bazar_api::{AppStateInner, Settings};
use bazar_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bazar=debug,bazar_api=debug,bazar_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open(&config.db_path)?;
    info!("Database ready at {}", config.db_path.display());

    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => {
            if let Err(e) = bazar_api::auth::bootstrap_admin(&db, email, password) {
                error!("Could not create the admin account: {}", e);
                return Err(anyhow::anyhow!("admin bootstrap failed: {}", e));
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("Set both BAZAR_ADMIN_EMAIL and BAZAR_ADMIN_PASSWORD to create an admin account");
        }
        (None, None) => {}
    }

    let mailer = match &config.mail_relay_url {
        Some(url) => Mailer::relay(url.clone(), config.mail_from.clone()),
        None => {
            info!("No mail relay configured; reset links will be logged");
            Mailer::Log
        }
    };

    let settings = Settings {
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: chrono::Duration::hours(config.token_ttl_hours),
        frontend_url: config.frontend_url.clone(),
        empty_search_not_found: config.empty_search_not_found,
    };
    let state = AppStateInner::new(db, settings, mailer);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", bazar_api::router(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Bazar server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
