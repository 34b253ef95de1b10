use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitefy_reviews::config::{AdminAuthMode, AppConfig};
use sitefy_reviews::http;
use sitefy_reviews::infra::{db::Db, storage::ObjectStorage};
use sitefy_reviews::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitefy_reviews=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let db = Db::connect(&config).await?;
    db.migrate().await?;
    let storage = ObjectStorage::new(&config).await?;

    match (config.admin_auth, config.admin_token.is_some()) {
        (AdminAuthMode::Disabled, _) => {
            tracing::warn!("ADMIN_AUTH=disabled: admin routes accept requests without a token");
        }
        (AdminAuthMode::Required, false) => {
            tracing::warn!("ADMIN_TOKEN is not set: admin routes will refuse every request");
        }
        (AdminAuthMode::Required, true) => {}
    }

    let state = AppState {
        reviews: Arc::new(db),
        videos: Arc::new(storage),
        video_key_prefix: config.video_key_prefix.clone(),
        upload_max_bytes: config.max_file_size,
        allowed_video_types: Arc::new(config.allowed_video_types.clone()),
        admin_auth: config.admin_auth,
        admin_token: config.admin_token.clone(),
    };

    let app = http::router_with_static(state, config.static_dir.as_deref())
        .layer(http::cors_layer(&config.allowed_origins)?)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!("listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
