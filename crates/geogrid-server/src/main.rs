mod api;
mod middleware;

use std::sync::Arc;

use geogrid_core::{load_palette, AppConfig, Palette};
use geogrid_places::PlacesClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState, GridDefaults},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = geogrid_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = geogrid_db::PoolConfig::from_app_config(&config);
    let pool = geogrid_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = geogrid_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations complete");

    let auth = AuthState::from_keys(
        &config.api_keys,
        matches!(config.env, geogrid_core::Environment::Development),
    )?;
    let state = AppState {
        pool,
        places: build_places_client(&config)?,
        palette: Arc::new(build_palette(&config)?),
        defaults: GridDefaults {
            size: config.default_grid_size,
            spacing_km: config.default_spacing_km,
            scan_max_concurrency: config.scan_max_concurrency,
        },
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "geogrid-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_places_client(config: &AppConfig) -> anyhow::Result<Option<Arc<PlacesClient>>> {
    let Some(api_key) = config.places_api_key.as_deref() else {
        tracing::warn!("GOOGLE_PLACES_API_KEY not set; places and scan routes will answer 503");
        return Ok(None);
    };
    let client = PlacesClient::new(api_key, config.places_request_timeout_secs)?
        .with_retry(config.places_max_retries, config.places_retry_backoff_base_ms);
    Ok(Some(Arc::new(client)))
}

fn build_palette(config: &AppConfig) -> anyhow::Result<Palette> {
    match config.palette_path.as_deref() {
        Some(path) => {
            let palette = load_palette(path)?;
            tracing::info!(path = %path.display(), "loaded marker palette");
            Ok(palette)
        }
        None => Ok(Palette::default()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
