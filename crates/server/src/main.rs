//! The main function for the Bookshelf HTTP server
use anyhow::Context as _;
use bookshelf_core::database::Db;
use server::config::Config;
use server::{AppState, router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine, the variables may come from the environment itself
    let dotenv = dotenvy::dotenv();

    let subscriber = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("unable to set global tracing subscriber")?;
    if let Err(error) = dotenv {
        tracing::debug!("no .env file loaded: {error}");
    }

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(?config, "starting bookshelf server");

    let db = Db::init(&config.database_url)
        .await
        .context("failed to open database")?;
    let app = router(AppState::new(db.clone(), &config)).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    tracing::info!("bookshelf server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {error}");
        // Keep serving, the process can still be killed
        core::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
