use dam_dashboard::{router, AppState, Config, Refresher, Scheduler, SheetFetcher};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    info!("using {} source", config.source.kind());

    let fetcher = SheetFetcher::new(config.source.clone(), config.request_timeout)?;
    let refresher = Arc::new(Refresher::new(fetcher));
    let scheduler = Scheduler::start(Arc::clone(&refresher), config.refresh_interval);

    let app = router(AppState::new(refresher, config.refresh_interval));

    info!("listening on http://{}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
