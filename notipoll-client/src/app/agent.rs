use std::time::Duration;

use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::poll::ItemResult;
use crate::{AppError, platform};

/// How long a cycle in flight may take to finish once shutdown is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Headless mode: monitor until SIGINT/SIGTERM.
pub async fn run(cfg: &ClientConfig) -> Result<(), AppError> {
    let sink = platform::detect_sink(cfg);
    let monitor = super::build_monitor(cfg, sink)?;
    let base = cfg.base_url()?;
    info!(%base, "starting monitor");
    monitor.start().await;

    shutdown_signal().await?;
    info!("shutdown signal received; requesting monitor to stop");
    monitor.shutdown(SHUTDOWN_GRACE).await;
    Ok(())
}

/// One manual poll, reported on stdout.
pub async fn test_once(cfg: &ClientConfig) -> Result<(), AppError> {
    let sink = platform::detect_sink(cfg);
    let monitor = super::build_monitor(cfg, sink)?;
    let settings = monitor.settings();
    let base = cfg.base_url()?;
    info!(
        %base,
        project = %settings.project,
        "testing API connection"
    );

    let outcome = monitor
        .trigger_test()
        .await
        .map_err(|e| AppError::Io(std::io::Error::other(e.to_string())))?;

    if let Some(err) = outcome.fetch_error {
        return Err(AppError::Http(format!("fetch failed: {err}")));
    }
    println!("fetched {} unnotified record(s)", outcome.fetched);
    for (id, result) in &outcome.items {
        match result {
            ItemResult::Acknowledged => println!("  {id}: shown and acknowledged"),
            ItemResult::ShowFailed(e) => println!("  {id}: popup failed ({e})"),
            ItemResult::AckFailed(e) => println!("  {id}: shown, acknowledge failed ({e})"),
        }
    }
    if outcome.items.iter().any(|(_, r)| *r != ItemResult::Acknowledged) {
        warn!("some records were not fully processed");
    }
    Ok(())
}

pub(crate) async fn shutdown_signal() -> Result<(), AppError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigint.recv() => {
                info!("shutdown: received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("shutdown: received SIGTERM");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("shutdown: received ctrl_c");
    }
    Ok(())
}
