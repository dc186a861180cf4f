use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

pub mod app;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod history;
pub mod monitor;
pub mod notify;
pub mod platform;
pub mod poll;

pub use cli::{Cli, Command};
pub use config::{ClientConfig, ConfigError, MonitorSettings, load_config, resolve_config_path};
pub use gateway::{Gateway, HttpGateway};
pub use history::{History, Listeners, LogEvent, MonitorListener};
pub use monitor::Monitor;
pub use notify::{NotificationSink, SinkError};
pub use poll::{ItemResult, PollCycle, PollOutcome};

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// Stderr + daily log file + in-process listeners. The returned guard flushes
/// the file writer on drop and must live as long as the process.
fn init_tracing(debug: bool, listeners: &Listeners) -> Result<Option<WorkerGuard>, AppError> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());

    let stderr_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(EnvFilter::new(&filter));

    let mut file_err = None;
    let (file_layer, guard) = match config::default_log_dir() {
        Some(dir) => match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("notipoll")
            .filename_suffix("log")
            .build(&dir)
        {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(EnvFilter::new(&filter));
                (Some(layer), Some(guard))
            }
            Err(e) => {
                file_err = Some(format!("{}: {e}", dir.display()));
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(listeners.layer())
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    if let Some(e) = file_err {
        tracing::warn!(error = %e, "file logging disabled");
    }
    Ok(guard)
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let command = match cli.command {
        Some(Command::Init {
            domain,
            project,
            interval,
            force,
        }) => {
            return app::init::write_config(cli.config, &domain, &project, interval, force);
        }
        other => other,
    };

    let (cfg_path, cfg) = ClientConfig::find_and_load(cli.config)?;

    let listeners = Listeners::new(cfg.debug);
    let history = Arc::new(History::default());
    listeners.subscribe(history.clone());
    let _log_guard = init_tracing(cfg.debug, &listeners)?;

    info!(path=?cfg_path, debug = cfg.debug, "loaded config");

    match command {
        Some(Command::Test) => app::agent::test_once(&cfg).await,
        Some(Command::Console) => {
            app::console::run(app::console::Session::new(cfg_path, cfg, listeners, history)).await
        }
        _ => app::agent::run(&cfg).await,
    }
}
