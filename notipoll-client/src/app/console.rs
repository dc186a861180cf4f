//! Line-oriented control surface: the start/stop/test buttons and history
//! list of a desktop client, driven from stdin.

use std::io::BufRead;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::agent::{SHUTDOWN_GRACE, shutdown_signal};
use crate::config::{self, ClientConfig, DEFAULT_INTERVAL_SECS};
use crate::history::{History, Listeners, OUTCOME_SUCCESS};
use crate::notify::NotificationSink;
use crate::{AppError, Monitor, platform};

const HELP: &str = "commands:
  start              begin monitoring
  stop               stop monitoring
  test               poll once now
  popup              show a sample popup without contacting the service
  logs               print the log folder
  status             show monitor state
  history            show recent log lines (newest first)
  debug on|off       toggle debug lines in history
  project <name>     set project filter (\"-\" clears it)
  interval <secs>    set poll interval
  domain <url>       set service URL
  save               write current settings to the config file
  help               this text
  quit               stop and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Test,
    Popup,
    Logs,
    Status,
    History,
    Debug(bool),
    Project(String),
    Interval(i64),
    Domain(String),
    Save,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Err("empty command".into());
        };
        let rest: Vec<&str> = parts.collect();
        let arg = rest.join(" ");
        let cmd = match (word.to_ascii_lowercase().as_str(), rest.len()) {
            ("start", 0) => ConsoleCommand::Start,
            ("stop", 0) => ConsoleCommand::Stop,
            ("test", 0) => ConsoleCommand::Test,
            ("popup", 0) => ConsoleCommand::Popup,
            ("logs", 0) => ConsoleCommand::Logs,
            ("status", 0) => ConsoleCommand::Status,
            ("history", 0) => ConsoleCommand::History,
            ("save", 0) => ConsoleCommand::Save,
            ("help" | "?", 0) => ConsoleCommand::Help,
            ("quit" | "exit", 0) => ConsoleCommand::Quit,
            ("debug", 1) => match arg.as_str() {
                "on" | "true" => ConsoleCommand::Debug(true),
                "off" | "false" => ConsoleCommand::Debug(false),
                other => return Err(format!("debug expects on|off, got {other:?}")),
            },
            ("project", n) if n >= 1 => {
                if arg == "-" {
                    ConsoleCommand::Project(String::new())
                } else {
                    ConsoleCommand::Project(arg)
                }
            }
            ("interval", 1) => ConsoleCommand::Interval(
                arg.parse()
                    .map_err(|_| format!("interval expects whole seconds, got {arg:?}"))?,
            ),
            ("domain", 1) => ConsoleCommand::Domain(arg),
            _ => return Err(format!("unknown command {line:?}; type help")),
        };
        Ok(cmd)
    }
}

pub struct Session {
    cfg_path: PathBuf,
    cfg: ClientConfig,
    listeners: Listeners,
    history: Arc<History>,
}

impl Session {
    pub fn new(
        cfg_path: PathBuf,
        cfg: ClientConfig,
        listeners: Listeners,
        history: Arc<History>,
    ) -> Self {
        Self {
            cfg_path,
            cfg,
            listeners,
            history,
        }
    }
}

const SAMPLE_TITLE: &str = "Test notification";
const SAMPLE_BODY: &str = "If you can read this, desktop popups work.";

/// Lifecycle requests, applied strictly in the order they were typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
}

/// Runs start/stop requests one after another off the input loop. The task
/// ends once every sender is dropped.
pub fn spawn_control(monitor: Monitor) -> (mpsc::UnboundedSender<Control>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            debug!(?op, "applying lifecycle request");
            match op {
                Control::Start => monitor.start().await,
                Control::Stop => monitor.stop().await,
            };
        }
    });
    (tx, handle)
}

/// Stdin is read on a plain thread so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run(mut session: Session) -> Result<(), AppError> {
    let sink = platform::detect_sink(&session.cfg);
    let monitor = super::build_monitor(&session.cfg, sink.clone())?;
    let (control, control_task) = spawn_control(monitor.clone());
    println!("{HELP}");

    let mut lines = spawn_stdin_reader();
    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            res = shutdown_signal() => {
                res?;
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cmd = match line.parse::<ConsoleCommand>() {
            Ok(c) => c,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if cmd == ConsoleCommand::Quit {
            break;
        }
        handle(&mut session, &monitor, &control, &sink, cmd).await;
    }

    info!("console closing; stopping monitor");
    drop(control);
    if let Err(e) = control_task.await {
        warn!(error=%e, "control task failed");
    }
    monitor.shutdown(SHUTDOWN_GRACE).await;
    Ok(())
}

async fn handle(
    session: &mut Session,
    monitor: &Monitor,
    control: &mpsc::UnboundedSender<Control>,
    sink: &Arc<dyn NotificationSink>,
    cmd: ConsoleCommand,
) {
    match cmd {
        ConsoleCommand::Start => send(control, Control::Start),
        ConsoleCommand::Stop => send(control, Control::Stop),
        ConsoleCommand::Test => {
            // Fire and forget; the outcome shows up in the log.
            drop(monitor.trigger_test());
        }
        ConsoleCommand::Popup => {
            tokio::spawn(show_sample(sink.clone()));
        }
        ConsoleCommand::Logs => match config::default_log_dir() {
            Some(dir) => println!("{}", dir.display()),
            None => println!("no log folder on this platform"),
        },
        ConsoleCommand::Status => {
            let settings = monitor.settings();
            let project = if settings.project.is_empty() {
                "(all)"
            } else {
                settings.project.as_str()
            };
            println!(
                "running: {} | loops: {} | project: {} | interval: {}s | debug: {} | domain: {}",
                monitor.is_running().await,
                monitor.active_loops(),
                project,
                settings.interval.as_secs(),
                session.listeners.debug_enabled(),
                session.cfg.domain,
            );
        }
        ConsoleCommand::History => {
            for line in session.history.snapshot() {
                println!("{line}");
            }
        }
        ConsoleCommand::Debug(on) => {
            session.listeners.set_debug(on);
            session.cfg.debug = on;
            info!(debug = on, "debug mode changed");
        }
        ConsoleCommand::Project(project) => {
            session.cfg.project = project;
            apply(session, monitor, sink);
        }
        ConsoleCommand::Interval(secs) => {
            session.cfg.interval = match config::validate_interval(secs) {
                Ok(_) => secs,
                Err(e) => {
                    warn!(error = %e, fallback_secs = DEFAULT_INTERVAL_SECS, "invalid interval; using default");
                    DEFAULT_INTERVAL_SECS
                }
            };
            apply(session, monitor, sink);
        }
        ConsoleCommand::Domain(domain) => {
            let mut next = session.cfg.clone();
            next.domain = domain;
            match next.base_url() {
                Ok(base) => {
                    next.domain = base;
                    session.cfg = next;
                    apply(session, monitor, sink);
                }
                Err(e) => warn!(error = %e, "domain rejected"),
            }
        }
        ConsoleCommand::Save => match config::save_config(&session.cfg_path, &session.cfg) {
            Ok(()) => info!(
                outcome = OUTCOME_SUCCESS,
                path = %session.cfg_path.display(),
                "config saved"
            ),
            Err(e) => error!(error = %e, "saving config failed"),
        },
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
}

fn send(control: &mpsc::UnboundedSender<Control>, op: Control) {
    if control.send(op).is_err() {
        error!(?op, "control task is gone; request dropped");
    }
}

/// Exercises the popup backend alone, without the service.
pub async fn show_sample(sink: Arc<dyn NotificationSink>) {
    match sink.show(SAMPLE_TITLE, SAMPLE_BODY).await {
        Ok(()) => info!(outcome = OUTCOME_SUCCESS, "sample popup shown"),
        Err(e) => error!(operation = "show", error = %e, "sample popup failed"),
    }
}

fn apply(session: &Session, monitor: &Monitor, sink: &Arc<dyn NotificationSink>) {
    match super::build_cycle(&session.cfg, sink.clone()) {
        Ok(cycle) => {
            monitor.reconfigure(session.cfg.monitor_settings(), cycle);
            info!("settings applied; restart monitoring for them to take effect");
        }
        Err(e) => warn!(error = %e, "settings not applied"),
    }
}
