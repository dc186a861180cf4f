//! Fan-out of monitor log events to in-process listeners (history views).
//!
//! The monitor only speaks `tracing`; [`ListenerLayer`] turns the events it
//! emits into [`LogEvent`]s and hands them to every registered
//! [`MonitorListener`] synchronously, on the emitting thread.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Local};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

pub const HISTORY_CAPACITY: usize = 100;

/// Field that upgrades an info event to [`Level::Success`].
pub const OUTCOME_FIELD: &str = "outcome";
pub const OUTCOME_SUCCESS: &str = "success";

const TARGET_PREFIX: &str = "notipoll";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Success,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Success => "SUCCESS",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
    pub at: DateTime<Local>,
}

impl LogEvent {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Vec::new(),
            at: Local::now(),
        }
    }

    /// `[HH:MM:SS] message (k=v, ...)`
    pub fn history_line(&self) -> String {
        let mut line = format!("[{}] {}", self.at.format("%H:%M:%S"), self.message);
        if !self.fields.is_empty() {
            let rendered: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            line.push_str(&format!(" ({})", rendered.join(", ")));
        }
        line
    }
}

pub trait MonitorListener: Send + Sync {
    fn on_event(&self, event: &LogEvent);
}

#[derive(Default)]
struct ListenersInner {
    listeners: RwLock<Vec<Arc<dyn MonitorListener>>>,
    debug: AtomicBool,
}

/// Shared registry of listeners plus the runtime debug toggle.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<ListenersInner>,
}

impl Listeners {
    pub fn new(debug: bool) -> Self {
        let l = Self::default();
        l.set_debug(debug);
        l
    }

    pub fn subscribe(&self, listener: Arc<dyn MonitorListener>) {
        if let Ok(mut v) = self.inner.listeners.write() {
            v.push(listener);
        }
    }

    pub fn set_debug(&self, enabled: bool) {
        self.inner.debug.store(enabled, Ordering::Relaxed);
    }

    pub fn debug_enabled(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed)
    }

    /// Delivers an event to every listener. Debug events are dropped unless
    /// debug mode is on.
    pub fn dispatch(&self, event: &LogEvent) {
        if event.level == Level::Debug && !self.debug_enabled() {
            return;
        }
        let Ok(listeners) = self.inner.listeners.read() else {
            return;
        };
        for l in listeners.iter() {
            l.on_event(event);
        }
    }

    pub fn layer(&self) -> ListenerLayer {
        ListenerLayer {
            listeners: self.clone(),
        }
    }
}

/// `tracing` layer forwarding this application's events to [`Listeners`].
pub struct ListenerLayer {
    listeners: Listeners,
}

impl<S> Layer<S> for ListenerLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !meta.target().starts_with(TARGET_PREFIX) {
            return;
        }
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let level = match *meta.level() {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO if visitor.success => Level::Success,
            tracing::Level::INFO => Level::Info,
            _ => Level::Debug,
        };
        let message = visitor
            .message
            .unwrap_or_else(|| meta.name().to_string());
        self.listeners.dispatch(&LogEvent {
            level,
            message,
            fields: visitor.fields,
            at: Local::now(),
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
    success: bool,
}

impl FieldVisitor {
    fn record_value(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            OUTCOME_FIELD if value == OUTCOME_SUCCESS => self.success = true,
            name => self.fields.push((name.to_string(), value)),
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{value:?}"));
    }
}

/// Bounded, newest-first list of rendered log lines.
pub struct History {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, line: String) {
        let Ok(mut lines) = self.lines.lock() else {
            return;
        };
        lines.push_front(line);
        lines.truncate(self.capacity);
    }

    /// Newest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MonitorListener for History {
    fn on_event(&self, event: &LogEvent) {
        self.push(event.history_line());
    }
}
