#[cfg(not(target_os = "windows"))]
pub mod linux;
#[cfg(target_os = "windows")]
pub mod windows;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::notify::NotificationSink;

/// Process-wide setup the popup backend needs before first use. Call from
/// `main` before the runtime starts; it may modify the environment.
pub fn initialize_process() {
    #[cfg(not(target_os = "windows"))]
    linux::ensure_console_dbus_env();
}

/// Popup backend for the current platform.
pub fn detect_sink(cfg: &ClientConfig) -> Arc<dyn NotificationSink> {
    #[cfg(target_os = "windows")]
    {
        tracing::info!(app_id = %cfg.app_id, "popup backend: windows toast");
        Arc::new(windows::notify::Notifier::new(&cfg.app_id))
    }
    #[cfg(not(target_os = "windows"))]
    {
        tracing::info!(app_id = %cfg.app_id, "popup backend: desktop notifications");
        Arc::new(linux::notify::Notifier::new(&cfg.app_id))
    }
}
