use async_trait::async_trait;
use tauri_winrt_notification::Toast;
use tracing::{debug, warn};

use crate::notify::{NotificationSink, SinkError};

/// Toast notification keyed by an application user model id.
#[derive(Debug)]
pub struct Notifier {
    app_id: String,
}

impl Notifier {
    pub fn new(app_id: &str) -> Self {
        let app_id = if app_id.trim().is_empty() {
            Toast::POWERSHELL_APP_ID.to_string()
        } else {
            app_id.to_string()
        };
        debug!(%app_id, "Windows Notifier created");
        Self { app_id }
    }
}

#[async_trait]
impl NotificationSink for Notifier {
    async fn show(&self, title: &str, body: &str) -> Result<(), SinkError> {
        let app_id = self.app_id.clone();
        let title = title.to_string();
        let body = body.to_string();
        // The WinRT call blocks on COM; keep it off the runtime threads.
        let res = tokio::task::spawn_blocking(move || {
            Toast::new(&app_id).title(&title).text1(&body).show()
        })
        .await
        .map_err(|e| SinkError::new(format!("toast task failed: {e}")))?;
        match res {
            Ok(()) => {
                debug!("toast shown");
                Ok(())
            }
            Err(e) => {
                warn!(error=%e, "toast failed");
                Err(SinkError::new(e.to_string()))
            }
        }
    }
}
