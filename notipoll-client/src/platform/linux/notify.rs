use async_trait::async_trait;
use tracing::{debug, warn};

use crate::notify::{NotificationSink, SinkError};

/// Freedesktop notification via notify-rust.
#[derive(Debug)]
pub struct Notifier {
    app_name: String,
}

impl Notifier {
    pub fn new(app_name: &str) -> Self {
        debug!(app_name, "Linux Notifier created");
        Self {
            app_name: app_name.to_string(),
        }
    }
}

#[async_trait]
impl NotificationSink for Notifier {
    async fn show(&self, title: &str, body: &str) -> Result<(), SinkError> {
        debug!(title, "show: building notification");
        let mut n = notify_rust::Notification::new();
        let res = n
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .urgency(notify_rust::Urgency::Normal)
            .show_async()
            .await;

        match res {
            Ok(_handle) => {
                debug!(title, "show: notification shown");
                Ok(())
            }
            Err(e) => {
                warn!(error=%e, "notify-rust failed while showing notification");
                Err(SinkError::new(e.to_string()))
            }
        }
    }
}
