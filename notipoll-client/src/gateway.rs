use async_trait::async_trait;
use notipoll_shared::api::rest::{self, RestError};
use notipoll_shared::{NotificationId, NotificationRecord};

use crate::config::{ClientConfig, ConfigError};

/// Access to the remote notifications service.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Records still waiting to be shown; `project` empty means all projects.
    async fn fetch_unnotified(&self, project: &str) -> Result<Vec<NotificationRecord>, RestError>;

    /// Requests the Unnotified -> Notified transition for one record.
    async fn acknowledge(&self, id: &NotificationId) -> Result<(), RestError>;
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    api_key: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self, ConfigError> {
        let base = cfg.base_url()?;
        match cfg.api_key() {
            Some(key) => tracing::debug!(key_len = key.len(), "api key configured"),
            None => tracing::debug!("no api key configured"),
        }
        Ok(Self::new(base, cfg.api_key().map(str::to_string)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_unnotified(&self, project: &str) -> Result<Vec<NotificationRecord>, RestError> {
        rest::fetch_unnotified(&self.base_url, project, self.api_key.as_deref()).await
    }

    async fn acknowledge(&self, id: &NotificationId) -> Result<(), RestError> {
        rest::acknowledge(&self.base_url, id, self.api_key.as_deref()).await
    }
}
