use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("popup failed: {cause}")]
pub struct SinkError {
    pub cause: String,
}

impl SinkError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Renders one OS-level popup. Failing affects only the record being shown.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn show(&self, title: &str, body: &str) -> Result<(), SinkError>;
}
