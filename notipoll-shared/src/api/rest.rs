//! Minimal REST client helpers for the notifications service.

use super::endpoints as ep;
use super::*;
use crate::domain::{NotificationId, NotificationRecord};
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};
use tracing::debug;

pub use reqwest::StatusCode;

/// Upper bound for a single request, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("transport failed after {}ms: {message}", .elapsed.as_millis())]
    Transport { elapsed: Duration, message: String },
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decode: {0}")]
    Decode(String),
    #[error("service reported failure: {0}")]
    Application(String),
}

impl RestError {
    fn transport(started: Instant, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("timed out: {err}")
        } else {
            err.to_string()
        };
        RestError::Transport {
            elapsed: started.elapsed(),
            message,
        }
    }

    /// HTTP status for [`RestError::Status`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
});

fn mk_client() -> reqwest::Client {
    HTTP_CLIENT.clone()
}

fn with_api_key(req: reqwest::RequestBuilder, api_key: Option<&str>) -> reqwest::RequestBuilder {
    match api_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => req.header(API_KEY_HEADER, key),
        None => req,
    }
}

async fn handle_envelope<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
    started: Instant,
) -> Result<Envelope<T>, RestError> {
    let status = res.status();
    if status != StatusCode::OK {
        let body = res.text().await.unwrap_or_default();
        return Err(RestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = res
        .bytes()
        .await
        .map_err(|e| RestError::transport(started, e))?;
    let env: Envelope<T> =
        serde_json::from_slice(&bytes).map_err(|e| RestError::Decode(e.to_string()))?;
    debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        success = env.success,
        count = env.count,
        "api response decoded"
    );
    if !env.success {
        return Err(RestError::Application(env.message));
    }
    Ok(env)
}

/// Lists records the service still considers unnotified, optionally narrowed to one project.
pub async fn fetch_unnotified(
    base: &str,
    project: &str,
    api_key: Option<&str>,
) -> Result<Vec<NotificationRecord>, RestError> {
    let client = mk_client();
    let url = ep::unnotified(base, project);
    debug!(method = "GET", %url, "api request");
    let started = Instant::now();
    let res = with_api_key(client.get(url), api_key)
        .send()
        .await
        .map_err(|e| RestError::transport(started, e))?;
    let env: NotificationListResp = handle_envelope(res, started).await?;
    Ok(env.data.unwrap_or_default())
}

/// Marks one record as notified. The service treats repeats as no-ops.
pub async fn acknowledge(
    base: &str,
    id: &NotificationId,
    api_key: Option<&str>,
) -> Result<(), RestError> {
    let client = mk_client();
    let url = ep::notification_status(base, id.as_ref());
    debug!(method = "PATCH", %url, "api request");
    let started = Instant::now();
    let res = with_api_key(client.patch(url), api_key)
        .json(&StatusUpdateReq::notified())
        .send()
        .await
        .map_err(|e| RestError::transport(started, e))?;
    let _: Envelope<serde_json::Value> = handle_envelope(res, started).await?;
    Ok(())
}
