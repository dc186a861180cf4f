use serde::{Deserialize, Serialize};

use crate::domain::{NotificationRecord, NotificationStatus};

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

pub const API_PREFIX: &str = "/api";

/// Header carrying the optional API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Response envelope shared by every notifications endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub message: String,
}

pub type NotificationListResp = Envelope<Vec<NotificationRecord>>;

// Acknowledge: PATCH /api/notifications/{id}/status
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdateReq {
    pub status: NotificationStatus,
}

impl StatusUpdateReq {
    pub fn notified() -> Self {
        Self {
            status: NotificationStatus::Notified,
        }
    }
}
