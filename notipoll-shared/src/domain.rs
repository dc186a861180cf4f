use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        NotificationId(value.to_string())
    }
}

impl FromStr for NotificationId {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NotificationId(s.to_string()))
    }
}

impl AsRef<str> for NotificationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Delivery state of a record as tracked by the remote service.
///
/// On the wire this is `0` (unnotified) or `1` (notified). Some deployments
/// send it as a string, so both forms are accepted when decoding.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStatus", into = "u8")]
pub enum NotificationStatus {
    #[default]
    Unnotified,
    Notified,
}

impl NotificationStatus {
    pub fn code(self) -> u8 {
        match self {
            NotificationStatus::Unnotified => 0,
            NotificationStatus::Notified => 1,
        }
    }
}

impl From<NotificationStatus> for u8 {
    fn from(value: NotificationStatus) -> Self {
        value.code()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Code(u8),
    Text(String),
}

impl TryFrom<RawStatus> for NotificationStatus {
    type Error = String;

    fn try_from(raw: RawStatus) -> Result<Self, Self::Error> {
        match raw {
            RawStatus::Code(0) => Ok(NotificationStatus::Unnotified),
            RawStatus::Code(1) => Ok(NotificationStatus::Notified),
            RawStatus::Code(other) => Err(format!("unknown notification status {other}")),
            RawStatus::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "0" | "" | "unnotified" | "pending" => Ok(NotificationStatus::Unnotified),
                "1" | "notified" => Ok(NotificationStatus::Notified),
                other => Err(format!("unknown notification status {other:?}")),
            },
        }
    }
}

/// A record owned by the remote service. Clients only read it and request
/// the Unnotified -> Notified transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "message", default)]
    pub body: String,
    #[serde(default)]
    pub status: NotificationStatus,
    #[serde(default)]
    pub created_at: String, // RFC3339
    #[serde(default)]
    pub notified_at: Option<String>, // RFC3339
}

impl NotificationRecord {
    pub fn created_at_utc(&self) -> Option<OffsetDateTime> {
        parse_timestamp(&self.created_at)
    }

    pub fn notified_at_utc(&self) -> Option<OffsetDateTime> {
        self.notified_at.as_deref().and_then(parse_timestamp)
    }
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    OffsetDateTime::parse(trimmed, &Rfc3339).ok()
}
