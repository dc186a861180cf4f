//! Wire types and REST helpers for the notifications service.

pub mod api;
pub mod domain;

pub use domain::{NotificationId, NotificationRecord, NotificationStatus};
