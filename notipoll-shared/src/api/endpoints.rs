use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::API_PREFIX;
use crate::domain::NotificationStatus;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

/// `GET {base}/api/notifications?status=0[&project=X]`; an empty project means all projects.
pub fn unnotified(base: &str, project: &str) -> String {
    let mut url = base_join(
        base,
        &format!(
            "{}/notifications?status={}",
            API_PREFIX,
            NotificationStatus::Unnotified.code()
        ),
    );
    let project = project.trim();
    if !project.is_empty() {
        url.push_str("&project=");
        url.push_str(&enc(project));
    }
    url
}

pub fn notification_status(base: &str, id: &str) -> String {
    base_join(
        base,
        &format!("{}/notifications/{}/status", API_PREFIX, enc(id)),
    )
}
