//! One fetch -> show -> acknowledge pass over the remote backlog.

use std::sync::Arc;
use std::time::Instant;

use notipoll_shared::NotificationId;
use tracing::{debug, error, info};

use crate::gateway::Gateway;
use crate::history::OUTCOME_SUCCESS;
use crate::notify::NotificationSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult {
    Acknowledged,
    /// Popup failed; the record was left unnotified.
    ShowFailed(String),
    /// Popup shown but the service was not updated.
    AckFailed(String),
}

/// What a single cycle did. Only used for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub fetched: usize,
    pub fetch_error: Option<String>,
    pub items: Vec<(NotificationId, ItemResult)>,
}

impl PollOutcome {
    pub fn acknowledged(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, r)| *r == ItemResult::Acknowledged)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.acknowledged()
    }
}

pub struct PollCycle {
    gateway: Arc<dyn Gateway>,
    sink: Arc<dyn NotificationSink>,
}

impl PollCycle {
    pub fn new(gateway: Arc<dyn Gateway>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { gateway, sink }
    }

    pub async fn run_once(&self, project: &str) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        let started = Instant::now();
        let records = match self.gateway.fetch_unnotified(project).await {
            Ok(r) => r,
            Err(e) => {
                error!(
                    operation = "fetch",
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "fetching unnotified records failed"
                );
                outcome.fetch_error = Some(e.to_string());
                return outcome;
            }
        };
        outcome.fetched = records.len();

        if records.is_empty() {
            debug!("no unnotified records");
            return outcome;
        }
        info!(count = records.len(), "found unnotified records");

        for rec in records {
            if let Err(e) = self.sink.show(&rec.title, &rec.body).await {
                error!(operation = "show", id = %rec.id, error = %e, "showing notification failed");
                outcome
                    .items
                    .push((rec.id, ItemResult::ShowFailed(e.to_string())));
                continue;
            }

            let ack_started = Instant::now();
            match self.gateway.acknowledge(&rec.id).await {
                Ok(()) => {
                    info!(
                        outcome = OUTCOME_SUCCESS,
                        id = %rec.id,
                        "notified: {} - {}",
                        rec.title,
                        rec.body
                    );
                    outcome.items.push((rec.id, ItemResult::Acknowledged));
                }
                Err(e) => {
                    // Already on screen; the record stays unnotified remotely and may be shown again.
                    error!(
                        operation = "acknowledge",
                        id = %rec.id,
                        error = %e,
                        elapsed_ms = ack_started.elapsed().as_millis() as u64,
                        "notification shown but status update failed"
                    );
                    outcome
                        .items
                        .push((rec.id, ItemResult::AckFailed(e.to_string())));
                }
            }
        }

        outcome
    }
}
