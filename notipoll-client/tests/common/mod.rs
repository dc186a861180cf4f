#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use notipoll_client::{Gateway, NotificationSink, PollCycle, SinkError};
use notipoll_shared::api::rest::RestError;
use notipoll_shared::{NotificationId, NotificationRecord, NotificationStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    Show(String, String),
    Ack(String),
}

/// Ordered log of every collaborator call across gateway and sink.
#[derive(Default)]
pub struct Journal(Mutex<Vec<Call>>);

impl Journal {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn shows(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Show(..)))
            .count()
    }

    pub fn acks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Ack(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn fetches(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fetch(_)))
            .count()
    }
}

pub fn record(id: &str, title: &str, body: &str) -> NotificationRecord {
    NotificationRecord {
        id: NotificationId::from(id),
        project: "demo".into(),
        title: title.into(),
        body: body.into(),
        status: NotificationStatus::Unnotified,
        created_at: "2025-03-01T10:15:00Z".into(),
        notified_at: None,
    }
}

/// Serves the same backlog on every fetch, like a service whose acks never land.
pub struct FakeGateway {
    journal: Arc<Journal>,
    records: Mutex<Vec<NotificationRecord>>,
    fetch_status: Mutex<Option<u16>>,
    ack_failures: Mutex<HashSet<String>>,
    fetch_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeGateway {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self {
            journal,
            records: Mutex::new(Vec::new()),
            fetch_status: Mutex::new(None),
            ack_failures: Mutex::new(HashSet::new()),
            fetch_delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_records(self, records: Vec<NotificationRecord>) -> Self {
        *self.records.lock().unwrap() = records;
        self
    }

    pub fn failing_fetch(self, status: u16) -> Self {
        *self.fetch_status.lock().unwrap() = Some(status);
        self
    }

    pub fn failing_ack(self, id: &str) -> Self {
        self.ack_failures.lock().unwrap().insert(id.to_string());
        self
    }

    pub fn slow_fetch(self, delay: Duration) -> Self {
        *self.fetch_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of fetches seen running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn fetch_unnotified(&self, project: &str) -> Result<Vec<NotificationRecord>, RestError> {
        self.journal.push(Call::Fetch(project.to_string()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let status = *self.fetch_status.lock().unwrap();
        if let Some(status) = status {
            return Err(RestError::Status {
                status,
                body: "boom".into(),
            });
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn acknowledge(&self, id: &NotificationId) -> Result<(), RestError> {
        self.journal.push(Call::Ack(id.to_string()));
        if self.ack_failures.lock().unwrap().contains(&id.0) {
            return Err(RestError::Transport {
                elapsed: Duration::from_millis(10),
                message: "connection reset".into(),
            });
        }
        Ok(())
    }
}

pub struct FakeSink {
    journal: Arc<Journal>,
    fail_titles: Mutex<HashSet<String>>,
}

impl FakeSink {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self {
            journal,
            fail_titles: Mutex::new(HashSet::new()),
        }
    }

    pub fn failing_for(self, title: &str) -> Self {
        self.fail_titles.lock().unwrap().insert(title.to_string());
        self
    }
}

#[async_trait]
impl NotificationSink for FakeSink {
    async fn show(&self, title: &str, body: &str) -> Result<(), SinkError> {
        self.journal
            .push(Call::Show(title.to_string(), body.to_string()));
        if self.fail_titles.lock().unwrap().contains(title) {
            return Err(SinkError::new("no notification daemon"));
        }
        Ok(())
    }
}

pub fn cycle(gateway: Arc<FakeGateway>, sink: FakeSink) -> PollCycle {
    PollCycle::new(gateway, Arc::new(sink))
}
