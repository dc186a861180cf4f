pub mod agent;
pub mod console;
pub mod init;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::gateway::HttpGateway;
use crate::notify::NotificationSink;
use crate::poll::PollCycle;
use crate::{AppError, Monitor};

pub fn build_cycle(
    cfg: &ClientConfig,
    sink: Arc<dyn NotificationSink>,
) -> Result<PollCycle, AppError> {
    let gateway = HttpGateway::from_config(cfg)?;
    Ok(PollCycle::new(Arc::new(gateway), sink))
}

pub fn build_monitor(
    cfg: &ClientConfig,
    sink: Arc<dyn NotificationSink>,
) -> Result<Monitor, AppError> {
    Ok(Monitor::new(build_cycle(cfg, sink)?, cfg.monitor_settings()))
}
