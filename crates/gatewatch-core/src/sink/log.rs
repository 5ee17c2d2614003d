use tracing::warn;

use super::{AlertSink, SinkFuture};
use crate::model::EventUpdate;

/// Writes each critical transition to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn name(&self) -> &str {
        "log"
    }

    fn notify<'a>(&'a self, gateway: &'a str, update: &'a EventUpdate) -> SinkFuture<'a> {
        let event = &update.event;
        warn!(
            gateway,
            transition = %update.transition,
            event_type = %event.event_type,
            severity = %event.severity,
            errors = event.error_count,
            detail = event.last_error.as_deref().unwrap_or(""),
            "critical disruption"
        );
        Box::pin(std::future::ready(Ok(())))
    }
}
