// POSTs critical transitions as JSON to an HTTP endpoint.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use url::Url;

use super::{AlertSink, SinkFuture};
use crate::error::CoreError;
use crate::model::{DisruptionEvent, EventTransition, EventUpdate};

#[derive(Serialize)]
struct WebhookPayload<'a> {
    gateway: &'a str,
    transition: EventTransition,
    event: &'a DisruptionEvent,
}

#[derive(Debug, Clone)]
pub struct WebhookAlertSink {
    http: reqwest::Client,
    url: Url,
}

impl WebhookAlertSink {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gatewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::Config {
                message: format!("failed to build webhook client: {e}"),
            })?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn post(&self, gateway: &str, update: &EventUpdate) -> Result<(), CoreError> {
        let payload = WebhookPayload {
            gateway,
            transition: update.transition,
            event: &update.event,
        };
        debug!(url = %self.url, event_id = update.event.id, "POST alert webhook");

        let sink_err = |message: String| CoreError::Sink {
            sink: "webhook".into(),
            message,
        };
        let resp = self
            .http
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| sink_err(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(sink_err(format!("HTTP {status} from {}", self.url)));
        }
        Ok(())
    }
}

impl AlertSink for WebhookAlertSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn notify<'a>(&'a self, gateway: &'a str, update: &'a EventUpdate) -> SinkFuture<'a> {
        Box::pin(self.post(gateway, update))
    }
}
