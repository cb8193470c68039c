//! Heartbeats
//!
//! Bodyless requests telling the orchestrator a long promotion is still
//! alive. Sent in the background; failures are only logged.

use std::sync::Arc;
use std::time::Duration;

use crate::model::Request;
use crate::observability::DriverMetrics;

use super::errors::NotifyResult;

#[derive(Clone)]
pub struct HeartbeatSender {
    client: reqwest::Client,
    request_timeout: Duration,
    metrics: Arc<DriverMetrics>,
}

impl HeartbeatSender {
    pub fn new(request_timeout: Duration, metrics: Arc<DriverMetrics>) -> NotifyResult<Self> {
        Ok(Self {
            client: super::http_client()?,
            request_timeout,
            metrics,
        })
    }

    /// Spawns one heartbeat. No-op without a heartbeat endpoint.
    pub fn send(&self, heart_beat: Option<&Request>) {
        let Some(request) = heart_beat.cloned() else {
            return;
        };
        let sender = self.clone();
        tokio::spawn(async move {
            sender.beat(&request).await;
        });
    }

    /// Sends one heartbeat and waits for the answer.
    pub async fn beat(&self, request: &Request) -> bool {
        match super::send(&self.client, request, None, self.request_timeout).await {
            Ok(status) if status.is_success() => {
                tracing::debug!("Heartbeat sent. Response status: {}", status.as_u16());
                true
            }
            Ok(status) => {
                tracing::warn!(status = status.as_u16(), "Failed to send heartbeat.");
                self.metrics.increment_heartbeats_failed();
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send heartbeat.");
                self.metrics.increment_heartbeats_failed();
                false
            }
        }
    }
}
