//! Callback delivery
//!
//! The result is serialised once and sent with the caller's method, URI
//! and headers. Transport errors and non-2xx answers are retried with
//! exponential backoff until the total retry budget is spent. Delivery
//! failures are logged and counted, never returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DriverConfig;
use crate::model::{PromoteResult, Request};
use crate::observability::DriverMetrics;

use super::errors::NotifyResult;

/// Backoff schedule of callback retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Total budget, first attempt included
    pub max_duration: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DriverConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.callback_retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.callback_retry_max_delay_ms),
            max_duration: config.callback_retry_duration(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            max_duration: Duration::from_secs(600),
        }
    }
}

/// Delivers promotion results to the caller's callback endpoint.
#[derive(Clone)]
pub struct CallbackNotifier {
    client: reqwest::Client,
    request_timeout: Duration,
    policy: RetryPolicy,
    metrics: Arc<DriverMetrics>,
}

impl CallbackNotifier {
    pub fn new(
        request_timeout: Duration,
        policy: RetryPolicy,
        metrics: Arc<DriverMetrics>,
    ) -> NotifyResult<Self> {
        Ok(Self {
            client: super::http_client()?,
            request_timeout,
            policy,
            metrics,
        })
    }

    /// Returns whether the callback was acknowledged with a 2xx status.
    pub async fn notify(&self, callback: &Request, result: &PromoteResult) -> bool {
        let body = match serde_json::to_vec(result) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize callback object, sending an empty body.");
                Vec::new()
            }
        };

        let deadline = Instant::now() + self.policy.max_duration;
        let mut backoff = self.policy.initial_delay;
        let mut attempt = 0u32;

        loop {
            let (last_error, last_status) =
                match super::send(&self.client, callback, Some(body.clone()), self.request_timeout)
                    .await
                {
                    Ok(status) if status.is_success() => {
                        tracing::info!("Callback sent, response status: {}.", status.as_u16());
                        self.metrics.increment_callbacks_delivered();
                        return true;
                    }
                    Ok(status) => (String::new(), status.as_u16().to_string()),
                    Err(e) => (e.to_string(), String::new()),
                };

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::error!(
                    uri = %callback.uri,
                    attempts = attempt + 1,
                    last_error = %last_error,
                    last_status = %last_status,
                    "Unable to send callback."
                );
                self.metrics.increment_callbacks_undelivered();
                return false;
            }

            attempt += 1;
            tracing::warn!(
                "Callback retry attempt #{}, last error: [{}], last status: [{}].",
                attempt,
                last_error,
                last_status
            );
            tokio::time::sleep(backoff.min(remaining)).await;
            backoff = (backoff * 2).min(self.policy.max_delay);
        }
    }
}
