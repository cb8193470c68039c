//! Outbound calls to the build orchestrator
//!
//! - `CallbackNotifier`: delivers the terminal result, retrying with
//!   exponential backoff inside a total time budget
//! - `HeartbeatSender`: fire-and-forget liveness pings during long jobs

mod callback;
mod errors;
mod heartbeat;

pub use callback::{CallbackNotifier, RetryPolicy};
pub use errors::{NotifyError, NotifyResult};
pub use heartbeat::HeartbeatSender;

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::model::{HttpMethod, Request};

pub(crate) fn http_client() -> NotifyResult<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| NotifyError::Client(e.to_string()))
}

fn method_of(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Sends `request` once, with its own method, URI and headers.
pub(crate) async fn send(
    client: &reqwest::Client,
    request: &Request,
    body: Option<Vec<u8>>,
    timeout: Duration,
) -> NotifyResult<reqwest::StatusCode> {
    let mut builder = client
        .request(method_of(request.method), &request.uri)
        .timeout(timeout);
    if let Some(body) = body {
        builder = builder.header(CONTENT_TYPE, "application/json").body(body);
    }
    for header in &request.headers {
        builder = builder.header(header.name.as_str(), header.value.as_str());
    }

    let response = builder.send().await.map_err(|e| NotifyError::Transport {
        method: request.method.to_string(),
        uri: request.uri.clone(),
        reason: e.to_string(),
    })?;
    Ok(response.status())
}

#[cfg(test)]
pub(crate) mod testing;
