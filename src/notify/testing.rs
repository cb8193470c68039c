//! A local HTTP receiver recording what it is sent.
//!
//! Shared by the unit tests and the integration tests under `tests/`, so it
//! only depends on axum and tokio.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::any;
use axum::Router;

#[derive(Debug, Clone)]
pub struct Received {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Default)]
pub struct Receiver {
    /// Requests answered with 500 before the first 200
    failures: AtomicUsize,
    received: Mutex<Vec<Received>>,
}

impl Receiver {
    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.received().into_iter().map(|r| r.body).collect()
    }

    /// Polls for up to two seconds until `count` requests have arrived.
    pub async fn wait_for(&self, count: usize) {
        for _ in 0..200 {
            if self.count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

async fn receive(
    State(receiver): State<Arc<Receiver>>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    receiver.received.lock().unwrap().push(Received {
        method,
        headers,
        body,
    });
    let failures = receiver.failures.load(Ordering::SeqCst);
    if failures > 0 {
        receiver.failures.store(failures - 1, Ordering::SeqCst);
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

/// Starts a receiver failing its first `failures` requests; returns its
/// base URL.
pub async fn start(failures: usize) -> (String, Arc<Receiver>) {
    let receiver = Arc::new(Receiver {
        failures: AtomicUsize::new(failures),
        received: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/*path", any(receive))
        .with_state(receiver.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), receiver)
}
