//! # HTTP Server Module
//!
//! REST surface of the repository driver.
//!
//! # Endpoints
//!
//! - `/create` - Provision build stores
//! - `/promote` - Schedule a promotion
//! - `/collect` - Inspect a build's artifacts
//! - `/health` - Health check
//! - `/metrics` - Driver counters

pub mod routes;
pub mod server;

pub use routes::{driver_routes, ErrorResponse, HealthResponse};
pub use server::HttpServer;
