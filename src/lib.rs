//! repository-driver - per-build artifact repository provisioning and
//! promotion
//!
//! A build gets its own hosted store and aggregation group in the
//! repository manager. Once it finishes, its tracked downloads and uploads
//! are classified into artifact records, dependencies are imported into
//! shared stores, build output is promoted, and the caller is notified.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod driver;
pub mod filter;
pub mod http_server;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod observability;
pub mod promote;
pub mod repo;
