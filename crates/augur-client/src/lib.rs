//! REST client for the Augur report backend.
//!
//! This crate provides:
//! - Typed access to the user, config, submit and usage-history endpoints
//! - Backend traits so the workflow can run against stubs
//! - Bearer token capability supplied by the host application
//! - Retry with backoff for idempotent reads
//! - The last-known snapshot cache contract

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;


pub use api::{AccountApi, ReportApi, SubmitResponse};
pub use auth::{StaticToken, TokenProvider};
pub use cache::{InMemorySnapshotCache, SnapshotCache};
pub use client::{ApiClient, ApiConfig};
pub use error::{ClientError, ClientResult};
pub use retry::RetryConfig;
