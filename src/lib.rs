// src/lib.rs
// Public library surface for the binary and the integration tests.

pub mod activity;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pens;
pub mod projects;
pub mod tweets;
pub mod upstream;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::Config;
pub use crate::error::{ApiError, UpstreamError};
