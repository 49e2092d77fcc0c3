// src/upstream/mod.rs
//! Upstream clients: one submodule per external service, plus the shared
//! HTTP plumbing they all go through. Each client is constructed once at
//! startup and injected into the handlers; nothing here holds request state.

pub mod feed;
pub mod github;
pub mod social;

use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::UpstreamError;

/// User-Agent for every outbound call. GitHub rejects agent-less requests
/// outright, and the other services appreciate knowing who is asking.
pub const OUTBOUND_USER_AGENT: &str = concat!("personal-api/", env!("CARGO_PKG_VERSION"));

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "upstream_requests_total",
            "Outbound requests issued to external services."
        );
        describe_counter!(
            "upstream_errors_total",
            "Upstream fetch/auth/parse failures."
        );
        describe_histogram!(
            "upstream_fetch_ms",
            "Upstream fetch+decode time in milliseconds."
        );
    });
}

/// Build the shared outbound HTTP client. The timeout bounds every call made
/// through it, so one stalled upstream cannot pile up pending handlers.
pub fn build_client(timeout: Duration) -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(OUTBOUND_USER_AGENT));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

pub(crate) fn note_failure(err: UpstreamError) -> UpstreamError {
    counter!("upstream_errors_total").increment(1);
    err
}

/// Send a prepared request and decode the JSON body, classifying failures
/// per the upstream error taxonomy. This is the one generic fetch both
/// GitHub endpoints reuse; the social client routes its calls through it too.
pub(crate) async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, UpstreamError> {
    ensure_metrics_described();
    let t0 = Instant::now();
    counter!("upstream_requests_total").increment(1);

    let resp = request
        .send()
        .await
        .map_err(|e| note_failure(UpstreamError::transport(service, e)))?;

    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(note_failure(UpstreamError::Auth {
            service,
            status: status.as_u16(),
        }));
    }
    let resp = resp
        .error_for_status()
        .map_err(|e| note_failure(UpstreamError::transport(service, e)))?;

    let value = resp
        .json::<T>()
        .await
        .map_err(|e| note_failure(UpstreamError::shape(service, e.to_string())))?;

    histogram!("upstream_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(value)
}
