// src/config.rs
//! Process configuration: one immutable record, read from the environment at
//! startup and injected into the upstream clients. Nothing re-reads the
//! environment after boot.

use std::env;
use std::time::Duration;

use anyhow::{bail, Result};

pub const ENV_CONSUMER_KEY: &str = "TWITTER_CONSUMER_KEY";
pub const ENV_CONSUMER_SECRET: &str = "TWITTER_CONSUMER_SECRET";
pub const ENV_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
pub const ENV_SCREEN_NAME: &str = "TWITTER_SCREEN_NAME";
pub const ENV_GITHUB_USER: &str = "GITHUB_USER_NAME";
pub const ENV_FEED_URL: &str = "CODEPEN_COLLECTION_FEED_URL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "UPSTREAM_TIMEOUT_SECS";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Credentials for the social-timeline API (OAuth2 app-only flow).
/// `bearer_token` may be absent; the client then obtains one at startup via
/// the client-credentials exchange.
#[derive(Debug, Clone)]
pub struct SocialCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub bearer_token: Option<String>,
    pub screen_name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub social: SocialCredentials,
    pub github_user: String,
    pub feed_url: String,
    pub port: u16,
    /// Bound on every outbound upstream call, so a stalled external API
    /// cannot pile up pending handlers.
    pub upstream_timeout: Duration,
}

impl Config {
    /// Read the full configuration from the process environment.
    ///
    /// Fails with one error naming every missing required variable, so a
    /// broken deployment is diagnosed in a single round rather than variable
    /// by variable.
    pub fn from_env() -> Result<Self> {
        let mut missing: Vec<&str> = Vec::new();
        let mut required = |name: &'static str| -> String {
            match non_empty(name) {
                Some(v) => v,
                None => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let consumer_key = required(ENV_CONSUMER_KEY);
        let consumer_secret = required(ENV_CONSUMER_SECRET);
        let screen_name = required(ENV_SCREEN_NAME);
        let github_user = required(ENV_GITHUB_USER);
        let feed_url = required(ENV_FEED_URL);

        if !missing.is_empty() {
            bail!(
                "missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let port = match non_empty(ENV_PORT) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(p) => p,
                Err(_) => bail!("{ENV_PORT} must be a port number, got {raw:?}"),
            },
            None => DEFAULT_PORT,
        };

        let timeout_secs = match non_empty(ENV_UPSTREAM_TIMEOUT_SECS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(s) if s > 0 => s,
                _ => bail!("{ENV_UPSTREAM_TIMEOUT_SECS} must be a positive integer, got {raw:?}"),
            },
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        Ok(Self {
            social: SocialCredentials {
                consumer_key,
                consumer_secret,
                bearer_token: non_empty(ENV_BEARER_TOKEN),
                screen_name,
            },
            github_user,
            feed_url,
            port,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Env lookup that treats empty/whitespace values the same as unset ones.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
