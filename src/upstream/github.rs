// src/upstream/github.rs
//! GitHub fetchers: the user's public event stream and their repository
//! subscriptions. Both are plain unauthenticated JSON GETs.

use serde::Deserialize;

use super::send_json;
use crate::error::UpstreamError;

pub(crate) const SERVICE: &str = "github";

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// One entry of `/users/{user}/events/public`. Only the fields the activity
/// route reads; everything else in the payload is ignored at decode time.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub repo: EventRepo,
    #[serde(default)]
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRepo {
    pub name: String,
    /// API URL of the repo, not the html_url. Kept as delivered.
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub commits: Vec<EventCommit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventCommit {
    pub sha: String,
    pub message: String,
}

/// One entry of `/users/{user}/subscriptions`.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub fork: bool,
    pub stargazers_count: u32,
    pub owner: RepoOwner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
    user: String,
}

impl GithubClient {
    pub fn new(client: reqwest::Client, user: String) -> Self {
        Self::with_base_url(client, user, DEFAULT_API_BASE)
    }

    /// Base-URL override for tests against a local mock server.
    pub fn with_base_url(client: reqwest::Client, user: String, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            user,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub async fn public_events(&self) -> Result<Vec<PublicEvent>, UpstreamError> {
        let url = format!("{}/users/{}/events/public", self.base_url, self.user);
        send_json(SERVICE, self.client.get(&url)).await
    }

    pub async fn subscriptions(&self) -> Result<Vec<Subscription>, UpstreamError> {
        let url = format!("{}/users/{}/subscriptions", self.base_url, self.user);
        send_json(SERVICE, self.client.get(&url)).await
    }
}
