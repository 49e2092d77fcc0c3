// src/upstream/social.rs
//! Social timeline client.
//!
//! Authenticates with an app-only bearer token. When the environment does not
//! provide one, it is obtained once at startup through the OAuth2
//! client-credentials exchange; a failure there aborts boot rather than
//! surfacing on every request.

use serde::Deserialize;

use super::send_json;
use crate::config::SocialCredentials;
use crate::error::UpstreamError;

pub(crate) const SERVICE: &str = "timeline";

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// How many statuses the timeline call asks for. The route serves them all.
pub const TIMELINE_COUNT: usize = 3;

/// Raw timeline entry; only the fields the /tweets shape is built from.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineTweet {
    pub id_str: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug)]
pub struct SocialClient {
    client: reqwest::Client,
    base_url: String,
    bearer: String,
    screen_name: String,
}

impl SocialClient {
    pub async fn connect(
        client: reqwest::Client,
        creds: &SocialCredentials,
    ) -> Result<Self, UpstreamError> {
        Self::connect_with_base(client, creds, DEFAULT_API_BASE).await
    }

    /// Base-URL override for tests against a local mock server.
    pub async fn connect_with_base(
        client: reqwest::Client,
        creds: &SocialCredentials,
        base_url: &str,
    ) -> Result<Self, UpstreamError> {
        let bearer = match &creds.bearer_token {
            Some(token) => token.clone(),
            None => request_bearer_token(&client, base_url, creds).await?,
        };
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            bearer,
            screen_name: creds.screen_name.clone(),
        })
    }

    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }

    /// The handle's newest original posts: no retweets, no replies, no
    /// embedded user objects.
    pub async fn user_timeline(&self) -> Result<Vec<TimelineTweet>, UpstreamError> {
        let url = format!("{}/1.1/statuses/user_timeline.json", self.base_url);
        let count = TIMELINE_COUNT.to_string();
        send_json(
            SERVICE,
            self.client.get(&url).bearer_auth(&self.bearer).query(&[
                ("screen_name", self.screen_name.as_str()),
                ("count", count.as_str()),
                ("trim_user", "true"),
                ("include_rts", "false"),
                ("contributor_details", "false"),
                ("exclude_replies", "true"),
            ]),
        )
        .await
    }
}

/// OAuth2 client-credentials exchange: consumer key/secret in via basic auth,
/// bearer token out.
async fn request_bearer_token(
    client: &reqwest::Client,
    base_url: &str,
    creds: &SocialCredentials,
) -> Result<String, UpstreamError> {
    let url = format!("{base_url}/oauth2/token");
    let token: TokenResponse = send_json(
        SERVICE,
        client
            .post(&url)
            .basic_auth(&creds.consumer_key, Some(&creds.consumer_secret))
            .form(&[("grant_type", "client_credentials")]),
    )
    .await?;
    Ok(token.access_token)
}
