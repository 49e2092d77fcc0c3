//! Personal-site API — Binary Entrypoint
//! Boots the Axum HTTP server, wiring config, upstream clients, and routes.
//!
//! See `README.md` for quickstart and the environment variables it needs.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use personal_api::api::{create_router, AppState};
use personal_api::config::Config;
use personal_api::metrics::Metrics;
use personal_api::upstream::{self, feed::FeedFetcher, github::GithubClient, social::SocialClient};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env().context("loading configuration")?;
    let metrics = Metrics::init(config.upstream_timeout.as_secs());

    let client = upstream::build_client(config.upstream_timeout);

    // Bearer exchange happens here, once, when the env carries no token.
    let social = SocialClient::connect(client.clone(), &config.social)
        .await
        .context("social timeline auth")?;

    let state = AppState {
        social: Arc::new(social),
        feed: Arc::new(FeedFetcher::new(client.clone(), config.feed_url.clone())),
        github: Arc::new(GithubClient::new(client, config.github_user.clone())),
    };

    let router = create_router(state).merge(metrics.router());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router)
        .await
        .context("serving HTTP")?;
    Ok(())
}
