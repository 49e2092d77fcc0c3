// src/api.rs
//! HTTP surface: four read-only JSON routes plus a health probe, all behind
//! a permissive CORS layer so the static frontend can call from anywhere.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use tower_http::cors::CorsLayer;

use crate::activity::PushSummary;
use crate::error::ApiError;
use crate::pens::PenEntry;
use crate::projects::ProjectCard;
use crate::tweets::TweetSummary;
use crate::upstream::feed::FeedFetcher;
use crate::upstream::github::GithubClient;
use crate::upstream::social::SocialClient;
use crate::{activity, pens, projects, tweets};

/// Everything the handlers need, built once at startup. The clients are the
/// only shared state and none of it mutates per request, so a plain `Arc`
/// each is enough.
#[derive(Clone)]
pub struct AppState {
    pub social: Arc<SocialClient>,
    pub feed: Arc<FeedFetcher>,
    pub github: Arc<GithubClient>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/tweets", get(recent_tweets))
        .route("/pens", get(latest_pens))
        .route("/activity", get(push_activity))
        .route("/projects", get(project_cards))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn recent_tweets(
    State(state): State<AppState>,
) -> Result<Json<Vec<TweetSummary>>, ApiError> {
    let timeline = state.social.user_timeline().await?;
    let cards = tweets::normalize(&timeline, state.social.screen_name(), Utc::now())?;
    Ok(Json(cards))
}

/// Drains the feed producer's channel, then checks how the producer actually
/// finished: a closed channel alone does not mean the document was complete.
async fn latest_pens(State(state): State<AppState>) -> Result<Json<Vec<PenEntry>>, ApiError> {
    let (mut rx, producer) = state.feed.stream_items().await?;
    let mut items = Vec::new();
    while let Some(item) = rx.recv().await {
        items.push(item);
    }
    producer
        .await
        .map_err(|e| ApiError::Internal(format!("feed producer task: {e}")))??;
    Ok(Json(pens::select_latest(items)))
}

async fn push_activity(
    State(state): State<AppState>,
) -> Result<Json<Vec<PushSummary>>, ApiError> {
    let events = state.github.public_events().await?;
    Ok(Json(activity::recent_pushes(&events)))
}

async fn project_cards(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectCard>>, ApiError> {
    let subs = state.github.subscriptions().await?;
    Ok(Json(projects::select(subs, state.github.user())))
}
