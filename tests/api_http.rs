// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets for the
// service itself; the external APIs are stood in for by a local mock server.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /tweets   (status links, pass-through text, bearer + query contract)
// - GET /pens     (newest first, capped, both date stamps)
// - GET /activity (push filtering, first-commit rule, skip-empty rule)
// - GET /projects (ownership/fork/description filter, star ordering)
// - upstream failures mapping to 502 with an {"error": ...} body
// - CORS headers on cross-origin requests
// - startup bearer exchange when the env provides no token

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    response::Response,
};
use http::{header, Request, StatusCode};
use mockito::{Matcher, ServerGuard};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use personal_api::api::{create_router, AppState};
use personal_api::config::SocialCredentials;
use personal_api::upstream::{self, feed::FeedFetcher, github::GithubClient, social::SocialClient};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

const TIMELINE_JSON: &str = include_str!("fixtures/timeline.json");
const EVENTS_JSON: &str = include_str!("fixtures/events.json");
const SUBSCRIPTIONS_JSON: &str = include_str!("fixtures/subscriptions.json");
const PENS_XML: &str = include_str!("fixtures/pens.xml");

fn outbound_client() -> reqwest::Client {
    upstream::build_client(Duration::from_secs(5))
}

fn test_credentials() -> SocialCredentials {
    SocialCredentials {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        bearer_token: Some("test-token".into()),
        screen_name: "someone".into(),
    }
}

/// Build the same AppState the binary builds, pointed at the mock server.
async fn state_for(server: &ServerGuard) -> AppState {
    let base = server.url();
    let client = outbound_client();
    let social = SocialClient::connect_with_base(client.clone(), &test_credentials(), &base)
        .await
        .expect("social client with preset bearer needs no exchange");
    AppState {
        social: Arc::new(social),
        feed: Arc::new(FeedFetcher::new(
            client.clone(),
            format!("{base}/feed.xml"),
        )),
        github: Arc::new(GithubClient::with_base_url(client, "someone".into(), &base)),
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET request")
}

async fn json_body(resp: Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    serde_json::from_slice(&bytes).expect("parse json body")
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let server = mockito::Server::new_async().await;
    let app = create_router(state_for(&server).await);

    let resp = app.oneshot(get("/health")).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).expect("utf8").trim(), "ok");
}

#[tokio::test]
async fn tweets_builds_status_links_and_passes_text_through() {
    let mut server = mockito::Server::new_async().await;
    let timeline = server
        .mock("GET", "/1.1/statuses/user_timeline.json")
        .match_header("authorization", "Bearer test-token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("screen_name".into(), "someone".into()),
            Matcher::UrlEncoded("count".into(), "3".into()),
            Matcher::UrlEncoded("trim_user".into(), "true".into()),
            Matcher::UrlEncoded("include_rts".into(), "false".into()),
            Matcher::UrlEncoded("contributor_details".into(), "false".into()),
            Matcher::UrlEncoded("exclude_replies".into(), "true".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TIMELINE_JSON)
        .create_async()
        .await;

    let app = create_router(state_for(&server).await);
    let resp = app.oneshot(get("/tweets")).await.expect("oneshot /tweets");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    let cards = v.as_array().expect("array body");
    assert_eq!(cards.len(), 2);
    assert_eq!(
        cards[0]["url"],
        "https://twitter.com/someone/status/240859602684612608"
    );
    assert_eq!(
        cards[0]["text"],
        "Introducing the Twitter Certified Products Program: https://t.co/MjJ8xAnT"
    );
    // Entities in the raw text are not decoded on the way through.
    assert_eq!(
        cards[1]["text"],
        "Design &amp; performance notes from last week's rebuild"
    );
    // The fixtures are from 2012, so whatever today is, the age is in years.
    let age = cards[0]["time"].as_str().expect("time is a string");
    assert!(age.ends_with("years"), "expected an age in years, got {age}");

    timeline.assert_async().await;
}

#[tokio::test]
async fn pens_come_back_newest_first_capped_and_double_stamped() {
    let mut server = mockito::Server::new_async().await;
    let feed = server
        .mock("GET", "/feed.xml")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(PENS_XML)
        .create_async()
        .await;

    let app = create_router(state_for(&server).await);
    let resp = app.oneshot(get("/pens")).await.expect("oneshot /pens");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    let entries = v.as_array().expect("array body");
    assert_eq!(entries.len(), 4, "capped at four and undated items dropped");

    let titles: Vec<&str> = entries
        .iter()
        .map(|e| e["title"].as_str().expect("title"))
        .collect();
    assert_eq!(
        titles,
        [
            "Canvas Confetti",
            "SVG Loader - tiny",
            "Springy Nav",
            "Old pubDate Pen"
        ]
    );

    let datetimes: Vec<&str> = entries
        .iter()
        .map(|e| e["datetime"].as_str().expect("datetime"))
        .collect();
    assert_eq!(
        datetimes,
        ["2016-09-03", "2016-08-30", "2016-06-12", "2016-05-03"]
    );
    assert_eq!(entries[0]["date"], "3 Sep 2016");
    assert_eq!(entries[3]["date"], "3 May 2016");
    assert_eq!(entries[0]["url"], "https://codepen.io/someone/pen/bbbb");

    feed.assert_async().await;
}

#[tokio::test]
async fn activity_keeps_three_pushes_first_commit_each() {
    let mut server = mockito::Server::new_async().await;
    let events = server
        .mock("GET", "/users/someone/events/public")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(EVENTS_JSON)
        .create_async()
        .await;

    let app = create_router(state_for(&server).await);
    let resp = app
        .oneshot(get("/activity"))
        .await
        .expect("oneshot /activity");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    let pushes = v.as_array().expect("array body");
    assert_eq!(pushes.len(), 3);

    // The commitless push and the non-push events are skipped entirely.
    assert_eq!(pushes[0]["repo"], "someone/site");
    assert_eq!(pushes[0]["hash"], "0a1b2c3");
    assert_eq!(pushes[0]["message"], "deploy: refresh homepage");
    assert_eq!(
        pushes[0]["url"],
        "https://api.github.com/repos/someone/site"
    );
    assert_eq!(pushes[1]["repo"], "someone/lib");
    assert_eq!(pushes[2]["repo"], "someone/dotfiles");

    events.assert_async().await;
}

#[tokio::test]
async fn projects_filter_and_star_ordering() {
    let mut server = mockito::Server::new_async().await;
    let subs = server
        .mock("GET", "/users/someone/subscriptions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SUBSCRIPTIONS_JSON)
        .create_async()
        .await;

    let app = create_router(state_for(&server).await);
    let resp = app
        .oneshot(get("/projects"))
        .await
        .expect("oneshot /projects");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    let cards = v.as_array().expect("array body");

    let stars: Vec<u64> = cards
        .iter()
        .map(|c| c["stars"].as_u64().expect("stars"))
        .collect();
    assert_eq!(stars, [50, 10, 5, 1], "bottom four, presented highest first");

    let titles: Vec<&str> = cards
        .iter()
        .map(|c| c["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, ["site", "shader-toys", "tiny-utils", "scratchpad"]);
    assert_eq!(cards[0]["text"], "Source of my personal site");
    assert_eq!(cards[0]["url"], "https://github.com/someone/site");

    subs.assert_async().await;
}

#[tokio::test]
async fn upstream_500_maps_to_502_with_error_body() {
    let mut server = mockito::Server::new_async().await;
    let _events = server
        .mock("GET", "/users/someone/events/public")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let app = create_router(state_for(&server).await);
    let resp = app
        .oneshot(get("/activity"))
        .await
        .expect("oneshot /activity");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let v = json_body(resp).await;
    let msg = v["error"].as_str().expect("error string");
    assert!(msg.contains("request failed"), "got: {msg}");
}

#[tokio::test]
async fn rejected_credentials_map_to_502() {
    let mut server = mockito::Server::new_async().await;
    let _timeline = server
        .mock("GET", "/1.1/statuses/user_timeline.json")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#)
        .create_async()
        .await;

    let app = create_router(state_for(&server).await);
    let resp = app.oneshot(get("/tweets")).await.expect("oneshot /tweets");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let v = json_body(resp).await;
    let msg = v["error"].as_str().expect("error string");
    assert!(msg.contains("credentials rejected"), "got: {msg}");
}

#[tokio::test]
async fn broken_feed_maps_to_502_not_a_short_list() {
    let mut server = mockito::Server::new_async().await;
    let _feed = server
        .mock("GET", "/feed.xml")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body("<rss><channel><item><title>half</wrong></channel></rss>")
        .create_async()
        .await;

    let app = create_router(state_for(&server).await);
    let resp = app.oneshot(get("/pens")).await.expect("oneshot /pens");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let v = json_body(resp).await;
    let msg = v["error"].as_str().expect("error string");
    assert!(msg.contains("invalid XML"), "got: {msg}");
}

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let mut server = mockito::Server::new_async().await;
    let _subs = server
        .mock("GET", "/users/someone/subscriptions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let app = create_router(state_for(&server).await);
    let req = Request::builder()
        .method("GET")
        .uri("/projects")
        .header(header::ORIGIN, "https://example.test")
        .body(Body::empty())
        .expect("build GET request");

    let resp = app.oneshot(req).await.expect("oneshot /projects");
    assert_eq!(resp.status(), StatusCode::OK);
    let allow = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .expect("ACAO header present");
    assert_eq!(allow, "*");
}

#[tokio::test]
async fn missing_bearer_token_is_exchanged_at_startup() {
    let mut server = mockito::Server::new_async().await;
    let token = server
        .mock("POST", "/oauth2/token")
        // ck:cs, base64
        .match_header("authorization", "Basic Y2s6Y3M=")
        .match_body(Matcher::UrlEncoded(
            "grant_type".into(),
            "client_credentials".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token_type":"bearer","access_token":"exchanged-token"}"#)
        .create_async()
        .await;
    let timeline = server
        .mock("GET", "/1.1/statuses/user_timeline.json")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer exchanged-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TIMELINE_JSON)
        .create_async()
        .await;

    let creds = SocialCredentials {
        bearer_token: None,
        ..test_credentials()
    };
    let client = outbound_client();
    let social = SocialClient::connect_with_base(client, &creds, &server.url())
        .await
        .expect("exchange should mint a bearer");
    token.assert_async().await;

    let entries = social.user_timeline().await.expect("timeline fetch");
    assert_eq!(entries.len(), 2);
    timeline.assert_async().await;
}

#[tokio::test]
async fn failed_bearer_exchange_is_a_startup_error() {
    let mut server = mockito::Server::new_async().await;
    let _token = server
        .mock("POST", "/oauth2/token")
        .with_status(403)
        .with_body(r#"{"errors":[{"code":99,"message":"Unable to verify your credentials"}]}"#)
        .create_async()
        .await;

    let creds = SocialCredentials {
        bearer_token: None,
        ..test_credentials()
    };
    let err = SocialClient::connect_with_base(outbound_client(), &creds, &server.url())
        .await
        .expect_err("bad consumer credentials must fail startup");
    assert_eq!(err.category(), "auth");
}
