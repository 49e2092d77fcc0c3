// src/tweets.rs
//! /tweets route shape: map raw timeline entries onto the compact cards the
//! site renders, stamping each with a human-readable age.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::UpstreamError;
use crate::upstream::social::{TimelineTweet, SERVICE};

/// Public web base for status links; the API payload only carries the id.
const STATUS_URL_BASE: &str = "https://twitter.com";

/// Timestamp format of the v1.1 API, e.g. `Wed Aug 29 17:12:58 +0000 2012`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TweetSummary {
    pub url: String,
    pub time: String,
    pub text: String,
}

pub fn status_url(screen_name: &str, id: &str) -> String {
    format!("{STATUS_URL_BASE}/{screen_name}/status/{id}")
}

pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, CREATED_AT_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build the route payload. Order is preserved; text passes through exactly
/// as delivered. A timeline entry whose timestamp does not parse is treated
/// as a shape defect of the upstream, not silently skipped.
pub fn normalize(
    tweets: &[TimelineTweet],
    screen_name: &str,
    now: DateTime<Utc>,
) -> Result<Vec<TweetSummary>, UpstreamError> {
    tweets
        .iter()
        .map(|tweet| {
            let created = parse_created_at(&tweet.created_at).ok_or_else(|| {
                UpstreamError::shape(
                    SERVICE,
                    format!("unparseable created_at {:?}", tweet.created_at),
                )
            })?;
            Ok(TweetSummary {
                url: status_url(screen_name, &tweet.id_str),
                time: relative_duration(created, now),
                text: tweet.text.clone(),
            })
        })
        .collect()
}

// Average Gregorian month and year, in seconds.
const SECS_PER_MONTH: i64 = 2_629_746;
const SECS_PER_YEAR: i64 = 31_556_952;

/// Age of `then` relative to `now` as a bare duration phrase: "a few
/// seconds", "2 hours", "a day". No "ago" suffix; the frontend adds its own
/// framing. Thresholds follow the classic humanization table (45 s, 45 min,
/// 22 h, 26 d, 11 mo) with midpoint rounding at each unit.
pub fn relative_duration(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = div_round(seconds, 60);
    let hours = div_round(seconds, 3_600);
    let days = div_round(seconds, 86_400);
    let months = div_round(seconds, SECS_PER_MONTH);
    let years = div_round(seconds, SECS_PER_YEAR);

    if seconds <= 44 {
        "a few seconds".to_string()
    } else if minutes <= 1 {
        "a minute".to_string()
    } else if minutes <= 44 {
        format!("{minutes} minutes")
    } else if hours <= 1 {
        "an hour".to_string()
    } else if hours <= 21 {
        format!("{hours} hours")
    } else if days <= 1 {
        "a day".to_string()
    } else if days <= 25 {
        format!("{days} days")
    } else if months <= 1 {
        "a month".to_string()
    } else if months <= 10 {
        format!("{months} months")
    } else if years <= 1 {
        "a year".to_string()
    } else {
        format!("{years} years")
    }
}

fn div_round(n: i64, d: i64) -> i64 {
    (n + d / 2) / d
}
