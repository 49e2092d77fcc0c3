// src/pens.rs
//! /pens route shape: date-stamp the syndicated feed entries, sort them
//! newest first, and keep a handful.

use once_cell::sync::Lazy;
use serde::Serialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::format_description::{self, FormatItem};
use time::{Date, OffsetDateTime};

use crate::upstream::feed::FeedItem;

pub const MAX_ENTRIES: usize = 4;

// "12 Jun 2016"
static DISPLAY_FORMAT: Lazy<Vec<FormatItem<'static>>> = Lazy::new(|| {
    format_description::parse("[day padding:none] [month repr:short] [year]")
        .expect("display date format")
});

// "2016-06-12", also the sort key.
static ISO_FORMAT: Lazy<Vec<FormatItem<'static>>> =
    Lazy::new(|| format_description::parse("[year]-[month]-[day]").expect("iso date format"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PenEntry {
    pub date: String,
    pub datetime: String,
    pub title: String,
    pub url: String,
}

/// Read an item's date stamp: RFC 3339 (`dc:date`), then RFC 2822
/// (`pubDate`), then a bare calendar date.
fn parse_item_date(raw: &str) -> Option<Date> {
    if let Ok(stamp) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(stamp.date());
    }
    if let Ok(stamp) = OffsetDateTime::parse(raw, &Rfc2822) {
        return Some(stamp.date());
    }
    Date::parse(raw, ISO_FORMAT.as_slice()).ok()
}

/// Stamp every dated item, order newest first, keep the top
/// [`MAX_ENTRIES`]. Items without a parseable date cannot be ordered and are
/// dropped. The ISO stamp doubles as the sort key; lexicographic descending
/// on it is chronological descending.
pub fn select_latest(items: Vec<FeedItem>) -> Vec<PenEntry> {
    let mut entries: Vec<PenEntry> = items
        .into_iter()
        .filter_map(|item| {
            let date = item.date.as_deref().and_then(parse_item_date)?;
            Some(PenEntry {
                date: date.format(DISPLAY_FORMAT.as_slice()).ok()?,
                datetime: date.format(ISO_FORMAT.as_slice()).ok()?,
                title: item.title,
                url: item.link,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    entries.truncate(MAX_ENTRIES);
    entries
}
