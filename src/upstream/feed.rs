// src/upstream/feed.rs
//! Syndicated-feed fetcher.
//!
//! The feed body is parsed incrementally: a producer task reads the response
//! stream through an XML pull parser and sends each completed `<item>` down a
//! channel while the rest of the body is still downloading. The channel
//! closing is the completion signal; the producer's join handle carries the
//! parse verdict, so a body that dies halfway cannot be mistaken for a short
//! feed.

use std::io;
use std::time::Instant;

use futures::TryStreamExt;
use metrics::{counter, histogram};
use quick_xml::events::Event;
use quick_xml::Reader;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::io::StreamReader;

use super::{ensure_metrics_described, note_failure};
use crate::error::UpstreamError;

pub(crate) const SERVICE: &str = "feed";

/// Bound on in-flight parsed items; the producer waits when the consumer
/// lags, so a huge feed never buffers whole in memory.
const ITEM_CHANNEL_CAPACITY: usize = 16;

/// One `<item>` as pulled off the wire. Dates stay raw strings here; the
/// route layer decides how to interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// `dc:date` when present, otherwise `pubDate`, otherwise nothing.
    pub date: Option<String>,
}

pub struct FeedFetcher {
    client: reqwest::Client,
    url: String,
}

impl FeedFetcher {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    /// Start the download and hand back the receiving end of the item
    /// channel plus the producer's handle. Items arrive in document order.
    pub async fn stream_items(
        &self,
    ) -> Result<
        (
            mpsc::Receiver<FeedItem>,
            JoinHandle<Result<(), UpstreamError>>,
        ),
        UpstreamError,
    > {
        ensure_metrics_described();
        counter!("upstream_requests_total").increment(1);

        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| note_failure(UpstreamError::transport(SERVICE, e)))?
            .error_for_status()
            .map_err(|e| note_failure(UpstreamError::transport(SERVICE, e)))?;

        let (tx, rx) = mpsc::channel(ITEM_CHANNEL_CAPACITY);
        let producer = tokio::spawn(async move {
            let t0 = Instant::now();
            // Box::pin because the reader below needs an Unpin stream.
            let body = StreamReader::new(Box::pin(resp.bytes_stream().map_err(io::Error::other)));
            let outcome = read_items(body, tx).await;
            match &outcome {
                Ok(()) => {
                    histogram!("upstream_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                }
                Err(_) => {
                    counter!("upstream_errors_total").increment(1);
                }
            }
            outcome
        });
        Ok((rx, producer))
    }
}

#[derive(Clone, Copy)]
enum Part {
    Title,
    Link,
    DcDate,
    PubDate,
}

#[derive(Default)]
struct PendingItem {
    title: String,
    link: String,
    dc_date: Option<String>,
    pub_date: Option<String>,
}

impl PendingItem {
    fn push_text(&mut self, part: Part, text: &str) {
        match part {
            Part::Title => self.title.push_str(text),
            Part::Link => self.link.push_str(text),
            Part::DcDate => self.dc_date.get_or_insert_with(String::new).push_str(text),
            Part::PubDate => self.pub_date.get_or_insert_with(String::new).push_str(text),
        }
    }

    fn finish(self) -> FeedItem {
        FeedItem {
            title: self.title.trim().to_string(),
            link: self.link.trim().to_string(),
            date: self
                .dc_date
                .or(self.pub_date)
                .map(|d| d.trim().to_string()),
        }
    }
}

/// HTML entities that real-world feeds leak into otherwise-valid XML; the
/// standard five are handled by the parser itself.
fn resolve_html_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "nbsp" => Some(" "),
        "ndash" | "mdash" => Some("-"),
        "ldquo" | "rdquo" => Some("\""),
        "lsquo" | "rsquo" => Some("'"),
        _ => None,
    }
}

/// Pull `<item>` elements off an XML byte stream and send each through `tx`
/// as soon as its closing tag is seen. Returns when the document (or the
/// receiver) is done; a syntactically broken document is an error even if
/// some items were already delivered.
pub async fn read_items<R>(reader: R, tx: mpsc::Sender<FeedItem>) -> Result<(), UpstreamError>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut pending: Option<PendingItem> = None;
    let mut part: Option<Part> = None;

    loop {
        buf.clear();
        match xml.read_event_into_async(&mut buf).await {
            Ok(Event::Start(start)) => match start.name().as_ref() {
                b"item" => pending = Some(PendingItem::default()),
                b"title" if pending.is_some() => part = Some(Part::Title),
                b"link" if pending.is_some() => part = Some(Part::Link),
                b"dc:date" if pending.is_some() => part = Some(Part::DcDate),
                b"pubDate" if pending.is_some() => part = Some(Part::PubDate),
                _ => {}
            },
            Ok(Event::Text(text)) => {
                if let (Some(item), Some(part)) = (pending.as_mut(), part) {
                    let decoded = text
                        .unescape_with(resolve_html_entity)
                        .map_err(|e| UpstreamError::xml(SERVICE, e.to_string()))?;
                    item.push_text(part, &decoded);
                }
            }
            Ok(Event::CData(cdata)) => {
                if let (Some(item), Some(part)) = (pending.as_mut(), part) {
                    item.push_text(part, &String::from_utf8_lossy(&cdata));
                }
            }
            Ok(Event::End(end)) => {
                if end.name().as_ref() == b"item" {
                    if let Some(done) = pending.take() {
                        if tx.send(done.finish()).await.is_err() {
                            // Receiver hung up; nothing left to produce for.
                            return Ok(());
                        }
                    }
                }
                part = None;
            }
            Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            // A body that dies mid-download surfaces here as an I/O error;
            // only what the parser itself rejects counts as bad XML.
            Err(e @ quick_xml::Error::Io(_)) => return Err(UpstreamError::transport(SERVICE, e)),
            Err(e) => return Err(UpstreamError::xml(SERVICE, e.to_string())),
        }
    }
}
