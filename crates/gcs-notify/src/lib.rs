//! gcs-notify
//!
//! Delivery of a finished digest pass.
//!
//! - [`LogSink`]: the digest (or placeholder) as one log event
//! - [`ChunkedPostSink`]: the digest packed into length-bounded posts, handed
//!   one by one to a [`Poster`]
//! - [`WebhookPoster`]: a [`Poster`] that POSTs JSON to a webhook URL
//!
//! Sinks run after the coordinator has already advanced the watermark, so a
//! delivery failure loses that digest; it is reported, never retried here.

pub mod webhook;

use std::fmt;

use gcs_digest::RunReport;
use tracing::{debug, info, warn};

pub use webhook::WebhookPoster;

/// Post length limit of the text-posting transport.
pub const DEFAULT_CHUNK_LIMIT: usize = 140;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The endpoint answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The endpoint could not be reached.
    Transport(String),
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Rejected { status, body } => {
                write!(f, "delivery rejected: HTTP {status}: {body}")
            }
            DeliveryError::Transport(msg) => write!(f, "delivery transport error: {msg}"),
        }
    }
}

impl std::error::Error for DeliveryError {}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

pub trait DeliverySink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver the digest of `report`. Returns the number of messages sent.
    fn deliver(&self, report: &RunReport) -> Result<usize, DeliveryError>;
}

impl<S: DeliverySink + ?Sized> DeliverySink for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn deliver(&self, report: &RunReport) -> Result<usize, DeliveryError> {
        (**self).deliver(report)
    }
}

/// Writes the digest text to the process log. An empty digest is logged as
/// the placeholder so every pass leaves a line behind.
#[derive(Debug, Clone)]
pub struct LogSink {
    placeholder: String,
}

impl LogSink {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }
}

impl DeliverySink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn deliver(&self, report: &RunReport) -> Result<usize, DeliveryError> {
        let text = report.render(&self.placeholder);
        info!(run_id = %report.run_id, items = report.items.len(), "digest:\n{text}");
        Ok(1)
    }
}

/// One outbound text message.
pub trait Poster: Send + Sync {
    fn post(&self, text: &str) -> Result<(), DeliveryError>;
}

impl<P: Poster + ?Sized> Poster for Box<P> {
    fn post(&self, text: &str) -> Result<(), DeliveryError> {
        (**self).post(text)
    }
}

/// Packs the digest into chunks of at most `max_chunk_len` characters and
/// posts them in order. An empty digest posts nothing. The first failed post
/// stops the rest.
#[derive(Debug, Clone)]
pub struct ChunkedPostSink<P> {
    poster: P,
    max_chunk_len: usize,
}

impl<P: Poster> ChunkedPostSink<P> {
    pub fn new(poster: P) -> Self {
        Self::with_limit(poster, DEFAULT_CHUNK_LIMIT)
    }

    pub fn with_limit(poster: P, max_chunk_len: usize) -> Self {
        Self {
            poster,
            max_chunk_len,
        }
    }

    pub fn poster(&self) -> &P {
        &self.poster
    }
}

impl<P: Poster> DeliverySink for ChunkedPostSink<P> {
    fn name(&self) -> &'static str {
        "post"
    }

    fn deliver(&self, report: &RunReport) -> Result<usize, DeliveryError> {
        let chunks = report.texts(Some(self.max_chunk_len));
        if chunks.is_empty() {
            debug!(run_id = %report.run_id, "empty digest; nothing to post");
            return Ok(0);
        }

        for (idx, chunk) in chunks.iter().enumerate() {
            let len = chunk.chars().count();
            if len > self.max_chunk_len {
                // A single item longer than the limit is never split.
                warn!(chunk = idx, len, limit = self.max_chunk_len, "posting oversized chunk");
            }
            if let Err(e) = self.poster.post(chunk) {
                warn!(run_id = %report.run_id, chunk = idx, total = chunks.len(), error = %e, "post failed");
                return Err(e);
            }
        }

        info!(run_id = %report.run_id, posts = chunks.len(), "digest posted");
        Ok(chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use gcs_digest::{DigestItem, Note, TierChange};
    use gcs_schemas::{parse_timestamp, Tier, DEFAULT_ZONE};
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingPoster {
        sent: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl Poster for RecordingPoster {
        fn post(&self, text: &str) -> Result<(), DeliveryError> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_on == Some(sent.len()) {
                return Err(DeliveryError::Rejected {
                    status: 429,
                    body: "slow down".to_string(),
                });
            }
            sent.push(text.to_string());
            Ok(())
        }
    }

    fn item(title: &str) -> DigestItem {
        DigestItem::new(
            title,
            vec![TierChange {
                tier: Tier::Hard,
                notes: vec![Note::ChainDelta(5)],
            }],
        )
    }

    fn report(items: Vec<DigestItem>) -> RunReport {
        let ts = parse_timestamp("2017-01-01 10:21:30", DEFAULT_ZONE).unwrap();
        RunReport {
            run_id: Uuid::new_v4(),
            previous_watermark: Some("2017-01-01 10:00:00".to_string()),
            watermark_used: ts,
            new_watermark: ts,
            first_run: false,
            scanned: items.len(),
            cut: items.len(),
            cache_writes: items.len(),
            items,
        }
    }

    #[test]
    fn empty_digest_posts_nothing() {
        let sink = ChunkedPostSink::new(RecordingPoster::default());
        assert_eq!(sink.deliver(&report(vec![])).unwrap(), 0);
        assert!(sink.poster().sent.lock().unwrap().is_empty());
    }

    #[test]
    fn chunks_are_posted_in_order() {
        let sink = ChunkedPostSink::with_limit(RecordingPoster::default(), 25);
        let n = sink
            .deliver(&report(vec![item("first"), item("second")]))
            .unwrap();
        assert_eq!(n, 2);
        let sent = sink.poster().sent.lock().unwrap();
        assert_eq!(sent[0], "first\n  [Hard] ⛓ +5");
        assert_eq!(sent[1], "second\n  [Hard] ⛓ +5");
    }

    #[test]
    fn first_failed_post_stops_delivery() {
        let poster = RecordingPoster {
            fail_on: Some(1),
            ..RecordingPoster::default()
        };
        let sink = ChunkedPostSink::with_limit(poster, 25);
        let err = sink
            .deliver(&report(vec![item("a"), item("b"), item("c")]))
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected { status: 429, .. }));
        assert_eq!(sink.poster().sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn log_sink_always_delivers_one_message() {
        let sink = LogSink::new("No change...\n");
        assert_eq!(sink.deliver(&report(vec![])).unwrap(), 1);
        assert_eq!(sink.deliver(&report(vec![item("x")])).unwrap(), 1);
    }
}
