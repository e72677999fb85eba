//! Stream handle and error types.

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::http::{build_http_client, event_stream_request};
use crate::model::Event;
use crate::options::StreamOptions;
use crate::sse::{line_stream, SSEResponseExt};
use crate::stream::{decode, Outcome};

/// Errors that can occur while opening or reading a stream.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("Stream cancelled")]
    StreamCancelled,
}

/// Cloneable handle that closes a [`Client`] from another task.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    signal: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    /// Request the stream to stop. Calling it more than once is harmless and
    /// it never waits on the consumer.
    pub fn close(&self) {
        self.signal.send_replace(true);
    }

    /// Whether close was requested.
    pub fn is_closed(&self) -> bool {
        *self.signal.borrow()
    }
}

/// A live SSE stream.
///
/// Events are decoded on a background task and delivered in stream order.
/// Once [`recv`](Client::recv) returns `None`, [`err`](Client::err) tells a
/// clean end of stream apart from a read failure or a cancellation.
///
/// # Example
/// ```no_run
/// use sse_client::Client;
///
/// # async fn run() -> Result<(), sse_client::ClientError> {
/// let mut client = Client::open("http://localhost:8080/events").await?;
/// while let Some(event) = client.recv().await {
///     println!("{}: {:?}", event.kind(), event.data);
/// }
/// if let Some(err) = client.err() {
///     eprintln!("stream failed: {}", err);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
    events: mpsc::Receiver<Event>,
    outcome: Outcome,
    closer: CloseHandle,
}

impl Client {
    /// Open a stream with default options.
    pub async fn open(url: &str) -> Result<Self, ClientError> {
        Self::open_with_options(url, &StreamOptions::default()).await
    }

    /// Open a stream.
    ///
    /// Returns once the response headers arrived; the body is decoded in the
    /// background. Fails if the URL is invalid, the request cannot be sent,
    /// or the server answers with a non-success status.
    pub async fn open_with_options(url: &str, options: &StreamOptions) -> Result<Self, ClientError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", url, e)))?;
        let http_client = build_http_client(options)?;

        debug!(%url, "opening event stream");
        let response = event_stream_request(&http_client, url, options)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            warn!(%status, "event stream request rejected");
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        Ok(Self::spawn(
            response.sse_lines(options.max_line_len),
            options.capacity,
        ))
    }

    /// Decode events from any byte stream, such as a body obtained through a
    /// transport of the caller's choice.
    ///
    /// Must be called within a Tokio runtime.
    pub fn from_byte_stream<S, E>(bytes: S, capacity: usize) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<ClientError> + Send + 'static,
    {
        Self::from_byte_stream_with_options(bytes, &StreamOptions::new().with_capacity(capacity))
    }

    /// Like [`from_byte_stream`](Client::from_byte_stream), taking capacity
    /// and line limit from `options`. Transport settings are ignored.
    pub fn from_byte_stream_with_options<S, E>(bytes: S, options: &StreamOptions) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<ClientError> + Send + 'static,
    {
        Self::spawn(line_stream(bytes, options.max_line_len), options.capacity)
    }

    fn spawn<S>(lines: S, capacity: usize) -> Self
    where
        S: Stream<Item = Result<Bytes, ClientError>> + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(capacity.max(1));
        let (close_tx, close_rx) = watch::channel(false);
        let outcome = Outcome::default();

        tokio::spawn(decode(lines, event_tx, close_rx, Arc::clone(&outcome)));

        Self {
            events: event_rx,
            outcome,
            closer: CloseHandle {
                signal: Arc::new(close_tx),
            },
        }
    }

    /// Receive the next event, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Why the stream ended.
    ///
    /// `None` while the stream is live and after a clean end of stream.
    /// Only meaningful after [`recv`](Client::recv) returned `None`.
    pub fn err(&self) -> Option<&ClientError> {
        self.outcome.get().and_then(Option::as_ref)
    }

    /// Whether the decode task has finished.
    pub fn is_finished(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Stop the stream and close the connection.
    ///
    /// Events already queued can still be received; nothing is queued after
    /// the close takes effect.
    pub fn close(&self) {
        self.closer.close();
    }

    /// A handle for closing the stream from elsewhere.
    pub fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }
}

impl Stream for Client {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.get_mut().events.poll_recv(cx)
    }
}
