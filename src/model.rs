//! Event type and the field accumulator that builds it from framed lines.

use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::client::ClientError;

/// Event type reported by [`Event::kind`] when no `event` field was sent.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// A single dispatched SSE event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Value of the last `id` field of this event, empty if none was sent.
    pub id: String,

    /// Value of the last `event` field of this event, empty if none was sent.
    pub event_type: String,

    /// Every `data` value in order, each followed by `\n`.
    pub data: Bytes,
}

impl Event {
    /// The event type, falling back to `"message"` when none was sent.
    ///
    /// # Example
    /// ```
    /// use sse_client::model::Event;
    ///
    /// assert_eq!(Event::default().kind(), "message");
    /// ```
    pub fn kind(&self) -> &str {
        if self.event_type.is_empty() {
            DEFAULT_EVENT_TYPE
        } else {
            &self.event_type
        }
    }

    /// The data payload as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.data)
    }

    /// Deserialize the data payload as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.data)?)
    }
}

/// Accumulates field lines into the in-progress [`Event`].
#[derive(Debug, Default)]
pub struct EventBuilder {
    id: String,
    event_type: String,
    data: BytesMut,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one framed line into the in-progress event.
    ///
    /// A blank line dispatches: the accumulated event is returned and the
    /// builder starts over. Every other line returns `None`.
    ///
    /// # Example
    /// ```
    /// use sse_client::model::EventBuilder;
    ///
    /// let mut builder = EventBuilder::new();
    /// assert!(builder.feed(b"data: foo").is_none());
    /// assert!(builder.feed(b"data:bar").is_none());
    /// let event = builder.feed(b"").unwrap();
    /// assert_eq!(event.data, "foo\nbar\n");
    /// ```
    pub fn feed(&mut self, line: &[u8]) -> Option<Event> {
        if line.is_empty() {
            return Some(self.flush());
        }

        let (field, value) = match line.iter().position(|&b| b == b':') {
            // comment
            Some(0) => return None,
            Some(colon) => {
                let value = &line[colon + 1..];
                (&line[..colon], value.strip_prefix(b" ").unwrap_or(value))
            }
            None => (line, &[][..]),
        };

        match field {
            b"event" => self.event_type = String::from_utf8_lossy(value).into_owned(),
            b"data" => {
                self.data.extend_from_slice(value);
                self.data.put_u8(b'\n');
            }
            b"id" => self.id = String::from_utf8_lossy(value).into_owned(),
            // Reconnection is not implemented, so the interval has no use.
            b"retry" => trace!(value = %String::from_utf8_lossy(value), "ignoring retry field"),
            _ => trace!(field = %String::from_utf8_lossy(field), "ignoring unknown field"),
        }
        None
    }

    /// Take the accumulated event and reset every field.
    ///
    /// The data buffer keeps its allocation for the next event.
    pub fn flush(&mut self) -> Event {
        Event {
            id: std::mem::take(&mut self.id),
            event_type: std::mem::take(&mut self.event_type),
            data: self.data.split().freeze(),
        }
    }
}
