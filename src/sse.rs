//! Server-Sent Events (SSE) line framing.
//!
//! This module turns an arbitrarily chunked byte stream into the line tokens
//! the event assembler works on. A line ends at `\n`, `\r`, or `\r\n`; the
//! delimiter is never part of the line.
//!
//! ```text
//! event: update\r\n
//! data: {"x":1}\n
//! \r
//! ```

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};

use crate::client::ClientError;
use crate::options::DEFAULT_MAX_LINE_LEN;

/// Result of scanning a buffer for the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan<'a> {
    /// A complete line (delimiter excluded) and the number of bytes it used up.
    Line { line: &'a [u8], consumed: usize },
    /// No complete line yet, nothing consumed.
    NeedMore,
    /// End of stream with an empty buffer.
    Exhausted,
}

/// Find the next line in `data`.
///
/// A `\r` that is the last available byte is held back until more data
/// arrives, since a `\n` may follow and belongs to the same delimiter.
/// At end of stream any remaining bytes form the final line.
///
/// # Example
/// ```
/// use sse_client::sse::{scan_line, Scan};
///
/// assert_eq!(scan_line(b"a\r\nb", false), Scan::Line { line: b"a", consumed: 3 });
/// assert_eq!(scan_line(b"a\r", false), Scan::NeedMore);
/// assert_eq!(scan_line(b"abc", true), Scan::Line { line: b"abc", consumed: 3 });
/// ```
pub fn scan_line(data: &[u8], at_eof: bool) -> Scan<'_> {
    match data.iter().position(|&b| b == b'\r' || b == b'\n') {
        Some(i) if data[i] == b'\r' => match data.get(i + 1) {
            None if at_eof => Scan::Line {
                line: &data[..i],
                consumed: i + 1,
            },
            None => Scan::NeedMore,
            Some(b'\n') => Scan::Line {
                line: &data[..i],
                consumed: i + 2,
            },
            Some(_) => Scan::Line {
                line: &data[..i],
                consumed: i + 1,
            },
        },
        Some(i) => Scan::Line {
            line: &data[..i],
            consumed: i + 1,
        },
        None if !at_eof => Scan::NeedMore,
        None if data.is_empty() => Scan::Exhausted,
        None => Scan::Line {
            line: data,
            consumed: data.len(),
        },
    }
}

/// Incremental line splitter over pushed chunks.
///
/// Bytes already known to hold no delimiter are not scanned again, and a line
/// longer than the configured limit fails with [`ClientError::LineTooLong`].
#[derive(Debug)]
pub struct LineFramer {
    buffer: BytesMut,
    scanned: usize,
    max_line_len: usize,
    eof: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::with_max_line_len(DEFAULT_MAX_LINE_LEN)
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a framer that rejects lines longer than `max_line_len` bytes.
    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            max_line_len,
            eof: false,
        }
    }

    /// Append a chunk read from the source.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Mark the source as exhausted so buffered bytes can be released as a
    /// final line.
    pub fn finish(&mut self) {
        self.eof = true;
    }

    /// True once the source is exhausted and every buffered byte was framed.
    pub fn is_finished(&self) -> bool {
        self.eof && self.buffer.is_empty()
    }

    /// Take the next complete line, if the buffer holds one.
    pub fn next_line(&mut self) -> Result<Option<Bytes>, ClientError> {
        let start = self.scanned;
        let (len, consumed) = match scan_line(&self.buffer[start..], self.eof) {
            Scan::Line { line, consumed } => (start + line.len(), start + consumed),
            // Everything was scanned before the source ended.
            Scan::Exhausted if start > 0 => (start, start),
            Scan::Exhausted => return Ok(None),
            Scan::NeedMore => {
                // A trailing `\r` is held back and scanned again with the next chunk.
                self.scanned = self.buffer.len() - usize::from(self.buffer.ends_with(b"\r"));
                if self.scanned > self.max_line_len {
                    return Err(ClientError::LineTooLong {
                        limit: self.max_line_len,
                    });
                }
                return Ok(None);
            }
        };

        if len > self.max_line_len {
            return Err(ClientError::LineTooLong {
                limit: self.max_line_len,
            });
        }
        self.scanned = 0;
        let mut line = self.buffer.split_to(consumed);
        line.truncate(len);
        Ok(Some(line.freeze()))
    }
}

/// Adapt a byte stream into a stream of lines no longer than `max_line_len`.
///
/// The first read error or oversized line is yielded and ends the stream.
pub fn line_stream<S, E>(
    bytes: S,
    max_line_len: usize,
) -> impl Stream<Item = Result<Bytes, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Into<ClientError> + Send,
{
    stream::unfold(
        (
            Box::pin(bytes),
            LineFramer::with_max_line_len(max_line_len),
            false,
        ),
        |(mut bytes, mut framer, mut failed)| async move {
            if failed {
                return None;
            }
            loop {
                match framer.next_line() {
                    Ok(Some(line)) => return Some((Ok(line), (bytes, framer, failed))),
                    Ok(None) => {}
                    Err(e) => {
                        failed = true;
                        return Some((Err(e), (bytes, framer, failed)));
                    }
                }
                if framer.is_finished() {
                    return None;
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => framer.push(&chunk),
                    Some(Err(e)) => {
                        failed = true;
                        return Some((Err(e.into()), (bytes, framer, failed)));
                    }
                    None => framer.finish(),
                }
            }
        },
    )
}

/// Extension trait for `reqwest::Response` to read the body as SSE lines.
///
/// # Example
/// ```ignore
/// use sse_client::sse::SSEResponseExt;
///
/// let response = reqwest::get("https://example.com/events").await?;
/// let mut lines = std::pin::pin!(response.sse_lines(64 * 1024));
/// while let Some(line) = lines.next().await {
///     println!("{:?}", line?);
/// }
/// ```
pub trait SSEResponseExt {
    /// Convert the response body into a stream of lines.
    fn sse_lines(self, max_line_len: usize) -> impl Stream<Item = Result<Bytes, ClientError>> + Send;
}

impl SSEResponseExt for reqwest::Response {
    fn sse_lines(self, max_line_len: usize) -> impl Stream<Item = Result<Bytes, ClientError>> + Send {
        line_stream(self.bytes_stream(), max_line_len)
    }
}
