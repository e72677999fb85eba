//! Options for opening an event stream.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default capacity of the event channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default limit on the length of a single line, 64 KiB.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Stream and transport configuration.
///
/// # Example
/// ```rust
/// use sse_client::options::StreamOptions;
/// use std::time::Duration;
///
/// let options = StreamOptions::new()
///     .with_capacity(64)
///     .with_connect_timeout(Duration::from_secs(5))
///     .with_header("Authorization".to_string(), "Bearer token".to_string());
/// assert_eq!(options.capacity, 64);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamOptions {
    /// Number of events buffered before the decoder waits for the consumer
    pub capacity: usize,

    /// Longest accepted line in bytes, delimiter excluded. A longer line
    /// ends the stream with `ClientError::LineTooLong`.
    pub max_line_len: usize,

    /// Timeout for establishing the connection. The body itself has no
    /// deadline since the stream is long-lived.
    pub connect_timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in the request
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            connect_timeout: None,
            proxy: None,
            extra_headers: None,
        }
    }
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event channel capacity. Zero is raised to one.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the longest accepted line.
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StreamOptions::default();
        assert_eq!(options.capacity, DEFAULT_CAPACITY);
        assert_eq!(options.max_line_len, 64 * 1024);
        assert!(options.connect_timeout.is_none());
        assert!(options.extra_headers.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let options: StreamOptions =
            serde_json::from_str(r#"{"capacity": 8, "extra_headers": {"X-Token": "abc"}}"#)
                .unwrap();
        assert_eq!(options.capacity, 8);
        assert_eq!(options.max_line_len, DEFAULT_MAX_LINE_LEN);
        assert!(options.proxy.is_none());
        assert_eq!(
            options.extra_headers.unwrap().get("X-Token").map(String::as_str),
            Some("abc")
        );
    }

    #[test]
    fn test_with_header_accumulates() {
        let options = StreamOptions::new()
            .with_header("a".to_string(), "1".to_string())
            .with_header("b".to_string(), "2".to_string());
        assert_eq!(options.extra_headers.unwrap().len(), 2);
    }
}
