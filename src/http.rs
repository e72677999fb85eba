//! HTTP client construction for event-stream requests.

use reqwest::header::{ACCEPT, CONNECTION};
use reqwest::{Client, RequestBuilder, Url};
use std::collections::HashMap;

use crate::client::ClientError;
use crate::options::StreamOptions;

/// Media type requested from the server.
pub const EVENT_STREAM_MIME: &str = "text/event-stream";

/// Build an HTTP client for a single long-lived stream.
///
/// Idle connections are never pooled, and only the connect phase is bounded
/// by a timeout.
pub fn build_http_client(options: &StreamOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder().pool_max_idle_per_host(0);

    if let Some(timeout) = options.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }

    if let Some(proxy_url) = &options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Build the `GET` request that opens the stream.
pub fn event_stream_request(client: &Client, url: Url, options: &StreamOptions) -> RequestBuilder {
    let request = client
        .get(url)
        .header(ACCEPT, EVENT_STREAM_MIME)
        .header(CONNECTION, "close");
    add_extra_headers(request, &options.extra_headers)
}

/// Add extra headers to a request if any are configured.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}
