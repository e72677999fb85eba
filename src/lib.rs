//! # sse-client - Server-Sent Events stream client
//!
//! Opens a `text/event-stream` response and decodes its body into discrete
//! [`Event`]s on a background task.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Incremental line framing on `\n`, `\r`, and `\r\n`, correct under any chunking
//! - Bounded event channel with backpressure
//! - Prompt cancellation of a blocked read
//!
//! ## Architecture
//!
//! - **`sse`**: line framer turning body bytes into lines
//! - **`model`**: `Event` and the field accumulator that dispatches on blank lines
//! - **`stream`**: decode loop feeding the event channel
//! - **`client`**: the `Client` handle, close signal, and error type
//!
//! ## Example
//! ```no_run
//! use sse_client::{Client, StreamOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = StreamOptions::new().with_capacity(256);
//!     let mut client = Client::open_with_options("http://localhost:8080/events", &options).await?;
//!
//!     while let Some(event) = client.recv().await {
//!         println!("[{}] {}", event.kind(), String::from_utf8_lossy(&event.data));
//!     }
//!
//!     match client.err() {
//!         None => println!("stream ended"),
//!         Some(err) => println!("stream failed: {}", err),
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use client::{Client, ClientError, CloseHandle};
pub use model::{Event, EventBuilder};
pub use options::StreamOptions;
