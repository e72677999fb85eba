//! Background decode loop driving a live stream.
//!
//! One task owns the line source and the only sender of the event channel.
//! It races every read and every send against the close signal, so a close
//! aborts a blocked read or a send into a full channel. Returning from the
//! loop drops the source, which closes the connection, and then drops the
//! sender, which closes the channel.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::client::ClientError;
use crate::model::{Event, EventBuilder};

/// Terminal status of a stream, written once by the decode task.
pub(crate) type Outcome = Arc<OnceLock<Option<ClientError>>>;

pub(crate) async fn decode<S>(
    lines: S,
    events: mpsc::Sender<Event>,
    mut closed: watch::Receiver<bool>,
    outcome: Outcome,
) where
    S: Stream<Item = Result<Bytes, ClientError>>,
{
    let result = pump(lines, &events, &mut closed).await;
    match &result {
        Ok(()) => debug!("event stream ended"),
        Err(e) => debug!(error = %e, "event stream terminated"),
    }

    // The outcome must be visible before the channel reports closure.
    record_outcome(&outcome, result.err());
    drop(events);
}

/// Store the terminal status. Only the first write counts; a second one
/// breaks the single-writer rule and is reported.
fn record_outcome(outcome: &Outcome, error: Option<ClientError>) -> bool {
    match outcome.set(error) {
        Ok(()) => true,
        Err(rejected) => {
            warn!(rejected = ?rejected, "stream outcome was already recorded");
            false
        }
    }
}

async fn pump<S>(
    lines: S,
    events: &mpsc::Sender<Event>,
    closed: &mut watch::Receiver<bool>,
) -> Result<(), ClientError>
where
    S: Stream<Item = Result<Bytes, ClientError>>,
{
    futures::pin_mut!(lines);
    let mut builder = EventBuilder::new();

    loop {
        let line = tokio::select! {
            biased;
            _ = close_requested(closed) => return Err(ClientError::StreamCancelled),
            line = lines.next() => line,
        };
        let Some(line) = line else {
            return Ok(());
        };

        if let Some(event) = builder.feed(&line?) {
            tokio::select! {
                biased;
                _ = close_requested(closed) => return Err(ClientError::StreamCancelled),
                sent = events.send(event) => {
                    if sent.is_err() {
                        debug!("event receiver dropped");
                        return Err(ClientError::StreamCancelled);
                    }
                }
            }
        }
    }
}

/// Resolves once close was requested or every close handle is gone.
async fn close_requested(closed: &mut watch::Receiver<bool>) {
    if closed.wait_for(|closed| *closed).await.is_err() {
        debug!("all close handles dropped");
    }
}
