//! SSE stream handler
//!
//! Replays the buffered events for a request and then follows the live feed
//! until the terminal event. A client disconnecting only drops its receiver;
//! the worker is unaffected and the run completes normally.

use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::AppState;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Heartbeat interval for idle streams
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Subscribe to a request's event stream
///
/// GET /api/stream/{request_id}
pub async fn stream(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let subscription = state
        .broker
        .events
        .subscribe(&request_id)
        .map_err(|_| ApiError::NotFound(format!("unknown request_id: {}", request_id)))?;

    let stream = async_stream::stream! {
        let mut terminal_seen = false;

        for envelope in subscription.backlog {
            terminal_seen = envelope.event.is_terminal();
            yield Ok(Event::default().data(envelope.event.to_wire().to_string()));
        }

        if let Some(mut live) = subscription.live {
            while !terminal_seen {
                match live.recv().await {
                    Ok(envelope) => {
                        terminal_seen = envelope.event.is_terminal();
                        yield Ok(Event::default().data(envelope.event.to_wire().to_string()));
                    }
                    // A slow consumer that lost events keeps reading; the
                    // terminal event is retained by the channel until read.
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(%request_id, missed, "SSE subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEPALIVE_INTERVAL)
            .text("keepalive"),
    ))
}
