//! Server-Sent Events for sequencer status updates

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::animation::SequencerStatus;
use crate::AppState;

/// Create an SSE stream of sequencer status changes
pub fn create_status_stream(
    app_state: Arc<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.sequencer.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(status) => status_to_event(&status).map(Ok),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Convert a status snapshot to an SSE event
fn status_to_event(status: &SequencerStatus) -> Option<Event> {
    match serde_json::to_string(status) {
        Ok(data) => Some(Event::default().event("status").data(data)),
        Err(e) => {
            tracing::warn!("Failed to serialize status: {}", e);
            None
        }
    }
}
