//! Server-Sent Events support

use super::types::SessionResponse;
use crate::runtime::SessionUpdate;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, led by a full snapshot.
///
/// `broadcast_rx` must be subscribed before `init` was taken. Updates the
/// snapshot already reflects are skipped.
pub fn sse_stream(
    init: SessionResponse,
    broadcast_rx: broadcast::Receiver<SessionUpdate>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let last_sequence_id = init.sequence_id;
    let init_event = Event::default().event("init").data(
        json!({
            "type": "init",
            "sequence_id": last_sequence_id,
            "session": init,
        })
        .to_string(),
    );
    let init = futures::stream::once(async move { Ok(init_event) });

    let updates =
        updates_after(last_sequence_id, broadcast_rx).map(|update| Ok(update_to_axum(&update)));

    Sse::new(init.chain(updates)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Updates newer than `last_sequence_id`, skipping lag gaps
fn updates_after(
    last_sequence_id: u64,
    broadcast_rx: broadcast::Receiver<SessionUpdate>,
) -> impl Stream<Item = SessionUpdate> {
    BroadcastStream::new(broadcast_rx).filter_map(move |result| match result {
        Ok(update) if update.sequence_id > last_sequence_id => Some(update),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "SSE subscriber lagged");
            None
        }
    })
}

fn update_to_axum(update: &SessionUpdate) -> Event {
    let data = match serde_json::to_value(&update.event) {
        Ok(mut value) => {
            if let Value::Object(fields) = &mut value {
                fields.insert("sequence_id".into(), update.sequence_id.into());
            }
            value.to_string()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize session event");
            json!({ "type": "error", "message": "serialization failed" }).to_string()
        }
    };
    Event::default()
        .event(update.event.event_type())
        .id(update.sequence_id.to_string())
        .data(data)
}
