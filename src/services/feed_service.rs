use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::feed::{CHANGE_EVENT_NAME, ChangeEvent},
    error::ServiceError,
    services::{codes::normalize_code, room_service},
    state::SharedState,
};

/// Subscribe to the change feed of an existing room.
pub async fn subscribe(
    state: &SharedState,
    room_code: &str,
) -> Result<(String, broadcast::Receiver<ChangeEvent>), ServiceError> {
    let store = state.require_store().await?;
    let race = room_service::find_race(store.as_ref(), &normalize_code(room_code)).await?;
    let receiver = state.feeds().subscribe(&race.room_code);
    Ok((race.room_code, receiver))
}

/// Publish a change on its room's feed.
pub fn publish(state: &SharedState, event: ChangeEvent) {
    debug!(
        room_code = %event.room_code,
        table = ?event.table,
        kind = ?event.kind,
        row_id = %event.row_id,
        "publishing change"
    );
    state.feeds().publish(event);
}

/// Convert a room subscription into an SSE response, forwarding events and
/// pruning the room hub once the client disconnects.
pub fn to_sse_stream(
    state: SharedState,
    room_code: String,
    mut receiver: broadcast::Receiver<ChangeEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(change) => {
                            let data = match serde_json::to_string(&change) {
                                Ok(data) => data,
                                Err(err) => {
                                    warn!(error = %err, "failed to encode change event");
                                    continue;
                                }
                            };
                            let event = Event::default().event(CHANGE_EVENT_NAME).data(data);
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        // Delivery is at-most-once; the next event triggers a full reload anyway.
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(%room_code, skipped, "room feed subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        drop(receiver);
        state.feeds().release(&room_code);
        info!(%room_code, "room feed disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
