//! Server-sent event streams backed by the tracking gateway.
//!
//! Each connection gets its own subscriber id; the gateway prunes the
//! subscription when the client disconnects and the channel closes.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use domain::services::gateway::{PushEvent, Topic};

use crate::app::AppState;
use crate::error::ApiError;

fn event_stream(
    rx: tokio::sync::mpsc::UnboundedReceiver<PushEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    UnboundedReceiverStream::new(rx).map(|event| {
        let event = Event::default()
            .json_data(&event)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Ok(event)
    })
}

/// Firehose: every event the gateway publishes.
pub async fn global(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscriber_id = Uuid::new_v4().to_string();
    let rx = state.gateway.subscribe(&subscriber_id, Topic::Global);
    Sse::new(event_stream(rx)).keep_alive(KeepAlive::default())
}

/// Latest position of every actively dispatched driver.
pub async fn trackers(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscriber_id = Uuid::new_v4().to_string();
    let rx = state.gateway.subscribe(&subscriber_id, Topic::AllTrackers);
    Sse::new(event_stream(rx)).keep_alive(KeepAlive::default())
}

/// Single-driver feed. Starts with a snapshot of the last known position
/// when one exists.
pub async fn driver(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let subscriber_id = Uuid::new_v4().to_string();
    let rx = state
        .tracking
        .subscribe_driver(&subscriber_id, driver_id)
        .await?;
    Ok(Sse::new(event_stream(rx)).keep_alive(KeepAlive::default()))
}
