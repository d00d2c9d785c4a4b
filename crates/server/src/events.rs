//! Server-sent event stream for per-user notifications.
//!
//! Delivery is best-effort: events emitted while no stream is open are
//! lost, and a lagging client skips ahead. Clients that need history must
//! read the ledger, not this stream.

use std::time::Duration;

use axum::{
    Extension,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use crate::{server::ServerState, user};

pub async fn stream(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.notifier.subscribe(&user.username);

    let stream = BroadcastStream::new(receiver)
        // Lagged receivers yield an error item; drop it and keep reading.
        .filter_map(|notification| notification.ok())
        .map(|notification| Event::default().event("notification").json_data(&notification));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
