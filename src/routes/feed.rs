use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError, routes::extract::AppPath, services::feed_service, state::SharedState,
};

#[utoipa::path(
    get,
    path = "/rooms/{code}/events",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    responses(
        (status = 200, description = "Stream of `change` events for the room", content_type = "text/event-stream", body = crate::dto::feed::ChangeEvent),
        (status = 404, description = "Unknown room")
    )
)]
/// Stream row changes of a room so clients know when to reload.
pub async fn room_events(
    State(state): State<SharedState>,
    AppPath(code): AppPath<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (room_code, receiver) = feed_service::subscribe(&state, &code).await?;
    info!(%room_code, "new room feed connection");
    Ok(feed_service::to_sse_stream(state, room_code, receiver))
}

/// Configure the room feed endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{code}/events", get(room_events))
}
