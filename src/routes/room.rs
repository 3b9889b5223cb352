use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::room::{
        AvatarRequest, CreateRoomRequest, EndRaceRequest, JoinRoomRequest, ParticipantSummary,
        RaceSummary, RoomSnapshot, TeamRequest, UpdateCountRequest,
    },
    error::AppError,
    routes::extract::{AppJson, AppPath},
    services::room_service,
    state::SharedState,
};

/// Room lifecycle routes used by the room screens.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(load_room))
        .route("/rooms/{code}/participants", post(join_room))
        .route(
            "/rooms/{code}/participants/{id}/count",
            post(update_count),
        )
        .route(
            "/rooms/{code}/participants/{id}/avatar",
            put(update_avatar),
        )
        .route("/rooms/{code}/participants/{id}/team", put(choose_team))
        .route("/rooms/{code}/end", post(end_race))
}

/// Open a new room with a fresh five-character code.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RaceSummary),
        (status = 400, description = "Invalid name")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    AppJson(payload): AppJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RaceSummary>), AppError> {
    let race = room_service::create_room(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(race)))
}

/// Full room state: race, ranking, team standings and view.
#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    responses(
        (status = 200, description = "Room state", body = RoomSnapshot),
        (status = 404, description = "Unknown room")
    )
)]
pub async fn load_room(
    State(state): State<SharedState>,
    AppPath(code): AppPath<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    Ok(Json(room_service::load_room(&state, &code).await?))
}

#[utoipa::path(
    post,
    path = "/rooms/{code}/participants",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    request_body = JoinRoomRequest,
    responses(
        (status = 201, description = "Participant registered", body = ParticipantSummary),
        (status = 409, description = "Race already ended")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    AppPath(code): AppPath<String>,
    AppJson(payload): AppJson<JoinRoomRequest>,
) -> Result<(StatusCode, Json<ParticipantSummary>), AppError> {
    let participant = room_service::join_room(&state, &code, payload).await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

/// Apply a signed delta to a participant counter; the result never drops below zero.
#[utoipa::path(
    post,
    path = "/rooms/{code}/participants/{id}/count",
    tag = "rooms",
    params(
        ("code" = String, Path, description = "Room code, case-insensitive"),
        ("id" = String, Path, description = "Participant identifier")
    ),
    request_body = UpdateCountRequest,
    responses(
        (status = 200, description = "Counter updated", body = ParticipantSummary),
        (status = 409, description = "Race already ended")
    )
)]
pub async fn update_count(
    State(state): State<SharedState>,
    AppPath((code, id)): AppPath<(String, Uuid)>,
    AppJson(payload): AppJson<UpdateCountRequest>,
) -> Result<Json<ParticipantSummary>, AppError> {
    validator::Validate::validate(&payload)?;
    Ok(Json(
        room_service::update_count(&state, &code, id, payload.delta).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/rooms/{code}/participants/{id}/avatar",
    tag = "rooms",
    params(
        ("code" = String, Path, description = "Room code, case-insensitive"),
        ("id" = String, Path, description = "Participant identifier")
    ),
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar changed", body = ParticipantSummary),
        (status = 400, description = "Unknown avatar"),
        (status = 403, description = "Exclusive avatar not unlocked")
    )
)]
pub async fn update_avatar(
    State(state): State<SharedState>,
    AppPath((code, id)): AppPath<(String, Uuid)>,
    AppJson(payload): AppJson<AvatarRequest>,
) -> Result<Json<ParticipantSummary>, AppError> {
    validator::Validate::validate(&payload)?;
    Ok(Json(
        room_service::update_avatar(&state, &code, id, &payload.avatar).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/rooms/{code}/participants/{id}/team",
    tag = "rooms",
    params(
        ("code" = String, Path, description = "Room code, case-insensitive"),
        ("id" = String, Path, description = "Participant identifier")
    ),
    request_body = TeamRequest,
    responses(
        (status = 200, description = "Team chosen", body = ParticipantSummary),
        (status = 400, description = "Room not in team mode")
    )
)]
pub async fn choose_team(
    State(state): State<SharedState>,
    AppPath((code, id)): AppPath<(String, Uuid)>,
    AppJson(payload): AppJson<TeamRequest>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(
        room_service::choose_team(&state, &code, id, payload.team).await?,
    ))
}

/// End the race; only its VIP participant may.
#[utoipa::path(
    post,
    path = "/rooms/{code}/end",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    request_body = EndRaceRequest,
    responses(
        (status = 200, description = "Race ended", body = RaceSummary),
        (status = 403, description = "Caller is not the VIP"),
        (status = 409, description = "Race already ended")
    )
)]
pub async fn end_race(
    State(state): State<SharedState>,
    AppPath(code): AppPath<String>,
    AppJson(payload): AppJson<EndRaceRequest>,
) -> Result<Json<RaceSummary>, AppError> {
    Ok(Json(
        room_service::end_race(&state, &code, payload.participant_id).await?,
    ))
}
