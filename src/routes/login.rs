use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::login::{AuthenticateResponse, HistoryResponse, LoginCredentials, LoginSummary},
    error::AppError,
    routes::extract::{AppJson, AppPath},
    services::login_service,
    state::SharedState,
};

/// Login registration, authentication and history routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/logins", post(register))
        .route("/logins/authenticate", post(authenticate))
        .route("/logins/{code}/history", get(history))
}

#[utoipa::path(
    post,
    path = "/logins",
    tag = "logins",
    request_body = LoginCredentials,
    responses(
        (status = 201, description = "Login created", body = LoginSummary),
        (status = 400, description = "Invalid code or password"),
        (status = 409, description = "Code already taken")
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    AppJson(payload): AppJson<LoginCredentials>,
) -> Result<(StatusCode, Json<LoginSummary>), AppError> {
    let login = login_service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(login)))
}

#[utoipa::path(
    post,
    path = "/logins/authenticate",
    tag = "logins",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Credentials accepted", body = AuthenticateResponse),
        (status = 401, description = "Credentials rejected")
    )
)]
pub async fn authenticate(
    State(state): State<SharedState>,
    AppJson(payload): AppJson<LoginCredentials>,
) -> Result<Json<AuthenticateResponse>, AppError> {
    Ok(Json(login_service::authenticate(&state, payload).await?))
}

/// Races the login took part in, newest first.
#[utoipa::path(
    get,
    path = "/logins/{code}/history",
    tag = "logins",
    params(("code" = String, Path, description = "Login code, case-insensitive")),
    responses(
        (status = 200, description = "Race history", body = HistoryResponse),
        (status = 404, description = "Unknown login")
    )
)]
pub async fn history(
    State(state): State<SharedState>,
    AppPath(code): AppPath<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    Ok(Json(login_service::history(&state, &code).await?))
}
