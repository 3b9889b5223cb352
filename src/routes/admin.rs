use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{ActionResponse, AdminLoginRequest, AdminRaceItem, PermissionRequest, SessionResponse},
        room::RaceSummary,
    },
    error::AppError,
    routes::extract::{AppJson, AppPath},
    services::admin_service,
    state::SharedState,
};

/// Name of the cookie carrying the admin session token.
pub const ADMIN_COOKIE: &str = "admin_session";
const SESSION_LIFETIME: time::Duration = time::Duration::hours(12);

/// Session routes plus the moderation console behind the cookie gate.
pub fn router(state: SharedState) -> Router<SharedState> {
    let console = Router::new()
        .route("/admin/races", get(list_races))
        .route("/admin/races/{code}/end", post(end_race))
        .route("/admin/participants/{id}", delete(remove_participant))
        .route(
            "/admin/permissions",
            post(grant_permission).delete(revoke_permission),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin_session));

    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
        .route("/admin/session", get(session))
        .merge(console)
}

fn session_cookie(value: String, secure: bool, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((ADMIN_COOKIE, value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Exchange the admin password for a session cookie.
#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Authenticated; sets the `admin_session` cookie", body = SessionResponse),
        (status = 401, description = "Wrong password")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    AppJson(payload): AppJson<AdminLoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let admin = state.config().admin();
    let token = admin_service::login(admin, &payload.password)?;
    let jar = jar.add(session_cookie(token, admin.secure_cookie, SESSION_LIFETIME));
    Ok((jar, Json(SessionResponse { authenticated: true })))
}

/// Clear the session cookie.
#[utoipa::path(
    post,
    path = "/admin/logout",
    tag = "admin",
    responses((status = 200, description = "Cookie cleared", body = SessionResponse))
)]
pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> (CookieJar, Json<SessionResponse>) {
    let secure = state.config().admin().secure_cookie;
    let jar = jar.add(session_cookie(String::new(), secure, time::Duration::ZERO));
    (jar, Json(SessionResponse {
        authenticated: false,
    }))
}

#[utoipa::path(
    get,
    path = "/admin/session",
    tag = "admin",
    responses((status = 200, description = "Whether the cookie holds a valid session", body = SessionResponse))
)]
pub async fn session(State(state): State<SharedState>, jar: CookieJar) -> Json<SessionResponse> {
    let cookie = jar.get(ADMIN_COOKIE).map(Cookie::value);
    Json(SessionResponse {
        authenticated: admin_service::is_authenticated(state.config().admin(), cookie),
    })
}

#[utoipa::path(
    get,
    path = "/admin/races",
    tag = "admin",
    responses(
        (status = 200, description = "Every race, newest first", body = [AdminRaceItem]),
        (status = 401, description = "Missing or invalid session cookie")
    )
)]
pub async fn list_races(
    State(state): State<SharedState>,
) -> Result<Json<Vec<AdminRaceItem>>, AppError> {
    Ok(Json(admin_service::list_races(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/races/{code}/end",
    tag = "admin",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    responses(
        (status = 200, description = "Race ended", body = RaceSummary),
        (status = 409, description = "Race already ended")
    )
)]
pub async fn end_race(
    State(state): State<SharedState>,
    AppPath(code): AppPath<String>,
) -> Result<Json<RaceSummary>, AppError> {
    Ok(Json(admin_service::end_race(&state, &code).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/participants/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Participant identifier")),
    responses(
        (status = 200, description = "Participant removed", body = ActionResponse),
        (status = 404, description = "Unknown participant")
    )
)]
pub async fn remove_participant(
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    admin_service::remove_participant(&state, id).await?;
    Ok(Json(ActionResponse { ok: true }))
}

/// Allow a login to mint codes for an exclusive avatar.
#[utoipa::path(
    post,
    path = "/admin/permissions",
    tag = "admin",
    request_body = PermissionRequest,
    responses(
        (status = 200, description = "Permission granted", body = ActionResponse),
        (status = 400, description = "Not an exclusive avatar"),
        (status = 404, description = "Unknown login")
    )
)]
pub async fn grant_permission(
    State(state): State<SharedState>,
    AppJson(payload): AppJson<PermissionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    admin_service::grant_permission(&state, &payload.login_code, &payload.avatar).await?;
    Ok(Json(ActionResponse { ok: true }))
}

#[utoipa::path(
    delete,
    path = "/admin/permissions",
    tag = "admin",
    request_body = PermissionRequest,
    responses(
        (status = 200, description = "Permission revoked", body = ActionResponse),
        (status = 404, description = "No such permission")
    )
)]
pub async fn revoke_permission(
    State(state): State<SharedState>,
    AppJson(payload): AppJson<PermissionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    admin_service::revoke_permission(&state, &payload.login_code, &payload.avatar).await?;
    Ok(Json(ActionResponse { ok: true }))
}

async fn require_admin_session(
    State(state): State<SharedState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let cookie = jar.get(ADMIN_COOKIE).map(Cookie::value);
    if admin_service::is_authenticated(state.config().admin(), cookie) {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("admin session required".into()))
    }
}
