use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::{get, post},
};

use crate::{
    dto::promo::{
        AvatarListResponse, ClaimRequest, ClaimResponse, CodeActionRequest, CodeListResponse,
        CreateCodeRequest, CreatedCodeResponse, LoginCodeQuery, RevealResponse, StatusResponse,
    },
    error::PromoError,
    routes::extract::PromoJson,
    services::promo_service,
    state::SharedState,
};

/// Promo code and exclusive avatar routes. Failures answer `{status}`.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/promo-codes", post(create_code).get(list_codes))
        .route("/promo-codes/reveal", post(reveal_code))
        .route("/promo-codes/disable", post(disable_code))
        .route("/promo-codes/permissions", get(list_permissions))
        .route("/exclusive-avatars/claim", post(claim))
        .route("/exclusive-avatars", get(list_grants))
}

fn login_code(query: Result<Query<LoginCodeQuery>, QueryRejection>) -> Result<String, PromoError> {
    query
        .map(|Query(query)| query.login_code)
        .map_err(|_| PromoError::Invalid)
}

/// Mint a code for an exclusive avatar. The plaintext is returned here and on reveal only.
#[utoipa::path(
    post,
    path = "/promo-codes",
    tag = "promo",
    request_body = CreateCodeRequest,
    responses(
        (status = 200, description = "Code created", body = CreatedCodeResponse),
        (status = 400, description = "`invalid` or `unknown_user`"),
        (status = 403, description = "`forbidden`: no permission for the avatar"),
        (status = 500, description = "`failed`")
    )
)]
pub async fn create_code(
    State(state): State<SharedState>,
    PromoJson(payload): PromoJson<CreateCodeRequest>,
) -> Result<Json<CreatedCodeResponse>, PromoError> {
    Ok(Json(promo_service::create_code(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/promo-codes",
    tag = "promo",
    params(LoginCodeQuery),
    responses(
        (status = 200, description = "Codes created by the login", body = CodeListResponse),
        (status = 400, description = "`invalid` or `unknown_user`")
    )
)]
pub async fn list_codes(
    State(state): State<SharedState>,
    query: Result<Query<LoginCodeQuery>, QueryRejection>,
) -> Result<Json<CodeListResponse>, PromoError> {
    let login_code = login_code(query)?;
    Ok(Json(promo_service::list_codes(&state, &login_code).await?))
}

#[utoipa::path(
    post,
    path = "/promo-codes/reveal",
    tag = "promo",
    request_body = CodeActionRequest,
    responses(
        (status = 200, description = "Plaintext code", body = RevealResponse),
        (status = 400, description = "`invalid`"),
        (status = 403, description = "`forbidden`: not the creator")
    )
)]
pub async fn reveal_code(
    State(state): State<SharedState>,
    PromoJson(payload): PromoJson<CodeActionRequest>,
) -> Result<Json<RevealResponse>, PromoError> {
    Ok(Json(promo_service::reveal_code(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/promo-codes/disable",
    tag = "promo",
    request_body = CodeActionRequest,
    responses(
        (status = 200, description = "Code disabled", body = StatusResponse),
        (status = 400, description = "`invalid`"),
        (status = 403, description = "`forbidden`: not the creator")
    )
)]
pub async fn disable_code(
    State(state): State<SharedState>,
    PromoJson(payload): PromoJson<CodeActionRequest>,
) -> Result<Json<StatusResponse>, PromoError> {
    Ok(Json(promo_service::disable_code(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/promo-codes/permissions",
    tag = "promo",
    params(LoginCodeQuery),
    responses((status = 200, description = "Avatars the login may mint codes for", body = AvatarListResponse))
)]
pub async fn list_permissions(
    State(state): State<SharedState>,
    query: Result<Query<LoginCodeQuery>, QueryRejection>,
) -> Result<Json<AvatarListResponse>, PromoError> {
    let login_code = login_code(query)?;
    Ok(Json(
        promo_service::list_permissions(&state, &login_code).await?,
    ))
}

/// Redeem a code and unlock its avatar for the login.
#[utoipa::path(
    post,
    path = "/exclusive-avatars/claim",
    tag = "promo",
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Avatar unlocked", body = ClaimResponse),
        (status = 400, description = "`invalid`: unknown, expired, disabled or exhausted code"),
        (status = 500, description = "`failed`")
    )
)]
pub async fn claim(
    State(state): State<SharedState>,
    PromoJson(payload): PromoJson<ClaimRequest>,
) -> Result<Json<ClaimResponse>, PromoError> {
    Ok(Json(
        promo_service::claim_exclusive_avatar(&state, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/exclusive-avatars",
    tag = "promo",
    params(LoginCodeQuery),
    responses((status = 200, description = "Avatars unlocked by the login", body = AvatarListResponse))
)]
pub async fn list_grants(
    State(state): State<SharedState>,
    query: Result<Query<LoginCodeQuery>, QueryRejection>,
) -> Result<Json<AvatarListResponse>, PromoError> {
    let login_code = login_code(query)?;
    Ok(Json(promo_service::list_grants(&state, &login_code).await?))
}
