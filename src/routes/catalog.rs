use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::catalog::CatalogResponse, services::catalog_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/catalog",
    tag = "rooms",
    responses((status = 200, description = "Avatars, foods, teams and locale", body = CatalogResponse))
)]
pub async fn catalog(State(state): State<SharedState>) -> Json<CatalogResponse> {
    Json(catalog_service::catalog(&state))
}

pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/catalog", get(catalog))
}
