use axum::Router;

use crate::state::SharedState;

pub(crate) mod admin;
pub(crate) mod catalog;
pub(crate) mod docs;
pub(crate) mod extract;
pub(crate) mod feed;
pub(crate) mod health;
pub(crate) mod login;
pub(crate) mod promo;
pub(crate) mod room;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(catalog::router())
        .merge(room::router())
        .merge(feed::router())
        .merge(login::router())
        .merge(promo::router())
        .merge(admin::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
