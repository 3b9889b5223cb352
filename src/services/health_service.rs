use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report storage health, pinging the backend when one is installed.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.competition_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    let watched_rooms = state.feeds().watched_rooms();
    if state.is_degraded().await {
        HealthResponse::degraded(watched_rooms)
    } else {
        HealthResponse::ok(watched_rooms)
    }
}
