use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Rooms with at least one live change feed subscriber.
    pub watched_rooms: usize,
}

impl HealthResponse {
    /// Storage reachable.
    pub fn ok(watched_rooms: usize) -> Self {
        Self {
            status: "ok".to_string(),
            watched_rooms,
        }
    }

    /// Running without a storage backend.
    pub fn degraded(watched_rooms: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            watched_rooms,
        }
    }
}
