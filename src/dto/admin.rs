//! DTO definitions used by the admin session and moderation endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::room::RaceSummary;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub password: String,
}

/// Result of a login attempt or a session check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub authenticated: bool,
}

/// Grants or revokes the right to mint codes for an exclusive avatar.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub login_code: String,
    pub avatar: String,
}

/// Race as listed in the moderation console.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminRaceItem {
    pub race: RaceSummary,
    pub participants: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActionResponse {
    pub ok: bool,
}
