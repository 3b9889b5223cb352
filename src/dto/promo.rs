//! DTOs of the promo code and exclusive avatar endpoints. Request bodies use camelCase.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    dao::models::{AvatarCodeEntity, CodeStatus},
    dto::format_system_time,
};

/// Outcome reported in the `status` field of every promo response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromoStatus {
    Created,
    Ok,
    Disabled,
    Invalid,
    Forbidden,
    UnknownUser,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCodeRequest {
    pub login_code: String,
    pub avatar: String,
    /// Lifetime of the code, 1 to 365 days.
    pub expires_in_days: i64,
    /// Number of redemptions allowed, 1 to 1000.
    pub max_uses: i64,
}

/// Targets one code owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeActionRequest {
    pub login_code: String,
    pub code_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub login_code: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LoginCodeQuery {
    pub login_code: String,
}

/// Returned once, at creation: the only response carrying the plaintext besides reveal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedCodeResponse {
    pub status: PromoStatus,
    pub code: String,
    pub avatar: String,
    pub id: Uuid,
    pub expires_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CodeSummary {
    pub id: Uuid,
    pub avatar: String,
    pub uses: u32,
    pub max_uses: u32,
    pub expires_at: String,
    pub disabled_at: Option<String>,
    pub created_at: String,
    pub status: CodeStatus,
}

impl CodeSummary {
    pub fn from_entity(code: &AvatarCodeEntity, now: std::time::SystemTime) -> Self {
        Self {
            id: code.id,
            avatar: code.avatar.clone(),
            uses: code.uses,
            max_uses: code.max_uses,
            expires_at: format_system_time(code.expires_at),
            disabled_at: code.disabled_at.map(format_system_time),
            created_at: format_system_time(code.created_at),
            status: code.status(now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CodeListResponse {
    pub codes: Vec<CodeSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevealResponse {
    pub status: PromoStatus,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: PromoStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimResponse {
    pub status: PromoStatus,
    pub avatar: String,
}

/// Avatars a login may mint codes for, or has unlocked.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvatarListResponse {
    pub avatars: Vec<String>,
}
