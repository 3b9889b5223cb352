use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{FoodType, LoginEntity, ParticipantEntity, RaceEntity},
    dto::{format_system_time, validation::validate_login_code},
};

/// Username and password of a login, for registration or authentication.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct LoginCredentials {
    #[validate(custom(function = "validate_login_code"))]
    pub code: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginSummary {
    pub id: Uuid,
    /// Normalized (uppercase) username.
    pub code: String,
    pub created_at: String,
}

impl From<&LoginEntity> for LoginSummary {
    fn from(value: &LoginEntity) -> Self {
        Self {
            id: value.id,
            code: value.code.clone(),
            created_at: format_system_time(value.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticateResponse {
    pub authenticated: bool,
    pub code: String,
}

/// One race a login took part in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub race_id: Uuid,
    pub race_name: String,
    pub room_code: String,
    pub food_type: FoodType,
    pub participant_id: Uuid,
    pub items_eaten: u32,
    pub is_active: bool,
    pub joined_at: String,
}

impl HistoryEntry {
    pub fn new(race: &RaceEntity, participant: &ParticipantEntity) -> Self {
        Self {
            race_id: race.id,
            race_name: race.name.clone(),
            room_code: race.room_code.clone(),
            food_type: race.food_type,
            participant_id: participant.id,
            items_eaten: participant.items_eaten,
            is_active: race.is_active,
            joined_at: format_system_time(participant.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub code: String,
    pub races: Vec<HistoryEntry>,
}
