//! DTOs of the room REST API, shared with the room client controller.

use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{FoodType, ParticipantEntity, RaceEntity, TeamName},
    dto::{format_system_time, validation::validate_display_name},
};

/// Payload used to open a new room.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
    pub food_type: FoodType,
    #[serde(default)]
    pub is_team_mode: bool,
}

/// Payload used to enter a room as a new participant.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Display name shown in the ranking.
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
    /// Empty strings are treated as "no avatar".
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub avatar: Option<String>,
    /// Ignored unless the race runs in team mode.
    #[serde(default)]
    pub team: Option<TeamName>,
    /// Login to link the participant to, for history.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub login_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateCountRequest {
    /// Signed increment; the stored counter never drops below zero.
    #[validate(range(min = -1000, max = 1000))]
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct AvatarRequest {
    #[validate(length(min = 1, max = 64))]
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct TeamRequest {
    pub team: TeamName,
}

/// Identifies the participant asking to end the race; only the VIP may.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct EndRaceRequest {
    pub participant_id: Uuid,
}

/// Public projection of a race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RaceSummary {
    /// Race identifier.
    pub id: Uuid,
    /// Name given when the room was opened.
    pub name: String,
    /// Food being eaten.
    pub food_type: FoodType,
    /// Five-character room code.
    pub room_code: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp, once ended.
    pub ended_at: Option<String>,
    /// Whether counters may still change.
    pub is_active: bool,
    /// Whether participants compete in teams.
    pub is_team_mode: bool,
    /// First participant to join; the only one allowed to end the race.
    pub vip_participant_id: Option<Uuid>,
}

impl From<&RaceEntity> for RaceSummary {
    fn from(value: &RaceEntity) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            food_type: value.food_type,
            room_code: value.room_code.clone(),
            created_at: format_system_time(value.created_at),
            ended_at: value.ended_at.map(format_system_time),
            is_active: value.is_active,
            is_team_mode: value.is_team_mode,
            vip_participant_id: value.vip_participant_id,
        }
    }
}

/// Public projection of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParticipantSummary {
    /// Participant identifier.
    pub id: Uuid,
    /// Race the participant joined.
    pub race_id: Uuid,
    /// Display name.
    pub name: String,
    /// Avatar key from the catalog.
    pub avatar: Option<String>,
    /// Whether this participant is the room VIP.
    pub is_vip: bool,
    /// Counter, never negative.
    pub items_eaten: u32,
    /// Chosen team, in team mode.
    pub team: Option<TeamName>,
    /// Linked login, if any.
    pub login_code: Option<String>,
    /// RFC 3339 join timestamp.
    pub created_at: String,
}

impl From<&ParticipantEntity> for ParticipantSummary {
    fn from(value: &ParticipantEntity) -> Self {
        Self {
            id: value.id,
            race_id: value.race_id,
            name: value.name.clone(),
            avatar: value.avatar.clone(),
            is_vip: value.is_vip,
            items_eaten: value.items_eaten,
            team: value.team,
            login_code: value.login_code.clone(),
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Aggregated score of a team in team mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TeamStanding {
    /// The team.
    pub team: TeamName,
    /// Sum of the members' counters.
    pub items_eaten: u64,
    /// Number of participants on the team.
    pub members: u32,
}

/// Which screen a room renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomView {
    /// Race in progress: counters and live ranking.
    Live,
    /// Race ended: final podium.
    HallOfFame,
}

/// Full room state; clients replace their local copy with it on every reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoomSnapshot {
    /// The race hosted by the room.
    pub race: RaceSummary,
    /// Ranked by items eaten, ties broken by join order.
    pub participants: Vec<ParticipantSummary>,
    /// Empty unless the race runs in team mode.
    pub teams: Vec<TeamStanding>,
    /// Screen to render.
    pub view: RoomView,
}

impl RoomSnapshot {
    /// Look up a participant of this room.
    pub fn participant(&self, id: Uuid) -> Option<&ParticipantSummary> {
        self.participants.iter().find(|participant| participant.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_request_treats_empty_strings_as_absent() {
        let request: JoinRoomRequest =
            serde_json::from_str(r#"{"name":"Ana","avatar":"","login_code":""}"#)
                .expect("parse join request");
        assert_eq!(request.avatar, None);
        assert_eq!(request.login_code, None);
        assert_eq!(request.team, None);
    }

    #[test]
    fn join_request_rejects_blank_names() {
        let request = JoinRoomRequest {
            name: "   ".into(),
            ..JoinRoomRequest::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn count_delta_is_bounded() {
        assert!(UpdateCountRequest { delta: -1 }.validate().is_ok());
        assert!(UpdateCountRequest { delta: 5000 }.validate().is_err());
    }
}
