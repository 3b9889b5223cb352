use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Food the participants of a race compete on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FoodType {
    /// Counted in slices.
    Pizza,
    /// Counted in pieces.
    Sushi,
    /// Counted in burgers.
    Burger,
}

impl FoodType {
    /// Every food a race can be created with.
    pub const ALL: [FoodType; 3] = [FoodType::Pizza, FoodType::Sushi, FoodType::Burger];

    /// Wire and storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            FoodType::Pizza => "pizza",
            FoodType::Sushi => "sushi",
            FoodType::Burger => "burger",
        }
    }
}

/// Team a participant may pick when the race runs in team mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TeamName {
    /// Blue.
    Azul,
    /// Red.
    Vermelha,
    /// Green.
    Verde,
    /// Yellow.
    Amarela,
}

impl TeamName {
    /// Every team, in display order.
    pub const ALL: [TeamName; 4] = [
        TeamName::Azul,
        TeamName::Vermelha,
        TeamName::Verde,
        TeamName::Amarela,
    ];

    /// Wire and storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            TeamName::Azul => "AZUL",
            TeamName::Vermelha => "VERMELHA",
            TeamName::Verde => "VERDE",
            TeamName::Amarela => "AMARELA",
        }
    }
}

/// A competition room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RaceEntity {
    /// Primary key of the race.
    pub id: Uuid,
    /// Display name chosen by the creator.
    pub name: String,
    pub food_type: FoodType,
    /// Five uppercase alphanumeric characters, unique across races.
    pub room_code: String,
    pub created_at: SystemTime,
    /// Set once, when the race ends.
    pub ended_at: Option<SystemTime>,
    pub is_active: bool,
    pub is_team_mode: bool,
    /// First participant that joined; only this participant may end the race.
    pub vip_participant_id: Option<Uuid>,
}

/// A player registered in a race.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    pub id: Uuid,
    /// Race owning this participant.
    pub race_id: Uuid,
    pub name: String,
    /// Identifier resolved against the avatar catalog or the exclusive avatars.
    pub avatar: Option<String>,
    /// True for the first participant of the race.
    pub is_vip: bool,
    pub items_eaten: u32,
    pub team: Option<TeamName>,
    /// Login the participant joined with, if any.
    pub login_code: Option<String>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Username/password identity independent of any race.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginEntity {
    pub id: Uuid,
    /// Normalized (uppercase) username.
    pub code: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub created_at: SystemTime,
}

/// Right granted to a login to mint codes for one exclusive avatar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvatarPermissionEntity {
    pub login_code: String,
    pub avatar: String,
    pub created_at: SystemTime,
}

/// Lifecycle status derived from an [`AvatarCodeEntity`] at a given instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    Active,
    Expired,
    Disabled,
    Exhausted,
}

/// Limited-use code unlocking an exclusive avatar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvatarCodeEntity {
    pub id: Uuid,
    /// SHA-256 hex digest of the uppercase code, used for lookups.
    pub code_hash: String,
    /// Plaintext kept so the creator can reveal it again.
    pub code: String,
    pub avatar: String,
    pub max_uses: u32,
    pub uses: u32,
    pub expires_at: SystemTime,
    pub disabled_at: Option<SystemTime>,
    pub created_by_login_code: String,
    pub created_at: SystemTime,
}

impl AvatarCodeEntity {
    /// Compute the status of the code at `now`.
    pub fn status(&self, now: SystemTime) -> CodeStatus {
        if self.disabled_at.is_some() {
            CodeStatus::Disabled
        } else if self.expires_at <= now {
            CodeStatus::Expired
        } else if self.uses >= self.max_uses {
            CodeStatus::Exhausted
        } else {
            CodeStatus::Active
        }
    }

    /// A code is redeemable while it has uses left, is not expired and not disabled.
    pub fn is_redeemable(&self, now: SystemTime) -> bool {
        self.status(now) == CodeStatus::Active
    }
}

/// Exclusive avatar unlocked by a login through code redemption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvatarGrantEntity {
    pub login_code: String,
    pub avatar: String,
    /// Code that was redeemed, absent for grants made by moderators.
    pub code_id: Option<Uuid>,
    pub created_at: SystemTime,
}
