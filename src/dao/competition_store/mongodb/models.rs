//! BSON document shapes. Identifiers are stored as hyphenated UUID strings and timestamps
//! as BSON dates; conversions to the storage-agnostic entities live here.

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{
    AvatarCodeEntity, AvatarGrantEntity, AvatarPermissionEntity, FoodType, LoginEntity,
    ParticipantEntity, RaceEntity, TeamName,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRaceDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub food_type: FoodType,
    pub room_code: String,
    pub created_at: DateTime,
    pub ended_at: Option<DateTime>,
    pub is_active: bool,
    #[serde(default)]
    pub is_team_mode: bool,
    #[serde(default)]
    pub vip_participant_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub race_id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub is_vip: bool,
    pub items_eaten: i64,
    #[serde(default)]
    pub team: Option<TeamName>,
    #[serde(default)]
    pub login_code: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoLoginDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub code: String,
    pub password_hash: String,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPermissionDocument {
    pub login_code: String,
    pub avatar: String,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCodeDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub code_hash: String,
    pub code: String,
    pub avatar: String,
    pub max_uses: i64,
    pub uses: i64,
    pub expires_at: DateTime,
    pub disabled_at: Option<DateTime>,
    pub created_by_login_code: String,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGrantDocument {
    pub login_code: String,
    pub avatar: String,
    pub code_id: Option<String>,
    pub created_at: DateTime,
}

fn parse_id(value: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(value).map_err(|source| MongoDaoError::CorruptId {
        value: value.to_owned(),
        source,
    })
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

impl From<RaceEntity> for MongoRaceDocument {
    fn from(value: RaceEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            food_type: value.food_type,
            room_code: value.room_code,
            created_at: DateTime::from_system_time(value.created_at),
            ended_at: value.ended_at.map(DateTime::from_system_time),
            is_active: value.is_active,
            is_team_mode: value.is_team_mode,
            vip_participant_id: value.vip_participant_id.map(|id| id.to_string()),
        }
    }
}

impl TryFrom<MongoRaceDocument> for RaceEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRaceDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            name: value.name,
            food_type: value.food_type,
            room_code: value.room_code,
            created_at: value.created_at.to_system_time(),
            ended_at: value.ended_at.map(DateTime::to_system_time),
            is_active: value.is_active,
            is_team_mode: value.is_team_mode,
            vip_participant_id: value
                .vip_participant_id
                .as_deref()
                .map(parse_id)
                .transpose()?,
        })
    }
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id.to_string(),
            race_id: value.race_id.to_string(),
            name: value.name,
            avatar: value.avatar,
            is_vip: value.is_vip,
            items_eaten: i64::from(value.items_eaten),
            team: value.team,
            login_code: value.login_code,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoParticipantDocument> for ParticipantEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoParticipantDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            race_id: parse_id(&value.race_id)?,
            name: value.name,
            avatar: value.avatar,
            is_vip: value.is_vip,
            items_eaten: to_u32(value.items_eaten),
            team: value.team,
            login_code: value.login_code,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

impl From<LoginEntity> for MongoLoginDocument {
    fn from(value: LoginEntity) -> Self {
        Self {
            id: value.id.to_string(),
            code: value.code,
            password_hash: value.password_hash,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoLoginDocument> for LoginEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoLoginDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            code: value.code,
            password_hash: value.password_hash,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl From<AvatarPermissionEntity> for MongoPermissionDocument {
    fn from(value: AvatarPermissionEntity) -> Self {
        Self {
            login_code: value.login_code,
            avatar: value.avatar,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoPermissionDocument> for AvatarPermissionEntity {
    fn from(value: MongoPermissionDocument) -> Self {
        Self {
            login_code: value.login_code,
            avatar: value.avatar,
            created_at: value.created_at.to_system_time(),
        }
    }
}

impl From<AvatarCodeEntity> for MongoCodeDocument {
    fn from(value: AvatarCodeEntity) -> Self {
        Self {
            id: value.id.to_string(),
            code_hash: value.code_hash,
            code: value.code,
            avatar: value.avatar,
            max_uses: i64::from(value.max_uses),
            uses: i64::from(value.uses),
            expires_at: DateTime::from_system_time(value.expires_at),
            disabled_at: value.disabled_at.map(DateTime::from_system_time),
            created_by_login_code: value.created_by_login_code,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoCodeDocument> for AvatarCodeEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoCodeDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            code_hash: value.code_hash,
            code: value.code,
            avatar: value.avatar,
            max_uses: to_u32(value.max_uses),
            uses: to_u32(value.uses),
            expires_at: value.expires_at.to_system_time(),
            disabled_at: value.disabled_at.map(DateTime::to_system_time),
            created_by_login_code: value.created_by_login_code,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl From<AvatarGrantEntity> for MongoGrantDocument {
    fn from(value: AvatarGrantEntity) -> Self {
        Self {
            login_code: value.login_code,
            avatar: value.avatar,
            code_id: value.code_id.map(|id| id.to_string()),
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoGrantDocument> for AvatarGrantEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGrantDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            login_code: value.login_code,
            avatar: value.avatar,
            code_id: value.code_id.as_deref().map(parse_id).transpose()?,
            created_at: value.created_at.to_system_time(),
        })
    }
}
