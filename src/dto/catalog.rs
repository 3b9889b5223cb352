use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    config::Locale,
    dao::models::{FoodType, TeamName},
};

/// Static choices offered by the room frontends.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogResponse {
    pub avatars: Vec<String>,
    pub exclusive_avatars: Vec<String>,
    pub foods: Vec<FoodType>,
    pub teams: Vec<TeamName>,
    pub locale: Locale,
}
