use crate::{
    dao::models::{FoodType, TeamName},
    dto::catalog::CatalogResponse,
    state::SharedState,
};

/// Avatars, foods, teams and locale configured for the frontends.
pub fn catalog(state: &SharedState) -> CatalogResponse {
    let config = state.config();
    CatalogResponse {
        avatars: config.avatars().to_vec(),
        exclusive_avatars: config.exclusive_avatars().to_vec(),
        foods: FoodType::ALL.to_vec(),
        teams: TeamName::ALL.to_vec(),
        locale: config.locale(),
    }
}
