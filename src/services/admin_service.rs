//! Admin session tokens and the moderation operations behind the cookie gate.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AdminConfig,
    dao::models::AvatarPermissionEntity,
    dto::{
        admin::AdminRaceItem,
        feed::{ChangeEvent, ChangeKind},
        room::RaceSummary,
    },
    error::ServiceError,
    services::{
        codes::{constant_time_eq, normalize_code, sha256_hex},
        feed_service, room_service,
    },
    state::SharedState,
};

/// Cookie value an authenticated admin carries: the configured session token, or the
/// SHA-256 hex of the admin password. `None` when no password is configured.
pub fn expected_token(admin: &AdminConfig) -> Option<String> {
    let password = admin.password.as_deref()?;
    Some(
        admin
            .session_token
            .clone()
            .unwrap_or_else(|| sha256_hex(password)),
    )
}

/// Check the submitted password and return the session token to store in the cookie.
pub fn login(admin: &AdminConfig, password: &str) -> Result<String, ServiceError> {
    let Some(expected) = admin.password.as_deref() else {
        warn!("admin login attempted while no admin password is configured");
        return Err(ServiceError::Unauthorized("invalid password".into()));
    };
    if !constant_time_eq(password, expected) {
        warn!("admin login rejected");
        return Err(ServiceError::Unauthorized("invalid password".into()));
    }
    expected_token(admin).ok_or_else(|| ServiceError::Unauthorized("invalid password".into()))
}

/// Whether the cookie value matches the expected session token.
pub fn is_authenticated(admin: &AdminConfig, cookie: Option<&str>) -> bool {
    match (expected_token(admin), cookie) {
        (Some(expected), Some(provided)) => constant_time_eq(provided, &expected),
        _ => false,
    }
}

/// Every race with its participant count, newest first.
pub async fn list_races(state: &SharedState) -> Result<Vec<AdminRaceItem>, ServiceError> {
    let store = state.require_store().await?;
    let races = store.list_races().await?;
    let mut items = Vec::with_capacity(races.len());
    for race in &races {
        let participants = store.list_participants(race.id).await?;
        items.push(AdminRaceItem {
            race: RaceSummary::from(race),
            participants: participants.len() as u32,
        });
    }
    Ok(items)
}

/// End a race on behalf of moderation.
pub async fn end_race(state: &SharedState, room_code: &str) -> Result<RaceSummary, ServiceError> {
    let race = room_service::force_end(state, room_code).await?;
    info!(room_code = %race.room_code, "race ended by moderation");
    Ok(race)
}

/// Remove a participant from its race.
pub async fn remove_participant(
    state: &SharedState,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let participant = store
        .find_participant(participant_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{participant_id}` not found")))?;

    if !store.delete_participant(participant_id).await? {
        return Err(ServiceError::NotFound(format!(
            "participant `{participant_id}` not found"
        )));
    }

    info!(%participant_id, race_id = %participant.race_id, "participant removed by moderation");
    if let Some(race) = store.find_race(participant.race_id).await? {
        feed_service::publish(
            state,
            ChangeEvent::participant(ChangeKind::Delete, &race.room_code, participant_id),
        );
    }
    Ok(())
}

/// Allow a login to mint codes for an exclusive avatar.
pub async fn grant_permission(
    state: &SharedState,
    login_code: &str,
    avatar: &str,
) -> Result<(), ServiceError> {
    let avatar = avatar.trim();
    if !state.config().is_exclusive_avatar(avatar) {
        return Err(ServiceError::InvalidInput(format!(
            "`{avatar}` is not an exclusive avatar"
        )));
    }

    let store = state.require_store().await?;
    let login_code = normalize_code(login_code);
    if store.find_login(login_code.clone()).await?.is_none() {
        return Err(ServiceError::NotFound(format!("login `{login_code}` not found")));
    }

    store
        .upsert_permission(AvatarPermissionEntity {
            login_code: login_code.clone(),
            avatar: avatar.to_owned(),
            created_at: SystemTime::now(),
        })
        .await?;
    info!(%login_code, %avatar, "avatar permission granted");
    Ok(())
}

/// Withdraw a permission; existing codes stay valid.
pub async fn revoke_permission(
    state: &SharedState,
    login_code: &str,
    avatar: &str,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let login_code = normalize_code(login_code);
    let avatar = avatar.trim().to_owned();
    if !store
        .delete_permission(login_code.clone(), avatar.clone())
        .await?
    {
        return Err(ServiceError::NotFound(format!(
            "`{login_code}` holds no permission for `{avatar}`"
        )));
    }
    info!(%login_code, %avatar, "avatar permission revoked");
    Ok(())
}
