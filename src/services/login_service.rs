use std::time::SystemTime;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::LoginEntity,
    dto::login::{AuthenticateResponse, HistoryEntry, HistoryResponse, LoginCredentials, LoginSummary},
    error::ServiceError,
    services::codes::normalize_code,
    state::SharedState,
};

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let mut salt = [0u8; 16];
    rand::rng().fill(&mut salt);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|err| ServiceError::Internal(format!("salt encoding failed: {err}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Internal(format!("password hashing failed: {err}")))
}

fn verify_password(password: &str, stored: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|err| ServiceError::Internal(format!("stored password hash is invalid: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Run an argon2 computation off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ServiceError::Internal(format!("password task failed: {err}")))?
}

/// Create a login; the username is stored uppercase.
pub async fn register(
    state: &SharedState,
    credentials: LoginCredentials,
) -> Result<LoginSummary, ServiceError> {
    credentials.validate()?;
    let store = state.require_store().await?;

    let code = normalize_code(&credentials.code);
    let password = credentials.password;
    let password_hash = blocking(move || hash_password(&password)).await?;

    let login = LoginEntity {
        id: Uuid::new_v4(),
        code,
        password_hash,
        created_at: SystemTime::now(),
    };

    match store.insert_login(login.clone()).await {
        Ok(()) => {
            info!(login_code = %login.code, "login registered");
            Ok(LoginSummary::from(&login))
        }
        Err(err) if err.is_duplicate() => Err(ServiceError::Conflict(format!(
            "login `{}` already exists",
            login.code
        ))),
        Err(err) => Err(err.into()),
    }
}

/// Check a username and password pair.
pub async fn authenticate(
    state: &SharedState,
    credentials: LoginCredentials,
) -> Result<AuthenticateResponse, ServiceError> {
    let store = state.require_store().await?;
    let code = normalize_code(&credentials.code);

    let Some(login) = store.find_login(code.clone()).await? else {
        debug!(login_code = %code, "authentication for unknown login");
        return Err(ServiceError::Unauthorized("invalid credentials".into()));
    };

    let password = credentials.password;
    let stored = login.password_hash;
    let valid = blocking(move || verify_password(&password, &stored)).await?;
    if !valid {
        return Err(ServiceError::Unauthorized("invalid credentials".into()));
    }

    Ok(AuthenticateResponse {
        authenticated: true,
        code: login.code,
    })
}

/// Races a login took part in, newest first.
pub async fn history(state: &SharedState, code: &str) -> Result<HistoryResponse, ServiceError> {
    let store = state.require_store().await?;
    let code = normalize_code(code);
    if store.find_login(code.clone()).await?.is_none() {
        return Err(ServiceError::NotFound(format!("login `{code}` not found")));
    }

    let participants = store.list_participants_by_login(code.clone()).await?;
    let mut races = Vec::with_capacity(participants.len());
    for participant in &participants {
        // Moderation may have removed the race's rows independently; skip orphans.
        if let Some(race) = store.find_race(participant.race_id).await? {
            races.push(HistoryEntry::new(&race, participant));
        }
    }

    Ok(HistoryResponse { code, races })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{competition_store::memory::MemoryCompetitionStore, models::FoodType},
        dto::room::{CreateRoomRequest, JoinRoomRequest},
        services::room_service,
        state::AppState,
    };

    fn credentials(code: &str, password: &str) -> LoginCredentials {
        LoginCredentials {
            code: code.into(),
            password: password.into(),
        }
    }

    fn state() -> SharedState {
        AppState::with_store(AppConfig::default(), Arc::new(MemoryCompetitionStore::new()))
    }

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("hunter22").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash).expect("verify"));
        assert!(!verify_password("hunter23", &hash).expect("verify"));
    }

    #[tokio::test]
    async fn register_normalizes_and_rejects_duplicates() {
        let state = state();
        let login = register(&state, credentials("chef_01", "secret1"))
            .await
            .expect("register");
        assert_eq!(login.code, "CHEF_01");

        let err = register(&state, credentials("CHEF_01", "secret2"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_validates_inputs() {
        let state = state();
        let err = register(&state, credentials("ab", "secret1"))
            .await
            .expect_err("short code");
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let err = register(&state, credentials("chef", "12345"))
            .await
            .expect_err("short password");
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn authenticate_checks_the_password() {
        let state = state();
        register(&state, credentials("chef", "secret1"))
            .await
            .expect("register");

        let ok = authenticate(&state, credentials("Chef", "secret1"))
            .await
            .expect("authenticate");
        assert!(ok.authenticated);
        assert_eq!(ok.code, "CHEF");

        let err = authenticate(&state, credentials("chef", "wrong!!"))
            .await
            .expect_err("wrong password");
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        let err = authenticate(&state, credentials("ghost", "secret1"))
            .await
            .expect_err("unknown login");
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn history_lists_joined_races() {
        let state = state();
        register(&state, credentials("chef", "secret1"))
            .await
            .expect("register");
        let race = room_service::create_room(
            &state,
            CreateRoomRequest {
                name: "Sushi Sunday".into(),
                food_type: FoodType::Sushi,
                is_team_mode: false,
            },
        )
        .await
        .expect("room");
        room_service::join_room(
            &state,
            &race.room_code,
            JoinRoomRequest {
                name: "Chef".into(),
                login_code: Some("chef".into()),
                ..JoinRoomRequest::default()
            },
        )
        .await
        .expect("join");

        let history = history(&state, "CHEF").await.expect("history");
        assert_eq!(history.races.len(), 1);
        assert_eq!(history.races[0].room_code, race.room_code);
        assert!(history.races[0].is_active);
    }
}
