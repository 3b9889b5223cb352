//! Exclusive avatar codes: minting, listing, revealing, disabling and redeeming.
//!
//! Codes are stored under their SHA-256 hash; the plaintext is kept only so the creator
//! can reveal it again. Redemption is a single conditional update in the store.

use std::time::{Duration, SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        competition_store::CompetitionStore,
        models::{AvatarCodeEntity, AvatarGrantEntity, LoginEntity},
    },
    dto::{
        format_system_time,
        promo::{
            AvatarListResponse, ClaimRequest, ClaimResponse, CodeActionRequest, CodeListResponse,
            CodeSummary, CreateCodeRequest, CreatedCodeResponse, PromoStatus, RevealResponse,
            StatusResponse,
        },
    },
    error::PromoError,
    services::codes::{generate_promo_code, normalize_code, sha256_hex},
    state::SharedState,
};

/// Attempts at drawing a promo code whose hash is not taken.
const MAX_PROMO_CODE_ATTEMPTS: usize = 5;
const EXPIRY_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=365;
const MAX_USES_RANGE: std::ops::RangeInclusive<i64> = 1..=1000;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

async fn store(state: &SharedState) -> Result<std::sync::Arc<dyn CompetitionStore>, PromoError> {
    Ok(state.require_store().await?)
}

fn required(value: &str) -> Result<String, PromoError> {
    let normalized = normalize_code(value);
    if normalized.is_empty() {
        Err(PromoError::Invalid)
    } else {
        Ok(normalized)
    }
}

async fn require_login(
    store: &dyn CompetitionStore,
    login_code: &str,
) -> Result<LoginEntity, PromoError> {
    store
        .find_login(login_code.to_owned())
        .await?
        .ok_or(PromoError::UnknownUser)
}

/// Load a code and check that `login_code` created it.
async fn owned_code(
    store: &dyn CompetitionStore,
    login_code: &str,
    code_id: Uuid,
) -> Result<AvatarCodeEntity, PromoError> {
    let code = store.find_code(code_id).await?.ok_or(PromoError::Invalid)?;
    if code.created_by_login_code != login_code {
        warn!(%code_id, login_code, "code accessed by a login that did not create it");
        return Err(PromoError::Forbidden);
    }
    Ok(code)
}

/// Mint a code for an exclusive avatar the login holds a permission for.
pub async fn create_code(
    state: &SharedState,
    payload: CreateCodeRequest,
) -> Result<CreatedCodeResponse, PromoError> {
    let login_code = required(&payload.login_code)?;
    let avatar = payload.avatar.trim().to_owned();
    if avatar.is_empty()
        || !EXPIRY_DAYS_RANGE.contains(&payload.expires_in_days)
        || !MAX_USES_RANGE.contains(&payload.max_uses)
    {
        return Err(PromoError::Invalid);
    }

    let store = store(state).await?;
    require_login(store.as_ref(), &login_code).await?;
    let allowed = store
        .list_permissions(login_code.clone())
        .await?
        .iter()
        .any(|permission| permission.avatar == avatar);
    if !allowed {
        return Err(PromoError::Forbidden);
    }

    let now = SystemTime::now();
    // Ranges were checked above, so both conversions are lossless.
    let lifetime = Duration::from_secs(payload.expires_in_days.unsigned_abs() * SECONDS_PER_DAY);
    let max_uses = payload.max_uses.unsigned_abs() as u32;

    for attempt in 1..=MAX_PROMO_CODE_ATTEMPTS {
        let plaintext = generate_promo_code();
        let code = AvatarCodeEntity {
            id: Uuid::new_v4(),
            code_hash: sha256_hex(&plaintext),
            code: plaintext,
            avatar: avatar.clone(),
            max_uses,
            uses: 0,
            expires_at: now + lifetime,
            disabled_at: None,
            created_by_login_code: login_code.clone(),
            created_at: now,
        };

        match store.insert_code(code.clone()).await {
            Ok(()) => {
                info!(code_id = %code.id, avatar = %code.avatar, login_code, "promo code created");
                return Ok(CreatedCodeResponse {
                    status: PromoStatus::Created,
                    code: code.code,
                    avatar: code.avatar,
                    id: code.id,
                    expires_at: format_system_time(code.expires_at),
                });
            }
            Err(err) if err.is_duplicate() => {
                warn!(attempt, "promo code collision; drawing again");
            }
            Err(err) => return Err(err.into()),
        }
    }

    warn!(%login_code, "could not draw a unique promo code");
    Err(PromoError::Failed)
}

/// Codes created by a login, newest first, without their plaintext.
pub async fn list_codes(
    state: &SharedState,
    login_code: &str,
) -> Result<CodeListResponse, PromoError> {
    let login_code = required(login_code)?;
    let store = store(state).await?;
    require_login(store.as_ref(), &login_code).await?;

    let now = SystemTime::now();
    let codes = store
        .list_codes_by_creator(login_code)
        .await?
        .iter()
        .map(|code| CodeSummary::from_entity(code, now))
        .collect();
    Ok(CodeListResponse { codes })
}

/// Return the plaintext of a code to its creator.
pub async fn reveal_code(
    state: &SharedState,
    payload: CodeActionRequest,
) -> Result<RevealResponse, PromoError> {
    let login_code = required(&payload.login_code)?;
    let store = store(state).await?;
    let code = owned_code(store.as_ref(), &login_code, payload.code_id).await?;
    Ok(RevealResponse {
        status: PromoStatus::Ok,
        code: code.code,
    })
}

/// Stop a code from being redeemed, effective immediately.
pub async fn disable_code(
    state: &SharedState,
    payload: CodeActionRequest,
) -> Result<StatusResponse, PromoError> {
    let login_code = required(&payload.login_code)?;
    let store = store(state).await?;
    owned_code(store.as_ref(), &login_code, payload.code_id).await?;

    store
        .disable_code(payload.code_id, SystemTime::now())
        .await?
        .ok_or(PromoError::Invalid)?;
    info!(code_id = %payload.code_id, login_code, "promo code disabled");
    Ok(StatusResponse {
        status: PromoStatus::Disabled,
    })
}

/// Avatars the login may mint codes for.
pub async fn list_permissions(
    state: &SharedState,
    login_code: &str,
) -> Result<AvatarListResponse, PromoError> {
    let login_code = required(login_code)?;
    let store = store(state).await?;
    let avatars = store
        .list_permissions(login_code)
        .await?
        .into_iter()
        .map(|permission| permission.avatar)
        .collect();
    Ok(AvatarListResponse { avatars })
}

/// Redeem a code for the login and unlock its avatar.
///
/// Unknown logins and unredeemable codes both answer `invalid`; uses are consumed only
/// when the redemption succeeds and the grant is recorded.
pub async fn claim_exclusive_avatar(
    state: &SharedState,
    payload: ClaimRequest,
) -> Result<ClaimResponse, PromoError> {
    let login_code = required(&payload.login_code)?;
    let code = required(&payload.code)?;
    let store = store(state).await?;

    if store.find_login(login_code.clone()).await?.is_none() {
        return Err(PromoError::Invalid);
    }

    let now = SystemTime::now();
    let Some(redeemed) = store.redeem_code(sha256_hex(&code), now).await? else {
        return Err(PromoError::Invalid);
    };

    let granted = store
        .upsert_grant(AvatarGrantEntity {
            login_code: login_code.clone(),
            avatar: redeemed.avatar.clone(),
            code_id: Some(redeemed.id),
            created_at: now,
        })
        .await;
    if let Err(err) = granted {
        // The use only counts once the grant is recorded.
        if let Err(release_err) = store.release_code_use(redeemed.id).await {
            warn!(code_id = %redeemed.id, error = %release_err, "failed to give back code use");
        }
        return Err(err.into());
    }

    info!(
        code_id = %redeemed.id,
        avatar = %redeemed.avatar,
        %login_code,
        uses = redeemed.uses,
        "exclusive avatar claimed"
    );
    Ok(ClaimResponse {
        status: PromoStatus::Ok,
        avatar: redeemed.avatar,
    })
}

/// Avatars unlocked by a login.
pub async fn list_grants(
    state: &SharedState,
    login_code: &str,
) -> Result<AvatarListResponse, PromoError> {
    let login_code = required(login_code)?;
    let store = store(state).await?;
    let avatars = store
        .list_grants(login_code)
        .await?
        .into_iter()
        .map(|grant| grant.avatar)
        .collect();
    Ok(AvatarListResponse { avatars })
}
