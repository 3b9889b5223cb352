//! Business logic of the room REST routes: creating and joining rooms, counting,
//! avatar and team changes, ending a race and assembling room snapshots.
//!
//! Every successful write publishes a change event on the room feed so subscribed
//! clients reload.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{
        competition_store::CompetitionStore,
        models::{ParticipantEntity, RaceEntity, TeamName},
    },
    dto::{
        feed::{ChangeEvent, ChangeKind},
        room::{
            CreateRoomRequest, JoinRoomRequest, ParticipantSummary, RaceSummary, RoomSnapshot,
            RoomView, TeamStanding,
        },
    },
    error::ServiceError,
    services::{
        codes::{generate_room_code, normalize_code},
        feed_service,
    },
    state::SharedState,
};

/// Attempts at drawing a unique room code before giving up.
const MAX_ROOM_CODE_ATTEMPTS: usize = 10;

/// Look up a race by its normalized room code.
pub async fn find_race(
    store: &dyn CompetitionStore,
    room_code: &str,
) -> Result<RaceEntity, ServiceError> {
    store
        .find_race_by_code(room_code.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_code}` not found")))
}

/// Load a participant and check that it belongs to `race`.
async fn find_participant_in(
    store: &dyn CompetitionStore,
    race: &RaceEntity,
    participant_id: Uuid,
) -> Result<ParticipantEntity, ServiceError> {
    store
        .find_participant(participant_id)
        .await?
        .filter(|participant| participant.race_id == race.id)
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "participant `{participant_id}` not found in room `{}`",
                race.room_code
            ))
        })
}

fn ensure_active(race: &RaceEntity) -> Result<(), ServiceError> {
    if race.is_active {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "race in room `{}` has ended",
            race.room_code
        )))
    }
}

/// Check that `avatar` exists and, when ownership is enforced, that exclusive avatars
/// were unlocked by the participant's login.
async fn check_avatar(
    state: &SharedState,
    store: &dyn CompetitionStore,
    avatar: &str,
    login_code: Option<&str>,
) -> Result<(), ServiceError> {
    let config = state.config();
    if config.is_catalog_avatar(avatar) {
        return Ok(());
    }
    if !config.is_exclusive_avatar(avatar) {
        return Err(ServiceError::InvalidInput(format!("unknown avatar `{avatar}`")));
    }
    if !config.enforce_exclusive_avatars() {
        return Ok(());
    }

    let Some(login_code) = login_code else {
        return Err(ServiceError::Forbidden(format!(
            "avatar `{avatar}` requires a login that unlocked it"
        )));
    };
    let unlocked = store
        .list_grants(login_code.to_owned())
        .await?
        .iter()
        .any(|grant| grant.avatar == avatar);
    if unlocked {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "avatar `{avatar}` is not unlocked for `{login_code}`"
        )))
    }
}

/// Create an active race under a freshly drawn room code.
pub async fn create_room(
    state: &SharedState,
    payload: CreateRoomRequest,
) -> Result<RaceSummary, ServiceError> {
    payload.validate()?;
    let store = state.require_store().await?;

    for attempt in 1..=MAX_ROOM_CODE_ATTEMPTS {
        let race = RaceEntity {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_owned(),
            food_type: payload.food_type,
            room_code: generate_room_code(),
            created_at: SystemTime::now(),
            ended_at: None,
            is_active: true,
            is_team_mode: payload.is_team_mode,
            vip_participant_id: None,
        };

        match store.insert_race(race.clone()).await {
            Ok(()) => {
                info!(room_code = %race.room_code, race_id = %race.id, "room created");
                feed_service::publish(
                    state,
                    ChangeEvent::race(ChangeKind::Insert, &race.room_code, race.id),
                );
                return Ok(RaceSummary::from(&race));
            }
            Err(err) if err.is_duplicate() => {
                warn!(attempt, room_code = %race.room_code, "room code collision; drawing again");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::Conflict(
        "could not allocate a unique room code".into(),
    ))
}

/// Assemble the snapshot rendered by a room: ranking, team standings and view.
pub fn build_snapshot(race: &RaceEntity, participants: &[ParticipantEntity]) -> RoomSnapshot {
    let mut ranked: Vec<&ParticipantEntity> = participants.iter().collect();
    ranked.sort_by(|a, b| {
        b.items_eaten
            .cmp(&a.items_eaten)
            .then(a.created_at.cmp(&b.created_at))
    });

    let teams = if race.is_team_mode {
        let mut standings: Vec<TeamStanding> = TeamName::ALL
            .iter()
            .map(|team| {
                let members = ranked
                    .iter()
                    .filter(|participant| participant.team == Some(*team));
                TeamStanding {
                    team: *team,
                    items_eaten: members
                        .clone()
                        .map(|participant| u64::from(participant.items_eaten))
                        .sum(),
                    members: members.count() as u32,
                }
            })
            .collect();
        standings.sort_by(|a, b| b.items_eaten.cmp(&a.items_eaten));
        standings
    } else {
        Vec::new()
    };

    RoomSnapshot {
        race: RaceSummary::from(race),
        participants: ranked.into_iter().map(ParticipantSummary::from).collect(),
        teams,
        view: if race.is_active {
            RoomView::Live
        } else {
            RoomView::HallOfFame
        },
    }
}

/// Load the full state of a room.
pub async fn load_room(state: &SharedState, room_code: &str) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_store().await?;
    let race = find_race(store.as_ref(), &normalize_code(room_code)).await?;
    let participants = store.list_participants(race.id).await?;
    Ok(build_snapshot(&race, &participants))
}

/// Register a participant in an active race. The first participant becomes VIP.
pub async fn join_room(
    state: &SharedState,
    room_code: &str,
    payload: JoinRoomRequest,
) -> Result<ParticipantSummary, ServiceError> {
    payload.validate()?;
    let store = state.require_store().await?;
    let race = find_race(store.as_ref(), &normalize_code(room_code)).await?;
    ensure_active(&race)?;

    let login_code = payload.login_code.as_deref().map(normalize_code);
    if let Some(code) = &login_code {
        if store.find_login(code.clone()).await?.is_none() {
            return Err(ServiceError::InvalidInput(format!("unknown login `{code}`")));
        }
    }

    let avatar = payload
        .avatar
        .map(|avatar| avatar.trim().to_owned())
        .filter(|avatar| !avatar.is_empty());
    if let Some(avatar) = &avatar {
        check_avatar(state, store.as_ref(), avatar, login_code.as_deref()).await?;
    }

    let now = SystemTime::now();
    let participant = ParticipantEntity {
        id: Uuid::new_v4(),
        race_id: race.id,
        name: payload.name.trim().to_owned(),
        avatar,
        is_vip: false,
        items_eaten: 0,
        team: payload.team.filter(|_| race.is_team_mode),
        login_code,
        created_at: now,
        updated_at: now,
    };

    let participant = store.insert_participant(participant).await?;
    info!(
        room_code = %race.room_code,
        participant_id = %participant.id,
        is_vip = participant.is_vip,
        "participant joined"
    );
    feed_service::publish(
        state,
        ChangeEvent::participant(ChangeKind::Insert, &race.room_code, participant.id),
    );
    if participant.is_vip {
        feed_service::publish(
            state,
            ChangeEvent::race(ChangeKind::Update, &race.room_code, race.id),
        );
    }
    Ok(ParticipantSummary::from(&participant))
}

/// Add `delta` to a participant's counter while the race is active.
pub async fn update_count(
    state: &SharedState,
    room_code: &str,
    participant_id: Uuid,
    delta: i32,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_store().await?;
    let race = find_race(store.as_ref(), &normalize_code(room_code)).await?;
    ensure_active(&race)?;
    find_participant_in(store.as_ref(), &race, participant_id).await?;

    let Some(updated) = store
        .adjust_items_eaten(participant_id, delta, SystemTime::now())
        .await?
    else {
        // The race may have ended between the check above and the write.
        let current = store.find_race(race.id).await?;
        if let Some(current) = current {
            ensure_active(&current)?;
        }
        return Err(ServiceError::NotFound(format!(
            "participant `{participant_id}` not found"
        )));
    };

    feed_service::publish(
        state,
        ChangeEvent::participant(ChangeKind::Update, &race.room_code, updated.id),
    );
    Ok(ParticipantSummary::from(&updated))
}

/// Change the avatar of a participant.
pub async fn update_avatar(
    state: &SharedState,
    room_code: &str,
    participant_id: Uuid,
    avatar: &str,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_store().await?;
    let race = find_race(store.as_ref(), &normalize_code(room_code)).await?;
    let participant = find_participant_in(store.as_ref(), &race, participant_id).await?;

    let avatar = avatar.trim();
    check_avatar(
        state,
        store.as_ref(),
        avatar,
        participant.login_code.as_deref(),
    )
    .await?;

    let updated = store
        .set_avatar(participant_id, Some(avatar.to_owned()), SystemTime::now())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{participant_id}` not found")))?;

    feed_service::publish(
        state,
        ChangeEvent::participant(ChangeKind::Update, &race.room_code, updated.id),
    );
    Ok(ParticipantSummary::from(&updated))
}

/// Pick a team in a team-mode race that is still running.
pub async fn choose_team(
    state: &SharedState,
    room_code: &str,
    participant_id: Uuid,
    team: TeamName,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_store().await?;
    let race = find_race(store.as_ref(), &normalize_code(room_code)).await?;
    if !race.is_team_mode {
        return Err(ServiceError::InvalidInput(format!(
            "room `{}` is not in team mode",
            race.room_code
        )));
    }
    ensure_active(&race)?;
    find_participant_in(store.as_ref(), &race, participant_id).await?;

    let updated = store
        .set_team(participant_id, Some(team), SystemTime::now())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{participant_id}` not found")))?;

    feed_service::publish(
        state,
        ChangeEvent::participant(ChangeKind::Update, &race.room_code, updated.id),
    );
    Ok(ParticipantSummary::from(&updated))
}

/// End the race on behalf of its VIP.
pub async fn end_race(
    state: &SharedState,
    room_code: &str,
    participant_id: Uuid,
) -> Result<RaceSummary, ServiceError> {
    let store = state.require_store().await?;
    let race = find_race(store.as_ref(), &normalize_code(room_code)).await?;
    let participant = find_participant_in(store.as_ref(), &race, participant_id).await?;

    let is_vip = race.vip_participant_id == Some(participant.id) || participant.is_vip;
    if !is_vip {
        return Err(ServiceError::Forbidden(
            "only the VIP participant may end the race".into(),
        ));
    }

    finish_race(state, store.as_ref(), race).await
}

/// End a race regardless of who asks. Used by moderation.
pub async fn force_end(state: &SharedState, room_code: &str) -> Result<RaceSummary, ServiceError> {
    let store = state.require_store().await?;
    let race = find_race(store.as_ref(), &normalize_code(room_code)).await?;
    finish_race(state, store.as_ref(), race).await
}

async fn finish_race(
    state: &SharedState,
    store: &dyn CompetitionStore,
    race: RaceEntity,
) -> Result<RaceSummary, ServiceError> {
    let ended = store
        .end_race(race.id, SystemTime::now())
        .await?
        .ok_or_else(|| {
            ServiceError::Conflict(format!("race in room `{}` already ended", race.room_code))
        })?;

    info!(room_code = %ended.room_code, race_id = %ended.id, "race ended");
    feed_service::publish(
        state,
        ChangeEvent::race(ChangeKind::Update, &ended.room_code, ended.id),
    );
    Ok(RaceSummary::from(&ended))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{competition_store::memory::MemoryCompetitionStore, models::FoodType},
        state::AppState,
    };

    fn state_with(config: AppConfig) -> SharedState {
        AppState::with_store(config, Arc::new(MemoryCompetitionStore::new()))
    }

    async fn open_room(state: &SharedState, team_mode: bool) -> RaceSummary {
        create_room(
            state,
            CreateRoomRequest {
                name: "  Pizza Night ".into(),
                food_type: FoodType::Pizza,
                is_team_mode: team_mode,
            },
        )
        .await
        .expect("create room")
    }

    fn join(name: &str) -> JoinRoomRequest {
        JoinRoomRequest {
            name: name.into(),
            ..JoinRoomRequest::default()
        }
    }

    #[tokio::test]
    async fn create_room_trims_name_and_draws_code() {
        let state = state_with(AppConfig::default());
        let race = open_room(&state, false).await;
        assert_eq!(race.name, "Pizza Night");
        assert_eq!(race.room_code.len(), 5);
        assert!(race.is_active);
    }

    #[tokio::test]
    async fn create_room_rejects_long_names() {
        let state = state_with(AppConfig::default());
        let err = create_room(
            &state,
            CreateRoomRequest {
                name: "x".repeat(41),
                food_type: FoodType::Sushi,
                is_team_mode: false,
            },
        )
        .await
        .expect_err("name too long");
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn room_codes_are_case_insensitive() {
        let state = state_with(AppConfig::default());
        let race = open_room(&state, false).await;
        let snapshot = load_room(&state, &format!(" {} ", race.room_code.to_lowercase()))
            .await
            .expect("load room");
        assert_eq!(snapshot.race.id, race.id);
        assert_eq!(snapshot.view, RoomView::Live);
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let state = state_with(AppConfig::default());
        let err = load_room(&state, "ZZZZZ").await.expect_err("missing room");
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn counter_updates_rank_participants() {
        let state = state_with(AppConfig::default());
        let race = open_room(&state, false).await;
        let ana = join_room(&state, &race.room_code, join("Ana")).await.expect("ana");
        let bia = join_room(&state, &race.room_code, join("Bia")).await.expect("bia");
        assert!(ana.is_vip);
        assert!(!bia.is_vip);

        update_count(&state, &race.room_code, bia.id, 2).await.expect("bia +2");
        let ana_after = update_count(&state, &race.room_code, ana.id, -1)
            .await
            .expect("ana -1");
        assert_eq!(ana_after.items_eaten, 0);

        let snapshot = load_room(&state, &race.room_code).await.expect("load");
        let names: Vec<&str> = snapshot.participants.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Bia", "Ana"]);
    }

    #[tokio::test]
    async fn team_is_ignored_outside_team_mode() {
        let state = state_with(AppConfig::default());
        let race = open_room(&state, false).await;
        let joined = join_room(
            &state,
            &race.room_code,
            JoinRoomRequest {
                team: Some(TeamName::Azul),
                ..join("Ana")
            },
        )
        .await
        .expect("join");
        assert_eq!(joined.team, None);

        let err = choose_team(&state, &race.room_code, joined.id, TeamName::Verde)
            .await
            .expect_err("not team mode");
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn team_standings_sum_members() {
        let state = state_with(AppConfig::default());
        let race = open_room(&state, true).await;
        let ana = join_room(&state, &race.room_code, join("Ana")).await.expect("ana");
        let bia = join_room(&state, &race.room_code, join("Bia")).await.expect("bia");
        choose_team(&state, &race.room_code, ana.id, TeamName::Azul).await.expect("team");
        choose_team(&state, &race.room_code, bia.id, TeamName::Azul).await.expect("team");
        update_count(&state, &race.room_code, ana.id, 2).await.expect("count");
        update_count(&state, &race.room_code, bia.id, 3).await.expect("count");

        let snapshot = load_room(&state, &race.room_code).await.expect("load");
        assert_eq!(snapshot.teams.len(), TeamName::ALL.len());
        assert_eq!(snapshot.teams[0].team, TeamName::Azul);
        assert_eq!(snapshot.teams[0].items_eaten, 5);
        assert_eq!(snapshot.teams[0].members, 2);
    }

    #[tokio::test]
    async fn only_vip_can_end_and_only_once() {
        let state = state_with(AppConfig::default());
        let race = open_room(&state, false).await;
        let vip = join_room(&state, &race.room_code, join("Ana")).await.expect("vip");
        let guest = join_room(&state, &race.room_code, join("Bia")).await.expect("guest");

        let err = end_race(&state, &race.room_code, guest.id)
            .await
            .expect_err("guest cannot end");
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let ended = end_race(&state, &race.room_code, vip.id).await.expect("vip ends");
        assert!(!ended.is_active);
        assert!(ended.ended_at.is_some());

        let err = end_race(&state, &race.room_code, vip.id)
            .await
            .expect_err("already ended");
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = update_count(&state, &race.room_code, vip.id, 1)
            .await
            .expect_err("ended race is frozen");
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let snapshot = load_room(&state, &race.room_code).await.expect("load");
        assert_eq!(snapshot.view, RoomView::HallOfFame);
    }

    #[tokio::test]
    async fn participants_of_other_rooms_are_rejected() {
        let state = state_with(AppConfig::default());
        let first = open_room(&state, false).await;
        let second = open_room(&state, false).await;
        let stranger = join_room(&state, &second.room_code, join("Eve")).await.expect("join");

        let err = update_count(&state, &first.room_code, stranger.id, 1)
            .await
            .expect_err("wrong room");
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_avatars_are_rejected() {
        let state = state_with(AppConfig::default());
        let race = open_room(&state, false).await;
        let ana = join_room(&state, &race.room_code, join("Ana")).await.expect("join");

        let err = update_avatar(&state, &race.room_code, ana.id, "pterodactyl")
            .await
            .expect_err("unknown avatar");
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let updated = update_avatar(&state, &race.room_code, ana.id, "panda")
            .await
            .expect("catalog avatar");
        assert_eq!(updated.avatar.as_deref(), Some("panda"));
    }

    #[tokio::test]
    async fn exclusive_avatars_are_trusted_unless_enforced() {
        let relaxed = state_with(AppConfig::default());
        let race = open_room(&relaxed, false).await;
        let ana = join_room(&relaxed, &race.room_code, join("Ana")).await.expect("join");
        update_avatar(&relaxed, &race.room_code, ana.id, "dragon")
            .await
            .expect("client-trusted exclusive avatar");

        let strict = state_with(AppConfig::default().with_enforced_exclusive_avatars(true));
        let race = open_room(&strict, false).await;
        let ana = join_room(&strict, &race.room_code, join("Ana")).await.expect("join");
        let err = update_avatar(&strict, &race.room_code, ana.id, "dragon")
            .await
            .expect_err("not unlocked");
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn writes_publish_room_changes() {
        let state = state_with(AppConfig::default());
        let race = open_room(&state, false).await;
        let mut feed = state.feeds().subscribe(&race.room_code);

        let ana = join_room(&state, &race.room_code, join("Ana")).await.expect("join");
        let inserted = tokio::time::timeout(Duration::from_secs(1), feed.recv())
            .await
            .expect("event in time")
            .expect("event");
        assert_eq!(inserted, ChangeEvent::participant(ChangeKind::Insert, &race.room_code, ana.id));
        assert!(inserted.requires_reload());
    }

    #[tokio::test]
    async fn degraded_state_rejects_requests() {
        let state = AppState::new(AppConfig::default());
        let err = load_room(&state, "ABCDE").await.expect_err("degraded");
        assert!(matches!(err, ServiceError::Degraded));
    }
}
