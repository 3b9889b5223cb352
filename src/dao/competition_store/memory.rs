//! In-process backend keeping every table behind a single async mutex.
//!
//! Each operation takes the lock once, so read-modify-write sequences are atomic with
//! respect to each other, mirroring the conditional updates of the database backend.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CompetitionStore, clamp_items};
use crate::dao::{
    models::{
        AvatarCodeEntity, AvatarGrantEntity, AvatarPermissionEntity, LoginEntity,
        ParticipantEntity, RaceEntity, TeamName,
    },
    storage::{StorageError, StorageResult},
};

#[derive(Default)]
struct Tables {
    races: HashMap<Uuid, RaceEntity>,
    participants: HashMap<Uuid, ParticipantEntity>,
    logins: HashMap<String, LoginEntity>,
    permissions: Vec<AvatarPermissionEntity>,
    codes: HashMap<Uuid, AvatarCodeEntity>,
    grants: Vec<AvatarGrantEntity>,
}

/// Volatile [`CompetitionStore`] used by tests and local runs.
#[derive(Clone, Default)]
pub struct MemoryCompetitionStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryCompetitionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op` with exclusive access to the tables.
    fn with_tables<T, F>(&self, op: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Tables) -> StorageResult<T> + Send + 'static,
    {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.lock().await;
            op(&mut guard)
        })
    }
}

fn sort_ranking(participants: &mut [ParticipantEntity]) {
    participants.sort_by(|a, b| {
        b.items_eaten
            .cmp(&a.items_eaten)
            .then(a.created_at.cmp(&b.created_at))
    });
}

fn update_participant<F>(
    tables: &mut Tables,
    id: Uuid,
    now: SystemTime,
    mutate: F,
) -> Option<ParticipantEntity>
where
    F: FnOnce(&mut ParticipantEntity),
{
    let participant = tables.participants.get_mut(&id)?;
    mutate(participant);
    participant.updated_at = now;
    Some(participant.clone())
}

impl CompetitionStore for MemoryCompetitionStore {
    fn insert_race(&self, race: RaceEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.with_tables(move |tables| {
            if tables
                .races
                .values()
                .any(|existing| existing.room_code == race.room_code)
            {
                return Err(StorageError::Duplicate { entity: "room code" });
            }
            tables.races.insert(race.id, race);
            Ok(())
        })
    }

    fn find_race_by_code(
        &self,
        room_code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RaceEntity>>> {
        self.with_tables(move |tables| {
            Ok(tables
                .races
                .values()
                .find(|race| race.room_code == room_code)
                .cloned())
        })
    }

    fn find_race(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RaceEntity>>> {
        self.with_tables(move |tables| Ok(tables.races.get(&id).cloned()))
    }

    fn list_races(&self) -> BoxFuture<'static, StorageResult<Vec<RaceEntity>>> {
        self.with_tables(|tables| {
            let mut races = tables.races.values().cloned().collect::<Vec<_>>();
            races.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(races)
        })
    }

    fn end_race(
        &self,
        id: Uuid,
        ended_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<RaceEntity>>> {
        self.with_tables(move |tables| {
            let Some(race) = tables.races.get_mut(&id) else {
                return Ok(None);
            };
            if !race.is_active {
                return Ok(None);
            }
            race.is_active = false;
            race.ended_at = Some(ended_at);
            Ok(Some(race.clone()))
        })
    }

    fn insert_participant(
        &self,
        mut participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<ParticipantEntity>> {
        self.with_tables(move |tables| {
            participant.is_vip = false;
            if let Some(race) = tables.races.get_mut(&participant.race_id) {
                if race.vip_participant_id.is_none() {
                    race.vip_participant_id = Some(participant.id);
                    participant.is_vip = true;
                }
            }
            tables
                .participants
                .insert(participant.id, participant.clone());
            Ok(participant)
        })
    }

    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.with_tables(move |tables| Ok(tables.participants.get(&id).cloned()))
    }

    fn list_participants(
        &self,
        race_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        self.with_tables(move |tables| {
            let mut participants = tables
                .participants
                .values()
                .filter(|participant| participant.race_id == race_id)
                .cloned()
                .collect::<Vec<_>>();
            sort_ranking(&mut participants);
            Ok(participants)
        })
    }

    fn list_participants_by_login(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        self.with_tables(move |tables| {
            let mut participants = tables
                .participants
                .values()
                .filter(|participant| participant.login_code.as_deref() == Some(login_code.as_str()))
                .cloned()
                .collect::<Vec<_>>();
            participants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(participants)
        })
    }

    fn adjust_items_eaten(
        &self,
        id: Uuid,
        delta: i32,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.with_tables(move |tables| {
            let race_active = tables
                .participants
                .get(&id)
                .and_then(|participant| tables.races.get(&participant.race_id))
                .is_some_and(|race| race.is_active);
            if !race_active {
                return Ok(None);
            }
            Ok(update_participant(tables, id, now, |participant| {
                participant.items_eaten = clamp_items(participant.items_eaten, delta);
            }))
        })
    }

    fn set_avatar(
        &self,
        id: Uuid,
        avatar: Option<String>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.with_tables(move |tables| {
            Ok(update_participant(tables, id, now, |participant| {
                participant.avatar = avatar;
            }))
        })
    }

    fn set_team(
        &self,
        id: Uuid,
        team: Option<TeamName>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.with_tables(move |tables| {
            Ok(update_participant(tables, id, now, |participant| {
                participant.team = team;
            }))
        })
    }

    fn delete_participant(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.with_tables(move |tables| Ok(tables.participants.remove(&id).is_some()))
    }

    fn insert_login(&self, login: LoginEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.with_tables(move |tables| {
            if tables.logins.contains_key(&login.code) {
                return Err(StorageError::Duplicate { entity: "login" });
            }
            tables.logins.insert(login.code.clone(), login);
            Ok(())
        })
    }

    fn find_login(&self, code: String) -> BoxFuture<'static, StorageResult<Option<LoginEntity>>> {
        self.with_tables(move |tables| Ok(tables.logins.get(&code).cloned()))
    }

    fn upsert_permission(
        &self,
        permission: AvatarPermissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.with_tables(move |tables| {
            let exists = tables.permissions.iter().any(|existing| {
                existing.login_code == permission.login_code && existing.avatar == permission.avatar
            });
            if !exists {
                tables.permissions.push(permission);
            }
            Ok(())
        })
    }

    fn delete_permission(
        &self,
        login_code: String,
        avatar: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.with_tables(move |tables| {
            let before = tables.permissions.len();
            tables
                .permissions
                .retain(|existing| !(existing.login_code == login_code && existing.avatar == avatar));
            Ok(tables.permissions.len() != before)
        })
    }

    fn list_permissions(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AvatarPermissionEntity>>> {
        self.with_tables(move |tables| {
            Ok(tables
                .permissions
                .iter()
                .filter(|permission| permission.login_code == login_code)
                .cloned()
                .collect())
        })
    }

    fn insert_code(&self, code: AvatarCodeEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.with_tables(move |tables| {
            if tables
                .codes
                .values()
                .any(|existing| existing.code_hash == code.code_hash)
            {
                return Err(StorageError::Duplicate { entity: "avatar code" });
            }
            tables.codes.insert(code.id, code);
            Ok(())
        })
    }

    fn find_code(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AvatarCodeEntity>>> {
        self.with_tables(move |tables| Ok(tables.codes.get(&id).cloned()))
    }

    fn list_codes_by_creator(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AvatarCodeEntity>>> {
        self.with_tables(move |tables| {
            let mut codes = tables
                .codes
                .values()
                .filter(|code| code.created_by_login_code == login_code)
                .cloned()
                .collect::<Vec<_>>();
            codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(codes)
        })
    }

    fn disable_code(
        &self,
        id: Uuid,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<AvatarCodeEntity>>> {
        self.with_tables(move |tables| {
            let Some(code) = tables.codes.get_mut(&id) else {
                return Ok(None);
            };
            code.disabled_at = Some(now);
            code.expires_at = now;
            Ok(Some(code.clone()))
        })
    }

    fn redeem_code(
        &self,
        code_hash: String,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<AvatarCodeEntity>>> {
        self.with_tables(move |tables| {
            let Some(code) = tables
                .codes
                .values_mut()
                .find(|code| code.code_hash == code_hash)
            else {
                return Ok(None);
            };
            if !code.is_redeemable(now) {
                return Ok(None);
            }
            code.uses += 1;
            Ok(Some(code.clone()))
        })
    }

    fn release_code_use(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        self.with_tables(move |tables| {
            if let Some(code) = tables.codes.get_mut(&id) {
                code.uses = code.uses.saturating_sub(1);
            }
            Ok(())
        })
    }

    fn upsert_grant(&self, grant: AvatarGrantEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.with_tables(move |tables| {
            let exists = tables.grants.iter().any(|existing| {
                existing.login_code == grant.login_code && existing.avatar == grant.avatar
            });
            if !exists {
                tables.grants.push(grant);
            }
            Ok(())
        })
    }

    fn list_grants(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AvatarGrantEntity>>> {
        self.with_tables(move |tables| {
            Ok(tables
                .grants
                .iter()
                .filter(|grant| grant.login_code == login_code)
                .cloned()
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
