use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
    options::ReturnDocument,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    migrations,
    models::{
        MongoCodeDocument, MongoGrantDocument, MongoLoginDocument, MongoParticipantDocument,
        MongoPermissionDocument, MongoRaceDocument, doc_id,
    },
};
use crate::dao::{
    competition_store::CompetitionStore,
    models::{
        AvatarCodeEntity, AvatarGrantEntity, AvatarPermissionEntity, LoginEntity,
        ParticipantEntity, RaceEntity, TeamName,
    },
    storage::StorageResult,
};

pub(super) const RACE_COLLECTION_NAME: &str = "races";
pub(super) const PARTICIPANT_COLLECTION_NAME: &str = "participants";
pub(super) const LOGIN_COLLECTION_NAME: &str = "logins";
pub(super) const PERMISSION_COLLECTION_NAME: &str = "exclusive_avatar_permissions";
pub(super) const CODE_COLLECTION_NAME: &str = "exclusive_avatar_codes";
pub(super) const GRANT_COLLECTION_NAME: &str = "exclusive_avatar_grants";

/// [`CompetitionStore`] persisted in MongoDB.
#[derive(Clone)]
pub struct MongoCompetitionStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn collect_entities<D, E>(documents: Vec<D>) -> MongoResult<Vec<E>>
where
    E: TryFrom<D, Error = MongoDaoError>,
{
    documents.into_iter().map(E::try_from).collect()
}

impl MongoCompetitionStore {
    /// Establish a connection to MongoDB and bring the schema up to date.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        migrations::run(&database).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn races(&self) -> Collection<MongoRaceDocument> {
        self.collection(RACE_COLLECTION_NAME).await
    }

    async fn participants(&self) -> Collection<MongoParticipantDocument> {
        self.collection(PARTICIPANT_COLLECTION_NAME).await
    }

    async fn logins(&self) -> Collection<MongoLoginDocument> {
        self.collection(LOGIN_COLLECTION_NAME).await
    }

    async fn permissions(&self) -> Collection<MongoPermissionDocument> {
        self.collection(PERMISSION_COLLECTION_NAME).await
    }

    async fn codes(&self) -> Collection<MongoCodeDocument> {
        self.collection(CODE_COLLECTION_NAME).await
    }

    async fn grants(&self) -> Collection<MongoGrantDocument> {
        self.collection(GRANT_COLLECTION_NAME).await
    }

    async fn insert_race(&self, race: RaceEntity) -> MongoResult<()> {
        let document: MongoRaceDocument = race.into();
        self.races()
            .await
            .insert_one(document)
            .await
            .map_err(|source| {
                MongoDaoError::query("insert race", RACE_COLLECTION_NAME, "room code", source)
            })?;
        Ok(())
    }

    async fn find_race_by(&self, filter: mongodb::bson::Document) -> MongoResult<Option<RaceEntity>> {
        self.races()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::query("load race", RACE_COLLECTION_NAME, "race", source))?
            .map(RaceEntity::try_from)
            .transpose()
    }

    async fn list_races(&self) -> MongoResult<Vec<RaceEntity>> {
        let map_err =
            |source| MongoDaoError::query("list races", RACE_COLLECTION_NAME, "race", source);
        let documents: Vec<MongoRaceDocument> = self
            .races()
            .await
            .find(doc! {})
            .sort(doc! {"created_at": -1})
            .await
            .map_err(map_err)?
            .try_collect()
            .await
            .map_err(map_err)?;
        collect_entities(documents)
    }

    async fn end_race(&self, id: Uuid, ended_at: SystemTime) -> MongoResult<Option<RaceEntity>> {
        // Counters are frozen before the race reads as ended, so no increment lands after.
        // Counter updates only match participants whose `race_active` flag is unset.
        self.participants()
            .await
            .update_many(
                doc! {"race_id": id.to_string()},
                doc! {"$set": {"race_active": false}},
            )
            .await
            .map_err(|source| {
                MongoDaoError::query(
                    "freeze counters",
                    PARTICIPANT_COLLECTION_NAME,
                    "participant",
                    source,
                )
            })?;

        let mut filter = doc_id(id);
        filter.insert("is_active", true);

        self.races()
            .await
            .find_one_and_update(
                filter,
                doc! {"$set": {
                    "is_active": false,
                    "ended_at": DateTime::from_system_time(ended_at),
                }},
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::query("end race", RACE_COLLECTION_NAME, "race", source))?
            .map(RaceEntity::try_from)
            .transpose()
    }

    async fn insert_participant(
        &self,
        mut participant: ParticipantEntity,
    ) -> MongoResult<ParticipantEntity> {
        // The row exists before the race points at it, so a failed insert never leaves a
        // dangling VIP behind.
        participant.is_vip = false;
        let document: MongoParticipantDocument = participant.clone().into();
        self.participants()
            .await
            .insert_one(document)
            .await
            .map_err(|source| {
                MongoDaoError::query(
                    "insert participant",
                    PARTICIPANT_COLLECTION_NAME,
                    "participant",
                    source,
                )
            })?;

        // Conditional update on the race elects exactly one VIP under concurrent joins.
        let elected = self
            .races()
            .await
            .update_one(
                doc! {"_id": participant.race_id.to_string(), "vip_participant_id": null},
                doc! {"$set": {"vip_participant_id": participant.id.to_string()}},
            )
            .await
            .map_err(|source| {
                MongoDaoError::query("elect vip", RACE_COLLECTION_NAME, "race", source)
            })?;
        if elected.modified_count == 1 {
            self.participants()
                .await
                .update_one(doc_id(participant.id), doc! {"$set": {"is_vip": true}})
                .await
                .map_err(|source| {
                    MongoDaoError::query(
                        "flag vip",
                        PARTICIPANT_COLLECTION_NAME,
                        "participant",
                        source,
                    )
                })?;
            participant.is_vip = true;
        }
        Ok(participant)
    }

    async fn find_participants(
        &self,
        filter: mongodb::bson::Document,
        sort: mongodb::bson::Document,
    ) -> MongoResult<Vec<ParticipantEntity>> {
        let map_err = |source| {
            MongoDaoError::query(
                "list participants",
                PARTICIPANT_COLLECTION_NAME,
                "participant",
                source,
            )
        };
        let documents: Vec<MongoParticipantDocument> = self
            .participants()
            .await
            .find(filter)
            .sort(sort)
            .await
            .map_err(map_err)?
            .try_collect()
            .await
            .map_err(map_err)?;
        collect_entities(documents)
    }

    async fn find_participant(&self, id: Uuid) -> MongoResult<Option<ParticipantEntity>> {
        self.participants()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| {
                MongoDaoError::query(
                    "load participant",
                    PARTICIPANT_COLLECTION_NAME,
                    "participant",
                    source,
                )
            })?
            .map(ParticipantEntity::try_from)
            .transpose()
    }

    async fn update_participant(
        &self,
        filter: mongodb::bson::Document,
        update: impl Into<mongodb::options::UpdateModifications>,
    ) -> MongoResult<Option<ParticipantEntity>> {
        self.participants()
            .await
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| {
                MongoDaoError::query(
                    "update participant",
                    PARTICIPANT_COLLECTION_NAME,
                    "participant",
                    source,
                )
            })?
            .map(ParticipantEntity::try_from)
            .transpose()
    }

    async fn adjust_items_eaten(
        &self,
        id: Uuid,
        delta: i32,
        now: SystemTime,
    ) -> MongoResult<Option<ParticipantEntity>> {
        // Aggregation pipeline update: add and clamp in one server-side step.
        let pipeline = vec![doc! {"$set": {
            "items_eaten": {"$max": [0_i64, {"$add": ["$items_eaten", i64::from(delta)]}]},
            "updated_at": DateTime::from_system_time(now),
        }}];
        let mut filter = doc_id(id);
        filter.insert("race_active", doc! {"$ne": false});
        self.update_participant(filter, pipeline).await
    }

    async fn set_avatar(
        &self,
        id: Uuid,
        avatar: Option<String>,
        now: SystemTime,
    ) -> MongoResult<Option<ParticipantEntity>> {
        self.update_participant(
            doc_id(id),
            doc! {"$set": {"avatar": avatar, "updated_at": DateTime::from_system_time(now)}},
        )
        .await
    }

    async fn set_team(
        &self,
        id: Uuid,
        team: Option<TeamName>,
        now: SystemTime,
    ) -> MongoResult<Option<ParticipantEntity>> {
        let team = team.map(TeamName::as_str);
        self.update_participant(
            doc_id(id),
            doc! {"$set": {"team": team, "updated_at": DateTime::from_system_time(now)}},
        )
        .await
    }

    async fn delete_participant(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .participants()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| {
                MongoDaoError::query(
                    "delete participant",
                    PARTICIPANT_COLLECTION_NAME,
                    "participant",
                    source,
                )
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_login(&self, login: LoginEntity) -> MongoResult<()> {
        let document: MongoLoginDocument = login.into();
        self.logins()
            .await
            .insert_one(document)
            .await
            .map_err(|source| {
                MongoDaoError::query("insert login", LOGIN_COLLECTION_NAME, "login", source)
            })?;
        Ok(())
    }

    async fn find_login(&self, code: String) -> MongoResult<Option<LoginEntity>> {
        self.logins()
            .await
            .find_one(doc! {"code": code})
            .await
            .map_err(|source| {
                MongoDaoError::query("load login", LOGIN_COLLECTION_NAME, "login", source)
            })?
            .map(LoginEntity::try_from)
            .transpose()
    }

    async fn upsert_permission(&self, permission: AvatarPermissionEntity) -> MongoResult<()> {
        let document: MongoPermissionDocument = permission.into();
        self.permissions()
            .await
            .update_one(
                doc! {"login_code": document.login_code.as_str(), "avatar": document.avatar.as_str()},
                doc! {"$setOnInsert": {"created_at": document.created_at}},
            )
            .upsert(true)
            .await
            .map_err(|source| {
                MongoDaoError::query(
                    "upsert permission",
                    PERMISSION_COLLECTION_NAME,
                    "permission",
                    source,
                )
            })?;
        Ok(())
    }

    async fn delete_permission(&self, login_code: String, avatar: String) -> MongoResult<bool> {
        let result = self
            .permissions()
            .await
            .delete_one(doc! {"login_code": login_code, "avatar": avatar})
            .await
            .map_err(|source| {
                MongoDaoError::query(
                    "delete permission",
                    PERMISSION_COLLECTION_NAME,
                    "permission",
                    source,
                )
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn list_permissions(&self, login_code: String) -> MongoResult<Vec<AvatarPermissionEntity>> {
        let map_err = |source| {
            MongoDaoError::query(
                "list permissions",
                PERMISSION_COLLECTION_NAME,
                "permission",
                source,
            )
        };
        let documents: Vec<MongoPermissionDocument> = self
            .permissions()
            .await
            .find(doc! {"login_code": login_code})
            .sort(doc! {"avatar": 1})
            .await
            .map_err(map_err)?
            .try_collect()
            .await
            .map_err(map_err)?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert_code(&self, code: AvatarCodeEntity) -> MongoResult<()> {
        let document: MongoCodeDocument = code.into();
        self.codes()
            .await
            .insert_one(document)
            .await
            .map_err(|source| {
                MongoDaoError::query("insert code", CODE_COLLECTION_NAME, "avatar code", source)
            })?;
        Ok(())
    }

    async fn find_code(&self, id: Uuid) -> MongoResult<Option<AvatarCodeEntity>> {
        self.codes()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| {
                MongoDaoError::query("load code", CODE_COLLECTION_NAME, "avatar code", source)
            })?
            .map(AvatarCodeEntity::try_from)
            .transpose()
    }

    async fn list_codes_by_creator(&self, login_code: String) -> MongoResult<Vec<AvatarCodeEntity>> {
        let map_err =
            |source| MongoDaoError::query("list codes", CODE_COLLECTION_NAME, "avatar code", source);
        let documents: Vec<MongoCodeDocument> = self
            .codes()
            .await
            .find(doc! {"created_by_login_code": login_code})
            .sort(doc! {"created_at": -1})
            .await
            .map_err(map_err)?
            .try_collect()
            .await
            .map_err(map_err)?;
        collect_entities(documents)
    }

    async fn disable_code(&self, id: Uuid, now: SystemTime) -> MongoResult<Option<AvatarCodeEntity>> {
        let now = DateTime::from_system_time(now);
        self.codes()
            .await
            .find_one_and_update(
                doc_id(id),
                doc! {"$set": {"disabled_at": now, "expires_at": now}},
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| {
                MongoDaoError::query("disable code", CODE_COLLECTION_NAME, "avatar code", source)
            })?
            .map(AvatarCodeEntity::try_from)
            .transpose()
    }

    async fn redeem_code(
        &self,
        code_hash: String,
        now: SystemTime,
    ) -> MongoResult<Option<AvatarCodeEntity>> {
        // The filter carries every redeemability rule so validation and the increment
        // happen in one document-level atomic operation.
        let filter = doc! {
            "code_hash": code_hash,
            "disabled_at": null,
            "expires_at": {"$gt": DateTime::from_system_time(now)},
            "$expr": {"$lt": ["$uses", "$max_uses"]},
        };

        self.codes()
            .await
            .find_one_and_update(filter, doc! {"$inc": {"uses": 1_i64}})
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| {
                MongoDaoError::query("redeem code", CODE_COLLECTION_NAME, "avatar code", source)
            })?
            .map(AvatarCodeEntity::try_from)
            .transpose()
    }

    async fn release_code_use(&self, id: Uuid) -> MongoResult<()> {
        let mut filter = doc_id(id);
        filter.insert("uses", doc! {"$gt": 0_i64});
        self.codes()
            .await
            .update_one(filter, doc! {"$inc": {"uses": -1_i64}})
            .await
            .map_err(|source| {
                MongoDaoError::query("release code use", CODE_COLLECTION_NAME, "avatar code", source)
            })?;
        Ok(())
    }

    async fn upsert_grant(&self, grant: AvatarGrantEntity) -> MongoResult<()> {
        let document: MongoGrantDocument = grant.into();
        self.grants()
            .await
            .update_one(
                doc! {"login_code": document.login_code.as_str(), "avatar": document.avatar.as_str()},
                doc! {"$setOnInsert": {
                    "code_id": document.code_id.clone(),
                    "created_at": document.created_at,
                }},
            )
            .upsert(true)
            .await
            .map_err(|source| {
                MongoDaoError::query("upsert grant", GRANT_COLLECTION_NAME, "grant", source)
            })?;
        Ok(())
    }

    async fn list_grants(&self, login_code: String) -> MongoResult<Vec<AvatarGrantEntity>> {
        let map_err =
            |source| MongoDaoError::query("list grants", GRANT_COLLECTION_NAME, "grant", source);
        let documents: Vec<MongoGrantDocument> = self
            .grants()
            .await
            .find(doc! {"login_code": login_code})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(map_err)?
            .try_collect()
            .await
            .map_err(map_err)?;
        collect_entities(documents)
    }
}

impl CompetitionStore for MongoCompetitionStore {
    fn insert_race(&self, race: RaceEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_race(race).await.map_err(Into::into) })
    }

    fn find_race_by_code(
        &self,
        room_code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RaceEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_race_by(doc! {"room_code": room_code})
                .await
                .map_err(Into::into)
        })
    }

    fn find_race(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RaceEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_race_by(doc_id(id)).await.map_err(Into::into) })
    }

    fn list_races(&self) -> BoxFuture<'static, StorageResult<Vec<RaceEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_races().await.map_err(Into::into) })
    }

    fn end_race(
        &self,
        id: Uuid,
        ended_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<RaceEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.end_race(id, ended_at).await.map_err(Into::into) })
    }

    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<ParticipantEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_participant(participant)
                .await
                .map_err(Into::into)
        })
    }

    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_participant(id).await.map_err(Into::into) })
    }

    fn list_participants(
        &self,
        race_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_participants(
                    doc! {"race_id": race_id.to_string()},
                    doc! {"items_eaten": -1, "created_at": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn list_participants_by_login(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_participants(doc! {"login_code": login_code}, doc! {"created_at": -1})
                .await
                .map_err(Into::into)
        })
    }

    fn adjust_items_eaten(
        &self,
        id: Uuid,
        delta: i32,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .adjust_items_eaten(id, delta, now)
                .await
                .map_err(Into::into)
        })
    }

    fn set_avatar(
        &self,
        id: Uuid,
        avatar: Option<String>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.set_avatar(id, avatar, now).await.map_err(Into::into) })
    }

    fn set_team(
        &self,
        id: Uuid,
        team: Option<TeamName>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.set_team(id, team, now).await.map_err(Into::into) })
    }

    fn delete_participant(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_participant(id).await.map_err(Into::into) })
    }

    fn insert_login(&self, login: LoginEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_login(login).await.map_err(Into::into) })
    }

    fn find_login(&self, code: String) -> BoxFuture<'static, StorageResult<Option<LoginEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_login(code).await.map_err(Into::into) })
    }

    fn upsert_permission(
        &self,
        permission: AvatarPermissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_permission(permission).await.map_err(Into::into) })
    }

    fn delete_permission(
        &self,
        login_code: String,
        avatar: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_permission(login_code, avatar)
                .await
                .map_err(Into::into)
        })
    }

    fn list_permissions(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AvatarPermissionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_permissions(login_code).await.map_err(Into::into) })
    }

    fn insert_code(&self, code: AvatarCodeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_code(code).await.map_err(Into::into) })
    }

    fn find_code(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AvatarCodeEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_code(id).await.map_err(Into::into) })
    }

    fn list_codes_by_creator(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AvatarCodeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_codes_by_creator(login_code)
                .await
                .map_err(Into::into)
        })
    }

    fn disable_code(
        &self,
        id: Uuid,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<AvatarCodeEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.disable_code(id, now).await.map_err(Into::into) })
    }

    fn redeem_code(
        &self,
        code_hash: String,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<AvatarCodeEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.redeem_code(code_hash, now).await.map_err(Into::into) })
    }

    fn release_code_use(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.release_code_use(id).await.map_err(Into::into) })
    }

    fn upsert_grant(&self, grant: AvatarGrantEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_grant(grant).await.map_err(Into::into) })
    }

    fn list_grants(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AvatarGrantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_grants(login_code).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
