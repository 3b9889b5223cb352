//! Versioned schema migrations applied once per database at connect time.
//!
//! Applied versions are recorded in the `schema_migrations` collection so every step runs
//! exactly once, and documents written by older releases are upgraded in place instead of
//! being probed for missing fields at write time.

use mongodb::{
    Database, IndexModel,
    bson::{DateTime, Document, doc},
    options::IndexOptions,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    error::{MongoDaoError, MongoResult},
    store::{
        CODE_COLLECTION_NAME, GRANT_COLLECTION_NAME, LOGIN_COLLECTION_NAME,
        PARTICIPANT_COLLECTION_NAME, PERMISSION_COLLECTION_NAME, RACE_COLLECTION_NAME,
    },
};

const MIGRATION_COLLECTION_NAME: &str = "schema_migrations";

#[derive(Debug, Clone, Copy)]
enum Migration {
    CreateIndexes,
    BackfillTeamFields,
    BackfillLoginLinks,
}

impl Migration {
    const ALL: [Migration; 3] = [
        Migration::CreateIndexes,
        Migration::BackfillTeamFields,
        Migration::BackfillLoginLinks,
    ];

    fn version(self) -> u32 {
        match self {
            Migration::CreateIndexes => 1,
            Migration::BackfillTeamFields => 2,
            Migration::BackfillLoginLinks => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Migration::CreateIndexes => "create_indexes",
            Migration::BackfillTeamFields => "backfill_team_fields",
            Migration::BackfillLoginLinks => "backfill_login_links",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MigrationRecord {
    #[serde(rename = "_id")]
    version: u32,
    name: String,
    applied_at: DateTime,
}

/// Apply every migration not yet recorded in the database, in version order.
pub async fn run(database: &Database) -> MongoResult<()> {
    let records = database.collection::<MigrationRecord>(MIGRATION_COLLECTION_NAME);

    for migration in Migration::ALL {
        let version = migration.version();
        let name = migration.name();
        let wrap = |source| MongoDaoError::Migration {
            version,
            name,
            source,
        };

        let applied = records
            .find_one(doc! {"_id": version})
            .await
            .map_err(wrap)?
            .is_some();
        if applied {
            continue;
        }

        apply(database, migration).await?;

        records
            .insert_one(MigrationRecord {
                version,
                name: name.to_owned(),
                applied_at: DateTime::now(),
            })
            .await
            .map_err(wrap)?;
        info!(version, name, "applied schema migration");
    }

    Ok(())
}

async fn apply(database: &Database, migration: Migration) -> MongoResult<()> {
    match migration {
        Migration::CreateIndexes => create_indexes(database).await,
        Migration::BackfillTeamFields => {
            backfill(
                database,
                migration,
                RACE_COLLECTION_NAME,
                doc! {"is_team_mode": {"$exists": false}},
                doc! {"$set": {"is_team_mode": false}},
            )
            .await?;
            backfill(
                database,
                migration,
                PARTICIPANT_COLLECTION_NAME,
                doc! {"team": {"$exists": false}},
                doc! {"$set": {"team": null}},
            )
            .await
        }
        Migration::BackfillLoginLinks => {
            backfill(
                database,
                migration,
                PARTICIPANT_COLLECTION_NAME,
                doc! {"login_code": {"$exists": false}},
                doc! {"$set": {"login_code": null}},
            )
            .await?;
            backfill(
                database,
                migration,
                RACE_COLLECTION_NAME,
                doc! {"vip_participant_id": {"$exists": false}},
                doc! {"$set": {"vip_participant_id": null}},
            )
            .await
        }
    }
}

async fn backfill(
    database: &Database,
    migration: Migration,
    collection: &'static str,
    filter: Document,
    update: Document,
) -> MongoResult<()> {
    database
        .collection::<Document>(collection)
        .update_many(filter, update)
        .await
        .map_err(|source| MongoDaoError::Migration {
            version: migration.version(),
            name: migration.name(),
            source,
        })?;
    Ok(())
}

struct IndexSpec {
    collection: &'static str,
    name: &'static str,
    keys: Document,
    unique: bool,
}

async fn create_indexes(database: &Database) -> MongoResult<()> {
    let specs = [
        IndexSpec {
            collection: RACE_COLLECTION_NAME,
            name: "race_room_code_idx",
            keys: doc! {"room_code": 1},
            unique: true,
        },
        IndexSpec {
            collection: PARTICIPANT_COLLECTION_NAME,
            name: "participant_ranking_idx",
            keys: doc! {"race_id": 1, "items_eaten": -1, "created_at": 1},
            unique: false,
        },
        IndexSpec {
            collection: PARTICIPANT_COLLECTION_NAME,
            name: "participant_login_idx",
            keys: doc! {"login_code": 1},
            unique: false,
        },
        IndexSpec {
            collection: LOGIN_COLLECTION_NAME,
            name: "login_code_idx",
            keys: doc! {"code": 1},
            unique: true,
        },
        IndexSpec {
            collection: PERMISSION_COLLECTION_NAME,
            name: "permission_login_avatar_idx",
            keys: doc! {"login_code": 1, "avatar": 1},
            unique: true,
        },
        IndexSpec {
            collection: CODE_COLLECTION_NAME,
            name: "code_hash_idx",
            keys: doc! {"code_hash": 1},
            unique: true,
        },
        IndexSpec {
            collection: CODE_COLLECTION_NAME,
            name: "code_creator_idx",
            keys: doc! {"created_by_login_code": 1, "created_at": -1},
            unique: false,
        },
        IndexSpec {
            collection: GRANT_COLLECTION_NAME,
            name: "grant_login_avatar_idx",
            keys: doc! {"login_code": 1, "avatar": 1},
            unique: true,
        },
    ];

    for spec in specs {
        let index = IndexModel::builder()
            .keys(spec.keys)
            .options(
                IndexOptions::builder()
                    .name(Some(spec.name.to_owned()))
                    .unique(Some(spec.unique))
                    .build(),
            )
            .build();

        database
            .collection::<Document>(spec.collection)
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: spec.collection,
                index: spec.name,
                source,
            })?;
    }

    Ok(())
}
