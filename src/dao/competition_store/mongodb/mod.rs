//! MongoDB backend of the competition store.

/// Connection settings.
pub mod config;
mod connection;
mod error;
mod migrations;
mod models;
/// Store implementation.
pub mod store;

pub use config::MongoConfig;
use error::MongoDaoError;
pub use store::MongoCompetitionStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::Duplicate { entity, .. } => StorageError::Duplicate { entity },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
