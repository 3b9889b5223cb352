use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code reported when a unique index rejects a write.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("schema migration {version} (`{name}`) failed")]
    Migration {
        version: u32,
        name: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("duplicate {entity}")]
    Duplicate {
        entity: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("stored identifier `{value}` is not a UUID")]
    CorruptId {
        value: String,
        #[source]
        source: uuid::Error,
    },
    #[error("failed to {operation} in collection `{collection}`")]
    Query {
        operation: &'static str,
        collection: &'static str,
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Wrap a driver error raised by a query, turning unique index violations into
    /// [`MongoDaoError::Duplicate`].
    pub fn query(
        operation: &'static str,
        collection: &'static str,
        entity: &'static str,
        source: MongoError,
    ) -> Self {
        if is_duplicate_key(&source) {
            MongoDaoError::Duplicate { entity, source }
        } else {
            MongoDaoError::Query {
                operation,
                collection,
                source,
            }
        }
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
