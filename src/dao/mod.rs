/// Persistence trait for races, participants, logins and avatar codes, with its backends.
pub mod competition_store;
/// Database model definitions.
pub(crate) mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
