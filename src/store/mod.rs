//! Data access layer.
//!
//! `InventoryStore` is the narrow interface the rest of the crate talks to.
//! It maps application records to store rows and issues plain
//! select/insert/update/delete calls. Callers refetch full collections after
//! each mutation; nothing here caches.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::{
    MissingReport, NewMissingReport, NewRetrievalOrder, NewSession, NewStationeryItem, NewUser,
    RetrievalOrder, StationeryItem, User, UserRecord,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A foreign key rejected the write: the referenced record is missing,
    /// or the record being removed is still referenced
    #[error("foreign key constraint failed")]
    ForeignKey,

    #[error("a record with this identifier already exists")]
    Conflict,

    /// A CHECK constraint rejected the row
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if msg.contains("FOREIGN KEY constraint failed") {
                    StoreError::ForeignKey
                } else if msg.contains("UNIQUE constraint failed") {
                    StoreError::Conflict
                } else if msg.contains("CHECK constraint failed") {
                    StoreError::Constraint(msg.to_string())
                } else {
                    StoreError::Database(err)
                }
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Repository over the four application tables plus sessions.
///
/// Listing order is part of the contract: items by name, orders and missing
/// reports newest first.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    // Stationery items
    async fn list_items(&self) -> Result<Vec<StationeryItem>, StoreError>;
    /// Insert an item and return its generated id
    async fn insert_item(&self, item: &NewStationeryItem) -> Result<String, StoreError>;
    async fn update_available_stock(&self, id: &str, available_stock: i64) -> Result<(), StoreError>;
    async fn delete_item(&self, id: &str) -> Result<(), StoreError>;

    // Retrieval and order requests
    async fn list_orders(&self) -> Result<Vec<RetrievalOrder>, StoreError>;
    async fn insert_order(&self, order: &NewRetrievalOrder) -> Result<String, StoreError>;

    // Missing item reports
    async fn list_missing_reports(&self) -> Result<Vec<MissingReport>, StoreError>;
    async fn insert_missing_report(&self, report: &NewMissingReport) -> Result<String, StoreError>;

    // Users and sessions
    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;
    async fn insert_user(&self, user: &NewUser) -> Result<String, StoreError>;
    async fn insert_session(&self, session: &NewSession) -> Result<(), StoreError>;
    /// Resolve an unexpired session to its user. `now` is an RFC 3339 UTC timestamp.
    async fn find_session_user(&self, token_hash: &str, now: &str) -> Result<Option<User>, StoreError>;
    async fn delete_session(&self, token_hash: &str) -> Result<(), StoreError>;
    /// Drop sessions that expired at or before `now`. Returns how many went.
    async fn purge_expired_sessions(&self, now: &str) -> Result<u64, StoreError>;
}

/// Store-side timestamp in the same shape SQLite's
/// `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` produces, so values sort as text.
pub fn store_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
