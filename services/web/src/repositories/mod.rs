//! Stores for users and generated codes
//!
//! Services depend on the [`UserStore`] and [`CodeStore`] traits; the
//! PostgreSQL implementations back the running service and the in-memory
//! ones back tests and local development.

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{GeneratedCode, NewCode, NewUser, User};

pub mod code;
pub mod memory;
pub mod user;

pub use code::PgCodeStore;
pub use memory::{MemoryCodeStore, MemoryUserStore};
pub use user::PgUserStore;

/// Identity store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; a taken username yields [`DatabaseError::UniqueViolation`]
    async fn create_user(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;
}

/// Generated code store
///
/// Ownership is not checked here; callers decide who may read or delete.
#[async_trait]
pub trait CodeStore: Send + Sync {
    async fn create_code(&self, new_code: NewCode) -> DatabaseResult<GeneratedCode>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<GeneratedCode>>;

    /// Codes owned by `owner_id`, oldest first
    async fn list_by_owner(&self, owner_id: Uuid) -> DatabaseResult<Vec<GeneratedCode>>;

    /// Remove a code; true if it existed
    async fn delete_by_id(&self, id: Uuid) -> DatabaseResult<bool>;
}

/// Apply the schema migrations bundled with this service
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    info!("Running database migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}
