//! In-memory stores
//!
//! Each store keeps its records in insertion order behind one mutex, so the
//! uniqueness check and the insert happen under the same lock.

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CodeStore, UserStore};
use crate::models::{GeneratedCode, NewCode, NewUser, User};

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<Vec<User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.users.lock().await;
        if users.iter().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::UniqueViolation {
                constraint: "users_username_key".to_string(),
            });
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct MemoryCodeStore {
    codes: Arc<Mutex<Vec<GeneratedCode>>>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored codes across all owners
    pub async fn len(&self) -> usize {
        self.codes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn create_code(&self, new_code: NewCode) -> DatabaseResult<GeneratedCode> {
        let code = GeneratedCode {
            id: Uuid::new_v4(),
            source_url: new_code.source_url,
            image_payload: new_code.image_payload.into_inner(),
            owner_id: new_code.owner_id,
            created_at: Utc::now(),
        };
        self.codes.lock().await.push(code.clone());
        Ok(code)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<GeneratedCode>> {
        let codes = self.codes.lock().await;
        Ok(codes.iter().find(|c| c.id == id).cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> DatabaseResult<Vec<GeneratedCode>> {
        let codes = self.codes.lock().await;
        Ok(codes
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut codes = self.codes.lock().await;
        let before = codes.len();
        codes.retain(|c| c.id != id);
        Ok(codes.len() < before)
    }
}
