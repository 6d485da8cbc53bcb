//! In-memory user store backing the `/users` endpoints.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(u64),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

/// Request body for create and update. The id always comes from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl NewUser {
    pub fn new(username: &str, email: &str, full_name: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            full_name: Some(full_name.to_string()),
        }
    }

    fn into_user(self, id: u64) -> Result<User, UserError> {
        let username = self.username.filter(|s| !s.trim().is_empty());
        let email = self.email.filter(|s| !s.trim().is_empty());
        match (username, email) {
            (Some(username), Some(email)) => Ok(User {
                id,
                username,
                email,
                full_name: self.full_name,
            }),
            _ => Err(UserError::Invalid(
                "Username and email are required".to_string(),
            )),
        }
    }
}

/// Thread-safe user map with sequential ids starting at 1.
#[derive(Clone, Default)]
pub struct UserStore {
    users: Arc<RwLock<HashMap<u64, User>>>,
    next_id: Arc<AtomicU64>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the three demo users.
    pub async fn seeded() -> Self {
        let store = Self::new();
        for user in [
            NewUser::new("john_doe", "john@example.com", "John Doe"),
            NewUser::new("jane_smith", "jane@example.com", "Jane Smith"),
            NewUser::new("bob_wilson", "bob@example.com", "Bob Wilson"),
        ] {
            // seed data is always valid
            let _ = store.create(user).await;
        }
        store
    }

    /// All users, ordered by id.
    pub async fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        users
    }

    pub async fn get(&self, id: u64) -> Result<User, UserError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(UserError::NotFound(id))
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, UserError> {
        // Validate before taking an id so rejected requests leave no gaps.
        let user = new_user.into_user(0)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User { id, ..user };
        self.users.write().await.insert(id, user.clone());
        debug!(user_id = id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: u64, new_user: NewUser) -> Result<User, UserError> {
        let user = new_user.into_user(id)?;
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(user)
            }
            None => Err(UserError::NotFound(id)),
        }
    }

    pub async fn delete(&self, id: u64) -> Result<(), UserError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(UserError::NotFound(id))
    }

    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        self.list().await.into_iter().find(|u| u.username == username)
    }
}
