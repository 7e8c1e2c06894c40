use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{MediaSlot, UserStore};
use crate::error::StoreError;
use crate::user::User;

/// `UserStore` kept in process memory. Used by the test suites and for
/// running the server without a database.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Uuid, User>>, StoreError> {
        self.users
            .read()
            .map_err(|_| StoreError::ConnectionPool("user map lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, User>>, StoreError> {
        self.users
            .write()
            .map_err(|_| StoreError::ConnectionPool("user map lock poisoned".to_string()))
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .values()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.write()?;

        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation("username".to_string()));
        }
        if email_taken(&users, &user.email, None) {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), StoreError> {
        if let Some(user) = self.write()?.get_mut(&id) {
            user.refresh_token = token.map(str::to_string);
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut users = self.write()?;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;

        user.replace_password_hash(password_hash);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<User, StoreError> {
        let mut users = self.write()?;

        if email_taken(&users, email, Some(id)) {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }

        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.full_name = full_name.to_string();
        user.email = email.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_media(
        &self,
        id: Uuid,
        slot: MediaSlot,
        url: &str,
    ) -> Result<User, StoreError> {
        let mut users = self.write()?;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;

        match slot {
            MediaSlot::Avatar => user.avatar = url.to_string(),
            MediaSlot::CoverImage => user.cover_image = Some(url.to_string()),
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}
