/// User entity
///
/// The password hash is private: the only ways to put a password on a user
/// are [`User::new`] and [`User::set_password`], and both hash it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    password_hash: String,
    /// The single refresh token currently honoured for this user
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Already-validated registration data
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

impl User {
    pub fn new(new_user: NewUser) -> Result<Self, AppError> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            full_name: new_user.full_name,
            avatar: new_user.avatar,
            cover_image: new_user.cover_image,
            password_hash: hash_password(&new_user.password)?,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the password, re-hashing it
    pub fn set_password(&mut self, password: &str) -> Result<(), AppError> {
        self.password_hash = hash_password(password)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_password_correct(&self, password: &str) -> Result<bool, AppError> {
        verify_password(password, &self.password_hash)
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Store-side write of a value that was already hashed by `set_password`
    pub(crate) fn replace_password_hash(&mut self, password_hash: &str) {
        self.password_hash = password_hash.to_string();
    }

    /// Strip secrets before the record leaves the core
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User record as clients see it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) fn test_user(username: &str, email: &str) -> User {
    User::new(NewUser {
        username: username.to_string(),
        email: email.to_string(),
        full_name: "Alice A".to_string(),
        password: "secret1".to_string(),
        avatar: "https://media.example.com/avatar.png".to_string(),
        cover_image: None,
    })
    .expect("Failed to build test user")
}
