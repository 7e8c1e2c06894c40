/// Credential store
///
/// Persistence for user records behind a narrow trait. Every mutation is a
/// single atomic write; concurrent writers to the same user resolve as
/// last-write-wins.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::user::User;

pub use memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;

/// Which hosted image on the profile to replace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSlot {
    Avatar,
    CoverImage,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// `email` must already be normalised
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// First user whose username OR email matches
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Fails with `UniqueViolation` if the username or email is taken
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// Overwrite (or clear, with `None`) the stored refresh token. Writes
    /// nothing else and succeeds even if the user no longer exists.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), StoreError>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;

    async fn update_profile(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<User, StoreError>;

    async fn update_media(&self, id: Uuid, slot: MediaSlot, url: &str)
        -> Result<User, StoreError>;
}
