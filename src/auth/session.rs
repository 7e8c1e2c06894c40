/// Session Lifecycle
///
/// `SessionManager` is the only component that mutates a user's session
/// state. Per user: Anonymous -> Authenticated (login) -> Authenticated with
/// a rotated refresh token (refresh) -> Revoked (logout).
///
/// The store holds exactly one honoured refresh token per user. Login and
/// refresh overwrite it and logout clears it, so a refresh token stops
/// working the moment a newer one is issued, even if it has not expired.

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::jwt::{TokenIssuer, TokenPair};
use crate::auth::password::{check_password, verify_against_dummy};
use crate::error::{AppError, AuthError, StoreError, ValidationError};
use crate::media::{self, MediaHost, StagedFile};
use crate::store::{MediaSlot, UserStore};
use crate::user::{NewUser, PublicUser, User};
use crate::validators::{is_valid_email, is_valid_full_name, is_valid_username, require};

/// Raw registration input; nothing here has been validated yet
#[derive(Debug, Default)]
pub struct Registration {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<StagedFile>,
    pub cover_image: Option<StagedFile>,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

pub struct SessionManager {
    store: Arc<dyn UserStore>,
    media: Arc<dyn MediaHost>,
    issuer: TokenIssuer,
}

impl SessionManager {
    pub fn new(store: Arc<dyn UserStore>, media: Arc<dyn MediaHost>, issuer: TokenIssuer) -> Self {
        Self { store, media, issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Create an account. Uniqueness is checked before any file is uploaded.
    pub async fn register(&self, registration: Registration) -> Result<PublicUser, AppError> {
        let Registration {
            full_name,
            email,
            username,
            password,
            avatar,
            cover_image,
        } = registration;

        let full_name = is_valid_full_name(&require("fullName", full_name.as_deref())?)?;
        let email = is_valid_email(&require("email", email.as_deref())?)?;
        let username = is_valid_username(&require("username", username.as_deref())?)?;
        let password = require("password", password.as_deref())?;
        check_password(&password)?;

        if let Some(existing) = self
            .store
            .find_by_username_or_email(&username, &email)
            .await?
        {
            let field = if existing.username == username { "username" } else { "email" };
            return Err(StoreError::UniqueViolation(field.to_string()).into());
        }

        let avatar = avatar.ok_or_else(|| ValidationError::MissingFile("Avatar".to_string()))?;
        let avatar = media::publish(self.media.as_ref(), avatar).await?;
        let cover_image = match cover_image {
            Some(file) => Some(media::publish(self.media.as_ref(), file).await?),
            None => None,
        };

        let user = User::new(NewUser {
            username,
            email,
            full_name,
            password,
            avatar,
            cover_image,
        })?;
        self.store.insert(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.to_public())
    }

    /// Verify credentials and open a session.
    ///
    /// Empty fields, an unknown email and a wrong password all produce the
    /// same `InvalidCredentials` error.
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<LoginOutcome, AppError> {
        let (email, password) = match (email.map(str::trim), password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                (email.to_lowercase(), password)
            }
            _ => return Err(AuthError::InvalidCredentials.into()),
        };

        let user = match self.store.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                verify_against_dummy(password);
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !user.is_password_correct(password)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.rotate(&user).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            user: user.to_public(),
            tokens,
        })
    }

    /// Revoke the user's refresh token. Safe to call repeatedly.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.store.set_refresh_token(user_id, None).await?;

        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Exchange the current refresh token for a new pair.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair, AppError> {
        let token = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let user_id = self
            .issuer
            .verify_refresh_token(token)
            .and_then(|claims| claims.user_id())
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if user.refresh_token.as_deref() != Some(token) {
            tracing::warn!(user_id = %user.id, "Superseded refresh token presented");
            return Err(AuthError::TokenExpired.into());
        }

        let tokens = self.rotate(&user).await?;

        tracing::info!(user_id = %user.id, "Tokens refreshed");
        Ok(tokens)
    }

    /// Replace the password after checking the old one. Nothing is written
    /// if the old password is wrong.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<(), AppError> {
        let old_password = require("oldPassword", old_password)?;
        let new_password = require("newPassword", new_password)?;

        let mut user = self.load(user_id).await?;

        if !user.is_password_correct(&old_password)? {
            return Err(AuthError::IncorrectPassword.into());
        }

        user.set_password(&new_password)?;
        self.store
            .update_password_hash(user.id, user.password_hash())
            .await
            .map_err(not_found_as_unauthorized)?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Merge `full_name` and/or `email` into the profile
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<PublicUser, AppError> {
        let full_name = full_name.filter(|v| !v.trim().is_empty());
        let email = email.filter(|v| !v.trim().is_empty());
        if full_name.is_none() && email.is_none() {
            return Err(ValidationError::EmptyField("fullName or email".to_string()).into());
        }

        let user = self.load(user_id).await?;

        let full_name = match full_name {
            Some(name) => is_valid_full_name(name)?,
            None => user.full_name.clone(),
        };
        let email = match email {
            Some(email) => is_valid_email(email)?,
            None => user.email.clone(),
        };

        if email != user.email {
            if let Some(other) = self.store.find_by_email(&email).await? {
                if other.id != user.id {
                    return Err(StoreError::UniqueViolation("email".to_string()).into());
                }
            }
        }

        let updated = self
            .store
            .update_profile(user.id, &full_name, &email)
            .await
            .map_err(not_found_as_unauthorized)?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(updated.to_public())
    }

    pub async fn update_avatar(
        &self,
        user_id: Uuid,
        file: Option<StagedFile>,
    ) -> Result<PublicUser, AppError> {
        self.update_media(user_id, MediaSlot::Avatar, file).await
    }

    pub async fn update_cover_image(
        &self,
        user_id: Uuid,
        file: Option<StagedFile>,
    ) -> Result<PublicUser, AppError> {
        self.update_media(user_id, MediaSlot::CoverImage, file).await
    }

    async fn update_media(
        &self,
        user_id: Uuid,
        slot: MediaSlot,
        file: Option<StagedFile>,
    ) -> Result<PublicUser, AppError> {
        let label = match slot {
            MediaSlot::Avatar => "Avatar",
            MediaSlot::CoverImage => "Cover image",
        };
        let file = file.ok_or_else(|| ValidationError::MissingFile(label.to_string()))?;

        let url = media::publish(self.media.as_ref(), file).await?;
        let updated = self
            .store
            .update_media(user_id, slot, &url)
            .await
            .map_err(not_found_as_unauthorized)?;

        tracing::info!(user_id = %user_id, slot = ?slot, "Profile image updated");
        Ok(updated.to_public())
    }

    /// Mint a pair and make its refresh token the only one honoured
    async fn rotate(&self, user: &User) -> Result<TokenPair, AppError> {
        let tokens = self.issuer.issue_pair(user)?;
        self.store
            .set_refresh_token(user.id, Some(&tokens.refresh_token))
            .await?;
        Ok(tokens)
    }

    async fn load(&self, user_id: Uuid) -> Result<User, AppError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or_else(AppError::unauthorized)
    }
}

/// A user vanishing mid-request must not tell the caller which ids exist
fn not_found_as_unauthorized(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => AppError::unauthorized(),
        other => other.into(),
    }
}
