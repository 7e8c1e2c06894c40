/// JWT Token Issuance and Verification
///
/// `TokenIssuer` owns the signing configuration for the lifetime of the
/// process. Signing is synchronous; nothing here touches I/O.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::TokenSettings;
use crate::error::{AppError, AuthError, ConfigError};
use crate::user::User;

/// Freshly minted access/refresh tokens. Never persisted as a unit.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    settings: TokenSettings,
}

impl TokenIssuer {
    pub fn new(settings: TokenSettings) -> Self {
        Self { settings }
    }

    /// Sign `{id, email, username, fullName}` with the access secret
    ///
    /// # Errors
    /// `ConfigError` if the access secret is unset
    pub fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        let claims = AccessClaims::new(
            user,
            self.settings.access_token_expiry,
            &self.settings.issuer,
        );
        sign(&claims, &self.settings.access_token_secret, "tokens.access_token_secret")
    }

    /// Sign `{id}` with the refresh secret
    ///
    /// # Errors
    /// `ConfigError` if the refresh secret is unset
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, AppError> {
        let claims = RefreshClaims::new(
            user,
            self.settings.refresh_token_expiry,
            &self.settings.issuer,
        );
        sign(&claims, &self.settings.refresh_token_secret, "tokens.refresh_token_secret")
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user)?,
        })
    }

    /// Verify a token against `secret` and decode its claims.
    ///
    /// Every failure (bad signature, malformed, expired, wrong issuer)
    /// collapses into `AuthError::InvalidToken`.
    pub fn verify<C: DeserializeOwned>(&self, token: &str, secret: &str) -> Result<C, AuthError> {
        if secret.is_empty() {
            tracing::error!("Token verification attempted without a configured secret");
            return Err(AuthError::InvalidToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.issuer]);
        // `exp` is a hard cutoff
        validation.leeway = 0;

        decode::<C>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation error: {}", e);
                AuthError::InvalidToken
            })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.verify(token, &self.settings.access_token_secret)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.verify(token, &self.settings.refresh_token_secret)
    }

}

fn sign<C: Serialize>(claims: &C, secret: &str, setting: &str) -> Result<String, AppError> {
    if secret.is_empty() {
        return Err(ConfigError::MissingRequired(setting.to_string()).into());
    }

    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

#[cfg(test)]
pub(crate) fn test_settings() -> TokenSettings {
    TokenSettings {
        access_token_secret: "access-secret-key-at-least-32-characters".to_string(),
        access_token_expiry: 3600,
        refresh_token_secret: "refresh-secret-key-at-least-32-characters".to_string(),
        refresh_token_expiry: 864000,
        issuer: "test".to_string(),
    }
}
