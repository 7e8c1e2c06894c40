/// Authentication module
///
/// Token issuance/verification, password hashing, and the session lifecycle
/// built on top of them.

mod claims;
mod jwt;
mod password;
mod session;

pub use claims::{AccessClaims, RefreshClaims};
pub use jwt::{TokenIssuer, TokenPair};
pub use password::{check_password, hash_password, verify_password};
pub use session::{LoginOutcome, Registration, SessionManager};

#[cfg(test)]
pub(crate) use jwt::test_settings;
