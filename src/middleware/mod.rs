/// Middleware module
///
/// Custom middleware for authentication.

mod jwt_middleware;

pub use jwt_middleware::{
    extract_access_token, CurrentUser, JwtMiddleware, RequestAuthenticator, ACCESS_TOKEN_COOKIE,
};
