/// JWT Authentication Middleware
///
/// Resolves the access token on a request to a stored user and injects it
/// into the request extensions as [`CurrentUser`]. Handlers behind the
/// middleware take it with `web::ReqData<CurrentUser>`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::error::{AppError, AuthError};
use crate::store::UserStore;
use crate::user::PublicUser;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Identity of the caller, secrets already stripped
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

/// Turns a raw access token into a user identity
#[derive(Clone)]
pub struct RequestAuthenticator {
    store: Arc<dyn UserStore>,
    issuer: TokenIssuer,
}

impl RequestAuthenticator {
    pub fn new(store: Arc<dyn UserStore>, issuer: TokenIssuer) -> Self {
        Self { store, issuer }
    }

    /// Expired, malformed and wrongly-signed tokens all fail the same way,
    /// as does a token whose user no longer exists.
    pub async fn authenticate(&self, raw_token: Option<&str>) -> Result<CurrentUser, AppError> {
        let token = raw_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.issuer.verify_access_token(token)?;
        let user = self
            .store
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(CurrentUser(user.to_public()))
    }
}

/// Cookie first, then `Authorization: Bearer <token>`
pub fn extract_access_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Middleware guarding routes that need a logged-in user
pub struct JwtMiddleware {
    authenticator: RequestAuthenticator,
}

impl JwtMiddleware {
    pub fn new(authenticator: RequestAuthenticator) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    authenticator: RequestAuthenticator,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = extract_access_token(&req);
        let authenticator = self.authenticator.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let current_user = authenticator.authenticate(token.as_deref()).await?;

            tracing::debug!(user_id = %current_user.0.id, "Access token validated");
            req.extensions_mut().insert(current_user);

            service.call(req).await
        })
    }
}
