/// User Account Routes
///
/// Thin HTTP adapters over [`SessionManager`]. Handlers pull raw fields out
/// of the request, hand them to the session layer and wrap the outcome in
/// the success envelope. Token cookies are set and cleared here.

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{
    cookie::Cookie,
    http::StatusCode,
    web::{self, ReqData},
    HttpRequest, HttpResponse,
};
use serde::{Deserialize, Serialize};

use crate::auth::{Registration, SessionManager, TokenPair};
use crate::error::{AppError, ErrorContext};
use crate::media::StagedFile;
use crate::middleware::{CurrentUser, ACCESS_TOKEN_COOKIE};
use crate::response::{ApiResponse, Empty};
use crate::user::PublicUser;

pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Multipart body of `POST /register`
#[derive(MultipartForm)]
pub struct RegisterForm {
    #[multipart(rename = "fullName")]
    pub full_name: Option<Text<String>>,
    pub email: Option<Text<String>>,
    pub username: Option<Text<String>>,
    pub password: Option<Text<String>>,
    pub avatar: Option<TempFile>,
    #[multipart(rename = "coverImage")]
    pub cover_image: Option<TempFile>,
}

#[derive(MultipartForm)]
pub struct AvatarForm {
    pub avatar: Option<TempFile>,
}

#[derive(MultipartForm)]
pub struct CoverImageForm {
    #[multipart(rename = "coverImage")]
    pub cover_image: Option<TempFile>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// POST /api/v1/users/register
///
/// # Errors
/// - 400: missing or invalid field, missing avatar, media host refused the file
/// - 409: username or email already taken
/// - 503: media host unreachable
pub async fn register(
    MultipartForm(form): MultipartForm<RegisterForm>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let registration = Registration {
        full_name: form.full_name.map(|text| text.0),
        email: form.email.map(|text| text.0),
        username: form.username.map(|text| text.0),
        password: form.password.map(|text| text.0),
        avatar: stage(form.avatar)?,
        cover_image: stage(form.cover_image)?,
    };

    let user = manager.register(registration).await?;

    tracing::info!(
        operation = %context.operation,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(ApiResponse::new(StatusCode::CREATED, user, "User registered Successfully").respond())
}

/// POST /api/v1/users/login
///
/// Any credential failure answers 401 "Incorrect credentials", whether the
/// email is unknown or the password is wrong.
pub async fn login(
    form: web::Json<LoginRequest>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let form = form.into_inner();

    let outcome = manager
        .login(form.email.as_deref(), form.password.as_deref())
        .await?;

    tracing::info!(
        operation = %context.operation,
        user_id = %outcome.user.id,
        "User logged in successfully"
    );

    let body = ApiResponse::ok(
        LoginData {
            user: outcome.user,
            access_token: outcome.tokens.access_token.clone(),
            refresh_token: outcome.tokens.refresh_token.clone(),
        },
        "User logged In Successfully",
    );

    Ok(with_token_cookies(&body, &outcome.tokens).json(body))
}

/// POST /api/v1/users/logout
pub async fn logout(
    user: ReqData<CurrentUser>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_logout").with_user_id(user.0.id);

    manager.logout(user.0.id).await?;

    tracing::info!(
        operation = %context.operation,
        user_id = ?context.user_id,
        "User logged out"
    );

    let body = ApiResponse::ok(Empty {}, "User logged Out");
    Ok(body
        .builder()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
        .json(body))
}

/// POST /api/v1/users/refresh-token
///
/// The refresh token is read from the `refreshToken` cookie, falling back to
/// a `refreshToken` field in a JSON body.
///
/// # Errors
/// - 401 "Unauthorized request": no token presented
/// - 401 "Invalid refresh token": bad signature, malformed, expired, or the
///   user no longer exists
/// - 401 "Refresh token is expired or used": superseded by a newer token
pub async fn refresh_access_token(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let presented = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| body.and_then(|json| json.into_inner().refresh_token));

    let tokens = manager.refresh(presented.as_deref()).await?;

    tracing::info!(operation = %context.operation, "Access token refreshed");

    let body = ApiResponse::ok(
        TokenData {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
        },
        "Access token refreshed",
    );

    Ok(with_token_cookies(&body, &tokens).json(body))
}

/// POST /api/v1/users/change-password
///
/// # Errors
/// - 400 "Invalid old password": old password did not match, nothing changed
pub async fn change_password(
    user: ReqData<CurrentUser>,
    form: web::Json<ChangePasswordRequest>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("change_password").with_user_id(user.0.id);
    let form = form.into_inner();

    manager
        .change_password(
            user.0.id,
            form.old_password.as_deref(),
            form.new_password.as_deref(),
        )
        .await?;

    tracing::info!(
        operation = %context.operation,
        user_id = ?context.user_id,
        "Password changed"
    );

    Ok(ApiResponse::ok(Empty {}, "Password changed successfully").respond())
}

/// GET /api/v1/users/current-user
pub async fn current_user(user: ReqData<CurrentUser>) -> HttpResponse {
    let CurrentUser(user) = user.into_inner();
    ApiResponse::ok(user, "Current user fetched successfully").respond()
}

/// PATCH /api/v1/users/update-account
pub async fn update_account(
    user: ReqData<CurrentUser>,
    form: web::Json<UpdateAccountRequest>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("update_account").with_user_id(user.0.id);
    let form = form.into_inner();

    let updated = manager
        .update_profile(user.0.id, form.full_name.as_deref(), form.email.as_deref())
        .await?;

    tracing::info!(
        operation = %context.operation,
        user_id = ?context.user_id,
        "Account details updated"
    );

    Ok(ApiResponse::ok(updated, "Account details updated successfully").respond())
}

/// PATCH /api/v1/users/avatar
pub async fn update_avatar(
    user: ReqData<CurrentUser>,
    MultipartForm(form): MultipartForm<AvatarForm>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("update_avatar").with_user_id(user.0.id);

    let updated = manager.update_avatar(user.0.id, stage(form.avatar)?).await?;

    tracing::info!(
        operation = %context.operation,
        user_id = ?context.user_id,
        "Avatar updated"
    );

    Ok(ApiResponse::ok(updated, "Avatar image updated successfully").respond())
}

/// PATCH /api/v1/users/cover-image
pub async fn update_cover_image(
    user: ReqData<CurrentUser>,
    MultipartForm(form): MultipartForm<CoverImageForm>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("update_cover_image").with_user_id(user.0.id);

    let updated = manager
        .update_cover_image(user.0.id, stage(form.cover_image)?)
        .await?;

    tracing::info!(
        operation = %context.operation,
        user_id = ?context.user_id,
        "Cover image updated"
    );

    Ok(ApiResponse::ok(updated, "Cover image updated successfully").respond())
}

/// Take ownership of an uploaded part. Empty parts count as absent.
fn stage(upload: Option<TempFile>) -> Result<Option<StagedFile>, AppError> {
    let upload = match upload {
        Some(upload) if upload.size > 0 => upload,
        _ => return Ok(None),
    };

    let path = upload
        .file
        .into_temp_path()
        .keep()
        .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;

    Ok(Some(StagedFile::new(path, upload.file_name)))
}

fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .http_only(true)
        .secure(true)
        .path("/")
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = token_cookie(name, String::new());
    cookie.make_removal();
    cookie
}

fn with_token_cookies<T: Serialize>(
    body: &ApiResponse<T>,
    tokens: &TokenPair,
) -> actix_web::HttpResponseBuilder {
    let mut builder = body.builder();
    builder
        .cookie(token_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
        .cookie(token_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()));
    builder
}
