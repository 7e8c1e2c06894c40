/// Error Handling Module
///
/// Every fallible operation in the crate returns one of the domain errors
/// below, which all fold into [`AppError`]. `AppError` implements actix
/// `ResponseError`, so the HTTP boundary is the only place an error becomes
/// a response envelope:
///
/// ```json
/// { "statusCode": 401, "message": "Incorrect credentials", "success": false, "errors": [] }
/// ```

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
    MissingFile(String),
    MalformedBody(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::MissingFile(field) => write!(f, "{} file is missing", field),
            ValidationError::MalformedBody(msg) => write!(f, "Malformed request body: {}", msg),
        }
    }
}

impl StdError for ValidationError {}

/// Credential store errors
#[derive(Debug)]
pub enum StoreError {
    /// Carries the name of the field that collided (`username` or `email`)
    UniqueViolation(String),
    NotFound,
    QueryExecution(String),
    ConnectionPool(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UniqueViolation(field) => {
                write!(f, "User with this {} already exists", field)
            }
            StoreError::NotFound => write!(f, "User not found"),
            StoreError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            StoreError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                let field = match db_err.constraint() {
                    Some(constraint) if constraint.contains("username") => "username",
                    _ => "email",
                };
                StoreError::UniqueViolation(field.to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::ConnectionPool(err.to_string())
            }
            _ => StoreError::QueryExecution(err.to_string()),
        }
    }
}

/// Remote media host errors
#[derive(Debug)]
pub enum MediaError {
    /// The host answered, but refused the file
    Rejected(u16),
    /// The host accepted the upload but returned no usable URL
    EmptyUrl,
    Transport(String),
    Io(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Rejected(status) => write!(f, "Media host rejected upload ({})", status),
            MediaError::EmptyUrl => write!(f, "Media host returned an empty URL"),
            MediaError::Transport(msg) => write!(f, "Media host unreachable: {}", msg),
            MediaError::Io(msg) => write!(f, "Staged file unreadable: {}", msg),
        }
    }
}

impl StdError for MediaError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Authentication and authorization errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email, empty field or wrong password at login
    InvalidCredentials,
    /// Old password did not match during a password change
    IncorrectPassword,
    MissingToken,
    /// Bad signature, malformed, expired, or subject no longer resolves
    InvalidToken,
    /// Same as `InvalidToken`, for a presented refresh token
    InvalidRefreshToken,
    /// Refresh token verified but is no longer the one on record
    TokenExpired,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Incorrect credentials"),
            AuthError::IncorrectPassword => write!(f, "Invalid old password"),
            AuthError::MissingToken => write!(f, "Unauthorized request"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::InvalidRefreshToken => write!(f, "Invalid refresh token"),
            AuthError::TokenExpired => write!(f, "Refresh token is expired or used"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Store(StoreError),
    Media(MediaError),
    Auth(AuthError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Media(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        AppError::Media(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.into())
    }
}

impl AppError {
    /// Shorthand for the error every authenticated flow uses when the user
    /// behind a token cannot be found.
    pub fn unauthorized() -> Self {
        AppError::Auth(AuthError::InvalidToken)
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error envelope sent to clients
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub success: bool,
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self {
            status_code: status.as_u16(),
            message,
            success: false,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self) -> (StatusCode, ErrorResponse);
    /// Log at a severity matching the error kind. Call inside the request
    /// span so the line carries its `request_id`.
    fn log_error(&self);
}

impl ErrorHandler for AppError {
    fn error_response(&self) -> (StatusCode, ErrorResponse) {
        let status = ResponseError::status_code(self);
        let message = match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Store(e @ StoreError::UniqueViolation(_)) => e.to_string(),
            AppError::Store(StoreError::NotFound) => "User not found".to_string(),
            AppError::Store(StoreError::ConnectionPool(_)) => {
                "Database service temporarily unavailable".to_string()
            }
            AppError::Store(_) => "Database error occurred".to_string(),
            AppError::Media(MediaError::Rejected(_)) | AppError::Media(MediaError::EmptyUrl) => {
                "Error while uploading file".to_string()
            }
            AppError::Media(_) => "Media service temporarily unavailable".to_string(),
            AppError::Auth(AuthError::InvalidToken) => "Invalid access token".to_string(),
            AppError::Auth(e) => e.to_string(),
            AppError::Config(_) => "Server configuration error".to_string(),
            AppError::Internal(_) => "Something went wrong".to_string(),
        };

        let errors = match self {
            AppError::Validation(e) => vec![e.to_string()],
            _ => Vec::new(),
        };

        (status, ErrorResponse::new(status, message).with_errors(errors))
    }

    fn log_error(&self) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "Validation error");
            }
            AppError::Store(StoreError::UniqueViolation(field)) => {
                tracing::warn!(field = %field, "Duplicate entry attempt");
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store error");
            }
            AppError::Media(e) => {
                tracing::error!(error = %e, "Media host error");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!("Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(error = %e, "Authentication error");
            }
            AppError::Config(e) => {
                tracing::error!(error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, body) = <Self as ErrorHandler>::error_response(self);
        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(e) => match e {
                StoreError::UniqueViolation(_) => StatusCode::CONFLICT,
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::QueryExecution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Media(e) => match e {
                MediaError::Rejected(_) | MediaError::EmptyUrl => StatusCode::BAD_REQUEST,
                MediaError::Transport(_) | MediaError::Io(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::Auth(e) => match e {
                AuthError::IncorrectPassword => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNAUTHORIZED,
            },
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Operation context attached to handler log lines. The request id comes
/// from the enclosing `http_request` span.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub user_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            user_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }
}
