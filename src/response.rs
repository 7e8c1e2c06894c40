use actix_web::{http::StatusCode, HttpResponse, HttpResponseBuilder};
use serde::Serialize;

/// Success envelope: `{statusCode, data, message, success}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    /// A builder with the status already set, for attaching cookies
    pub fn builder(&self) -> HttpResponseBuilder {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK))
    }

    pub fn respond(self) -> HttpResponse {
        self.builder().json(self)
    }
}

/// Placeholder `data` for responses that carry nothing
#[derive(Debug, Serialize)]
pub struct Empty {}
