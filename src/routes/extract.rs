//! Request extractors whose rejections use the shared JSON error body.

use axum::{extract::FromRequest, extract::rejection::JsonRejection};

use crate::error::AppError;

/// `Json` body extractor reporting malformed payloads as [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
