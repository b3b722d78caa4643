//! Custom Axum Extractors

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body extractor whose rejections are [`ApiError`]s (always 400)
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
