//! Header credential extraction
//!
//! Every way a bearer header can be wrong collapses into one error so callers
//! learn nothing about which check failed.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::error::{AuthError, AuthResult};

/// Header carrying the shared service-to-service credential
pub const SERVICE_TOKEN_HEADER: &str = "x-service-token";

/// Extract `<token>` from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer(headers: &HeaderMap) -> AuthResult<&str> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MalformedToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MalformedToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    Ok(token)
}

/// Check the service credential header against `expected`.
///
/// With no expected credential configured the check passes.
pub fn verify_service_token(headers: &HeaderMap, expected: Option<&str>) -> AuthResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = headers
        .get(SERVICE_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::InvalidServiceCredential)?;

    if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(AuthError::InvalidServiceCredential)
    }
}
