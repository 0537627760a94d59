//! Caller identity taken from a trusted request header.
//!
//! The identity provider sits in front of this server and stamps the signed
//! in user's id onto every request. Nothing here issues or checks tokens.

use axum::{extract::FromRequestParts, http::request::Parts};
use questboard_core::Error as CoreError;

use crate::error::ApiError;

pub const CALLER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl Caller {
    pub fn uid(&self) -> &str {
        &self.0
    }

    /// Rejects acting on another user's documents.
    pub fn ensure_is(&self, uid: &str) -> Result<(), ApiError> {
        if self.0 != uid {
            return Err(CoreError::PermissionDenied(format!(
                "User {} cannot act on behalf of {}",
                self.0, uid
            ))
            .into());
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {} header", CALLER_HEADER)))?;
        let uid = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("Malformed {} header", CALLER_HEADER)))?
            .trim();
        if uid.is_empty() {
            return Err(ApiError::Unauthorized(format!(
                "Empty {} header",
                CALLER_HEADER
            )));
        }
        Ok(Caller(uid.to_string()))
    }
}
