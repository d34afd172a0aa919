//! API key authentication extractor.
//!
//! Extracts and verifies API keys from:
//! - `Authorization: Bearer <key>` header
//! - `X-API-Key: <key>` header
//!
//! Keys are SHA-256 hashed and looked up in the `owners` table. The matching
//! owner scopes every vault operation of the request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use lockbox_core::repository::owner::OwnerRepository;
use lockbox_infra::crypto::hash::hash_api_key;
use lockbox_types::owner::Owner;

use crate::http::error::AppError;
use crate::state::AppState;

/// The owner authenticated by the request's API key.
pub struct AuthenticatedOwner(pub Owner);

impl FromRequestParts<AppState> for AuthenticatedOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api_key = extract_api_key(parts)?;
        let key_hash = hash_api_key(&api_key);

        let owner = state
            .owner_repo
            .find_by_api_key_hash(&key_hash)
            .await
            .map_err(|e| AppError::Internal(format!("Database error: {e}")))?;

        match owner {
            Some(owner) => Ok(AuthenticatedOwner(owner)),
            None => Err(AppError::Unauthorized(
                "Invalid API key. Provide a valid key via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
            )),
        }
    }
}

/// Extract the API key from request headers.
fn extract_api_key(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(key) = auth_str.strip_prefix("Bearer ") {
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(key_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing API key. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(header, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_bearer_header() {
        let parts = parts_with("authorization", "Bearer lbx_abc ");
        assert_eq!(extract_api_key(&parts).unwrap(), "lbx_abc");
    }

    #[test]
    fn test_x_api_key_header() {
        let parts = parts_with("x-api-key", "lbx_def");
        assert_eq!(extract_api_key(&parts).unwrap(), "lbx_def");
    }

    #[test]
    fn test_missing_key_is_unauthorized() {
        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert!(matches!(
            extract_api_key(&parts),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_non_bearer_authorization_falls_through() {
        let parts = parts_with("authorization", "Basic Zm9vOmJhcg==");
        assert!(matches!(
            extract_api_key(&parts),
            Err(AppError::Unauthorized(_))
        ));
    }
}
