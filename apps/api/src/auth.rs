//! Access Boundary — resolves the opaque caller identity before any engine
//! operation runs.
//!
//! Authentication itself lives in an upstream collaborator (edge proxy /
//! auth middleware) which injects the resolved identity as the
//! `x-caller-id` header. This module only makes that identity available to
//! handlers and rejects requests that arrive without one.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;

/// Header set by the upstream auth collaborator after token verification.
pub const CALLER_ID_HEADER: &str = "x-caller-id";

/// Opaque caller identity. Candidate id on the engine routes, recruiter id
/// on the assessment-authoring routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let id = Uuid::parse_str(raw).map_err(|_| AppError::Unauthorized)?;
        Ok(CallerIdentity(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/engine/start");
        if let Some(v) = value {
            builder = builder.header(CALLER_ID_HEADER, v);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_valid_caller_id_is_extracted() {
        let id = Uuid::new_v4();
        let mut parts = parts_with_header(Some(&id.to_string()));
        let identity = CallerIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(identity.0, id);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let mut parts = parts_with_header(None);
        let result = CallerIdentity::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_malformed_caller_id_is_unauthorized() {
        let mut parts = parts_with_header(Some("not-a-uuid"));
        let result = CallerIdentity::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
