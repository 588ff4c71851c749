use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;

/// Header carrying the authenticated user id, set by the upstream auth gateway.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// The acting user. Every write is stamped with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Rejects with `Unauthenticated` when the header is absent, empty or not a UUID.
/// Handlers take `Option<Identity>` and let the core operation decide.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .and_then(|value| Uuid::parse_str(value).ok())
            .filter(|id| !id.is_nil())
            .map(Identity::new)
            .ok_or(AppError::Unauthenticated)
    }
}

/// Unwraps the acting identity or fails with `Unauthenticated`.
pub fn require(identity: Option<&Identity>) -> Result<&Identity, AppError> {
    identity.ok_or(AppError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<Identity, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(IDENTITY_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_user_id() {
        let id = Uuid::new_v4();
        let identity = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(identity.user_id, id);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthenticated() {
        for header in [None, Some(""), Some("not-a-uuid"), Some("00000000-0000-0000-0000-000000000000")] {
            assert!(matches!(extract(header).await, Err(AppError::Unauthenticated)));
        }
    }

    #[test]
    fn test_require() {
        let identity = Identity::new(Uuid::new_v4());
        assert_eq!(require(Some(&identity)).unwrap(), &identity);
        assert!(matches!(require(None), Err(AppError::Unauthenticated)));
    }
}
