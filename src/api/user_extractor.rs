use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;

use crate::model::UserContext;

/// Axum extractor for UserContext from request headers
///
/// - X-User-Id: user identifier
/// - X-User-Name: optional display name
///
/// Requests without these headers are treated as anonymous; authentication
/// happens in front of this service.
#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(user_from_headers(&parts.headers))
    }
}

fn user_from_headers(headers: &HeaderMap) -> UserContext {
    UserContext {
        user_id: header_value(headers, "x-user-id"),
        user_name: header_value(headers, "x-user-name"),
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
