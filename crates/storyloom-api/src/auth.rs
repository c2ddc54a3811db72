//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the verified user id
//! in the `x-owner-id` header and every story route scopes its work to it.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::Response;
use uuid::Uuid;

use crate::error::ErrorBody;

/// Header carrying the authenticated owner id.
pub const OWNER_HEADER: &str = "x-owner-id";

/// The authenticated owner of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedOwner(pub Uuid);

impl<S> FromRequestParts<S> for AuthenticatedOwner
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(OWNER_HEADER) else {
            return Err(unauthenticated(format!("missing {OWNER_HEADER} header")));
        };
        value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(Self)
            .ok_or_else(|| unauthenticated(format!("{OWNER_HEADER} must be a UUID")))
    }
}

fn unauthenticated(message: String) -> Response {
    ErrorBody::respond(StatusCode::UNAUTHORIZED, "unauthenticated", message)
}
