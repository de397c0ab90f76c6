use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::Response;
use uuid::Uuid;

use crate::domain::{Actor, UserId, UserRole};

use super::error::error_response;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Caller identity taken from the headers set by the authenticating proxy.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Actor);

impl AuthenticatedUser {
    pub fn user_id(&self) -> UserId {
        self.0.user_id
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = || {
            error_response(
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            )
        };

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(UserId::from_uuid)
            .ok_or_else(unauthorized)?;

        let role = match parts.headers.get(USER_ROLE_HEADER) {
            None => UserRole::default(),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.parse::<UserRole>().ok())
                .ok_or_else(unauthorized)?,
        };

        Ok(Self(Actor::new(user_id, role)))
    }
}
