use crate::error::ApiError;
use crate::models::Claims;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Caller identity resolved from a valid access token by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub admin_id: u64,
    pub username: String,
    pub is_staff: bool,
}

impl From<Claims> for AuthAdmin {
    fn from(claims: Claims) -> Self {
        Self {
            admin_id: claims.admin_id,
            username: claims.sub,
            is_staff: claims.is_staff,
        }
    }
}

/// Capability check for staff-only operations.
pub fn is_staff(caller: &AuthAdmin) -> bool {
    caller.is_staff
}

impl FromRequest for AuthAdmin {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthAdmin>()
                .cloned()
                .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided.")),
        )
    }
}
