use crate::auth::auth::{AuthAdmin, is_staff};
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::TokenType;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

fn reject(req: ServiceRequest, err: ApiError) -> ServiceResponse<BoxBody> {
    req.into_response(err.error_response())
}

/// Resolves the bearer access token into an `AuthAdmin` request extension.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v,
            Err(_) => {
                let err = ApiError::unauthorized("Invalid Authorization header encoding");
                return Ok(reject(req, err));
            }
        },
        None => {
            let err = ApiError::unauthorized("Authentication credentials were not provided.");
            return Ok(reject(req, err));
        }
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            let err = ApiError::unauthorized("Authorization header must start with Bearer");
            return Ok(reject(req, err));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "Rejected access token");
            return Ok(reject(req, ApiError::unauthorized("Given token not valid for any token type")));
        }
    };

    if claims.token_type != TokenType::Access {
        return Ok(reject(req, ApiError::unauthorized("Given token not valid for any token type")));
    }

    req.extensions_mut().insert(AuthAdmin::from(claims));

    next.call(req).await
}

/// Lets only staff callers through. Must run inside `auth_middleware`.
pub async fn staff_only(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let caller = req.extensions().get::<AuthAdmin>().cloned();

    match caller {
        Some(caller) if is_staff(&caller) => next.call(req).await,
        Some(caller) => {
            debug!(admin_id = caller.admin_id, username = %caller.username, "Non-staff caller refused");
            Ok(reject(
                req,
                ApiError::forbidden("You do not have permission to perform this action."),
            ))
        }
        None => Ok(reject(
            req,
            ApiError::unauthorized("Authentication credentials were not provided."),
        )),
    }
}
