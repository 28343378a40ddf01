use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::ApiError,
    model::administrator::Administrator,
    models::{LoginReqDto, RefreshReqDto, TokenPair, TokenType},
    store::AdminRepository,
};
use actix_web::{HttpResponse, web};
use chrono::DateTime;
use tracing::{debug, error, info, instrument};

const NO_ACTIVE_ACCOUNT: &str = "No active account found with the given credentials";
const STAFF_ONLY: &str = "Only administrators can login";
const INVALID_TOKEN: &str = "Token is invalid or expired";

/// Signs an access/refresh pair and records the refresh `jti`.
async fn issue_token_pair(
    admin: &Administrator,
    admins: &dyn AdminRepository,
    config: &Config,
) -> Result<TokenPair, ApiError> {
    let access = generate_access_token(admin, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            ApiError::Internal
        })?;

    let (refresh, refresh_claims) =
        generate_refresh_token(admin, &config.jwt_secret, config.refresh_token_ttl).map_err(|e| {
            error!(error = %e, "Failed to sign refresh token");
            ApiError::Internal
        })?;

    let issued_at = DateTime::from_timestamp(refresh_claims.iat as i64, 0)
        .ok_or(ApiError::Internal)?
        .naive_utc();
    let expires_at = DateTime::from_timestamp(refresh_claims.exp as i64, 0)
        .ok_or(ApiError::Internal)?
        .naive_utc();

    debug!(admin_id = admin.id, jti = %refresh_claims.jti, "Storing refresh token");
    admins
        .store_refresh_token(admin.id, &refresh_claims.jti, issued_at, expires_at)
        .await?;

    Ok(TokenPair { access, refresh })
}

/// Admin login
#[utoipa::path(
    post,
    path = "/auth/login/",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is not staff")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(admins, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    admins: web::Data<dyn AdminRepository>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(ApiError::bad_request("Username or password required"));
    }

    // 2️⃣ Fetch administrator
    let admin = match admins.find_admin_by_username(user.username.trim()).await? {
        Some(admin) if admin.is_active => admin,
        Some(_) => {
            info!("Invalid credentials: account disabled");
            return Err(ApiError::unauthorized(NO_ACTIVE_ACCOUNT));
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(ApiError::unauthorized(NO_ACTIVE_ACCOUNT));
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &admin.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::unauthorized(NO_ACTIVE_ACCOUNT));
    }

    // 4️⃣ Staff only
    if !admin.is_staff {
        info!(admin_id = admin.id, "Login refused: not staff");
        return Err(ApiError::forbidden(STAFF_ONLY));
    }

    // 5️⃣ Tokens
    let pair = issue_token_pair(&admin, admins.get_ref(), &config).await?;

    info!(admin_id = admin.id, "Login successful");
    Ok(HttpResponse::Ok().json(pair))
}

/// Rotate refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh/",
    request_body = RefreshReqDto,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Refresh token invalid, expired or already used")
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    body: web::Json<RefreshReqDto>,
    admins: web::Data<dyn AdminRepository>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let claims = verify_token(&body.refresh, &config.jwt_secret).map_err(|e| {
        debug!(error = %e, "Rejected refresh token");
        ApiError::unauthorized(INVALID_TOKEN)
    })?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::unauthorized(INVALID_TOKEN));
    }

    // 🔥 revoke old refresh token, only one caller can win
    if !admins.revoke_refresh_token(&claims.jti).await? {
        info!(jti = %claims.jti, "Refresh token reuse or unknown token");
        return Err(ApiError::unauthorized(INVALID_TOKEN));
    }

    // staff flag or active state may have changed since the token was issued
    let admin = match admins.find_admin(claims.admin_id).await? {
        Some(admin) if admin.is_active && admin.is_staff => admin,
        _ => return Err(ApiError::unauthorized(NO_ACTIVE_ACCOUNT)),
    };

    // 🔄 issue new pair
    let pair = issue_token_pair(&admin, admins.get_ref(), &config).await?;
    Ok(HttpResponse::Ok().json(pair))
}

/// Revoke refresh token
#[utoipa::path(
    post,
    path = "/auth/logout/",
    request_body = RefreshReqDto,
    responses(
        (status = 204, description = "Refresh token revoked (or was never valid)")
    ),
    tag = "Auth"
)]
pub async fn logout(
    body: web::Json<RefreshReqDto>,
    admins: web::Data<dyn AdminRepository>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    // success even if the token is invalid or already revoked
    if let Ok(claims) = verify_token(&body.refresh, &config.jwt_secret) {
        if claims.token_type == TokenType::Refresh {
            admins.revoke_refresh_token(&claims.jti).await?;
        }
    }

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use crate::test_support::{TestContext, call_json, request};
    use actix_web::{
        http::{Method, StatusCode},
        test,
    };
    use serde_json::json;

    #[actix_web::test]
    async fn staff_login_returns_token_pair() {
        let ctx = TestContext::new();
        ctx.create_admin("admin_user", "adminpass123", true).await;
        let app = test::init_service(ctx.app()).await;

        let req = request(Method::POST, "/auth/login/")
            .set_json(json!({"username": "admin_user", "password": "adminpass123"}))
            .to_request();
        let (status, body) = call_json(&app, req).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["access"].is_string());
        assert!(body["refresh"].is_string());
    }

    #[actix_web::test]
    async fn wrong_password_is_unauthorized() {
        let ctx = TestContext::new();
        ctx.create_admin("admin_user", "adminpass123", true).await;
        let app = test::init_service(ctx.app()).await;

        let req = request(Method::POST, "/auth/login/")
            .set_json(json!({"username": "admin_user", "password": "wrongpassword"}))
            .to_request();
        let (status, body) = call_json(&app, req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "No active account found with the given credentials");
    }

    #[actix_web::test]
    async fn non_staff_login_is_forbidden() {
        let ctx = TestContext::new();
        ctx.create_admin("regular_user", "userpass123", false).await;
        let app = test::init_service(ctx.app()).await;

        let req = request(Method::POST, "/auth/login/")
            .set_json(json!({"username": "regular_user", "password": "userpass123"}))
            .to_request();
        let (status, body) = call_json(&app, req).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Only administrators can login");
    }

    #[actix_web::test]
    async fn blank_credentials_are_a_bad_request() {
        let ctx = TestContext::new();
        let app = test::init_service(ctx.app()).await;

        let req = request(Method::POST, "/auth/login/")
            .set_json(json!({"username": " ", "password": ""}))
            .to_request();
        let (status, _) = call_json(&app, req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn refresh_rotates_and_rejects_reuse() {
        let ctx = TestContext::new();
        ctx.create_admin("admin_user", "adminpass123", true).await;
        let app = test::init_service(ctx.app()).await;

        let req = request(Method::POST, "/auth/login/")
            .set_json(json!({"username": "admin_user", "password": "adminpass123"}))
            .to_request();
        let (_, pair) = call_json(&app, req).await;
        let old_refresh = pair["refresh"].clone();

        let req = request(Method::POST, "/auth/refresh/")
            .set_json(json!({"refresh": old_refresh}))
            .to_request();
        let (status, rotated) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(rotated["access"].is_string());
        assert_ne!(rotated["refresh"], old_refresh);

        let req = request(Method::POST, "/auth/refresh/")
            .set_json(json!({"refresh": old_refresh}))
            .to_request();
        let (status, _) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn access_token_cannot_be_used_to_refresh() {
        let ctx = TestContext::new();
        let access = ctx.token(true).await;
        let app = test::init_service(ctx.app()).await;

        let req = request(Method::POST, "/auth/refresh/")
            .set_json(json!({"refresh": access}))
            .to_request();
        let (status, _) = call_json(&app, req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn logout_revokes_refresh_token() {
        let ctx = TestContext::new();
        ctx.create_admin("admin_user", "adminpass123", true).await;
        let app = test::init_service(ctx.app()).await;

        let req = request(Method::POST, "/auth/login/")
            .set_json(json!({"username": "admin_user", "password": "adminpass123"}))
            .to_request();
        let (_, pair) = call_json(&app, req).await;

        let req = request(Method::POST, "/auth/logout/")
            .set_json(json!({"refresh": pair["refresh"]}))
            .to_request();
        let (status, _) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let req = request(Method::POST, "/auth/refresh/")
            .set_json(json!({"refresh": pair["refresh"]}))
            .to_request();
        let (status, _) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn logout_with_garbage_token_still_succeeds() {
        let ctx = TestContext::new();
        let app = test::init_service(ctx.app()).await;

        let req = request(Method::POST, "/auth/logout/")
            .set_json(json!({"refresh": "not-a-token"}))
            .to_request();
        let (status, _) = call_json(&app, req).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
