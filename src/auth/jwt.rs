use crate::model::administrator::Administrator;
use crate::models::{Claims, TokenType};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn claims_for(admin: &Administrator, token_type: TokenType, ttl: usize) -> Claims {
    let issued = now();
    Claims {
        admin_id: admin.id,
        sub: admin.username.clone(),
        is_staff: admin.is_staff,
        iat: issued,
        exp: issued + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    }
}

fn sign(claims: &Claims, secret: &str) -> Result<String, Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn generate_access_token(
    admin: &Administrator,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    sign(&claims_for(admin, TokenType::Access, ttl), secret)
}

/// Returns the claims too, the caller persists `jti` and `exp`.
pub fn generate_refresh_token(
    admin: &Administrator,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = claims_for(admin, TokenType::Refresh, ttl);
    let token = sign(&claims, secret)?;
    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
