use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{http, web, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::core::config::JwtAuthConfig;
use crate::core::AppError;

pub const AUTH_COOKIE: &str = "auth-token";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String, // user ID
    pub email: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
}

impl JwtClaims {
    pub fn for_user(user_id: i32, email: &str, name: &str, valid_for_days: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::days(valid_for_days)).timestamp() as usize,
        }
    }
}

/// The authenticated caller. Extracting it rejects the request with 401
/// when the session cookie (or bearer token) is missing or invalid.
#[derive(Debug)]
pub struct JwtMiddleware {
    pub user_id: i32,
    pub claims: JwtClaims,
}

impl FromRequest for JwtMiddleware {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<JwtMiddleware, AppError> {
    let config = req
        .app_data::<web::Data<JwtAuthConfig>>()
        .ok_or_else(|| AppError::internal_error("JWT configuration is not registered"))?;

    let token = token_from_request(req)
        .ok_or_else(|| AppError::unauthorized("Unauthorized: No token found"))?;

    let claims = decode_jwt_token(&token, config.secret.expose_secret())?;

    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;

    req.extensions_mut().insert(claims.clone());

    Ok(JwtMiddleware { user_id, claims })
}

fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(AUTH_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

pub fn generate_jwt_token(claims: &JwtClaims, secret: &str) -> Result<String, AppError> {
    let encoding_key = EncodingKey::from_secret(secret.as_ref());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|_| AppError::internal_error("Failed to generate JWT token"))
}

pub fn decode_jwt_token(token: &str, secret: &str) -> Result<JwtClaims, AppError> {
    decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Token verification failed: {:?}", e);
        AppError::unauthorized("Unauthorized: Token verification failed")
    })
}

pub fn session_cookie(token: String, config: &JwtAuthConfig) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookie)
        .max_age(time::Duration::days(config.token_expiration_days))
        .finish()
}

pub fn cleared_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(AUTH_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};
    use secrecy::Secret;

    const SECRET: &str = "test-secret";

    fn config() -> JwtAuthConfig {
        JwtAuthConfig {
            secret: Secret::new(SECRET.to_string()),
            token_expiration_days: 7,
            secure_cookie: true,
        }
    }

    #[test]
    fn issued_tokens_verify_with_the_same_secret() {
        let claims = JwtClaims::for_user(42, "ada@example.com", "Ada", 7);
        let token = assert_ok!(generate_jwt_token(&claims, SECRET));

        let decoded = assert_ok!(decode_jwt_token(&token, SECRET));
        assert_eq!(decoded.sub, "42");
        assert_eq!(decoded.email, "ada@example.com");
        assert_eq!(decoded.name, "Ada");
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let claims = JwtClaims::for_user(1, "a@b.co", "A", 7);
        let token = assert_ok!(generate_jwt_token(&claims, "other-secret"));
        assert_err!(decode_jwt_token(&token, SECRET));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let claims = JwtClaims::for_user(1, "a@b.co", "A", -2);
        let token = assert_ok!(generate_jwt_token(&claims, SECRET));
        assert_err!(decode_jwt_token(&token, SECRET));
    }

    #[test]
    fn session_cookie_is_http_only_and_lax() {
        let cookie = session_cookie("abc".to_string(), &config());
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = cleared_session_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
