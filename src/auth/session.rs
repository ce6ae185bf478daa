//! Session tokens and cookie helpers
//!
//! A login produces an HS256 JWT which is handed to the browser as an HttpOnly
//! `session` cookie. API clients may send the same token as a Bearer header.

use axum::http::{header::COOKIE, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::models::Claims;

pub const SESSION_COOKIE: &str = "session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// OAuth state cookie lifetime; the consent round trip must finish inside it
const OAUTH_STATE_MAX_AGE_SECS: i64 = 600;

pub fn issue_token(
    user_id: &str,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

/// Value of the named cookie, looking across every `Cookie` header
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Bearer token from `Authorization`, falling back to the session cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|raw| raw.strip_prefix("Bearer ").unwrap_or(raw).trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| read_cookie(headers, SESSION_COOKIE))
}

pub fn session_cookie(token: &str, ttl_hours: i64, secure: bool) -> String {
    build_cookie(SESSION_COOKIE, token, ttl_hours * 3600, secure)
}

pub fn oauth_state_cookie(state: &str, secure: bool) -> String {
    build_cookie(OAUTH_STATE_COOKIE, state, OAUTH_STATE_MAX_AGE_SECS, secure)
}

pub fn expired_cookie(name: &str, secure: bool) -> String {
    build_cookie(name, "", 0, secure)
}

fn build_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
