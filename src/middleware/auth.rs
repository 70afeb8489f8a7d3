// SPDX-License-Identifier: MIT

//! JWT authentication middleware and request identity.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie holding the JWT.
pub const SESSION_COOKIE: &str = "muse_token";
/// Cookie holding the anonymous guest session id.
pub const GUEST_COOKIE: &str = "muse_guest_id";
/// Header alternative to the guest cookie.
pub const GUEST_HEADER: &str = "x-guest-session";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account id from the auth provider)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Who is making the request.
///
/// `Guest` carries the id the client presented; it may not correspond to a
/// stored session yet. `Anonymous` requests get a session synthesized by
/// the handler.
#[derive(Debug, Clone)]
pub enum Identity {
    User(AuthUser),
    Guest(String),
    Anonymous,
}

fn bearer_or_cookie(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    auth_header.strip_prefix("Bearer ").map(str::to_string)
}

fn decode_user(token: &str, signing_key: &[u8]) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    Some(AuthUser {
        user_id: token_data.claims.sub,
    })
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_or_cookie(&jar, &request).ok_or(StatusCode::UNAUTHORIZED)?;
    let auth_user =
        decode_user(&token, &state.config.jwt_signing_key).ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Middleware that attaches an [`Identity`] without requiring one.
///
/// A valid JWT wins; otherwise a guest id from cookie or header; otherwise
/// the request proceeds anonymously. An invalid JWT is still rejected so a
/// signed-in client never silently degrades to guest data.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let identity = match bearer_or_cookie(&jar, &request) {
        Some(token) => Identity::User(
            decode_user(&token, &state.config.jwt_signing_key)
                .ok_or(StatusCode::UNAUTHORIZED)?,
        ),
        None => {
            let guest_id = jar
                .get(GUEST_COOKIE)
                .map(|c| c.value().to_string())
                .or_else(|| {
                    request
                        .headers()
                        .get(GUEST_HEADER)
                        .and_then(|h| h.to_str().ok())
                        .map(str::to_string)
                });

            match guest_id {
                Some(id) => Identity::Guest(id),
                None => Identity::Anonymous,
            }
        }
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + 30 * 24 * 60 * 60, // 30 days
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
