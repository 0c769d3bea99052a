//! Password hashing, session tokens and the `token` cookie

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use storage::User;
use uuid::Uuid;

use crate::{config::ApiConfig, ApiError, SharedState};

/// Session cookie name
pub const TOKEN_COOKIE: &str = "token";

/// Hash on the blocking pool; bcrypt is deliberately slow
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

/// JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing keys
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            email: user.email.clone(),
            id: user.id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// Signature and expiry check; any failure is `Unauthenticated`
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        Ok(decode::<Claims>(token, &self.decoding, &Validation::default())?.claims)
    }
}

/// `token` cookie; cross-site in production
pub fn session_cookie(config: &ApiConfig, value: String) -> Cookie<'static> {
    let same_site = if config.production {
        SameSite::None
    } else {
        SameSite::Lax
    };
    Cookie::build((TOKEN_COOKIE, value))
        .http_only(true)
        .same_site(same_site)
        .secure(config.production)
        .path("/")
        .build()
}

/// Authenticated caller, resolved from the `token` cookie.
///
/// Rejects with 401 when the cookie is absent, empty, invalid or expired,
/// or when the user no longer exists.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::Unauthenticated)?;

        let state = state.read().await;
        let claims = state.tokens.verify(&token)?;
        let user = state
            .repository
            .find_user(claims.id)?
            .ok_or(ApiError::Unauthenticated)?;
        Ok(AuthUser(user))
    }
}
