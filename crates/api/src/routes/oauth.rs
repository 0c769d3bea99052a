//! Google OAuth Routes
//!
//! `/auth/google` redirects to the consent screen with a random `state`
//! stored in a short-lived cookie; the callback checks it, exchanges the
//! code for a profile, upserts the user and hands out a session cookie.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use storage::OAuthProfile;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::session_cookie;
use crate::config::GoogleConfig;
use crate::{ApiError, SharedState};

const STATE_COOKIE: &str = "oauth_state";
const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

pub type ProfileFuture<'a> = Pin<Box<dyn Future<Output = Result<OAuthProfile, ApiError>> + Send + 'a>>;

/// An external identity provider
pub trait OAuthProvider: Send + Sync {
    /// Consent screen URL carrying `state`
    fn authorize_url(&self, state: &str) -> Result<String, ApiError>;

    /// Trade an authorization code for the user's profile
    fn exchange<'a>(&'a self, code: &'a str) -> ProfileFuture<'a>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<GoogleUserInfo> for OAuthProfile {
    fn from(info: GoogleUserInfo) -> Self {
        let name = info
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| info.email.split('@').next().unwrap_or_default().to_string());
        OAuthProfile {
            provider_id: info.sub,
            email: info.email,
            name,
            picture: info.picture,
            email_verified: info.email_verified,
        }
    }
}

/// Google's authorization-code flow over reqwest
pub struct GoogleOAuth {
    client: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleOAuth {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn fetch_profile(&self, code: &str) -> Result<OAuthProfile, ApiError> {
        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info: GoogleUserInfo = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(info.into())
    }
}

impl OAuthProvider for GoogleOAuth {
    fn authorize_url(&self, state: &str) -> Result<String, ApiError> {
        reqwest::Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map(String::from)
        .map_err(|e| ApiError::OAuth(e.to_string()))
    }

    fn exchange<'a>(&'a self, code: &'a str) -> ProfileFuture<'a> {
        Box::pin(self.fetch_profile(code))
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Start the flow
pub async fn google_login(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let state = state.read().await;
    let provider = state.oauth.as_ref().ok_or(ApiError::OAuthDisabled)?;

    let nonce = Uuid::new_v4().to_string();
    let url = provider.authorize_url(&nonce)?;
    let cookie = Cookie::build((STATE_COOKIE, nonce))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.production)
        .path("/auth/google")
        .build();
    Ok((jar.add(cookie), Redirect::to(&url)))
}

/// Provider redirect target
pub async fn google_callback(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(error) = query.error {
        warn!("Google sign-in refused: {}", error);
        return Err(ApiError::OAuth(error));
    }
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    if expected.is_none() || expected != query.state {
        return Err(ApiError::OAuth("state mismatch".into()));
    }
    let code = query
        .code
        .ok_or_else(|| ApiError::Validation("Missing authorization code".into()))?;

    let state = state.read().await;
    let provider = state.oauth.as_ref().ok_or(ApiError::OAuthDisabled)?;
    let profile = provider.exchange(&code).await?;
    let user = state.repository.upsert_google_user(&profile)?;
    let token = state.tokens.issue(&user)?;
    metrics::counter!("storefront_logins_total", "provider" => "google").increment(1);
    info!("Google login for user {}", user.id);

    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path("/auth/google"))
        .add(session_cookie(&state.config, token));
    Ok((jar, Redirect::to(&state.config.client_url)))
}
