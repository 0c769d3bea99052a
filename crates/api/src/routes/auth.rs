//! Account Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use storage::NewUser;
use tracing::{debug, info};

use crate::auth::{hash_password, session_cookie, verify_password, AuthUser};
use crate::{ApiError, SharedState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn test() -> Json<&'static str> {
    Json("test ok")
}

/// Create a local account; 201 with the user
pub async fn register(
    State(state): State<SharedState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.password.is_empty() {
        return Err(ApiError::Validation(
            "Password is required for local authentication".into(),
        ));
    }

    let state = state.read().await;
    let hash = hash_password(req.password, state.config.bcrypt_cost).await?;
    let user = state
        .repository
        .create_user(NewUser::local(req.name, req.email, hash))?;
    metrics::counter!("storefront_registrations_total").increment(1);
    info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Password login.
///
/// Unknown emails answer 200 `"not found"`, wrong passwords 422
/// `"pass not ok"`; success sets the `token` cookie.
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let state = state.read().await;

    let Some(user) = state.repository.find_user_by_email(&req.email)? else {
        debug!("Login for unknown email");
        return Ok(Json("not found").into_response());
    };

    let pass_ok = match (&user.password_hash, user.can_login_with_password()) {
        (Some(hash), true) => verify_password(req.password, hash.clone()).await?,
        _ => false,
    };
    if !pass_ok {
        metrics::counter!("storefront_login_failures_total").increment(1);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json("pass not ok")).into_response());
    }

    let token = state.tokens.issue(&user)?;
    metrics::counter!("storefront_logins_total", "provider" => "local").increment(1);
    info!("User {} logged in", user.id);
    Ok((jar.add(session_cookie(&state.config, token)), Json(user)).into_response())
}

/// Overwrite the session cookie with an empty token
pub async fn logout(State(state): State<SharedState>, jar: CookieJar) -> impl IntoResponse {
    let state = state.read().await;
    (jar.add(session_cookie(&state.config, String::new())), Json(true))
}

pub async fn profile(AuthUser(user): AuthUser) -> Json<storage::User> {
    Json(user)
}
