use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    auth::{generate_session_token, is_safe_redirect, SESSION_COOKIE},
    extractors::CurrentUser,
    models::{LoginInput, LoginResponse, User},
    AppError, AppResult, AppState,
};

/// The cookie lives exactly as long as the token it carries.
fn session_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// POST /api/auth/login - Log in by name, registering the name on first use
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = LoginResponse),
        (status = 400, description = "Unsafe redirect target"),
        (status = 422, description = "Blank name")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let redirect = match input.next {
        Some(next) if !is_safe_redirect(&next) => {
            tracing::warn!(next = %next, "Rejected unsafe login redirect");
            return Err(AppError::BadRequest("next must be a relative path".to_string()));
        }
        Some(next) => next,
        None => "/".to_string(),
    };

    let name = User::normalize_name(&input.name)?;
    let user = state.store.find_or_create_user(&name).await?;

    let token = generate_session_token(
        user.id,
        &state.config.session_secret,
        state.config.session_max_age_secs,
        Utc::now(),
    )?;

    state.user_cache.insert(user.id, user.clone()).await;
    tracing::info!(user_id = user.id, name = %user.name, "User logged in");

    Ok((
        jar.add(session_cookie(token, state.config.session_max_age_secs)),
        Json(LoginResponse { user, redirect }),
    ))
}

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(("cookie_auth" = []))
)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
