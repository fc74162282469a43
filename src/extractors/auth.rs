use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;

use crate::{
    auth::{validate_session_token, SESSION_COOKIE},
    models::User,
    AppError, AppState,
};

/// Reads the session token from the `session` cookie, falling back to a
/// Bearer token for API clients.
fn extract_token_from_request(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// The logged-in user behind a request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = extract_token_from_request(parts);
        let state = state.clone();

        async move {
            let token = token.ok_or_else(|| {
                AppError::Unauthorized("Missing session cookie or Authorization header".to_string())
            })?;

            let user_id =
                validate_session_token(&token, &state.config.session_secret, Utc::now())?;

            if let Some(user) = state.user_cache.get(&user_id).await {
                return Ok(CurrentUser(user));
            }

            let user = state.store.get_user(user_id).await?.ok_or_else(|| {
                tracing::warn!(user_id, "Session refers to an unknown user");
                AppError::Unauthorized("Unknown user".to_string())
            })?;

            tracing::debug!(user_id, name = %user.name, "User loaded into cache");
            state.user_cache.insert(user_id, user.clone()).await;

            Ok(CurrentUser(user))
        }
    }
}
