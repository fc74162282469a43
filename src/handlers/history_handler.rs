use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    aggregation::WindowSelector,
    extractors::CurrentUser,
    models::HistoryResponse,
    AppError, AppResult, AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// `today` or `older`; omit to use `start`/`end`
    pub mode: Option<String>,
    /// First day, `YYYY-MM-DD`
    pub start: Option<String>,
    /// Last day (inclusive), `YYYY-MM-DD`
    pub end: Option<String>,
}

impl HistoryQuery {
    fn selector(self) -> AppResult<WindowSelector> {
        match self.mode.as_deref() {
            Some("today") => Ok(WindowSelector::Today),
            Some("older") => Ok(WindowSelector::Older),
            Some(other) => Err(AppError::Validation(format!("unknown mode: {}", other))),
            None if self.start.is_none() && self.end.is_none() => Ok(WindowSelector::Older),
            None => Ok(WindowSelector::Range {
                start: self.start,
                end: self.end,
            }),
        }
    }
}

/// GET /api/history?mode=&start=&end=
///
/// A range that fails validation yields an empty feed with `error` set
/// rather than an error status.
#[utoipa::path(
    get,
    path = "/api/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Entries in the window, oldest first", body = HistoryResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "history",
    security(("cookie_auth" = []))
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryResponse>> {
    let window = query
        .selector()
        .and_then(|selector| state.aggregator.resolve(Utc::now(), &selector));

    let window = match window {
        Ok(window) => window,
        Err(AppError::Validation(message)) => {
            tracing::debug!(error = %message, "History window rejected");
            return Ok(Json(HistoryResponse {
                start: None,
                end: None,
                entries: Vec::new(),
                error: Some(message),
            }));
        }
        Err(e) => return Err(e),
    };

    let entries = state.aggregator.history(&window).await?.collect();

    Ok(Json(HistoryResponse {
        start: Some(window.start),
        end: Some(window.end),
        entries,
        error: None,
    }))
}
