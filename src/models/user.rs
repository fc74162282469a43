use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
}

impl User {
    /// Login names are case-insensitive first names: "Anna Maria" logs in as "anna".
    pub fn normalize_name(raw: &str) -> AppResult<String> {
        let name = raw
            .split_whitespace()
            .next()
            .map(str::to_lowercase)
            .ok_or_else(|| AppError::Validation("name can't be blank".to_string()))?;

        if name.chars().count() > 64 {
            return Err(AppError::Validation(
                "name must be at most 64 characters".to_string(),
            ));
        }

        Ok(name)
    }
}

/// Input for logging in (and implicitly registering) by name
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginInput {
    pub name: String,
    /// Relative path to continue to after login
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: User,
    pub redirect: String,
}
