use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::serialize_utc_millis;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WeightEntry {
    pub id: i32,
    pub value: f64,
    pub animal_id: i32,
    pub animal_name: String,
    #[serde(serialize_with = "serialize_utc_millis")]
    pub created_at: DateTime<Utc>,
    pub user_id: i32,
    pub user_name: String,
}
