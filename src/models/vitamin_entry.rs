use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::serialize_utc_millis;

/// Vitamin C given on a local calendar day; at most one per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VitaminEntry {
    pub id: i32,
    pub day: NaiveDate,
    #[serde(serialize_with = "serialize_utc_millis")]
    pub created_at: DateTime<Utc>,
    pub user_id: i32,
    pub user_name: String,
}

/// Today's vitamin state after a toggle
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VitaminStatus {
    pub day: NaiveDate,
    pub given: bool,
    pub entry: Option<VitaminEntry>,
}
