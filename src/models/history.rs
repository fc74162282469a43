use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{serialize_opt_utc_millis, serialize_utc_millis, FoodEntry, VitaminEntry, WeightEntry};

/// One line of the history feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryRecord {
    #[serde(serialize_with = "serialize_utc_millis")]
    pub timestamp: DateTime<Utc>,
    pub user_name: String,
    #[serde(flatten)]
    pub detail: HistoryDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryDetail {
    Food {
        food_type: String,
        animals: String,
        notes: Option<String>,
    },
    Weight {
        value: f64,
        animal: String,
    },
    Vitamin,
}

impl From<FoodEntry> for HistoryRecord {
    fn from(entry: FoodEntry) -> Self {
        let animals = entry.animal_names();
        Self {
            timestamp: entry.created_at,
            user_name: entry.user_name,
            detail: HistoryDetail::Food {
                food_type: entry.food_type_label,
                animals,
                notes: entry.notes,
            },
        }
    }
}

impl From<WeightEntry> for HistoryRecord {
    fn from(entry: WeightEntry) -> Self {
        Self {
            timestamp: entry.created_at,
            user_name: entry.user_name,
            detail: HistoryDetail::Weight {
                value: entry.value,
                animal: entry.animal_name,
            },
        }
    }
}

impl From<VitaminEntry> for HistoryRecord {
    fn from(entry: VitaminEntry) -> Self {
        Self {
            timestamp: entry.created_at,
            user_name: entry.user_name,
            detail: HistoryDetail::Vitamin,
        }
    }
}

/// Response for the history view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    #[serde(serialize_with = "serialize_opt_utc_millis")]
    pub start: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_opt_utc_millis")]
    pub end: Option<DateTime<Utc>>,
    pub entries: Vec<HistoryRecord>,
    /// Set when the requested range failed validation; `entries` is then empty
    pub error: Option<String>,
}
