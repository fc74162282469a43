use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{serialize_utc_millis, Animal};

/// A food entry with its food type, author and animals resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FoodEntry {
    pub id: i32,
    pub food_type_id: i32,
    pub food_type_label: String,
    pub notes: Option<String>,
    #[serde(serialize_with = "serialize_utc_millis")]
    pub created_at: DateTime<Utc>,
    pub user_id: i32,
    pub user_name: String,
    pub animals: Vec<Animal>,
}

impl FoodEntry {
    pub fn animal_names(&self) -> String {
        self.animals
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
