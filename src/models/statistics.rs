use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Food type statistics; a key is omitted when there is nothing to report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FoodStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_frequent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub least_frequent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}

impl FoodStatistics {
    pub fn is_empty(&self) -> bool {
        self.most_frequent.is_none()
            && self.least_frequent.is_none()
            && self.oldest.is_none()
            && self.latest.is_none()
    }
}

/// Most recent weight of an animal, if it was ever weighed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AnimalWeight {
    pub animal_id: i32,
    pub name: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatisticsResponse {
    pub food: FoodStatistics,
    pub weights: Vec<AnimalWeight>,
}
