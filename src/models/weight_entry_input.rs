use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{AppError, AppResult};

/// Input for creating or replacing a weight entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeightEntryInput {
    pub value: f64,
    pub animal_id: i32,
}

impl WeightEntryInput {
    pub fn validate(self) -> AppResult<Self> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(AppError::Validation(
                "weight must be a positive number".to_string(),
            ));
        }
        Ok(self)
    }
}
