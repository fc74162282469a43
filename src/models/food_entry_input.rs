use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::optional_text;
use crate::AppResult;

/// Input for creating or replacing a food entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FoodEntryInput {
    pub food_type_id: i32,
    pub notes: Option<String>,
    #[serde(default)]
    pub animal_ids: Vec<i32>,
}

impl FoodEntryInput {
    pub fn validate(self) -> AppResult<Self> {
        let mut animal_ids = self.animal_ids;
        animal_ids.sort_unstable();
        animal_ids.dedup();

        Ok(Self {
            food_type_id: self.food_type_id,
            notes: optional_text("notes", self.notes.as_deref(), 512)?,
            animal_ids,
        })
    }
}

/// Response for food entry mutations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FoodEntryMutationResponse {
    pub success: bool,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dedups_animals() {
        let input = FoodEntryInput {
            food_type_id: 1,
            notes: Some(" ".to_string()),
            animal_ids: vec![3, 1, 3],
        }
        .validate()
        .unwrap();

        assert_eq!(input.animal_ids, vec![1, 3]);
        assert_eq!(input.notes, None);
    }
}
