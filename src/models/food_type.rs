use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FoodType {
    pub id: i32,
    pub label: String,
    pub recommendations: Option<String>,
    pub included_in_statistics: bool,
    /// Hidden types can't be picked for new entries but stay in history
    pub is_hidden: bool,
}

impl FoodType {
    pub fn is_eligible(&self) -> bool {
        self.included_in_statistics && !self.is_hidden
    }
}

/// Which food types a listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodTypeFilter {
    All,
    /// Not hidden: the entry form picker
    Visible,
    /// Counted in statistics and not hidden
    Eligible,
}

impl FoodTypeFilter {
    pub fn matches(self, food_type: &FoodType) -> bool {
        match self {
            FoodTypeFilter::All => true,
            FoodTypeFilter::Visible => !food_type.is_hidden,
            FoodTypeFilter::Eligible => food_type.is_eligible(),
        }
    }
}
