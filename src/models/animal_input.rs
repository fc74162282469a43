use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::required_text;
use crate::AppResult;

/// Input for creating or replacing an animal
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnimalInput {
    pub name: String,
}

impl AnimalInput {
    pub fn validate(self) -> AppResult<Self> {
        Ok(Self {
            name: required_text("name", &self.name, 64)?,
        })
    }
}
