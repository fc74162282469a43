use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{optional_text, required_text};
use crate::AppResult;

/// Input for creating or replacing a food type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FoodTypeInput {
    pub label: String,
    pub recommendations: Option<String>,
    #[serde(default = "default_true")]
    pub included_in_statistics: bool,
    #[serde(default)]
    pub is_hidden: bool,
}

fn default_true() -> bool {
    true
}

impl FoodTypeInput {
    pub fn validate(self) -> AppResult<Self> {
        Ok(Self {
            label: required_text("label", &self.label, 64)?,
            recommendations: optional_text(
                "recommendations",
                self.recommendations.as_deref(),
                512,
            )?,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_default_when_omitted() {
        let input: FoodTypeInput = serde_json::from_str(r#"{"label": "kale"}"#).unwrap();
        assert!(input.included_in_statistics);
        assert!(!input.is_hidden);
        assert_eq!(input.recommendations, None);
    }
}
