pub mod animal;
pub mod animal_input;
pub mod food_entry;
pub mod food_entry_input;
pub mod food_type;
pub mod food_type_input;
pub mod history;
pub mod statistics;
pub mod user;
pub mod vitamin_entry;
pub mod weight_entry;
pub mod weight_entry_input;

pub use animal::Animal;
pub use animal_input::AnimalInput;
pub use food_entry::FoodEntry;
pub use food_entry_input::{FoodEntryInput, FoodEntryMutationResponse};
pub use food_type::{FoodType, FoodTypeFilter};
pub use food_type_input::FoodTypeInput;
pub use history::{HistoryDetail, HistoryRecord, HistoryResponse};
pub use statistics::{AnimalWeight, FoodStatistics, StatisticsResponse};
pub use user::{LoginInput, LoginResponse, User};
pub use vitamin_entry::{VitaminEntry, VitaminStatus};
pub use weight_entry::WeightEntry;
pub use weight_entry_input::WeightEntryInput;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::{AppError, AppResult};

/// Timestamps go over the wire as RFC 3339 with millisecond precision.
pub(crate) fn serialize_utc_millis<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    dt.to_rfc3339_opts(SecondsFormat::Millis, true).serialize(serializer)
}

pub(crate) fn serialize_opt_utc_millis<S>(
    dt: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    dt.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .serialize(serializer)
}

/// Trims a required text field and checks it fits its column.
pub(crate) fn required_text(field: &str, value: &str, max_len: usize) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} can't be blank", field)));
    }
    if value.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(value.to_string())
}

/// Like [`required_text`] but blank input becomes `None`.
pub(crate) fn optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> AppResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => required_text(field, value, max_len).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("name", "  Peanut ", 64).unwrap(), "Peanut");
        assert!(matches!(
            required_text("name", "   ", 64),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_required_text_counts_characters_not_bytes() {
        assert!(required_text("label", "ééé", 3).is_ok());
        assert!(required_text("label", "éééé", 3).is_err());
    }

    #[test]
    fn test_optional_text_blank_is_none() {
        assert_eq!(optional_text("notes", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("notes", None, 10).unwrap(), None);
        assert_eq!(
            optional_text("notes", Some(" half a leaf "), 20).unwrap(),
            Some("half a leaf".to_string())
        );
    }
}
