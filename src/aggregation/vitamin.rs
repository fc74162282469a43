use chrono::{DateTime, NaiveDate, Utc};

use crate::{db::EntryStore, models::VitaminStatus, AppError, AppResult};

/// Flips the day between given and not given.
///
/// The insert is conditional on the day being free, so two toggles racing
/// from "not given" can't both insert: the loser sees the conflict and
/// deletes instead.
pub async fn toggle_vitamin(
    store: &dyn EntryStore,
    user_id: i32,
    day: NaiveDate,
    at: DateTime<Utc>,
) -> AppResult<VitaminStatus> {
    let inserted = match store.insert_vitamin_entry(user_id, day, at).await {
        Ok(entry) => entry,
        Err(AppError::Conflict(_)) => None,
        Err(e) => return Err(e),
    };

    if let Some(entry) = inserted {
        tracing::info!(user_id, %day, "Vitamin marked as given");
        return Ok(VitaminStatus {
            day,
            given: true,
            entry: Some(entry),
        });
    }

    let removed = store.delete_vitamin_entries_for_day(day).await?;
    if removed > 1 {
        tracing::warn!(user_id, %day, removed, "Removed duplicate vitamin entries");
    } else {
        tracing::info!(user_id, %day, removed, "Vitamin unmarked");
    }

    Ok(VitaminStatus {
        day,
        given: false,
        entry: None,
    })
}
