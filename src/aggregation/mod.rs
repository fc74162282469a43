//! Derived views over the entry store: time windows, food statistics,
//! latest weights, the merged history feed and the daily vitamin toggle.
//!
//! Nothing here is cached; every call re-reads the store.

pub mod history;
pub mod statistics;
pub mod vitamin;
pub mod window;

pub use history::{history_feed, HistoryFeed};
pub use statistics::{food_statistics, most_recent_weights};
pub use window::{resolve_window, TimeWindow, WindowSelector};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::{
    db::EntryStore,
    models::{AnimalWeight, FoodEntry, FoodStatistics, FoodTypeFilter, VitaminEntry, VitaminStatus},
    AppResult,
};

#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn EntryStore>,
    timezone: Tz,
}

impl Aggregator {
    pub fn new(store: Arc<dyn EntryStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        window::local_today(self.timezone, now)
    }

    pub fn resolve(&self, now: DateTime<Utc>, selector: &WindowSelector) -> AppResult<TimeWindow> {
        resolve_window(self.timezone, now, selector)
    }

    /// Statistics over all time for eligible food types
    pub async fn food_statistics(&self) -> AppResult<FoodStatistics> {
        let food_types = self.store.list_food_types(FoodTypeFilter::Eligible).await?;
        let entries = self.store.query_food_entries(None, None).await?;
        Ok(food_statistics(&food_types, &entries))
    }

    pub async fn latest_weights(&self) -> AppResult<Vec<AnimalWeight>> {
        let mut weights = self.store.most_recent_weight_per_animal().await?;
        statistics::sort_by_name(&mut weights);
        Ok(weights)
    }

    pub async fn history(&self, window: &TimeWindow) -> AppResult<HistoryFeed> {
        let (start, end) = (Some(window.start), Some(window.end));
        let food = self.store.query_food_entries(start, end).await?;
        let weight = self.store.query_weight_entries(start, end).await?;
        let vitamin = self.store.query_vitamin_entries(start, end).await?;

        tracing::debug!(
            food = food.len(),
            weight = weight.len(),
            vitamin = vitamin.len(),
            start = %window.start,
            end = %window.end,
            "Loaded history entries"
        );

        Ok(history_feed(food, weight, vitamin))
    }

    /// Food entries since local midnight
    pub async fn today_food_entries(&self, now: DateTime<Utc>) -> AppResult<Vec<FoodEntry>> {
        let start = window::start_of_day(self.timezone, now)?;
        self.store.query_food_entries(Some(start), None).await
    }

    pub async fn vitamin_today(&self, now: DateTime<Utc>) -> AppResult<Option<VitaminEntry>> {
        self.store.vitamin_entry_for_day(self.today(now)).await
    }

    pub async fn toggle_vitamin(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<VitaminStatus> {
        vitamin::toggle_vitamin(self.store.as_ref(), user_id, self.today(now), now).await
    }
}
