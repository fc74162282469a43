//! Persistence for users, animals, food types and entries.
//!
//! Handlers and the aggregation engine only see [`EntryStore`]; the
//! Postgres and in-memory backends are interchangeable behind it.

pub mod memory;
pub mod pool;
pub mod postgres;

pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations};
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    models::{
        Animal, AnimalInput, AnimalWeight, FoodEntry, FoodEntryInput, FoodType, FoodTypeFilter,
        FoodTypeInput, User, VitaminEntry, WeightEntry, WeightEntryInput,
    },
    AppResult,
};

/// Range queries take optional bounds: `start` is inclusive, `end` exclusive,
/// a missing bound is unbounded. Results are ascending by timestamp.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn find_or_create_user(&self, name: &str) -> AppResult<User>;
    async fn get_user(&self, id: i32) -> AppResult<Option<User>>;

    /// Ordered by name
    async fn list_animals(&self) -> AppResult<Vec<Animal>>;
    async fn get_animal(&self, id: i32) -> AppResult<Option<Animal>>;
    async fn create_animal(&self, input: &AnimalInput) -> AppResult<Animal>;
    async fn update_animal(&self, id: i32, input: &AnimalInput) -> AppResult<Option<Animal>>;

    /// Ordered by label
    async fn list_food_types(&self, filter: FoodTypeFilter) -> AppResult<Vec<FoodType>>;
    async fn get_food_type(&self, id: i32) -> AppResult<Option<FoodType>>;
    async fn create_food_type(&self, input: &FoodTypeInput) -> AppResult<FoodType>;
    async fn update_food_type(&self, id: i32, input: &FoodTypeInput)
        -> AppResult<Option<FoodType>>;

    async fn query_food_entries(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<FoodEntry>>;
    async fn get_food_entry(&self, id: i32) -> AppResult<Option<FoodEntry>>;
    async fn create_food_entry(
        &self,
        user_id: i32,
        input: &FoodEntryInput,
        at: DateTime<Utc>,
    ) -> AppResult<FoodEntry>;
    /// Replaces type, notes, animals and author; the timestamp is kept.
    async fn update_food_entry(
        &self,
        id: i32,
        user_id: i32,
        input: &FoodEntryInput,
    ) -> AppResult<Option<FoodEntry>>;
    /// Clears the animal associations, then removes the entry. `false` if it didn't exist.
    async fn delete_food_entry(&self, id: i32) -> AppResult<bool>;

    async fn query_weight_entries(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<WeightEntry>>;
    async fn get_weight_entry(&self, id: i32) -> AppResult<Option<WeightEntry>>;
    async fn create_weight_entry(
        &self,
        user_id: i32,
        input: &WeightEntryInput,
        at: DateTime<Utc>,
    ) -> AppResult<WeightEntry>;
    async fn update_weight_entry(
        &self,
        id: i32,
        user_id: i32,
        input: &WeightEntryInput,
    ) -> AppResult<Option<WeightEntry>>;
    /// Every animal, weighed or not, ordered by name
    async fn most_recent_weight_per_animal(&self) -> AppResult<Vec<AnimalWeight>>;

    async fn query_vitamin_entries(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<VitaminEntry>>;
    async fn vitamin_entry_for_day(&self, day: NaiveDate) -> AppResult<Option<VitaminEntry>>;
    async fn delete_vitamin_entries_for_day(&self, day: NaiveDate) -> AppResult<u64>;
    /// Inserts unless the day already has an entry, atomically. `None` on conflict.
    async fn insert_vitamin_entry(
        &self,
        user_id: i32,
        day: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<Option<VitaminEntry>>;
}
