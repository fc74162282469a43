use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Mutex, MutexGuard};

use super::EntryStore;
use crate::{
    aggregation::most_recent_weights,
    models::{
        Animal, AnimalInput, AnimalWeight, FoodEntry, FoodEntryInput, FoodType, FoodTypeFilter,
        FoodTypeInput, User, VitaminEntry, WeightEntry, WeightEntryInput,
    },
    AppError, AppResult,
};

struct FoodEntryRow {
    id: i32,
    food_type_id: i32,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    user_id: i32,
}

struct WeightEntryRow {
    id: i32,
    value: f64,
    animal_id: i32,
    created_at: DateTime<Utc>,
    user_id: i32,
}

struct VitaminEntryRow {
    id: i32,
    day: NaiveDate,
    created_at: DateTime<Utc>,
    user_id: i32,
}

#[derive(Default)]
struct MemoryState {
    last_id: i32,
    users: Vec<User>,
    animals: Vec<Animal>,
    food_types: Vec<FoodType>,
    food_entries: Vec<FoodEntryRow>,
    /// (food_entry_id, animal_id) join rows
    food_entry_animals: Vec<(i32, i32)>,
    weight_entries: Vec<WeightEntryRow>,
    vitamin_entries: Vec<VitaminEntryRow>,
}

fn in_range(at: DateTime<Utc>, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    start.map_or(true, |start| at >= start) && end.map_or(true, |end| at < end)
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn user_name(&self, id: i32) -> AppResult<String> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .ok_or_else(|| AppError::Internal(format!("User {} missing", id)))
    }

    fn animal(&self, id: i32) -> AppResult<Animal> {
        self.animals
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("Animal {} missing", id)))
    }

    fn food_entry(&self, row: &FoodEntryRow) -> AppResult<FoodEntry> {
        let food_type_label = self
            .food_types
            .iter()
            .find(|t| t.id == row.food_type_id)
            .map(|t| t.label.clone())
            .ok_or_else(|| AppError::Internal(format!("Food type {} missing", row.food_type_id)))?;

        let mut animals = self
            .food_entry_animals
            .iter()
            .filter(|(entry_id, _)| *entry_id == row.id)
            .map(|(_, animal_id)| self.animal(*animal_id))
            .collect::<AppResult<Vec<_>>>()?;
        animals.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(FoodEntry {
            id: row.id,
            food_type_id: row.food_type_id,
            food_type_label,
            notes: row.notes.clone(),
            created_at: row.created_at,
            user_id: row.user_id,
            user_name: self.user_name(row.user_id)?,
            animals,
        })
    }

    fn weight_entry(&self, row: &WeightEntryRow) -> AppResult<WeightEntry> {
        Ok(WeightEntry {
            id: row.id,
            value: row.value,
            animal_id: row.animal_id,
            animal_name: self.animal(row.animal_id)?.name,
            created_at: row.created_at,
            user_id: row.user_id,
            user_name: self.user_name(row.user_id)?,
        })
    }

    fn vitamin_entry(&self, row: &VitaminEntryRow) -> AppResult<VitaminEntry> {
        Ok(VitaminEntry {
            id: row.id,
            day: row.day,
            created_at: row.created_at,
            user_id: row.user_id,
            user_name: self.user_name(row.user_id)?,
        })
    }

    fn sorted_animals(&self) -> Vec<Animal> {
        let mut animals = self.animals.clone();
        animals.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        animals
    }

    fn weight_entries_in(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<WeightEntry>> {
        let mut rows: Vec<_> = self
            .weight_entries
            .iter()
            .filter(|row| in_range(row.created_at, start, end))
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows.into_iter().map(|row| self.weight_entry(row)).collect()
    }

    fn link_animals(&mut self, food_entry_id: i32, animal_ids: &[i32]) {
        self.food_entry_animals.retain(|(entry_id, _)| *entry_id != food_entry_id);
        self.food_entry_animals
            .extend(animal_ids.iter().map(|animal_id| (food_entry_id, *animal_id)));
    }
}

/// Store kept in process memory, for tests and `DATABASE_URL=memory` demos.
/// All state lives behind one lock, so every operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> AppResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("Memory store lock poisoned".to_string()))
    }

    #[cfg(test)]
    pub(crate) fn join_row_count(&self) -> usize {
        self.state().map(|s| s.food_entry_animals.len()).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn vitamin_row_count(&self, day: NaiveDate) -> usize {
        self.state()
            .map(|s| s.vitamin_entries.iter().filter(|v| v.day == day).count())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn find_or_create_user(&self, name: &str) -> AppResult<User> {
        let mut state = self.state()?;
        if let Some(user) = state.users.iter().find(|u| u.name == name) {
            return Ok(user.clone());
        }

        let user = User {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i32) -> AppResult<Option<User>> {
        let state = self.state()?;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_animals(&self) -> AppResult<Vec<Animal>> {
        Ok(self.state()?.sorted_animals())
    }

    async fn get_animal(&self, id: i32) -> AppResult<Option<Animal>> {
        let state = self.state()?;
        Ok(state.animals.iter().find(|a| a.id == id).cloned())
    }

    async fn create_animal(&self, input: &AnimalInput) -> AppResult<Animal> {
        let mut state = self.state()?;
        let animal = Animal {
            id: state.next_id(),
            name: input.name.clone(),
        };
        state.animals.push(animal.clone());
        Ok(animal)
    }

    async fn update_animal(&self, id: i32, input: &AnimalInput) -> AppResult<Option<Animal>> {
        let mut state = self.state()?;
        Ok(state.animals.iter_mut().find(|a| a.id == id).map(|animal| {
            animal.name = input.name.clone();
            animal.clone()
        }))
    }

    async fn list_food_types(&self, filter: FoodTypeFilter) -> AppResult<Vec<FoodType>> {
        let state = self.state()?;
        let mut food_types: Vec<_> = state
            .food_types
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        food_types.sort_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));
        Ok(food_types)
    }

    async fn get_food_type(&self, id: i32) -> AppResult<Option<FoodType>> {
        let state = self.state()?;
        Ok(state.food_types.iter().find(|t| t.id == id).cloned())
    }

    async fn create_food_type(&self, input: &FoodTypeInput) -> AppResult<FoodType> {
        let mut state = self.state()?;
        let food_type = FoodType {
            id: state.next_id(),
            label: input.label.clone(),
            recommendations: input.recommendations.clone(),
            included_in_statistics: input.included_in_statistics,
            is_hidden: input.is_hidden,
        };
        state.food_types.push(food_type.clone());
        Ok(food_type)
    }

    async fn update_food_type(
        &self,
        id: i32,
        input: &FoodTypeInput,
    ) -> AppResult<Option<FoodType>> {
        let mut state = self.state()?;
        Ok(state.food_types.iter_mut().find(|t| t.id == id).map(|food_type| {
            food_type.label = input.label.clone();
            food_type.recommendations = input.recommendations.clone();
            food_type.included_in_statistics = input.included_in_statistics;
            food_type.is_hidden = input.is_hidden;
            food_type.clone()
        }))
    }

    async fn query_food_entries(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<FoodEntry>> {
        let state = self.state()?;
        let mut rows: Vec<_> = state
            .food_entries
            .iter()
            .filter(|row| in_range(row.created_at, start, end))
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows.into_iter().map(|row| state.food_entry(row)).collect()
    }

    async fn get_food_entry(&self, id: i32) -> AppResult<Option<FoodEntry>> {
        let state = self.state()?;
        state
            .food_entries
            .iter()
            .find(|row| row.id == id)
            .map(|row| state.food_entry(row))
            .transpose()
    }

    async fn create_food_entry(
        &self,
        user_id: i32,
        input: &FoodEntryInput,
        at: DateTime<Utc>,
    ) -> AppResult<FoodEntry> {
        let mut state = self.state()?;
        let id = state.next_id();
        state.food_entries.push(FoodEntryRow {
            id,
            food_type_id: input.food_type_id,
            notes: input.notes.clone(),
            created_at: at,
            user_id,
        });
        state.link_animals(id, &input.animal_ids);

        let row = state.food_entries.last().map(|row| state.food_entry(row));
        row.unwrap_or_else(|| Err(AppError::Internal(format!("Food entry {} vanished", id))))
    }

    async fn update_food_entry(
        &self,
        id: i32,
        user_id: i32,
        input: &FoodEntryInput,
    ) -> AppResult<Option<FoodEntry>> {
        let mut state = self.state()?;
        let Some(row) = state.food_entries.iter_mut().find(|row| row.id == id) else {
            return Ok(None);
        };
        row.food_type_id = input.food_type_id;
        row.notes = input.notes.clone();
        row.user_id = user_id;
        state.link_animals(id, &input.animal_ids);

        state
            .food_entries
            .iter()
            .find(|row| row.id == id)
            .map(|row| state.food_entry(row))
            .transpose()
    }

    async fn delete_food_entry(&self, id: i32) -> AppResult<bool> {
        let mut state = self.state()?;
        state.food_entry_animals.retain(|(entry_id, _)| *entry_id != id);

        let before = state.food_entries.len();
        state.food_entries.retain(|row| row.id != id);
        Ok(state.food_entries.len() < before)
    }

    async fn query_weight_entries(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<WeightEntry>> {
        self.state()?.weight_entries_in(start, end)
    }

    async fn get_weight_entry(&self, id: i32) -> AppResult<Option<WeightEntry>> {
        let state = self.state()?;
        state
            .weight_entries
            .iter()
            .find(|row| row.id == id)
            .map(|row| state.weight_entry(row))
            .transpose()
    }

    async fn create_weight_entry(
        &self,
        user_id: i32,
        input: &WeightEntryInput,
        at: DateTime<Utc>,
    ) -> AppResult<WeightEntry> {
        let mut state = self.state()?;
        let row = WeightEntryRow {
            id: state.next_id(),
            value: input.value,
            animal_id: input.animal_id,
            created_at: at,
            user_id,
        };
        let entry = state.weight_entry(&row)?;
        state.weight_entries.push(row);
        Ok(entry)
    }

    async fn update_weight_entry(
        &self,
        id: i32,
        user_id: i32,
        input: &WeightEntryInput,
    ) -> AppResult<Option<WeightEntry>> {
        let mut state = self.state()?;
        let Some(row) = state.weight_entries.iter_mut().find(|row| row.id == id) else {
            return Ok(None);
        };
        row.value = input.value;
        row.animal_id = input.animal_id;
        row.user_id = user_id;

        state
            .weight_entries
            .iter()
            .find(|row| row.id == id)
            .map(|row| state.weight_entry(row))
            .transpose()
    }

    async fn most_recent_weight_per_animal(&self) -> AppResult<Vec<AnimalWeight>> {
        let state = self.state()?;
        let weights = state.weight_entries_in(None, None)?;
        Ok(most_recent_weights(&state.sorted_animals(), &weights))
    }

    async fn query_vitamin_entries(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<VitaminEntry>> {
        let state = self.state()?;
        let mut rows: Vec<_> = state
            .vitamin_entries
            .iter()
            .filter(|row| in_range(row.created_at, start, end))
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows.into_iter().map(|row| state.vitamin_entry(row)).collect()
    }

    async fn vitamin_entry_for_day(&self, day: NaiveDate) -> AppResult<Option<VitaminEntry>> {
        let state = self.state()?;
        state
            .vitamin_entries
            .iter()
            .find(|row| row.day == day)
            .map(|row| state.vitamin_entry(row))
            .transpose()
    }

    async fn delete_vitamin_entries_for_day(&self, day: NaiveDate) -> AppResult<u64> {
        let mut state = self.state()?;
        let before = state.vitamin_entries.len();
        state.vitamin_entries.retain(|row| row.day != day);
        Ok((before - state.vitamin_entries.len()) as u64)
    }

    async fn insert_vitamin_entry(
        &self,
        user_id: i32,
        day: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<Option<VitaminEntry>> {
        let mut state = self.state()?;
        if state.vitamin_entries.iter().any(|row| row.day == day) {
            return Ok(None);
        }

        let row = VitaminEntryRow {
            id: state.next_id(),
            day,
            created_at: at,
            user_id,
        };
        let entry = state.vitamin_entry(&row)?;
        state.vitamin_entries.push(row);
        Ok(Some(entry))
    }
}
