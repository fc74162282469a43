use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::models::{Animal, AnimalWeight, FoodEntry, FoodStatistics, FoodType, WeightEntry};

#[derive(Default)]
struct LabelTally {
    count: usize,
    latest: Option<DateTime<Utc>>,
}

/// Frequency and recency of eligible food types over the given entries.
///
/// Types sharing a label are tallied together. Ties go to the label that
/// sorts first. With no eligible entries at all the result is empty, even if
/// eligible types exist.
pub fn food_statistics(food_types: &[FoodType], entries: &[FoodEntry]) -> FoodStatistics {
    let eligible: HashMap<i32, &str> = food_types
        .iter()
        .filter(|t| t.is_eligible())
        .map(|t| (t.id, t.label.as_str()))
        .collect();

    let mut tallies: BTreeMap<&str, LabelTally> = eligible
        .values()
        .map(|label| (*label, LabelTally::default()))
        .collect();

    let mut counted = 0;
    for entry in entries {
        let Some(label) = eligible.get(&entry.food_type_id) else {
            continue;
        };
        if let Some(tally) = tallies.get_mut(label) {
            tally.count += 1;
            tally.latest = tally.latest.max(Some(entry.created_at));
            counted += 1;
        }
    }

    if counted == 0 {
        return FoodStatistics::default();
    }

    let mut most: Option<(&str, usize)> = None;
    let mut least: Option<(&str, usize)> = None;
    let mut oldest: Option<(&str, DateTime<Utc>)> = None;
    let mut latest: Option<(&str, DateTime<Utc>)> = None;

    // BTreeMap iterates in label order, so strict comparisons keep the first label on ties
    for (label, tally) in &tallies {
        if most.map_or(true, |(_, count)| tally.count > count) {
            most = Some((label, tally.count));
        }
        if least.map_or(true, |(_, count)| tally.count < count) {
            least = Some((label, tally.count));
        }
        if let Some(at) = tally.latest {
            if oldest.map_or(true, |(_, best)| at < best) {
                oldest = Some((label, at));
            }
            if latest.map_or(true, |(_, best)| at > best) {
                latest = Some((label, at));
            }
        }
    }

    FoodStatistics {
        most_frequent: most.map(|(label, _)| label.to_string()),
        least_frequent: least.map(|(label, _)| label.to_string()),
        oldest: oldest.map(|(label, _)| label.to_string()),
        latest: latest.map(|(label, _)| label.to_string()),
    }
}

/// Latest weight per animal, ordered by name. Animals never weighed get `None`.
pub fn most_recent_weights(animals: &[Animal], weights: &[WeightEntry]) -> Vec<AnimalWeight> {
    let mut latest: HashMap<i32, &WeightEntry> = HashMap::new();
    for weight in weights {
        let newer = latest
            .get(&weight.animal_id)
            .map_or(true, |seen| (weight.created_at, weight.id) > (seen.created_at, seen.id));
        if newer {
            latest.insert(weight.animal_id, weight);
        }
    }

    let mut result: Vec<AnimalWeight> = animals
        .iter()
        .map(|animal| AnimalWeight {
            animal_id: animal.id,
            name: animal.name.clone(),
            value: latest.get(&animal.id).map(|w| w.value),
        })
        .collect();
    sort_by_name(&mut result);
    result
}

pub(crate) fn sort_by_name(weights: &mut [AnimalWeight]) {
    weights.sort_by(|a, b| a.name.cmp(&b.name).then(a.animal_id.cmp(&b.animal_id)));
}
