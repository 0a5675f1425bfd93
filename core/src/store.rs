use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::NaiveDate;

use crate::models::{
    DedupePolicy, FoodEntry, TrackerDef, TrackerEntry, WeightEntry, WorkoutSet, sanitize_amount,
};
use crate::persist::{Persistence, keys, load_json, save_json};

/// In-memory log of everything the user has recorded, keyed by local
/// calendar day. Mutations apply to memory first and are persisted before
/// returning, so a read right after a write always observes the write and
/// a crash after a confirmed action never loses it. Historical days stay
/// queryable indefinitely.
pub struct EntryStore {
    persist: Arc<dyn Persistence>,
    food: BTreeMap<NaiveDate, Vec<FoodEntry>>,
    workouts: BTreeMap<NaiveDate, Vec<WorkoutSet>>,
    weights: BTreeMap<NaiveDate, f64>,
    tracker_defs: Vec<TrackerDef>,
    trackers: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

impl EntryStore {
    /// Load the store from persistence. Missing or corrupt buckets come up
    /// empty rather than failing the open.
    pub fn open(persist: Arc<dyn Persistence>) -> Self {
        let food = load_json(persist.as_ref(), keys::FOOD_LOGS);
        let workouts = load_json(persist.as_ref(), keys::WORKOUT_LOGS);
        let weights = load_json(persist.as_ref(), keys::WEIGHT_HISTORY);
        let tracker_defs = load_json(persist.as_ref(), keys::TRACKER_DEFS);
        let trackers = load_json(persist.as_ref(), keys::TRACKER_LOGS);
        Self {
            persist,
            food,
            workouts,
            weights,
            tracker_defs,
            trackers,
        }
    }

    fn save_food(&self) -> Result<()> {
        save_json(self.persist.as_ref(), keys::FOOD_LOGS, &self.food)
    }

    fn save_workouts(&self) -> Result<()> {
        save_json(self.persist.as_ref(), keys::WORKOUT_LOGS, &self.workouts)
    }

    fn save_weights(&self) -> Result<()> {
        save_json(self.persist.as_ref(), keys::WEIGHT_HISTORY, &self.weights)
    }

    fn save_trackers(&self) -> Result<()> {
        save_json(self.persist.as_ref(), keys::TRACKER_DEFS, &self.tracker_defs)?;
        save_json(self.persist.as_ref(), keys::TRACKER_LOGS, &self.trackers)
    }

    // --- Food entries ---

    /// Append an entry to the day's list. Never overwrites.
    pub fn add_entry(&mut self, date: NaiveDate, entry: FoodEntry) -> Result<()> {
        self.food.entry(date).or_default().push(entry);
        self.save_food()
    }

    /// Remove by positional index. An out-of-range index is a silent no-op
    /// (`Ok(false)`), never an error.
    pub fn remove_entry(&mut self, date: NaiveDate, index: usize) -> Result<bool> {
        let Some(list) = self.food.get_mut(&date) else {
            return Ok(false);
        };
        if index >= list.len() {
            return Ok(false);
        }
        list.remove(index);
        if list.is_empty() {
            self.food.remove(&date);
        }
        self.save_food()?;
        Ok(true)
    }

    /// The day's entries in insertion order; empty for unknown dates.
    #[must_use]
    pub fn entries(&self, date: NaiveDate) -> &[FoodEntry] {
        self.food.get(&date).map_or(&[], Vec::as_slice)
    }

    /// Remove later duplicates under the policy, keeping the first
    /// occurrence of each key. Returns the number removed; calling it again
    /// removes nothing.
    pub fn deduplicate(&mut self, date: NaiveDate, policy: DedupePolicy) -> Result<usize> {
        let Some(list) = self.food.get_mut(&date) else {
            return Ok(0);
        };
        let before = list.len();
        let mut seen = HashSet::new();
        list.retain(|entry| seen.insert(entry.dedupe_key(policy)));
        let removed = before - list.len();
        if removed > 0 {
            self.save_food()?;
        }
        Ok(removed)
    }

    /// Every entry across every date, oldest day first, insertion order
    /// within a day.
    pub fn all_entries(&self) -> impl Iterator<Item = (NaiveDate, &FoodEntry)> {
        self.food
            .iter()
            .flat_map(|(date, list)| list.iter().map(move |entry| (*date, entry)))
    }

    // --- Workout sets ---

    pub fn add_set(&mut self, date: NaiveDate, set: WorkoutSet) -> Result<()> {
        self.workouts.entry(date).or_default().push(set);
        self.save_workouts()
    }

    #[must_use]
    pub fn sets(&self, date: NaiveDate) -> &[WorkoutSet] {
        self.workouts.get(&date).map_or(&[], Vec::as_slice)
    }

    pub fn all_sets(&self) -> impl Iterator<Item = (NaiveDate, &WorkoutSet)> {
        self.workouts
            .iter()
            .flat_map(|(date, list)| list.iter().map(move |set| (*date, set)))
    }

    // --- Body weight ---

    /// Record a weight reading, replacing any earlier reading for the day.
    pub fn log_weight(&mut self, date: NaiveDate, weight_kg: f64) -> Result<()> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            bail!("Weight must be greater than 0");
        }
        self.weights.insert(date, weight_kg);
        self.save_weights()
    }

    #[must_use]
    pub fn weight_history(&self) -> Vec<WeightEntry> {
        self.weights
            .iter()
            .map(|(date, kg)| WeightEntry {
                date: *date,
                weight_kg: *kg,
            })
            .collect()
    }

    #[must_use]
    pub fn latest_weight(&self) -> Option<WeightEntry> {
        self.weights
            .iter()
            .next_back()
            .map(|(date, kg)| WeightEntry {
                date: *date,
                weight_kg: *kg,
            })
    }

    // --- Custom trackers ---

    /// Create or redefine a tracker tile. Redefining keeps logged amounts.
    pub fn define_tracker(&mut self, def: TrackerDef) -> Result<()> {
        if let Some(existing) = self
            .tracker_defs
            .iter_mut()
            .find(|d| d.name.eq_ignore_ascii_case(&def.name))
        {
            *existing = def;
        } else {
            self.tracker_defs.push(def);
        }
        self.save_trackers()
    }

    /// Drop a tracker and all its logged amounts. Returns false when no
    /// such tracker exists.
    pub fn remove_tracker(&mut self, name: &str) -> Result<bool> {
        let before = self.tracker_defs.len();
        self.tracker_defs
            .retain(|d| !d.name.eq_ignore_ascii_case(name));
        if self.tracker_defs.len() == before {
            return Ok(false);
        }
        for day in self.trackers.values_mut() {
            day.retain(|logged, _| !logged.eq_ignore_ascii_case(name));
        }
        self.trackers.retain(|_, day| !day.is_empty());
        self.save_trackers()?;
        Ok(true)
    }

    /// Bump the tracker by its step for the given day and return the new
    /// amount. Amounts are scoped to the day; a new day starts from zero.
    pub fn increment_tracker(&mut self, date: NaiveDate, name: &str) -> Result<f64> {
        let Some(def) = self
            .tracker_defs
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
        else {
            bail!("No tracker named '{name}'. Define it with `track define` first");
        };
        let step = def.step;
        let key = def.name.clone();
        let amount = self
            .trackers
            .entry(date)
            .or_default()
            .entry(key)
            .or_insert(0.0);
        *amount = sanitize_amount(*amount + step);
        let amount = *amount;
        self.save_trackers()?;
        Ok(amount)
    }

    /// One reading per defined tracker for the day; trackers with nothing
    /// logged that day read zero.
    #[must_use]
    pub fn tracker_entries(&self, date: NaiveDate) -> Vec<TrackerEntry> {
        let day = self.trackers.get(&date);
        self.tracker_defs
            .iter()
            .map(|def| TrackerEntry {
                name: def.name.clone(),
                unit: def.unit.clone(),
                step: def.step,
                amount: day.and_then(|d| d.get(&def.name)).copied().unwrap_or(0.0),
            })
            .collect()
    }

    #[must_use]
    pub fn tracker_defs(&self) -> &[TrackerDef] {
        &self.tracker_defs
    }

    // --- Snapshot access (export / sync) ---

    #[must_use]
    pub fn food_log(&self) -> &BTreeMap<NaiveDate, Vec<FoodEntry>> {
        &self.food
    }

    #[must_use]
    pub fn workout_log(&self) -> &BTreeMap<NaiveDate, Vec<WorkoutSet>> {
        &self.workouts
    }

    #[must_use]
    pub fn weight_log(&self) -> &BTreeMap<NaiveDate, f64> {
        &self.weights
    }

    #[must_use]
    pub fn tracker_log(&self) -> &BTreeMap<NaiveDate, BTreeMap<String, f64>> {
        &self.trackers
    }

    /// Replace the whole store wholesale (JSON import). Persists every
    /// bucket before returning.
    pub fn replace_all(
        &mut self,
        food: BTreeMap<NaiveDate, Vec<FoodEntry>>,
        workouts: BTreeMap<NaiveDate, Vec<WorkoutSet>>,
        weights: BTreeMap<NaiveDate, f64>,
        tracker_defs: Vec<TrackerDef>,
        trackers: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
    ) -> Result<()> {
        self.food = food;
        self.workouts = workouts;
        self.weights = weights;
        self.tracker_defs = tracker_defs;
        self.trackers = trackers;
        self.save_food()?;
        self.save_workouts()?;
        self.save_weights()?;
        self.save_trackers()
    }

    /// Replace one day's food log wholesale (CSV import).
    pub fn replace_day(&mut self, date: NaiveDate, entries: Vec<FoodEntry>) -> Result<()> {
        if entries.is_empty() {
            self.food.remove(&date);
        } else {
            self.food.insert(date, entries);
        }
        self.save_food()
    }

    /// Merge a remote snapshot: remote date keys and tracker definitions
    /// overwrite matching local ones, local-only keys survive.
    pub fn merge_remote(&mut self, snapshot: &crate::models::Snapshot) -> Result<()> {
        for (date, entries) in &snapshot.food_log {
            self.food.insert(*date, entries.clone());
        }
        for (date, sets) in &snapshot.workout_log {
            self.workouts.insert(*date, sets.clone());
        }
        for (date, kg) in &snapshot.weight_history {
            self.weights.insert(*date, *kg);
        }
        for def in &snapshot.tracker_defs {
            if let Some(existing) = self
                .tracker_defs
                .iter_mut()
                .find(|d| d.name.eq_ignore_ascii_case(&def.name))
            {
                *existing = def.clone();
            } else {
                self.tracker_defs.push(def.clone());
            }
        }
        for (date, day) in &snapshot.tracker_log {
            self.trackers.insert(*date, day.clone());
        }
        self.save_food()?;
        self.save_workouts()?;
        self.save_weights()?;
        self.save_trackers()
    }
}
