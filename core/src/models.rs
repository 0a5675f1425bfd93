use std::collections::BTreeMap;

use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregate::one_rep_max;

/// Clamp a logged amount to something safe to sum: non-finite or negative
/// values become 0 so they can never poison a daily total.
#[must_use]
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A single logged food item. Immutable once created — edits are modeled
/// as remove + re-add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodEntry {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub logged_at: String,
}

impl FoodEntry {
    pub fn new(name: &str, calories: f64, protein: f64, carbs: f64, fat: f64) -> Result<Self> {
        if name.trim().is_empty() {
            bail!("Food name must not be empty");
        }
        Ok(Self {
            name: name.trim().to_string(),
            calories: sanitize_amount(calories),
            protein: sanitize_amount(protein),
            carbs: sanitize_amount(carbs),
            fat: sanitize_amount(fat),
            logged_at: Local::now().to_rfc3339(),
        })
    }

    fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }

    // Names are compared trimmed + lowercased under both policies; the
    // amounts are finite after sanitize_amount, so bit equality is exact.
    pub(crate) fn dedupe_key(&self, policy: DedupePolicy) -> (String, u64, u64, u64, u64) {
        match policy {
            DedupePolicy::Fuzzy => (self.normalized_name(), self.calories.to_bits(), 0, 0, 0),
            DedupePolicy::Strict => (
                self.normalized_name(),
                self.calories.to_bits(),
                self.protein.to_bits(),
                self.carbs.to_bits(),
                self.fat.to_bits(),
            ),
        }
    }
}

/// Equality policy for food dedupe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupePolicy {
    /// All of name, calories, protein, carbs, and fat must match.
    Strict,
    /// Name and calories only.
    Fuzzy,
}

/// One logged resistance-training entry. `one_rep_max` is estimated at
/// creation time and cached, never recomputed from later data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub one_rep_max: f64,
    #[serde(default)]
    pub logged_at: String,
}

impl WorkoutSet {
    pub fn new(exercise: &str, sets: u32, reps: u32, weight_kg: f64) -> Result<Self> {
        if exercise.trim().is_empty() {
            bail!("Exercise name must not be empty");
        }
        if sets == 0 {
            bail!("Sets must be at least 1");
        }
        let one_rep_max = one_rep_max(weight_kg, reps)?;
        Ok(Self {
            exercise: exercise.trim().to_string(),
            sets,
            reps,
            weight_kg,
            one_rep_max,
            logged_at: Local::now().to_rfc3339(),
        })
    }

    /// Training volume of this entry: sets × reps × weight.
    #[must_use]
    pub fn volume(&self) -> f64 {
        f64::from(self.sets) * f64::from(self.reps) * self.weight_kg
    }
}

/// A custom tracker tile definition (water, steps, ...). Definitions
/// persist across days; the logged amounts are scoped to one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerDef {
    pub name: String,
    pub unit: String,
    pub step: f64,
}

impl TrackerDef {
    pub fn new(name: &str, unit: &str, step: f64) -> Result<Self> {
        if name.trim().is_empty() {
            bail!("Tracker name must not be empty");
        }
        if !step.is_finite() || step <= 0.0 {
            bail!("Tracker step must be a positive number");
        }
        Ok(Self {
            name: name.trim().to_string(),
            unit: unit.trim().to_string(),
            step,
        })
    }
}

/// A tracker's reading for one day.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerEntry {
    pub name: String,
    pub unit: String,
    pub step: f64,
    pub amount: f64,
}

/// Daily calorie/macro targets with the rest/training mode switch.
/// Exactly one calorie target is active at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalConfig {
    pub rest_calories: f64,
    pub train_calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub is_training_day: bool,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            rest_calories: 1500.0,
            train_calories: 1800.0,
            protein: 200.0,
            carbs: 145.0,
            fat: 45.0,
            is_training_day: false,
        }
    }
}

/// The five settable goal targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    RestCalories,
    TrainCalories,
    Protein,
    Carbs,
    Fat,
}

impl GoalKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rest" | "rest-calories" => Ok(Self::RestCalories),
            "train" | "train-calories" => Ok(Self::TrainCalories),
            "protein" => Ok(Self::Protein),
            "carbs" => Ok(Self::Carbs),
            "fat" => Ok(Self::Fat),
            _ => bail!("Invalid goal '{s}'. Use rest, train, protein, carbs, or fat"),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RestCalories => "rest",
            Self::TrainCalories => "train",
            Self::Protein => "protein",
            Self::Carbs => "carbs",
            Self::Fat => "fat",
        }
    }
}

/// Field-wise sum of a day's food entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailyTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl DailyTotals {
    pub(crate) fn accumulate(&mut self, entry: &FoodEntry) {
        self.calories += entry.calories;
        self.protein += entry.protein;
        self.carbs += entry.carbs;
        self.fat += entry.fat;
    }
}

/// Totals for one calendar day within a multi-day rollup.
#[derive(Debug, Clone, Serialize)]
pub struct DayRollup {
    pub date: NaiveDate,
    pub totals: DailyTotals,
}

/// Immutable result record for one day, handed to rendering.
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: String,
    pub training_day: bool,
    pub entries: Vec<FoodEntry>,
    pub totals: DailyTotals,
    pub calorie_goal: f64,
    /// Active goal minus calories eaten; negative when over budget.
    pub remaining: f64,
    pub calories_pct: f64,
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

/// A candidate food record from nutrition lookup or photo classification,
/// expressed per 100 g. Consumed through the manual-confirmation path,
/// never auto-committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodCandidate {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

impl FoodCandidate {
    /// Scale the per-100g values to a serving and stamp a log entry.
    pub fn to_entry(&self, serving_g: f64) -> Result<FoodEntry> {
        if !serving_g.is_finite() || serving_g <= 0.0 {
            bail!("Serving size must be greater than 0");
        }
        let factor = serving_g / 100.0;
        FoodEntry::new(
            &self.name,
            self.calories * factor,
            self.protein * factor,
            self.carbs * factor,
            self.fat * factor,
        )
    }
}

/// A body-weight reading; one per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

/// Full-state export payload, also used as the cloud-sync snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: i64,
    pub exported_at: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub food_log: BTreeMap<NaiveDate, Vec<FoodEntry>>,
    #[serde(default)]
    pub workout_log: BTreeMap<NaiveDate, Vec<WorkoutSet>>,
    #[serde(default)]
    pub weight_history: BTreeMap<NaiveDate, f64>,
    #[serde(default)]
    pub tracker_defs: Vec<TrackerDef>,
    #[serde(default)]
    pub tracker_log: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
    #[serde(default)]
    pub goals: GoalConfig,
}

pub const SNAPSHOT_VERSION: i64 = 1;
