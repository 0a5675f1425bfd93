//! Pure computations over the entry store and a goal snapshot. Missing
//! data is never an error here — absent days aggregate to zero. Only
//! invalid one-rep-max input is rejected.

use std::collections::HashMap;

use anyhow::{Result, bail};
use chrono::NaiveDate;

use crate::dates::{date_key, trailing_days};
use crate::goals::GoalRegistry;
use crate::models::{DailySummary, DailyTotals, DayRollup};
use crate::store::EntryStore;

/// Field-wise sum of the day's food entries. Commutative, so reordering
/// entries never changes the result.
#[must_use]
pub fn daily_totals(store: &EntryStore, date: NaiveDate) -> DailyTotals {
    let mut totals = DailyTotals::default();
    for entry in store.entries(date) {
        totals.accumulate(entry);
    }
    totals
}

/// Active calorie goal minus calories eaten. Unclamped: negative means
/// over budget.
#[must_use]
pub fn remaining(store: &EntryStore, goals: &GoalRegistry, date: NaiveDate) -> f64 {
    goals.active_calorie_goal() - daily_totals(store, date).calories
}

/// Percentage of goal reached, capped at 100. A goal of zero or less never
/// divides; it reads as 0%.
#[must_use]
pub fn progress_percent(current: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    (current / goal * 100.0).min(100.0)
}

/// Totals for the `days` dates ending at `end` inclusive, oldest first.
/// Days with no entries yield zero totals, not omission.
#[must_use]
pub fn weekly_rollup(store: &EntryStore, end: NaiveDate, days: u32) -> Vec<DayRollup> {
    trailing_days(end, days)
        .into_iter()
        .map(|date| DayRollup {
            date,
            totals: daily_totals(store, date),
        })
        .collect()
}

/// Names of the `top_n` most frequently logged foods across all history.
/// Descending count; ties keep the order the names were first encountered
/// in the scan (the sort is stable). Powers quick-add shortcuts.
#[must_use]
pub fn frequency_ranked(store: &EntryStore, top_n: usize) -> Vec<String> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut ranked: Vec<(String, usize)> = Vec::new();

    for (_, entry) in store.all_entries() {
        let key = entry.name.trim().to_lowercase();
        match index.get(&key) {
            Some(&i) => ranked[i].1 += 1,
            None => {
                index.insert(key, ranked.len());
                ranked.push((entry.name.clone(), 1));
            }
        }
    }

    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(top_n).map(|(name, _)| name).collect()
}

/// Estimated one-rep max from a submaximal set (Brzycki-style). A single
/// rep is the lift itself; the estimate's denominator goes non-positive
/// from 37 reps, so anything above 36 is rejected rather than guessed.
pub fn one_rep_max(weight: f64, reps: u32) -> Result<f64> {
    if reps == 0 {
        bail!("Reps must be at least 1");
    }
    if reps > 36 {
        bail!("1RM estimate is not defined above 36 reps");
    }
    if !weight.is_finite() || weight < 0.0 {
        bail!("Weight must be a non-negative number");
    }
    if reps == 1 {
        return Ok(weight);
    }
    Ok((weight / (1.0278 - 0.0278 * f64::from(reps))).round())
}

/// Total training volume for the day: Σ sets × reps × weight.
#[must_use]
pub fn daily_volume(store: &EntryStore, date: NaiveDate) -> f64 {
    store.sets(date).iter().map(crate::models::WorkoutSet::volume).sum()
}

/// Heaviest weight ever logged for an exercise, if any.
#[must_use]
pub fn personal_best(store: &EntryStore, exercise: &str) -> Option<f64> {
    store
        .all_sets()
        .filter(|(_, set)| set.exercise.eq_ignore_ascii_case(exercise))
        .map(|(_, set)| set.weight_kg)
        .fold(None, |best, w| Some(best.map_or(w, |b: f64| b.max(w))))
}

/// The full result record for one day: totals, remaining budget, and
/// progress against the active goals. Pure function of the current store
/// and goal snapshot.
#[must_use]
pub fn macro_summary(store: &EntryStore, goals: &GoalRegistry, date: NaiveDate) -> DailySummary {
    let totals = daily_totals(store, date);
    let config = goals.config();
    let calorie_goal = goals.active_calorie_goal();
    DailySummary {
        date: date_key(date),
        training_day: config.is_training_day,
        entries: store.entries(date).to_vec(),
        totals,
        calorie_goal,
        remaining: calorie_goal - totals.calories,
        calories_pct: progress_percent(totals.calories, calorie_goal),
        protein_pct: progress_percent(totals.protein, config.protein),
        carbs_pct: progress_percent(totals.carbs, config.carbs),
        fat_pct: progress_percent(totals.fat, config.fat),
    }
}
