use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use uuid::Uuid;

use crate::aggregate;
use crate::export::{self, CsvImport};
use crate::goals::GoalRegistry;
use crate::models::{
    DailySummary, DayRollup, DedupePolicy, FoodCandidate, FoodEntry, GoalConfig, GoalKind,
    SNAPSHOT_VERSION, Snapshot, TrackerDef, TrackerEntry, WeightEntry, WorkoutSet,
};
use crate::persist::{Persistence, SqliteStore, keys, load_json, save_json};
use crate::store::EntryStore;
use crate::sync::{CloudSync, merge_snapshot};

/// Platform-native nutrition lookup provider (barcode or free text).
///
/// The CLI implements this with reqwest; a mobile shell would bring its
/// own HTTP stack. "Not found" is an ordinary outcome, not an error.
pub trait NutritionLookup: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<FoodCandidate>>;
    fn lookup_barcode(&self, code: &str) -> Result<Option<FoodCandidate>>;
}

/// Meal-photo classification backed by an external AI service. The result
/// gets no special trust: callers route it through the same
/// confirm-then-log path as any lookup result.
pub trait MealClassifier: Send + Sync {
    fn classify(&self, image: &[u8]) -> Result<Option<FoodCandidate>>;
}

/// Facade over the entry store and goal registry. All mutation funnels
/// through here; rendering code only ever sees the returned records.
pub struct TallyService {
    persist: Arc<dyn Persistence>,
    store: EntryStore,
    goals: GoalRegistry,
}

impl TallyService {
    #[must_use]
    pub fn open(persist: Arc<dyn Persistence>) -> Self {
        let store = EntryStore::open(Arc::clone(&persist));
        let goals = GoalRegistry::open(Arc::clone(&persist));
        Self {
            persist,
            store,
            goals,
        }
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::open(Arc::new(SqliteStore::open(path)?)))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::open(Arc::new(SqliteStore::open_in_memory()?)))
    }

    // --- Food log ---

    pub fn log_food(
        &mut self,
        date: NaiveDate,
        name: &str,
        calories: f64,
        protein: f64,
        carbs: f64,
        fat: f64,
    ) -> Result<FoodEntry> {
        let entry = FoodEntry::new(name, calories, protein, carbs, fat)?;
        self.store.add_entry(date, entry.clone())?;
        Ok(entry)
    }

    /// Log a confirmed lookup/classification candidate scaled to a serving.
    pub fn log_candidate(
        &mut self,
        date: NaiveDate,
        candidate: &FoodCandidate,
        serving_g: f64,
    ) -> Result<FoodEntry> {
        let entry = candidate.to_entry(serving_g)?;
        self.store.add_entry(date, entry.clone())?;
        Ok(entry)
    }

    pub fn remove_food(&mut self, date: NaiveDate, index: usize) -> Result<bool> {
        self.store.remove_entry(date, index)
    }

    pub fn dedupe(&mut self, date: NaiveDate, policy: DedupePolicy) -> Result<usize> {
        self.store.deduplicate(date, policy)
    }

    // --- Aggregation ---

    #[must_use]
    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        aggregate::macro_summary(&self.store, &self.goals, date)
    }

    #[must_use]
    pub fn weekly_rollup(&self, end: NaiveDate, days: u32) -> Vec<DayRollup> {
        aggregate::weekly_rollup(&self.store, end, days)
    }

    #[must_use]
    pub fn frequent_foods(&self, top_n: usize) -> Vec<String> {
        aggregate::frequency_ranked(&self.store, top_n)
    }

    // --- Workouts ---

    /// Log a set; the 1RM estimate is computed here and cached on the
    /// entry. Returns the entry plus whether it set a new personal best.
    pub fn log_workout(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        sets: u32,
        reps: u32,
        weight_kg: f64,
    ) -> Result<(WorkoutSet, bool)> {
        let previous_best = aggregate::personal_best(&self.store, exercise);
        let set = WorkoutSet::new(exercise, sets, reps, weight_kg)?;
        let is_pb = previous_best.is_some_and(|best| weight_kg > best);
        self.store.add_set(date, set.clone())?;
        Ok((set, is_pb))
    }

    #[must_use]
    pub fn workout_day(&self, date: NaiveDate) -> (&[WorkoutSet], f64) {
        (
            self.store.sets(date),
            aggregate::daily_volume(&self.store, date),
        )
    }

    #[must_use]
    pub fn personal_best(&self, exercise: &str) -> Option<f64> {
        aggregate::personal_best(&self.store, exercise)
    }

    // --- Goals ---

    pub fn set_goal(&mut self, kind: GoalKind, value: f64) -> Result<()> {
        self.goals.set_goal(kind, value)
    }

    pub fn toggle_training_mode(&mut self) -> Result<f64> {
        self.goals.toggle_training_mode()
    }

    #[must_use]
    pub fn goals(&self) -> &GoalConfig {
        self.goals.config()
    }

    #[must_use]
    pub fn active_calorie_goal(&self) -> f64 {
        self.goals.active_calorie_goal()
    }

    // --- Trackers ---

    pub fn define_tracker(&mut self, name: &str, unit: &str, step: f64) -> Result<()> {
        self.store.define_tracker(TrackerDef::new(name, unit, step)?)
    }

    pub fn remove_tracker(&mut self, name: &str) -> Result<bool> {
        self.store.remove_tracker(name)
    }

    pub fn increment_tracker(&mut self, date: NaiveDate, name: &str) -> Result<f64> {
        self.store.increment_tracker(date, name)
    }

    #[must_use]
    pub fn tracker_entries(&self, date: NaiveDate) -> Vec<TrackerEntry> {
        self.store.tracker_entries(date)
    }

    // --- Body weight ---

    pub fn log_weight(&mut self, date: NaiveDate, weight_kg: f64) -> Result<()> {
        self.store.log_weight(date, weight_kg)
    }

    #[must_use]
    pub fn weight_history(&self) -> Vec<WeightEntry> {
        self.store.weight_history()
    }

    #[must_use]
    pub fn latest_weight(&self) -> Option<WeightEntry> {
        self.store.latest_weight()
    }

    // --- Lookup orchestration ---

    /// Barcode lookup through an injected provider. The candidate is
    /// returned for confirmation, never logged here.
    pub fn lookup_barcode(
        &self,
        provider: &dyn NutritionLookup,
        code: &str,
    ) -> Result<Option<FoodCandidate>> {
        provider.lookup_barcode(code)
    }

    pub fn search_food(
        &self,
        provider: &dyn NutritionLookup,
        query: &str,
    ) -> Result<Vec<FoodCandidate>> {
        provider.search(query)
    }

    /// Classify a meal photo. Same contract as a lookup: the estimate is
    /// handed back for manual confirmation.
    pub fn classify_photo(
        &self,
        classifier: &dyn MealClassifier,
        image: &[u8],
    ) -> Result<Option<FoodCandidate>> {
        classifier.classify(image)
    }

    // --- Device identity ---

    pub fn device_id(&self) -> Result<String> {
        if let Some(id) = load_json::<Option<String>>(self.persist.as_ref(), keys::DEVICE_ID) {
            if !id.is_empty() {
                return Ok(id);
            }
        }
        let id = Uuid::new_v4().to_string();
        save_json(self.persist.as_ref(), keys::DEVICE_ID, &id)?;
        Ok(id)
    }

    // --- Export / import ---

    pub fn export_snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            exported_at: Local::now().to_rfc3339(),
            device_id: self.device_id()?,
            food_log: self.store.food_log().clone(),
            workout_log: self.store.workout_log().clone(),
            weight_history: self.store.weight_log().clone(),
            tracker_defs: self.store.tracker_defs().to_vec(),
            tracker_log: self.store.tracker_log().clone(),
            goals: self.goals.config().clone(),
        })
    }

    /// Replace local state wholesale with an imported snapshot. The caller
    /// is responsible for confirming with the user first.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        self.store.replace_all(
            snapshot.food_log,
            snapshot.workout_log,
            snapshot.weight_history,
            snapshot.tracker_defs,
            snapshot.tracker_log,
        )?;
        self.goals.replace(snapshot.goals)
    }

    pub fn export_csv(&self) -> Result<String> {
        export::to_csv(&self.store)
    }

    /// Replace the food log for each date present in the parsed CSV.
    /// Returns the number of days replaced.
    pub fn import_csv(&mut self, import: CsvImport) -> Result<usize> {
        let days = import.days.len();
        for (date, entries) in import.days {
            self.store.replace_day(date, entries)?;
        }
        Ok(days)
    }

    // --- Cloud sync ---

    /// Merge a fetched remote snapshot into local state.
    pub fn merge_remote_snapshot(&mut self, remote: &Snapshot) -> Result<()> {
        merge_snapshot(&mut self.store, &mut self.goals, remote)
    }

    /// Pull the remote snapshot and merge it in. Returns false when the
    /// account has no remote snapshot yet. A network failure propagates
    /// without touching local state.
    pub fn sync_pull(&mut self, client: &dyn CloudSync, account: &str) -> Result<bool> {
        match client.fetch(account)? {
            Some(remote) => {
                self.merge_remote_snapshot(&remote)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Upsert the full current snapshot under the account identity.
    pub fn sync_push(&self, client: &dyn CloudSync, account: &str) -> Result<()> {
        let snapshot = self.export_snapshot()?;
        client.upsert(account, &snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn date(s: &str) -> NaiveDate {
        crate::dates::parse_date_key(s).unwrap()
    }

    struct MockLookup {
        candidates: Vec<FoodCandidate>,
    }

    impl NutritionLookup for MockLookup {
        fn search(&self, _query: &str) -> Result<Vec<FoodCandidate>> {
            Ok(self.candidates.clone())
        }

        fn lookup_barcode(&self, code: &str) -> Result<Option<FoodCandidate>> {
            if code == "3017620422003" {
                Ok(self.candidates.first().cloned())
            } else {
                Ok(None)
            }
        }
    }

    struct MockClassifier {
        result: Option<FoodCandidate>,
    }

    impl MealClassifier for MockClassifier {
        fn classify(&self, _image: &[u8]) -> Result<Option<FoodCandidate>> {
            Ok(self.result.clone())
        }
    }

    #[derive(Default)]
    struct MockCloud {
        snapshots: Mutex<HashMap<String, Snapshot>>,
        fail: bool,
    }

    impl CloudSync for MockCloud {
        fn fetch(&self, account: &str) -> Result<Option<Snapshot>> {
            if self.fail {
                bail!("network down");
            }
            Ok(self.snapshots.lock().unwrap().get(account).cloned())
        }

        fn upsert(&self, account: &str, snapshot: &Snapshot) -> Result<()> {
            if self.fail {
                bail!("network down");
            }
            self.snapshots
                .lock()
                .unwrap()
                .insert(account.to_string(), snapshot.clone());
            Ok(())
        }
    }

    fn sample_candidate() -> FoodCandidate {
        FoodCandidate {
            name: "Nutella".to_string(),
            calories: 539.0,
            protein: 6.3,
            carbs: 57.5,
            fat: 30.9,
        }
    }

    #[test]
    fn test_log_food_and_summary() {
        let mut svc = TallyService::open_in_memory().unwrap();
        let d = date("2024-06-15");
        svc.log_food(d, "Egg", 70.0, 6.0, 0.6, 5.0).unwrap();
        svc.log_food(d, "Rice", 130.0, 2.7, 28.0, 0.3).unwrap();

        let summary = svc.daily_summary(d);
        assert_eq!(summary.entries.len(), 2);
        assert!((summary.totals.calories - 200.0).abs() < f64::EPSILON);
        assert!((summary.remaining - 1300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_log_candidate_scales_serving() {
        let mut svc = TallyService::open_in_memory().unwrap();
        let d = date("2024-06-15");
        let entry = svc.log_candidate(d, &sample_candidate(), 20.0).unwrap();
        assert!((entry.calories - 107.8).abs() < 0.01);
        assert_eq!(svc.daily_summary(d).entries.len(), 1);
    }

    #[test]
    fn test_log_workout_flags_personal_best() {
        let mut svc = TallyService::open_in_memory().unwrap();
        let (first, pb) = svc
            .log_workout(date("2024-06-10"), "Squat", 3, 5, 100.0)
            .unwrap();
        assert_eq!(first.one_rep_max, 113.0);
        assert!(!pb); // nothing to beat yet

        let (_, pb) = svc
            .log_workout(date("2024-06-15"), "Squat", 1, 1, 120.0)
            .unwrap();
        assert!(pb);

        let (_, pb) = svc
            .log_workout(date("2024-06-16"), "Squat", 3, 5, 90.0)
            .unwrap();
        assert!(!pb);
    }

    #[test]
    fn test_lookup_barcode_not_found_is_ok() {
        let svc = TallyService::open_in_memory().unwrap();
        let provider = MockLookup { candidates: vec![] };
        assert!(svc.lookup_barcode(&provider, "0000000000").unwrap().is_none());
    }

    #[test]
    fn test_lookup_barcode_returns_candidate_without_logging() {
        let svc = TallyService::open_in_memory().unwrap();
        let provider = MockLookup {
            candidates: vec![sample_candidate()],
        };
        let candidate = svc
            .lookup_barcode(&provider, "3017620422003")
            .unwrap()
            .unwrap();
        assert_eq!(candidate.name, "Nutella");
        // nothing committed until the user confirms
        assert!(svc.daily_summary(date("2024-06-15")).entries.is_empty());
    }

    #[test]
    fn test_classify_photo_goes_through_confirmation_path() {
        let svc = TallyService::open_in_memory().unwrap();
        let classifier = MockClassifier {
            result: Some(sample_candidate()),
        };
        let candidate = svc.classify_photo(&classifier, b"jpeg bytes").unwrap();
        assert_eq!(candidate.unwrap().name, "Nutella");
        assert!(svc.daily_summary(date("2024-06-15")).entries.is_empty());
    }

    #[test]
    fn test_device_id_is_stable() {
        let svc = TallyService::open_in_memory().unwrap();
        let id = svc.device_id().unwrap();
        assert!(!id.is_empty());
        assert_eq!(svc.device_id().unwrap(), id);
    }

    #[test]
    fn test_snapshot_export_import_roundtrip() {
        let mut svc = TallyService::open_in_memory().unwrap();
        let d = date("2024-06-15");
        svc.log_food(d, "Egg", 70.0, 6.0, 0.6, 5.0).unwrap();
        svc.log_workout(d, "Squat", 3, 5, 100.0).unwrap();
        svc.set_goal(GoalKind::RestCalories, 1600.0).unwrap();
        let snapshot = svc.export_snapshot().unwrap();

        let mut other = TallyService::open_in_memory().unwrap();
        other.import_snapshot(snapshot).unwrap();
        assert_eq!(other.daily_summary(d).entries.len(), 1);
        assert_eq!(other.workout_day(d).0.len(), 1);
        assert_eq!(other.goals().rest_calories, 1600.0);
    }

    #[test]
    fn test_import_snapshot_replaces_wholesale() {
        let mut svc = TallyService::open_in_memory().unwrap();
        svc.log_food(date("2024-06-14"), "Old", 100.0, 0.0, 0.0, 0.0)
            .unwrap();

        let other = TallyService::open_in_memory().unwrap();
        let empty = other.export_snapshot().unwrap();
        svc.import_snapshot(empty).unwrap();

        assert!(svc.daily_summary(date("2024-06-14")).entries.is_empty());
    }

    #[test]
    fn test_csv_import_replaces_matching_days_only() {
        let mut svc = TallyService::open_in_memory().unwrap();
        let d1 = date("2024-06-14");
        let d2 = date("2024-06-15");
        svc.log_food(d1, "Keep me", 100.0, 0.0, 0.0, 0.0).unwrap();
        svc.log_food(d2, "Replace me", 100.0, 0.0, 0.0, 0.0).unwrap();

        let csv = "date,category,name,calories,protein,fat,carbs\n\
                   2024-06-15,food,Imported,250,10,5,30\n";
        let import = crate::export::parse_csv(csv.as_bytes()).unwrap();
        let days = svc.import_csv(import).unwrap();

        assert_eq!(days, 1);
        assert_eq!(svc.daily_summary(d1).entries[0].name, "Keep me");
        assert_eq!(svc.daily_summary(d2).entries[0].name, "Imported");
    }

    #[test]
    fn test_sync_push_then_pull() {
        let cloud = MockCloud::default();
        let mut svc = TallyService::open_in_memory().unwrap();
        let d = date("2024-06-15");
        svc.log_food(d, "Egg", 70.0, 6.0, 0.6, 5.0).unwrap();
        svc.sync_push(&cloud, "alice").unwrap();

        let mut other = TallyService::open_in_memory().unwrap();
        assert!(other.sync_pull(&cloud, "alice").unwrap());
        assert_eq!(other.daily_summary(d).entries[0].name, "Egg");

        // unknown account: nothing to merge, not an error
        assert!(!other.sync_pull(&cloud, "bob").unwrap());
    }

    #[test]
    fn test_sync_failure_leaves_local_state_intact() {
        let cloud = MockCloud {
            fail: true,
            ..MockCloud::default()
        };
        let mut svc = TallyService::open_in_memory().unwrap();
        let d = date("2024-06-15");
        svc.log_food(d, "Egg", 70.0, 6.0, 0.6, 5.0).unwrap();

        assert!(svc.sync_push(&cloud, "alice").is_err());
        assert!(svc.sync_pull(&cloud, "alice").is_err());
        assert_eq!(svc.daily_summary(d).entries.len(), 1);
    }
}
