use anyhow::Result;

use crate::goals::GoalRegistry;
use crate::models::Snapshot;
use crate::store::EntryStore;

/// Remote snapshot storage keyed by account identity. A failed call must
/// leave local state untouched — the app keeps working offline.
pub trait CloudSync: Send + Sync {
    fn fetch(&self, account: &str) -> Result<Option<Snapshot>>;
    fn upsert(&self, account: &str, snapshot: &Snapshot) -> Result<()>;
}

/// Merge a remote snapshot into local state: remote date keys, tracker
/// definitions, and the goal config overwrite their local counterparts;
/// local-only keys survive.
pub fn merge_snapshot(
    store: &mut EntryStore,
    goals: &mut GoalRegistry,
    remote: &Snapshot,
) -> Result<()> {
    store.merge_remote(remote)?;
    goals.replace(remote.goals.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodEntry, GoalConfig, SNAPSHOT_VERSION};
    use crate::persist::{Persistence, SqliteStore};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn empty_snapshot() -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            exported_at: String::new(),
            device_id: String::new(),
            food_log: BTreeMap::new(),
            workout_log: BTreeMap::new(),
            weight_history: BTreeMap::new(),
            tracker_defs: Vec::new(),
            tracker_log: BTreeMap::new(),
            goals: GoalConfig::default(),
        }
    }

    #[test]
    fn test_merge_snapshot_overwrites_goals() {
        let persist: Arc<dyn Persistence> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let mut store = EntryStore::open(Arc::clone(&persist));
        let mut goals = GoalRegistry::open(persist);

        let mut remote = empty_snapshot();
        remote.goals.rest_calories = 1650.0;
        remote.goals.is_training_day = true;
        let d = crate::dates::parse_date_key("2024-06-15").unwrap();
        remote
            .food_log
            .insert(d, vec![FoodEntry::new("Remote", 100.0, 0.0, 0.0, 0.0).unwrap()]);

        merge_snapshot(&mut store, &mut goals, &remote).unwrap();

        assert_eq!(goals.config().rest_calories, 1650.0);
        assert_eq!(goals.active_calorie_goal(), 1800.0);
        assert_eq!(store.entries(d).len(), 1);
    }
}
