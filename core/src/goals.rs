use std::sync::Arc;

use anyhow::{Result, bail};

use crate::models::{GoalConfig, GoalKind};
use crate::persist::{Persistence, keys, load_json, save_json};

/// Mutable goal configuration. The training-mode flag here is the single
/// source of truth for which calorie target is active; nothing else in the
/// crate hardcodes a calorie number.
pub struct GoalRegistry {
    persist: Arc<dyn Persistence>,
    config: GoalConfig,
}

impl GoalRegistry {
    pub fn open(persist: Arc<dyn Persistence>) -> Self {
        let config = load_json(persist.as_ref(), keys::USER_GOALS);
        Self { persist, config }
    }

    fn save(&self) -> Result<()> {
        save_json(self.persist.as_ref(), keys::USER_GOALS, &self.config)
    }

    /// Set one target. Non-positive or non-finite input is rejected without
    /// touching the stored value.
    pub fn set_goal(&mut self, kind: GoalKind, value: f64) -> Result<()> {
        if !value.is_finite() || value <= 0.0 {
            let name = kind.as_str();
            bail!("Goal '{name}' must be a positive number");
        }
        match kind {
            GoalKind::RestCalories => self.config.rest_calories = value,
            GoalKind::TrainCalories => self.config.train_calories = value,
            GoalKind::Protein => self.config.protein = value,
            GoalKind::Carbs => self.config.carbs = value,
            GoalKind::Fat => self.config.fat = value,
        }
        self.save()
    }

    /// Flip rest/training mode and return the newly active calorie target.
    pub fn toggle_training_mode(&mut self) -> Result<f64> {
        self.config.is_training_day = !self.config.is_training_day;
        self.save()?;
        Ok(self.active_calorie_goal())
    }

    #[must_use]
    pub fn active_calorie_goal(&self) -> f64 {
        if self.config.is_training_day {
            self.config.train_calories
        } else {
            self.config.rest_calories
        }
    }

    #[must_use]
    pub fn config(&self) -> &GoalConfig {
        &self.config
    }

    /// Replace the whole configuration (import / sync merge).
    pub fn replace(&mut self, config: GoalConfig) -> Result<()> {
        self.config = config;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::SqliteStore;

    fn open_registry() -> GoalRegistry {
        GoalRegistry::open(Arc::new(SqliteStore::open_in_memory().unwrap()))
    }

    #[test]
    fn test_defaults_apply_on_first_open() {
        let goals = open_registry();
        assert_eq!(goals.active_calorie_goal(), 1500.0);
        assert_eq!(goals.config().protein, 200.0);
    }

    #[test]
    fn test_set_goal() {
        let mut goals = open_registry();
        goals.set_goal(GoalKind::Protein, 180.0).unwrap();
        assert_eq!(goals.config().protein, 180.0);
    }

    #[test]
    fn test_set_goal_rejects_bad_values() {
        let mut goals = open_registry();
        assert!(goals.set_goal(GoalKind::Protein, 0.0).is_err());
        assert!(goals.set_goal(GoalKind::Protein, -50.0).is_err());
        assert!(goals.set_goal(GoalKind::Protein, f64::NAN).is_err());
        // rejected input must not clobber the stored goal
        assert_eq!(goals.config().protein, 200.0);
    }

    #[test]
    fn test_toggle_alternates_active_goal() {
        let mut goals = open_registry();
        assert_eq!(goals.active_calorie_goal(), 1500.0);
        assert_eq!(goals.toggle_training_mode().unwrap(), 1800.0);
        assert_eq!(goals.active_calorie_goal(), 1800.0);
        assert_eq!(goals.toggle_training_mode().unwrap(), 1500.0);
        assert_eq!(goals.active_calorie_goal(), 1500.0);
    }

    #[test]
    fn test_goals_survive_reopen() {
        let persist: Arc<dyn Persistence> = Arc::new(SqliteStore::open_in_memory().unwrap());
        {
            let mut goals = GoalRegistry::open(Arc::clone(&persist));
            goals.set_goal(GoalKind::RestCalories, 1600.0).unwrap();
            goals.toggle_training_mode().unwrap();
        }
        let goals = GoalRegistry::open(persist);
        assert_eq!(goals.config().rest_calories, 1600.0);
        assert!(goals.config().is_training_day);
    }
}
