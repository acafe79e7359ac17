//! Run-scope and stage-scope key/value context.
//!
//! Each pipeline run owns one [`RunContext`]. Run-scope entries live for the
//! whole run and are how stages hand data to later stages. Stage-scope
//! entries are scratch space for the current stage and are cleared when it
//! ends. Values are stored as JSON.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use questhub_core::error::AppError;
use questhub_core::result::AppResult;
use questhub_core::types::RunId;

/// Well-known context keys.
pub mod keys {
    /// Run scope: the achievement a direct check is about.
    pub const TARGET_ACHIEVEMENT: &str = "target_achievement";
    /// Run scope: the active perfect-day achievements.
    pub const PERFECT_DAY_ACHIEVEMENTS: &str = "perfect_day_achievements";
    /// Stage scope: candidates pre-loaded for the current stage.
    pub const CANDIDATE_ACHIEVEMENTS: &str = "candidate_achievements";
    /// Accumulator: users who logged a perfect day.
    pub const PERFECT_DAY_USER_IDS: &str = "perfect_day_user_ids";
    /// Accumulator: users whose perfect-day count was incremented.
    pub const INCREMENTED_USER_IDS: &str = "incremented_user_ids";
    /// Accumulator: users who were sent a notification.
    pub const NOTIFIED_USER_IDS: &str = "notified_user_ids";
}

/// Two-level context for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: RunId,
    run: HashMap<String, Value>,
    stage: HashMap<String, Value>,
}

impl RunContext {
    /// Empty context for a new run.
    pub fn new() -> Self {
        Self {
            run_id: RunId::new(),
            run: HashMap::new(),
            stage: HashMap::new(),
        }
    }

    /// Identifier of the run this context belongs to.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Store a run-scope entry, replacing any previous value.
    pub fn put_run<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> AppResult<()> {
        self.run.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Store a stage-scope entry, replacing any previous value.
    pub fn put_stage<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> AppResult<()> {
        self.stage.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Read a run-scope entry.
    pub fn get_run<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        decode(self.run.get(key))
    }

    /// Read a stage-scope entry.
    pub fn get_stage<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        decode(self.stage.get(key))
    }

    /// Read a run-scope entry that an earlier hook must have set.
    pub fn require_run<T: DeserializeOwned>(&self, key: &str) -> AppResult<T> {
        self.get_run(key)?
            .ok_or_else(|| AppError::internal(format!("Run context has no '{key}' entry")))
    }

    /// Remove a stage-scope entry.
    pub fn remove_stage(&mut self, key: &str) -> Option<Value> {
        self.stage.remove(key)
    }

    /// Append the stage-scope list under `key` to the run-scope list under
    /// the same key, creating the run-scope list if needed.
    ///
    /// The stage-scope entry is consumed. Returns how many elements moved.
    pub fn merge_list_stage_into_run(&mut self, key: &str) -> AppResult<usize> {
        let Some(staged) = self.stage.remove(key) else {
            return Ok(0);
        };
        let Value::Array(items) = staged else {
            return Err(AppError::validation(format!(
                "Stage context entry '{key}' is not a list"
            )));
        };

        let target = self
            .run
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(existing) = target else {
            return Err(AppError::validation(format!(
                "Run context entry '{key}' is not a list"
            )));
        };

        let moved = items.len();
        existing.extend(items);
        Ok(moved)
    }

    /// Drop every stage-scope entry.
    pub fn clear_stage(&mut self) {
        self.stage.clear();
    }

    /// Whether the stage scope holds no entries.
    pub fn stage_is_empty(&self) -> bool {
        self.stage.is_empty()
    }

    /// Whether the stage scope holds `key`.
    pub fn has_stage(&self, key: &str) -> bool {
        self.stage.contains_key(key)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

fn decode<T: DeserializeOwned>(value: Option<&Value>) -> AppResult<Option<T>> {
    value
        .map(|v| serde_json::from_value(v.clone()))
        .transpose()
        .map_err(AppError::from)
}
