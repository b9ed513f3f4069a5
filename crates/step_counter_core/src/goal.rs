//! The persisted daily step goal.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const DEFAULT_GOAL: u64 = 10_000;

#[derive(Debug, Error)]
pub enum GoalError {
    #[error("invalid goal: {0}")]
    InvalidGoal(String),
    #[error("goal storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("goal document error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A positive daily step target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Goal(u64);

impl Goal {
    pub fn new(steps: u64) -> Result<Self, GoalError> {
        if steps == 0 {
            return Err(GoalError::InvalidGoal("goal must be greater than zero".into()));
        }
        Ok(Self(steps))
    }

    /// Parse what the user typed into the settings field.
    pub fn parse(input: &str) -> Result<Self, GoalError> {
        let trimmed = input.trim();
        let steps = trimmed
            .parse::<u64>()
            .map_err(|_| GoalError::InvalidGoal(format!("not a whole number: {trimmed:?}")))?;
        Self::new(steps)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Default for Goal {
    fn default() -> Self {
        Self(DEFAULT_GOAL)
    }
}

impl TryFrom<u64> for Goal {
    type Error = GoalError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Goal> for u64 {
    fn from(goal: Goal) -> Self {
        goal.0
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Single-scalar persistence for the goal.
pub trait GoalStore: Send + Sync + 'static {
    /// The stored goal, or [`Goal::default`] when nothing was saved yet.
    fn get(&self) -> Result<Goal, GoalError>;
    fn set(&self, goal: Goal) -> Result<(), GoalError>;
}

/// The settings "Save Goal" action.
///
/// Invalid input is rejected before the store is touched.
pub fn save_goal_input(store: &dyn GoalStore, input: &str) -> Result<Goal, GoalError> {
    let goal = match Goal::parse(input) {
        Ok(g) => g,
        Err(e) => {
            crate::observability::record_goal_save(false);
            return Err(e);
        }
    };
    store.set(goal)?;
    crate::observability::record_goal_save(true);
    tracing::info!(goal = goal.get(), "daily goal saved");
    Ok(goal)
}

#[derive(Debug, Default)]
pub struct InMemoryGoalStore {
    goal: Mutex<Option<Goal>>,
}

impl InMemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goal(goal: Goal) -> Self {
        Self {
            goal: Mutex::new(Some(goal)),
        }
    }
}

impl GoalStore for InMemoryGoalStore {
    fn get(&self) -> Result<Goal, GoalError> {
        let guard = self.goal.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.unwrap_or_default())
    }

    fn set(&self, goal: Goal) -> Result<(), GoalError> {
        let mut guard = self.goal.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(goal);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GoalDocument {
    #[serde(rename = "stepGoal")]
    step_goal: Goal,
}

/// Goal kept as a small JSON document on disk.
#[derive(Debug)]
pub struct JsonFileGoalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileGoalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "step_goal.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl GoalStore for JsonFileGoalStore {
    fn get(&self) -> Result<Goal, GoalError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no saved goal, using default");
                return Ok(Goal::default());
            }
            Err(e) => return Err(e.into()),
        };
        let doc: GoalDocument = serde_json::from_str(&contents)?;
        Ok(doc.step_goal)
    }

    fn set(&self, goal: Goal) -> Result<(), GoalError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let json = serde_json::to_string_pretty(&GoalDocument { step_goal: goal })?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        // rename replaces the old document in one step
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::debug!(path = %self.path.display(), goal = goal.get(), "goal written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_accepts_positive_whole_numbers() {
        assert_eq!(Goal::parse("12000").unwrap().get(), 12_000);
        assert_eq!(Goal::parse("  8000 ").unwrap().get(), 8_000);
    }

    #[test]
    fn parse_rejects_zero_negative_and_text() {
        for input in ["0", "-5", "ten thousand", "", "12.5"] {
            let err = Goal::parse(input).unwrap_err();
            assert!(matches!(err, GoalError::InvalidGoal(_)), "{input}");
        }
    }

    #[test]
    fn goal_document_rejects_zero() {
        let res: Result<GoalDocument, _> = serde_json::from_str(r#"{"stepGoal": 0}"#);
        assert!(res.is_err());
    }

    #[test]
    fn file_store_defaults_when_missing() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileGoalStore::new(dir.path().join("goal.json"));
        assert_eq!(store.get().unwrap().get(), DEFAULT_GOAL);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("goal.json");
        JsonFileGoalStore::new(&path)
            .set(Goal::new(7_500).unwrap())
            .expect("save");

        let reopened = JsonFileGoalStore::new(&path);
        assert_eq!(reopened.get().unwrap().get(), 7_500);
        assert!(!dir.path().join("goal.json.tmp").exists());

        let raw = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["stepGoal"], 7_500);
    }

    #[test]
    fn file_store_reports_corrupt_document() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("goal.json");
        std::fs::write(&path, "not json").unwrap();
        let err = JsonFileGoalStore::new(&path).get().unwrap_err();
        assert!(matches!(err, GoalError::Serialization(_)));
    }

    #[test]
    fn invalid_save_leaves_goal_untouched() {
        let store = InMemoryGoalStore::with_goal(Goal::new(9_000).unwrap());
        assert!(save_goal_input(&store, "abc").is_err());
        assert!(save_goal_input(&store, "0").is_err());
        assert_eq!(store.get().unwrap().get(), 9_000);

        let saved = save_goal_input(&store, "11000").expect("save");
        assert_eq!(saved.get(), 11_000);
        assert_eq!(store.get().unwrap().get(), 11_000);
    }

    #[test]
    fn in_memory_store_starts_at_default() {
        assert_eq!(InMemoryGoalStore::new().get().unwrap(), Goal::default());
    }
}
