use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use step_counter_core::HealthDataSource;
use step_counter_core::calendar::Calendar;
use step_counter_core::config::DEFAULT_DAYS_BACK;
use step_counter_core::fetch::FetchState;
use step_counter_core::goal::{Goal, GoalStore};

/// Collaborators shared by every request.
pub struct AppState {
    pub source: Arc<dyn HealthDataSource>,
    pub goals: Arc<dyn GoalStore>,
    pub calendar: Calendar,
    pub days_back: u32,
    /// How long a screen waits for its data before rendering as pending.
    pub screen_wait: Duration,
    pub metrics: Option<PrometheusHandle>,
}

pub const DEFAULT_SCREEN_WAIT: Duration = Duration::from_secs(10);

impl AppState {
    pub fn new(source: Arc<dyn HealthDataSource>, goals: Arc<dyn GoalStore>, calendar: Calendar) -> Self {
        Self {
            source,
            goals,
            calendar,
            days_back: DEFAULT_DAYS_BACK,
            screen_wait: DEFAULT_SCREEN_WAIT,
            metrics: None,
        }
    }

    pub fn with_days_back(mut self, days_back: u32) -> Self {
        self.days_back = days_back;
        self
    }

    pub fn with_screen_wait(mut self, wait: Duration) -> Self {
        self.screen_wait = wait;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// The goal every screen renders against. An unreadable store falls back
    /// to the default goal.
    ///
    /// Stores may touch the filesystem, so the read runs on the blocking pool.
    pub async fn current_goal(&self) -> Goal {
        let goals = self.goals.clone();
        match tokio::task::spawn_blocking(move || goals.get()).await {
            Ok(Ok(goal)) => goal,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "goal unreadable, using default");
                Goal::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "goal read task failed, using default");
                Goal::default()
            }
        }
    }
}

/// Load state shown alongside a screen.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    Pending,
    Loaded,
    Failed { reason: String },
}

impl<T> From<&FetchState<T>> for LoadStatus {
    fn from(state: &FetchState<T>) -> Self {
        match state {
            FetchState::Pending => LoadStatus::Pending,
            FetchState::Loaded(_) => LoadStatus::Loaded,
            FetchState::Failed(reason) => LoadStatus::Failed {
                reason: reason.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use step_counter_core::UnavailableHealthDataSource;
    use step_counter_core::goal::{GoalError, InMemoryGoalStore};

    struct BrokenStore;

    impl GoalStore for BrokenStore {
        fn get(&self) -> Result<Goal, GoalError> {
            Err(std::io::Error::other("disk gone").into())
        }

        fn set(&self, _goal: Goal) -> Result<(), GoalError> {
            Err(std::io::Error::other("disk gone").into())
        }
    }

    fn state(goals: Arc<dyn GoalStore>) -> AppState {
        AppState::new(Arc::new(UnavailableHealthDataSource), goals, Calendar::utc())
    }

    #[tokio::test]
    async fn current_goal_reads_the_store() {
        let goals = Arc::new(InMemoryGoalStore::with_goal(Goal::new(6_000).unwrap()));
        assert_eq!(state(goals).current_goal().await.get(), 6_000);
    }

    #[tokio::test]
    async fn unreadable_goal_falls_back_to_default() {
        assert_eq!(state(Arc::new(BrokenStore)).current_goal().await, Goal::default());
    }

    #[test]
    fn load_status_tracks_fetch_state() {
        assert_eq!(LoadStatus::from(&FetchState::<()>::Pending), LoadStatus::Pending);
        assert_eq!(
            LoadStatus::from(&FetchState::<()>::Failed("gone".into())),
            LoadStatus::Failed {
                reason: "gone".into()
            }
        );
        let v = serde_json::to_value(LoadStatus::Pending).unwrap();
        assert_eq!(v["state"], "pending");
    }
}
