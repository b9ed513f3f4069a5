use crate::HealthError;
use crate::calendar::Calendar;
use secrecy::SecretString;
use std::path::PathBuf;

pub const DEFAULT_DAYS_BACK: u32 = 7;
/// Longest daily window a home request may ask for.
pub const MAX_DAYS_BACK: u32 = 366;
pub const DEFAULT_GOAL_PATH: &str = "step_goal.json";

/// Connection details for the health-data service.
#[derive(Clone, Debug)]
pub struct HealthServiceConfig {
    pub base_url: String,
    pub api_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// `None` when the device has no health store.
    pub health: Option<HealthServiceConfig>,
    pub goal_path: PathBuf,
    pub calendar: Calendar,
    pub days_back: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, HealthError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function. This avoids mutating global environment in tests and keeps
    /// `from_env()` small and safe.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, HealthError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let health = match get("STEP_COUNTER_HEALTH_URL").filter(|u| !u.trim().is_empty()) {
            Some(base_url) => {
                let token = get("STEP_COUNTER_API_TOKEN").ok_or_else(|| {
                    HealthError::Config("STEP_COUNTER_API_TOKEN missing".into())
                })?;
                Some(HealthServiceConfig {
                    base_url,
                    api_token: SecretString::new(token.into()),
                })
            }
            None => None,
        };

        let goal_path = get("STEP_COUNTER_GOAL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GOAL_PATH));

        let calendar = match get("STEP_COUNTER_UTC_OFFSET_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .ok()
                .and_then(Calendar::from_offset_minutes)
                .ok_or_else(|| {
                    HealthError::Config(format!("invalid STEP_COUNTER_UTC_OFFSET_MINUTES: {raw}"))
                })?,
            None => Calendar::local(),
        };

        let days_back = match get("STEP_COUNTER_DAYS_BACK") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|d| (1..=MAX_DAYS_BACK).contains(d))
                .ok_or_else(|| {
                    HealthError::Config(format!(
                        "invalid STEP_COUNTER_DAYS_BACK: {raw} (expected 1..={MAX_DAYS_BACK})"
                    ))
                })?,
            None => DEFAULT_DAYS_BACK,
        };

        Ok(Self {
            health,
            goal_path,
            calendar,
            days_back,
        })
    }
}
