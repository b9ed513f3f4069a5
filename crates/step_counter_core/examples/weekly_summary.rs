use std::sync::Arc;

use chrono::Utc;
use step_counter_core::aggregation::WeekSummary;
use step_counter_core::config::Config;
use step_counter_core::goal::{GoalStore, JsonFileGoalStore};
use step_counter_core::http_client::ReqwestHealthDataSource;
use step_counter_core::{HealthDataSource, UnavailableHealthDataSource, fetch};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects STEP_COUNTER_HEALTH_URL and STEP_COUNTER_API_TOKEN in env
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let source: Arc<dyn HealthDataSource> = match cfg.health {
        Some(h) => Arc::new(ReqwestHealthDataSource::new(&h.base_url, h.api_token, cfg.calendar)),
        None => Arc::new(UnavailableHealthDataSource),
    };
    let goal = JsonFileGoalStore::new(&cfg.goal_path).get()?;

    let state = fetch::activate_week(source, cfg.days_back).settled().await;
    let summary = WeekSummary::derive(state.samples(), goal.get(), Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
