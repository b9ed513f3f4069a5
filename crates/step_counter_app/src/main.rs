use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::info;

use step_counter_app::{AppState, bind_addr, env_filter, log_filter, router};
use step_counter_core::config::Config;
use step_counter_core::goal::JsonFileGoalStore;
use step_counter_core::http_client::ReqwestHealthDataSource;
use step_counter_core::{HealthDataSource, UnavailableHealthDataSource};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let log_env = log_filter(|k| std::env::var(k).ok());
    tracing_subscriber::fmt()
        .compact()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(&log_env))
        .init();
    tracing::info!(%log_env, "step_counter: log filter");

    let handle = PrometheusBuilder::new().install_recorder()?;

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration; aborting startup");
            std::process::exit(1);
        }
    };

    let source: Arc<dyn HealthDataSource> = match &config.health {
        Some(health) => {
            info!(base_url = %health.base_url, "using health data service");
            Arc::new(ReqwestHealthDataSource::new(
                &health.base_url,
                health.api_token.clone(),
                config.calendar,
            ))
        }
        None => {
            tracing::warn!("STEP_COUNTER_HEALTH_URL not set; health data unavailable");
            Arc::new(UnavailableHealthDataSource)
        }
    };
    let goals = Arc::new(JsonFileGoalStore::new(config.goal_path.clone()));
    info!(path = %config.goal_path.display(), "goal store");

    let state = Arc::new(
        AppState::new(source, goals, config.calendar)
            .with_days_back(config.days_back)
            .with_metrics(handle),
    );
    let app = router(state);

    let addr = bind_addr(|k| std::env::var(k).ok());
    info!(%addr, "starting HTTP server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("failed to install ctrl+c handler: {e}");
            }
        })
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
