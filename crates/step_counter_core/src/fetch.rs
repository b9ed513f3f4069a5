//! Screen activation: the requests a screen fires when it appears.
//!
//! Each activation runs on its own tokio task and publishes a [`FetchState`]
//! over a watch channel. Dropping the [`ScreenFetch`] handle aborts whatever
//! is still in flight.

use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{HealthDataSource, HealthError, Sample, observability};

#[derive(Clone, Debug, PartialEq)]
pub enum FetchState<T> {
    Pending,
    Loaded(T),
    Failed(String),
}

impl<T> FetchState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchState::Pending)
    }
}

impl FetchState<Vec<Sample>> {
    /// The series to render; failures render as an empty series.
    pub fn samples(&self) -> &[Sample] {
        match self {
            FetchState::Loaded(s) => s,
            FetchState::Pending | FetchState::Failed(_) => &[],
        }
    }
}

/// Handle to an in-flight screen request.
pub struct ScreenFetch<T> {
    rx: watch::Receiver<FetchState<T>>,
    task: JoinHandle<()>,
}

impl<T> ScreenFetch<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn spawn<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T, HealthError>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(FetchState::Pending);
        let task = tokio::spawn(async move {
            let state = match fut.await {
                Ok(v) => FetchState::Loaded(v),
                Err(e) => FetchState::Failed(e.to_string()),
            };
            let _ = tx.send(state);
        });
        Self { rx, task }
    }

    /// The latest published state, `Pending` while the request runs.
    pub fn state(&self) -> FetchState<T> {
        self.rx.borrow().clone()
    }

    /// Wait until the request has either loaded or failed.
    pub async fn settled(&mut self) -> FetchState<T> {
        match self.rx.wait_for(|s| !s.is_pending()).await {
            Ok(state) => (*state).clone(),
            Err(_) => FetchState::Failed("request cancelled".into()),
        }
    }
}

impl<T> Drop for ScreenFetch<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Home screen activation: authorization, then the daily series.
///
/// A failed authorization is recorded and the query still runs; the query
/// itself decides whether anything can be shown.
pub fn activate_week(source: Arc<dyn HealthDataSource>, days_back: u32) -> ScreenFetch<Vec<Sample>> {
    ScreenFetch::spawn(async move {
        if let Err(e) = source.request_authorization().await {
            observability::record_authorization_failure();
            tracing::warn!(error = %e, "step count authorization failed");
        }
        source.query_daily_series(days_back).await
    })
}

/// Day detail activation: the hourly series of `date`.
pub fn activate_day(source: Arc<dyn HealthDataSource>, date: NaiveDate) -> ScreenFetch<Vec<Sample>> {
    ScreenFetch::spawn(async move { source.query_hourly_series(date).await })
}
