//! Step-count model, the `HealthDataSource` trait and the derivation logic the
//! step counter screens render.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aggregation;
pub mod calendar;
pub mod config;
pub mod fetch;
pub mod goal;
pub mod http_client;
pub mod observability;
pub mod retry;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),
    #[error("health data unavailable: {0}")]
    DataUnavailable(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("date out of range: {0}")]
    OutOfRange(String),
}

impl HealthError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, HealthError::Http(_) | HealthError::QueryFailed(_))
    }
}

/// Steps recorded in one time bucket starting at `timestamp`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sample {
    pub count: u64,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(count: u64, timestamp: DateTime<Utc>) -> Self {
        Self { count, timestamp }
    }

    pub fn zero(timestamp: DateTime<Utc>) -> Self {
        Self::new(0, timestamp)
    }
}

/// Time resolution of a series.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Hour,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Hour => "hour",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait HealthDataSource: Send + Sync + 'static {
    /// Ask for read access to step counts. Idempotent.
    async fn request_authorization(&self) -> Result<(), HealthError>;

    /// Daily step totals for the last `days_back` days, oldest first.
    ///
    /// Days whose total is zero are omitted.
    async fn query_daily_series(&self, days_back: u32) -> Result<Vec<Sample>, HealthError>;

    /// The 24 hourly totals of `date`, zero-count hours included.
    async fn query_hourly_series(&self, date: NaiveDate) -> Result<Vec<Sample>, HealthError>;
}

/// Source used when the device has no health store.
///
/// The weekly screen stays empty instead of failing; drilling into a day
/// reports the missing store.
#[derive(Clone, Debug, Default)]
pub struct UnavailableHealthDataSource;

#[async_trait]
impl HealthDataSource for UnavailableHealthDataSource {
    async fn request_authorization(&self) -> Result<(), HealthError> {
        Ok(())
    }

    async fn query_daily_series(&self, _days_back: u32) -> Result<Vec<Sample>, HealthError> {
        Ok(Vec::new())
    }

    async fn query_hourly_series(&self, _date: NaiveDate) -> Result<Vec<Sample>, HealthError> {
        Err(HealthError::DataUnavailable(
            "no health store configured".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sample_serializes_count_and_rfc3339_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 10, 19, 0, 0, 0).unwrap();
        let v = serde_json::to_value(Sample::new(8234, ts)).expect("serialize");
        assert_eq!(v["count"], 8234);
        assert_eq!(v["timestamp"], "2025-10-19T00:00:00Z");
    }

    #[test]
    fn only_transport_and_query_errors_are_transient() {
        assert!(HealthError::QueryFailed("503".into()).is_transient());
        assert!(!HealthError::AuthorizationDenied("no".into()).is_transient());
        assert!(!HealthError::DataUnavailable("none".into()).is_transient());
        assert!(!HealthError::Config("bad".into()).is_transient());
        assert!(!HealthError::OutOfRange("+262142-12-31".into()).is_transient());
    }

    #[tokio::test]
    async fn unavailable_source_degrades_weekly_and_fails_hourly() {
        let source = UnavailableHealthDataSource;
        assert!(source.request_authorization().await.is_ok());
        assert!(source.query_daily_series(7).await.unwrap().is_empty());
        let date = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
        let err = source.query_hourly_series(date).await.unwrap_err();
        assert!(matches!(err, HealthError::DataUnavailable(_)));
    }
}
