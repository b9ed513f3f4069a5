//! HTTP client implementation for a health-data statistics service.
//!
//! This module provides a reqwest-based implementation of the
//! [`HealthDataSource`](crate::HealthDataSource) trait.

use crate::calendar::Calendar;
use crate::retry::RetryPolicy;
use crate::{Granularity, HealthDataSource, HealthError, Sample, observability};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

const STEP_COUNT: &str = "stepCount";

#[derive(Debug, Serialize)]
struct AuthorizationRequest<'a> {
    read: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct StatisticsPayload {
    #[serde(default)]
    buckets: Vec<StatisticsBucket>,
}

#[derive(Debug, Deserialize)]
struct StatisticsBucket {
    start: DateTime<Utc>,
    /// Cumulative sum; absent when nothing was recorded.
    sum: Option<f64>,
}

/// Client for the health-data service using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestHealthDataSource {
    base_url: String,
    api_token: SecretString,
    calendar: Calendar,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl ReqwestHealthDataSource {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the health-data service
    /// * `api_token` - Bearer token for authentication
    /// * `calendar` - Calendar used to anchor day and hour buckets
    pub fn new(base_url: &str, api_token: SecretString, calendar: Calendar) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            calendar,
            retry: RetryPolicy::default(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Daily series for the window ending at `now`.
    pub async fn daily_series_at(
        &self,
        now: DateTime<Utc>,
        days_back: u32,
    ) -> Result<Vec<Sample>, HealthError> {
        let (start, end) = self
            .calendar
            .weekly_window(now, days_back)
            .ok_or_else(|| HealthError::OutOfRange(format!("{days_back} days before {now}")))?;
        let sums = self.statistics(start, end, Granularity::Day).await?;
        let series: Vec<Sample> = self
            .calendar
            .day_buckets(start, end)
            .into_iter()
            .map(|bucket| Sample::new(count_of(sums.get(&bucket).copied()), bucket))
            .filter(|s| s.count > 0)
            .collect();
        tracing::debug!(days = series.len(), days_back, "daily series loaded");
        Ok(series)
    }

    /// Hourly series for `date`, one entry per hour.
    pub async fn hourly_series(&self, date: NaiveDate) -> Result<Vec<Sample>, HealthError> {
        let out_of_range = || HealthError::OutOfRange(date.to_string());
        let (start, end) = self.calendar.day_bounds(date).ok_or_else(out_of_range)?;
        let buckets = self.calendar.hour_buckets(date).ok_or_else(out_of_range)?;
        let sums = self.statistics(start, end, Granularity::Hour).await?;
        Ok(buckets
            .into_iter()
            .map(|bucket| Sample::new(count_of(sums.get(&bucket).copied()), bucket))
            .collect())
    }

    /// Fetch cumulative sums keyed by bucket start.
    async fn statistics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Granularity,
    ) -> Result<HashMap<DateTime<Utc>, f64>, HealthError> {
        let url = format!("{}/api/v1/statistics/{}", self.base_url, STEP_COUNT);
        let query = [
            ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("interval", interval.as_str().to_string()),
        ];

        let (url, query) = (&url, &query);
        let started = Instant::now();
        let result = self
            .retry
            .retry_async_when(
                || async move {
                    let req = self.get_request(url).query(query);
                    self.execute_json::<StatisticsPayload>(req).await
                },
                HealthError::is_transient,
            )
            .await;
        observability::record_query(interval, result.is_ok(), started.elapsed());

        let payload = result.inspect_err(|e| {
            tracing::warn!(%interval, error = %e, "statistics query failed");
        })?;
        Ok(payload
            .buckets
            .into_iter()
            .filter_map(|b| b.sum.map(|s| (b.start, s)))
            .collect())
    }

    /// Build an authenticated GET request.
    fn get_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(self.api_token.expose_secret())
    }

    /// Build an authenticated POST request.
    fn post_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .bearer_auth(self.api_token.expose_secret())
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, HealthError> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(resp.json::<T>().await?)
    }

    /// Execute a request with no expected response body.
    async fn execute_empty(&self, request: reqwest::RequestBuilder) -> Result<(), HealthError> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(())
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> HealthError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();

        match status {
            401 | 403 => HealthError::AuthorizationDenied(body_snippet),
            404 | 501 => HealthError::DataUnavailable(body_snippet),
            _ => HealthError::QueryFailed(format!("status {status}: {body_snippet}")),
        }
    }
}

/// Step sums arrive as floating point; partial steps are dropped.
fn count_of(sum: Option<f64>) -> u64 {
    match sum {
        Some(s) if s.is_finite() && s > 0.0 => s as u64,
        _ => 0,
    }
}

#[async_trait]
impl HealthDataSource for ReqwestHealthDataSource {
    async fn request_authorization(&self) -> Result<(), HealthError> {
        let url = format!("{}/api/v1/authorization", self.base_url);
        let body = AuthorizationRequest { read: [STEP_COUNT] };
        self.execute_empty(self.post_request(&url).json(&body)).await
    }

    async fn query_daily_series(&self, days_back: u32) -> Result<Vec<Sample>, HealthError> {
        self.daily_series_at(Utc::now(), days_back).await
    }

    async fn query_hourly_series(&self, date: NaiveDate) -> Result<Vec<Sample>, HealthError> {
        self.hourly_series(date).await
    }
}
