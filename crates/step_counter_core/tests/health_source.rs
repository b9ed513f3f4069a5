use chrono::{NaiveDate, TimeZone, Utc};
use secrecy::SecretString;
use step_counter_core::calendar::Calendar;
use step_counter_core::http_client::ReqwestHealthDataSource;
use step_counter_core::retry::RetryPolicy;
use step_counter_core::{HealthDataSource, HealthError, Sample};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(server: &MockServer) -> ReqwestHealthDataSource {
    ReqwestHealthDataSource::new(&server.uri(), SecretString::new("tok".into()), Calendar::utc())
        .with_retry(RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        })
}

#[tokio::test]
async fn authorization_posts_read_scope_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/authorization"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(serde_json::json!({"read": ["stepCount"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    source(&server)
        .request_authorization()
        .await
        .expect("authorized");
}

#[tokio::test]
async fn authorization_denied_maps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/authorization"))
        .respond_with(ResponseTemplate::new(403).set_body_string("user declined"))
        .mount(&server)
        .await;

    let err = source(&server).request_authorization().await.unwrap_err();
    assert!(matches!(err, HealthError::AuthorizationDenied(ref b) if b == "user declined"));
}

#[tokio::test]
async fn daily_series_drops_zero_days_and_keeps_order() {
    let server = MockServer::start().await;
    let now = Utc.with_ymd_and_hms(2025, 10, 19, 15, 30, 0).unwrap();
    let body = serde_json::json!({
        "buckets": [
            {"start": "2025-10-12T00:00:00Z", "sum": null},
            {"start": "2025-10-17T00:00:00Z", "sum": 8234.0},
            {"start": "2025-10-15T00:00:00Z", "sum": 0.0},
            {"start": "2025-10-18T00:00:00Z", "sum": 12543.6},
            {"start": "2025-10-19T00:00:00Z", "sum": 7000.0}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/api/v1/statistics/stepCount"))
        .and(query_param("interval", "day"))
        .and(query_param("start", "2025-10-12T15:30:00Z"))
        .and(query_param("end", "2025-10-19T15:30:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let series = source(&server).daily_series_at(now, 7).await.expect("series");
    let day = |d: u32| Utc.with_ymd_and_hms(2025, 10, d, 0, 0, 0).unwrap();
    assert_eq!(
        series,
        vec![
            Sample::new(8234, day(17)),
            Sample::new(12543, day(18)),
            Sample::new(7000, day(19)),
        ]
    );
}

#[tokio::test]
async fn hourly_series_fills_all_24_hours() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "buckets": [
            {"start": "2025-10-19T08:00:00Z", "sum": 350.0},
            {"start": "2025-10-19T12:00:00Z", "sum": 1800.0}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/api/v1/statistics/stepCount"))
        .and(query_param("interval", "hour"))
        .and(query_param("start", "2025-10-19T00:00:00Z"))
        .and(query_param("end", "2025-10-20T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
    let hours = source(&server)
        .query_hourly_series(date)
        .await
        .expect("hours");
    assert_eq!(hours.len(), 24);
    assert_eq!(hours.iter().filter(|s| s.count == 0).count(), 22);
    assert_eq!(hours[8].count, 350);
    assert_eq!(hours[12].count, 1800);
    assert_eq!(
        hours[0].timestamp,
        Utc.with_ymd_and_hms(2025, 10, 19, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/statistics/stepCount"))
        .respond_with(ResponseTemplate::new(500).set_body_string("busy"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/statistics/stepCount"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"buckets": []})))
        .mount(&server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
    let hours = source(&server).hourly_series(date).await.expect("hours");
    assert!(hours.iter().all(|s| s.count == 0));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn busy_service_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/statistics/stepCount"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/statistics/stepCount"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"buckets": []})))
        .mount(&server)
        .await;

    let series = source(&server).query_daily_series(7).await.expect("series");
    assert!(series.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn missing_store_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/statistics/stepCount"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no health store"))
        .mount(&server)
        .await;

    let err = source(&server).query_daily_series(7).await.unwrap_err();
    assert!(matches!(err, HealthError::DataUnavailable(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn persistent_failure_surfaces_query_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/statistics/stepCount"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&server)
        .await;

    let err = source(&server).query_daily_series(7).await.unwrap_err();
    assert!(matches!(err, HealthError::QueryFailed(ref m) if m.contains("500")));
    // first attempt plus two retries
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
