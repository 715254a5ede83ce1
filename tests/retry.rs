mod common;

use std::time::{Duration, Instant};

use serde_json::json;
use travelbook_client::{ApiError, RetryPlan};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn persistent_503_exhausts_three_attempts_then_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = common::client_for(&server).with_retry_plan(common::fast_plan());
    let err = client.cities().await.unwrap_err();
    assert_eq!(err, ApiError::ServerError(503));
}

#[tokio::test]
async fn terminal_404_is_attempted_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities/99/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server).with_retry_plan(common::fast_plan());
    assert_eq!(client.city(99).await.unwrap_err(), ApiError::NotFound);
}

#[tokio::test]
async fn transient_failure_then_success_recovers_transparently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cities/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::paginated(json!([
            { "id": 1, "name": "Varanasi", "slug": "varanasi" }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server).with_retry_plan(common::fast_plan());
    let cities = client.cities().await.expect("second attempt succeeds");
    assert_eq!(cities.len(), 1);
}

#[tokio::test]
async fn backoff_spaces_attempts_no_sooner_than_the_schedule() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    // base 100ms doubling: waits of 100ms and 200ms before attempts 2 and 3.
    let plan = RetryPlan::new(
        3,
        Duration::from_millis(100),
        Duration::from_secs(1),
        Duration::from_secs(5),
    );
    let client = common::client_for(&server).with_retry_plan(plan);
    let started = Instant::now();
    let _ = client.cities().await;
    assert!(
        started.elapsed() >= Duration::from_millis(300),
        "attempts fired sooner than the backoff schedule allows: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn retry_scheduling_is_logged_with_the_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let (lines, guard) = common::capture_logs();
    let client = common::client_for(&server).with_retry_plan(common::fast_plan());
    let _ = client.cities().await;
    drop(guard);

    let logs = lines.lock().unwrap().clone();
    assert!(
        logs.iter()
            .any(|line| line.contains("WARN") && line.contains("retry.scheduling")),
        "expected a retry.scheduling warning, got {logs:?}"
    );
    assert!(
        logs.iter().any(|line| line.contains("retry.outcome")),
        "expected a retry.outcome event, got {logs:?}"
    );
}

#[tokio::test]
async fn unauthorized_mid_loop_is_terminal_and_distinct() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server).with_retry_plan(common::fast_plan());
    let err = client.current_user().await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);
    assert_eq!(err.to_string(), "You need to be logged in to access this");
}
