//! Health checks against loopback HTTP fixtures.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use rsu_fleet_cli::application::services::health_checker::{check, check_all};
use rsu_fleet_cli::domain::HealthVerdict;
use rsu_fleet_cli::infra::http::WorkerHttpClient;
use tokio::net::TcpListener;

use crate::fakes::FakeSignaller;
use crate::helpers::instance;

const TIMEOUT: Duration = Duration::from_millis(500);

/// Serve `router` on an ephemeral loopback port and return that port.
async fn serve(router: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    port
}

/// A loopback port nothing listens on.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn json_health() -> Router {
    Router::new().route(
        "/health",
        get(|| async { axum::Json(serde_json::json!({ "status": "ok", "rsu": "1" })) }),
    )
}

fn base(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn json_body_is_healthy() {
    let port = serve(json_health()).await;
    let client = WorkerHttpClient::new().unwrap();

    let verdict = check(&client, &base(port), TIMEOUT).await;

    assert_eq!(
        verdict,
        HealthVerdict::Healthy(serde_json::json!({ "status": "ok", "rsu": "1" }))
    );
}

#[tokio::test]
async fn plain_text_body_is_an_error() {
    let port = serve(Router::new().route("/health", get(|| async { "OK" }))).await;
    let client = WorkerHttpClient::new().unwrap();

    let verdict = check(&client, &base(port), TIMEOUT).await;

    assert!(matches!(verdict, HealthVerdict::Error(_)), "got {verdict:?}");
}

#[tokio::test]
async fn server_error_is_unreachable() {
    let router = Router::new().route(
        "/health",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "{}") }),
    );
    let port = serve(router).await;
    let client = WorkerHttpClient::new().unwrap();

    let verdict = check(&client, &base(port), TIMEOUT).await;

    assert_eq!(verdict, HealthVerdict::Unreachable("HTTP 503".to_string()));
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let port = closed_port().await;
    let client = WorkerHttpClient::new().unwrap();

    let verdict = check(&client, &base(port), TIMEOUT).await;

    assert!(matches!(verdict, HealthVerdict::Unreachable(_)), "got {verdict:?}");
}

#[tokio::test]
async fn slow_worker_times_out() {
    let router = Router::new().route(
        "/health",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    );
    let port = serve(router).await;
    let client = WorkerHttpClient::new().unwrap();

    let started = std::time::Instant::now();
    let verdict = check(&client, &base(port), Duration::from_millis(200)).await;

    assert!(matches!(verdict, HealthVerdict::Unreachable(_)), "got {verdict:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn check_all_reports_every_instance_in_order() {
    let healthy = serve(json_health()).await;
    let dead = closed_port().await;
    let client = WorkerHttpClient::new().unwrap();
    let signaller = FakeSignaller::alive(&[11]);
    let instances = [instance("1", healthy, 11), instance("2", dead, 12)];

    let report = check_all(&client, &signaller, &instances, TIMEOUT).await;

    assert_eq!(report.instances.len(), 2);
    assert_eq!(report.instances[0].id, "1");
    assert!(report.instances[0].verdict.is_healthy());
    assert!(report.instances[0].alive);
    assert!(matches!(report.instances[1].verdict, HealthVerdict::Unreachable(_)));
    assert!(!report.instances[1].alive);
    assert!(!report.all_healthy());
    assert_eq!(report.summary.unhealthy(), 1);
}
