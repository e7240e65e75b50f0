// HTTP health probe against a local axum server.

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use omniwatch::error::ReconcileError;
use omniwatch::events;
use omniwatch::health::{HealthProbe, HealthProber, HttpProbe};
use omniwatch::readiness::wait_healthy;
use std::net::SocketAddr;
use tokio::time::{sleep, Duration};

async fn spawn_app() -> SocketAddr {
    let app = Router::new()
        .route("/", get(|| async { "omnitool" }))
        .route("/created", get(|| async { (StatusCode::CREATED, "created") }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/slow",
            get(|| async {
                sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn probe() -> HttpProbe {
    HttpProbe::new(Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn test_200_is_healthy() {
    let addr = spawn_app().await;
    probe().probe(&format!("http://{}/", addr)).await.unwrap();
}

#[tokio::test]
async fn test_other_statuses_are_unhealthy() {
    let addr = spawn_app().await;
    for path in ["created", "missing", "broken"] {
        let err = probe()
            .probe(&format!("http://{}/{}", addr, path))
            .await
            .unwrap_err();
        match err {
            ReconcileError::HealthCheckFailed(msg) => assert!(msg.contains("returned"), "{}", msg),
            other => panic!("unexpected error for /{}: {:?}", path, other),
        }
    }
}

#[tokio::test]
async fn test_refused_connection_is_unhealthy() {
    // Grab a free port and close it again
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = probe().probe(&format!("http://{}/", addr)).await.unwrap_err();
    assert!(matches!(err, ReconcileError::HealthCheckFailed(_)));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let addr = spawn_app().await;
    let err = probe()
        .probe(&format!("http://{}/slow", addr))
        .await
        .unwrap_err();
    match err {
        ReconcileError::HealthCheckFailed(msg) => assert!(msg.contains("timed out"), "{}", msg),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_wait_healthy_gives_up() {
    let addr = spawn_app().await;
    let (handle, _rx) = events::channel();
    let mut prober = HealthProber::new(Box::new(probe()), format!("http://{}/missing", addr), handle);

    let result = wait_healthy(&mut prober, Duration::from_secs(1), Duration::from_millis(100)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_wait_healthy_succeeds_when_up() {
    let addr = spawn_app().await;
    let (handle, _rx) = events::channel();
    let mut prober = HealthProber::new(Box::new(probe()), format!("http://{}/", addr), handle);

    wait_healthy(&mut prober, Duration::from_secs(5), Duration::from_millis(100))
        .await
        .unwrap();
}
