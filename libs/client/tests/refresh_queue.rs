use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use client::{ApiClient, ClientError};
use serde_json::json;
use tokio::{net::TcpListener, sync::Barrier};

/// Fake API whose 401s are driven by server-side flags instead of real tokens
struct Backend {
    authorized: AtomicBool,
    refresh_succeeds: bool,
    refresh_calls: AtomicUsize,
    /// Holds unauthorized answers until every concurrent request has arrived
    first_wave: Barrier,
}

type Shared = Arc<Backend>;

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

async fn item(State(backend): State<Shared>, Path(n): Path<u32>) -> Response {
    if !backend.authorized.load(Ordering::SeqCst) {
        backend.first_wave.wait().await;
        return unauthorized("Access token expired");
    }

    Json(json!({ "success": true, "data": n, "message": "ok" })).into_response()
}

async fn stubborn() -> Response {
    unauthorized("Insufficient permissions")
}

async fn refresh(State(backend): State<Shared>) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;

    if !backend.refresh_succeeds {
        return unauthorized("Invalid refresh token");
    }

    backend.authorized.store(true, Ordering::SeqCst);
    Json(json!({ "success": true, "data": null, "message": "Token refreshed successfully" }))
        .into_response()
}

async fn spawn_backend(refresh_succeeds: bool, concurrency: usize) -> anyhow::Result<(SocketAddr, Shared)> {
    let backend = Arc::new(Backend {
        authorized: AtomicBool::new(false),
        refresh_succeeds,
        refresh_calls: AtomicUsize::new(0),
        first_wave: Barrier::new(concurrency),
    });

    let app = Router::new()
        .route("/api/v1/items/:n", get(item))
        .route("/api/v1/stubborn", get(stubborn))
        .route("/api/v1/users/refresh-token", post(refresh))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok((addr, backend))
}

async fn fire(client: &ApiClient, count: u32) -> Vec<Result<u32, ClientError>> {
    let handles: Vec<_> = (0..count)
        .map(|n| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<u32>(&format!("/items/{n}")).await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("request task panicked"));
    }
    results
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() -> anyhow::Result<()> {
    let (addr, backend) = spawn_backend(true, 5).await?;
    let client = ApiClient::new(format!("http://{addr}/api/v1"))?;

    let results = fire(&client, 5).await;

    for (n, result) in results.into_iter().enumerate() {
        assert_eq!(result?, n as u32);
    }
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.refresh_gate().waiting(), 0);

    Ok(())
}

#[tokio::test]
async fn failed_refresh_rejects_every_request() -> anyhow::Result<()> {
    let (addr, backend) = spawn_backend(false, 5).await?;
    let client = ApiClient::new(format!("http://{addr}/api/v1"))?;

    let results = fire(&client, 5).await;

    for result in results {
        assert!(matches!(result, Err(ClientError::SessionExpired)));
    }
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn replayed_401_is_returned_without_looping() -> anyhow::Result<()> {
    let (addr, backend) = spawn_backend(true, 1).await?;
    let client = ApiClient::new(format!("http://{addr}/api/v1"))?;

    let err = client
        .get::<serde_json::Value>("/stubborn")
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "Insufficient permissions");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);

    Ok(())
}
