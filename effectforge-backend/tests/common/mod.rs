#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use effectforge_backend::state::AppState;
use serde_json::Value;
use tower::util::ServiceExt;

/// State wired like `main` does, with no pause between pipeline stages.
pub async fn test_state() -> Arc<AppState> {
    let mut cfg = effectforge_config::Config::default();
    cfg.queue.stage_delay_ms = 0;
    cfg.uploads.max_entries = 5;
    Arc::new(AppState::from_config(&cfg).await)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Poll a job until it reaches a terminal status.
pub async fn wait_for_job(app: &Router, job_id: &str) -> Value {
    for _ in 0..200 {
        let (status, job) = send(app, Method::GET, &format!("/api/jobs/{job_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        if job["status"] == "completed" || job["status"] == "failed" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {job_id} did not finish");
}
