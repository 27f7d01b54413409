mod common;

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Extension, Json, Path};
use axum::http::{Method, StatusCode};
use common::{send, test_state};
use effectforge_backend::build_router;
use effectforge_backend::error::ApiError;
use effectforge_backend::handlers::uploads;
use serde_json::json;

#[tokio::test]
async fn records_bad_entries_and_queues_the_rest() {
    let state = test_state().await;

    let body = json!({
        "filename": "batch.txt",
        "content": "# effects\nfire embers rising\n\nx\ncalm ocean waves\n",
        "platform": "react",
    });
    let (status, Json(upload)) =
        uploads::create::create(Extension(state.clone()), Some(Json(body)))
            .await
            .expect("create upload");
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(upload["total"], 3);
    assert_eq!(upload["processed"], 1);
    assert_eq!(upload["failed"], 1);
    assert_eq!(upload["status"], "processing");
    assert_eq!(upload["errors"][0]["entry"], 2);
    assert_eq!(upload["jobIds"].as_array().unwrap().len(), 2);

    // cancelling a queued entry counts it as failed
    let job_id = upload["jobIds"][0].as_str().unwrap().to_string();
    let app = build_router(state.clone());
    let (status, _) = send(&app, Method::POST, &format!("/api/jobs/{job_id}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);

    let pool = state.start_workers(2);
    let id = upload["id"].as_str().unwrap().to_string();
    let mut path = HashMap::new();
    path.insert("uploadId".to_string(), id);

    let mut last = json!(null);
    for _ in 0..200 {
        let Json(current) = uploads::get::get(Extension(state.clone()), Path(path.clone()))
            .await
            .expect("get upload");
        last = current;
        if last["status"] == "completed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(last["status"], "completed");
    assert_eq!(last["processed"], 3);
    assert_eq!(last["failed"], 2);

    let (_, page) = send(&app, Method::GET, "/api/effects?platform=react", None).await;
    assert_eq!(page["pagination"]["total"], 1);
    pool.shutdown().await;
}

#[tokio::test]
async fn upload_with_only_bad_entries_fails() {
    let state = test_state().await;
    let body = json!({
        "filename": "bad.json",
        "content": r#"["ab", 5, {"description": "snow", "platform": "flash"}]"#,
    });
    let (_, Json(upload)) = uploads::create::create(Extension(state.clone()), Some(Json(body)))
        .await
        .expect("create upload");
    assert_eq!(upload["status"], "failed");
    assert_eq!(upload["failed"], 3);
    assert_eq!(upload["errors"].as_array().unwrap().len(), 3);

    let Json(list) = uploads::list::list(Extension(state)).await.expect("list");
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn rejects_oversized_and_malformed_uploads() {
    let state = test_state().await;

    let too_many = (0..6).map(|i| format!("rain {i}")).collect::<Vec<_>>().join("\n");
    let err = uploads::create::create(
        Extension(state.clone()),
        Some(Json(json!({ "filename": "big.txt", "content": too_many }))),
    )
    .await
    .unwrap_err();
    match err {
        ApiError::Validation(v) => {
            assert_eq!(v["validation"]["content"]["code"], "too_many_entries")
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = uploads::create::create(
        Extension(state.clone()),
        Some(Json(json!({ "filename": "x.json", "content": "[\"open" }))),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = uploads::create::create(Extension(state.clone()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let missing = uuid::Uuid::new_v4();
    let mut path = HashMap::new();
    path.insert("uploadId".to_string(), missing.to_string());
    let err = uploads::get::get(Extension(state), Path(path))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn retried_entry_is_counted_once() {
    let state = test_state().await;
    let app = build_router(state.clone());

    let body = json!({
        "filename": "pair.txt",
        "content": "fire embers rising\ncalm ocean waves\n",
    });
    let (_, Json(upload)) = uploads::create::create(Extension(state.clone()), Some(Json(body)))
        .await
        .expect("create upload");
    let first = upload["jobIds"][0].as_str().unwrap().to_string();
    let mut path = HashMap::new();
    path.insert("uploadId".to_string(), upload["id"].as_str().unwrap().to_string());

    let (status, _) = send(&app, Method::POST, &format!("/api/jobs/{first}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, retried) = send(&app, Method::POST, &format!("/api/jobs/{first}/retry"), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_ne!(retried["jobId"], first.as_str());

    // the cancellation no longer counts; the upload waits for the retry
    let Json(reopened) = uploads::get::get(Extension(state.clone()), Path(path.clone()))
        .await
        .expect("get upload");
    assert_eq!(reopened["status"], "processing");
    assert_eq!(reopened["processed"], 0);
    assert_eq!(reopened["failed"], 0);
    assert!(reopened["errors"].as_array().unwrap().is_empty());

    let pool = state.start_workers(2);
    let mut last = json!(null);
    for _ in 0..200 {
        let Json(current) = uploads::get::get(Extension(state.clone()), Path(path.clone()))
            .await
            .expect("get upload");
        last = current;
        if last["status"] == "completed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(last["status"], "completed");
    assert_eq!(last["processed"], 2);
    assert_eq!(last["failed"], 0);

    let (_, page) = send(&app, Method::GET, "/api/effects", None).await;
    assert_eq!(page["pagination"]["total"], 2);

    // the upload is settled, so its cancelled run can no longer be retried
    let (status, _) = send(&app, Method::POST, &format!("/api/jobs/{first}/retry"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    pool.shutdown().await;
}
