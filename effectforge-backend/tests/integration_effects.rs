mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{send, test_state, wait_for_job};
use effectforge_backend::build_router;
use serde_json::json;
use tower::util::ServiceExt;

#[tokio::test]
async fn generate_then_browse_download_and_rate() {
    let state = test_state().await;
    let pool = state.start_workers(2);
    let app = build_router(state.clone());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/effects/generate",
        Some(json!({
            "description": "warm fire particles rising slowly",
            "tags": ["Campfire"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "queued");
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let job = wait_for_job(&app, &job_id).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["progress"], 100);
    assert_eq!(job["result"]["effectType"], "particle_emitter");
    let effect_id = job["result"]["effectId"].as_str().unwrap().to_string();

    let (status, effect) = send(&app, Method::GET, &format!("/api/effects/{effect_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(effect["name"], "Blazing Particle Emitter");
    assert_eq!(effect["sourceJobId"], job_id.as_str());
    assert!(effect["tags"]
        .as_array()
        .unwrap()
        .contains(&json!("campfire")));
    assert!(effect["code"]
        .as_str()
        .unwrap()
        .contains("class BlazingParticleEmitterEffect"));

    // listing omits the source
    let (status, page) = send(&app, Method::GET, "/api/effects?category=particles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pagination"]["total"], 1);
    assert!(page["items"][0].get("code").is_none());

    // download sets headers and counts
    let uri = format!("/api/effects/{effect_id}/download");
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"blazing-particle-emitter.js\""
    );
    let etag = resp.headers()[header::ETAG].clone();
    assert_eq!(
        etag.to_str().unwrap(),
        format!("\"{}\"", effect["codeHash"].as_str().unwrap())
    );

    // a conditional download is not counted
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::IF_NONE_MATCH, etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);

    let (status, rated) = send(
        &app,
        Method::POST,
        &format!("/api/effects/{effect_id}/rate"),
        Some(json!({ "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rated["rating"], 4.0);
    assert_eq!(rated["ratingCount"], 1);
    assert_eq!(rated["downloads"], 1);

    let (status, stats) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["workers"], 2);
    assert_eq!(stats["queue"]["completed"], 1);
    assert_eq!(stats["library"]["total"], 1);
    assert_eq!(stats["library"]["totalDownloads"], 1);

    pool.shutdown().await;
}

#[tokio::test]
async fn preview_returns_every_stage_and_stores_nothing() {
    let state = test_state().await;
    let app = build_router(state.clone());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/effects/preview",
        Some(json!({ "description": "stars in space", "platform": "react" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"]["effectType"], "starfield");
    assert_eq!(body["code"]["className"], "CosmicStarfieldEffect");
    assert!(body["code"]["source"]
        .as_str()
        .unwrap()
        .starts_with("import { useEffect, useRef } from 'react';"));
    assert!(body["analysis"]["concepts"].is_array());
    assert!(body["parameters"]["count"].is_number());

    let (_, page) = send(&app, Method::GET, "/api/effects", None).await;
    assert_eq!(page["pagination"]["total"], 0);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let app = build_router(test_state().await);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/effects/generate",
        Some(json!({ "description": "ab", "platform": "svg" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["validation"]["description"]["code"], "too_short");
    assert_eq!(body["validation"]["platform"]["code"], "invalid_platform");

    let missing = uuid::Uuid::new_v4();
    let (status, body) = send(&app, Method::GET, &format!("/api/effects/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, _) = send(&app, Method::GET, "/api/effects/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/effects/{missing}/rate"),
        Some(json!({ "rating": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["validation"]["rating"]["code"], "out_of_range");

    let (status, _) = send(&app, Method::GET, "/api/effects?sort=random", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/effects/cleanup",
        Some(json!({ "includeDownloaded": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["validation"]["policy"]["code"], "unbounded");
}

#[tokio::test]
async fn cleanup_removes_unrated_effects() {
    let state = test_state().await;
    let orchestrator = state.orchestrator.clone();
    for description in ["gentle snow at night", "calm ocean waves"] {
        let request = effectforge_engine::SynthesisRequest::new(
            description,
            effectforge_store::Platform::Canvas,
        );
        let synthesis = orchestrator.synthesize(&request).unwrap();
        state
            .effects
            .insert(synthesis.into_new_effect(None))
            .await
            .unwrap();
    }
    let app = build_router(state.clone());

    let (_, page) = send(&app, Method::GET, "/api/effects?sort=name", None).await;
    let kept = page["items"][0]["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/effects/{kept}/rate"),
        Some(json!({ "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/effects/cleanup",
        Some(json!({ "belowRating": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 1);

    let (_, page) = send(&app, Method::GET, "/api/effects", None).await;
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["items"][0]["id"], kept.as_str());
}
