use super::*;

#[tokio::test]
async fn test_prepare_poll_download_round_trip() {
    let app = test_app(ScriptedEngine::new(vec![Step::succeed(&[(
        "Test Video.mp4",
        4096,
    )])]))
    .await;

    let id = app
        .prepare(json!({ "url": VIDEO_URL, "format": "video", "quality": 720 }))
        .await;
    wait_for_terminal(&app.downloader, &id).await;

    let progress = body_json(app.get(&format!("/api/progress/{}", id)).await).await;
    assert_eq!(progress["status"], "ready");
    assert_eq!(progress["percent"], 100);
    assert_eq!(progress["filename"], "Test Video.mp4");
    assert_eq!(progress["filesize"], 4096);
    assert_eq!(progress["title"], "Test Video");
    assert_eq!(progress["channel"], "Test Uploader");

    let response = app.get(&format!("/api/download/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), "video/mp4");
    assert_eq!(
        header(&response, "content-disposition"),
        "attachment; filename*=UTF-8''Test%20Video.mp4"
    );
    assert_eq!(header(&response, "content-length"), "4096");
    assert_eq!(header(&response, "cache-control"), "no-cache");

    let bytes = body_bytes(response).await;
    assert_eq!(bytes.len() as u64, progress["filesize"].as_u64().unwrap());

    // Serving the file schedules removal after the (shortened) post-transfer delay
    let registry = app.downloader.registry().clone();
    wait_until("post-transfer cleanup", || registry.get(&id).is_none()).await;
    let response = app.get(&format!("/api/progress/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_prepare_accepts_string_quality_and_defaults() {
    let app = test_app(ScriptedEngine::new(vec![
        Step::succeed(&[("a.mp4", 1)]),
        Step::succeed(&[("b.mp3", 1)]),
    ]))
    .await;

    let first = app
        .prepare(json!({ "url": VIDEO_URL, "quality": "480" }))
        .await;
    wait_for_terminal(&app.downloader, &first).await;

    let second = app
        .prepare(json!({ "url": VIDEO_URL, "format": "audio", "quality": "" }))
        .await;
    wait_for_terminal(&app.downloader, &second).await;

    let attempts = app.engine.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].request.candidate.to_string(), "separate<=480p");
    assert!(attempts[1].request.transcode.is_some());

    let first = app.downloader.progress(&first).unwrap();
    assert_eq!(first.quality, 480);
    let second = app.downloader.progress(&second).unwrap();
    assert_eq!(second.quality, 1080);
}

#[tokio::test]
async fn test_prepare_rejects_invalid_requests() {
    let app = test_app(ScriptedEngine::new(vec![])).await;

    let cases = [
        json!({ "url": "" }),
        json!({ "url": "https://example.com/watch?v=abc" }),
        json!({ "url": "ftp://youtube.com/watch?v=abc" }),
        json!({ "url": VIDEO_URL, "format": "gif" }),
        json!({ "url": VIDEO_URL, "quality": "best" }),
        json!({ "url": VIDEO_URL, "quality": 0 }),
        json!({ "url": VIDEO_URL, "quality": [720] }),
    ];

    for body in cases {
        let response = app.post_json("/api/prepare", body.clone()).await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for {}",
            body
        );
        let json = body_json(response).await;
        assert_eq!(json["code"], "validation_error");
        assert!(!json["error"].as_str().unwrap().is_empty());
    }

    assert!(app.downloader.registry().is_empty());
    assert!(app.engine.attempts().is_empty());
}

#[tokio::test]
async fn test_prepare_rejects_malformed_json() {
    let app = test_app(ScriptedEngine::new(vec![])).await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/prepare")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "validation_error");
}

#[tokio::test]
async fn test_prepare_returns_429_when_busy() {
    let gated = || Step::succeed(&[("v.mp4", 1)]).gated(vec![]);
    let app = test_app(ScriptedEngine::new(vec![gated(), gated(), gated()])).await;

    for _ in 0..3 {
        app.prepare(json!({ "url": VIDEO_URL })).await;
    }

    let response = app
        .post_json("/api/prepare", json!({ "url": VIDEO_URL }))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "busy");
    assert_eq!(json["details"]["limit"], 3);

    assert_eq!(app.downloader.registry().len(), 3);
}

#[tokio::test]
async fn test_unknown_task_returns_404() {
    let app = test_app(ScriptedEngine::new(vec![])).await;
    let unknown = TaskId::generate();

    let response = app.get(&format!("/api/progress/{}", unknown)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "not_found");

    let response = app.get(&format!("/api/download/{}", unknown)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post_json(&format!("/api/cancel/{}", unknown), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/progress/..%2F..%2Fetc").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_task_id_returns_404_on_every_route() {
    let app = test_app(ScriptedEngine::new(vec![])).await;
    let malformed = [
        "abc".to_string(),
        "g".repeat(32),
        "0".repeat(33),
        format!("{}-x", TaskId::generate()),
    ];

    for raw in &malformed {
        for response in [
            app.get(&format!("/api/progress/{}", raw)).await,
            app.get(&format!("/api/download/{}", raw)).await,
            app.post_json(&format!("/api/cancel/{}", raw), json!({}))
                .await,
        ] {
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "id {raw:?}");
            let body = body_json(response).await;
            assert_eq!(body["code"], "not_found");
            assert!(body["error"].as_str().unwrap().contains(raw.as_str()));
        }
    }
}

#[tokio::test]
async fn test_download_before_ready_returns_400() {
    let app = test_app(ScriptedEngine::new(vec![
        Step::succeed(&[("v.mp4", 8)]).gated(vec![]),
    ]))
    .await;

    let id = app.prepare(json!({ "url": VIDEO_URL })).await;

    let response = app.get(&format!("/api/download/{}", id)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "not_ready");
    assert_eq!(json["details"]["task_id"], id.as_str());

    app.engine.release();
    wait_for_terminal(&app.downloader, &id).await;
    let response = app.get(&format!("/api/download/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_download_of_failed_task_returns_400() {
    let app = test_app(ScriptedEngine::new(vec![Step::fail(
        crate::error::EngineError::Auth("Sign in to confirm you're not a bot".into()),
    )]))
    .await;

    let id = app.prepare(json!({ "url": VIDEO_URL })).await;
    wait_for_terminal(&app.downloader, &id).await;

    let progress = body_json(app.get(&format!("/api/progress/{}", id)).await).await;
    assert_eq!(progress["status"], "error");
    assert!(progress["filename"].is_null());

    let response = app.get(&format!("/api/download/{}", id)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_active_task_then_conflict() {
    let app = test_app(ScriptedEngine::new(vec![
        Step::succeed(&[("v.mp4", 8)]).gated(vec![]),
    ]))
    .await;

    let id = app.prepare(json!({ "url": VIDEO_URL })).await;

    let response = app
        .post_json(&format!("/api/cancel/{}", id), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "cancelled");
    assert_eq!(json["task_id"], id.as_str());

    let response = app
        .post_json(&format!("/api/cancel/{}", id), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "invalid_state");

    // The engine finishing afterwards does not revive the task
    app.engine.release();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let progress = body_json(app.get(&format!("/api/progress/{}", id)).await).await;
    assert_eq!(progress["status"], "cancelled");
}
