use crate::e2e::helpers;

use helpers::{TestContext, TestOptions};
use hyper::StatusCode;
use serde_json::json;

#[tokio::test]
async fn it_should_mirror_latest_result_and_remove_it_on_shutdown() {
    let mut ctx = TestContext::with_options(TestOptions {
        scratch_file: true,
        ..Default::default()
    })
    .await
    .unwrap();
    let scratch_path = ctx.scratch_path().cloned().unwrap();

    let first = ctx
        .client
        .post("/tts", &json!({ "text": "first request" }))
        .await
        .unwrap();
    first.assert_status(StatusCode::OK);
    assert_eq!(std::fs::read(&scratch_path).unwrap(), first.body_bytes);

    let second = ctx
        .client
        .post("/tts", &json!({ "text": "second" }))
        .await
        .unwrap();
    second.assert_status(StatusCode::OK);
    assert_eq!(std::fs::read(&scratch_path).unwrap(), second.body_bytes);

    ctx.shutdown().await.unwrap();

    assert!(!scratch_path.exists());
}

#[tokio::test]
async fn it_should_not_touch_disk_without_scratch_path() {
    let mut ctx = TestContext::new().await.unwrap();
    assert!(ctx.scratch_path().is_none());

    ctx.client
        .post("/tts", &json!({ "text": "in memory only" }))
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let written: Vec<_> = std::fs::read_dir(ctx.scratch_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert!(written.is_empty(), "unexpected files: {written:?}");
    assert!(!std::path::Path::new("output.wav").exists());

    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn it_should_stop_accepting_requests_after_shutdown() {
    let mut ctx = TestContext::new().await.unwrap();
    let client = ctx.client.clone();

    client
        .get("/health")
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    ctx.shutdown().await.unwrap();

    assert!(client.get("/health").await.is_err());
}
