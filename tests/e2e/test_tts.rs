use crate::e2e::helpers;

use helpers::fakes::{FAILURE_MESSAGE, FAILURE_TRIGGER};
use helpers::{TestContext, TestOptions};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Cursor;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_synthesize_text_to_speech(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/tts", &json!({ "text": "hello world" }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/wav")
        .assert_header("content-disposition", "attachment; filename=\"output.wav\"")
        .assert_header("x-sample-rate", "16000")
        .assert_header_exists("x-duration-ms")
        .assert_header_exists("x-request-id");

    assert!(!response.body_bytes.is_empty());
    assert_eq!(&response.body_bytes[0..4], b"RIFF");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_mono_16bit_16khz_wav(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/tts", &json!({ "text": "hello world" }))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);

    let reader = hound::WavReader::new(Cursor::new(response.body_bytes.clone())).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 16000);
    assert_eq!(spec.bits_per_sample, 16);

    // 100 ms + 10 ms per character from the fake synthesizer
    assert_eq!(reader.len(), 1600 + 11 * 160);
    assert_eq!(response.header("x-duration-ms").map(String::as_str), Some("210"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_pass_empty_text_through_to_the_model(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/tts", &json!({ "text": "" }))
        .await
        .unwrap();

    // No input validation: the synthesizer decides, and the fake returns a short clip
    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/wav");
    assert!(response.body_bytes.len() > 44);
    assert_eq!(ctx.repository.calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_missing_text_with_422(ctx: &TestContext) {
    let response = ctx.client.post("/tts", &json!({})).await.unwrap();

    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_detail("missing field `text`");
    assert_eq!(ctx.repository.calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_wrong_typed_text_with_422(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/tts", &json!({ "text": 123 }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_detail("invalid type");
    assert_eq!(ctx.repository.calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_json_with_422(ctx: &TestContext) {
    let response = ctx
        .client
        .post_raw("/tts", "{\"text\": ", Some("application/json"))
        .await
        .unwrap();

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.as_ref().and_then(|b| b.get("detail")).is_some());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_non_json_content_type(ctx: &TestContext) {
    let response = ctx
        .client
        .post_raw("/tts", "hello world", Some("text/plain"))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
        .assert_detail("Content-Type");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_500_with_detail_when_synthesis_fails(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/tts", &json!({ "text": format!("please {FAILURE_TRIGGER}") }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_detail(FAILURE_MESSAGE);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body, &json!({ "detail": FAILURE_MESSAGE }));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_serving_after_a_failed_synthesis(ctx: &TestContext) {
    ctx.client
        .post("/tts", &json!({ "text": FAILURE_TRIGGER }))
        .await
        .unwrap()
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    ctx.client
        .post("/tts", &json!({ "text": "still alive" }))
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_independent_audio_for_sequential_requests(ctx: &TestContext) {
    let first = ctx
        .client
        .post("/tts", &json!({ "text": "hello world" }))
        .await
        .unwrap();
    let second = ctx
        .client
        .post("/tts", &json!({ "text": "goodbye moon" }))
        .await
        .unwrap();
    let first_again = ctx
        .client
        .post("/tts", &json!({ "text": "hello world" }))
        .await
        .unwrap();

    first.assert_status(StatusCode::OK);
    second.assert_status(StatusCode::OK);
    assert_ne!(first.body_bytes, second.body_bytes);
    assert_eq!(first.body_bytes, first_again.body_bytes);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn it_should_not_mix_up_concurrent_requests() {
    let mut ctx = TestContext::new().await.unwrap();

    let texts = ["alpha", "bravo charlie", "delta echo foxtrot", "golf"];
    let requests = texts.iter().map(|text| {
        let client = ctx.client.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            let response = client.post("/tts", &json!({ "text": text })).await.unwrap();
            (text, response)
        })
    });

    for handle in requests.collect::<Vec<_>>() {
        let (text, response) = handle.await.unwrap();
        response.assert_status(StatusCode::OK);

        let reader = hound::WavReader::new(Cursor::new(response.body_bytes.clone())).unwrap();
        assert_eq!(reader.len() as usize, 1600 + text.chars().count() * 160);
    }

    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn it_should_serve_repeated_text_from_cache_when_enabled() {
    let mut ctx = TestContext::with_options(TestOptions {
        cache_enabled: true,
        ..Default::default()
    })
    .await
    .unwrap();

    let first = ctx
        .client
        .post("/tts", &json!({ "text": "cache me" }))
        .await
        .unwrap();
    let second = ctx
        .client
        .post("/tts", &json!({ "text": "cache me" }))
        .await
        .unwrap();

    first.assert_status(StatusCode::OK);
    second.assert_status(StatusCode::OK);
    assert_eq!(first.body_bytes, second.body_bytes);
    assert_eq!(ctx.repository.calls(), 1);

    ctx.shutdown().await.unwrap();
}
