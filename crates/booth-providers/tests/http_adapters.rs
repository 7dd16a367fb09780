//! Adapter tests against in-process stub servers.
//!
//! Each stub binds an ephemeral loopback port and answers with a canned
//! upstream response, so the adapters exercise their real request/response
//! handling without touching any external service.

use axum::extract::Request;
use axum::routing::post;
use axum::{Json, Router};
use booth_characters::ConversionModel;
use booth_providers::{
    CompletionProvider, ProviderError, RecognitionProvider, RvcConverter, RvcConverterConfig,
    SpeechKitCompleter, SpeechKitCompleterConfig, SpeechKitRecognizer, SpeechKitRecognizerConfig,
    VoiceConverter,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn functional_recognizer_extracts_result_text() {
    let app = Router::new().route(
        "/speech/v1/stt:recognize",
        post(|request: Request| async move {
            // Query parameters carry the language/folder context.
            let query = request.uri().query().unwrap_or_default().to_string();
            assert!(query.contains("lang=ru-RU"));
            assert!(query.contains("folderId=folder-1"));
            Json(json!({ "result": "привет, Чебурашка" }))
        }),
    );
    let base = spawn_stub(app).await;

    let recognizer =
        SpeechKitRecognizer::new(SpeechKitRecognizerConfig::new(base, "key", "folder-1"))
            .expect("recognizer");
    let text = recognizer
        .recognize(b"ogg-bytes".to_vec())
        .await
        .expect("recognize");
    assert_eq!(text, "привет, Чебурашка");
}

#[tokio::test]
async fn regression_recognizer_propagates_upstream_status_and_body() {
    let app = Router::new().route(
        "/speech/v1/stt:recognize",
        post(|| async { (axum::http::StatusCode::FORBIDDEN, "folder mismatch") }),
    );
    let base = spawn_stub(app).await;

    let recognizer =
        SpeechKitRecognizer::new(SpeechKitRecognizerConfig::new(base, "key", "folder-1"))
            .expect("recognizer");
    let error = recognizer
        .recognize(b"ogg-bytes".to_vec())
        .await
        .expect_err("expected transport error");
    match error {
        ProviderError::Transport { status, body, .. } => {
            assert_eq!(status, 403);
            assert_eq!(body, "folder mismatch");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn regression_recognizer_reports_empty_result_distinctly() {
    let app = Router::new().route(
        "/speech/v1/stt:recognize",
        post(|| async { Json(json!({ "result": "  " })) }),
    );
    let base = spawn_stub(app).await;

    let recognizer =
        SpeechKitRecognizer::new(SpeechKitRecognizerConfig::new(base, "key", "folder-1"))
            .expect("recognizer");
    let error = recognizer
        .recognize(b"ogg-bytes".to_vec())
        .await
        .expect_err("expected empty-recognition error");
    assert!(matches!(error, ProviderError::EmptyRecognition));
}

#[tokio::test]
async fn functional_completer_sends_messages_and_extracts_reply() {
    let app = Router::new().route(
        "/foundationModels/v1/completion",
        post(|Json(payload): Json<Value>| async move {
            let model_uri = payload["modelUri"].as_str().unwrap_or_default();
            assert_eq!(model_uri, "gpt://folder-1/yandexgpt-lite");
            assert_eq!(payload["completionOptions"]["stream"], json!(false));
            assert_eq!(payload["messages"][0]["role"], json!("system"));
            Json(json!({
                "result": {
                    "alternatives": [
                        { "message": { "role": "assistant", "text": "Привет, друг!" } }
                    ]
                }
            }))
        }),
    );
    let base = spawn_stub(app).await;

    let completer =
        SpeechKitCompleter::new(SpeechKitCompleterConfig::new(base, "key", "folder-1"))
            .expect("completer");
    let reply = completer
        .complete(vec![
            booth_providers::ChatMessage::system("persona"),
            booth_providers::ChatMessage::user("привет"),
        ])
        .await
        .expect("complete");
    assert_eq!(reply, "Привет, друг!");
}

#[tokio::test]
async fn functional_converter_selects_model_then_copies_converted_audio() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let converted_source = scratch.path().join("rvc-output.wav");
    std::fs::write(&converted_source, b"converted-wav").expect("write source");

    let converted_source_for_stub = converted_source.clone();
    let app = Router::new()
        .route(
            "/run/infer_set",
            post(|Json(payload): Json<Value>| async move {
                assert_eq!(payload["data"][0], json!("cheb.pth"));
                Json(json!({ "data": ["ok"] }))
            }),
        )
        .route(
            "/run/infer_convert",
            post(move |Json(payload): Json<Value>| {
                let source = converted_source_for_stub.clone();
                async move {
                    // Index path is present because the model carries an index.
                    assert_eq!(payload["data"][6], json!("logs/cheb.index"));
                    assert_eq!(payload["data"][4], json!("pm"));
                    Json(json!({
                        "data": ["done", { "name": source.to_string_lossy() }]
                    }))
                }
            }),
        );
    let base = spawn_stub(app).await;

    let converter = RvcConverter::new(RvcConverterConfig::new(base)).expect("converter");
    let model = ConversionModel {
        model: "cheb".to_string(),
        has_index: true,
    };
    let input = scratch.path().join("tts.wav");
    std::fs::write(&input, b"tts-wav").expect("write input");
    let output = scratch.path().join("converted.wav");

    converter
        .convert(&model, &input, &output)
        .await
        .expect("convert");
    assert_eq!(std::fs::read(&output).expect("read output"), b"converted-wav");
}

#[tokio::test]
async fn regression_converter_treats_null_data_as_failure() {
    let app = Router::new().route(
        "/run/infer_set",
        post(|| async { Json(json!({ "data": null })) }),
    );
    let base = spawn_stub(app).await;

    let converter = RvcConverter::new(RvcConverterConfig::new(base)).expect("converter");
    let model = ConversionModel {
        model: "gena".to_string(),
        has_index: true,
    };
    let error = converter
        .convert(&model, "in.wav".as_ref(), "out.wav".as_ref())
        .await
        .expect_err("expected selection failure");
    assert!(matches!(error, ProviderError::InvalidResponse { .. }));
}
