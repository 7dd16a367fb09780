//! End-to-end gateway runs against a bound listener, with scripted providers
//! behind the real router.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use booth_characters::SelectionPolicy;
use booth_compose::{decode_rgba, encode_png, BoothFlows};
use booth_gateway::{build_router, AppState};
use booth_history::HistoryStore;
use booth_pipeline::ReplyPipeline;
use booth_providers::testing::{
    ScriptedCompleter, ScriptedConverter, ScriptedEditor, ScriptedRecognizer, ScriptedRemover,
    ScriptedSynthesizer,
};
use booth_transcode::testing::CopyTranscoder;

struct GatewayFixture {
    recognizer: Arc<ScriptedRecognizer>,
    remover: Arc<ScriptedRemover>,
    editor: Arc<ScriptedEditor>,
    _scratch: tempfile::TempDir,
    _assets: tempfile::TempDir,
    state: AppState,
}

fn subject_png() -> Vec<u8> {
    let mut subject = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
    subject.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
    encode_png(&subject).expect("encode subject")
}

fn transparent_png() -> Vec<u8> {
    encode_png(&image::RgbaImage::from_pixel(
        4,
        4,
        image::Rgba([0, 0, 0, 0]),
    ))
    .expect("encode overlay")
}

fn fixture_with(recognizer: ScriptedRecognizer) -> GatewayFixture {
    let recognizer = Arc::new(recognizer);
    let remover = Arc::new(ScriptedRemover::succeed_with(subject_png()));
    let editor = Arc::new(ScriptedEditor::succeed_with(b"edited-bytes".to_vec()));
    let scratch = tempfile::tempdir().expect("scratch dir");
    let assets = tempfile::tempdir().expect("assets dir");

    let pipeline = Arc::new(ReplyPipeline::new(
        Arc::clone(&recognizer) as _,
        Arc::new(ScriptedCompleter::reply("Отлично!")),
        Arc::new(ScriptedSynthesizer::audio(b"synth".to_vec())),
        Arc::new(ScriptedConverter::succeed_with(b"converted".to_vec())),
        Arc::new(CopyTranscoder),
        Arc::new(HistoryStore::new()),
        scratch.path().to_path_buf(),
    ));
    let flows = Arc::new(BoothFlows::new(
        Arc::clone(&remover) as _,
        Arc::clone(&editor) as _,
        SelectionPolicy::from_seed(3),
        assets.path().to_path_buf(),
    ));

    GatewayFixture {
        recognizer,
        remover,
        editor,
        _scratch: scratch,
        _assets: assets,
        state: AppState::new(pipeline, flows),
    }
}

fn fixture() -> GatewayFixture {
    fixture_with(ScriptedRecognizer::text("привет"))
}

async fn spawn_gateway(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn voice_form() -> Form {
    Form::new()
        .part(
            "audio",
            Part::bytes(b"ogg-upload".to_vec())
                .file_name("clip.ogg")
                .mime_str("audio/ogg")
                .expect("mime"),
        )
        .text("character", "cheb")
        .text("caller", "dev1")
}

fn booth_form(photo_mime: &str) -> Form {
    Form::new()
        .part(
            "photo",
            Part::bytes(subject_png())
                .file_name("photo.png")
                .mime_str(photo_mime)
                .expect("mime"),
        )
        .part(
            "ar_overlay",
            Part::bytes(transparent_png())
                .file_name("overlay.png")
                .mime_str("image/png")
                .expect("mime"),
        )
        .text("active_target", "cheb")
}

#[tokio::test]
async fn integration_healthz_reports_ok() {
    let fixture = fixture();
    let addr = spawn_gateway(fixture.state.clone()).await;

    let response = reqwest::get(format!("http://{addr}/healthz"))
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn integration_voice_reply_streams_stt_then_final_as_ndjson() {
    let fixture = fixture();
    let addr = spawn_gateway(fixture.state.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/voice/reply"))
        .multipart(voice_form())
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/x-ndjson"));

    let body = response.text().await.expect("body");
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);
    let stt: Value = serde_json::from_str(lines[0]).expect("stt line");
    assert_eq!(stt["type"], "stt");
    assert_eq!(stt["text"], "привет");
    let fin: Value = serde_json::from_str(lines[1]).expect("final line");
    assert_eq!(fin["type"], "final");
    assert_eq!(fin["reply_text"], "Отлично!");
    assert!(!fin["audio_base64"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn integration_pipeline_failure_streams_single_error_record() {
    let fixture = fixture_with(ScriptedRecognizer::transport(500, "stt down"));
    let addr = spawn_gateway(fixture.state.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/voice/reply"))
        .multipart(voice_form())
        .send()
        .await
        .expect("request");
    // The stream itself is committed with 200; the failure travels inside it.
    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("body");
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: Value = serde_json::from_str(lines[0]).expect("error line");
    assert_eq!(record["type"], "error");
    assert!(record["message"]
        .as_str()
        .unwrap_or_default()
        .contains("500"));
}

#[tokio::test]
async fn integration_missing_audio_part_is_rejected_before_pipeline_runs() {
    let fixture = fixture();
    let addr = spawn_gateway(fixture.state.clone()).await;

    let form = Form::new().text("character", "cheb").text("caller", "dev1");
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/voice/reply"))
        .multipart(form)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("audio"));
    assert_eq!(fixture.recognizer.call_count(), 0);
}

#[tokio::test]
async fn integration_booth_remove_returns_composite_png() {
    let fixture = fixture();
    let addr = spawn_gateway(fixture.state.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/booth/remove"))
        .multipart(booth_form("image/png"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(content_type, "image/png");

    let bytes = response.bytes().await.expect("body");
    let scene = decode_rgba(&bytes, "composite").expect("decode");
    assert_eq!(scene.dimensions(), (4, 4));
    assert_eq!(fixture.remover.call_count(), 1);
}

#[tokio::test]
async fn integration_non_image_photo_part_is_rejected() {
    let fixture = fixture();
    let addr = spawn_gateway(fixture.state.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/booth/remove"))
        .multipart(booth_form("text/plain"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("photo"));
    assert_eq!(fixture.remover.call_count(), 0);
}

#[tokio::test]
async fn integration_booth_stylize_returns_edited_bytes_as_is() {
    let fixture = fixture();
    let addr = spawn_gateway(fixture.state.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/booth/stylize"))
        .multipart(booth_form("image/png"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let bytes = response.bytes().await.expect("body");
    assert_eq!(bytes.as_ref(), b"edited-bytes");
    assert_eq!(fixture.editor.call_count(), 1);
    let instructions = fixture.editor.received_instructions();
    assert!(instructions[0].contains("Чебурашк"));
}
