//! HTTP surface: multipart extraction, NDJSON streaming, and the booth
//! image endpoints.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use serde_json::json;

use booth_pipeline::ReplyRequest;

use crate::state::AppState;

// Audio clips and photos arrive as multi-MB multipart uploads; the axum
// default cap is far too small for them.
const UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/voice/reply",
            post(handle_voice_reply).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/booth/remove",
            post(handle_booth_remove).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/booth/stylize",
            post(handle_booth_stylize).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/healthz", get(handle_healthz))
        .with_state(state)
}

/// Request-rejection and processing-failure payload.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn handle_healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn handle_voice_reply(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request = read_voice_parts(multipart).await?;
    tracing::info!(
        caller = %request.caller,
        character = %request.character,
        audio_bytes = request.audio.len(),
        "voice reply request"
    );

    let lines = state.pipeline.stream_reply(request).map(|record| {
        let mut line = serde_json::to_string(&record).unwrap_or_else(|error| {
            format!(r#"{{"type":"error","message":"record serialization failed: {error}"}}"#)
        });
        line.push('\n');
        Ok::<_, Infallible>(line)
    });

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(Body::from_stream(lines))
        .unwrap_or_else(|_| Response::new(Body::empty())))
}

async fn handle_booth_remove(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let parts = read_booth_parts(multipart).await?;
    let png = state
        .flows
        .remove_and_composite(parts.photo, parts.overlay, parts.active_target.as_deref())
        .await
        .map_err(|error| {
            tracing::error!(error = %error, "booth compositing failed");
            ApiError::internal(format!("processing failed: {error}"))
        })?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn handle_booth_stylize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let parts = read_booth_parts(multipart).await?;
    let edited = state
        .flows
        .stylize(parts.photo, parts.overlay, parts.active_target.as_deref())
        .await
        .map_err(|error| {
            tracing::error!(error = %error, "booth stylize failed");
            ApiError::internal(format!("processing failed: {error}"))
        })?;
    Ok(([(header::CONTENT_TYPE, "image/png")], edited).into_response())
}

async fn read_voice_parts(mut multipart: Multipart) -> Result<ReplyRequest, ApiError> {
    let mut audio = None;
    let mut character = None;
    let mut caller = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed_multipart)? {
        match field.name() {
            Some("audio") => {
                audio = Some(field.bytes().await.map_err(malformed_multipart)?.to_vec());
            }
            Some("character") => {
                character = Some(field.text().await.map_err(malformed_multipart)?);
            }
            Some("caller") => {
                caller = Some(field.text().await.map_err(malformed_multipart)?);
            }
            _ => {}
        }
    }

    let audio = audio
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing `audio` file part"))?;
    let character = character
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing `character` field"))?;
    let caller = caller
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing `caller` field"))?;

    Ok(ReplyRequest {
        caller,
        character,
        audio,
    })
}

struct BoothParts {
    photo: Vec<u8>,
    overlay: Vec<u8>,
    active_target: Option<String>,
}

async fn read_booth_parts(mut multipart: Multipart) -> Result<BoothParts, ApiError> {
    let mut photo = None;
    let mut overlay = None;
    let mut active_target = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed_multipart)? {
        match field.name() {
            Some("photo") => {
                require_image_content_type(field.content_type(), "photo")?;
                photo = Some(field.bytes().await.map_err(malformed_multipart)?.to_vec());
            }
            Some("ar_overlay") => {
                require_image_content_type(field.content_type(), "ar_overlay")?;
                overlay = Some(field.bytes().await.map_err(malformed_multipart)?.to_vec());
            }
            Some("active_target") => {
                active_target = Some(field.text().await.map_err(malformed_multipart)?);
            }
            _ => {}
        }
    }

    let photo = photo.ok_or_else(|| ApiError::bad_request("missing `photo` file part"))?;
    let overlay =
        overlay.ok_or_else(|| ApiError::bad_request("missing `ar_overlay` file part"))?;

    Ok(BoothParts {
        photo,
        overlay,
        active_target: active_target.filter(|text| !text.trim().is_empty()),
    })
}

fn require_image_content_type(
    content_type: Option<&str>,
    part_name: &str,
) -> Result<(), ApiError> {
    match content_type {
        Some(content_type) if content_type.starts_with("image/") => Ok(()),
        _ => Err(ApiError::bad_request(format!(
            "`{part_name}` file is not an image"
        ))),
    }
}

fn malformed_multipart(error: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::bad_request(format!("malformed multipart body: {error}"))
}
