//! Foundational low-level utilities shared across booth crates.
//!
//! Provides time helpers, the per-request scratch directory guard, and
//! error-body truncation used when upstream failures are surfaced to callers.

pub mod scratch_dir;
pub mod time_utils;

pub use scratch_dir::ScratchDir;
pub use time_utils::{current_unix_timestamp, current_unix_timestamp_ms};

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Trims and bounds an upstream error body so propagated messages stay
/// readable in logs and terminal records.
pub fn truncate_error_body(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let truncated = trimmed
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect::<String>();
    format!("{truncated}...")
}
