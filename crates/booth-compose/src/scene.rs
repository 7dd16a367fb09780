//! Pure compositing math over RGBA buffers.
//!
//! Layer order is fixed: background (aspect-filled to the subject canvas),
//! then the background-removed subject, then the AR overlay (scaled to fit
//! and centered). The overlay is composited exactly once, and only when it
//! carries at least one visible pixel.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::{ComposeError, ComposeResult};

/// Decodes any supported image format into an RGBA buffer.
pub fn decode_rgba(bytes: &[u8], context: &str) -> ComposeResult<RgbaImage> {
    let decoded =
        image::load_from_memory(bytes).map_err(|error| ComposeError::decode(context, error))?;
    Ok(decoded.to_rgba8())
}

/// Encodes an RGBA buffer as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> ComposeResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|error| ComposeError::Encode {
            message: error.to_string(),
        })?;
    Ok(bytes)
}

/// True when any pixel has non-zero alpha. A full scan is required: a single
/// visible pixel anywhere keeps the overlay in the composite.
pub fn overlay_has_content(overlay: &RgbaImage) -> bool {
    overlay.pixels().any(|pixel| pixel.0[3] > 0)
}

/// Scales the background so it covers the target canvas, then crops the
/// excess: wider frames lose their sides evenly, taller frames keep the
/// bottom of the picture.
pub fn aspect_fill(background: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if background.dimensions() == (width, height) {
        return background.clone();
    }
    let bg_ratio = background.width() as f64 / background.height() as f64;
    let target_ratio = width as f64 / height as f64;

    if bg_ratio > target_ratio {
        // Rounding can land one pixel short of the canvas; clamp so the crop
        // always fits.
        let scaled_width = ((height as f64 * bg_ratio) as u32).max(width);
        let scaled = imageops::resize(background, scaled_width, height, FilterType::Lanczos3);
        let left = (scaled_width - width) / 2;
        imageops::crop_imm(&scaled, left, 0, width, height).to_image()
    } else {
        let scaled_height = ((width as f64 / bg_ratio) as u32).max(height);
        let scaled = imageops::resize(background, width, scaled_height, FilterType::Lanczos3);
        let top = scaled_height - height;
        imageops::crop_imm(&scaled, 0, top, width, height).to_image()
    }
}

/// Scales the overlay to fit inside the target canvas preserving its aspect
/// ratio, centered on a transparent canvas.
pub fn fit_center(overlay: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if overlay.dimensions() == (width, height) {
        return overlay.clone();
    }
    let scale = (width as f64 / overlay.width() as f64)
        .min(height as f64 / overlay.height() as f64);
    let scaled_width = ((overlay.width() as f64 * scale) as u32).max(1);
    let scaled_height = ((overlay.height() as f64 * scale) as u32).max(1);
    let scaled = imageops::resize(overlay, scaled_width, scaled_height, FilterType::Lanczos3);

    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let left = width.saturating_sub(scaled_width) / 2;
    let top = height.saturating_sub(scaled_height) / 2;
    imageops::overlay(&mut canvas, &scaled, i64::from(left), i64::from(top));
    canvas
}

/// Builds the final scene: background under subject under overlay. Without a
/// background the subject sits on an opaque white canvas; a fully transparent
/// overlay is omitted and contributes nothing to the output.
pub fn composite_scene(
    subject: &RgbaImage,
    overlay: Option<&RgbaImage>,
    background: Option<&RgbaImage>,
) -> RgbaImage {
    let (width, height) = subject.dimensions();
    let mut canvas = match background {
        Some(background) => aspect_fill(background, width, height),
        None => RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
    };
    imageops::overlay(&mut canvas, subject, 0, 0);

    if let Some(overlay_image) = overlay {
        if overlay_has_content(overlay_image) {
            let fitted = fit_center(overlay_image, width, height);
            imageops::overlay(&mut canvas, &fitted, 0, 0);
        } else {
            tracing::debug!("overlay carries no visible pixels, skipping");
        }
    }
    canvas
}
