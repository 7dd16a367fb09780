use std::path::PathBuf;
use std::sync::Arc;

use booth_characters::{profile_for, SelectionPolicy};
use booth_providers::{BackgroundRemover, ImageEditor};
use image::RgbaImage;

use crate::error::{ComposeError, ComposeResult};
use crate::scene::{composite_scene, decode_rgba, encode_png};

/// The two booth flows over one shared composite builder.
///
/// `remove_and_composite` returns the layered PNG; `stylize` forwards the
/// same composite to the generative edit service with the resolved
/// character's instruction and returns the edited image as-is.
pub struct BoothFlows {
    remover: Arc<dyn BackgroundRemover>,
    editor: Arc<dyn ImageEditor>,
    selection: SelectionPolicy,
    assets_dir: PathBuf,
}

impl BoothFlows {
    pub fn new(
        remover: Arc<dyn BackgroundRemover>,
        editor: Arc<dyn ImageEditor>,
        selection: SelectionPolicy,
        assets_dir: PathBuf,
    ) -> Self {
        Self {
            remover,
            editor,
            selection,
            assets_dir,
        }
    }

    /// Background-removal endpoint body: layered composite as PNG bytes.
    pub async fn remove_and_composite(
        &self,
        photo: Vec<u8>,
        overlay: Vec<u8>,
        active_target: Option<&str>,
    ) -> ComposeResult<Vec<u8>> {
        let (png, _target) = self.build_composite(photo, overlay, active_target).await?;
        Ok(png)
    }

    /// Stylize endpoint body: the composite routed through the hosted
    /// image-edit model with the character's instruction text.
    pub async fn stylize(
        &self,
        photo: Vec<u8>,
        overlay: Vec<u8>,
        active_target: Option<&str>,
    ) -> ComposeResult<Vec<u8>> {
        let (png, target) = self.build_composite(photo, overlay, active_target).await?;
        let profile = profile_for(target);
        self.editor
            .edit(png, &profile.edit_instruction)
            .await
            .map_err(|source| ComposeError::Edit { source })
    }

    async fn build_composite(
        &self,
        photo: Vec<u8>,
        overlay: Vec<u8>,
        active_target: Option<&str>,
    ) -> ComposeResult<(Vec<u8>, &'static str)> {
        let target = self.selection.resolve(active_target);
        if active_target != Some(target) {
            tracing::debug!(target, "no usable target in request, picked one");
        }

        // Decode both uploads before any external call.
        let photo_image = decode_rgba(&photo, "photo")?;
        let overlay_image = decode_rgba(&overlay, "ar overlay")?;

        // The removal service gets a normalized PNG regardless of the upload
        // format.
        let photo_png = encode_png(&photo_image)?;
        let removed = self
            .remover
            .remove_background(photo_png)
            .await
            .map_err(|source| ComposeError::Removal { source })?;
        let subject = decode_rgba(&removed, "background-removed subject")?;

        let background = self.load_background(target).await?;
        let scene = composite_scene(&subject, Some(&overlay_image), background.as_ref());
        Ok((encode_png(&scene)?, target))
    }

    /// Loads `bg_<target>.png` from the assets directory. A missing asset is
    /// the white-canvas case, not an error; an unreadable or corrupt one is.
    async fn load_background(&self, target: &str) -> ComposeResult<Option<RgbaImage>> {
        let path = self.assets_dir.join(format!("bg_{target}.png"));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no background asset, using white canvas");
                return Ok(None);
            }
            Err(error) => {
                return Err(ComposeError::Asset {
                    message: format!("{}: {error}", path.display()),
                })
            }
        };
        Ok(Some(decode_rgba(&bytes, "background asset")?))
    }
}

#[cfg(test)]
mod tests {
    use booth_providers::testing::{ScriptedEditor, ScriptedRemover};
    use image::{Rgba, RgbaImage};

    use super::*;

    fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(width, height, Rgba(rgba))).expect("encode")
    }

    /// Subject with one transparent pixel at (0, 0), so whatever sits under
    /// it shows through in the composite.
    fn subject_png() -> Vec<u8> {
        let mut subject = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        subject.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        encode_png(&subject).expect("encode")
    }

    fn flows_with(
        remover: Arc<dyn BackgroundRemover>,
        editor: Arc<dyn ImageEditor>,
        assets_dir: PathBuf,
    ) -> BoothFlows {
        BoothFlows::new(remover, editor, SelectionPolicy::from_seed(1), assets_dir)
    }

    #[tokio::test]
    async fn functional_remove_flow_layers_asset_background_under_subject() {
        let assets = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            assets.path().join("bg_cheb.png"),
            solid_png(4, 4, [200, 0, 0, 255]),
        )
        .expect("write asset");

        let remover = Arc::new(ScriptedRemover::succeed_with(subject_png()));
        let editor = Arc::new(ScriptedEditor::succeed_with(Vec::new()));
        let flows = flows_with(remover.clone(), editor, assets.path().to_path_buf());

        let png = flows
            .remove_and_composite(
                solid_png(4, 4, [9, 9, 9, 255]),
                solid_png(4, 4, [0, 0, 0, 0]),
                Some("cheb"),
            )
            .await
            .expect("composite");

        let scene = decode_rgba(&png, "scene").expect("decode");
        assert_eq!(scene.dimensions(), (4, 4));
        // Background shows through the subject's transparent pixel.
        assert_eq!(scene.get_pixel(0, 0), &Rgba([200, 0, 0, 255]));
        assert_eq!(scene.get_pixel(2, 2), &Rgba([0, 0, 255, 255]));
        assert_eq!(remover.call_count(), 1);
    }

    #[tokio::test]
    async fn functional_remove_flow_without_asset_falls_back_to_white_canvas() {
        let assets = tempfile::tempdir().expect("tempdir");
        let remover = Arc::new(ScriptedRemover::succeed_with(subject_png()));
        let editor = Arc::new(ScriptedEditor::succeed_with(Vec::new()));
        let flows = flows_with(remover, editor, assets.path().to_path_buf());

        let png = flows
            .remove_and_composite(
                solid_png(4, 4, [9, 9, 9, 255]),
                solid_png(4, 4, [0, 0, 0, 0]),
                Some("gena"),
            )
            .await
            .expect("composite");

        let scene = decode_rgba(&png, "scene").expect("decode");
        assert_eq!(scene.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn unit_undecodable_photo_fails_before_any_removal_call() {
        let assets = tempfile::tempdir().expect("tempdir");
        let remover = Arc::new(ScriptedRemover::succeed_with(subject_png()));
        let editor = Arc::new(ScriptedEditor::succeed_with(Vec::new()));
        let flows = flows_with(remover.clone(), editor, assets.path().to_path_buf());

        let error = flows
            .remove_and_composite(b"not an image".to_vec(), subject_png(), Some("cheb"))
            .await
            .expect_err("must fail");
        assert!(matches!(error, ComposeError::Decode { .. }));
        assert_eq!(remover.call_count(), 0);
    }

    #[tokio::test]
    async fn regression_removal_failure_surfaces_the_upstream_cause() {
        let assets = tempfile::tempdir().expect("tempdir");
        let editor = Arc::new(ScriptedEditor::succeed_with(Vec::new()));
        let flows = flows_with(
            Arc::new(ScriptedRemover::transport(502, "model crashed")),
            editor,
            assets.path().to_path_buf(),
        );

        let error = flows
            .remove_and_composite(subject_png(), subject_png(), Some("cheb"))
            .await
            .expect_err("must fail");
        assert!(matches!(error, ComposeError::Removal { .. }));
        assert!(error.to_string().contains("502"));
    }

    #[tokio::test]
    async fn functional_stylize_sends_persona_instruction_and_returns_bytes_as_is() {
        let assets = tempfile::tempdir().expect("tempdir");
        let remover = Arc::new(ScriptedRemover::succeed_with(subject_png()));
        let editor = Arc::new(ScriptedEditor::succeed_with(b"edited-bytes".to_vec()));
        let flows = flows_with(remover, editor.clone(), assets.path().to_path_buf());

        let edited = flows
            .stylize(
                solid_png(4, 4, [9, 9, 9, 255]),
                solid_png(4, 4, [0, 0, 0, 0]),
                Some("cheb"),
            )
            .await
            .expect("stylize");

        // The edited image is returned untouched, whatever its format.
        assert_eq!(edited, b"edited-bytes");
        let instructions = editor.received_instructions();
        assert_eq!(instructions.len(), 1);
        assert!(instructions[0].contains("Чебурашк"));
    }

    #[tokio::test]
    async fn functional_seeded_selection_pins_the_fallback_persona() {
        let pinned = SelectionPolicy::from_seed(9).pick();

        let assets = tempfile::tempdir().expect("tempdir");
        let remover = Arc::new(ScriptedRemover::succeed_with(subject_png()));
        let editor = Arc::new(ScriptedEditor::succeed_with(b"edited".to_vec()));
        let flows = BoothFlows::new(
            remover,
            editor.clone(),
            SelectionPolicy::from_seed(9),
            assets.path().to_path_buf(),
        );

        flows
            .stylize(subject_png(), solid_png(4, 4, [0, 0, 0, 0]), None)
            .await
            .expect("stylize");

        let instructions = editor.received_instructions();
        assert_eq!(instructions[0], profile_for(pinned).edit_instruction);
    }
}
