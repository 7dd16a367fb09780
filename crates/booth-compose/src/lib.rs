//! Photo booth compositing: background removal, scene layering, and the
//! generative stylize variant.
//!
//! The pure pixel math lives in [`scene`]; [`flows::BoothFlows`] wires it to
//! the external removal and image-edit services and to the character
//! registry's selection policy.

mod error;
mod flows;
mod scene;

pub use error::{ComposeError, ComposeResult};
pub use flows::BoothFlows;
pub use scene::{
    aspect_fill, composite_scene, decode_rgba, encode_png, fit_center, overlay_has_content,
};
