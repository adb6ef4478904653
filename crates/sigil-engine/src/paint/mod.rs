//! Paint state shared between the context registers and the renderers.
//!
//! Scope:
//! - color representation (straight alpha)
//! - blend mode selection
//!
//! Geometry types remain in `coords`.

pub mod blend;
pub mod color;

pub use blend::BlendMode;
pub use color::Color;
