//! Coordinate and transform types shared by the context and the backends.
//!
//! Canonical CPU space:
//! - Window pixels
//! - Origin bottom-left
//! - +X right, +Y up
//!
//! The orthographic projection built at window-open time maps this space to
//! clip space; backends never see any other convention.

mod mat4;
mod vec2;
mod viewport;

pub use mat4::Mat4;
pub use vec2::Vec2;
pub use viewport::Viewport;
