//! GPU rendering for the desktop backend.
//!
//! Draw calls are tessellated on the CPU into a [`DrawStream`] in submission
//! order; once per frame the [`Renderer`] uploads it and replays it with one
//! draw per state run.
//!
//! Convention:
//! - CPU geometry is in window pixels (bottom-left origin, +Y up).
//! - The vertex shader applies the orthographic projection uniform.

mod ctx;
mod glyph_atlas;
mod renderer;
mod stream;
pub(crate) mod tessellate;

pub use ctx::{RenderCtx, RenderTarget};
pub use glyph_atlas::{GlyphAtlas, GlyphKey};
pub use renderer::Renderer;
pub use stream::{DrawStream, TextureSlot, Topology, Vertex};
