//! Backend contracts.
//!
//! The context (`Sigil`) owns all render state and decides *what* to draw and
//! *when* batches flush. Backends decide *how*: they own the window, the GPU,
//! fonts, textures and the audio device.
//!
//! Two implementations ship with the crate:
//! - [`Desktop`]: winit window + wgpu renderer + fontdue text + image textures
//! - [`Headless`]: records every call; deterministic clock, input and text metrics
//!
//! Backend methods report failures as `anyhow::Result`; the context maps them
//! into [`SigilError`](crate::SigilError).

mod desktop;
mod headless;

pub use desktop::Desktop;
pub use headless::{Command, Headless};

use std::path::Path;

use anyhow::Result;

use crate::batch::BatchKind;
use crate::coords::{Mat4, Vec2, Viewport};
use crate::input::{Key, MouseButton};
use crate::paint::{BlendMode, Color};

/// Window creation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    /// Client-area width in pixels.
    pub width: u32,
    /// Client-area height in pixels.
    pub height: u32,
}

impl WindowConfig {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
        }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "sigil".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Opaque handle to a texture loaded by a [`ResourceBackend`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub u32);

/// Window lifecycle, input polling and the frame clock.
pub trait WindowBackend {
    /// Creates the window. Only called while no window is open.
    fn open(&mut self, config: &WindowConfig) -> Result<()>;

    /// Destroys the window. Only called while a window is open.
    fn close(&mut self);

    /// True once the user asked the window to close.
    fn should_close(&self) -> bool;

    fn key_down(&self, key: Key) -> bool;

    fn mouse_button_down(&self, button: MouseButton) -> bool;

    /// Cursor position in drawing space (origin bottom-left).
    fn mouse_position(&self) -> Vec2;

    /// Presents the back buffer, clears the new one and polls input events.
    fn poll_and_swap(&mut self) -> Result<()>;

    /// Monotonic time in seconds.
    fn time(&self) -> f64;
}

/// Per-primitive draw entry points.
///
/// Every call receives the fully composed model matrix and the foreground color.
/// Area primitives are unit shapes centered on the origin, scaled by the model
/// matrix; circles carry their own radius.
///
/// Points, lines and text may be queued until [`flush`](Self::flush) is called
/// for their kind. Everything else must be ordered after all previously flushed
/// work and before anything issued later.
pub trait RenderBackend {
    /// Sets up GPU resources for a freshly opened window.
    fn init(&mut self, viewport: Viewport, projection: Mat4) -> Result<()>;

    /// Releases GPU resources before the window closes.
    fn shutdown(&mut self);

    fn set_blend_mode(&mut self, mode: BlendMode);

    fn set_clear_color(&mut self, color: Color);

    fn triangle_fill(&mut self, model: &Mat4, color: Color);

    fn triangle_outline(&mut self, model: &Mat4, color: Color);

    fn rectangle_fill(&mut self, model: &Mat4, color: Color);

    fn rectangle_outline(&mut self, model: &Mat4, color: Color);

    fn circle_fill(&mut self, model: &Mat4, color: Color, radius: f32, vertices: i32);

    fn circle_outline(&mut self, model: &Mat4, color: Color, radius: f32, vertices: i32);

    /// Queues a point at the model matrix origin.
    fn point(&mut self, model: &Mat4, color: Color);

    /// Queues a line between two already transformed positions.
    fn line(&mut self, color: Color, from: Vec2, to: Vec2);

    fn sprite(&mut self, model: &Mat4, color: Color, texture: TextureId, tiling: Vec2, scroll: Vec2);

    /// Queues `text` with its left baseline at the model matrix origin.
    fn text(&mut self, model: &Mat4, color: Color, text: &str);

    /// Submits the queued primitives of `kind` and empties the queue.
    fn flush(&mut self, kind: BatchKind);
}

/// Textures and fonts.
pub trait ResourceBackend {
    fn load_texture(&mut self, path: &Path) -> Result<TextureId>;

    fn set_font(&mut self, path: &Path, size: f32) -> Result<()>;

    fn set_font_size(&mut self, size: f32);

    /// Advance width of `text` with the current font; 0 without a font.
    fn text_width(&self, text: &str) -> f32;

    /// Height of `text` with the current font; 0 without a font.
    fn text_height(&self, text: &str) -> f32;
}

/// Everything the context needs from a platform, in one bound.
pub trait Backend: WindowBackend + RenderBackend + ResourceBackend {}

impl<T> Backend for T where T: WindowBackend + RenderBackend + ResourceBackend {}
