use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::batch::BatchKind;
use crate::coords::{Mat4, Vec2, Viewport};
use crate::input::{InputEvent, InputState, Key, MouseButton};
use crate::paint::{BlendMode, Color};
use crate::text::FontSystem;

use super::{RenderBackend, ResourceBackend, TextureId, WindowBackend, WindowConfig};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init { viewport: Viewport, projection: Mat4 },
    Shutdown,
    SetBlendMode(BlendMode),
    SetClearColor(Color),
    TriangleFill { model: Mat4, color: Color },
    TriangleOutline { model: Mat4, color: Color },
    RectangleFill { model: Mat4, color: Color },
    RectangleOutline { model: Mat4, color: Color },
    CircleFill { model: Mat4, color: Color, radius: f32, vertices: i32 },
    CircleOutline { model: Mat4, color: Color, radius: f32, vertices: i32 },
    Point { model: Mat4, color: Color },
    Line { color: Color, from: Vec2, to: Vec2 },
    Sprite { model: Mat4, color: Color, texture: TextureId, tiling: Vec2, scroll: Vec2 },
    Text { model: Mat4, color: Color, text: String },
    /// A frame boundary (`poll_and_swap`).
    Present,
}

impl Command {
    /// The batch this command is queued in, if any.
    pub fn batch(&self) -> Option<BatchKind> {
        match self {
            Command::Point { .. } => Some(BatchKind::Points),
            Command::Line { .. } => Some(BatchKind::Lines),
            Command::Text { .. } => Some(BatchKind::Text),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Texture {
    path: PathBuf,
    width: u32,
    height: u32,
}

/// Backend that draws nothing and remembers everything.
///
/// Immediate commands go straight to [`commands`](Self::commands); points,
/// lines and text wait in a per-kind queue until flushed, exactly like the
/// GPU renderer. Time only moves when told to, and input is injected with
/// [`apply_input`](Self::apply_input).
#[derive(Debug, Default)]
pub struct Headless {
    open: Option<WindowConfig>,
    close_requested: bool,
    fail_open: bool,

    commands: Vec<Command>,
    pending: [Vec<Command>; 3],
    frames: u64,

    time: f64,
    input: InputState,

    textures: Vec<Texture>,
    fonts: FontSystem,
    fixed_metrics: Option<(f32, f32)>,
}

impl Headless {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measures text as if every character had the same advance and height
    /// when no font is loaded.
    pub fn with_fixed_metrics(mut self, advance: f32, height: f32) -> Self {
        self.fixed_metrics = Some((advance, height));
        self
    }

    /// Makes the next `open` fail, to exercise error paths.
    pub fn fail_next_open(&mut self) {
        self.fail_open = true;
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn window_config(&self) -> Option<&WindowConfig> {
        self.open.as_ref()
    }

    /// Every submitted command, in submission order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Queued, not yet flushed commands of `kind`.
    pub fn pending(&self, kind: BatchKind) -> &[Command] {
        &self.pending[kind.index()]
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of `poll_and_swap` calls since the backend was created.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn set_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    pub fn advance(&mut self, seconds: f64) {
        self.time += seconds;
    }

    pub fn apply_input(&mut self, event: InputEvent) {
        self.input.apply_event(event);
    }

    /// Simulates the user clicking the close button.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn texture_path(&self, id: TextureId) -> Option<&Path> {
        self.textures.get(id.0 as usize).map(|t| t.path.as_path())
    }

    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.get(id.0 as usize).map(|t| (t.width, t.height))
    }

    pub fn font_size(&self) -> f32 {
        self.fonts.size()
    }

    fn queue(&mut self, cmd: Command) {
        match cmd.batch() {
            Some(kind) => self.pending[kind.index()].push(cmd),
            None => self.commands.push(cmd),
        }
    }
}

impl WindowBackend for Headless {
    fn open(&mut self, config: &WindowConfig) -> Result<()> {
        if std::mem::take(&mut self.fail_open) {
            bail!("headless window creation failed on request");
        }
        if !config.viewport().is_valid() {
            bail!("invalid window size {}x{}", config.width, config.height);
        }
        self.open = Some(config.clone());
        self.close_requested = false;
        Ok(())
    }

    fn close(&mut self) {
        self.open = None;
        self.input.clear();
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn key_down(&self, key: Key) -> bool {
        self.input.key_down(key)
    }

    fn mouse_button_down(&self, button: MouseButton) -> bool {
        self.input.button_down(button)
    }

    fn mouse_position(&self) -> Vec2 {
        self.input.pointer_pos
    }

    fn poll_and_swap(&mut self) -> Result<()> {
        self.commands.push(Command::Present);
        self.frames += 1;
        Ok(())
    }

    fn time(&self) -> f64 {
        self.time
    }
}

impl RenderBackend for Headless {
    fn init(&mut self, viewport: Viewport, projection: Mat4) -> Result<()> {
        self.queue(Command::Init { viewport, projection });
        Ok(())
    }

    fn shutdown(&mut self) {
        for queue in &mut self.pending {
            queue.clear();
        }
        self.queue(Command::Shutdown);
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.queue(Command::SetBlendMode(mode));
    }

    fn set_clear_color(&mut self, color: Color) {
        self.queue(Command::SetClearColor(color));
    }

    fn triangle_fill(&mut self, model: &Mat4, color: Color) {
        self.queue(Command::TriangleFill { model: *model, color });
    }

    fn triangle_outline(&mut self, model: &Mat4, color: Color) {
        self.queue(Command::TriangleOutline { model: *model, color });
    }

    fn rectangle_fill(&mut self, model: &Mat4, color: Color) {
        self.queue(Command::RectangleFill { model: *model, color });
    }

    fn rectangle_outline(&mut self, model: &Mat4, color: Color) {
        self.queue(Command::RectangleOutline { model: *model, color });
    }

    fn circle_fill(&mut self, model: &Mat4, color: Color, radius: f32, vertices: i32) {
        self.queue(Command::CircleFill { model: *model, color, radius, vertices });
    }

    fn circle_outline(&mut self, model: &Mat4, color: Color, radius: f32, vertices: i32) {
        self.queue(Command::CircleOutline { model: *model, color, radius, vertices });
    }

    fn point(&mut self, model: &Mat4, color: Color) {
        self.queue(Command::Point { model: *model, color });
    }

    fn line(&mut self, color: Color, from: Vec2, to: Vec2) {
        self.queue(Command::Line { color, from, to });
    }

    fn sprite(&mut self, model: &Mat4, color: Color, texture: TextureId, tiling: Vec2, scroll: Vec2) {
        self.queue(Command::Sprite { model: *model, color, texture, tiling, scroll });
    }

    fn text(&mut self, model: &Mat4, color: Color, text: &str) {
        self.queue(Command::Text { model: *model, color, text: text.to_owned() });
    }

    fn flush(&mut self, kind: BatchKind) {
        let queued = std::mem::take(&mut self.pending[kind.index()]);
        self.commands.extend(queued);
    }
}

impl ResourceBackend for Headless {
    fn load_texture(&mut self, path: &Path) -> Result<TextureId> {
        let (width, height) = image::image_dimensions(path)
            .with_context(|| format!("failed to read image header: {}", path.display()))?;
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(Texture { path: path.to_path_buf(), width, height });
        Ok(id)
    }

    fn set_font(&mut self, path: &Path, size: f32) -> Result<()> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font: {}", path.display()))?;
        self.fonts.load_font(&bytes, size)?;
        Ok(())
    }

    fn set_font_size(&mut self, size: f32) {
        self.fonts.set_size(size);
    }

    fn text_width(&self, text: &str) -> f32 {
        match self.fixed_metrics {
            Some((advance, _)) if !self.fonts.has_font() => advance * text.chars().count() as f32,
            _ => self.fonts.text_width(text),
        }
    }

    fn text_height(&self, text: &str) -> f32 {
        match self.fixed_metrics {
            Some((_, height)) if !self.fonts.has_font() => {
                if text.is_empty() { 0.0 } else { height }
            }
            _ => self.fonts.text_height(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batched_commands_wait_for_flush() {
        let mut b = Headless::new();
        b.point(&Mat4::IDENTITY, Color::white());
        b.line(Color::white(), Vec2::zero(), Vec2::one());
        b.rectangle_fill(&Mat4::IDENTITY, Color::black());

        assert_eq!(b.commands().len(), 1);
        assert_eq!(b.pending(BatchKind::Points).len(), 1);
        assert_eq!(b.pending(BatchKind::Lines).len(), 1);

        b.flush(BatchKind::Lines);
        assert!(b.pending(BatchKind::Lines).is_empty());
        assert!(matches!(b.commands()[1], Command::Line { .. }));
    }

    #[test]
    fn open_validates_size_and_honours_injected_failure() {
        let mut b = Headless::new();
        assert!(b.open(&WindowConfig::new("zero", 0, 10)).is_err());

        b.fail_next_open();
        assert!(b.open(&WindowConfig::default()).is_err());
        assert!(b.open(&WindowConfig::default()).is_ok());
        assert!(b.is_open());
    }

    #[test]
    fn fixed_metrics_apply_only_without_a_font() {
        let b = Headless::new().with_fixed_metrics(8.0, 12.0);
        assert_eq!(b.text_width("abcd"), 32.0);
        assert_eq!(b.text_height("abcd"), 12.0);
        assert_eq!(b.text_height(""), 0.0);

        let plain = Headless::new();
        assert_eq!(plain.text_width("abcd"), 0.0);
    }

    #[test]
    fn loads_real_png_and_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("tile.png");
        image::RgbaImage::new(4, 2).save(&good).unwrap();
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"nope").unwrap();

        let mut b = Headless::new();
        let id = b.load_texture(&good).unwrap();
        assert_eq!(b.texture_size(id), Some((4, 2)));
        assert!(b.load_texture(&bad).is_err());
    }
}
