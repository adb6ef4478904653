use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::batch::BatchKind;
use crate::coords::{Mat4, Vec2, Viewport};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::input::platform::translate_window_event;
use crate::input::{InputState, Key, MouseButton};
use crate::paint::{BlendMode, Color};
use crate::render::{
    DrawStream, GlyphAtlas, GlyphKey, RenderCtx, RenderTarget, Renderer, TextureSlot, Topology,
    Vertex, tessellate,
};
use crate::text::FontSystem;

use super::{RenderBackend, ResourceBackend, TextureId, WindowBackend, WindowConfig};

/// Event loop iterations `open` waits for the platform to hand out a window.
const OPEN_PUMP_LIMIT: usize = 100;
const OPEN_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// winit-facing half of the backend. Kept apart from the event loop so
/// `pump_app_events` can borrow both at once.
struct WindowState {
    gpu_init: GpuInit,
    pending: Option<WindowConfig>,
    open_error: Option<anyhow::Error>,

    entry: Option<WindowEntry>,
    viewport: Viewport,
    input: InputState,
    close_requested: bool,
}

impl WindowState {
    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.pending.take() else { return };

        match create_window_entry(event_loop, &config, self.gpu_init.clone()) {
            Ok(entry) => {
                self.viewport = config.viewport();
                self.entry = Some(entry);
            }
            Err(e) => self.open_error = Some(e),
        }
    }
}

fn create_window_entry(
    event_loop: &ActiveEventLoop,
    config: &WindowConfig,
    gpu_init: GpuInit,
) -> Result<WindowEntry> {
    let attrs = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(config.width as f64, config.height as f64))
        .with_resizable(false);

    let window = event_loop
        .create_window(attrs)
        .context("failed to create window")?;

    WindowEntryTryBuilder {
        window,
        gpu_builder: |w| {
            pollster::block_on(Gpu::new(w, gpu_init)).context("GPU initialization failed for window")
        },
    }
    .try_build()
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // `resumed` only fires once; later windows are created here.
        self.create_pending(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(entry) = self.entry.as_mut() else { return };

        match &event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
                return;
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(size));
                return;
            }
            _ => {}
        }

        let viewport = self.viewport;
        if let Some(ev) = entry.with_window(|w| translate_window_event(w, viewport, &event)) {
            self.input.apply_event(ev);
        }
    }
}

/// winit window, wgpu renderer, fontdue text and `image` textures.
///
/// The event loop is created on the first `open` and kept for the life of
/// the backend, since winit allows only one per process. Events are pumped
/// without blocking once per `poll_and_swap`.
pub struct Desktop {
    event_loop: Option<EventLoop<()>>,
    state: WindowState,
    start: Instant,

    renderer: Option<Renderer>,
    stream: DrawStream,
    pending: [Vec<Vertex>; 3],
    scratch: Vec<Vertex>,

    blend: BlendMode,
    clear_color: Color,
    // Color the frame being drawn was cleared to.
    frame_clear: Color,

    fonts: FontSystem,
    atlas: GlyphAtlas,
}

impl Desktop {
    pub fn new() -> Self {
        Self::with_gpu_init(GpuInit::default())
    }

    pub fn with_gpu_init(gpu_init: GpuInit) -> Self {
        Self {
            event_loop: None,
            state: WindowState {
                gpu_init,
                pending: None,
                open_error: None,
                entry: None,
                viewport: Viewport::default(),
                input: InputState::default(),
                close_requested: false,
            },
            start: Instant::now(),
            renderer: None,
            stream: DrawStream::new(),
            pending: Default::default(),
            scratch: Vec::new(),
            blend: BlendMode::Alpha,
            clear_color: Color::black(),
            frame_clear: Color::black(),
            fonts: FontSystem::new(),
            atlas: GlyphAtlas::new(),
        }
    }

    fn pump(&mut self, timeout: Duration) -> Result<()> {
        let event_loop = self.event_loop.as_mut().context("event loop is not running")?;
        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(timeout), &mut self.state) {
            log::debug!("event loop exited with code {code}");
            self.state.close_requested = true;
        }
        Ok(())
    }

    /// Tessellates immediately into the frame stream.
    fn emit<F>(&mut self, topology: Topology, texture: TextureSlot, build: F)
    where
        F: FnOnce(&mut Vec<Vertex>),
    {
        self.scratch.clear();
        build(&mut self.scratch);
        self.stream.push(topology, self.blend, texture, &self.scratch);
    }

    fn present(&mut self) -> Result<()> {
        let entry = self.state.entry.as_mut().context("no window is open")?;
        let renderer = self.renderer.as_mut().context("renderer is not initialized")?;
        let atlas = &mut self.atlas;
        let stream = &self.stream;
        let clear = self.frame_clear;
        let viewport = self.state.viewport;

        entry.with_mut(|fields| {
            let gpu = fields.gpu;
            let mut frame = match gpu.begin_frame() {
                Ok(f) => f,
                Err(err) => {
                    return match gpu.handle_surface_error(err) {
                        SurfaceErrorAction::Fatal => Err(anyhow!("surface ran out of memory")),
                        action => {
                            log::debug!("dropping frame after surface error ({action:?})");
                            Ok(())
                        }
                    };
                }
            };

            let ctx = RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format(), viewport);
            renderer.sync_glyphs(&ctx, atlas);
            {
                let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
                renderer.render(&ctx, &mut target, stream, clear);
            }

            fields.window.pre_present_notify();
            gpu.submit(frame);
            Ok(())
        })
    }
}

impl Default for Desktop {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowBackend for Desktop {
    fn open(&mut self, config: &WindowConfig) -> Result<()> {
        if self.event_loop.is_none() {
            let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
            event_loop.set_control_flow(ControlFlow::Poll);
            self.event_loop = Some(event_loop);
        }

        self.state.pending = Some(config.clone());
        self.state.open_error = None;
        self.state.close_requested = false;

        for _ in 0..OPEN_PUMP_LIMIT {
            self.pump(OPEN_PUMP_TIMEOUT)?;
            if let Some(err) = self.state.open_error.take() {
                return Err(err);
            }
            if self.state.entry.is_some() {
                self.start = Instant::now();
                return Ok(());
            }
        }

        self.state.pending = None;
        bail!("platform did not create a window after {OPEN_PUMP_LIMIT} event loop iterations")
    }

    fn close(&mut self) {
        self.renderer = None;
        self.state.entry = None;
        self.state.input.clear();
        self.state.close_requested = false;
    }

    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn key_down(&self, key: Key) -> bool {
        self.state.input.key_down(key)
    }

    fn mouse_button_down(&self, button: MouseButton) -> bool {
        self.state.input.button_down(button)
    }

    fn mouse_position(&self) -> Vec2 {
        self.state.input.pointer_pos
    }

    fn poll_and_swap(&mut self) -> Result<()> {
        let presented = self.present();
        self.stream.clear();
        self.frame_clear = self.clear_color;
        presented?;
        self.pump(Duration::ZERO)
    }

    fn time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl RenderBackend for Desktop {
    fn init(&mut self, viewport: Viewport, projection: Mat4) -> Result<()> {
        let entry = self.state.entry.as_ref().context("no window is open")?;
        let atlas = &self.atlas;
        let renderer = entry.with_gpu(|gpu| {
            let ctx = RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format(), viewport);
            Renderer::new(&ctx, &projection, atlas)
        });

        self.stream.clear();
        self.stream.set_max_vertices(renderer.max_vertices());
        self.renderer = Some(renderer);
        self.blend = BlendMode::Alpha;
        self.clear_color = Color::black();
        self.frame_clear = Color::black();
        log::debug!("renderer initialized for {}x{} viewport", viewport.width, viewport.height);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.renderer = None;
        self.stream.clear();
        for queue in &mut self.pending {
            queue.clear();
        }
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn triangle_fill(&mut self, model: &Mat4, color: Color) {
        self.emit(Topology::Triangles, TextureSlot::White, |out| {
            tessellate::triangle_fill(out, model, color)
        });
    }

    fn triangle_outline(&mut self, model: &Mat4, color: Color) {
        self.emit(Topology::Lines, TextureSlot::White, |out| {
            tessellate::triangle_outline(out, model, color)
        });
    }

    fn rectangle_fill(&mut self, model: &Mat4, color: Color) {
        self.emit(Topology::Triangles, TextureSlot::White, |out| {
            tessellate::rectangle_fill(out, model, color)
        });
    }

    fn rectangle_outline(&mut self, model: &Mat4, color: Color) {
        self.emit(Topology::Lines, TextureSlot::White, |out| {
            tessellate::rectangle_outline(out, model, color)
        });
    }

    fn circle_fill(&mut self, model: &Mat4, color: Color, radius: f32, vertices: i32) {
        self.emit(Topology::Triangles, TextureSlot::White, |out| {
            tessellate::circle_fill(out, model, color, radius, vertices)
        });
    }

    fn circle_outline(&mut self, model: &Mat4, color: Color, radius: f32, vertices: i32) {
        self.emit(Topology::Lines, TextureSlot::White, |out| {
            tessellate::circle_outline(out, model, color, radius, vertices)
        });
    }

    fn point(&mut self, model: &Mat4, color: Color) {
        tessellate::point(&mut self.pending[BatchKind::Points.index()], model, color);
    }

    fn line(&mut self, color: Color, from: Vec2, to: Vec2) {
        tessellate::line(&mut self.pending[BatchKind::Lines.index()], color, from, to);
    }

    fn sprite(&mut self, model: &Mat4, color: Color, texture: TextureId, tiling: Vec2, scroll: Vec2) {
        self.emit(Topology::Triangles, TextureSlot::Image(texture), |out| {
            tessellate::sprite(out, model, color, tiling, scroll)
        });
    }

    fn text(&mut self, model: &Mat4, color: Color, text: &str) {
        let Some(font) = self.fonts.font() else { return };
        let size = self.fonts.size();
        let generation = self.fonts.generation();
        let out = &mut self.pending[BatchKind::Text.index()];

        for glyph in &self.fonts.layout(text).glyphs {
            let key = GlyphKey::new(glyph.ch, size, generation);
            let region = self.atlas.get_or_insert(key, || {
                let (metrics, bitmap) = font.rasterize(glyph.ch, size);
                (metrics.width as u32, metrics.height as u32, bitmap)
            });
            if let Some(region) = region {
                tessellate::glyph(out, model, color, glyph, &region);
            }
        }
    }

    fn flush(&mut self, kind: BatchKind) {
        let (topology, texture) = match kind {
            BatchKind::Points => (Topology::Points, TextureSlot::White),
            BatchKind::Lines => (Topology::Lines, TextureSlot::White),
            BatchKind::Text => (Topology::Triangles, TextureSlot::Glyphs),
        };
        let queue = &mut self.pending[kind.index()];
        self.stream.push(topology, self.blend, texture, &queue[..]);
        queue.clear();
    }
}

impl ResourceBackend for Desktop {
    fn load_texture(&mut self, path: &Path) -> Result<TextureId> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode image: {}", path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        anyhow::ensure!(width > 0 && height > 0, "image has zero size: {}", path.display());

        let entry = self.state.entry.as_ref().context("no window is open")?;
        let renderer = self.renderer.as_mut().context("renderer is not initialized")?;
        let viewport = self.state.viewport;

        let id = entry.with_gpu(|gpu| {
            let ctx = RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format(), viewport);
            renderer.upload_image(&ctx, width, height, image.as_raw())
        });
        log::trace!("uploaded {width}x{height} texture {}", id.0);
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
        self.fonts.text_width(text)
    }

    fn text_height(&self, text: &str) -> f32 {
        self.fonts.text_height(text)
    }
}
