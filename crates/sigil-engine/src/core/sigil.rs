use std::path::Path;

use crate::audio::{AudioBackend, SoundId, VoiceId};
use crate::backend::{Backend, TextureId, WindowConfig};
use crate::batch::{DrawKind, FlushCoordinator};
use crate::coords::{Mat4, Vec2};
use crate::error::{ResourceKind, Result, SigilError};
use crate::input::{Key, MouseButton};
use crate::paint::{BlendMode, Color};
use crate::time::{FrameClock, FrameTime};
use crate::transform::TransformStack;

use super::TextAlign;

/// Registers read by every draw call.
#[derive(Debug, Clone)]
struct Registers {
    fore: Color,
    back: Color,
    blend: BlendMode,
    tiling: Vec2,
    scroll: Vec2,
    align: TextAlign,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            fore: Color::white(),
            back: Color::black(),
            blend: BlendMode::Alpha,
            tiling: Vec2::one(),
            scroll: Vec2::zero(),
            align: TextAlign::Left,
        }
    }
}

/// Immediate-mode drawing and sound context for a single window.
///
/// A `Sigil` owns everything that would otherwise be process-wide state: the
/// transform stack, the color and sprite registers, batch bookkeeping and the
/// frame clock. Platform work goes through `B` (window, GPU, text, textures)
/// and `A` (audio).
///
/// Typical frame:
///
/// ```no_run
/// use sigil_engine::{Sigil, WindowConfig};
/// use sigil_engine::audio::KiraAudio;
/// use sigil_engine::backend::Desktop;
///
/// # fn main() -> sigil_engine::Result<()> {
/// let mut sl = Sigil::new(Desktop::new(), KiraAudio::new());
/// sl.open(&WindowConfig::new("demo", 400, 300))?;
/// while !sl.should_close()? {
///     sl.set_fore_color(1.0, 0.5, 0.0, 1.0);
///     sl.rectangle_fill(200.0, 150.0, 100.0, 50.0);
///     sl.render()?;
/// }
/// sl.close()
/// # }
/// ```
///
/// Draw calls made while no window is open are ignored.
pub struct Sigil<B: Backend, A: AudioBackend> {
    backend: B,
    audio: A,
    open: bool,

    stack: TransformStack,
    batches: FlushCoordinator,
    clock: FrameClock,
    regs: Registers,
}

impl<B: Backend, A: AudioBackend> Sigil<B, A> {
    pub fn new(backend: B, audio: A) -> Self {
        Self {
            backend,
            audio,
            open: false,
            stack: TransformStack::new(),
            batches: FlushCoordinator::new(),
            clock: FrameClock::new(),
            regs: Registers::default(),
        }
    }

    /// Replaces the frame clock, e.g. one built with custom delta clamps.
    pub fn with_frame_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    // ---------------------------------------------------------------------
    // Window lifecycle
    // ---------------------------------------------------------------------

    /// Opens the window and resets the render state.
    ///
    /// The transform stack goes back to a single identity, the background to
    /// black, the foreground to opaque white and the blend mode to alpha.
    /// Sprite tiling, sprite scroll and text alignment keep their values.
    ///
    /// An audio device that fails to start is logged and skipped; drawing
    /// still works and sound playback reports backend errors.
    pub fn open(&mut self, config: &WindowConfig) -> Result<()> {
        if self.open {
            return Err(SigilError::WindowAlreadyOpen);
        }

        self.backend
            .open(config)
            .map_err(|e| SigilError::backend("open", e))?;

        let viewport = config.viewport();
        let projection = Mat4::ortho(0.0, viewport.width, 0.0, viewport.height);
        if let Err(e) = self.backend.init(viewport, projection) {
            self.backend.close();
            return Err(SigilError::backend("open", e));
        }
        self.open = true;

        self.stack.reset();
        self.batches.discard();
        self.clock.reset();

        self.regs.back = Color::black();
        self.regs.fore = Color::white();
        self.regs.blend = BlendMode::Alpha;
        self.backend.set_clear_color(self.regs.back);
        self.backend.set_blend_mode(self.regs.blend);

        if let Err(e) = self.audio.init() {
            log::warn!("audio unavailable, continuing without sound: {e:#}");
        }

        log::info!("opened window '{}' ({}x{})", config.title, config.width, config.height);
        Ok(())
    }

    /// Closes the window and the audio device. Queued primitives are dropped.
    pub fn close(&mut self) -> Result<()> {
        self.require_window("close")?;

        self.backend.shutdown();
        self.batches.discard();
        self.audio.shutdown();
        self.backend.close();
        self.open = false;

        log::info!("window closed");
        Ok(())
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// True once the user asked the window to close.
    pub fn should_close(&self) -> Result<bool> {
        self.require_window("should_close")?;
        Ok(self.backend.should_close())
    }

    /// Ends the frame.
    ///
    /// Flushes every batch, presents, polls input, clears the next frame to
    /// the background color and samples the clock.
    pub fn render(&mut self) -> Result<FrameTime> {
        self.require_window("render")?;

        let backend = &mut self.backend;
        self.batches.flush_all(|kind| backend.flush(kind));
        self.backend
            .poll_and_swap()
            .map_err(|e| SigilError::backend("render", e))?;

        Ok(self.clock.tick(self.backend.time()))
    }

    /// Seconds between the last two `render` calls, clamped to
    /// `[0.00001, 0.5]`. One 60 Hz frame before the first `render`.
    #[inline]
    pub fn delta_time(&self) -> f32 {
        self.clock.dt()
    }

    /// Number of `render` calls since the window opened.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.clock.frame_index()
    }

    // ---------------------------------------------------------------------
    // Transforms
    // ---------------------------------------------------------------------

    pub fn push(&mut self) -> Result<()> {
        self.stack.push()
    }

    pub fn pop(&mut self) -> Result<()> {
        self.stack.pop()
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.stack.translate(x, y);
    }

    /// Rotates counter-clockwise by `degrees`.
    pub fn rotate(&mut self, degrees: f32) {
        self.stack.rotate(degrees);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.stack.scale(x, y);
    }

    /// Current transform (top of the stack).
    #[inline]
    pub fn transform(&self) -> &Mat4 {
        self.stack.top()
    }

    #[inline]
    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    // ---------------------------------------------------------------------
    // Registers
    // ---------------------------------------------------------------------

    /// Sets the clear color used from the next frame on. Alpha is always 1.
    pub fn set_back_color(&mut self, r: f32, g: f32, b: f32) {
        self.regs.back = Color::rgb(r, g, b);
        if self.open {
            self.backend.set_clear_color(self.regs.back);
        }
    }

    pub fn set_fore_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.regs.fore = Color::new(r, g, b, a);
    }

    /// Switches between additive and alpha blending.
    pub fn set_additive_blend(&mut self, additive: bool) {
        self.set_blend_mode(BlendMode::from_additive(additive));
    }

    /// Queued points and lines are flushed first so they keep the mode they
    /// were drawn with.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.regs.blend = mode;
        if self.begin(DrawKind::BlendChange) {
            self.backend.set_blend_mode(mode);
        }
    }

    pub fn set_sprite_tiling(&mut self, x: f32, y: f32) {
        self.regs.tiling = Vec2::new(x, y);
    }

    pub fn set_sprite_scroll(&mut self, x: f32, y: f32) {
        self.regs.scroll = Vec2::new(x, y);
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.regs.align = align;
    }

    /// Integer form of [`set_text_align`](Self::set_text_align): 0 left,
    /// 1 center, 2 right. Anything else is rejected and the alignment is kept.
    pub fn set_text_align_index(&mut self, align: i32) -> Result<()> {
        self.regs.align = TextAlign::try_from(align)?;
        Ok(())
    }

    #[inline]
    pub fn fore_color(&self) -> Color {
        self.regs.fore
    }

    #[inline]
    pub fn back_color(&self) -> Color {
        self.regs.back
    }

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.regs.blend
    }

    #[inline]
    pub fn sprite_tiling(&self) -> Vec2 {
        self.regs.tiling
    }

    #[inline]
    pub fn sprite_scroll(&self) -> Vec2 {
        self.regs.scroll
    }

    #[inline]
    pub fn text_align(&self) -> TextAlign {
        self.regs.align
    }

    // ---------------------------------------------------------------------
    // Primitives
    // ---------------------------------------------------------------------
    //
    // Area shapes are centered on (x, y) and span width x height.

    pub fn triangle_fill(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if self.begin(DrawKind::Shape) {
            let model = self.area_model(x, y, width, height);
            self.backend.triangle_fill(&model, self.regs.fore);
        }
    }

    pub fn triangle_outline(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if self.begin(DrawKind::Shape) {
            let model = self.area_model(x, y, width, height);
            self.backend.triangle_outline(&model, self.regs.fore);
        }
    }

    pub fn rectangle_fill(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if self.begin(DrawKind::Shape) {
            let model = self.area_model(x, y, width, height);
            self.backend.rectangle_fill(&model, self.regs.fore);
        }
    }

    pub fn rectangle_outline(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if self.begin(DrawKind::Shape) {
            let model = self.area_model(x, y, width, height);
            self.backend.rectangle_outline(&model, self.regs.fore);
        }
    }

    /// `vertices` is the tessellation count; it is not validated.
    pub fn circle_fill(&mut self, x: f32, y: f32, radius: f32, vertices: i32) {
        if self.begin(DrawKind::Shape) {
            let model = self.stack.top().translate(x, y);
            self.backend.circle_fill(&model, self.regs.fore, radius, vertices);
        }
    }

    pub fn circle_outline(&mut self, x: f32, y: f32, radius: f32, vertices: i32) {
        if self.begin(DrawKind::Shape) {
            let model = self.stack.top().translate(x, y);
            self.backend.circle_outline(&model, self.regs.fore, radius, vertices);
        }
    }

    pub fn point(&mut self, x: f32, y: f32) {
        if self.begin(DrawKind::Point) {
            let model = self.stack.top().translate(x, y);
            self.backend.point(&model, self.regs.fore);
        }
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        if self.begin(DrawKind::Line) {
            let top = self.stack.top();
            let from = top.translate(x1, y1).translation_xy();
            let to = top.translate(x2, y2).translation_xy();
            self.backend.line(self.regs.fore, from, to);
        }
    }

    /// Draws `texture` over the rectangle centered on (x, y), using the
    /// current sprite tiling and scroll.
    pub fn sprite(&mut self, texture: TextureId, x: f32, y: f32, width: f32, height: f32) {
        if self.begin(DrawKind::Shape) {
            let model = self.area_model(x, y, width, height);
            self.backend
                .sprite(&model, self.regs.fore, texture, self.regs.tiling, self.regs.scroll);
        }
    }

    /// Draws `text` on the baseline at `y`, anchored at `x` according to the
    /// current alignment.
    pub fn text(&mut self, x: f32, y: f32, text: &str) {
        if self.begin(DrawKind::Text) {
            let mut model = self.stack.top().translate(x, y);
            if self.regs.align != TextAlign::Left {
                let width = self.backend.text_width(text);
                model = model.translate(self.regs.align.offset(width), 0.0);
            }
            self.backend.text(&model, self.regs.fore, text);
        }
    }

    // ---------------------------------------------------------------------
    // Resources
    // ---------------------------------------------------------------------

    /// Loads an image file as a sprite texture.
    ///
    /// A failed load leaves the context untouched.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureId> {
        let path = path.as_ref();
        self.require_window("load_texture")?;

        match self.backend.load_texture(path) {
            Ok(id) => {
                log::debug!("loaded texture {} as {:?}", path.display(), id);
                Ok(id)
            }
            Err(source) => Err(Self::load_failed(ResourceKind::Texture, path, source)),
        }
    }

    pub fn set_font(&mut self, path: impl AsRef<Path>, size: f32) -> Result<()> {
        let path = path.as_ref();
        self.require_window("set_font")?;

        self.backend
            .set_font(path, size)
            .map_err(|source| Self::load_failed(ResourceKind::Font, path, source))?;
        log::debug!("font set to {} at {size}px", path.display());
        Ok(())
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.backend.set_font_size(size);
    }

    /// Advance width of `text` with the current font, 0 without one.
    pub fn text_width(&self, text: &str) -> f32 {
        self.backend.text_width(text)
    }

    pub fn text_height(&self, text: &str) -> f32 {
        self.backend.text_height(text)
    }

    // ---------------------------------------------------------------------
    // Sound
    // ---------------------------------------------------------------------

    /// Loads a sound file. Requires an open window since the audio device
    /// lives as long as the window does.
    pub fn load_wav(&mut self, path: impl AsRef<Path>) -> Result<SoundId> {
        let path = path.as_ref();
        self.require_window("load_wav")?;

        match self.audio.load(path) {
            Ok(id) => {
                log::debug!("loaded sound {} as {:?}", path.display(), id);
                Ok(id)
            }
            Err(source) => Err(Self::load_failed(ResourceKind::Sound, path, source)),
        }
    }

    /// Plays `sound` once on a new voice.
    pub fn sound_play(&mut self, sound: SoundId) -> Result<VoiceId> {
        self.start_voice(sound, false, "sound_play")
    }

    /// Plays `sound` on a new voice that repeats until stopped.
    pub fn sound_loop(&mut self, sound: SoundId) -> Result<VoiceId> {
        self.start_voice(sound, true, "sound_loop")
    }

    pub fn sound_pause(&mut self, voice: VoiceId) -> Result<()> {
        Self::known_voice(voice, self.audio.pause(voice))
    }

    pub fn sound_resume(&mut self, voice: VoiceId) -> Result<()> {
        Self::known_voice(voice, self.audio.resume(voice))
    }

    pub fn sound_stop(&mut self, voice: VoiceId) -> Result<()> {
        Self::known_voice(voice, self.audio.stop(voice))
    }

    pub fn sound_playing(&self, voice: VoiceId) -> bool {
        self.audio.is_playing(voice)
    }

    pub fn sound_looping(&self, voice: VoiceId) -> bool {
        self.audio.is_looping(voice)
    }

    pub fn sound_pause_all(&mut self) {
        self.audio.pause_all();
    }

    pub fn sound_resume_all(&mut self) {
        self.audio.resume_all();
    }

    pub fn sound_stop_all(&mut self) {
        self.audio.stop_all();
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    pub fn key_down(&self, key: Key) -> bool {
        self.backend.key_down(key)
    }

    pub fn mouse_button_down(&self, button: MouseButton) -> bool {
        self.backend.mouse_button_down(button)
    }

    /// Cursor position in drawing space (origin bottom-left).
    pub fn mouse_position(&self) -> Vec2 {
        self.backend.mouse_position()
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn require_window(&self, operation: &'static str) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(SigilError::WindowNotOpen { operation })
        }
    }

    /// Flushes the batches `kind` could interleave with. Returns false when
    /// there is no window to draw into.
    fn begin(&mut self, kind: DrawKind) -> bool {
        if !self.open {
            return false;
        }
        let backend = &mut self.backend;
        self.batches.prepare(kind, |batch| backend.flush(batch));
        true
    }

    #[inline]
    fn area_model(&self, x: f32, y: f32, width: f32, height: f32) -> Mat4 {
        self.stack.top().translate(x, y).scale(width, height)
    }

    fn load_failed(kind: ResourceKind, path: &Path, source: anyhow::Error) -> SigilError {
        log::warn!("could not load {kind} {}: {source:#}", path.display());
        SigilError::Load { kind, path: path.to_path_buf(), source }
    }

    fn start_voice(&mut self, sound: SoundId, looping: bool, operation: &'static str) -> Result<VoiceId> {
        match self.audio.play(sound, looping) {
            Ok(Some(voice)) => Ok(voice),
            Ok(None) => Err(SigilError::UnknownSound(sound.0)),
            Err(e) => Err(SigilError::backend(operation, e)),
        }
    }

    fn known_voice(voice: VoiceId, known: bool) -> Result<()> {
        if known { Ok(()) } else { Err(SigilError::UnknownVoice(voice.0)) }
    }
}

impl<B: Backend, A: AudioBackend> Drop for Sigil<B, A> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::audio::MemoryAudio;
    use crate::backend::{Command, Headless};
    use crate::batch::BatchKind;
    use crate::coords::Viewport;
    use crate::input::{InputEvent, KeyState};
    use crate::time::IDEAL_FRAME_TIME;

    type TestSigil = Sigil<Headless, MemoryAudio>;

    fn opened() -> TestSigil {
        opened_with(Headless::new())
    }

    fn opened_with(backend: Headless) -> TestSigil {
        let mut sl = Sigil::new(backend, MemoryAudio::new());
        sl.open(&WindowConfig::new("test", 800, 600)).unwrap();
        sl.backend_mut().clear_commands();
        sl
    }

    fn commands(sl: &TestSigil) -> &[Command] {
        sl.backend().commands()
    }

    fn sound_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"RIFF....WAVE").unwrap();
        file
    }

    #[test]
    fn open_sets_projection_and_resets_registers() {
        let mut sl = Sigil::new(Headless::new(), MemoryAudio::new());
        sl.set_back_color(0.2, 0.3, 0.4);
        sl.set_fore_color(1.0, 0.0, 0.0, 0.5);
        sl.set_additive_blend(true);
        sl.set_sprite_tiling(2.0, 2.0);
        sl.translate(10.0, 10.0);

        sl.open(&WindowConfig::new("test", 800, 600)).unwrap();

        assert_eq!(
            commands(&sl),
            &[
                Command::Init {
                    viewport: Viewport::new(800.0, 600.0),
                    projection: Mat4::ortho(0.0, 800.0, 0.0, 600.0),
                },
                Command::SetClearColor(Color::black()),
                Command::SetBlendMode(BlendMode::Alpha),
            ]
        );
        assert_eq!(sl.fore_color(), Color::white());
        assert_eq!(*sl.transform(), Mat4::IDENTITY);
        assert_eq!(sl.sprite_tiling(), Vec2::new(2.0, 2.0));
        assert!(sl.audio().is_initialized());
    }

    #[test]
    fn open_twice_fails() {
        let mut sl = opened();
        let err = sl.open(&WindowConfig::default()).unwrap_err();
        assert!(matches!(err, SigilError::WindowAlreadyOpen));
        assert!(sl.is_open());
    }

    #[test]
    fn backend_open_failure_is_reported_and_recoverable() {
        let mut backend = Headless::new();
        backend.fail_next_open();
        let mut sl = Sigil::new(backend, MemoryAudio::new());

        let err = sl.open(&WindowConfig::default()).unwrap_err();
        assert!(matches!(err, SigilError::Backend { operation: "open", .. }));
        assert!(!sl.is_open());

        sl.open(&WindowConfig::default()).unwrap();
        assert!(sl.is_open());
    }

    #[test]
    fn window_operations_fail_before_open() {
        let mut sl = Sigil::new(Headless::new(), MemoryAudio::new());
        let op = |e: SigilError| match e {
            SigilError::WindowNotOpen { operation } => operation,
            other => panic!("unexpected error: {other}"),
        };

        assert_eq!(op(sl.load_texture("a.png").unwrap_err()), "load_texture");
        assert_eq!(op(sl.load_wav("a.wav").unwrap_err()), "load_wav");
        assert_eq!(op(sl.set_font("a.ttf", 12.0).unwrap_err()), "set_font");
        assert_eq!(op(sl.should_close().unwrap_err()), "should_close");
        assert_eq!(op(sl.render().unwrap_err()), "render");
        assert_eq!(op(sl.close().unwrap_err()), "close");
    }

    #[test]
    fn draws_without_window_are_ignored() {
        let mut sl = Sigil::new(Headless::new(), MemoryAudio::new());
        sl.rectangle_fill(0.0, 0.0, 10.0, 10.0);
        sl.point(1.0, 1.0);
        sl.text(0.0, 0.0, "hi");
        assert!(sl.backend().commands().is_empty());
        assert!(sl.backend().pending(BatchKind::Points).is_empty());
    }

    #[test]
    fn delta_time_is_one_frame_before_render() {
        let sl = Sigil::new(Headless::new(), MemoryAudio::new());
        assert_eq!(sl.delta_time(), IDEAL_FRAME_TIME as f32);
    }

    #[test]
    fn render_measures_and_clamps_delta() {
        let mut sl = opened();

        sl.backend_mut().set_time(0.1);
        let ft = sl.render().unwrap();
        assert!((ft.dt as f64 - (0.1 - IDEAL_FRAME_TIME)).abs() < 1e-6);
        assert_eq!(sl.delta_time(), ft.dt);

        // Same timestamp twice.
        sl.render().unwrap();
        assert_eq!(sl.delta_time(), 0.000_01);

        sl.backend_mut().advance(3.0);
        sl.render().unwrap();
        assert_eq!(sl.delta_time(), 0.5);
        assert_eq!(sl.frame_index(), 3);
        assert_eq!(sl.backend().frames(), 3);
    }

    #[test]
    fn render_flushes_every_batch_before_presenting() {
        let mut sl = opened();
        sl.text(0.0, 0.0, "a");
        sl.point(1.0, 1.0);
        sl.line(0.0, 0.0, 1.0, 1.0);
        sl.render().unwrap();

        let kinds: Vec<_> = commands(&sl).iter().map(|c| c.batch()).collect();
        assert_eq!(
            kinds,
            vec![Some(BatchKind::Text), Some(BatchKind::Points), Some(BatchKind::Lines), None]
        );
        assert_eq!(commands(&sl).last(), Some(&Command::Present));
        for kind in BatchKind::ALL {
            assert!(sl.backend().pending(kind).is_empty());
        }
    }

    #[test]
    fn shape_flushes_points_lines_and_text() {
        let mut sl = opened();
        sl.point(1.0, 1.0);
        sl.line(0.0, 0.0, 5.0, 5.0);
        sl.text(0.0, 0.0, "x");
        // Each batched call flushed the others; only text is still queued.
        assert_eq!(sl.backend().pending(BatchKind::Text).len(), 1);

        sl.rectangle_fill(0.0, 0.0, 1.0, 1.0);
        for kind in BatchKind::ALL {
            assert!(sl.backend().pending(kind).is_empty());
        }
        assert!(matches!(commands(&sl).last(), Some(Command::RectangleFill { .. })));
    }

    #[test]
    fn consecutive_points_accumulate() {
        let mut sl = opened();
        for i in 0..10 {
            sl.point(i as f32, 0.0);
        }
        assert!(commands(&sl).is_empty());
        assert_eq!(sl.backend().pending(BatchKind::Points).len(), 10);

        sl.line(0.0, 0.0, 1.0, 1.0);
        assert_eq!(commands(&sl).len(), 10);
        assert_eq!(sl.backend().pending(BatchKind::Lines).len(), 1);
    }

    #[test]
    fn blend_change_flushes_points_and_lines_but_not_text() {
        let mut sl = opened();
        sl.point(1.0, 1.0);
        sl.text(0.0, 0.0, "queued");
        sl.set_additive_blend(true);

        assert!(matches!(commands(&sl), [Command::Point { .. }, Command::SetBlendMode(BlendMode::Additive)]));
        assert_eq!(sl.backend().pending(BatchKind::Text).len(), 1);
        assert_eq!(sl.blend_mode(), BlendMode::Additive);
    }

    #[test]
    fn area_shapes_compose_translate_then_scale() {
        let mut sl = opened();
        sl.translate(10.0, 20.0);
        sl.rotate(30.0);
        sl.set_fore_color(0.1, 0.2, 0.3, 0.4);
        sl.triangle_outline(5.0, 6.0, 30.0, 40.0);

        let expected = Mat4::translation(10.0, 20.0)
            .rotate(30.0)
            .translate(5.0, 6.0)
            .scale(30.0, 40.0);
        assert_eq!(
            commands(&sl),
            &[Command::TriangleOutline { model: expected, color: Color::new(0.1, 0.2, 0.3, 0.4) }]
        );
    }

    #[test]
    fn circles_pass_radius_and_vertices_through() {
        let mut sl = opened();
        sl.circle_fill(50.0, 60.0, -3.0, 0);
        sl.circle_outline(1.0, 2.0, 10.0, 24);

        assert_eq!(
            commands(&sl),
            &[
                Command::CircleFill {
                    model: Mat4::translation(50.0, 60.0),
                    color: Color::white(),
                    radius: -3.0,
                    vertices: 0,
                },
                Command::CircleOutline {
                    model: Mat4::translation(1.0, 2.0),
                    color: Color::white(),
                    radius: 10.0,
                    vertices: 24,
                },
            ]
        );
    }

    #[test]
    fn line_endpoints_are_transformed_by_stack_top() {
        let mut sl = opened();
        sl.translate(100.0, 0.0);
        sl.rotate(90.0);
        sl.line(0.0, 0.0, 10.0, 0.0);
        sl.render().unwrap();

        let Some(Command::Line { from, to, .. }) = commands(&sl).first() else {
            panic!("expected a line, got {:?}", commands(&sl));
        };
        assert!((from.x - 100.0).abs() < 1e-4 && from.y.abs() < 1e-4);
        assert!((to.x - 100.0).abs() < 1e-4 && (to.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn sprite_uses_current_tiling_and_scroll() {
        let mut sl = opened();
        sl.set_sprite_tiling(2.0, 3.0);
        sl.set_sprite_scroll(0.5, 0.0);
        sl.sprite(TextureId(7), 100.0, 100.0, 64.0, 32.0);

        assert_eq!(
            commands(&sl),
            &[Command::Sprite {
                model: Mat4::translation(100.0, 100.0).scale(64.0, 32.0),
                color: Color::white(),
                texture: TextureId(7),
                tiling: Vec2::new(2.0, 3.0),
                scroll: Vec2::new(0.5, 0.0),
            }]
        );
    }

    #[test]
    fn text_alignment_shifts_by_measured_width() {
        // "abcd" measures 40px.
        let mut sl = opened_with(Headless::new().with_fixed_metrics(10.0, 12.0));

        for (align, x) in [(0, 50.0), (1, 30.0), (2, 10.0)] {
            sl.set_text_align_index(align).unwrap();
            sl.text(50.0, 70.0, "abcd");
            let Some(Command::Text { model, .. }) = sl.backend().pending(BatchKind::Text).last() else {
                panic!("text not queued");
            };
            assert!(model.approx_eq(&Mat4::translation(x, 70.0), 1e-5), "align {align}");
        }
    }

    #[test]
    fn invalid_text_align_keeps_previous_value() {
        let mut sl = opened();
        sl.set_text_align(TextAlign::Right);
        let err = sl.set_text_align_index(3).unwrap_err();
        assert!(matches!(err, SigilError::InvalidTextAlign(3)));
        assert_eq!(sl.text_align(), TextAlign::Right);
    }

    #[test]
    fn stack_limits_are_enforced_through_the_context() {
        let mut sl = opened();
        assert!(matches!(sl.pop(), Err(SigilError::TransformStackUnderflow)));
        for _ in 0..31 {
            sl.push().unwrap();
        }
        assert!(matches!(sl.push(), Err(SigilError::TransformStackOverflow { capacity: 32 })));
        assert_eq!(sl.stack_depth(), 31);
    }

    #[test]
    fn back_color_is_forwarded_opaque() {
        let mut sl = opened();
        sl.set_back_color(0.1, 0.2, 0.3);
        assert_eq!(commands(&sl), &[Command::SetClearColor(Color::new(0.1, 0.2, 0.3, 1.0))]);
        assert_eq!(sl.back_color().a, 1.0);
    }

    #[test]
    fn failed_texture_load_leaves_context_usable() {
        let dir = tempfile::tempdir().unwrap();
        let mut sl = opened();

        let missing = dir.path().join("missing.png");
        let err = sl.load_texture(&missing).unwrap_err();
        match err {
            SigilError::Load { kind, path, .. } => {
                assert_eq!(kind, ResourceKind::Texture);
                assert_eq!(path, missing);
            }
            other => panic!("unexpected error: {other}"),
        }

        let png = dir.path().join("sprite.png");
        image::RgbaImage::new(4, 2).save(&png).unwrap();
        let id = sl.load_texture(&png).unwrap();
        assert_eq!(sl.backend().texture_size(id), Some((4, 2)));

        sl.sprite(id, 0.0, 0.0, 4.0, 2.0);
        assert!(sl.render().is_ok());
    }

    #[test]
    fn missing_font_is_a_load_error() {
        let mut sl = opened();
        let err = sl.set_font("/nonexistent/font.ttf", 16.0).unwrap_err();
        assert!(matches!(err, SigilError::Load { kind: ResourceKind::Font, .. }));
    }

    const TEST_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/Cantarell-Regular.ttf");

    #[test]
    fn real_font_measures_and_rescales() {
        let mut sl = opened();
        assert_eq!(sl.text_width("Hello"), 0.0);

        sl.set_font(TEST_FONT, 20.0).unwrap();
        let small = sl.text_width("Hello");
        assert!(small > 0.0);
        assert!(sl.text_height("Hello") > 0.0);
        assert_eq!(sl.text_height(""), 0.0);

        sl.set_font_size(40.0);
        let large = sl.text_width("Hello");
        assert!(large > 1.5 * small, "{large} vs {small}");
    }

    #[test]
    fn centered_text_shifts_by_half_the_font_width() {
        let mut sl = opened();
        sl.set_font(TEST_FONT, 24.0).unwrap();
        let width = sl.text_width("Sigil");
        assert!(width > 0.0);

        for (align, x) in [(TextAlign::Center, 100.0 - width / 2.0), (TextAlign::Right, 100.0 - width)] {
            sl.set_text_align(align);
            sl.text(100.0, 40.0, "Sigil");
            let Some(Command::Text { model, .. }) = sl.backend().pending(BatchKind::Text).last() else {
                panic!("text not queued");
            };
            assert!(model.approx_eq(&Mat4::translation(x, 40.0), 1e-3), "{align:?}");
        }
    }

    #[test]
    fn sound_voices_follow_pause_resume_stop() {
        let file = sound_file();
        let mut sl = opened();
        let sound = sl.load_wav(file.path()).unwrap();

        let once = sl.sound_play(sound).unwrap();
        let looped = sl.sound_loop(sound).unwrap();
        assert!(sl.sound_playing(once));
        assert!(!sl.sound_looping(once));
        assert!(sl.sound_looping(looped));

        sl.sound_pause_all();
        assert!(!sl.sound_playing(once));
        assert!(!sl.sound_playing(looped));

        sl.sound_resume_all();
        assert!(sl.sound_playing(looped));

        sl.sound_stop(looped).unwrap();
        assert!(!sl.sound_looping(looped));

        sl.sound_pause(once).unwrap();
        assert!(!sl.sound_playing(once));
        sl.sound_resume(once).unwrap();
        assert!(sl.sound_playing(once));

        sl.sound_stop_all();
        assert!(!sl.sound_playing(once));
    }

    #[test]
    fn unknown_sound_handles_are_rejected() {
        let mut sl = opened();
        assert!(matches!(sl.sound_play(SoundId(3)), Err(SigilError::UnknownSound(3))));
        assert!(matches!(sl.sound_stop(VoiceId(99)), Err(SigilError::UnknownVoice(99))));

        let err = sl.load_wav("/nonexistent/sound.wav").unwrap_err();
        assert!(matches!(err, SigilError::Load { kind: ResourceKind::Sound, .. }));
    }

    #[test]
    fn close_releases_backend_and_audio() {
        let mut sl = opened();
        sl.point(0.0, 0.0);
        sl.close().unwrap();

        assert!(!sl.is_open());
        assert!(!sl.backend().is_open());
        assert!(!sl.audio().is_initialized());
        assert_eq!(commands(&sl), &[Command::Shutdown]);
        assert!(sl.backend().pending(BatchKind::Points).is_empty());

        sl.open(&WindowConfig::default()).unwrap();
        assert!(sl.is_open());
    }

    #[test]
    fn sounds_from_before_a_reopen_are_unknown() {
        let file = sound_file();
        let mut sl = opened();
        let stale = sl.load_wav(file.path()).unwrap();
        sl.close().unwrap();

        sl.open(&WindowConfig::default()).unwrap();
        assert!(matches!(sl.sound_play(stale), Err(SigilError::UnknownSound(_))));

        let fresh = sl.load_wav(file.path()).unwrap();
        assert_ne!(fresh, stale);
        assert!(sl.sound_play(fresh).is_ok());
    }

    #[test]
    fn input_queries_pass_through() {
        let mut sl = opened();
        sl.backend_mut().apply_input(InputEvent::Key { key: Key::Space, state: KeyState::Pressed });
        sl.backend_mut().apply_input(InputEvent::PointerMoved { x: 12.0, y: 34.0 });

        assert!(sl.key_down(Key::Space));
        assert!(!sl.key_down(Key::Escape));
        assert!(!sl.mouse_button_down(MouseButton::Left));
        assert_eq!(sl.mouse_position(), Vec2::new(12.0, 34.0));
    }

    #[test]
    fn should_close_follows_the_window() {
        let mut sl = opened();
        assert!(!sl.should_close().unwrap());
        sl.backend_mut().request_close();
        assert!(sl.should_close().unwrap());
    }
}
