use std::fmt;

/// Error returned by [`FontSystem::load_font`].
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// One glyph positioned relative to the text origin (left baseline, +Y up).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    /// Left edge of the bitmap.
    pub x: f32,
    /// Bottom edge of the bitmap; negative for descenders.
    pub y: f32,
    pub width: u32,
    pub height: u32,
}

/// Result of laying out a single line of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    /// Glyphs with a visible bitmap, in string order.
    pub glyphs: Vec<PlacedGlyph>,
    /// Pen advance after the last character.
    pub width: f32,
    /// Distance between the lowest and highest bitmap edge.
    pub height: f32,
}

/// Holds the current font and size.
///
/// There is exactly one active font at a time, matching the immediate-mode
/// API: `set_font` replaces it, `set_font_size` rescales it.
pub struct FontSystem {
    font: Option<fontdue::Font>,
    size: f32,
    generation: u64,
}

impl FontSystem {
    pub fn new() -> Self {
        Self {
            font: None,
            size: 0.0,
            generation: 0,
        }
    }

    /// Parses a TrueType or OpenType font from raw bytes and makes it current.
    ///
    /// On failure the previous font stays active.
    pub fn load_font(&mut self, bytes: &[u8], size: f32) -> Result<(), FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        self.font = Some(font);
        self.size = size;
        self.generation += 1;
        Ok(())
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    #[inline]
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Incremented on every successful `load_font`; glyph caches key on it.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn font(&self) -> Option<&fontdue::Font> {
        self.font.as_ref()
    }

    /// Lays out `text` on a single line starting at the origin.
    ///
    /// Kerning is applied between adjacent characters. Returns an empty layout
    /// when no font is loaded or the size is not positive.
    pub fn layout(&self, text: &str) -> TextLayout {
        let Some(font) = self.font.as_ref() else {
            return TextLayout::default();
        };
        if self.size <= 0.0 {
            return TextLayout::default();
        }

        let mut glyphs = Vec::with_capacity(text.len());
        let mut pen = 0.0f32;
        let mut prev: Option<char> = None;
        let mut bottom = f32::MAX;
        let mut top = f32::MIN;

        for ch in text.chars() {
            if let Some(p) = prev {
                pen += font.horizontal_kern(p, ch, self.size).unwrap_or(0.0);
            }
            let m = font.metrics(ch, self.size);
            if m.width > 0 && m.height > 0 {
                let y = m.ymin as f32;
                bottom = bottom.min(y);
                top = top.max(y + m.height as f32);
                glyphs.push(PlacedGlyph {
                    ch,
                    x: pen + m.xmin as f32,
                    y,
                    width: m.width as u32,
                    height: m.height as u32,
                });
            }
            pen += m.advance_width;
            prev = Some(ch);
        }

        let height = if glyphs.is_empty() { 0.0 } else { top - bottom };
        TextLayout { glyphs, width: pen.max(0.0), height }
    }

    /// Advance width of `text`; 0 without a font.
    pub fn text_width(&self, text: &str) -> f32 {
        self.layout(text).width
    }

    /// Bitmap height of `text`; 0 without a font.
    pub fn text_height(&self, text: &str) -> f32 {
        self.layout(text).height
    }
}

impl fmt::Debug for FontSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSystem")
            .field("has_font", &self.font.is_some())
            .field("size", &self.size)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cantarell Regular (SIL Open Font License 1.1).
    const TEST_FONT: &[u8] = include_bytes!("../../testdata/Cantarell-Regular.ttf");

    fn loaded(size: f32) -> FontSystem {
        let mut fonts = FontSystem::new();
        fonts.load_font(TEST_FONT, size).unwrap();
        fonts
    }

    #[test]
    fn measures_zero_without_a_font() {
        let fonts = FontSystem::new();
        assert_eq!(fonts.text_width("hello"), 0.0);
        assert_eq!(fonts.text_height("hello"), 0.0);
        assert!(fonts.layout("hello").glyphs.is_empty());
    }

    #[test]
    fn rejects_garbage_and_keeps_state() {
        let mut fonts = FontSystem::new();
        let err = fonts.load_font(b"definitely not a font", 24.0).unwrap_err();
        assert!(err.to_string().starts_with("font load error"));
        assert!(!fonts.has_font());
        assert_eq!(fonts.generation(), 0);
    }

    #[test]
    fn size_is_tracked_without_a_font() {
        let mut fonts = FontSystem::new();
        fonts.set_size(18.0);
        assert_eq!(fonts.size(), 18.0);
    }

    #[test]
    fn loads_a_real_font() {
        let fonts = loaded(24.0);
        assert!(fonts.has_font());
        assert_eq!(fonts.size(), 24.0);
        assert_eq!(fonts.generation(), 1);
    }

    #[test]
    fn width_grows_with_text_and_size() {
        let mut fonts = loaded(24.0);
        let short = fonts.text_width("Hello");
        let long = fonts.text_width("Hello, world");
        assert!(short > 0.0);
        assert!(long > short);

        fonts.set_size(48.0);
        let doubled = fonts.text_width("Hello");
        assert!((doubled - 2.0 * short).abs() < 0.5, "{doubled} vs 2 x {short}");
    }

    #[test]
    fn height_spans_ascenders_and_descenders() {
        let fonts = loaded(32.0);
        assert_eq!(fonts.text_height(""), 0.0);

        let layout = fonts.layout("Ag");
        assert!(layout.height > 0.0);
        let chars: Vec<char> = layout.glyphs.iter().map(|g| g.ch).collect();
        assert_eq!(chars, ['A', 'g']);
        // The descender of 'g' dips below the baseline.
        assert!(layout.glyphs[1].y < 0.0);
        assert!(layout.height > fonts.text_height("A"));
    }

    #[test]
    fn blanks_advance_without_glyphs() {
        let fonts = loaded(24.0);
        let layout = fonts.layout("  ");
        assert!(layout.glyphs.is_empty());
        assert!(layout.width > 0.0);
        assert_eq!(layout.height, 0.0);
    }

    #[test]
    fn glyphs_are_placed_left_to_right() {
        let fonts = loaded(24.0);
        let layout = fonts.layout("abc");
        assert_eq!(layout.glyphs.len(), 3);
        assert!(layout.glyphs.windows(2).all(|w| w[0].x < w[1].x));
        assert!(layout.glyphs.iter().all(|g| g.x + g.width as f32 <= layout.width + 2.0));
    }

    #[test]
    fn reloading_bumps_the_generation() {
        let mut fonts = loaded(24.0);
        fonts.load_font(TEST_FONT, 12.0).unwrap();
        assert_eq!(fonts.generation(), 2);
        assert_eq!(fonts.size(), 12.0);
    }
}
