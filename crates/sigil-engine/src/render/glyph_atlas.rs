use std::collections::HashMap;

pub const ATLAS_SIZE: u32 = 1024;
const GLYPH_PADDING: u32 = 1;

/// Cache key for one rasterized glyph.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GlyphKey {
    pub ch: char,
    /// `f32::to_bits` of the pixel size.
    pub size_bits: u32,
    /// Font generation from `FontSystem`; a new font invalidates older entries.
    pub font_generation: u64,
}

impl GlyphKey {
    pub fn new(ch: char, size: f32, font_generation: u64) -> Self {
        Self { ch, size_bits: size.to_bits(), font_generation }
    }
}

/// Normalized atlas coordinates; `uv_min` is the top-left texel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AtlasRegion {
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
}

/// CPU-side RGBA glyph atlas with shelf packing.
///
/// Coverage is stored in alpha over white RGB so glyphs sample like any other
/// texture and take their color from the vertex. The GPU copy is refreshed
/// from [`pixels`](Self::pixels) whenever [`take_dirty`](Self::take_dirty)
/// reports a change.
pub struct GlyphAtlas {
    size: u32,
    pixels: Vec<u8>,

    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
    dirty: bool,

    /// Font generation of the cached glyphs.
    generation: Option<u64>,
    cache: HashMap<GlyphKey, AtlasRegion>,
}

impl GlyphAtlas {
    pub fn new() -> Self {
        Self::with_size(ATLAS_SIZE)
    }

    pub fn with_size(size: u32) -> Self {
        let mut pixels = vec![0u8; (size * size * 4) as usize];
        for px in pixels.chunks_exact_mut(4) {
            px[..3].fill(255);
        }
        Self {
            size,
            pixels,
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
            dirty: true,
            generation: None,
            cache: HashMap::new(),
        }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns true once after every modification.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns the cached region for `key`, rasterizing through `raster` on a
    /// miss. `raster` yields `(width, height, coverage)` with one byte per
    /// pixel, rows top to bottom.
    ///
    /// A key from another font generation drops every cached glyph. When the
    /// atlas runs out of room it is cleared and packing starts over, so
    /// regions returned earlier in the same frame may then sample new glyphs.
    ///
    /// Returns `None` for empty bitmaps and for glyphs larger than the atlas.
    pub fn get_or_insert<F>(&mut self, key: GlyphKey, raster: F) -> Option<AtlasRegion>
    where
        F: FnOnce() -> (u32, u32, Vec<u8>),
    {
        if let Some(region) = self.cache.get(&key) {
            return Some(*region);
        }

        if self.generation != Some(key.font_generation) {
            if self.generation.is_some() {
                self.reset();
            }
            self.generation = Some(key.font_generation);
        }

        let (w, h, coverage) = raster();
        if w == 0 || h == 0 || coverage.len() < (w * h) as usize {
            return None;
        }

        if w + 2 * GLYPH_PADDING > self.size || h + 2 * GLYPH_PADDING > self.size {
            log::warn!("glyph {w}x{h} does not fit the {0}x{0} atlas", self.size);
            return None;
        }

        let region = match self.place(w, h, &coverage) {
            Some(region) => region,
            None => {
                log::debug!("glyph atlas full after {} glyphs; recycling", self.cache.len());
                self.reset();
                self.place(w, h, &coverage)?
            }
        };
        self.cache.insert(key, region);
        Some(region)
    }

    /// Drops every cached glyph and clears the coverage.
    pub fn reset(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[3] = 0;
        }
        self.cursor_x = GLYPH_PADDING;
        self.cursor_y = GLYPH_PADDING;
        self.row_height = 0;
        self.cache.clear();
        self.dirty = true;
    }

    fn place(&mut self, w: u32, h: u32, coverage: &[u8]) -> Option<AtlasRegion> {
        if self.cursor_x + w + GLYPH_PADDING > self.size {
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.cursor_x = GLYPH_PADDING;
            self.row_height = 0;
        }

        if self.cursor_x + w + GLYPH_PADDING > self.size || self.cursor_y + h + GLYPH_PADDING > self.size {
            return None;
        }

        let gx = self.cursor_x;
        let gy = self.cursor_y;

        for row in 0..h {
            for col in 0..w {
                let a = coverage[(row * w + col) as usize];
                let idx = (((gy + row) * self.size + gx + col) * 4 + 3) as usize;
                self.pixels[idx] = a;
            }
        }

        self.cursor_x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        self.dirty = true;

        let s = self.size as f32;
        Some(AtlasRegion {
            uv_min: [gx as f32 / s, gy as f32 / s],
            uv_max: [(gx + w) as f32 / s, (gy + h) as f32 / s],
        })
    }
}

impl Default for GlyphAtlas {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32) -> (u32, u32, Vec<u8>) {
        (w, h, vec![200; (w * h) as usize])
    }

    #[test]
    fn caches_by_key() {
        let mut atlas = GlyphAtlas::with_size(64);
        let key = GlyphKey::new('a', 16.0, 1);

        let first = atlas.get_or_insert(key, || solid(4, 4)).unwrap();
        let second = atlas
            .get_or_insert(key, || panic!("cached glyph rasterized twice"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(atlas.len(), 1);

        // The same glyph at another size is a separate entry.
        atlas.get_or_insert(GlyphKey::new('a', 20.0, 1), || solid(5, 5)).unwrap();
        assert_eq!(atlas.len(), 2);
    }

    #[test]
    fn new_font_generation_drops_older_glyphs() {
        let mut atlas = GlyphAtlas::with_size(16);
        for ch in 'a'..='d' {
            atlas.get_or_insert(GlyphKey::new(ch, 8.0, 1), || solid(6, 6)).unwrap();
        }
        atlas.take_dirty();

        let region = atlas
            .get_or_insert(GlyphKey::new('a', 8.0, 2), || solid(6, 6))
            .expect("a new font starts from an empty atlas");
        assert_eq!(atlas.len(), 1);
        assert_eq!(region.uv_min, [1.0 / 16.0, 1.0 / 16.0]);
        assert!(atlas.take_dirty());

        // Glyphs of the old font are rasterized again on their next use.
        let mut rasterized = false;
        atlas.get_or_insert(GlyphKey::new('b', 8.0, 1), || {
            rasterized = true;
            solid(6, 6)
        });
        assert!(rasterized);
    }

    #[test]
    fn writes_coverage_into_alpha() {
        let mut atlas = GlyphAtlas::with_size(16);
        atlas.take_dirty();
        atlas.get_or_insert(GlyphKey::new('x', 8.0, 0), || solid(2, 2)).unwrap();

        assert!(atlas.take_dirty());
        assert!(!atlas.take_dirty());
        // First glyph starts after the padding texel.
        let idx = ((GLYPH_PADDING * 16 + GLYPH_PADDING) * 4) as usize;
        assert_eq!(&atlas.pixels()[idx..idx + 4], &[255, 255, 255, 200]);
        assert_eq!(&atlas.pixels()[0..4], &[255, 255, 255, 0]);
    }

    #[test]
    fn wraps_rows_then_recycles_when_full() {
        let mut atlas = GlyphAtlas::with_size(16);
        let mut regions = Vec::new();
        for ch in 'a'..='d' {
            let r = atlas.get_or_insert(GlyphKey::new(ch, 8.0, 0), || solid(6, 6)).unwrap();
            assert!(r.uv_max[0] <= 1.0 && r.uv_max[1] <= 1.0);
            regions.push(r);
        }
        // Two 6px glyphs per row, two rows.
        assert_eq!(regions[2].uv_min, [1.0 / 16.0, 8.0 / 16.0]);
        assert_eq!(atlas.len(), 4);

        // The fifth glyph does not fit; the atlas starts over instead of
        // refusing every later glyph.
        let fifth = atlas
            .get_or_insert(GlyphKey::new('e', 8.0, 0), || solid(6, 6))
            .expect("a full atlas recycles");
        assert_eq!(fifth, regions[0]);
        assert_eq!(atlas.len(), 1);

        for ch in 'f'..='z' {
            assert!(atlas.get_or_insert(GlyphKey::new(ch, 8.0, 0), || solid(6, 6)).is_some());
        }
    }

    #[test]
    fn recycling_clears_old_coverage() {
        let mut atlas = GlyphAtlas::with_size(16);
        for ch in 'a'..='d' {
            atlas.get_or_insert(GlyphKey::new(ch, 8.0, 0), || solid(6, 6)).unwrap();
        }
        atlas.get_or_insert(GlyphKey::new('e', 8.0, 0), || solid(2, 2)).unwrap();

        // Texel (3, 3) belonged to 'a' and lies outside the new 2x2 glyph.
        let idx = ((3 * 16 + 3) * 4 + 3) as usize;
        assert_eq!(atlas.pixels()[idx], 0);
    }

    #[test]
    fn oversized_glyph_is_skipped() {
        let mut atlas = GlyphAtlas::with_size(16);
        atlas.get_or_insert(GlyphKey::new('a', 8.0, 0), || solid(4, 4)).unwrap();

        assert!(atlas.get_or_insert(GlyphKey::new('W', 64.0, 0), || solid(20, 20)).is_none());
        // The cached glyphs survive and smaller glyphs keep working.
        assert_eq!(atlas.len(), 1);
        assert!(atlas.get_or_insert(GlyphKey::new('b', 8.0, 0), || solid(4, 4)).is_some());
    }

    #[test]
    fn empty_bitmaps_are_skipped() {
        let mut atlas = GlyphAtlas::with_size(16);
        assert!(atlas.get_or_insert(GlyphKey::new(' ', 8.0, 0), || (0, 0, Vec::new())).is_none());
        assert!(atlas.is_empty());
    }
}
