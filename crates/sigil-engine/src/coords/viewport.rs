/// Window size in pixels, fixed at window-open time.
///
/// Used to build the orthographic projection and to flip platform cursor
/// coordinates into the bottom-left drawing space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Flips a top-left-origin y coordinate into this viewport's bottom-left space.
    #[inline]
    pub fn flip_y(self, y: f32) -> f32 {
        self.height - y
    }
}
