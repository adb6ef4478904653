//! Text subsystem.
//!
//! Owns the current font and lays out single-line strings. Layout is pure CPU
//! work shared by every backend; rasterized glyphs are cached by the desktop
//! renderer.

mod font_system;

pub use font_system::{FontLoadError, FontSystem, PlacedGlyph, TextLayout};
