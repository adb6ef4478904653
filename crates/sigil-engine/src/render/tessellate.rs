//! CPU geometry for every primitive.
//!
//! All shapes are defined in a unit space centered on the origin and mapped
//! to window pixels by the model matrix.

use std::f32::consts::TAU;

use crate::coords::{Mat4, Vec2};
use crate::paint::Color;
use crate::text::PlacedGlyph;

use super::glyph_atlas::AtlasRegion;
use super::stream::Vertex;

const TRIANGLE: [Vec2; 3] = [
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.5, -0.5),
    Vec2::new(0.0, 0.5),
];

// Counter-clockwise from bottom-left.
const QUAD: [Vec2; 4] = [
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.5, -0.5),
    Vec2::new(0.5, 0.5),
    Vec2::new(-0.5, 0.5),
];

const QUAD_INDICES: [usize; 6] = [0, 1, 2, 0, 2, 3];

#[inline]
fn vertex(pos: Vec2, uv: [f32; 2], color: Color) -> Vertex {
    Vertex { pos: [pos.x, pos.y], uv, color: color.to_array() }
}

#[inline]
fn flat(model: &Mat4, p: Vec2, color: Color) -> Vertex {
    vertex(model.transform_point(p), [0.0, 0.0], color)
}

/// Appends line-list vertices for the closed polygon `points`.
fn outline(out: &mut Vec<Vertex>, model: &Mat4, color: Color, points: &[Vec2]) {
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        out.push(flat(model, a, color));
        out.push(flat(model, b, color));
    }
}

pub fn triangle_fill(out: &mut Vec<Vertex>, model: &Mat4, color: Color) {
    out.extend(TRIANGLE.iter().map(|&p| flat(model, p, color)));
}

pub fn triangle_outline(out: &mut Vec<Vertex>, model: &Mat4, color: Color) {
    outline(out, model, color, &TRIANGLE);
}

pub fn rectangle_fill(out: &mut Vec<Vertex>, model: &Mat4, color: Color) {
    out.extend(QUAD_INDICES.iter().map(|&i| flat(model, QUAD[i], color)));
}

pub fn rectangle_outline(out: &mut Vec<Vertex>, model: &Mat4, color: Color) {
    outline(out, model, color, &QUAD);
}

fn circle_points(radius: f32, vertices: i32) -> Vec<Vec2> {
    if vertices < 3 {
        return Vec::new();
    }
    let step = TAU / vertices as f32;
    (0..vertices)
        .map(|i| {
            let a = step * i as f32;
            Vec2::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

/// Fan around the center, emitted as a triangle list. Nothing for fewer than
/// three vertices.
pub fn circle_fill(out: &mut Vec<Vertex>, model: &Mat4, color: Color, radius: f32, vertices: i32) {
    let rim = circle_points(radius, vertices);
    for (i, &a) in rim.iter().enumerate() {
        let b = rim[(i + 1) % rim.len()];
        out.push(flat(model, Vec2::zero(), color));
        out.push(flat(model, a, color));
        out.push(flat(model, b, color));
    }
}

pub fn circle_outline(out: &mut Vec<Vertex>, model: &Mat4, color: Color, radius: f32, vertices: i32) {
    let rim = circle_points(radius, vertices);
    if !rim.is_empty() {
        outline(out, model, color, &rim);
    }
}

pub fn point(out: &mut Vec<Vertex>, model: &Mat4, color: Color) {
    out.push(vertex(model.translation_xy(), [0.0, 0.0], color));
}

pub fn line(out: &mut Vec<Vertex>, color: Color, from: Vec2, to: Vec2) {
    out.push(vertex(from, [0.0, 0.0], color));
    out.push(vertex(to, [0.0, 0.0], color));
}

/// Textured unit quad. Texture rows run top to bottom, so `v` grows downwards;
/// `uv = base * tiling + scroll`.
pub fn sprite(out: &mut Vec<Vertex>, model: &Mat4, color: Color, tiling: Vec2, scroll: Vec2) {
    out.extend(QUAD_INDICES.iter().map(|&i| {
        let p = QUAD[i];
        let u = (p.x + 0.5) * tiling.x + scroll.x;
        let v = (0.5 - p.y) * tiling.y + scroll.y;
        vertex(model.transform_point(p), [u, v], color)
    }));
}

/// One textured quad for a laid-out glyph. `glyph` is relative to the left
/// baseline, which the model matrix places.
pub fn glyph(out: &mut Vec<Vertex>, model: &Mat4, color: Color, glyph: &PlacedGlyph, region: &AtlasRegion) {
    let x0 = glyph.x;
    let y0 = glyph.y;
    let x1 = x0 + glyph.width as f32;
    let y1 = y0 + glyph.height as f32;

    let [u0, v0] = region.uv_min;
    let [u1, v1] = region.uv_max;

    // Bitmap row 0 is the top edge of the glyph.
    let corners = [
        (Vec2::new(x0, y0), [u0, v1]),
        (Vec2::new(x1, y0), [u1, v1]),
        (Vec2::new(x1, y1), [u1, v0]),
        (Vec2::new(x0, y1), [u0, v0]),
    ];

    out.extend(QUAD_INDICES.iter().map(|&i| {
        let (p, uv) = corners[i];
        vertex(model.transform_point(p), uv, color)
    }));
}
