use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::backend::TextureId;
use crate::paint::BlendMode;

/// Vertex in window pixels (origin bottom-left), already transformed by the
/// model matrix. The projection is applied in the vertex shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2, // uv
        2 => Float32x4  // color
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Primitive assembly for a run of vertices.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Triangles,
    Lines,
    Points,
}

impl Topology {
    pub const ALL: [Topology; 3] = [Topology::Triangles, Topology::Lines, Topology::Points];

    /// Vertices per primitive.
    pub fn arity(self) -> usize {
        match self {
            Topology::Triangles => 3,
            Topology::Lines => 2,
            Topology::Points => 1,
        }
    }

    pub(crate) fn wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
            Topology::Points => wgpu::PrimitiveTopology::PointList,
        }
    }
}

/// Texture sampled by a segment.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureSlot {
    /// 1x1 opaque white; flat colored geometry.
    White,
    /// The glyph atlas.
    Glyphs,
    Image(TextureId),
}

/// A run of vertices sharing pipeline state.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub topology: Topology,
    pub blend: BlendMode,
    pub texture: TextureSlot,
    pub range: Range<u32>,
}

/// Ordered geometry for one frame.
///
/// Appending keeps submission order; consecutive pushes with identical state
/// are merged into one segment so the renderer issues one draw per state run.
///
/// A frame holds at most [`max_vertices`](Self::max_vertices) vertices. Geometry
/// past that limit is dropped whole primitives at a time until the next
/// [`clear`](Self::clear).
#[derive(Debug)]
pub struct DrawStream {
    vertices: Vec<Vertex>,
    segments: Vec<Segment>,
    max_vertices: usize,
    overflowed: bool,
}

impl DrawStream {
    #[inline]
    pub fn new() -> Self {
        Self::with_max_vertices(u32::MAX as usize)
    }

    pub fn with_max_vertices(max_vertices: usize) -> Self {
        Self {
            vertices: Vec::new(),
            segments: Vec::new(),
            max_vertices: max_vertices.min(u32::MAX as usize),
            overflowed: false,
        }
    }

    #[inline]
    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    /// Lowers or raises the per-frame limit; never above `u32::MAX`.
    pub fn set_max_vertices(&mut self, max_vertices: usize) {
        self.max_vertices = max_vertices.min(u32::MAX as usize);
    }

    /// Clears recorded geometry. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.segments.clear();
        self.overflowed = false;
    }

    /// True if geometry was dropped since the last clear.
    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Appends `verts`. Returns false if some of them did not fit the frame.
    pub fn push(&mut self, topology: Topology, blend: BlendMode, texture: TextureSlot, verts: &[Vertex]) -> bool {
        let room = self.max_vertices.saturating_sub(self.vertices.len());
        let fits = verts.len() <= room;
        let verts = if !fits {
            let keep = room - room % topology.arity();
            if !self.overflowed {
                log::warn!(
                    "frame exceeds {} vertices; dropping the rest of its geometry",
                    self.max_vertices
                );
                self.overflowed = true;
            }
            &verts[..keep]
        } else {
            verts
        };
        self.append(topology, blend, texture, verts);
        fits
    }

    fn append(&mut self, topology: Topology, blend: BlendMode, texture: TextureSlot, verts: &[Vertex]) {
        if verts.is_empty() {
            return;
        }

        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(verts);
        let end = self.vertices.len() as u32;

        if let Some(last) = self.segments.last_mut() {
            if last.topology == topology
                && last.blend == blend
                && last.texture == texture
                && last.range.end == start
            {
                last.range.end = end;
                return;
            }
        }

        self.segments.push(Segment {
            topology,
            blend,
            texture,
            range: start..end,
        });
    }
}

impl Default for DrawStream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32) -> Vertex {
        Vertex { pos: [x, 0.0], uv: [0.0; 2], color: [1.0; 4] }
    }

    #[test]
    fn merges_runs_with_identical_state() {
        let mut s = DrawStream::new();
        s.push(Topology::Triangles, BlendMode::Alpha, TextureSlot::White, &[v(0.0), v(1.0), v(2.0)]);
        s.push(Topology::Triangles, BlendMode::Alpha, TextureSlot::White, &[v(3.0), v(4.0), v(5.0)]);

        assert_eq!(s.segments().len(), 1);
        assert_eq!(s.segments()[0].range, 0..6);
    }

    #[test]
    fn state_changes_split_segments_in_order() {
        let mut s = DrawStream::new();
        s.push(Topology::Lines, BlendMode::Alpha, TextureSlot::White, &[v(0.0), v(1.0)]);
        s.push(Topology::Lines, BlendMode::Additive, TextureSlot::White, &[v(2.0), v(3.0)]);
        s.push(Topology::Triangles, BlendMode::Additive, TextureSlot::Image(TextureId(0)), &[v(4.0), v(5.0), v(6.0)]);
        s.push(Topology::Points, BlendMode::Additive, TextureSlot::White, &[]);

        let ranges: Vec<_> = s.segments().iter().map(|seg| seg.range.clone()).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..7]);
        assert_eq!(s.segments()[1].blend, BlendMode::Additive);
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = DrawStream::new();
        s.push(Topology::Points, BlendMode::Alpha, TextureSlot::White, &[v(0.0)]);
        s.clear();
        assert!(s.is_empty());
        assert!(s.segments().is_empty());
    }

    #[test]
    fn drops_geometry_past_the_vertex_limit() {
        let mut s = DrawStream::with_max_vertices(8);
        assert!(s.push(Topology::Triangles, BlendMode::Alpha, TextureSlot::White, &[v(0.0); 6]));
        // Two slots left: not enough for another triangle.
        assert!(!s.push(Topology::Triangles, BlendMode::Alpha, TextureSlot::White, &[v(1.0); 3]));
        assert_eq!(s.vertices().len(), 6);
        assert!(s.overflowed());

        // Whole lines still fit in the remaining room.
        s.push(Topology::Lines, BlendMode::Alpha, TextureSlot::White, &[v(2.0); 6]);
        assert_eq!(s.vertices().len(), 8);
        assert_eq!(s.segments().last().map(|seg| seg.range.clone()), Some(6..8));

        s.push(Topology::Points, BlendMode::Alpha, TextureSlot::White, &[v(3.0)]);
        assert_eq!(s.vertices().len(), 8);
        assert!(s.segments().iter().all(|seg| seg.range.end as usize <= s.max_vertices()));
    }

    #[test]
    fn clear_lifts_the_overflow() {
        let mut s = DrawStream::with_max_vertices(3);
        s.push(Topology::Points, BlendMode::Alpha, TextureSlot::White, &[v(0.0); 5]);
        assert!(s.overflowed());

        s.clear();
        assert!(!s.overflowed());
        assert!(s.push(Topology::Points, BlendMode::Alpha, TextureSlot::White, &[v(0.0); 3]));
    }

    #[test]
    fn limit_never_exceeds_u32_indices() {
        let mut s = DrawStream::with_max_vertices(usize::MAX);
        assert_eq!(s.max_vertices(), u32::MAX as usize);
        s.set_max_vertices(16);
        assert_eq!(s.max_vertices(), 16);
    }
}
