use crate::coords::Mat4;
use crate::error::{Result, SigilError};

/// Maximum number of matrices held by a [`TransformStack`], base included.
pub const TRANSFORM_STACK_CAPACITY: usize = 32;

/// Fixed-capacity stack of 4x4 transforms.
///
/// Invariants:
/// - there is always at least one matrix (the base, depth 0)
/// - depth never exceeds `TRANSFORM_STACK_CAPACITY - 1`
///
/// Storage is allocated once up front; `push`/`pop` never reallocate.
#[derive(Debug, Clone)]
pub struct TransformStack {
    matrices: Vec<Mat4>,
}

impl TransformStack {
    /// Creates a stack holding only the identity.
    pub fn new() -> Self {
        let mut matrices = Vec::with_capacity(TRANSFORM_STACK_CAPACITY);
        matrices.push(Mat4::IDENTITY);
        Self { matrices }
    }

    /// Drops every pushed matrix and resets the base to identity.
    pub fn reset(&mut self) {
        self.matrices.truncate(1);
        self.matrices[0] = Mat4::IDENTITY;
    }

    /// Number of `push` calls not yet matched by a `pop`.
    #[inline]
    pub fn depth(&self) -> usize {
        self.matrices.len() - 1
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        TRANSFORM_STACK_CAPACITY
    }

    /// The current transform.
    #[inline]
    pub fn top(&self) -> &Mat4 {
        // Non-empty by construction; `pop` never removes the base.
        &self.matrices[self.matrices.len() - 1]
    }

    #[inline]
    fn top_mut(&mut self) -> &mut Mat4 {
        let last = self.matrices.len() - 1;
        &mut self.matrices[last]
    }

    /// Duplicates the current top into a new slot.
    pub fn push(&mut self) -> Result<()> {
        if self.matrices.len() >= TRANSFORM_STACK_CAPACITY {
            return Err(SigilError::TransformStackOverflow {
                capacity: TRANSFORM_STACK_CAPACITY,
            });
        }
        let top = *self.top();
        self.matrices.push(top);
        Ok(())
    }

    /// Discards the current top, restoring the matrix saved by the matching `push`.
    pub fn pop(&mut self) -> Result<()> {
        if self.matrices.len() <= 1 {
            return Err(SigilError::TransformStackUnderflow);
        }
        self.matrices.pop();
        Ok(())
    }

    /// `top = top * translation(x, y)`.
    pub fn translate(&mut self, x: f32, y: f32) {
        let m = self.top().translate(x, y);
        *self.top_mut() = m;
    }

    /// `top = top * rotation(degrees)`.
    pub fn rotate(&mut self, degrees: f32) {
        let m = self.top().rotate(degrees);
        *self.top_mut() = m;
    }

    /// `top = top * scaling(x, y)`.
    pub fn scale(&mut self, x: f32, y: f32) {
        let m = self.top().scale(x, y);
        *self.top_mut() = m;
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}
