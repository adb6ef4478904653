use std::fmt;

/// Primitive kinds the backend accumulates between flushes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BatchKind {
    Points,
    Lines,
    Text,
}

impl BatchKind {
    /// Flush order used at frame boundaries.
    pub const ALL: [BatchKind; 3] = [BatchKind::Points, BatchKind::Lines, BatchKind::Text];

    /// Position of this kind in per-kind arrays.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            BatchKind::Points => 0,
            BatchKind::Lines => 1,
            BatchKind::Text => 2,
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatchKind::Points => "points",
            BatchKind::Lines => "lines",
            BatchKind::Text => "text",
        })
    }
}

/// Operation about to be issued to the backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawKind {
    /// Triangles, rectangles, circles and sprites. Drawn immediately.
    Shape,
    Point,
    Line,
    Text,
    /// Blend mode change; affects how queued points and lines composite.
    BlendChange,
}

impl DrawKind {
    /// Batches that must be submitted before this operation.
    ///
    /// A batched kind never flushes itself: it joins its own queue.
    pub const fn flushes(self) -> &'static [BatchKind] {
        match self {
            DrawKind::Shape => &[BatchKind::Points, BatchKind::Lines, BatchKind::Text],
            DrawKind::Point => &[BatchKind::Lines, BatchKind::Text],
            DrawKind::Line => &[BatchKind::Points, BatchKind::Text],
            DrawKind::Text => &[BatchKind::Points, BatchKind::Lines],
            DrawKind::BlendChange => &[BatchKind::Points, BatchKind::Lines],
        }
    }

    /// The batch this operation joins, if it is batched.
    pub const fn batch(self) -> Option<BatchKind> {
        match self {
            DrawKind::Point => Some(BatchKind::Points),
            DrawKind::Line => Some(BatchKind::Lines),
            DrawKind::Text => Some(BatchKind::Text),
            DrawKind::Shape | DrawKind::BlendChange => None,
        }
    }
}

/// Tracks how many primitives of each kind were queued since the last flush
/// and decides which flushes an upcoming draw requires.
///
/// The coordinator does not own the queued data; the backend does. It only
/// mirrors the queue lengths so that flushes of empty batches are skipped
/// between frame boundaries.
#[derive(Debug, Default, Clone)]
pub struct FlushCoordinator {
    pending: [usize; 3],
    flushes: u64,
}

impl FlushCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primitives queued in `kind` since its last flush.
    #[inline]
    pub fn pending(&self, kind: BatchKind) -> usize {
        self.pending[kind.index()]
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(|&n| n > 0)
    }

    /// Total flushes issued through this coordinator.
    #[inline]
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// Flushes whatever `draw` could interleave with, then records the draw
    /// itself if it is batched.
    pub fn prepare<F>(&mut self, draw: DrawKind, mut flush: F)
    where
        F: FnMut(BatchKind),
    {
        for &kind in draw.flushes() {
            if self.pending(kind) > 0 {
                self.flush_one(kind, &mut flush);
            }
        }

        if let Some(kind) = draw.batch() {
            self.pending[kind.index()] += 1;
        }
    }

    /// Flushes every batch, empty or not. Used at frame boundaries.
    pub fn flush_all<F>(&mut self, mut flush: F)
    where
        F: FnMut(BatchKind),
    {
        for kind in BatchKind::ALL {
            self.flush_one(kind, &mut flush);
        }
    }

    /// Forgets queued counts without flushing; the backend discarded its queues.
    pub fn discard(&mut self) {
        self.pending = [0; 3];
    }

    fn flush_one<F>(&mut self, kind: BatchKind, flush: &mut F)
    where
        F: FnMut(BatchKind),
    {
        flush(kind);
        self.pending[kind.index()] = 0;
        self.flushes += 1;
    }
}
