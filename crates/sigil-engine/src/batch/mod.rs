//! Batch flush coordination.
//!
//! Points, lines and text are queued by the backend and submitted in bulk. To
//! keep the visual result identical to issuing every call immediately, any
//! queued batch that a new draw could overlap is flushed first.

mod coordinator;

pub use coordinator::{BatchKind, DrawKind, FlushCoordinator};
