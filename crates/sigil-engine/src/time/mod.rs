//! Time subsystem.
//!
//! Provides clamped frame timing decoupled from any particular clock source.
//! Intended usage:
//! - one `FrameClock` per context
//! - call `tick(now)` once per presented frame with the backend's monotonic time

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime, IDEAL_FRAME_TIME, MAX_DELTA_TIME, MIN_DELTA_TIME};
