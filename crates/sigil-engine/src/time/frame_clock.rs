/// Delta reported before the first tick: one 60 Hz frame.
pub const IDEAL_FRAME_TIME: f64 = 0.016_666_67;

/// Lower delta clamp (seconds).
pub const MIN_DELTA_TIME: f64 = 0.000_01;

/// Upper delta clamp (seconds).
pub const MAX_DELTA_TIME: f64 = 0.5;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Clamped time elapsed since the previous tick, in seconds.
    pub dt: f32,

    /// Clock sample taken at the tick, in seconds.
    pub now: f64,

    /// Number of ticks before this one.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots from externally sampled time.
///
/// The clock does not read time itself; the caller passes the backend's
/// monotonic clock to [`tick`](Self::tick). This keeps it deterministic under
/// test.
///
/// Delta time is clamped so that a stalled or paused application does not
/// produce a huge step, and two samples with the same timestamp never produce
/// a zero step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    previous: f64,
    current: f64,
    dt: f32,
    frame_index: u64,
    dt_min: f64,
    dt_max: f64,
}

impl FrameClock {
    /// Creates a clock with the default clamps `[0.00001, 0.5]`.
    ///
    /// Before the first tick `dt()` reports [`IDEAL_FRAME_TIME`], and the
    /// baseline for the first delta is that same value.
    pub fn new() -> Self {
        Self::with_clamps(MIN_DELTA_TIME, MAX_DELTA_TIME)
    }

    /// Creates a clock with custom delta-time clamps (seconds).
    pub fn with_clamps(dt_min: f64, dt_max: f64) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            previous: 0.0,
            current: IDEAL_FRAME_TIME,
            dt: IDEAL_FRAME_TIME as f32,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restores the pre-first-tick state, keeping the clamps.
    pub fn reset(&mut self) {
        *self = Self::with_clamps(self.dt_min, self.dt_max);
    }

    /// Last clamped delta, in seconds.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Advances the clock to `now` (seconds) and returns a new `FrameTime`.
    pub fn tick(&mut self, now: f64) -> FrameTime {
        self.previous = self.current;
        self.current = now;

        let raw = self.current - self.previous;
        self.dt = raw.clamp(self.dt_min, self.dt_max) as f32;

        let ft = FrameTime {
            dt: self.dt,
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
