/// What to do after acquiring a surface frame failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame may succeed.
    Reconfigured,
    /// Transient error; drop this frame's geometry.
    SkipFrame,
    /// Out of memory; report a backend failure.
    Fatal,
}
