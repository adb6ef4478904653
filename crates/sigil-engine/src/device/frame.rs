/// A single acquired surface frame.
///
/// Holding the surface texture prevents acquisition of the next frame, so
/// this lives only for the duration of one `poll_and_swap`.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
