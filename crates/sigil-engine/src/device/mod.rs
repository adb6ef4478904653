//! GPU device + surface management for the desktop backend.
//!
//! Creates the wgpu Instance/Adapter/Device/Queue, configures the window
//! surface and hands out one frame (encoder + view) at a time.

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
