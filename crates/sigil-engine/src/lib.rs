//! Sigil engine crate.
//!
//! Immediate-mode 2D drawing and sound for small programs and teaching. All
//! state lives in a [`Sigil`] context; platform work is delegated to a
//! [`Backend`](backend::Backend) (window, GPU, text, textures) and an
//! [`AudioBackend`](audio::AudioBackend).
//!
//! Drawing space is window pixels with the origin at the bottom-left corner.

pub mod audio;
pub mod backend;
pub mod batch;
pub mod core;
pub mod coords;
pub mod device;
pub mod error;
pub mod input;
pub mod logging;
pub mod paint;
pub mod text;
pub mod time;
pub mod transform;

mod render;

pub use crate::backend::{TextureId, WindowConfig};
pub use crate::core::{Sigil, TextAlign};
pub use crate::error::{ResourceKind, Result, SigilError};
