//! The drawing context.
//!
//! [`Sigil`] is the single entry point applications talk to. It owns the
//! per-window render state and forwards work to a [`Backend`](crate::backend::Backend)
//! and an [`AudioBackend`](crate::audio::AudioBackend).

mod sigil;
mod text_align;

pub use sigil::Sigil;
pub use text_align::TextAlign;
