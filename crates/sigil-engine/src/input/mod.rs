//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Backends translate platform events into `InputEvent`s and apply them to an
//! `InputState`, which answers the polling queries (`key_down`, ...).

pub(crate) mod platform;
mod state;
mod types;

pub use state::InputState;
pub use types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};
