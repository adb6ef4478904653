use std::collections::HashSet;

use crate::coords::Vec2;

use super::types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};

/// Current input state for the window.
///
/// Holds "is down" information and the last known pointer position, which is
/// what the polling queries need.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in drawing space. Kept after the pointer leaves.
    pub pointer_pos: Vec2,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event.
    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // Release events are not delivered while unfocused.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                self.pointer_pos = Vec2::new(x, y);
            }

            InputEvent::Key { key, state } => match state {
                KeyState::Pressed => {
                    self.keys_down.insert(key);
                }
                KeyState::Released => {
                    self.keys_down.remove(&key);
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                MouseButtonState::Pressed => {
                    self.buttons_down.insert(button);
                }
                MouseButtonState::Released => {
                    self.buttons_down.remove(&button);
                }
            },
        }
    }

    /// Forgets everything; used when the window closes.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_and_release() {
        let mut state = InputState::default();
        state.apply_event(InputEvent::Key { key: Key::Space, state: KeyState::Pressed });
        assert!(state.key_down(Key::Space));
        state.apply_event(InputEvent::Key { key: Key::Space, state: KeyState::Released });
        assert!(!state.key_down(Key::Space));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut state = InputState::default();
        state.apply_event(InputEvent::Focused(true));
        state.apply_event(InputEvent::Key { key: Key::A, state: KeyState::Pressed });
        state.apply_event(InputEvent::PointerButton {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
        });
        state.apply_event(InputEvent::Focused(false));
        assert!(!state.key_down(Key::A));
        assert!(!state.button_down(MouseButton::Left));
    }

    #[test]
    fn pointer_position_tracks_moves() {
        let mut state = InputState::default();
        state.apply_event(InputEvent::PointerMoved { x: 10.0, y: 590.0 });
        assert_eq!(state.pointer_pos, Vec2::new(10.0, 590.0));
    }
}
