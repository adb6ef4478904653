use std::fmt;

/// Keyboard key identifier.
///
/// Keys are identified by physical position (US layout names), so `Key::W`
/// stays under the same finger on AZERTY keyboards. Keys without a variant map
/// to `Key::Unknown` with a stable platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Pause,

    Up,
    Down,
    Left,
    Right,

    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    LeftAlt,
    RightAlt,
    LeftSuper,
    RightSuper,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Keypad
    Keypad0, Keypad1, Keypad2, Keypad3, Keypad4,
    Keypad5, Keypad6, Keypad7, Keypad8, Keypad9,
    KeypadAdd, KeypadSubtract, KeypadMultiply, KeypadDivide,
    KeypadDecimal, KeypadEnter,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    /// Platform-dependent key not represented above.
    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButtonState {
    Pressed,
    Released,
}

/// Platform-agnostic input events.
///
/// Pointer coordinates are already in drawing space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { key: Key, state: KeyState },

    PointerMoved { x: f32, y: f32 },

    PointerButton { button: MouseButton, state: MouseButtonState },

    /// Window focus change.
    Focused(bool),
}
