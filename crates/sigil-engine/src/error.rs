use std::fmt;
use std::path::PathBuf;

/// Kind of resource named in a [`SigilError::Load`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    Texture,
    Sound,
    Font,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Sound => "sound",
            ResourceKind::Font => "font",
        })
    }
}

/// Errors returned by [`Sigil`](crate::Sigil).
///
/// Usage errors (wrong window state, stack misuse, bad alignment) and backend
/// failures are all reported here; none of them poison the context. Resource
/// load failures are the only variant a well-formed program is expected to
/// handle at runtime.
#[derive(Debug)]
pub enum SigilError {
    /// `open` was called while a window already exists.
    WindowAlreadyOpen,

    /// A window-dependent operation was called with no window open.
    WindowNotOpen { operation: &'static str },

    /// `push` would exceed the transform stack capacity.
    TransformStackOverflow { capacity: usize },

    /// `pop` was called on the base matrix.
    TransformStackUnderflow,

    /// Text alignment outside `0..=2`.
    InvalidTextAlign(i32),

    /// A sound handle that was never returned by `load_wav`.
    UnknownSound(u32),

    /// A voice handle that was never returned by `sound_play`/`sound_loop`.
    UnknownVoice(u32),

    /// A texture, sound or font could not be loaded.
    Load {
        kind: ResourceKind,
        path: PathBuf,
        source: anyhow::Error,
    },

    /// The windowing, GPU or audio backend failed.
    Backend {
        operation: &'static str,
        source: anyhow::Error,
    },
}

impl SigilError {
    pub(crate) fn backend(operation: &'static str, source: anyhow::Error) -> Self {
        SigilError::Backend { operation, source }
    }

    /// True for errors caused by calling the API in the wrong order or with
    /// out-of-range arguments, as opposed to I/O or device failures.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            SigilError::WindowAlreadyOpen
                | SigilError::WindowNotOpen { .. }
                | SigilError::TransformStackOverflow { .. }
                | SigilError::TransformStackUnderflow
                | SigilError::InvalidTextAlign(_)
                | SigilError::UnknownSound(_)
                | SigilError::UnknownVoice(_)
        )
    }
}

impl fmt::Display for SigilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigilError::WindowAlreadyOpen => {
                write!(f, "open() cannot be called when a window already exists")
            }
            SigilError::WindowNotOpen { operation } => {
                write!(f, "{operation}() cannot be called because no window exists")
            }
            SigilError::TransformStackOverflow { capacity } => {
                write!(f, "push() exceeded maximum transform stack size of {capacity}")
            }
            SigilError::TransformStackUnderflow => {
                write!(f, "pop() cannot pop an empty transform stack")
            }
            SigilError::InvalidTextAlign(value) => write!(
                f,
                "text alignment {value} is invalid; expected 0 (left), 1 (center) or 2 (right)"
            ),
            SigilError::UnknownSound(id) => write!(f, "unknown sound handle {id}"),
            SigilError::UnknownVoice(id) => write!(f, "unknown voice handle {id}"),
            SigilError::Load { kind, path, source } => {
                write!(f, "failed to load {kind} '{}': {source:#}", path.display())
            }
            SigilError::Backend { operation, source } => {
                write!(f, "{operation}() failed: {source:#}")
            }
        }
    }
}

impl std::error::Error for SigilError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SigilError::Load { source, .. } | SigilError::Backend { source, .. } => {
                Some(&**source)
            }
            _ => None,
        }
    }
}

/// Result alias used across the public API.
pub type Result<T> = std::result::Result<T, SigilError>;
