//! Audio subsystem.
//!
//! Sounds are loaded once and played any number of times; each playback is a
//! *voice* with its own handle so it can be paused, resumed or stopped
//! independently.
//!
//! Implementations:
//! - [`KiraAudio`]: real output through kira's default (cpal) backend
//! - [`MemoryAudio`]: no device; tracks voice state in memory

mod kira;
mod memory;

pub use self::kira::KiraAudio;
pub use self::memory::MemoryAudio;

use std::path::Path;

use anyhow::Result;

/// Handle to a loaded sound.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SoundId(pub u32);

/// Handle to one playback of a sound.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VoiceId(pub u32);

/// Audio device contract used by the context.
///
/// `init` is called when the window opens and `shutdown` when it closes;
/// nothing else is called outside that span except the voice queries, which
/// must then report "not playing".
pub trait AudioBackend {
    fn init(&mut self) -> Result<()>;

    fn shutdown(&mut self);

    fn load(&mut self, path: &Path) -> Result<SoundId>;

    /// Starts a new voice. `None` means the sound handle is unknown.
    fn play(&mut self, sound: SoundId, looping: bool) -> Result<Option<VoiceId>>;

    /// Returns false if the voice is unknown.
    fn pause(&mut self, voice: VoiceId) -> bool;

    /// Returns false if the voice is unknown.
    fn resume(&mut self, voice: VoiceId) -> bool;

    /// Returns false if the voice is unknown.
    fn stop(&mut self, voice: VoiceId) -> bool;

    fn is_playing(&self, voice: VoiceId) -> bool;

    fn is_looping(&self, voice: VoiceId) -> bool;

    fn pause_all(&mut self);

    fn resume_all(&mut self);

    fn stop_all(&mut self);
}
