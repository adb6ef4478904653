use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::{AudioBackend, SoundId, VoiceId};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum VoiceState {
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug)]
struct Voice {
    state: VoiceState,
    looping: bool,
}

/// Audio backend without an output device.
///
/// Loading only checks that the file exists and is non-empty; voices change
/// state exclusively through the API (nothing finishes on its own). Useful for
/// tests and for running on machines without sound hardware.
///
/// Handles follow the same rules as [`KiraAudio`](super::KiraAudio): sound
/// ids are never reused, and stopped voices are dropped on the next `play`
/// but stay known.
#[derive(Debug, Default)]
pub struct MemoryAudio {
    initialized: bool,
    sounds: HashMap<u32, PathBuf>,
    next_sound: u32,
    voices: HashMap<u32, Voice>,
    next_voice: u32,
}

impl MemoryAudio {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Path `sound` was loaded from, if it is still loaded.
    pub fn sound_path(&self, sound: SoundId) -> Option<&Path> {
        self.sounds.get(&sound.0).map(PathBuf::as_path)
    }

    /// Number of sounds loaded since `init`.
    #[inline]
    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }

    /// Number of voice handles still tracked.
    #[inline]
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    fn set_state(&mut self, voice: VoiceId, from: &[VoiceState], to: VoiceState) -> bool {
        match self.voices.get_mut(&voice.0) {
            Some(v) => {
                if from.contains(&v.state) {
                    v.state = to;
                }
                true
            }
            None => voice.0 < self.next_voice,
        }
    }

    fn prune_stopped(&mut self) {
        self.voices.retain(|_, v| v.state != VoiceState::Stopped);
    }
}

impl AudioBackend for MemoryAudio {
    fn init(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.initialized = false;
        self.sounds.clear();
        self.voices.clear();
    }

    fn load(&mut self, path: &Path) -> Result<SoundId> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("cannot read sound file: {}", path.display()))?;
        if meta.len() == 0 {
            bail!("sound file is empty: {}", path.display());
        }
        let id = self.next_sound;
        self.next_sound = self.next_sound.wrapping_add(1);
        self.sounds.insert(id, path.to_path_buf());
        Ok(SoundId(id))
    }

    fn play(&mut self, sound: SoundId, looping: bool) -> Result<Option<VoiceId>> {
        if !self.sounds.contains_key(&sound.0) {
            return Ok(None);
        }
        self.prune_stopped();
        let id = self.next_voice;
        self.next_voice = self.next_voice.wrapping_add(1);
        self.voices.insert(id, Voice { state: VoiceState::Playing, looping });
        Ok(Some(VoiceId(id)))
    }

    fn pause(&mut self, voice: VoiceId) -> bool {
        self.set_state(voice, &[VoiceState::Playing], VoiceState::Paused)
    }

    fn resume(&mut self, voice: VoiceId) -> bool {
        self.set_state(voice, &[VoiceState::Paused], VoiceState::Playing)
    }

    fn stop(&mut self, voice: VoiceId) -> bool {
        self.set_state(voice, &[VoiceState::Playing, VoiceState::Paused], VoiceState::Stopped)
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices.get(&voice.0).is_some_and(|v| v.state == VoiceState::Playing)
    }

    fn is_looping(&self, voice: VoiceId) -> bool {
        self.voices
            .get(&voice.0)
            .is_some_and(|v| v.looping && v.state != VoiceState::Stopped)
    }

    fn pause_all(&mut self) {
        for v in self.voices.values_mut().filter(|v| v.state == VoiceState::Playing) {
            v.state = VoiceState::Paused;
        }
    }

    fn resume_all(&mut self) {
        for v in self.voices.values_mut().filter(|v| v.state == VoiceState::Paused) {
            v.state = VoiceState::Playing;
        }
    }

    fn stop_all(&mut self) {
        for v in self.voices.values_mut() {
            v.state = VoiceState::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn sound_file() -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"RIFF....WAVE").unwrap();
        f
    }

    #[test]
    fn missing_file_fails_to_load() {
        let mut audio = MemoryAudio::new();
        audio.init().unwrap();
        assert!(audio.load(Path::new("/nonexistent/boom.wav")).is_err());
        assert_eq!(audio.sound_count(), 0);
    }

    #[test]
    fn voice_lifecycle() {
        let file = sound_file();
        let mut audio = MemoryAudio::new();
        audio.init().unwrap();
        let sound = audio.load(file.path()).unwrap();

        let voice = audio.play(sound, false).unwrap().unwrap();
        assert!(audio.is_playing(voice));
        assert!(!audio.is_looping(voice));

        assert!(audio.pause(voice));
        assert!(!audio.is_playing(voice));
        assert!(audio.resume(voice));
        assert!(audio.is_playing(voice));

        assert!(audio.stop(voice));
        assert!(!audio.is_playing(voice));
        // Stopped voices cannot be resumed.
        audio.resume(voice);
        assert!(!audio.is_playing(voice));
    }

    #[test]
    fn unknown_handles_are_reported() {
        let mut audio = MemoryAudio::new();
        audio.init().unwrap();
        assert!(audio.play(SoundId(3), false).unwrap().is_none());
        assert!(!audio.pause(VoiceId(9)));
    }

    #[test]
    fn pause_all_then_resume_all() {
        let file = sound_file();
        let mut audio = MemoryAudio::new();
        audio.init().unwrap();
        let sound = audio.load(file.path()).unwrap();
        let a = audio.play(sound, true).unwrap().unwrap();
        let b = audio.play(sound, false).unwrap().unwrap();

        audio.pause_all();
        assert!(!audio.is_playing(a) && !audio.is_playing(b));
        assert!(audio.is_looping(a));

        audio.resume_all();
        assert!(audio.is_playing(a) && audio.is_playing(b));

        audio.stop_all();
        assert!(!audio.is_looping(a));
    }

    #[test]
    fn stopped_voices_are_pruned_but_stay_known() {
        let file = sound_file();
        let mut audio = MemoryAudio::new();
        audio.init().unwrap();
        let sound = audio.load(file.path()).unwrap();

        let mut last = None;
        for _ in 0..100 {
            let voice = audio.play(sound, false).unwrap().unwrap();
            assert!(audio.stop(voice));
            last = Some(voice);
        }
        // Only the voice started by the latest play is still tracked.
        assert_eq!(audio.voice_count(), 1);

        let old = VoiceId(0);
        assert!(audio.stop(old));
        assert!(audio.pause(old));
        assert!(!audio.is_playing(old));
        assert!(audio.stop(last.unwrap()));
        assert!(!audio.pause(VoiceId(100)));
    }

    #[test]
    fn sound_ids_are_not_reused_after_shutdown() {
        let file = sound_file();
        let mut audio = MemoryAudio::new();
        audio.init().unwrap();
        let before = audio.load(file.path()).unwrap();
        assert_eq!(audio.sound_path(before), Some(file.path()));

        audio.shutdown();
        audio.init().unwrap();
        assert_eq!(audio.sound_count(), 0);
        assert!(audio.play(before, false).unwrap().is_none());

        let after = audio.load(file.path()).unwrap();
        assert_ne!(after, before);
        assert!(audio.play(after, false).unwrap().is_some());
        assert_eq!(audio.sound_path(before), None);
    }
}
