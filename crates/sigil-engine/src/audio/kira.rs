use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use kira::sound::PlaybackState;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, AudioManagerSettings, DefaultBackend, Tween};

use super::{AudioBackend, SoundId, VoiceId};

struct Voice {
    handle: StaticSoundHandle,
    looping: bool,
}

/// Kira-based audio output.
///
/// The audio manager (and with it the output stream) only exists between
/// `init` and `shutdown`. Sound data is decoded fully at load time. Sound ids
/// keep counting across `shutdown`, so a handle from an earlier window never
/// names a newer sound.
#[derive(Default)]
pub struct KiraAudio {
    manager: Option<AudioManager<DefaultBackend>>,
    sounds: HashMap<u32, StaticSoundData>,
    next_sound: u32,
    voices: HashMap<u32, Voice>,
    next_voice: u32,
}

impl KiraAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` on a live voice. Voices that finished and were pruned still
    /// count as known; only handles never issued are rejected.
    fn with_voice<F>(&mut self, voice: VoiceId, f: F) -> bool
    where
        F: FnOnce(&mut StaticSoundHandle),
    {
        match self.voices.get_mut(&voice.0) {
            Some(v) => {
                f(&mut v.handle);
                true
            }
            None => voice.0 < self.next_voice,
        }
    }

    /// Drops handles of voices that finished on their own.
    fn prune_stopped(&mut self) {
        self.voices
            .retain(|_, v| !matches!(v.handle.state(), PlaybackState::Stopped));
    }
}

impl AudioBackend for KiraAudio {
    fn init(&mut self) -> Result<()> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| anyhow!("failed to create audio manager: {e}"))?;
        self.manager = Some(manager);
        log::debug!("kira audio manager initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stop_all();
        self.voices.clear();
        self.sounds.clear();
        self.manager = None;
    }

    fn load(&mut self, path: &Path) -> Result<SoundId> {
        let data = StaticSoundData::from_file(path)
            .with_context(|| format!("failed to decode sound: {}", path.display()))?;
        let id = self.next_sound;
        self.next_sound = self.next_sound.wrapping_add(1);
        self.sounds.insert(id, data);
        Ok(SoundId(id))
    }

    fn play(&mut self, sound: SoundId, looping: bool) -> Result<Option<VoiceId>> {
        let Some(data) = self.sounds.get(&sound.0) else {
            return Ok(None);
        };
        let data = if looping { data.clone().loop_region(0.0..) } else { data.clone() };

        let manager = self
            .manager
            .as_mut()
            .context("audio manager is not initialized")?;
        let handle = manager
            .play(data)
            .map_err(|e| anyhow!("failed to play sound {}: {e}", sound.0))?;

        self.prune_stopped();
        let id = self.next_voice;
        self.next_voice = self.next_voice.wrapping_add(1);
        self.voices.insert(id, Voice { handle, looping });
        Ok(Some(VoiceId(id)))
    }

    fn pause(&mut self, voice: VoiceId) -> bool {
        self.with_voice(voice, |h| h.pause(Tween::default()))
    }

    fn resume(&mut self, voice: VoiceId) -> bool {
        self.with_voice(voice, |h| h.resume(Tween::default()))
    }

    fn stop(&mut self, voice: VoiceId) -> bool {
        self.with_voice(voice, |h| h.stop(Tween::default()))
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices
            .get(&voice.0)
            .is_some_and(|v| matches!(v.handle.state(), PlaybackState::Playing))
    }

    fn is_looping(&self, voice: VoiceId) -> bool {
        self.voices
            .get(&voice.0)
            .is_some_and(|v| v.looping && !matches!(v.handle.state(), PlaybackState::Stopped))
    }

    fn pause_all(&mut self) {
        for v in self.voices.values_mut() {
            v.handle.pause(Tween::default());
        }
    }

    fn resume_all(&mut self) {
        for v in self.voices.values_mut() {
            v.handle.resume(Tween::default());
        }
    }

    fn stop_all(&mut self) {
        for v in self.voices.values_mut() {
            v.handle.stop(Tween::default());
        }
    }
}
