//! User preferences
//!
//! Session-scoped only; nothing here is persisted.

use serde::{Deserialize, Serialize};

use crate::audio::{SoundCue, volume_to_db};
use crate::core::Handedness;

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Hold the bat in the left hand (mirrors the grip offset)
    pub left_handed: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute all audio
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            left_handed: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    pub fn handedness(&self) -> Handedness {
        if self.left_handed {
            Handedness::Left
        } else {
            Handedness::Right
        }
    }

    /// Effective linear volume, zero when muted
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Playback gain for a cue at the current volume, or `None` when muted
    pub fn cue_gain_db(&self, cue: SoundCue) -> Option<f32> {
        let volume = self.effective_volume();
        if volume <= 0.0 {
            return None;
        }
        Some(cue.base_gain_db() + volume_to_db(volume))
    }
}
