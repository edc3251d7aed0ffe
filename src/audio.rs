//! Sound cue table
//!
//! The core emits named cues; the host owns decoding and playback. A cue
//! that fails to load host-side is logged and skipped there — game logic
//! never waits on audio.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Bat connects with the ball
    BatImpact,
    /// Ball strikes the room
    RoomImpact,
    /// Lives exhausted
    GameOver,
    /// Win threshold reached
    GameWon,
}

impl SoundCue {
    /// Asset file the host should resolve
    pub fn asset_name(&self) -> &'static str {
        match self {
            SoundCue::BatImpact => "bat_impact.wav",
            SoundCue::RoomImpact => "room_impact.wav",
            SoundCue::GameOver => "game_over.wav",
            SoundCue::GameWon => "game_won.wav",
        }
    }

    /// Base playback gain; every cue in the set is mastered to the same level
    pub fn base_gain_db(&self) -> f32 {
        -10.0
    }
}

/// Convert a linear volume in (0, 1] to a decibel offset; full volume is 0 dB
pub fn volume_to_db(volume: f32) -> f32 {
    20.0 * volume.max(1e-4).log10()
}
