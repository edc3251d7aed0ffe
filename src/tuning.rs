//! Data-driven game balance
//!
//! Every timing and balance value the engine reads comes through this
//! struct. Defaults mirror `consts`; hosts may override any subset from a
//! JSON document (missing fields keep their defaults).

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Gameplay balance knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Pose smoothing interpolation factor
    pub smoothing_factor: f32,
    /// Glitch rejection distance (meters)
    pub glitch_distance: f32,
    /// Tracking watchdog interval (seconds)
    pub tracking_grace: f32,
    /// Launch speed range (m/s)
    pub launch_speed_min: f32,
    pub launch_speed_max: f32,
    /// Flight time before forcible despawn (seconds)
    pub ball_timeout: f32,
    /// Respawn delay after a timeout despawn (seconds)
    pub timeout_respawn_delay: f32,
    /// Respawn delay after a resolved hit or miss (seconds)
    pub resolve_respawn_delay: f32,
    /// Lives at session start
    pub start_lives: u8,
    /// Score needed to win
    pub win_score: u32,
    /// Ball spawn region, per-axis min/max (meters)
    pub spawn_min: [f32; 3],
    pub spawn_max: [f32; 3],
    /// Restart countdown start value
    pub countdown_start: u8,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            smoothing_factor: SMOOTHING_FACTOR,
            glitch_distance: GLITCH_DISTANCE,
            tracking_grace: TRACKING_GRACE,
            launch_speed_min: LAUNCH_SPEED_MIN,
            launch_speed_max: LAUNCH_SPEED_MAX,
            ball_timeout: BALL_TIMEOUT,
            timeout_respawn_delay: TIMEOUT_RESPAWN_DELAY,
            resolve_respawn_delay: RESOLVE_RESPAWN_DELAY,
            start_lives: START_LIVES,
            win_score: WIN_SCORE,
            spawn_min: [SPAWN_X.0, SPAWN_Y.0, SPAWN_Z.0],
            spawn_max: [SPAWN_X.1, SPAWN_Y.1, SPAWN_Z.1],
            countdown_start: COUNTDOWN_START,
        }
    }
}

impl Tuning {
    /// Parse from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
