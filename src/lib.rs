//! Roombat - a motion-tracked bat-and-ball room game core
//!
//! Core modules:
//! - `core`: Deterministic game core (pose filtering, ball lifecycle, collision
//!   resolution, session state, scheduling)
//! - `tuning`: Data-driven game balance
//! - `settings`: User preferences (handedness, volume)
//! - `audio`: Sound cue table
//!
//! The crate performs no I/O. Hosts feed provider events and the clock into
//! [`core::GameEngine`] and drain the resulting [`core::Command`] stream into
//! their physics and presentation layers.

pub mod audio;
pub mod core;
pub mod settings;
pub mod tuning;

pub use settings::Settings;
pub use tuning::Tuning;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Pose smoothing interpolation factor (fraction moved toward each new sample)
    pub const SMOOTHING_FACTOR: f32 = 0.6;
    /// Raw samples farther than this from the smoothed pose are dropped as glitches (meters)
    pub const GLITCH_DISTANCE: f32 = 1.0;
    /// Tracking watchdog interval; the bat detaches if no sample lands within a window (seconds)
    pub const TRACKING_GRACE: f32 = 2.0;

    /// Bat collision capsule (wider than the visual model to make contact forgiving)
    pub const BAT_CAPSULE_HEIGHT: f32 = 0.15;
    pub const BAT_CAPSULE_RADIUS: f32 = 0.5;
    pub const BAT_MASS: f32 = 3.0;
    pub const BAT_FRICTION: f32 = 1.2;
    pub const BAT_RESTITUTION: f32 = 0.8;
    /// Resting bat height before the first hand sample arrives (meters)
    pub const BAT_REST_HEIGHT: f32 = 0.75;
    /// Grip offset from the tracked metacarpal to the bat handle, right hand (meters)
    pub const GRIP_OFFSET_X: f32 = -0.07;
    pub const GRIP_OFFSET_Z: f32 = 0.20;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.07;
    pub const BALL_MASS: f32 = 1.0;
    pub const BALL_FRICTION: f32 = 0.8;
    pub const BALL_RESTITUTION: f32 = 0.0;
    /// Launch speed range, sampled uniformly (m/s)
    pub const LAUNCH_SPEED_MIN: f32 = 0.5;
    pub const LAUNCH_SPEED_MAX: f32 = 1.2;
    /// Flight time before a ball is forcibly despawned (seconds)
    pub const BALL_TIMEOUT: f32 = 2.0;
    /// Respawn delay after a timeout despawn (seconds)
    pub const TIMEOUT_RESPAWN_DELAY: f32 = 0.5;
    /// Respawn delay after a resolved hit or miss (seconds)
    pub const RESOLVE_RESPAWN_DELAY: f32 = 2.0;

    /// Despawn animation: swell briefly, then shrink to nothing
    pub const SWELL_SCALE: f32 = 1.5;
    pub const SWELL_DURATION: f32 = 0.1;
    pub const SHRINK_DURATION: f32 = 0.2;

    /// Ball spawn region, user-relative (meters)
    pub const SPAWN_X: (f32, f32) = (-0.4, 0.4);
    pub const SPAWN_Y: (f32, f32) = (2.0, 2.8);
    pub const SPAWN_Z: (f32, f32) = (-1.2, -0.8);

    /// Session defaults
    pub const START_LIVES: u8 = 5;
    pub const WIN_SCORE: u32 = 1;

    /// Restart countdown
    pub const COUNTDOWN_START: u8 = 3;
    pub const COUNTDOWN_INTERVAL: f32 = 1.0;

    /// Life-loss marker: raised above the impact point, removed shortly after
    pub const MARKER_RAISE: f32 = 0.3;
    pub const MARKER_LIFETIME: f32 = 1.2;

    /// Win celebration staging (seconds after the winning hit)
    pub const CELEBRATION_DELAY: f32 = 0.2;
    pub const WIN_BANNER_DELAY: f32 = 0.4;
}

/// A rigid transform: position plus orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Translation-only transform
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    /// Compose with a local offset: `self * offset`
    pub fn transform(&self, offset: &Pose) -> Pose {
        Pose {
            position: self.position + self.orientation * offset.position,
            orientation: self.orientation * offset.orientation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_pose_compose_translation() {
        let base = Pose::from_position(Vec3::new(1.0, 2.0, 3.0));
        let offset = Pose::from_position(Vec3::new(0.0, 0.0, 1.0));
        let composed = base.transform(&offset);
        assert_eq!(composed.position, Vec3::new(1.0, 2.0, 4.0));
    }

    #[test]
    fn test_pose_compose_rotated_offset() {
        // A quarter turn about Y maps +Z onto +X
        let base = Pose::new(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2));
        let offset = Pose::from_position(Vec3::new(0.0, 0.0, 1.0));
        let composed = base.transform(&offset);
        assert!((composed.position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }
}
