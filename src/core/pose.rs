//! Hand-pose smoothing and bat grip placement
//!
//! Raw hand-tracking samples are noisy and occasionally jump by a meter or
//! more for a single frame. The filter here turns that stream into a stable
//! bat transform: outlier samples are dropped outright, everything else is
//! blended toward the target with a fixed interpolation factor.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::Pose;
use crate::consts::{GRIP_OFFSET_X, GRIP_OFFSET_Z};

/// Which hand a tracking sample (or the bat grip) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

/// Skeleton joint a hand sample is anchored to
///
/// Only the metacarpal drives the bat; other joints arrive on the same
/// stream and are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandJoint {
    Wrist,
    Palm,
    MiddleFingerMetacarpal,
}

/// One raw sample from the hand-tracking provider
#[derive(Debug, Clone, Copy)]
pub struct HandSample {
    pub pose: Pose,
    pub tracked: bool,
    pub chirality: Handedness,
    pub joint: HandJoint,
}

/// Grip offset from the tracked metacarpal to the bat's rigid transform.
///
/// The rotation stands the bat up along the forearm. The left hand mirrors
/// the translation and folds in a half-turn about +Y so the bat points the
/// same way regardless of which hand holds it.
pub fn grip_offset(hand: Handedness) -> Pose {
    let align = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
    match hand {
        Handedness::Right => Pose::new(Vec3::new(GRIP_OFFSET_X, 0.0, GRIP_OFFSET_Z), align),
        Handedness::Left => Pose::new(
            Vec3::new(-GRIP_OFFSET_X, 0.0, -GRIP_OFFSET_Z),
            Quat::from_rotation_y(std::f32::consts::PI) * align,
        ),
    }
}

/// Exponential pose smoother with single-frame glitch rejection
#[derive(Debug, Clone)]
pub struct PoseFilter {
    smoothed: Option<Pose>,
    /// Interpolation factor per accepted sample
    alpha: f32,
    /// Samples farther than this from the smoothed position are dropped (meters)
    glitch_distance: f32,
}

impl PoseFilter {
    pub fn new(alpha: f32, glitch_distance: f32) -> Self {
        Self {
            smoothed: None,
            alpha,
            glitch_distance,
        }
    }

    /// Feed one grip-space target pose.
    ///
    /// Returns the new smoothed pose, or `None` when the sample was dropped
    /// as a glitch. The first accepted sample is adopted verbatim; later
    /// samples blend position linearly and orientation spherically.
    pub fn update(&mut self, target: Pose) -> Option<Pose> {
        let next = match self.smoothed {
            Some(prev) => {
                let distance = target.position.distance(prev.position);
                if distance > self.glitch_distance {
                    log::debug!("dropping glitch sample {distance:.2}m from smoothed pose");
                    return None;
                }
                Pose::new(
                    prev.position.lerp(target.position, self.alpha),
                    prev.orientation.slerp(target.orientation, self.alpha),
                )
            }
            None => target,
        };
        self.smoothed = Some(next);
        Some(next)
    }

    /// Current smoothed pose, if any sample has been accepted
    pub fn pose(&self) -> Option<Pose> {
        self.smoothed
    }

    /// Forget all history; the next sample is adopted verbatim
    pub fn reset(&mut self) {
        self.smoothed = None;
    }
}
