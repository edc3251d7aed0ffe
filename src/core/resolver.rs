//! Collision classification and terminal resolution
//!
//! A collision-began event is only meaningful when the active ball is one
//! participant. The other body decides the path: the bat scores, registered
//! room geometry costs a life, anything else is ignored.
//!
//! Exactly one of {score, life loss} may fire per ball. The tie-break is
//! explicit: the first event to move the ball out of Flying wins, whichever
//! stream it arrived on; neither path is privileged. On top of that, the
//! per-ball `room_processed` flag absorbs the bursts of simultaneous
//! contacts a single ball can register against several room anchors at
//! once.

use super::anchors::AnchorRegistry;
use super::ball::{Ball, BallStatus};
use super::events::BodyId;

/// What the other collision participant turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionClass {
    Bat,
    Room,
    Ignored,
}

/// Classify the non-ball participant of a collision
pub fn classify(other: BodyId, bat_body: BodyId, anchors: &AnchorRegistry) -> CollisionClass {
    if other == bat_body {
        CollisionClass::Bat
    } else if anchors.contains_body(other) {
        CollisionClass::Room
    } else {
        CollisionClass::Ignored
    }
}

/// Side effect the engine must carry out for a resolved collision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Bat hit: score, hit sound, despawn animation, respawn
    BatHit,
    /// Room hit: life loss, miss sound, marker, despawn animation, respawn
    RoomHit,
    Ignored,
}

/// Apply the terminal-collision state transition for one event.
///
/// Moves the ball Flying → Resolving when the event is accepted; everything
/// after that transition is ignored, which is what makes the score/life
/// effects mutually exclusive per ball instance.
pub fn resolve(ball: &mut Ball, class: CollisionClass) -> Resolution {
    match class {
        CollisionClass::Ignored => Resolution::Ignored,
        CollisionClass::Bat => {
            if ball.status != BallStatus::Flying {
                log::debug!("ignoring bat contact for ball {:?} already resolving", ball.id);
                return Resolution::Ignored;
            }
            ball.status = BallStatus::Resolving;
            Resolution::BatHit
        }
        CollisionClass::Room => {
            if ball.room_processed {
                log::debug!("room collision already handled for ball {:?}", ball.id);
                return Resolution::Ignored;
            }
            if ball.status != BallStatus::Flying {
                return Resolution::Ignored;
            }
            ball.room_processed = true;
            ball.status = BallStatus::Resolving;
            Resolution::RoomHit
        }
    }
}
