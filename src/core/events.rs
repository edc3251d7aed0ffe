//! Outbound commands and notifications
//!
//! The core performs no I/O. Every externally visible side effect is pushed
//! onto the engine's command queue as one of these values; the host drains
//! the queue after each call, forwards physics commands to the collision
//! engine and presentation commands to the render/audio layer, and treats
//! notifications as its observer surface. Commands are consumed in order;
//! the queue order carries hard constraints (a ball's body registration
//! always precedes its launch velocity).

use glam::Vec3;

use crate::Pose;
use crate::audio::SoundCue;

use super::ball::BallId;
use super::pose::Handedness;
use super::session::SessionStatus;

/// Stable identity for a body registered with the physics engine.
///
/// Compared by value; allocated monotonically by the engine across bats,
/// balls, and room anchors so collision events can name any participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// Physics simulation mode for a registered body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Simulated and pushed around by the engine (balls)
    Dynamic,
    /// Moved by us, collides but is never simulated (the bat)
    Kinematic,
    /// Never moves (room geometry)
    Static,
}

/// Surface response material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

/// Collision shape descriptor handed to the physics engine
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDesc {
    Sphere {
        radius: f32,
    },
    Capsule {
        height: f32,
        radius: f32,
    },
    /// Triangulated static mesh from room reconstruction
    TriangleMesh {
        vertices: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    },
}

/// Transient banner text shown in front of the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Countdown,
    GameOver,
    GameWon,
}

/// One externally visible side effect or notification
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // --- physics ---
    /// Register a body. `material: None` leaves the engine default.
    AddBody {
        body: BodyId,
        mode: BodyMode,
        shape: ShapeDesc,
        transform: Pose,
        mass: f32,
        material: Option<Material>,
    },
    /// Move a body (kinematic bat follow, static anchor update)
    SetBodyTransform { body: BodyId, transform: Pose },
    /// Force the engine to re-read a kinematic body's transform
    ResyncBody { body: BodyId },
    /// Replace a static body's collision shape (anchor update)
    SetBodyShape { body: BodyId, shape: ShapeDesc },
    /// Velocity impulse on a dynamic body
    SetBodyVelocity { body: BodyId, velocity: Vec3 },
    /// Toggle collision participation (bat detach on tracking loss)
    SetBodyCollidable { body: BodyId, collidable: bool },
    RemoveBody { body: BodyId },

    // --- presentation ---
    /// Swap the visible bat model to the given hand
    SetBatHand { hand: Handedness },
    /// Show or hide the visible bat (tracking attach/detach)
    SetBatVisible { visible: bool },
    /// Play a named sound, optionally attached to a body for spatialization
    PlaySound {
        cue: SoundCue,
        gain_db: f32,
        attach_to: Option<BodyId>,
    },
    ShowBanner { kind: BannerKind, text: String },
    RemoveBanner { kind: BannerKind },
    /// Despawn animation stage for a ball's visual
    SetBallScale {
        ball: BallId,
        scale: f32,
        duration: f32,
    },
    /// Life-loss marker shown above the impact point
    ShowLifeLossMarker { position: Vec3 },
    RemoveLifeLossMarker,
    /// One-shot win celebration burst
    CelebrationBurst,

    // --- notifications ---
    ScoreChanged(u32),
    LivesChanged(u8),
    TrackingLost,
    SessionEnded(SessionStatus),
}
