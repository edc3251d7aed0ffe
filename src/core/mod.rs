//! Deterministic game core
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Single execution context, `&mut` access only, never locked
//! - Seeded RNG only
//! - Provider events applied in arrival order
//! - No platform, rendering, or audio dependencies; side effects leave the
//!   core as [`Command`] values

pub mod anchors;
pub mod ball;
pub mod engine;
pub mod events;
pub mod pose;
pub mod resolver;
pub mod scheduler;
pub mod session;

pub use anchors::{
    AnchorEvent, AnchorEventKind, AnchorId, AnchorRegistry, MeshSnapshot, ShapeError,
    synthesize_shape,
};
pub use ball::{Ball, BallController, BallId, BallStatus, SpawnRejected};
pub use engine::{GameEngine, ProviderEvent};
pub use events::{BannerKind, BodyId, BodyMode, Command, Material, ShapeDesc};
pub use pose::{HandJoint, HandSample, Handedness, PoseFilter, grip_offset};
pub use resolver::{CollisionClass, Resolution};
pub use scheduler::{Scheduler, Task, TaskKind};
pub use session::{GameSession, SessionChange, SessionStatus};
