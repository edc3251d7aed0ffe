//! Ball lifecycle
//!
//! At most one ball is ever in play. The controller owns that invariant
//! through the spawn gate alone — spawn requests are synchronous on the
//! single execution context, so no locking is involved. A ball leaves the
//! active slot through exactly one of: flight timeout, bat hit, room hit.

use glam::Vec3;

use super::events::BodyId;
use super::session::SessionStatus;

/// Stable per-ball identity, compared by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BallId(pub u32);

/// Lifecycle state of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallStatus {
    /// In flight, collisions pending
    Flying,
    /// Terminal collision accepted; despawn animation running
    Resolving,
    /// Removed from the scene
    Despawned,
}

/// One ball instance
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: BallId,
    pub body: BodyId,
    pub spawn_position: Vec3,
    pub status: BallStatus,
    /// Set on the first room hit so simultaneous multi-anchor contacts
    /// cannot double-charge a life
    pub room_processed: bool,
}

/// Why a spawn request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRejected {
    /// A ball is already Flying or Resolving
    BallActive,
    Won,
    GameOver,
}

/// Owner of the single active-ball slot
#[derive(Debug, Default)]
pub struct BallController {
    active: Option<Ball>,
    next_id: u32,
}

impl BallController {
    pub fn active(&self) -> Option<&Ball> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Ball> {
        self.active.as_mut()
    }

    /// Gate a spawn request and claim the slot.
    ///
    /// `forced` bypasses the active-ball and GameOver gates for explicit
    /// restarts; a Won session refuses even forced spawns (a restart resets
    /// the session first). The caller emits the body commands.
    pub fn try_spawn(
        &mut self,
        status: SessionStatus,
        forced: bool,
        body: BodyId,
        position: Vec3,
    ) -> Result<BallId, SpawnRejected> {
        match status {
            SessionStatus::Won => return Err(SpawnRejected::Won),
            SessionStatus::GameOver if !forced => return Err(SpawnRejected::GameOver),
            _ => {}
        }
        if self.active.is_some() && !forced {
            return Err(SpawnRejected::BallActive);
        }
        let id = BallId(self.next_id);
        self.next_id += 1;
        self.active = Some(Ball {
            id,
            body,
            spawn_position: position,
            status: BallStatus::Flying,
            room_processed: false,
        });
        Ok(id)
    }

    /// Release the slot if it still holds `id`; stale callers get `None`
    pub fn clear_if(&mut self, id: BallId) -> Option<Ball> {
        if self.active.as_ref().is_some_and(|b| b.id == id) {
            self.active.take().map(|mut ball| {
                ball.status = BallStatus::Despawned;
                ball.room_processed = false;
                ball
            })
        } else {
            None
        }
    }

    /// Unconditionally empty the slot (forced spawn, restart)
    pub fn take_active(&mut self) -> Option<Ball> {
        self.active.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(
        c: &mut BallController,
        status: SessionStatus,
        forced: bool,
    ) -> Result<BallId, SpawnRejected> {
        c.try_spawn(status, forced, BodyId(0), Vec3::ZERO)
    }

    #[test]
    fn test_second_spawn_rejected_while_active() {
        let mut c = BallController::default();
        spawn(&mut c, SessionStatus::Running, false).unwrap();
        assert_eq!(
            spawn(&mut c, SessionStatus::Running, false),
            Err(SpawnRejected::BallActive)
        );
        // Forcing claims the slot anyway
        assert!(spawn(&mut c, SessionStatus::Running, true).is_ok());
    }

    #[test]
    fn test_terminal_states_gate_spawns() {
        let mut c = BallController::default();
        assert_eq!(
            spawn(&mut c, SessionStatus::GameOver, false),
            Err(SpawnRejected::GameOver)
        );
        assert!(spawn(&mut c, SessionStatus::GameOver, true).is_ok());
        c.take_active();

        // Won refuses even forced spawns
        assert_eq!(
            spawn(&mut c, SessionStatus::Won, true),
            Err(SpawnRejected::Won)
        );
    }

    #[test]
    fn test_ball_ids_are_never_reused() {
        let mut c = BallController::default();
        let a = spawn(&mut c, SessionStatus::Running, false).unwrap();
        c.take_active();
        let b = spawn(&mut c, SessionStatus::Running, false).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_clear_if_validates_identity() {
        let mut c = BallController::default();
        let id = spawn(&mut c, SessionStatus::Running, false).unwrap();

        // A stale id from a previous ball does nothing
        assert!(c.clear_if(BallId(id.0 + 1)).is_none());
        assert!(c.active().is_some());

        let ball = c.clear_if(id).unwrap();
        assert_eq!(ball.status, BallStatus::Despawned);
        assert!(c.active().is_none());
    }
}
