//! Delayed-task queue
//!
//! Every deferred continuation in the game — launch ticks, ball timeouts,
//! despawn animation stages, respawns, countdown steps, the tracking
//! watchdog — is a scheduled task drained by the engine's clock. Nothing
//! blocks; nothing runs off the owning context.
//!
//! Tasks carry the session epoch they were scheduled under. A restart bumps
//! the epoch, so in-flight tasks from the previous session are dropped
//! without firing. Ball-addressed tasks additionally re-validate the active
//! slot when they run; staleness is expected, not an error.

use super::ball::BallId;

/// What a scheduled task does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Apply launch velocity, strictly after the ball's body registration
    Launch { ball: BallId },
    /// Forcible despawn when no collision resolved the ball in time
    BallTimeout { ball: BallId },
    /// Spawn the next ball if the slot is free
    Respawn,
    /// Second despawn animation stage: shrink the ball to nothing
    ShrinkBall { ball: BallId },
    /// Final despawn stage: remove the body and clear the active slot
    RemoveBall { ball: BallId },
    /// Take down the life-loss marker
    RemoveMarker,
    /// Restart countdown step; spawns the first ball at zero
    Countdown { remaining: u8 },
    /// One-shot win celebration burst
    CelebrationBurst,
    /// Win banner and fanfare
    WinBanner,
    /// Periodic hand-tracking liveness check; re-arms itself
    TrackingWatchdog,
}

/// A task waiting for its fire time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Task {
    pub fire_at: f32,
    pub epoch: u32,
    pub kind: TaskKind,
    /// Scheduling order, used as a tie-break so same-instant tasks fire FIFO
    seq: u64,
}

/// Delayed-task queue keyed on the engine clock
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_seq: u64,
}

impl Scheduler {
    pub fn schedule(&mut self, fire_at: f32, epoch: u32, kind: TaskKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(Task {
            fire_at,
            epoch,
            kind,
            seq,
        });
    }

    /// Remove and return the tasks due at `now`, ordered by fire time then
    /// scheduling order. Tasks from a stale epoch are discarded here.
    pub fn drain_due(&mut self, now: f32, epoch: u32) -> Vec<Task> {
        let mut due = Vec::new();
        self.tasks.retain(|task| {
            if task.fire_at > now {
                return true;
            }
            if task.epoch != epoch {
                log::debug!("dropping stale task {:?} from epoch {}", task.kind, task.epoch);
            } else {
                due.push(*task);
            }
            false
        });
        due.sort_by(|a, b| {
            a.fire_at
                .total_cmp(&b.fire_at)
                .then(a.seq.cmp(&b.seq))
        });
        due
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Pending tasks, unordered (diagnostics and tests)
    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_orders_by_time_then_fifo() {
        let mut s = Scheduler::default();
        s.schedule(2.0, 0, TaskKind::Respawn);
        s.schedule(1.0, 0, TaskKind::BallTimeout { ball: BallId(1) });
        s.schedule(1.0, 0, TaskKind::RemoveMarker);

        let due = s.drain_due(2.0, 0);
        assert_eq!(due.len(), 3);
        assert_eq!(due[0].kind, TaskKind::BallTimeout { ball: BallId(1) });
        assert_eq!(due[1].kind, TaskKind::RemoveMarker);
        assert_eq!(due[2].kind, TaskKind::Respawn);
        assert!(s.is_empty());
    }

    #[test]
    fn test_not_yet_due_tasks_stay_queued() {
        let mut s = Scheduler::default();
        s.schedule(0.5, 0, TaskKind::Respawn);
        s.schedule(5.0, 0, TaskKind::TrackingWatchdog);

        let due = s.drain_due(1.0, 0);
        assert_eq!(due.len(), 1);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_stale_epoch_tasks_are_dropped() {
        let mut s = Scheduler::default();
        s.schedule(0.1, 0, TaskKind::Respawn);
        s.schedule(0.1, 1, TaskKind::RemoveMarker);

        let due = s.drain_due(1.0, 1);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].kind, TaskKind::RemoveMarker);
        assert!(s.is_empty());
    }
}
