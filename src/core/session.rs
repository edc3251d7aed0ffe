//! Score, lives, and win/loss state
//!
//! The session is the single authority the other components query and
//! mutate. Transitions are monotonic until an explicit reset: NotStarted →
//! Running → {GameOver, Won}. Score and life mutations are valid only while
//! Running, which is what makes the terminal transitions idempotent.

use serde::{Deserialize, Serialize};

/// Current phase of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    NotStarted,
    Running,
    GameOver,
    Won,
}

/// Observable outcome of a session mutation, published to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    ScoreChanged { score: u32 },
    /// Score crossed the win threshold; fires exactly once per session
    Won { score: u32 },
    LifeLost { remaining: u8 },
    /// Lives reached zero; fires exactly once per session
    GameOver,
}

/// One game session's mutable state
#[derive(Debug, Clone)]
pub struct GameSession {
    score: u32,
    lives: u8,
    status: SessionStatus,
    start_lives: u8,
    win_score: u32,
}

impl GameSession {
    pub fn new(start_lives: u8, win_score: u32) -> Self {
        Self {
            score: 0,
            lives: start_lives,
            status: SessionStatus::NotStarted,
            start_lives,
            win_score,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Either terminal state
    pub fn is_over(&self) -> bool {
        matches!(self.status, SessionStatus::GameOver | SessionStatus::Won)
    }

    /// Add to the score. Valid only while Running; crossing the win
    /// threshold transitions to Won exactly once.
    pub fn add_score(&mut self, n: u32) -> Option<SessionChange> {
        if !self.is_running() {
            log::debug!("ignoring score while {:?}", self.status);
            return None;
        }
        self.score += n;
        if self.score >= self.win_score {
            self.status = SessionStatus::Won;
            Some(SessionChange::Won { score: self.score })
        } else {
            Some(SessionChange::ScoreChanged { score: self.score })
        }
    }

    /// Lose one life. Valid only while Running; reaching zero transitions
    /// to GameOver exactly once.
    pub fn lose_life(&mut self) -> Option<SessionChange> {
        if !self.is_running() {
            log::debug!("ignoring life loss while {:?}", self.status);
            return None;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.status = SessionStatus::GameOver;
            Some(SessionChange::GameOver)
        } else {
            Some(SessionChange::LifeLost {
                remaining: self.lives,
            })
        }
    }

    /// Back to a fresh Running session
    pub fn reset(&mut self) {
        self.score = 0;
        self.lives = self.start_lives;
        self.status = SessionStatus::Running;
    }
}
