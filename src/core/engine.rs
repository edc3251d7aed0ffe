//! The game engine: the single logical execution context
//!
//! All shared mutable state — the active-ball slot, the anchor registry,
//! the session — lives here behind `&mut self`. Hosts marshal their
//! asynchronous provider callbacks onto one context and feed them in
//! arrival order; deferred work runs through the scheduler when `tick`
//! advances the clock. Cross-stream ordering (a collision racing a timeout)
//! is deliberately not assumed anywhere: every deferred task re-validates
//! session epoch and ball identity before acting.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::Pose;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::settings::Settings;
use crate::tuning::Tuning;

use super::anchors::{AnchorEvent, AnchorEventKind, AnchorRegistry};
use super::ball::{Ball, BallController, BallId, BallStatus, SpawnRejected};
use super::events::{BannerKind, BodyId, BodyMode, Command, Material, ShapeDesc};
use super::pose::{HandJoint, HandSample, PoseFilter, grip_offset};
use super::resolver::{self, Resolution};
use super::scheduler::{Scheduler, Task, TaskKind};
use super::session::{GameSession, SessionChange, SessionStatus};

/// Out-of-band notifications from the tracking providers
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    AuthorizationChanged { denied: bool },
    StateChanged {
        description: String,
        error: Option<String>,
    },
}

/// The one live bat: pose filter plus its kinematic collision body
#[derive(Debug)]
struct BatRig {
    filter: PoseFilter,
    body: BodyId,
    /// Visible and colliding; cleared on tracking loss
    attached: bool,
    /// A tracked sample arrived since the last watchdog check
    seen_this_window: bool,
    tracking_enabled: bool,
}

/// Owner of all game state; drives the command queue
pub struct GameEngine {
    tuning: Tuning,
    settings: Settings,
    clock: f32,
    /// Bumped on restart; stale scheduled tasks die by comparison
    epoch: u32,
    next_body: u32,
    session: GameSession,
    bat: BatRig,
    balls: BallController,
    anchors: AnchorRegistry,
    scheduler: Scheduler,
    rng: Pcg32,
    commands: Vec<Command>,
    /// Throttles the win celebration to a single burst per session
    celebration_fired: bool,
    last_error: Option<String>,
}

impl GameEngine {
    pub fn new(seed: u64, tuning: Tuning, settings: Settings) -> Self {
        let session = GameSession::new(tuning.start_lives, tuning.win_score);
        let filter = PoseFilter::new(tuning.smoothing_factor, tuning.glitch_distance);
        let grace = tuning.tracking_grace;
        let mut engine = Self {
            tuning,
            settings,
            clock: 0.0,
            epoch: 0,
            next_body: 0,
            session,
            bat: BatRig {
                filter,
                body: BodyId(0),
                attached: true,
                seen_this_window: false,
                tracking_enabled: true,
            },
            balls: BallController::default(),
            anchors: AnchorRegistry::default(),
            scheduler: Scheduler::default(),
            rng: Pcg32::seed_from_u64(seed),
            commands: Vec::new(),
            celebration_fired: false,
            last_error: None,
        };
        engine.bat.body = engine.alloc_body();
        engine.setup_bat();
        engine.scheduler.schedule(grace, 0, TaskKind::TrackingWatchdog);
        engine
    }

    // --- accessors ---

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn active_ball(&self) -> Option<&Ball> {
        self.balls.active()
    }

    pub fn bat_body(&self) -> BodyId {
        self.bat.body
    }

    /// Current smoothed bat pose, if any sample has been accepted
    pub fn bat_pose(&self) -> Option<Pose> {
        self.bat.filter.pose()
    }

    pub fn anchors(&self) -> &AnchorRegistry {
        &self.anchors
    }

    /// Readable provider fault, for the presentation layer to display
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Take the queued commands; the host applies them in order
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    // --- clock ---

    /// Advance the engine clock and run every task that came due.
    ///
    /// Tasks scheduled by other tasks for the same instant run in the same
    /// call, after everything already queued ahead of them.
    pub fn tick(&mut self, dt: f32) {
        self.clock += dt;
        loop {
            let due = self.scheduler.drain_due(self.clock, self.epoch);
            if due.is_empty() {
                break;
            }
            for task in due {
                self.run_task(task);
            }
        }
    }

    // --- pose stream ---

    /// Feed one raw hand sample, in arrival order.
    pub fn submit_pose(&mut self, sample: HandSample) {
        if !sample.tracked {
            return;
        }
        self.bat.seen_this_window = true;
        if sample.chirality != self.settings.handedness() {
            return;
        }
        if sample.joint != HandJoint::MiddleFingerMetacarpal {
            return;
        }

        let target = sample.pose.transform(&grip_offset(sample.chirality));
        let Some(pose) = self.bat.filter.update(target) else {
            return;
        };

        if !self.bat.attached {
            self.bat.attached = true;
            self.commands.push(Command::SetBatVisible { visible: true });
            self.commands.push(Command::SetBodyCollidable {
                body: self.bat.body,
                collidable: true,
            });
        }
        self.commands.push(Command::SetBodyTransform {
            body: self.bat.body,
            transform: pose,
        });
        // The physics engine treats the bat as kinematic; it must re-read
        // the transform or collisions run against the stale one.
        self.commands.push(Command::ResyncBody {
            body: self.bat.body,
        });
    }

    /// Enable or disable tracking entirely (leaving the game)
    pub fn set_tracking_enabled(&mut self, enabled: bool) {
        self.bat.tracking_enabled = enabled;
    }

    /// Switch handedness; resets pose smoothing and swaps the visible bat
    pub fn set_left_handed(&mut self, left: bool) {
        if self.settings.left_handed == left {
            return;
        }
        self.settings.left_handed = left;
        self.bat.filter.reset();
        self.commands.push(Command::SetBatHand {
            hand: self.settings.handedness(),
        });
    }

    // --- geometry stream ---

    /// Apply one mesh-anchor delta, in arrival order.
    pub fn apply_anchor_event(&mut self, event: AnchorEvent) {
        match event.kind {
            AnchorEventKind::Added => {
                let body = self.alloc_body();
                self.anchors.add(
                    event.anchor,
                    body,
                    event.transform,
                    &event.mesh,
                    &mut self.commands,
                );
            }
            AnchorEventKind::Updated => {
                self.anchors
                    .update(event.anchor, event.transform, &event.mesh, &mut self.commands);
            }
            AnchorEventKind::Removed => {
                self.anchors.remove(event.anchor, &mut self.commands);
            }
        }
    }

    // --- provider status ---

    pub fn provider_event(&mut self, event: ProviderEvent) {
        match event {
            ProviderEvent::AuthorizationChanged { denied } => {
                log::info!("tracking authorization changed (denied: {denied})");
                if denied {
                    self.last_error = Some("Tracking authorization denied".into());
                }
            }
            ProviderEvent::StateChanged { description, error } => {
                log::info!("provider state changed: {description}");
                if let Some(error) = error {
                    log::error!("provider reached an error state: {error}");
                    self.last_error = Some(error);
                }
            }
        }
    }

    // --- collisions ---

    /// A collision-began report from the physics engine. `contact` is the
    /// approximate contact point, used to place the life-loss marker.
    pub fn on_collision_began(&mut self, a: BodyId, b: BodyId, contact: Vec3) {
        // Terminal states cancel the collision subscriptions; in-flight
        // despawn chains still quiesce through the scheduler.
        if self.session.is_over() {
            return;
        }
        let Some((ball_id, ball_body)) = self.balls.active().map(|b| (b.id, b.body)) else {
            return;
        };
        let other = if a == ball_body {
            b
        } else if b == ball_body {
            a
        } else {
            return;
        };

        let class = resolver::classify(other, self.bat.body, &self.anchors);
        let Some(ball) = self.balls.active_mut() else {
            return;
        };
        match resolver::resolve(ball, class) {
            Resolution::Ignored => {}
            Resolution::BatHit => self.resolve_bat_hit(ball_id),
            Resolution::RoomHit => self.resolve_room_hit(ball_id, ball_body, contact),
        }
    }

    pub fn on_collision_ended(&mut self, a: BodyId, b: BodyId) {
        log::debug!("collision ended between {a:?} and {b:?}");
    }

    // --- spawning ---

    /// Spawn a ball at `position`; rejected while one is active or the
    /// session is in a terminal state.
    pub fn spawn(&mut self, position: Vec3) -> Result<BallId, SpawnRejected> {
        self.spawn_ball(position, false, self.clock)
    }

    /// Spawn bypassing the active-ball and GameOver gates (explicit restart)
    pub fn force_spawn(&mut self, position: Vec3) -> Result<BallId, SpawnRejected> {
        self.spawn_ball(position, true, self.clock)
    }

    /// `at` is the logical spawn time: the current clock for direct calls,
    /// the nominal fire time for scheduler-driven spawns, so that delays
    /// chain without drifting when ticks are coarse.
    fn spawn_ball(
        &mut self,
        position: Vec3,
        forced: bool,
        at: f32,
    ) -> Result<BallId, SpawnRejected> {
        if forced {
            if let Some(old) = self.balls.take_active() {
                self.commands.push(Command::RemoveBody { body: old.body });
            }
        }
        let body = self.alloc_body();
        let id = self
            .balls
            .try_spawn(self.session.status(), forced, body, position)?;
        log::info!("spawning ball {id:?} at {position}");
        self.commands.push(Command::AddBody {
            body,
            mode: BodyMode::Dynamic,
            shape: ShapeDesc::Sphere {
                radius: BALL_RADIUS,
            },
            transform: Pose::from_position(position),
            mass: BALL_MASS,
            material: Some(Material {
                friction: BALL_FRICTION,
                restitution: BALL_RESTITUTION,
            }),
        });
        // Launch velocity must land strictly after the body registration
        // above; a deferred task keeps that ordering in the command stream.
        self.scheduler
            .schedule(at, self.epoch, TaskKind::Launch { ball: id });
        self.scheduler.schedule(
            at + self.tuning.ball_timeout,
            self.epoch,
            TaskKind::BallTimeout { ball: id },
        );
        Ok(id)
    }

    // --- session control ---

    /// Full restart: new epoch, fresh session, cleared scene, countdown,
    /// then a forced first spawn. No partial state is observable between
    /// the commands this emits.
    pub fn restart(&mut self) {
        log::info!("restarting session");
        self.epoch += 1;
        self.scheduler.clear();

        if let Some(ball) = self.balls.take_active() {
            self.commands.push(Command::RemoveBody { body: ball.body });
        }
        self.anchors.clear(&mut self.commands);

        self.bat.filter.reset();
        self.bat.attached = true;
        self.bat.seen_this_window = false;
        self.commands.push(Command::SetBodyTransform {
            body: self.bat.body,
            transform: Pose::from_position(Vec3::new(0.0, BAT_REST_HEIGHT, 0.0)),
        });
        self.commands.push(Command::SetBodyCollidable {
            body: self.bat.body,
            collidable: true,
        });
        self.commands.push(Command::SetBatVisible { visible: true });
        self.commands.push(Command::SetBatHand {
            hand: self.settings.handedness(),
        });

        for kind in [BannerKind::Countdown, BannerKind::GameOver, BannerKind::GameWon] {
            self.commands.push(Command::RemoveBanner { kind });
        }
        self.commands.push(Command::RemoveLifeLossMarker);

        self.celebration_fired = false;
        self.session.reset();
        self.commands.push(Command::ScoreChanged(0));
        self.commands
            .push(Command::LivesChanged(self.session.lives()));

        self.scheduler.schedule(
            self.clock + self.tuning.tracking_grace,
            self.epoch,
            TaskKind::TrackingWatchdog,
        );
        self.scheduler.schedule(
            self.clock,
            self.epoch,
            TaskKind::Countdown {
                remaining: self.tuning.countdown_start,
            },
        );
    }

    // --- internals ---

    fn alloc_body(&mut self) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;
        id
    }

    fn setup_bat(&mut self) {
        self.commands.push(Command::AddBody {
            body: self.bat.body,
            mode: BodyMode::Kinematic,
            shape: ShapeDesc::Capsule {
                height: BAT_CAPSULE_HEIGHT,
                radius: BAT_CAPSULE_RADIUS,
            },
            // Rest transform sits in front of the user until the first
            // hand sample lands
            transform: Pose::from_position(Vec3::new(0.0, BAT_REST_HEIGHT, 0.0)),
            mass: BAT_MASS,
            material: Some(Material {
                friction: BAT_FRICTION,
                restitution: BAT_RESTITUTION,
            }),
        });
        self.commands.push(Command::SetBatHand {
            hand: self.settings.handedness(),
        });
        self.commands.push(Command::SetBatVisible { visible: true });
    }

    fn play_sound(&mut self, cue: SoundCue, attach_to: Option<BodyId>) {
        let Some(gain_db) = self.settings.cue_gain_db(cue) else {
            return;
        };
        self.commands.push(Command::PlaySound {
            cue,
            gain_db,
            attach_to,
        });
    }

    fn random_spawn_position(&mut self) -> Vec3 {
        let min = self.tuning.spawn_min;
        let max = self.tuning.spawn_max;
        Vec3::new(
            self.rng.random_range(min[0]..=max[0]),
            self.rng.random_range(min[1]..=max[1]),
            self.rng.random_range(min[2]..=max[2]),
        )
    }

    fn publish_change(&mut self, change: SessionChange) {
        match change {
            SessionChange::ScoreChanged { score } => {
                self.commands.push(Command::ScoreChanged(score));
            }
            SessionChange::Won { score } => {
                log::info!("game won at score {score}");
                self.commands.push(Command::ScoreChanged(score));
                self.commands.push(Command::SessionEnded(SessionStatus::Won));
                if !self.celebration_fired {
                    self.celebration_fired = true;
                    self.scheduler.schedule(
                        self.clock + CELEBRATION_DELAY,
                        self.epoch,
                        TaskKind::CelebrationBurst,
                    );
                }
                // Banner and fanfare land slightly later to spread the load
                self.scheduler.schedule(
                    self.clock + WIN_BANNER_DELAY,
                    self.epoch,
                    TaskKind::WinBanner,
                );
            }
            SessionChange::LifeLost { remaining } => {
                self.commands.push(Command::LivesChanged(remaining));
            }
            SessionChange::GameOver => {
                log::info!("game over");
                self.commands.push(Command::LivesChanged(0));
                self.commands
                    .push(Command::SessionEnded(SessionStatus::GameOver));
                self.play_sound(SoundCue::GameOver, None);
                self.commands.push(Command::ShowBanner {
                    kind: BannerKind::GameOver,
                    text: "Game Over".into(),
                });
            }
        }
    }

    fn resolve_bat_hit(&mut self, ball: BallId) {
        if let Some(change) = self.session.add_score(1) {
            self.publish_change(change);
        }
        let bat = self.bat.body;
        self.play_sound(SoundCue::BatImpact, Some(bat));
        self.begin_despawn_animation(ball);
    }

    fn resolve_room_hit(&mut self, ball: BallId, ball_body: BodyId, contact: Vec3) {
        log::info!("ball {ball:?} struck the room");
        if let Some(change) = self.session.lose_life() {
            self.publish_change(change);
        }
        self.play_sound(SoundCue::RoomImpact, Some(ball_body));
        self.commands.push(Command::ShowLifeLossMarker {
            position: contact + Vec3::Y * MARKER_RAISE,
        });
        self.scheduler.schedule(
            self.clock + MARKER_LIFETIME,
            self.epoch,
            TaskKind::RemoveMarker,
        );
        self.begin_despawn_animation(ball);
    }

    /// Swell briefly, then shrink away, then remove; each stage is its own
    /// task so a reset in between cancels the rest of the chain.
    fn begin_despawn_animation(&mut self, ball: BallId) {
        self.commands.push(Command::SetBallScale {
            ball,
            scale: SWELL_SCALE,
            duration: SWELL_DURATION,
        });
        self.scheduler.schedule(
            self.clock + SWELL_DURATION,
            self.epoch,
            TaskKind::ShrinkBall { ball },
        );
    }

    /// Follow-up tasks are scheduled from the task's nominal fire time, not
    /// the clock, so chains keep their spacing under coarse ticks.
    fn run_task(&mut self, task: Task) {
        let at = task.fire_at;
        match task.kind {
            TaskKind::Launch { ball } => self.launch_ball(ball),
            TaskKind::BallTimeout { ball } => self.timeout_ball(ball, at),
            TaskKind::Respawn => self.respawn(at),
            TaskKind::ShrinkBall { ball } => {
                let still_resolving = self
                    .balls
                    .active()
                    .is_some_and(|b| b.id == ball && b.status == BallStatus::Resolving);
                if !still_resolving {
                    return;
                }
                self.commands.push(Command::SetBallScale {
                    ball,
                    scale: 0.0,
                    duration: SHRINK_DURATION,
                });
                self.scheduler.schedule(
                    at + SHRINK_DURATION,
                    self.epoch,
                    TaskKind::RemoveBall { ball },
                );
            }
            TaskKind::RemoveBall { ball } => {
                if let Some(done) = self.balls.clear_if(ball) {
                    self.commands.push(Command::RemoveBody { body: done.body });
                    self.scheduler.schedule(
                        at + self.tuning.resolve_respawn_delay,
                        self.epoch,
                        TaskKind::Respawn,
                    );
                }
            }
            TaskKind::RemoveMarker => {
                self.commands.push(Command::RemoveLifeLossMarker);
            }
            TaskKind::Countdown { remaining } => self.countdown_step(remaining, at),
            TaskKind::CelebrationBurst => {
                self.commands.push(Command::CelebrationBurst);
            }
            TaskKind::WinBanner => {
                self.commands.push(Command::ShowBanner {
                    kind: BannerKind::GameWon,
                    text: "Game Won!".into(),
                });
                self.play_sound(SoundCue::GameWon, None);
            }
            TaskKind::TrackingWatchdog => self.tracking_watchdog(at),
        }
    }

    fn launch_ball(&mut self, ball: BallId) {
        let Some(active) = self.balls.active() else {
            return;
        };
        if active.id != ball || active.status != BallStatus::Flying {
            return;
        }
        let body = active.body;
        let origin = active.spawn_position;

        let bat_position = self
            .bat
            .filter
            .pose()
            .map(|p| p.position)
            .unwrap_or(Vec3::new(0.0, BAT_REST_HEIGHT, 0.0));
        let direction = (bat_position - origin).normalize_or_zero();
        if direction == Vec3::ZERO {
            log::warn!("ball {ball:?} spawned on top of the bat; leaving it to gravity");
            return;
        }
        let speed = self
            .rng
            .random_range(self.tuning.launch_speed_min..=self.tuning.launch_speed_max);
        self.commands.push(Command::SetBodyVelocity {
            body,
            velocity: direction * speed,
        });
    }

    fn timeout_ball(&mut self, ball: BallId, at: f32) {
        if self.session.status() == SessionStatus::GameOver {
            log::debug!("skipping timeout cleanup: game over");
            return;
        }
        let still_flying = self
            .balls
            .active()
            .is_some_and(|b| b.id == ball && b.status == BallStatus::Flying);
        if !still_flying {
            return;
        }
        // clear_if only fails if the slot changed between the checks above,
        // which cannot happen on a single context
        let Some(done) = self.balls.clear_if(ball) else {
            return;
        };
        log::info!("ball {ball:?} timed out; removing and scheduling the next");
        self.commands.push(Command::RemoveBody { body: done.body });
        self.scheduler.schedule(
            at + self.tuning.timeout_respawn_delay,
            self.epoch,
            TaskKind::Respawn,
        );
    }

    fn respawn(&mut self, at: f32) {
        if self.session.is_over() {
            log::debug!("skipping spawn: session {:?}", self.session.status());
            return;
        }
        if self.balls.active().is_some() {
            log::debug!("a ball is already active; waiting");
            return;
        }
        let position = self.random_spawn_position();
        if let Err(rejected) = self.spawn_ball(position, false, at) {
            log::debug!("respawn rejected: {rejected:?}");
        }
    }

    fn countdown_step(&mut self, remaining: u8, at: f32) {
        if remaining > 0 {
            self.commands.push(Command::ShowBanner {
                kind: BannerKind::Countdown,
                text: format!("Ball dropping in {remaining}..."),
            });
            self.scheduler.schedule(
                at + COUNTDOWN_INTERVAL,
                self.epoch,
                TaskKind::Countdown {
                    remaining: remaining - 1,
                },
            );
        } else {
            self.commands.push(Command::RemoveBanner {
                kind: BannerKind::Countdown,
            });
            let position = self.random_spawn_position();
            if let Err(rejected) = self.spawn_ball(position, true, at) {
                log::warn!("forced spawn rejected: {rejected:?}");
            }
        }
    }

    fn tracking_watchdog(&mut self, at: f32) {
        // Always re-arm; the watchdog outlives individual sessions
        self.scheduler.schedule(
            at + self.tuning.tracking_grace,
            self.epoch,
            TaskKind::TrackingWatchdog,
        );
        if !self.bat.tracking_enabled || self.session.status() == SessionStatus::GameOver {
            return;
        }
        if !self.bat.seen_this_window && self.bat.attached {
            log::warn!("hand lost; detaching bat");
            self.bat.attached = false;
            self.commands.push(Command::SetBatVisible { visible: false });
            self.commands.push(Command::SetBodyCollidable {
                body: self.bat.body,
                collidable: false,
            });
            self.commands.push(Command::TrackingLost);
        }
        self.bat.seen_this_window = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::anchors::AnchorId;
    use crate::core::anchors::MeshSnapshot;
    use crate::core::pose::Handedness;

    fn engine() -> GameEngine {
        let mut e = GameEngine::new(7, Tuning::default(), Settings::default());
        e.drain_commands();
        e
    }

    /// Run the restart countdown through the forced first spawn
    fn run_countdown(e: &mut GameEngine) -> Vec<Command> {
        e.tick(3.05);
        e.drain_commands()
    }

    fn floor_added() -> AnchorEvent {
        AnchorEvent {
            anchor: AnchorId(100),
            kind: AnchorEventKind::Added,
            transform: Pose::IDENTITY,
            mesh: MeshSnapshot {
                vertices: vec![
                    Vec3::new(-3.0, 0.0, -3.0),
                    Vec3::new(3.0, 0.0, -3.0),
                    Vec3::new(3.0, 0.0, 3.0),
                    Vec3::new(-3.0, 0.0, 3.0),
                ],
                triangles: vec![[0, 1, 2], [0, 2, 3]],
            },
        }
    }

    fn static_body_in(cmds: &[Command]) -> BodyId {
        cmds.iter()
            .find_map(|c| match c {
                Command::AddBody {
                    body,
                    mode: BodyMode::Static,
                    ..
                } => Some(*body),
                _ => None,
            })
            .expect("static body registered")
    }

    fn tracked_sample(position: Vec3) -> HandSample {
        HandSample {
            pose: Pose::from_position(position),
            tracked: true,
            chirality: Handedness::Right,
            joint: HandJoint::MiddleFingerMetacarpal,
        }
    }

    #[test]
    fn test_countdown_then_forced_first_spawn() {
        let mut e = engine();
        e.restart();
        let cmds = run_countdown(&mut e);

        let countdowns = cmds
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Command::ShowBanner {
                        kind: BannerKind::Countdown,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(countdowns, 3);
        let ball = e.active_ball().expect("first ball spawned");
        assert_eq!(ball.status, BallStatus::Flying);
    }

    #[test]
    fn test_launch_velocity_follows_body_registration() {
        let mut e = engine();
        e.restart();
        let cmds = run_countdown(&mut e);

        let add = cmds
            .iter()
            .position(|c| {
                matches!(
                    c,
                    Command::AddBody {
                        mode: BodyMode::Dynamic,
                        ..
                    }
                )
            })
            .expect("ball body registered");
        let launch = cmds
            .iter()
            .position(|c| matches!(c, Command::SetBodyVelocity { .. }))
            .expect("launch velocity applied");
        assert!(add < launch);

        let Command::SetBodyVelocity { velocity, .. } = &cmds[launch] else {
            unreachable!()
        };
        let speed = velocity.length();
        assert!((0.5..=1.2).contains(&speed), "speed {speed} out of range");
    }

    #[test]
    fn test_second_spawn_rejected_while_ball_active() {
        let mut e = engine();
        e.restart();
        run_countdown(&mut e);
        assert_eq!(e.spawn(Vec3::Y), Err(SpawnRejected::BallActive));
    }

    #[test]
    fn test_bat_hit_scores_and_wins() {
        let mut e = engine();
        e.restart();
        run_countdown(&mut e);

        let ball_body = e.active_ball().unwrap().body;
        e.on_collision_began(ball_body, e.bat_body(), Vec3::ZERO);
        // A duplicate report for the same ball must change nothing
        e.on_collision_began(ball_body, e.bat_body(), Vec3::ZERO);

        assert_eq!(e.session().score(), 1);
        assert_eq!(e.session().status(), SessionStatus::Won);
        assert_eq!(e.active_ball().unwrap().status, BallStatus::Resolving);

        let cmds = e.drain_commands();
        assert!(cmds.contains(&Command::ScoreChanged(1)));
        assert!(cmds.contains(&Command::SessionEnded(SessionStatus::Won)));
        assert!(cmds.iter().any(|c| matches!(
            c,
            Command::PlaySound {
                cue: SoundCue::BatImpact,
                ..
            }
        )));
        // Nothing has charged a life
        assert_eq!(e.session().lives(), Tuning::default().start_lives);

        // Further spawns are rejected for good
        assert_eq!(e.spawn(Vec3::Y), Err(SpawnRejected::Won));
        assert_eq!(e.force_spawn(Vec3::Y), Err(SpawnRejected::Won));

        // Celebration fires once, banner follows, ball despawns
        e.tick(0.5);
        let cmds = e.drain_commands();
        assert_eq!(
            cmds.iter()
                .filter(|c| matches!(c, Command::CelebrationBurst))
                .count(),
            1
        );
        assert!(cmds.iter().any(|c| matches!(
            c,
            Command::ShowBanner {
                kind: BannerKind::GameWon,
                ..
            }
        )));
        assert!(e.active_ball().is_none());

        // The pending respawn cooldown quiesces without producing a ball
        e.tick(5.0);
        let cmds = e.drain_commands();
        assert!(
            cmds.iter()
                .all(|c| !matches!(c, Command::AddBody { .. }))
        );
        assert!(e.active_ball().is_none());
    }

    #[test]
    fn test_five_room_misses_end_the_game_once() {
        let mut e = engine();
        e.restart();
        e.apply_anchor_event(floor_added());
        let cmds = run_countdown(&mut e);
        let floor = static_body_in(&cmds);

        let mut endings = 0;
        for expected_lives in (0..5u8).rev() {
            let ball_body = e.active_ball().expect("ball in play").body;
            e.on_collision_began(ball_body, floor, Vec3::new(0.0, 0.0, -1.0));
            // Simultaneous contact against the same room geometry
            e.on_collision_began(ball_body, floor, Vec3::new(0.1, 0.0, -1.0));

            assert_eq!(e.session().lives(), expected_lives);
            let cmds = e.drain_commands();
            endings += cmds
                .iter()
                .filter(|c| matches!(c, Command::SessionEnded(SessionStatus::GameOver)))
                .count();
            assert!(cmds.iter().any(|c| matches!(
                c,
                Command::ShowLifeLossMarker { .. }
            )));

            // Despawn animation plus respawn cooldown
            e.tick(2.4);
            e.drain_commands();
        }

        assert_eq!(endings, 1);
        assert_eq!(e.session().status(), SessionStatus::GameOver);
        assert_eq!(e.session().lives(), 0);
        assert_eq!(e.session().score(), 0);
        // GameOver stopped the respawn chain
        assert!(e.active_ball().is_none());
        e.tick(5.0);
        assert!(e.active_ball().is_none());
    }

    #[test]
    fn test_timeout_despawns_without_scoring() {
        let mut e = engine();
        e.restart();
        run_countdown(&mut e);
        let first = e.active_ball().unwrap().id;

        // Past the flight timeout, before the respawn delay
        e.tick(2.1);
        let cmds = e.drain_commands();
        assert!(e.active_ball().is_none());
        assert!(cmds.iter().any(|c| matches!(c, Command::RemoveBody { .. })));
        assert!(
            cmds.iter().all(|c| !matches!(
                c,
                Command::ScoreChanged(_) | Command::LivesChanged(_)
            ))
        );
        assert_eq!(e.session().score(), 0);
        assert_eq!(e.session().lives(), Tuning::default().start_lives);

        // Respawn comes half a second after the timeout, not sooner
        e.tick(0.3);
        assert!(e.active_ball().is_none());
        e.tick(0.3);
        let ball = e.active_ball().expect("respawned");
        assert_ne!(ball.id, first);
        assert_eq!(ball.status, BallStatus::Flying);
    }

    #[test]
    fn test_collision_with_unregistered_body_is_ignored() {
        let mut e = engine();
        e.restart();
        run_countdown(&mut e);

        let ball_body = e.active_ball().unwrap().body;
        e.on_collision_began(ball_body, BodyId(999), Vec3::ZERO);
        assert_eq!(e.session().score(), 0);
        assert_eq!(e.session().lives(), Tuning::default().start_lives);
        assert_eq!(e.active_ball().unwrap().status, BallStatus::Flying);
    }

    #[test]
    fn test_restart_clears_everything() {
        let mut e = engine();
        e.restart();
        e.apply_anchor_event(floor_added());
        run_countdown(&mut e);
        assert!(e.active_ball().is_some());

        e.restart();
        assert_eq!(e.session().score(), 0);
        assert_eq!(e.session().lives(), Tuning::default().start_lives);
        assert_eq!(e.session().status(), SessionStatus::Running);
        assert!(e.active_ball().is_none());
        assert!(e.anchors().is_empty());

        let cmds = e.drain_commands();
        assert!(cmds.contains(&Command::ScoreChanged(0)));
        assert!(cmds.contains(&Command::LivesChanged(5)));
        assert!(cmds.contains(&Command::RemoveLifeLossMarker));
        for kind in [BannerKind::Countdown, BannerKind::GameOver, BannerKind::GameWon] {
            assert!(cmds.contains(&Command::RemoveBanner { kind }));
        }

        // Stale tasks from the first session (timeout, respawn) never act:
        // nothing spawns until the new countdown finishes
        e.tick(0.6);
        assert!(e.active_ball().is_none());
        e.tick(2.5);
        assert!(e.active_ball().is_some());
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut e = engine();
        e.restart();
        e.apply_anchor_event(floor_added());
        let cmds = run_countdown(&mut e);
        let floor = static_body_in(&cmds);

        for _ in 0..5 {
            let ball_body = e.active_ball().expect("ball in play").body;
            e.on_collision_began(ball_body, floor, Vec3::ZERO);
            e.tick(2.4);
        }
        assert_eq!(e.session().status(), SessionStatus::GameOver);

        e.drain_commands();
        e.restart();
        run_countdown(&mut e);
        assert_eq!(e.session().status(), SessionStatus::Running);
        assert!(e.active_ball().is_some());
    }

    #[test]
    fn test_pose_updates_drive_kinematic_resync() {
        let mut e = engine();
        let sample = tracked_sample(Vec3::new(0.1, 1.2, -0.3));
        e.submit_pose(sample);

        let cmds = e.drain_commands();
        let expected = sample
            .pose
            .transform(&grip_offset(Handedness::Right));
        assert_eq!(
            cmds,
            vec![
                Command::SetBodyTransform {
                    body: e.bat_body(),
                    transform: expected,
                },
                Command::ResyncBody { body: e.bat_body() },
            ]
        );
        assert_eq!(e.bat_pose(), Some(expected));
    }

    #[test]
    fn test_untracked_and_mismatched_samples_are_skipped() {
        let mut e = engine();

        let mut untracked = tracked_sample(Vec3::Y);
        untracked.tracked = false;
        e.submit_pose(untracked);

        let mut wrong_hand = tracked_sample(Vec3::Y);
        wrong_hand.chirality = Handedness::Left;
        e.submit_pose(wrong_hand);

        let mut wrong_joint = tracked_sample(Vec3::Y);
        wrong_joint.joint = HandJoint::Wrist;
        e.submit_pose(wrong_joint);

        assert!(e.drain_commands().is_empty());
        assert!(e.bat_pose().is_none());
    }

    #[test]
    fn test_watchdog_detaches_and_sample_reattaches() {
        let mut e = engine();

        // No samples for a full grace window
        e.tick(2.05);
        let cmds = e.drain_commands();
        assert!(cmds.contains(&Command::TrackingLost));
        assert!(cmds.contains(&Command::SetBatVisible { visible: false }));
        assert!(cmds.contains(&Command::SetBodyCollidable {
            body: e.bat_body(),
            collidable: false,
        }));

        // The next accepted sample re-attaches the bat
        e.submit_pose(tracked_sample(Vec3::new(0.0, 1.0, -0.2)));
        let cmds = e.drain_commands();
        assert!(cmds.contains(&Command::SetBatVisible { visible: true }));
        assert!(cmds.contains(&Command::SetBodyCollidable {
            body: e.bat_body(),
            collidable: true,
        }));

        // A sample inside the next window keeps it attached
        e.tick(2.1);
        assert!(!e.drain_commands().contains(&Command::TrackingLost));

        // Another silent window detaches again
        e.tick(2.1);
        assert!(e.drain_commands().contains(&Command::TrackingLost));
    }

    #[test]
    fn test_handedness_swap_resets_filter_and_swaps_bat() {
        let mut e = engine();
        e.submit_pose(tracked_sample(Vec3::Y));
        assert!(e.bat_pose().is_some());
        e.drain_commands();

        e.set_left_handed(true);
        assert!(e.bat_pose().is_none());
        let cmds = e.drain_commands();
        assert!(cmds.contains(&Command::SetBatHand {
            hand: Handedness::Left
        }));

        // Right-hand samples no longer drive the bat
        e.submit_pose(tracked_sample(Vec3::Y));
        assert!(e.bat_pose().is_none());
    }

    #[test]
    fn test_provider_fault_sets_readable_error() {
        let mut e = engine();
        assert!(e.last_error().is_none());
        e.provider_event(ProviderEvent::AuthorizationChanged { denied: true });
        assert_eq!(e.last_error(), Some("Tracking authorization denied"));

        e.provider_event(ProviderEvent::StateChanged {
            description: "hand tracking".into(),
            error: Some("provider crashed".into()),
        });
        assert_eq!(e.last_error(), Some("provider crashed"));

        // Degraded mode still runs the game
        e.restart();
        e.tick(3.05);
        assert!(e.active_ball().is_some());
    }
}
