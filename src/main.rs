//! Roombat entry point
//!
//! Headless demo: drives the game core against a scripted hand swing and a
//! toy physics host. The host stands in for the real collision engine and
//! presentation layer — it applies the engine's command stream, integrates
//! ball motion, and reports contacts back, which is exactly the contract a
//! production embedding follows.

use std::collections::{HashMap, HashSet};

use glam::{Quat, Vec3};

use roombat::core::{
    AnchorEvent, AnchorEventKind, AnchorId, BodyId, BodyMode, Command, GameEngine, HandJoint,
    HandSample, Handedness, MeshSnapshot, ShapeDesc,
};
use roombat::{Pose, Settings, Tuning};

const DT: f32 = 1.0 / 90.0;
const GRAVITY: f32 = -9.81;
const DEMO_SECONDS: f32 = 40.0;

/// One body mirrored from the engine's command stream
struct HostBody {
    mode: BodyMode,
    shape: ShapeDesc,
    position: Vec3,
    velocity: Vec3,
    collidable: bool,
}

impl HostBody {
    /// Contact radius for the toy sphere tests; the bat capsule is
    /// approximated by its radius, meshes collide as a floor plane
    fn radius(&self) -> f32 {
        match &self.shape {
            ShapeDesc::Sphere { radius } => *radius,
            ShapeDesc::Capsule { radius, .. } => *radius,
            ShapeDesc::TriangleMesh { .. } => 0.0,
        }
    }
}

/// Minimal stand-in for the physics and presentation layers
#[derive(Default)]
struct ToyHost {
    bodies: HashMap<BodyId, HostBody>,
    /// Pairs currently in contact, for began/ended edge detection
    overlaps: HashSet<(BodyId, BodyId)>,
}

impl ToyHost {
    fn apply(&mut self, cmd: &Command) {
        match cmd {
            Command::AddBody {
                body,
                mode,
                shape,
                transform,
                ..
            } => {
                self.bodies.insert(
                    *body,
                    HostBody {
                        mode: *mode,
                        shape: shape.clone(),
                        position: transform.position,
                        velocity: Vec3::ZERO,
                        collidable: true,
                    },
                );
            }
            Command::SetBodyTransform { body, transform } => {
                if let Some(b) = self.bodies.get_mut(body) {
                    b.position = transform.position;
                }
            }
            Command::SetBodyShape { body, shape } => {
                if let Some(b) = self.bodies.get_mut(body) {
                    b.shape = shape.clone();
                }
            }
            Command::SetBodyVelocity { body, velocity } => {
                if let Some(b) = self.bodies.get_mut(body) {
                    b.velocity = *velocity;
                }
            }
            Command::SetBodyCollidable { body, collidable } => {
                if let Some(b) = self.bodies.get_mut(body) {
                    b.collidable = *collidable;
                }
            }
            Command::RemoveBody { body } => {
                self.bodies.remove(body);
                self.overlaps.retain(|(a, b)| a != body && b != body);
            }
            // Kinematic resync is implicit here; position was already set
            Command::ResyncBody { .. } => {}

            // Presentation: narrate instead of rendering
            Command::ShowBanner { text, .. } => println!("[banner] {text}"),
            Command::RemoveBanner { .. } => {}
            Command::PlaySound { cue, gain_db, .. } => {
                log::info!("playing {} at {gain_db:.1} dB", cue.asset_name());
            }
            Command::ScoreChanged(score) => println!("[score] {score}"),
            Command::LivesChanged(lives) => println!("[lives] {lives}"),
            Command::TrackingLost => println!("[tracking] hand lost, bat detached"),
            Command::SessionEnded(status) => println!("[session] ended: {status:?}"),
            Command::CelebrationBurst => println!("[fx] fireworks"),
            Command::ShowLifeLossMarker { position } => {
                log::debug!("life-loss marker at {position}");
            }
            Command::RemoveLifeLossMarker => {}
            Command::SetBallScale { scale, .. } => {
                log::debug!("ball scaling to {scale}");
            }
            Command::SetBatHand { hand } => log::info!("visible bat: {hand:?} hand"),
            Command::SetBatVisible { visible } => log::debug!("bat visible: {visible}"),
        }
    }

    /// Integrate dynamic bodies under gravity
    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.mode == BodyMode::Dynamic {
                body.velocity.y += GRAVITY * dt;
                body.position += body.velocity * dt;
            }
        }
    }

    /// New contacts since the previous step: (dynamic body, other, contact point)
    fn new_contacts(&mut self) -> Vec<(BodyId, BodyId, Vec3)> {
        let mut current = HashSet::new();
        let mut began = Vec::new();

        let ids: Vec<BodyId> = self.bodies.keys().copied().collect();
        for &a in &ids {
            let body_a = &self.bodies[&a];
            if body_a.mode != BodyMode::Dynamic || !body_a.collidable {
                continue;
            }
            for &b in &ids {
                if a == b {
                    continue;
                }
                let body_b = &self.bodies[&b];
                if !body_b.collidable {
                    continue;
                }
                let contact = match &body_b.shape {
                    // Room meshes collide as the plane they sit on
                    ShapeDesc::TriangleMesh { .. } => {
                        let floor_y = body_b.position.y;
                        (body_a.position.y - body_a.radius() <= floor_y).then(|| {
                            Vec3::new(body_a.position.x, floor_y, body_a.position.z)
                        })
                    }
                    _ => {
                        let gap = body_a.position.distance(body_b.position);
                        (gap <= body_a.radius() + body_b.radius())
                            .then(|| (body_a.position + body_b.position) * 0.5)
                    }
                };
                if let Some(point) = contact {
                    current.insert((a, b));
                    if !self.overlaps.contains(&(a, b)) {
                        began.push((a, b, point));
                    }
                }
            }
        }
        self.overlaps = current;
        began
    }
}

fn floor_anchor() -> AnchorEvent {
    AnchorEvent {
        anchor: AnchorId(1),
        kind: AnchorEventKind::Added,
        transform: Pose::IDENTITY,
        mesh: MeshSnapshot {
            vertices: vec![
                Vec3::new(-4.0, 0.0, -4.0),
                Vec3::new(4.0, 0.0, -4.0),
                Vec3::new(4.0, 0.0, 4.0),
                Vec3::new(-4.0, 0.0, 4.0),
            ],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        },
    }
}

/// Scripted hand: a slow figure-eight swing in front of the user
fn hand_sample(t: f32) -> HandSample {
    let position = Vec3::new(
        0.3 * (t * 2.2).cos(),
        1.1 + 0.25 * (t * 4.4).sin(),
        -0.4 + 0.1 * (t * 2.2).sin(),
    );
    HandSample {
        pose: Pose::new(position, Quat::from_rotation_z(0.4 * (t * 2.2).sin())),
        tracked: true,
        chirality: Handedness::Right,
        joint: HandJoint::MiddleFingerMetacarpal,
    }
}

fn pump(engine: &mut GameEngine, host: &mut ToyHost) {
    for cmd in engine.drain_commands() {
        host.apply(&cmd);
    }
}

fn main() {
    env_logger::init();

    let mut engine = GameEngine::new(42, Tuning::default(), Settings::default());
    let mut host = ToyHost::default();
    pump(&mut engine, &mut host);

    engine.restart();
    engine.apply_anchor_event(floor_anchor());
    pump(&mut engine, &mut host);

    let mut t = 0.0_f32;
    let mut restarted = false;
    while t < DEMO_SECONDS {
        t += DT;
        engine.submit_pose(hand_sample(t));
        engine.tick(DT);
        pump(&mut engine, &mut host);

        host.step(DT);
        for (a, b, contact) in host.new_contacts() {
            engine.on_collision_began(a, b, contact);
        }
        pump(&mut engine, &mut host);

        // Show the reset path once, then let the session run out
        if engine.session().is_over() && !restarted {
            restarted = true;
            println!("[demo] restarting once to exercise reset");
            engine.restart();
            engine.apply_anchor_event(floor_anchor());
            pump(&mut engine, &mut host);
        }
    }

    let session = engine.session();
    println!(
        "[demo] finished: status {:?}, score {}, lives {}",
        session.status(),
        session.score(),
        session.lives()
    );
}
