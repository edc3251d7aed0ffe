//! Room-mesh anchor registry
//!
//! The geometry provider streams mesh-anchor deltas as the device scans the
//! surrounding room. Each accepted anchor becomes a locally owned static
//! collision body the resolver can classify ball impacts against. Room
//! reconstruction is best-effort: a mesh that fails shape synthesis is
//! skipped and coverage stays partial, which is acceptable.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;

use crate::Pose;

use super::events::{BodyId, BodyMode, Command, ShapeDesc};

/// Stable identity of an external mesh anchor, compared by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// Delta kind on the geometry provider stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorEventKind {
    Added,
    Updated,
    Removed,
}

/// Raw triangulated mesh data carried by an anchor delta
#[derive(Debug, Clone, Default)]
pub struct MeshSnapshot {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

/// One delta from the geometry provider
#[derive(Debug, Clone)]
pub struct AnchorEvent {
    pub anchor: AnchorId,
    pub kind: AnchorEventKind,
    pub transform: Pose,
    pub mesh: MeshSnapshot,
}

/// Shape synthesis failure; the anchor is skipped, never fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeError {
    EmptyMesh,
    /// Triangle index referencing a vertex past the end of the buffer
    IndexOutOfBounds { triangle: usize },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::EmptyMesh => write!(f, "mesh has no geometry"),
            ShapeError::IndexOutOfBounds { triangle } => {
                write!(f, "triangle {triangle} references a missing vertex")
            }
        }
    }
}

/// Build a static collision shape from a mesh snapshot
pub fn synthesize_shape(mesh: &MeshSnapshot) -> Result<ShapeDesc, ShapeError> {
    if mesh.vertices.is_empty() || mesh.triangles.is_empty() {
        return Err(ShapeError::EmptyMesh);
    }
    let vertex_count = mesh.vertices.len() as u32;
    for (i, tri) in mesh.triangles.iter().enumerate() {
        if tri.iter().any(|&v| v >= vertex_count) {
            return Err(ShapeError::IndexOutOfBounds { triangle: i });
        }
    }
    Ok(ShapeDesc::TriangleMesh {
        vertices: mesh.vertices.clone(),
        triangles: mesh.triangles.clone(),
    })
}

/// A registered static body backing one anchor
#[derive(Debug, Clone)]
pub struct StaticBody {
    pub body: BodyId,
    pub transform: Pose,
    pub shape: ShapeDesc,
}

/// Mapping from anchor identity to its static collision body.
///
/// Deltas are applied exactly once, in arrival order per identity; no two
/// bodies ever share an anchor id.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    bodies: HashMap<AnchorId, StaticBody>,
}

impl AnchorRegistry {
    /// Apply an Added delta. `body` is the pre-allocated id for the new
    /// static body; it is wasted if synthesis fails, which is fine.
    pub fn add(
        &mut self,
        anchor: AnchorId,
        body: BodyId,
        transform: Pose,
        mesh: &MeshSnapshot,
        out: &mut Vec<Command>,
    ) {
        let shape = match synthesize_shape(mesh) {
            Ok(shape) => shape,
            Err(err) => {
                log::warn!("skipping anchor {anchor:?}: {err}");
                return;
            }
        };
        if let Some(old) = self.bodies.insert(
            anchor,
            StaticBody {
                body,
                transform,
                shape: shape.clone(),
            },
        ) {
            log::warn!("anchor {anchor:?} re-added; replacing existing body");
            out.push(Command::RemoveBody { body: old.body });
        }
        out.push(Command::AddBody {
            body,
            mode: BodyMode::Static,
            shape,
            transform,
            mass: 0.0,
            material: None,
        });
        log::info!("added mesh anchor {anchor:?}");
    }

    /// Apply an Updated delta. Unknown anchors are stale events and ignored.
    pub fn update(
        &mut self,
        anchor: AnchorId,
        transform: Pose,
        mesh: &MeshSnapshot,
        out: &mut Vec<Command>,
    ) {
        let Some(entry) = self.bodies.get_mut(&anchor) else {
            log::debug!("stale update for unknown anchor {anchor:?}");
            return;
        };
        let shape = match synthesize_shape(mesh) {
            Ok(shape) => shape,
            Err(err) => {
                log::warn!("keeping previous shape for anchor {anchor:?}: {err}");
                return;
            }
        };
        entry.transform = transform;
        entry.shape = shape.clone();
        out.push(Command::SetBodyTransform {
            body: entry.body,
            transform,
        });
        out.push(Command::SetBodyShape {
            body: entry.body,
            shape,
        });
    }

    /// Apply a Removed delta; a no-op when the anchor is absent.
    pub fn remove(&mut self, anchor: AnchorId, out: &mut Vec<Command>) {
        if let Some(entry) = self.bodies.remove(&anchor) {
            out.push(Command::RemoveBody { body: entry.body });
        }
    }

    /// Whether `body` is one of the registered room bodies
    pub fn contains_body(&self, body: BodyId) -> bool {
        self.bodies.values().any(|b| b.body == body)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Evict everything, releasing each body (session restart)
    pub fn clear(&mut self, out: &mut Vec<Command>) {
        let mut bodies: Vec<BodyId> = self.bodies.values().map(|b| b.body).collect();
        bodies.sort();
        for body in bodies {
            out.push(Command::RemoveBody { body });
        }
        self.bodies.clear();
    }
}
