//! Geometry resolution for drop points
//!
//! Pointer events arrive in global (page/canvas) coordinates; targets are
//! registered in session-local coordinates relative to the game container.
//! Nothing here is measured by the engine itself: the host supplies the
//! container rectangle and target centers through a `PositionProvider`.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_CONTAINER_EXTENT;
use crate::is_finite_point;

/// Measured bounds of the game container in global coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerRect {
    /// Top-left corner
    pub origin: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl ContainerRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// A zero-size or non-finite rect means the container is not mounted yet
    pub fn is_measured(&self) -> bool {
        is_finite_point(self.origin)
            && is_finite_point(self.size)
            && self.size.x >= MIN_CONTAINER_EXTENT
            && self.size.y >= MIN_CONTAINER_EXTENT
    }
}

/// Current center and (optional) effective radius of a drop target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetGeometry {
    /// Center in session-local coordinates
    pub center: Vec2,
    /// Radius measured by the host layout; falls back to manifest/profile when `None`
    pub radius: Option<f32>,
}

impl TargetGeometry {
    pub fn at(center: Vec2) -> Self {
        Self { center, radius: None }
    }

    pub fn with_radius(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius: Some(radius),
        }
    }
}

/// Host capability that reports layout for the current frame.
///
/// Queried on every drag end; the engine never caches the answers, so layout
/// changes between drags are picked up without any invalidation call.
pub trait PositionProvider {
    /// Container bounds in global coordinates, `None` while unmounted
    fn container(&self) -> Option<ContainerRect>;

    /// Geometry for a target, `None` while that target is not laid out
    fn target(&self, target_id: &str) -> Option<TargetGeometry>;
}

/// Convert a global point into session-local coordinates.
///
/// Returns `None` when the container is unmeasured or the point is not
/// finite; callers treat that as "no geometry", i.e. a miss.
pub fn to_local(container: &ContainerRect, global: Vec2) -> Option<Vec2> {
    if !container.is_measured() || !is_finite_point(global) {
        return None;
    }
    Some(global - container.origin)
}

/// Euclidean distance from a local point to a target center
#[inline]
pub fn distance(local: Vec2, center: Vec2) -> f32 {
    local.distance(center)
}

/// Fixed layout table, used by headless hosts and tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticLayout {
    pub container: Option<ContainerRect>,
    pub targets: HashMap<String, TargetGeometry>,
}

impl StaticLayout {
    /// Layout with a container of the given size anchored at the origin
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            container: Some(ContainerRect::new(0.0, 0.0, width, height)),
            targets: HashMap::new(),
        }
    }

    /// Builder-style target registration
    pub fn with_target(mut self, target_id: &str, center: Vec2) -> Self {
        self.set_target(target_id, TargetGeometry::at(center));
        self
    }

    pub fn set_target(&mut self, target_id: &str, geometry: TargetGeometry) {
        self.targets.insert(target_id.to_string(), geometry);
    }

    /// Simulate a target being unmounted
    pub fn remove_target(&mut self, target_id: &str) {
        self.targets.remove(target_id);
    }
}

impl PositionProvider for StaticLayout {
    fn container(&self) -> Option<ContainerRect> {
        self.container
    }

    fn target(&self, target_id: &str) -> Option<TargetGeometry> {
        self.targets.get(target_id).copied()
    }
}
