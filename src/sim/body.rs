//! Dynamic bodies and generational handles
//!
//! Bodies live in the integrator's arena. Everything outside the integrator
//! refers to them through a `BodyHandle`, which goes stale (resolves to
//! `None`) once the body is removed, even if its slot is later reused.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Stable reference to a body in the integrator arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Slot generation at the time the handle was issued
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// What a body represents (for collaborators and logging only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyKind {
    #[default]
    Rod,
    Debris,
    /// Terrain object knocked loose by a shockwave
    Displaced,
}

/// Initial conditions for a new body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BodySpec {
    pub mass: f64,
    pub position: DVec3,
    pub velocity: DVec3,
    /// Frontal area (m²)
    pub area: f64,
    /// Drag shape factor (dimensionless)
    pub shape_factor: f64,
    pub kind: BodyKind,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            mass: 1.0,
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            area: 1.0,
            shape_factor: 1.0,
            kind: BodyKind::Rod,
        }
    }
}

/// A point-mass body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub mass: f64,
    pub position: DVec3,
    pub velocity: DVec3,
    /// Accumulated acceleration for the next step (reset after every step)
    pub acceleration: DVec3,
    pub area: f64,
    pub shape_factor: f64,
    /// Kinetic energy ½mv² (derived)
    pub energy: f64,
    /// Momentum mv (derived)
    pub momentum: DVec3,
    /// Velocity at the instant of terrain contact, before the vertical
    /// component is zeroed
    pub impact_velocity: DVec3,
    pub active: bool,
    pub collided: bool,
    pub kind: BodyKind,
}

impl Body {
    /// Build a body from a spec, clamping non-positive or non-finite
    /// parameters to 1
    pub fn from_spec(spec: &BodySpec) -> Self {
        let positive_or_one = |v: f64| if v.is_finite() && v > 0.0 { v } else { 1.0 };
        let mut body = Self {
            mass: positive_or_one(spec.mass),
            position: spec.position,
            velocity: spec.velocity,
            acceleration: DVec3::ZERO,
            area: positive_or_one(spec.area),
            shape_factor: positive_or_one(spec.shape_factor),
            energy: 0.0,
            momentum: DVec3::ZERO,
            impact_velocity: DVec3::ZERO,
            active: true,
            collided: false,
            kind: spec.kind,
        };
        body.refresh_derived();
        body
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    #[inline]
    pub fn altitude(&self) -> f64 {
        self.position.y
    }

    /// Kinetic energy carried into the ground at contact (0 before contact)
    #[inline]
    pub fn impact_energy(&self) -> f64 {
        0.5 * self.mass * self.impact_velocity.length_squared()
    }

    /// Recompute energy and momentum from mass and velocity
    pub fn refresh_derived(&mut self) {
        self.energy = 0.5 * self.mass * self.velocity.length_squared();
        self.momentum = self.velocity * self.mass;
    }

    /// Accumulate an external force for the next step
    #[inline]
    pub fn push(&mut self, force: DVec3) {
        self.acceleration += force / self.mass;
    }

    /// Clamp the body onto the ground if it reached it.
    ///
    /// Returns true only the first time contact happens.
    pub fn resolve_contact(&mut self, ground_height: f64) -> bool {
        if self.collided || self.position.y > ground_height {
            return false;
        }
        self.impact_velocity = self.velocity;
        self.position.y = ground_height;
        self.velocity.y = 0.0;
        self.active = false;
        self.collided = true;
        true
    }
}

/// Immutable copy of a body handed to callers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub handle: BodyHandle,
    pub body: Body,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_spec_clamps_defaults() {
        let body = Body::from_spec(&BodySpec {
            mass: 0.0,
            area: -2.0,
            shape_factor: f64::NAN,
            velocity: DVec3::new(0.0, -10.0, 0.0),
            ..Default::default()
        });
        assert_eq!(body.mass, 1.0);
        assert_eq!(body.area, 1.0);
        assert_eq!(body.shape_factor, 1.0);
        assert!((body.energy - 50.0).abs() < 1e-9);
        assert_eq!(body.momentum, DVec3::new(0.0, -10.0, 0.0));
    }

    #[test]
    fn test_contact_happens_once() {
        let mut body = Body::from_spec(&BodySpec {
            mass: 2.0,
            position: DVec3::new(0.0, -0.5, 0.0),
            velocity: DVec3::new(1.0, -3.0, 0.0),
            ..Default::default()
        });
        assert!(body.resolve_contact(0.0));
        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.velocity.y, 0.0);
        assert!(!body.active);
        assert!((body.impact_energy() - 10.0).abs() < 1e-9);

        body.position.y = -1.0;
        assert!(!body.resolve_contact(0.0));
    }

    #[test]
    fn test_push_divides_by_mass() {
        let mut body = Body::from_spec(&BodySpec {
            mass: 4.0,
            ..Default::default()
        });
        body.push(DVec3::new(8.0, 0.0, -4.0));
        assert_eq!(body.acceleration, DVec3::new(2.0, 0.0, -1.0));
    }
}
