//! Fixed timestep integrator
//!
//! Owns every dynamic body in a generational arena and advances them in slot
//! order, so a run with the same inputs always visits bodies in the same
//! order. The per-body kinematics are shared with the look-ahead pass
//! (`Atmosphere::pre_integrate_trajectory`) through [`advance`].

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyHandle, BodySnapshot, BodySpec};
use super::terrain::Terrain;
use crate::config::PhysicsConfig;

/// Inverse-square planetary gravity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gravity {
    /// Surface gravity (m/s²)
    pub surface: f64,
    pub planet_radius: f64,
}

impl Gravity {
    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self {
            surface: config.gravity,
            planet_radius: config.planet_radius,
        }
    }

    /// Gravitational acceleration magnitude at an altitude
    #[inline]
    pub fn at_altitude(&self, altitude: f64) -> f64 {
        let ratio = self.planet_radius / (self.planet_radius + altitude);
        self.surface * ratio * ratio
    }
}

/// Advance one body by one fixed step.
///
/// Gravity is added to whatever acceleration was accumulated, then
/// semi-implicit Euler (velocity first, then position), terrain contact,
/// derived quantities, and the acceleration is cleared. Returns true if the
/// body touched the ground during this step.
pub fn advance(body: &mut Body, gravity: &Gravity, dt: f64, terrain: &Terrain) -> bool {
    body.acceleration.y -= gravity.at_altitude(body.position.y);
    body.velocity += body.acceleration * dt;
    body.position += body.velocity * dt;

    let ground = terrain.height_at(body.position.x, body.position.z);
    let hit = body.resolve_contact(ground);

    body.refresh_derived();
    body.acceleration = DVec3::ZERO;
    hit
}

/// What happened during one `Integrator::step`
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    /// Terminal state of every body that hit the ground this step
    pub collisions: Vec<BodySnapshot>,
    /// Handles invalidated by compaction at the end of the step
    pub removed: Vec<BodyHandle>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// The physics engine
#[derive(Debug, Clone)]
pub struct Integrator {
    gravity: Gravity,
    slots: Vec<Slot>,
    /// Free slot indices (reused LIFO)
    free: Vec<u32>,
    /// Simulated seconds
    time: f64,
    steps: u64,
}

impl Integrator {
    pub fn new(config: &PhysicsConfig) -> Self {
        log::info!(
            "Physics initialized: gravity={} m/s², radius={} m",
            config.gravity,
            config.planet_radius
        );
        Self {
            gravity: Gravity::from_config(config),
            slots: Vec::new(),
            free: Vec::new(),
            time: 0.0,
            steps: 0,
        }
    }

    #[inline]
    pub fn gravity(&self) -> &Gravity {
        &self.gravity
    }

    /// Simulated time in seconds
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed steps
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Number of live bodies
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a body. With `orbital_insertion` the body starts at
    /// `insertion_height` regardless of the spec's y.
    pub fn add_object(
        &mut self,
        spec: BodySpec,
        orbital_insertion: bool,
        insertion_height: f64,
    ) -> BodyHandle {
        let mut body = Body::from_spec(&spec);
        if orbital_insertion {
            body.position.y = insertion_height;
        }

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            BodyHandle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                body: Some(body),
            });
            BodyHandle::new(index, 0)
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation())
            .and_then(|s| s.body.as_ref())
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation())
            .and_then(|s| s.body.as_mut())
    }

    /// Immutable copy of a body, `None` for stale handles
    pub fn get_state(&self, handle: BodyHandle) -> Option<BodySnapshot> {
        self.body(handle).map(|body| BodySnapshot {
            handle,
            body: *body,
        })
    }

    /// Handles of all active bodies in slot order
    pub fn active_handles(&self) -> Vec<BodyHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.body.is_some_and(|b| b.active))
            .map(|(i, s)| BodyHandle::new(i as u32, s.generation))
            .collect()
    }

    /// Accumulate a force for the next step. Returns false for stale handles.
    pub fn apply_force(&mut self, handle: BodyHandle, force: DVec3) -> bool {
        match self.body_mut(handle) {
            Some(body) => {
                body.push(force);
                true
            }
            None => false,
        }
    }

    /// Kick an orbiting body into descent with a downward impulse of
    /// sqrt(2·g·h)·factor on top of its current velocity
    pub fn de_orbit(&mut self, handle: BodyHandle, factor: f64) -> bool {
        let g = self.gravity.surface;
        match self.body_mut(handle) {
            Some(body) => {
                let altitude = body.position.y.max(0.0);
                body.velocity.y -= (2.0 * g * altitude).sqrt() * factor;
                body.refresh_derived();
                true
            }
            None => false,
        }
    }

    /// Replace mass and frontal area (debris degradation)
    pub fn reshape(&mut self, handle: BodyHandle, mass: f64, area: f64) -> bool {
        match self.body_mut(handle) {
            Some(body) => {
                if mass > 0.0 {
                    body.mass = mass;
                }
                if area > 0.0 {
                    body.area = area;
                }
                body.refresh_derived();
                true
            }
            None => false,
        }
    }

    /// Scale vertical velocity
    pub fn damp_vertical(&mut self, handle: BodyHandle, factor: f64) -> bool {
        match self.body_mut(handle) {
            Some(body) => {
                body.velocity.y *= factor;
                body.refresh_derived();
                true
            }
            None => false,
        }
    }

    /// Advance every active body by one fixed step, then compact.
    pub fn step(&mut self, dt: f64, terrain: &Terrain) -> StepReport {
        self.time += dt;
        self.steps += 1;

        let mut report = StepReport::default();
        let gravity = self.gravity;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(body) = slot.body.as_mut() else {
                continue;
            };
            if !body.active {
                continue;
            }
            if advance(body, &gravity, dt, terrain) {
                let handle = BodyHandle::new(index as u32, slot.generation);
                log::debug!(
                    "Collision: body {:?} at ({:.1}, {:.1}, {:.1})",
                    handle,
                    body.position.x,
                    body.position.y,
                    body.position.z
                );
                report.collisions.push(BodySnapshot {
                    handle,
                    body: *body,
                });
            }
        }

        report.removed = self.compact();
        report
    }

    /// Advance a single body by one step without touching the others.
    ///
    /// Returns the post-step snapshot, or `None` if the handle is stale or
    /// the body is no longer active. No compaction happens here; the body
    /// is collected by the next `step`.
    pub fn step_body(
        &mut self,
        handle: BodyHandle,
        dt: f64,
        terrain: &Terrain,
    ) -> Option<BodySnapshot> {
        let gravity = self.gravity;
        let body = self.body_mut(handle)?;
        if !body.active {
            return None;
        }
        advance(body, &gravity, dt, terrain);
        Some(BodySnapshot {
            handle,
            body: *body,
        })
    }

    /// Drop inactive bodies and bump their slot generations
    fn compact(&mut self) -> Vec<BodyHandle> {
        let mut removed = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.body.is_some_and(|b| !b.active) {
                removed.push(BodyHandle::new(index as u32, slot.generation));
                slot.body = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        removed
    }

    /// Remove all bodies and rewind time. Slot generations survive, so
    /// handles from before the reset stay dead.
    pub fn reset(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.body.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        self.time = 0.0;
        self.steps = 0;
    }
}
