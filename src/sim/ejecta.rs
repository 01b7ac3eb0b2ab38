//! Ejecta generation, flight and degradation
//!
//! Particles are real integrator bodies. Each one is flown to completion
//! with `Integrator::step_body` right after the impact, so its trajectory
//! is known up front and can be replayed by the renderer.

use std::collections::{BTreeMap, VecDeque};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::body::{BodyHandle, BodyKind, BodySnapshot, BodySpec};
use super::impact::PendingImpact;
use super::integrator::Integrator;
use super::terrain::Terrain;
use super::weather::WeatherEffects;
use crate::config::EjectaConfig;
use crate::consts::{MAX_EJECTA_PARTICLES, MAX_EJECTA_STEPS, MAX_RETAINED_IMPACTS};
use crate::equivalent_area;

/// Debris categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DebrisKind {
    Dirt,
    Rock,
    Flaming,
    Boulder,
    FlamingBoulder,
}

/// Fixed per-kind properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DebrisProfile {
    /// kg
    pub mass_min: f64,
    pub mass_max: f64,
    /// Seconds before degrading; `None` never degrades
    pub lifespan: Option<f64>,
    pub degrades_to: Option<DebrisKind>,
    /// 0xRRGGBB
    pub color: u32,
}

impl DebrisKind {
    pub fn profile(self) -> DebrisProfile {
        let (mass_min, mass_max, lifespan, degrades_to, color) = match self {
            DebrisKind::Dirt => (1.0, 10.0, None, None, 0x8b4513),
            DebrisKind::Rock => (10.0, 100.0, Some(10.0), Some(DebrisKind::Dirt), 0x808080),
            DebrisKind::Flaming => (5.0, 50.0, Some(5.0), Some(DebrisKind::Dirt), 0xff4500),
            DebrisKind::Boulder => (100.0, 1000.0, Some(15.0), Some(DebrisKind::Rock), 0x696969),
            DebrisKind::FlamingBoulder => {
                (100.0, 500.0, Some(7.0), Some(DebrisKind::Boulder), 0xff4500)
            }
        };
        DebrisProfile {
            mass_min,
            mass_max,
            lifespan,
            degrades_to,
            color,
        }
    }

    #[inline]
    pub fn is_flaming(self) -> bool {
        matches!(self, DebrisKind::Flaming | DebrisKind::FlamingBoulder)
    }

    /// Fraction of mass lost when degrading
    #[inline]
    pub fn mass_loss(self) -> f64 {
        if self.is_flaming() { 0.8 } else { 0.5 }
    }
}

/// Pick a debris kind from a uniform roll in [0, 1)
pub fn roll_kind(roll: f64, energy: f64, strength: f64, config: &EjectaConfig) -> DebrisKind {
    if energy > config.massive_impact_energy {
        if roll < 0.05 && energy > config.flaming_boulder_energy {
            DebrisKind::FlamingBoulder
        } else if roll < 0.05 + 0.05 * strength {
            DebrisKind::Boulder
        } else if roll < 0.5 {
            DebrisKind::Rock
        } else if roll < 0.6 && energy > config.flaming_energy {
            DebrisKind::Flaming
        } else {
            DebrisKind::Dirt
        }
    } else if roll < 0.1 && energy > config.flaming_energy {
        DebrisKind::Flaming
    } else if roll < 0.1 + 0.3 * strength {
        DebrisKind::Rock
    } else {
        DebrisKind::Dirt
    }
}

/// One thrown particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EjectaParticle {
    pub handle: BodyHandle,
    /// Kind at launch
    pub launch_kind: DebrisKind,
    /// Current kind
    pub kind: DebrisKind,
    pub mass: f64,
    pub area: f64,
    pub lifespan: Option<f64>,
    pub degrades_to: Option<DebrisKind>,
    pub time_alive: f64,
    pub spawn: DVec3,
    pub launch_velocity: DVec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    /// Seconds since launch
    pub time: f64,
    pub position: DVec3,
    pub kind: DebrisKind,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleTrajectory {
    pub handle: BodyHandle,
    pub points: Vec<TrajectoryPoint>,
    /// False when the step cap ran out first
    pub landed: bool,
}

/// Mini crater dug by a heavy particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SecondaryImpact {
    pub parent: BodyHandle,
    pub particle: BodyHandle,
    pub x: f64,
    pub z: f64,
    pub energy: f64,
    pub radius: f64,
    pub depth: f64,
    /// Share of the parent impact's energy
    pub energy_fraction: f64,
    /// Cells lowered
    pub cells: usize,
}

/// All ejecta from one impact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EjectaSimulation {
    pub source: BodyHandle,
    pub particles: Vec<EjectaParticle>,
    pub trajectories: Vec<ParticleTrajectory>,
    pub secondary_impacts: Vec<SecondaryImpact>,
    /// Set once the animation data has been handed out; particles and
    /// trajectories are dropped at that point
    pub consumed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParticleLaunch {
    pub kind: DebrisKind,
    pub color: u32,
    pub initial_position: DVec3,
}

/// Replay data for the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EjectaAnimation {
    pub particles: Vec<ParticleLaunch>,
    pub trajectories: Vec<ParticleTrajectory>,
    pub duration: f64,
    pub secondary_impacts: Vec<SecondaryImpact>,
}

/// Collaborators the ejecta pass writes into
pub struct EjectaEnv<'a> {
    pub integrator: &'a mut Integrator,
    pub terrain: &'a mut Terrain,
    pub weather: WeatherEffects,
}

/// Ejecta simulator
#[derive(Debug, Clone)]
pub struct EjectaSimulator {
    config: EjectaConfig,
    dt: f64,
    simulations: BTreeMap<BodyHandle, EjectaSimulation>,
    /// Simulation sources, oldest first
    order: VecDeque<BodyHandle>,
    seed: u64,
    rng: Pcg32,
}

impl EjectaSimulator {
    pub fn new(config: EjectaConfig, dt: f64, seed: u64) -> Self {
        log::info!("Ejecta simulator initialized");
        Self {
            config,
            dt,
            simulations: BTreeMap::new(),
            order: VecDeque::new(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Throw and fly the ejecta of an impact. Returns the particle count.
    pub fn process(
        &mut self,
        source: &BodySnapshot,
        impact: &PendingImpact,
        mut env: EjectaEnv<'_>,
    ) -> usize {
        let recipe = &impact.ejecta;
        let energy = impact.plan.energy;
        let strength = impact.context.rod.strength;
        let weather = env.weather.sanitized();

        let massive = energy > self.config.massive_impact_energy;
        let count = if recipe.debris.is_empty() {
            0
        } else if massive {
            (recipe.count * 2).min(MAX_EJECTA_PARTICLES)
        } else {
            recipe.count.min(MAX_EJECTA_PARTICLES)
        };

        let v = source.body.impact_velocity;
        let mut impact_angle = v.x.atan2(v.y);
        if impact_angle == 0.0 || !impact_angle.is_finite() {
            impact_angle = FRAC_PI_4;
        }
        let (spawn_offset, spread) = if massive { (10.0, 30.0) } else { (5.0, 20.0) };
        let (x, z) = (impact.plan.x, impact.plan.z);
        let center_ground = env.terrain.height_at(x, z);

        let mut particles = Vec::with_capacity(count);
        for i in 0..count {
            let seed = recipe.debris[i % recipe.debris.len()];
            let kind = roll_kind(self.rng.random::<f64>(), energy, strength, &self.config);
            let profile = kind.profile();
            let mass = profile.mass_min + self.rng.random::<f64>() * (profile.mass_max - profile.mass_min);
            let area = equivalent_area(mass);
            let heading = impact_angle + (self.rng.random::<f64>() - 0.5) * FRAC_PI_2;
            let speed = seed.velocity.y * recipe.energy_fraction * weather.wind_scale
                + self.rng.random::<f64>() * spread;

            let sx = x + heading.cos() * spawn_offset;
            let sz = z + heading.sin() * spawn_offset;
            let spawn = DVec3::new(sx, center_ground.max(env.terrain.height_at(sx, sz)), sz);
            let launch_velocity = DVec3::new(
                heading.cos() * speed * weather.wind_scale,
                speed,
                heading.sin() * speed * weather.wind_scale,
            );

            let handle = env.integrator.add_object(
                BodySpec {
                    mass,
                    position: spawn,
                    velocity: launch_velocity,
                    area,
                    shape_factor: 1.0,
                    kind: BodyKind::Debris,
                },
                false,
                0.0,
            );
            particles.push(EjectaParticle {
                handle,
                launch_kind: kind,
                kind,
                mass,
                area,
                lifespan: profile.lifespan,
                degrades_to: profile.degrades_to,
                time_alive: 0.0,
                spawn,
                launch_velocity,
            });
        }

        let mut trajectories = Vec::with_capacity(particles.len());
        let mut secondary_impacts = Vec::new();
        for particle in particles.iter_mut() {
            let (trajectory, secondary) =
                self.fly(particle, source.handle, energy, &weather, &mut env);
            trajectories.push(trajectory);
            secondary_impacts.extend(secondary);
        }

        log::debug!(
            "Ejecta for {:?}: {} particles, {} secondary impacts",
            source.handle,
            particles.len(),
            secondary_impacts.len()
        );

        let thrown = particles.len();
        let replaced = self.simulations.insert(
            source.handle,
            EjectaSimulation {
                source: source.handle,
                particles,
                trajectories,
                secondary_impacts,
                consumed: false,
            },
        );
        if replaced.is_none() {
            self.order.push_back(source.handle);
        }
        while self.order.len() > MAX_RETAINED_IMPACTS {
            if let Some(oldest) = self.order.pop_front() {
                self.simulations.remove(&oldest);
            }
        }
        thrown
    }

    /// Step one particle until it lands or the step cap runs out
    fn fly(
        &self,
        particle: &mut EjectaParticle,
        parent: BodyHandle,
        parent_energy: f64,
        weather: &WeatherEffects,
        env: &mut EjectaEnv<'_>,
    ) -> (ParticleTrajectory, Option<SecondaryImpact>) {
        let mut trajectory = ParticleTrajectory {
            handle: particle.handle,
            points: Vec::new(),
            landed: false,
        };
        let mut secondary = None;

        for step in 0..MAX_EJECTA_STEPS {
            let Some(state) = env.integrator.step_body(particle.handle, self.dt, env.terrain) else {
                break;
            };
            particle.time_alive += self.dt;

            let expired = particle
                .lifespan
                .is_some_and(|lifespan| particle.time_alive >= lifespan);
            if expired && state.body.active {
                self.degrade(particle, weather, env.integrator);
            }

            trajectory.points.push(TrajectoryPoint {
                time: step as f64 * self.dt,
                position: state.body.position,
                kind: particle.kind,
                color: particle.kind.profile().color,
            });

            if state.body.collided {
                trajectory.landed = true;
                if particle.mass >= self.config.secondary_mass_threshold {
                    secondary = self.secondary_crater(particle, &state, parent, parent_energy, env.terrain);
                }
                break;
            }
        }

        (trajectory, secondary)
    }

    fn degrade(&self, particle: &mut EjectaParticle, weather: &WeatherEffects, integrator: &mut Integrator) {
        let Some(target) = particle.degrades_to else {
            return;
        };
        particle.mass -= particle.mass * particle.kind.mass_loss();
        particle.area = equivalent_area(particle.mass);
        particle.kind = target;
        particle.lifespan = None;
        particle.degrades_to = None;

        integrator.reshape(particle.handle, particle.mass, particle.area);
        if target == DebrisKind::Dirt && weather.is_wet() {
            integrator.damp_vertical(particle.handle, self.config.wet_damping);
        }
    }

    fn secondary_crater(
        &self,
        particle: &EjectaParticle,
        state: &BodySnapshot,
        parent: BodyHandle,
        parent_energy: f64,
        terrain: &mut Terrain,
    ) -> Option<SecondaryImpact> {
        let energy = state.body.impact_energy();
        if energy < self.config.secondary_energy_threshold {
            return None;
        }
        let (x, z) = (state.body.position.x, state.body.position.z);
        let resistance = terrain.resistance_at(x, z);
        let radius = (2.0 * energy.log10() * (1.0 - resistance)).min(10.0);
        let depth = radius * 0.2;
        let cells = terrain.apply_crater(x, z, radius, depth);

        log::debug!(
            "Secondary impact from {:?}: E={:.3e} J, r={:.2} m",
            particle.handle,
            energy,
            radius
        );
        Some(SecondaryImpact {
            parent,
            particle: particle.handle,
            x,
            z,
            energy,
            radius,
            depth,
            energy_fraction: if parent_energy > 0.0 { energy / parent_energy } else { 0.0 },
            cells,
        })
    }

    /// Replay data for an impact's ejecta; handed out once
    pub fn get_animation_data(&mut self, source: BodyHandle) -> Option<EjectaAnimation> {
        let simulation = self.simulations.get_mut(&source).filter(|s| !s.consumed)?;
        simulation.consumed = true;
        let duration = simulation
            .trajectories
            .first()
            .map(|t| t.points.len() as f64 * self.dt)
            .unwrap_or(0.0);
        let particles = std::mem::take(&mut simulation.particles)
            .into_iter()
            .map(|p| ParticleLaunch {
                kind: p.launch_kind,
                color: p.launch_kind.profile().color,
                initial_position: p.spawn,
            })
            .collect();
        Some(EjectaAnimation {
            particles,
            trajectories: std::mem::take(&mut simulation.trajectories),
            duration,
            secondary_impacts: simulation.secondary_impacts.clone(),
        })
    }

    pub fn get_secondary_impacts(&self, source: BodyHandle) -> &[SecondaryImpact] {
        self.simulations
            .get(&source)
            .map(|s| s.secondary_impacts.as_slice())
            .unwrap_or(&[])
    }

    pub fn simulation(&self, source: BodyHandle) -> Option<&EjectaSimulation> {
        self.simulations.get(&source)
    }

    /// Number of impacts whose ejecta is still held
    pub fn retained(&self) -> usize {
        self.simulations.len()
    }

    pub fn reset(&mut self) {
        self.simulations.clear();
        self.order.clear();
        self.rng = Pcg32::seed_from_u64(self.seed);
    }
}
