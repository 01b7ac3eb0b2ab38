//! Simulation world
//!
//! Owns every component and drives them in a fixed per-tick order. The
//! components never reach each other directly; `World` lends them to one
//! another through the `*Env` borrow bundles for the duration of a call.

use std::collections::{BTreeMap, VecDeque};

use glam::DVec3;
use serde::Serialize;

use super::atmosphere::{Atmosphere, AtmosphereData, Trajectory};
use super::body::BodyHandle;
use super::ejecta::{EjectaAnimation, EjectaSimulator};
use super::impact::{ImpactAnimation, ImpactContext, ImpactEnv, ImpactOutcome, ImpactResolver, RodProfile};
use super::integrator::Integrator;
use super::rod::{Progression, RodSpec};
use super::shockwave::{ShockwaveAnimation, ShockwavePropagator};
use super::terrain::{SizeTier, Terrain, TerrainData};
use super::weather::WeatherEffects;
use crate::config::SimConfig;
use crate::consts::{DEORBIT_DELAY_TICKS, DEORBIT_FACTOR};

/// Work scheduled for a later tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DeferredAction {
    DeOrbit { handle: BodyHandle, factor: f64 },
    LookAhead { handle: BodyHandle },
}

impl DeferredAction {
    fn handle(&self) -> BodyHandle {
        match *self {
            DeferredAction::DeOrbit { handle, .. } | DeferredAction::LookAhead { handle } => handle,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due: u64,
    action: DeferredAction,
}

/// Notifications for collaborators (renderer, UI, economy)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    RodLaunched {
        handle: BodyHandle,
        mass: f64,
        position: DVec3,
    },
    /// Fresh look-ahead for a rod
    Prediction {
        handle: BodyHandle,
        landing: Option<DVec3>,
        energy: f64,
        impact_tick: Option<u64>,
    },
    DeOrbitBurn {
        handle: BodyHandle,
    },
    /// Rod is past the break-up speed for its material
    RodStressed {
        handle: BodyHandle,
        speed: f64,
    },
    Impact {
        handle: BodyHandle,
        outcome: ImpactOutcome,
    },
    RodRemoved {
        handle: BodyHandle,
    },
    TerrainResized {
        tier: SizeTier,
    },
}

/// A tracked rod in flight
#[derive(Debug, Clone, Serialize)]
pub struct RodFlight {
    pub handle: BodyHandle,
    pub spec: RodSpec,
    pub launched_tick: u64,
    pub prediction: Trajectory,
    pub predicted_impact_tick: Option<u64>,
    pub stressed: bool,
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub collisions: usize,
    pub removed: usize,
    pub impacts: Vec<ImpactOutcome>,
}

/// The simulation
pub struct World {
    config: SimConfig,
    dt: f64,
    integrator: Integrator,
    atmosphere: Atmosphere,
    terrain: Terrain,
    impacts: ImpactResolver,
    ejecta: EjectaSimulator,
    shockwave: ShockwavePropagator,
    weather: WeatherEffects,
    progression: Progression,
    flights: BTreeMap<BodyHandle, RodFlight>,
    deferred: VecDeque<Scheduled>,
    tick: u64,
    events: Vec<SimEvent>,
}

impl World {
    pub fn new(config: SimConfig) -> Self {
        let progression = Progression::default();
        let terrain = Terrain::new(progression.size_tier(), config.terrain.clone(), config.seed);
        Self::assemble(config, progression, terrain)
    }

    /// World over caller-supplied terrain (scripted scenarios)
    pub fn with_terrain(config: SimConfig, terrain: Terrain) -> Self {
        Self::assemble(config, Progression::default(), terrain)
    }

    fn assemble(config: SimConfig, progression: Progression, terrain: Terrain) -> Self {
        let dt = config.physics.time_step;
        let seed = config.seed;
        let mut world = Self {
            dt,
            integrator: Integrator::new(&config.physics),
            atmosphere: Atmosphere::new(config.atmosphere.clone(), seed.wrapping_add(1)),
            terrain,
            impacts: ImpactResolver::new(config.impact.clone()),
            ejecta: EjectaSimulator::new(config.ejecta.clone(), dt, seed.wrapping_add(2)),
            shockwave: ShockwavePropagator::new(config.shockwave.clone(), dt),
            weather: WeatherEffects::calm(),
            progression,
            flights: BTreeMap::new(),
            deferred: VecDeque::new(),
            tick: 0,
            events: Vec::new(),
            config,
        };
        world.sync_progression();
        log::info!("World initialized (seed={}, dt={})", world.config.seed, world.dt);
        world
    }

    fn sync_progression(&mut self) {
        self.atmosphere.apply_upgrades(self.progression.upgrades);
        self.atmosphere.set_orbital_phase(self.progression.orbital_phase);
    }

    fn impact_context(&self, spec: &RodSpec) -> ImpactContext {
        ImpactContext {
            weather: self.weather,
            rod: RodProfile {
                mass: spec.mass(),
                strength: spec.strength(),
            },
            explosion_multiplier: self.progression.explosion_multiplier,
        }
    }

    /// Drop a rod over the center of the field.
    ///
    /// In the orbital phase the rod is inserted at the launch height and a
    /// de-orbit burn plus a fresh look-ahead are queued ~1 s later.
    pub fn launch_rod(&mut self, spec: RodSpec) -> BodyHandle {
        let (cx, cz) = self.terrain.center();
        let orbital = self.progression.orbital_phase;
        let height = self.progression.launch_height;
        let position = DVec3::new(cx, self.terrain.height_at(cx, cz) + height, cz);

        let handle = self
            .integrator
            .add_object(spec.body_spec(position), orbital, height);
        self.flights.insert(
            handle,
            RodFlight {
                handle,
                spec,
                launched_tick: self.tick,
                prediction: Trajectory::default(),
                predicted_impact_tick: None,
                stressed: false,
            },
        );

        let mass = spec.mass();
        log::info!(
            "Launched {} rod {:?}: mass={:.1} kg from {:.0} m{}",
            spec.material.name(),
            handle,
            mass,
            height,
            if orbital { " (orbital)" } else { "" }
        );
        let start = self
            .integrator
            .get_state(handle)
            .map(|s| s.body.position)
            .unwrap_or(position);
        self.events.push(SimEvent::RodLaunched {
            handle,
            mass,
            position: start,
        });

        self.look_ahead(handle);

        if orbital {
            let due = self.tick + DEORBIT_DELAY_TICKS;
            self.deferred.push_back(Scheduled {
                due,
                action: DeferredAction::DeOrbit {
                    handle,
                    factor: DEORBIT_FACTOR,
                },
            });
            self.deferred.push_back(Scheduled {
                due,
                action: DeferredAction::LookAhead { handle },
            });
        }
        handle
    }

    /// Re-predict a rod's fall and re-plan its impact at the predicted
    /// landing point
    pub fn look_ahead(&mut self, handle: BodyHandle) -> Option<&Trajectory> {
        let snapshot = self.integrator.get_state(handle)?;
        let spec = self.flights.get(&handle)?.spec;

        let trajectory = self.atmosphere.pre_integrate_trajectory(
            &snapshot,
            &self.terrain,
            self.integrator.gravity(),
            self.dt,
        );

        let landing = trajectory.landing().copied();
        let impact_tick = landing.map(|_| self.tick + trajectory.ticks() as u64);
        if let Some(landing) = landing {
            let ctx = self.impact_context(&spec);
            self.impacts.precalculate_impact(
                landing.position.x,
                landing.position.z,
                landing.energy,
                handle,
                &mut self.terrain,
                &ctx,
            );
        }

        log::debug!(
            "Look-ahead for {:?}: {} steps, landing={:?}",
            handle,
            trajectory.ticks(),
            landing.map(|l| l.position)
        );
        self.events.push(SimEvent::Prediction {
            handle,
            landing: landing.map(|l| l.position),
            energy: landing.map(|l| l.energy).unwrap_or(0.0),
            impact_tick,
        });

        let flight = self.flights.get_mut(&handle)?;
        flight.prediction = trajectory;
        flight.predicted_impact_tick = impact_tick;
        Some(&flight.prediction)
    }

    fn run_deferred(&mut self) {
        let tick = self.tick;
        let (due, later): (Vec<Scheduled>, Vec<Scheduled>) =
            self.deferred.drain(..).partition(|s| s.due <= tick);
        self.deferred = later.into();

        for scheduled in due {
            match scheduled.action {
                DeferredAction::DeOrbit { handle, factor } => {
                    if self.integrator.de_orbit(handle, factor) {
                        log::info!("De-orbit burn for {:?}", handle);
                        self.events.push(SimEvent::DeOrbitBurn { handle });
                    }
                }
                DeferredAction::LookAhead { handle } => {
                    self.look_ahead(handle);
                }
            }
        }
    }

    /// Advance the world by one fixed step
    pub fn tick(&mut self) -> TickSummary {
        self.run_deferred();

        self.atmosphere.update(self.dt);
        self.atmosphere.apply_weather(&self.weather);

        for handle in self.integrator.active_handles() {
            let Some(snapshot) = self.integrator.get_state(handle) else {
                continue;
            };
            let force = self.atmosphere.forces_on(&snapshot.body);
            self.integrator.apply_force(handle, force);

            if let Some(flight) = self.flights.get_mut(&handle) {
                let speed = snapshot.body.speed();
                if !flight.stressed && flight.spec.check_degradation(speed).degraded {
                    flight.stressed = true;
                    log::warn!("Rod {:?} past break-up speed ({:.0} m/s)", handle, speed);
                    self.events.push(SimEvent::RodStressed { handle, speed });
                }
            }
        }

        let report = self.integrator.step(self.dt, &self.terrain);

        let mut summary = TickSummary {
            tick: self.tick,
            collisions: report.collisions.len(),
            removed: report.removed.len(),
            impacts: Vec::new(),
        };

        for collision in &report.collisions {
            let Some(spec) = self.flights.get(&collision.handle).map(|f| f.spec) else {
                continue;
            };
            let ctx = self.impact_context(&spec);
            let outcome = self.impacts.handle_impact(
                collision,
                ImpactEnv {
                    integrator: &mut self.integrator,
                    terrain: &mut self.terrain,
                    atmosphere: &self.atmosphere,
                    ejecta: &mut self.ejecta,
                    shockwave: &mut self.shockwave,
                    ctx,
                },
            );
            self.events.push(SimEvent::Impact {
                handle: collision.handle,
                outcome,
            });
            summary.impacts.push(outcome);
        }

        for handle in &report.removed {
            if self.flights.remove(handle).is_some() {
                self.impacts.cancel(*handle);
                self.deferred.retain(|s| s.action.handle() != *handle);
                self.events.push(SimEvent::RodRemoved { handle: *handle });
            }
        }

        self.tick += 1;
        summary
    }

    /// Tick until no rod is in flight (or `max_ticks` elapse). Returns the
    /// ticks run.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> u64 {
        let mut ran = 0;
        while !self.flights.is_empty() && ran < max_ticks {
            self.tick();
            ran += 1;
        }
        ran
    }

    /// Install new progression inputs; regenerates terrain when the size
    /// tier changes
    pub fn set_progression(&mut self, progression: Progression) {
        let tier = progression.size_tier();
        self.progression = progression;
        self.sync_progression();

        if tier != self.terrain.tier() {
            log::info!("Resizing terrain to {:?}", tier);
            self.terrain.resize(tier);
            self.impacts.discard_stale(&self.terrain);
            self.events.push(SimEvent::TerrainResized { tier });

            let active: Vec<BodyHandle> = self.flights.keys().copied().collect();
            for handle in active {
                self.look_ahead(handle);
            }
        }
    }

    pub fn set_weather(&mut self, weather: WeatherEffects) {
        self.weather = weather;
    }

    pub fn weather(&self) -> &WeatherEffects {
        &self.weather
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Take all events since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.impacts.total_score()
    }

    pub fn flight(&self, handle: BodyHandle) -> Option<&RodFlight> {
        self.flights.get(&handle)
    }

    pub fn has_flights(&self) -> bool {
        !self.flights.is_empty()
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    pub fn atmosphere(&self) -> &Atmosphere {
        &self.atmosphere
    }

    pub fn atmosphere_mut(&mut self) -> &mut Atmosphere {
        &mut self.atmosphere
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn impacts(&self) -> &ImpactResolver {
        &self.impacts
    }

    pub fn ejecta(&self) -> &EjectaSimulator {
        &self.ejecta
    }

    pub fn shockwaves(&self) -> &ShockwavePropagator {
        &self.shockwave
    }

    pub fn terrain_data(&self) -> TerrainData<'_> {
        self.terrain.data()
    }

    pub fn atmosphere_data(&self) -> AtmosphereData<'_> {
        self.atmosphere.data()
    }

    pub fn impact_animation(&self, handle: BodyHandle) -> Option<ImpactAnimation> {
        self.impacts.get_impact_animation_data(handle)
    }

    pub fn ejecta_animation(&mut self, handle: BodyHandle) -> Option<EjectaAnimation> {
        self.ejecta.get_animation_data(handle)
    }

    pub fn shockwave_animation(&mut self, handle: BodyHandle) -> Option<ShockwaveAnimation> {
        self.shockwave.get_animation_data(handle)
    }

    /// Back to a fresh world with the same config and progression
    pub fn reset(&mut self) {
        self.integrator.reset();
        self.atmosphere.reset();
        self.terrain.reset();
        self.impacts.reset();
        self.ejecta.reset();
        self.shockwave.reset();
        self.flights.clear();
        self.deferred.clear();
        self.events.clear();
        self.weather = WeatherEffects::calm();
        self.tick = 0;
        self.sync_progression();
        log::info!("World reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rod::RodMaterial;
    use crate::sim::terrain::Material;

    fn flat_world() -> World {
        let config = SimConfig::default();
        let terrain = Terrain::flat(SizeTier::Ground, 0.0, Material::Dirt, 0);
        World::with_terrain(config, terrain)
    }

    #[test]
    fn test_drop_lands_and_scores_once() {
        let mut world = flat_world();
        world.set_progression(Progression::default().with_launch_height(500.0));
        let rod = world.launch_rod(RodSpec::new(RodMaterial::Tungsten, 1.0, 0.1));
        assert!(world.impacts().pending(rod).is_some());
        let predicted = world.flight(rod).unwrap().predicted_impact_tick.unwrap();

        let ran = world.run_until_idle(20_000);
        assert!(ran > 0);
        assert!(!world.has_flights());
        assert!(world.score() > 0.0);
        assert!(world.integrator().get_state(rod).is_none());

        let events = world.drain_events();
        let impacts: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Impact { outcome, .. } => Some(*outcome),
                _ => None,
            })
            .collect();
        assert_eq!(impacts.len(), 1);
        assert!((world.score() - impacts[0].score).abs() < 1e-9);
        assert!(events.contains(&SimEvent::RodRemoved { handle: rod }));
        // Live run and look-ahead share the step, so the tick matches closely
        assert!((ran as i64 - predicted as i64).abs() <= 5);

        assert!(world.impact_animation(rod).is_some());
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn test_consumed_animations_release_replay_data() {
        let mut world = flat_world();
        world.set_progression(Progression::default().with_launch_height(300.0));

        for _ in 0..3 {
            let rod = world.launch_rod(RodSpec::new(RodMaterial::Tungsten, 1.0, 0.1));
            world.run_until_idle(20_000);
            assert!(world.ejecta_animation(rod).is_some());
            assert!(world.shockwave_animation(rod).is_some());

            let simulation = world.ejecta().simulation(rod).unwrap();
            assert!(simulation.trajectories.is_empty());
            assert!(simulation.particles.is_empty());
            assert!(world.shockwaves().event(rod).unwrap().profile.is_empty());
            assert!(world.impacts().pending(rod).unwrap().ejecta.debris.is_empty());
        }
        assert_eq!(world.impacts().retained(), 3);
        assert_eq!(world.ejecta().retained(), 3);
        assert_eq!(world.shockwaves().retained(), 3);
    }

    #[test]
    fn test_orbital_launch_queues_de_orbit() {
        let mut world = flat_world();
        world.set_progression(Progression::default().with_launch_height(200_000.0));
        assert_eq!(world.terrain().tier(), SizeTier::Orbital);

        let rod = world.launch_rod(RodSpec::default());
        let start = world.integrator().get_state(rod).unwrap().body.position.y;
        assert_eq!(start, 200_000.0);

        for _ in 0..DEORBIT_DELAY_TICKS {
            world.tick();
        }
        assert!(!world.drain_events().iter().any(|e| matches!(e, SimEvent::DeOrbitBurn { .. })));

        world.tick();
        let events = world.drain_events();
        let burn = events
            .iter()
            .position(|e| *e == SimEvent::DeOrbitBurn { handle: rod })
            .expect("burn after the delay");
        let prediction = events
            .iter()
            .position(|e| matches!(e, SimEvent::Prediction { handle, .. } if *handle == rod))
            .expect("fresh look-ahead after the burn");
        assert!(burn < prediction);
    }

    #[test]
    fn test_resize_discards_stale_plans() {
        let mut world = World::new(SimConfig::default().with_seed(3));
        world.set_progression(Progression::default().with_launch_height(1000.0));
        let rod = world.launch_rod(RodSpec::default());
        let before = world.impacts().pending(rod).unwrap().plan.revision;

        world.set_progression(
            Progression::default()
                .with_launch_height(1000.0)
                .with_upgrade_level(6),
        );
        assert_eq!(world.terrain().tier(), SizeTier::Regional);
        let after = world.impacts().pending(rod).unwrap().plan.revision;
        assert!(after > before);
        assert!(world.terrain().is_current(&world.impacts().pending(rod).unwrap().plan));
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let mut world = World::new(SimConfig::default().with_seed(9));
        let cells = world.terrain_data().cells.len();
        let layers = world.atmosphere_data().layers.len();
        world.set_progression(Progression::default().with_launch_height(50.0));
        world.launch_rod(RodSpec::default());
        world.run_until_idle(10_000);

        world.reset();
        assert_eq!(world.tick_count(), 0);
        assert_eq!(world.score(), 0.0);
        assert!(world.integrator().is_empty());
        assert_eq!(world.terrain_data().cells.len(), cells);
        assert_eq!(world.atmosphere_data().layers.len(), layers);
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn test_rod_handles_do_not_survive_reset() {
        let mut world = flat_world();
        world.set_progression(Progression::default().with_launch_height(100.0));
        let old = world.launch_rod(RodSpec::default());
        world.reset();

        let fresh = world.launch_rod(RodSpec::new(RodMaterial::Lead, 1.0, 0.05));
        assert_ne!(old, fresh);
        assert!(world.integrator().get_state(old).is_none());
        assert!(world.flight(old).is_none());
        assert!(world.impacts().pending(old).is_none());
        assert!(world.integrator().get_state(fresh).is_some());
    }
}
