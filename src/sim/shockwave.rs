//! Shockwave propagation and object damage
//!
//! A shockwave is resolved in one pass at impact time: objects inside the
//! adjusted radius are destroyed or knocked loose as new integrator bodies,
//! and a time profile of the expanding front is kept for the renderer.

use std::collections::{BTreeMap, VecDeque};

use glam::DVec3;
use serde::Serialize;

use super::atmosphere::Atmosphere;
use super::body::{BodyHandle, BodyKind, BodySpec};
use super::impact::ShockwaveRecipe;
use super::integrator::Integrator;
use super::terrain::{ObjectKind, Terrain, TerrainObject};
use super::weather::WeatherEffects;
use crate::config::ShockwaveConfig;
use crate::consts::{MAX_RETAINED_IMPACTS, MAX_SHOCKWAVE_SAMPLES, MIN_SHOCKWAVE_SAMPLES};
use crate::horizontal_distance;

/// Frontal area given to knocked-loose objects (m²)
const DISPLACED_AREA: f64 = 0.1;

/// An object hit hard enough to move
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DamagedObject {
    pub object_id: u32,
    pub kind: ObjectKind,
    pub x: f64,
    pub z: f64,
    /// Body injected for the flying object
    pub body: BodyHandle,
    /// Destroyed (true) or only displaced (false)
    pub destroyed: bool,
}

/// Front state at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShockwaveSample {
    pub time: f64,
    pub radius: f64,
    pub intensity: f64,
}

/// A resolved shockwave
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShockwaveEvent {
    pub source: BodyHandle,
    pub x: f64,
    pub z: f64,
    pub radius: f64,
    pub intensity: f64,
    pub duration: f64,
    /// Front speed (m/s)
    pub speed: f64,
    pub damaged: Vec<DamagedObject>,
    /// Emptied once the animation data has been handed out
    pub profile: Vec<ShockwaveSample>,
    pub consumed: bool,
}

/// What `apply` did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShockwaveReport {
    pub radius: f64,
    pub intensity: f64,
    pub duration: f64,
    pub damaged: Vec<DamagedObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShockwaveAnimation {
    pub x: f64,
    pub z: f64,
    pub samples: Vec<ShockwaveSample>,
    pub duration: f64,
    pub damaged: Vec<DamagedObject>,
}

/// Collaborators a shockwave reads and writes
pub struct ShockwaveEnv<'a> {
    pub integrator: &'a mut Integrator,
    pub terrain: &'a mut Terrain,
    pub atmosphere: &'a Atmosphere,
    pub weather: WeatherEffects,
}

#[derive(Debug, Clone)]
pub struct ShockwavePropagator {
    config: ShockwaveConfig,
    dt: f64,
    events: BTreeMap<BodyHandle, ShockwaveEvent>,
    /// Event sources, oldest first
    order: VecDeque<BodyHandle>,
}

/// Expanding-front profile: `clamp(⌈duration/dt⌉, 10, 200)` samples from
/// t = 0 to t = duration
pub fn profile(radius: f64, intensity: f64, duration: f64, dt: f64) -> Vec<ShockwaveSample> {
    let wanted = if duration > 0.0 && dt > 0.0 {
        (duration / dt).ceil() as usize
    } else {
        0
    };
    let count = wanted.clamp(MIN_SHOCKWAVE_SAMPLES, MAX_SHOCKWAVE_SAMPLES);
    let last = (count - 1) as f64;

    (0..count)
        .map(|i| {
            let progress = i as f64 / last;
            let front = radius * progress;
            ShockwaveSample {
                time: duration * progress,
                radius: front,
                intensity: (intensity / (front * front + 1.0)).max(0.0),
            }
        })
        .collect()
}

impl ShockwavePropagator {
    pub fn new(config: ShockwaveConfig, dt: f64) -> Self {
        log::info!("Shockwave propagator initialized");
        Self {
            config,
            dt,
            events: BTreeMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Resolve a shockwave against the current terrain objects
    pub fn apply(&mut self, recipe: &ShockwaveRecipe, env: ShockwaveEnv<'_>) -> ShockwaveReport {
        let weather = env.weather.sanitized();
        let ground = env.terrain.height_at(recipe.x, recipe.z);
        let atmosphere = env.atmosphere.data();
        let relative_density = if atmosphere.surface_density > 0.0 {
            env.atmosphere.density_at(ground) / atmosphere.surface_density
        } else {
            0.0
        };

        let speed = self.config.base_speed * relative_density * (1.0 + weather.wind_scale * 0.1);
        let precipitation = (1.0 - weather.precipitation * 0.2).max(0.0);
        let intensity = recipe.intensity * precipitation;
        let radius = recipe.radius * relative_density * precipitation;
        let duration = if speed > 0.0 { radius / speed } else { 0.0 };

        let mut damaged = Vec::new();
        for object in env.terrain.objects_within(recipe.x, recipe.z, radius) {
            let distance = horizontal_distance(recipe.x, recipe.z, object.x, object.z);
            let local = intensity / (distance * distance + 1.0);
            let threshold = self.config.damage_threshold * object.resistance;

            let destroyed = if local > threshold {
                env.terrain.destroy_object(object.id);
                true
            } else if local > threshold * 0.5 {
                false
            } else {
                continue;
            };

            let body = self.launch(&object, local, recipe.x, recipe.z, env.integrator);
            damaged.push(DamagedObject {
                object_id: object.id,
                kind: object.kind,
                x: object.x,
                z: object.z,
                body,
                destroyed,
            });
        }

        log::debug!(
            "Shockwave {:?}: radius={:.2} m, duration={:.2} s, damaged={}",
            recipe.source,
            radius,
            duration,
            damaged.len()
        );

        let replaced = self.events.insert(
            recipe.source,
            ShockwaveEvent {
                source: recipe.source,
                x: recipe.x,
                z: recipe.z,
                radius,
                intensity,
                duration,
                speed,
                damaged: damaged.clone(),
                profile: profile(radius, intensity, duration, self.dt),
                consumed: false,
            },
        );
        if replaced.is_none() {
            self.order.push_back(recipe.source);
        }
        while self.order.len() > MAX_RETAINED_IMPACTS {
            if let Some(oldest) = self.order.pop_front() {
                self.events.remove(&oldest);
            }
        }

        ShockwaveReport {
            radius,
            intensity,
            duration,
            damaged,
        }
    }

    /// Throw an object outward from the blast center
    fn launch(
        &self,
        object: &TerrainObject,
        local_intensity: f64,
        x: f64,
        z: f64,
        integrator: &mut Integrator,
    ) -> BodyHandle {
        let force = local_intensity * self.config.displacement_coupling;
        let angle = (object.z - z).atan2(object.x - x);
        let speed = (force / object.mass).min(self.config.max_displacement_speed);
        integrator.add_object(
            BodySpec {
                mass: object.mass,
                position: DVec3::new(object.x, object.y + object.height / 2.0, object.z),
                velocity: DVec3::new(angle.cos() * speed, speed * 0.5, angle.sin() * speed),
                area: DISPLACED_AREA,
                shape_factor: 1.0,
                kind: BodyKind::Displaced,
            },
            false,
            0.0,
        )
    }

    /// Replay data for a shockwave; handed out once
    pub fn get_animation_data(&mut self, source: BodyHandle) -> Option<ShockwaveAnimation> {
        let event = self.events.get_mut(&source).filter(|e| !e.consumed)?;
        event.consumed = true;
        Some(ShockwaveAnimation {
            x: event.x,
            z: event.z,
            samples: std::mem::take(&mut event.profile),
            duration: event.duration,
            damaged: event.damaged.clone(),
        })
    }

    pub fn event(&self, source: BodyHandle) -> Option<&ShockwaveEvent> {
        self.events.get(&source)
    }

    /// Number of shockwaves still held
    pub fn retained(&self) -> usize {
        self.events.len()
    }

    pub fn reset(&mut self) {
        self.events.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AtmosphereConfig, PhysicsConfig};
    use crate::consts::SIM_DT;
    use crate::sim::terrain::{Material, SizeTier};

    struct Rig {
        integrator: Integrator,
        terrain: Terrain,
        atmosphere: Atmosphere,
        shockwave: ShockwavePropagator,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                integrator: Integrator::new(&PhysicsConfig::default()),
                terrain: Terrain::flat(SizeTier::Regional, 0.0, Material::Dirt, 1),
                atmosphere: Atmosphere::new(AtmosphereConfig::default(), 1),
                shockwave: ShockwavePropagator::new(ShockwaveConfig::default(), SIM_DT),
            }
        }

        fn fire(&mut self, intensity: f64, radius: f64, weather: WeatherEffects) -> ShockwaveReport {
            self.fire_from(BodyHandle::new(0, 0), intensity, radius, weather)
        }

        fn fire_from(
            &mut self,
            source: BodyHandle,
            intensity: f64,
            radius: f64,
            weather: WeatherEffects,
        ) -> ShockwaveReport {
            let recipe = ShockwaveRecipe {
                source,
                x: 500.0,
                z: 500.0,
                radius,
                intensity,
                duration: radius / 343.0,
            };
            self.shockwave.apply(
                &recipe,
                ShockwaveEnv {
                    integrator: &mut self.integrator,
                    terrain: &mut self.terrain,
                    atmosphere: &self.atmosphere,
                    weather,
                },
            )
        }
    }

    #[test]
    fn test_profile_sample_bounds() {
        let short = profile(10.0, 100.0, 0.001, SIM_DT);
        assert_eq!(short.len(), MIN_SHOCKWAVE_SAMPLES);
        let long = profile(1e4, 100.0, 1e3, SIM_DT);
        assert_eq!(long.len(), MAX_SHOCKWAVE_SAMPLES);

        let mid = profile(100.0, 50.0, 1.0, SIM_DT);
        assert_eq!(mid.len(), 63);
        assert_eq!(mid[0].time, 0.0);
        assert_eq!(mid[0].intensity, 50.0);
        assert!((mid.last().unwrap().time - 1.0).abs() < 1e-12);
        assert!((mid.last().unwrap().radius - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_profile() {
        let samples = profile(0.0, 0.0, 0.0, SIM_DT);
        assert_eq!(samples.len(), MIN_SHOCKWAVE_SAMPLES);
        assert!(samples.iter().all(|s| s.radius == 0.0 && s.time == 0.0));
    }

    #[test]
    fn test_strong_wave_destroys_and_weak_wave_displaces() {
        let mut rig = Rig::new();
        // Tree resistance 0.3: destroy above 3e5, displace above 1.5e5
        let near = rig.terrain.add_object(ObjectKind::Tree, 500.0, 500.0);
        let report = rig.fire(4e5, 50.0, WeatherEffects::calm());
        assert_eq!(report.damaged.len(), 1);
        assert!(report.damaged[0].destroyed);
        assert!(!rig.terrain.object(near).unwrap().intact);

        let mut rig = Rig::new();
        let near = rig.terrain.add_object(ObjectKind::Tree, 500.0, 500.0);
        let report = rig.fire(2e5, 50.0, WeatherEffects::calm());
        assert_eq!(report.damaged.len(), 1);
        assert!(!report.damaged[0].destroyed);
        assert!(rig.terrain.object(near).unwrap().intact);

        let body = rig.integrator.get_state(report.damaged[0].body).unwrap().body;
        assert_eq!(body.kind, BodyKind::Displaced);
        assert_eq!(body.area, DISPLACED_AREA);
        assert_eq!(body.position.y, 5.0);
        assert!(body.velocity.y > 0.0);
    }

    #[test]
    fn test_sub_threshold_wave_leaves_objects() {
        let mut rig = Rig::new();
        rig.terrain.add_object(ObjectKind::Tree, 500.0, 500.0);
        rig.terrain.add_object(ObjectKind::Rock, 510.0, 505.0);
        let report = rig.fire(1e3, 100.0, WeatherEffects::calm());
        assert!(report.damaged.is_empty());
        assert!(rig.terrain.objects().iter().all(|o| o.intact));
        assert!(rig.integrator.is_empty());
    }

    #[test]
    fn test_rain_shrinks_the_wave() {
        let mut rig = Rig::new();
        let dry = rig.fire(1e3, 100.0, WeatherEffects::calm());
        let wet = rig.fire(
            1e3,
            100.0,
            WeatherEffects {
                precipitation: 1.0,
                ..WeatherEffects::calm()
            },
        );
        assert!((wet.radius / dry.radius - 0.8).abs() < 1e-9);
        assert!((wet.intensity / dry.intensity - 0.8).abs() < 1e-9);

        let drowned = rig.fire(
            1e3,
            100.0,
            WeatherEffects {
                precipitation: 10.0,
                ..WeatherEffects::calm()
            },
        );
        assert_eq!(drowned.radius, 0.0);
        assert!(drowned.intensity.is_finite());
    }

    #[test]
    fn test_animation_is_one_shot() {
        let mut rig = Rig::new();
        rig.fire(1e3, 100.0, WeatherEffects::calm());
        let source = BodyHandle::new(0, 0);
        let animation = rig.shockwave.get_animation_data(source).unwrap();
        assert!(animation.samples.len() >= MIN_SHOCKWAVE_SAMPLES);
        assert!(rig.shockwave.get_animation_data(source).is_none());
        assert!(rig.shockwave.event(source).unwrap().profile.is_empty());
        rig.shockwave.reset();
        assert!(rig.shockwave.event(source).is_none());
    }

    #[test]
    fn test_retained_events_are_capped() {
        let mut rig = Rig::new();
        for i in 0..MAX_RETAINED_IMPACTS + 5 {
            rig.fire_from(BodyHandle::new(i as u32, 0), 1e3, 100.0, WeatherEffects::calm());
        }
        assert_eq!(rig.shockwave.retained(), MAX_RETAINED_IMPACTS);
        assert!(rig.shockwave.event(BodyHandle::new(0, 0)).is_none());
        let newest = BodyHandle::new((MAX_RETAINED_IMPACTS + 4) as u32, 0);
        assert!(rig.shockwave.event(newest).is_some());

        // Refiring a held source does not count twice
        rig.fire_from(newest, 1e3, 100.0, WeatherEffects::calm());
        assert_eq!(rig.shockwave.retained(), MAX_RETAINED_IMPACTS);
        assert!(rig.shockwave.event(BodyHandle::new(5, 0)).is_some());
    }
}
