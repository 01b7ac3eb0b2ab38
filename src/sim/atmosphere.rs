//! Layered atmosphere: density, wind, drag and Coriolis
//!
//! Forces are computed per call from the current layer profile, wind field
//! and modifiers; nothing here mutates bodies. The look-ahead pass
//! (`pre_integrate_trajectory`) runs the same force law and the shared
//! integrator kinematics on a by-value copy of a body.

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodySnapshot};
use super::integrator::{Gravity, advance};
use super::terrain::Terrain;
use super::weather::WeatherEffects;
use crate::config::AtmosphereConfig;
use crate::consts::MAX_TRAJECTORY_STEPS;

/// An altitude band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub min_alt: f64,
    /// `None` extends to infinity
    pub max_alt: Option<f64>,
    pub density_factor: f64,
    /// Wind speed range (m/s)
    pub wind_base: f64,
    pub wind_max: f64,
}

impl Layer {
    fn new(name: &str, min_alt: f64, max_alt: Option<f64>, density_factor: f64, wind: (f64, f64)) -> Self {
        Self {
            name: name.to_string(),
            min_alt,
            max_alt,
            density_factor,
            wind_base: wind.0,
            wind_max: wind.1,
        }
    }

    #[inline]
    pub fn contains(&self, altitude: f64) -> bool {
        altitude >= self.min_alt && self.max_alt.is_none_or(|max| altitude <= max)
    }
}

/// Earth-like layer stack
pub fn default_layers() -> Vec<Layer> {
    vec![
        Layer::new("Troposphere", 0.0, Some(12_000.0), 1.0, (5.0, 20.0)),
        Layer::new("Stratosphere", 12_000.0, Some(50_000.0), 0.1, (10.0, 50.0)),
        Layer::new("Mesosphere", 50_000.0, Some(85_000.0), 0.01, (5.0, 30.0)),
        Layer::new("Thermosphere", 85_000.0, Some(600_000.0), 0.0001, (2.0, 10.0)),
        Layer::new("Exosphere", 600_000.0, None, 0.000001, (0.0, 1.0)),
    ]
}

/// Transient gust on one layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Gust {
    pub active: bool,
    pub magnitude: f64,
    /// Seconds left
    pub remaining: f64,
}

/// Current wind in one layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindState {
    pub speed: f64,
    /// Heading in the x/z plane (radians)
    pub direction: f64,
    /// Heading drift rate
    pub variability: f64,
    pub gust: Gust,
}

/// Weather-driven multipliers currently in effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherModifiers {
    pub density: f64,
    pub wind_scale: f64,
}

impl Default for WeatherModifiers {
    fn default() -> Self {
        Self {
            density: 1.0,
            wind_scale: 1.0,
        }
    }
}

/// Progression-controlled reductions (1.0 = no effect)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpgradeModifiers {
    pub drag_reduction: f64,
    pub wind_resistance: f64,
    pub coriolis_reduction: f64,
}

impl Default for UpgradeModifiers {
    fn default() -> Self {
        Self {
            drag_reduction: 1.0,
            wind_resistance: 1.0,
            coriolis_reduction: 1.0,
        }
    }
}

/// One recorded look-ahead step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySample {
    /// Seconds since the start of the look-ahead, after this step
    pub time: f64,
    pub position: DVec3,
    pub velocity: DVec3,
    /// Kinetic energy; on the landing step this is the energy carried into
    /// the ground
    pub energy: f64,
}

/// Result of a look-ahead pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trajectory {
    pub samples: Vec<TrajectorySample>,
    /// True if the run ended on the ground rather than at the step cap
    pub landed: bool,
}

impl Trajectory {
    /// Final recorded state
    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }

    /// Landing sample, if the body reached the ground within the cap
    pub fn landing(&self) -> Option<&TrajectorySample> {
        if self.landed { self.samples.last() } else { None }
    }

    /// Number of integrator steps until the final sample
    pub fn ticks(&self) -> usize {
        self.samples.len()
    }
}

/// Read-only view for renderers
#[derive(Debug, Clone, Serialize)]
pub struct AtmosphereData<'a> {
    pub layers: &'a [Layer],
    pub wind: &'a [WindState],
    pub surface_density: f64,
    pub scale_height: f64,
    pub weather: WeatherModifiers,
    pub upgrades: UpgradeModifiers,
    pub orbital_phase: bool,
}

/// The atmosphere model
#[derive(Debug, Clone)]
pub struct Atmosphere {
    config: AtmosphereConfig,
    layers: Vec<Layer>,
    wind: Vec<WindState>,
    weather: WeatherModifiers,
    upgrades: UpgradeModifiers,
    orbital_phase: bool,
    seed: u64,
    rng: Pcg32,
}

fn positive_or_one(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 1.0 }
}

impl Atmosphere {
    pub fn new(config: AtmosphereConfig, seed: u64) -> Self {
        let layers = if config.layers.is_empty() {
            default_layers()
        } else {
            config.layers.clone()
        };
        let mut atmosphere = Self {
            config,
            layers,
            wind: Vec::new(),
            weather: WeatherModifiers::default(),
            upgrades: UpgradeModifiers::default(),
            orbital_phase: false,
            seed,
            rng: Pcg32::seed_from_u64(seed),
        };
        atmosphere.wind = atmosphere.fresh_wind_field();
        log::info!(
            "Atmosphere initialized: density={}, scale height={}, {} layers",
            atmosphere.config.surface_density,
            atmosphere.config.scale_height,
            atmosphere.layers.len()
        );
        atmosphere
    }

    fn fresh_wind_field(&mut self) -> Vec<WindState> {
        let rng = &mut self.rng;
        self.layers
            .iter()
            .map(|layer| WindState {
                speed: layer.wind_base + rng.random::<f64>() * (layer.wind_max - layer.wind_base),
                direction: rng.random::<f64>() * std::f64::consts::TAU,
                variability: rng.random::<f64>() * 0.1,
                gust: Gust::default(),
            })
            .collect()
    }

    /// Default layers, fresh wind, neutral weather and upgrades
    pub fn reset(&mut self) {
        self.layers = if self.config.layers.is_empty() {
            default_layers()
        } else {
            self.config.layers.clone()
        };
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.wind = self.fresh_wind_field();
        self.weather = WeatherModifiers::default();
        self.upgrades = UpgradeModifiers::default();
        self.orbital_phase = false;
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Index of the layer containing an altitude (last layer as fallback)
    pub fn layer_index(&self, altitude: f64) -> usize {
        self.layers
            .iter()
            .position(|layer| layer.contains(altitude))
            .unwrap_or(self.layers.len().saturating_sub(1))
    }

    /// Layer containing an altitude
    pub fn layer_at(&self, altitude: f64) -> &Layer {
        &self.layers[self.layer_index(altitude)]
    }

    /// Air density at an altitude
    pub fn density_at(&self, altitude: f64) -> f64 {
        let base = self.config.surface_density * (-altitude / self.config.scale_height).exp();
        base * self.layer_at(altitude).density_factor * self.weather.density
    }

    /// Wind vector at an altitude (horizontal only)
    pub fn wind_at(&self, altitude: f64) -> DVec3 {
        let wind = &self.wind[self.layer_index(altitude)];
        let gust = if wind.gust.active { wind.gust.magnitude } else { 0.0 };
        let speed = wind.speed * self.weather.wind_scale + gust;
        DVec3::new(speed * wind.direction.cos(), 0.0, speed * wind.direction.sin())
    }

    /// Drag plus Coriolis force on a body
    pub fn forces_on(&self, body: &Body) -> DVec3 {
        self.drag_on(body) + self.coriolis_on(body)
    }

    /// Quadratic drag against the wind-relative velocity
    pub fn drag_on(&self, body: &Body) -> DVec3 {
        let altitude = body.position.y;
        let density = self.density_at(altitude);
        let wind = self.wind_at(altitude);
        let resist = self.upgrades.wind_resistance;

        let relative = DVec3::new(
            body.velocity.x - wind.x * resist,
            body.velocity.y - wind.y,
            body.velocity.z - wind.z * resist,
        );
        let speed = relative.length();
        let magnitude = 0.5
            * density
            * speed
            * speed
            * body.area
            * body.shape_factor
            * self.upgrades.drag_reduction;
        let denominator = if speed > 0.0 { speed } else { 1.0 };
        -relative / denominator * magnitude
    }

    /// Scaled Coriolis pseudo-force 2mω(v_z, 0, -v_x)
    pub fn coriolis_on(&self, body: &Body) -> DVec3 {
        let omega = std::f64::consts::TAU / self.config.rotation_period;
        let scale = if self.orbital_phase {
            self.config.orbital_coriolis_scale
        } else {
            self.config.surface_coriolis_scale
        };
        let coriolis = DVec3::new(body.velocity.z, 0.0, -body.velocity.x) * (2.0 * body.mass * omega);
        coriolis * scale * self.upgrades.coriolis_reduction
    }

    /// Speed at which drag balances gravity at the body's altitude.
    /// Diagnostic only; infinite in vacuum.
    pub fn terminal_velocity(&self, body: &Body, gravity: &Gravity) -> f64 {
        let density = self.density_at(body.position.y);
        let g = gravity.at_altitude(body.position.y);
        let resistance = density * body.area * body.shape_factor * self.upgrades.drag_reduction;
        if resistance > 0.0 {
            ((2.0 * body.mass * g) / resistance).sqrt()
        } else {
            f64::INFINITY
        }
    }

    /// Predict a fall on a disposable copy of the body.
    ///
    /// Runs forces + gravity + kinematics + terrain contact for at most
    /// `MAX_TRAJECTORY_STEPS` steps, stopping at the first contact. The live
    /// integrator is never consulted or modified.
    pub fn pre_integrate_trajectory(
        &self,
        initial: &BodySnapshot,
        terrain: &Terrain,
        gravity: &Gravity,
        dt: f64,
    ) -> Trajectory {
        let mut body = initial.body;
        let mut trajectory = Trajectory {
            samples: Vec::new(),
            landed: false,
        };
        if !body.active {
            return trajectory;
        }

        for step in 0..MAX_TRAJECTORY_STEPS {
            let force = self.forces_on(&body);
            body.push(force);
            let landed = advance(&mut body, gravity, dt, terrain);

            trajectory.samples.push(TrajectorySample {
                time: (step + 1) as f64 * dt,
                position: body.position,
                velocity: if landed { body.impact_velocity } else { body.velocity },
                energy: if landed { body.impact_energy() } else { body.energy },
            });

            if landed {
                trajectory.landed = true;
                break;
            }
        }

        trajectory
    }

    /// Slow random walk of wind heading and speed, gust countdown
    pub fn update(&mut self, dt: f64) {
        for (layer, wind) in self.layers.iter().zip(self.wind.iter_mut()) {
            wind.direction += wind.variability * dt * (self.rng.random::<f64>() - 0.5);
            wind.speed = (wind.speed + (self.rng.random::<f64>() - 0.5) * dt)
                .clamp(layer.wind_base.min(layer.wind_max), layer.wind_max.max(layer.wind_base));

            if wind.gust.active {
                wind.gust.remaining -= dt;
                if wind.gust.remaining <= 0.0 {
                    wind.gust = Gust::default();
                }
            }
        }
    }

    /// Take this tick's weather: modifiers plus a gust roll per layer
    pub fn apply_weather(&mut self, effects: &WeatherEffects) {
        let effects = effects.sanitized();
        self.weather = WeatherModifiers {
            density: effects.density,
            wind_scale: effects.wind_scale,
        };

        if effects.gust_chance <= 0.0 {
            return;
        }
        for wind in self.wind.iter_mut() {
            if self.rng.random::<f64>() < effects.gust_chance {
                wind.gust = Gust {
                    active: true,
                    magnitude: effects.gust_magnitude,
                    remaining: effects.gust_duration,
                };
            }
        }
    }

    /// Install progression reductions (non-positive values mean 1.0)
    pub fn apply_upgrades(&mut self, upgrades: UpgradeModifiers) {
        self.upgrades = UpgradeModifiers {
            drag_reduction: positive_or_one(upgrades.drag_reduction),
            wind_resistance: positive_or_one(upgrades.wind_resistance),
            coriolis_reduction: positive_or_one(upgrades.coriolis_reduction),
        };
    }

    pub fn set_orbital_phase(&mut self, orbital: bool) {
        self.orbital_phase = orbital;
    }

    /// Replace the wind state of a layer (scripted scenarios)
    pub fn set_wind(&mut self, layer: usize, speed: f64, direction: f64) {
        if let Some(wind) = self.wind.get_mut(layer) {
            wind.speed = speed;
            wind.direction = direction;
            wind.gust = Gust::default();
        }
    }

    pub fn weather(&self) -> WeatherModifiers {
        self.weather
    }

    /// Read-only snapshot for renderers
    pub fn data(&self) -> AtmosphereData<'_> {
        AtmosphereData {
            layers: &self.layers,
            wind: &self.wind,
            surface_density: self.config.surface_density,
            scale_height: self.config.scale_height,
            weather: self.weather,
            upgrades: self.upgrades,
            orbital_phase: self.orbital_phase,
        }
    }
}
