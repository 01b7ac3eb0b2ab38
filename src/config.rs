//! Simulation tuning
//!
//! Every numeric knob of the core lives here so balance can be data-driven.
//! Missing fields fall back to the defaults below, which reproduce the
//! stock Earth-like world.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::atmosphere::{Layer, default_layers};

/// Planetary constants and integrator timestep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Surface gravity (m/s²)
    pub gravity: f64,
    /// Planet radius used for inverse-square falloff (m)
    pub planet_radius: f64,
    /// Fixed timestep (s)
    pub time_step: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            planet_radius: PLANET_RADIUS,
            time_step: SIM_DT,
        }
    }
}

/// Atmosphere profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    pub surface_density: f64,
    pub scale_height: f64,
    pub rotation_period: f64,
    /// Coriolis scale while the rod is still in orbit
    pub orbital_coriolis_scale: f64,
    /// Coriolis scale during atmospheric flight
    pub surface_coriolis_scale: f64,
    pub layers: Vec<Layer>,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            surface_density: SURFACE_DENSITY,
            scale_height: SCALE_HEIGHT,
            rotation_period: ROTATION_PERIOD,
            orbital_coriolis_scale: 0.1,
            surface_coriolis_scale: 0.01,
            layers: default_layers(),
        }
    }
}

/// Terrain generation and crater sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Surface objects per square meter
    pub object_density: f64,
    /// Fraction of generated objects that are trees (rest are rocks)
    pub tree_fraction: f64,
    /// Crater radius coefficient (k₁)
    pub crater_coefficient: f64,
    /// Crater radius root (radius ∝ E^(1/exponent))
    pub crater_exponent: f64,
    /// Crater depth as a fraction of radius
    pub depth_ratio: f64,
    /// Energy per debris seed (J)
    pub energy_per_debris: f64,
    /// Energy scale for the pre-shockwave radius, sqrt(E / scale)
    pub shockwave_energy_scale: f64,
    /// Force needed per unit of object resistance to pre-flag destruction
    pub object_break_force: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            object_density: 0.005,
            tree_fraction: 0.7,
            crater_coefficient: 0.015,
            crater_exponent: 3.4,
            depth_ratio: 0.15,
            energy_per_debris: 1e6,
            shockwave_energy_scale: 1e5,
            object_break_force: 100.0,
        }
    }
}

/// Impact scoring and recipe constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub base_score_multiplier: f64,
    pub resistance_bonus: f64,
    pub efficiency_bonus: f64,
    /// Specific energy (J/kg) at which the efficiency bonus saturates
    pub efficiency_scale: f64,
    /// Explosion animation length (s)
    pub explosion_duration: f64,
    pub sound_speed: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            base_score_multiplier: 0.001,
            resistance_bonus: 2.0,
            efficiency_bonus: 1.5,
            efficiency_scale: 1e6,
            explosion_duration: 2.0,
            sound_speed: SOUND_SPEED,
        }
    }
}

/// Ejecta generation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EjectaConfig {
    /// Above this energy the particle count doubles and boulders appear
    pub massive_impact_energy: f64,
    /// Above this energy flaming debris can appear
    pub flaming_energy: f64,
    /// Above this energy flaming boulders can appear (massive impacts only)
    pub flaming_boulder_energy: f64,
    /// Minimum particle mass for a secondary crater (kg)
    pub secondary_mass_threshold: f64,
    /// Minimum particle energy for a secondary crater (J)
    pub secondary_energy_threshold: f64,
    /// Vertical speed factor applied on wet ground when debris turns to dirt
    pub wet_damping: f64,
}

impl Default for EjectaConfig {
    fn default() -> Self {
        Self {
            massive_impact_energy: 1e10,
            flaming_energy: 1e9,
            flaming_boulder_energy: 1e10,
            secondary_mass_threshold: 50.0,
            secondary_energy_threshold: 1e6,
            wet_damping: 0.9,
        }
    }
}

/// Shockwave propagation and damage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockwaveConfig {
    pub base_speed: f64,
    /// Intensity (J/m²) needed per unit of object resistance to destroy it
    pub damage_threshold: f64,
    /// Cap on the speed of displaced objects (m/s)
    pub max_displacement_speed: f64,
    /// Fraction of local intensity converted to displacement force
    pub displacement_coupling: f64,
}

impl Default for ShockwaveConfig {
    fn default() -> Self {
        Self {
            base_speed: SOUND_SPEED,
            damage_threshold: 1e6,
            max_displacement_speed: 50.0,
            displacement_coupling: 0.1,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed; each component derives its own RNG stream from it
    pub seed: u64,
    pub physics: PhysicsConfig,
    pub atmosphere: AtmosphereConfig,
    pub terrain: TerrainConfig,
    pub impact: ImpactConfig,
    pub ejecta: EjectaConfig,
    pub shockwave: ShockwaveConfig,
}

impl SimConfig {
    /// Parse a configuration from JSON (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a JSON file, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded simulation config from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("Invalid config {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Could not read config {}: {}", path.display(), e),
        }

        log::info!("Using default simulation config");
        Self::default()
    }

    /// Builder-style seed override
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(r#"{ "seed": 7, "physics": { "gravity": 3.7 } }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.physics.gravity, 3.7);
        assert_eq!(config.physics.planet_radius, PLANET_RADIUS);
        assert_eq!(config.atmosphere.layers.len(), 5);
        assert_eq!(config.shockwave.damage_threshold, 1e6);
    }

    #[test]
    fn test_json_roundtrip_keeps_unbounded_layer() {
        let config = SimConfig::default();
        let json = config.to_json().unwrap();
        let back = SimConfig::from_json(&json).unwrap();
        assert_eq!(back.atmosphere.layers.last().unwrap().max_alt, None);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = SimConfig::load_or_default("/definitely/not/here.json");
        assert_eq!(config.seed, 0);
        assert_eq!(config.physics.time_step, SIM_DT);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(SimConfig::from_json("{ not json").is_err());
    }
}
