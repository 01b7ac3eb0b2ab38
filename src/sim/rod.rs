//! Rod materials and progression inputs
//!
//! The upgrade economy lives outside the core; it hands us a read-only
//! `Progression` and the rod it wants dropped.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::atmosphere::UpgradeModifiers;
use super::body::{BodyKind, BodySpec};
use super::terrain::SizeTier;
use crate::consts::ORBITAL_PHASE_ALTITUDE;

/// Speed above which weak rods start to break up (m/s)
pub const DEGRADATION_SPEED: f64 = 1000.0;
/// Rods at or above this strength never break up
pub const DEGRADATION_STRENGTH: f64 = 0.8;

/// Rod materials, weakest and lightest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RodMaterial {
    Wood,
    Pvc,
    Aluminum,
    Titanium,
    #[default]
    Steel,
    Lead,
    Tungsten,
    Osmium,
    Unobtanium,
    Neutronium,
    Hyperdense,
}

impl RodMaterial {
    pub const ALL: [RodMaterial; 11] = [
        RodMaterial::Wood,
        RodMaterial::Pvc,
        RodMaterial::Aluminum,
        RodMaterial::Titanium,
        RodMaterial::Steel,
        RodMaterial::Lead,
        RodMaterial::Tungsten,
        RodMaterial::Osmium,
        RodMaterial::Unobtanium,
        RodMaterial::Neutronium,
        RodMaterial::Hyperdense,
    ];

    /// kg/m³
    pub fn density(self) -> f64 {
        match self {
            RodMaterial::Wood => 700.0,
            RodMaterial::Pvc => 1380.0,
            RodMaterial::Aluminum => 2700.0,
            RodMaterial::Titanium => 4500.0,
            RodMaterial::Steel => 7850.0,
            RodMaterial::Lead => 11_340.0,
            RodMaterial::Tungsten => 19_250.0,
            RodMaterial::Osmium => 22_590.0,
            RodMaterial::Unobtanium => 50_000.0,
            RodMaterial::Neutronium => 1e6,
            RodMaterial::Hyperdense => 1e8,
        }
    }

    /// Structural strength in [0, 1]
    pub fn strength(self) -> f64 {
        match self {
            RodMaterial::Wood => 0.15,
            RodMaterial::Pvc => 0.2,
            RodMaterial::Aluminum => 0.3,
            RodMaterial::Titanium => 0.6,
            RodMaterial::Steel => 0.5,
            RodMaterial::Lead => 0.4,
            RodMaterial::Tungsten => 0.9,
            RodMaterial::Osmium => 0.85,
            RodMaterial::Unobtanium => 0.95,
            RodMaterial::Neutronium => 0.98,
            RodMaterial::Hyperdense => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RodMaterial::Wood => "Wood",
            RodMaterial::Pvc => "PVC",
            RodMaterial::Aluminum => "Aluminum",
            RodMaterial::Titanium => "Titanium",
            RodMaterial::Steel => "Steel",
            RodMaterial::Lead => "Lead",
            RodMaterial::Tungsten => "Tungsten",
            RodMaterial::Osmium => "Osmium",
            RodMaterial::Unobtanium => "Unobtanium",
            RodMaterial::Neutronium => "Neutronium",
            RodMaterial::Hyperdense => "Hyperdense",
        }
    }
}

/// Cylinder geometry plus material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RodSpec {
    pub material: RodMaterial,
    /// m
    pub length: f64,
    /// m
    pub radius: f64,
    pub shape_factor: f64,
}

impl Default for RodSpec {
    fn default() -> Self {
        Self {
            material: RodMaterial::Steel,
            length: 0.5,
            radius: 0.05,
            shape_factor: 1.0,
        }
    }
}

/// Result of a break-up check
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RodDegradation {
    pub degraded: bool,
    pub mass: f64,
    pub shape_factor: f64,
}

impl RodSpec {
    pub fn new(material: RodMaterial, length: f64, radius: f64) -> Self {
        Self {
            material,
            length,
            radius,
            ..Default::default()
        }
    }

    /// Frontal area πr²
    #[inline]
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }

    /// density·πr²·L
    #[inline]
    pub fn mass(&self) -> f64 {
        self.material.density() * self.area() * self.length
    }

    #[inline]
    pub fn strength(&self) -> f64 {
        self.material.strength()
    }

    /// Body spec for dropping this rod from rest at `position`
    pub fn body_spec(&self, position: DVec3) -> BodySpec {
        BodySpec {
            mass: self.mass(),
            position,
            velocity: DVec3::ZERO,
            area: self.area(),
            shape_factor: self.shape_factor,
            kind: BodyKind::Rod,
        }
    }

    /// Weak rods above 1000 m/s lose half their mass and tumble (shape ×1.5)
    pub fn check_degradation(&self, speed: f64) -> RodDegradation {
        let mass = self.mass();
        if speed > DEGRADATION_SPEED && self.strength() < DEGRADATION_STRENGTH {
            RodDegradation {
                degraded: true,
                mass: mass * 0.5,
                shape_factor: self.shape_factor * 1.5,
            }
        } else {
            RodDegradation {
                degraded: false,
                mass,
                shape_factor: self.shape_factor,
            }
        }
    }
}

/// Read-only progression state supplied by the upgrade economy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progression {
    pub upgrade_level: u32,
    pub orbital_phase: bool,
    /// Drop height (m)
    pub launch_height: f64,
    pub explosion_multiplier: f64,
    pub upgrades: UpgradeModifiers,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            upgrade_level: 0,
            orbital_phase: false,
            launch_height: 10.0,
            explosion_multiplier: 1.0,
            upgrades: UpgradeModifiers::default(),
        }
    }
}

impl Progression {
    /// Set the drop height; orbital phase starts at 160 km
    pub fn with_launch_height(mut self, height: f64) -> Self {
        self.launch_height = height.max(0.0);
        self.orbital_phase = self.launch_height >= ORBITAL_PHASE_ALTITUDE;
        self
    }

    pub fn with_upgrade_level(mut self, level: u32) -> Self {
        self.upgrade_level = level;
        self
    }

    #[inline]
    pub fn size_tier(&self) -> SizeTier {
        SizeTier::for_progression(self.upgrade_level, self.orbital_phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materials_get_denser() {
        for pair in RodMaterial::ALL.windows(2) {
            assert!(pair[0].density() < pair[1].density(), "{:?}", pair);
        }
    }

    #[test]
    fn test_steel_rod_mass() {
        let rod = RodSpec::default();
        let expected = 7850.0 * std::f64::consts::PI * 0.05 * 0.05 * 0.5;
        assert!((rod.mass() - expected).abs() < 1e-9);

        let spec = rod.body_spec(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(spec.kind, BodyKind::Rod);
        assert_eq!(spec.position, DVec3::new(1.0, 2.0, 3.0));
        assert!((spec.area - rod.area()).abs() < 1e-12);
    }

    #[test]
    fn test_degradation_only_for_weak_fast_rods() {
        let wood = RodSpec::new(RodMaterial::Wood, 1.0, 0.1);
        assert!(!wood.check_degradation(900.0).degraded);
        let broken = wood.check_degradation(1500.0);
        assert!(broken.degraded);
        assert!((broken.mass - wood.mass() * 0.5).abs() < 1e-9);
        assert_eq!(broken.shape_factor, 1.5);

        let tungsten = RodSpec::new(RodMaterial::Tungsten, 1.0, 0.1);
        assert!(!tungsten.check_degradation(1e5).degraded);
    }

    #[test]
    fn test_orbital_threshold() {
        assert!(!Progression::default().with_launch_height(159_999.0).orbital_phase);
        let orbital = Progression::default().with_launch_height(160_000.0);
        assert!(orbital.orbital_phase);
        assert_eq!(orbital.size_tier(), SizeTier::Orbital);
        assert_eq!(
            Progression::default().with_upgrade_level(6).size_tier(),
            SizeTier::Regional
        );
    }
}
