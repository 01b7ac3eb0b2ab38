//! Rod Impact - kinetic impact simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integrator, atmosphere, terrain, impacts)
//! - `config`: Data-driven tuning loaded from JSON

pub mod config;
pub mod sim;

pub use config::SimConfig;

/// Simulation constants and hard caps
pub mod consts {
    /// Fixed simulation timestep (~60 Hz)
    pub const SIM_DT: f64 = 0.016;

    /// Surface gravity (m/s²)
    pub const STANDARD_GRAVITY: f64 = 9.81;
    /// Planet radius (m)
    pub const PLANET_RADIUS: f64 = 6_371_000.0;
    /// Sea level air density (kg/m³)
    pub const SURFACE_DENSITY: f64 = 1.225;
    /// Exponential atmosphere scale height (m)
    pub const SCALE_HEIGHT: f64 = 8000.0;
    /// Sidereal-ish rotation period (s)
    pub const ROTATION_PERIOD: f64 = 86_400.0;
    /// Speed of sound at the surface (m/s)
    pub const SOUND_SPEED: f64 = 343.0;

    /// Look-ahead trajectory step cap
    pub const MAX_TRAJECTORY_STEPS: usize = 10_000;
    /// Per-particle ejecta step cap
    pub const MAX_EJECTA_STEPS: usize = 1000;
    /// Ejecta particle cap for massive impacts
    pub const MAX_EJECTA_PARTICLES: usize = 200;
    /// Debris seed cap per impact
    pub const MAX_DEBRIS_SEEDS: usize = 100;
    /// Surface object cap per terrain generation
    pub const MAX_TERRAIN_OBJECTS: usize = 5000;
    /// Applied impacts whose records (outcome, ejecta, shockwave) are kept
    pub const MAX_RETAINED_IMPACTS: usize = 64;
    /// Shockwave profile sample bounds
    pub const MIN_SHOCKWAVE_SAMPLES: usize = 10;
    pub const MAX_SHOCKWAVE_SAMPLES: usize = 200;

    /// Launch height at which the run switches to the orbital phase (m)
    pub const ORBITAL_PHASE_ALTITUDE: f64 = 160_000.0;
    /// Delay between orbital insertion and de-orbit burn (ticks, ~1 s)
    pub const DEORBIT_DELAY_TICKS: u64 = 62;
    /// De-orbit impulse factor
    pub const DEORBIT_FACTOR: f64 = 0.1;
}

/// Horizontal (x/z plane) distance between two points
#[inline]
pub fn horizontal_distance(ax: f64, az: f64, bx: f64, bz: f64) -> f64 {
    let dx = ax - bx;
    let dz = az - bz;
    (dx * dx + dz * dz).sqrt()
}

/// Sphere-equivalent radius used for debris sizing
///
/// Debris is treated as a ball of unit-ish density (1000 kg/m³ over π), which
/// keeps drag areas in a sensible range for 1-1000 kg chunks.
#[inline]
pub fn equivalent_radius(mass: f64) -> f64 {
    (mass.max(0.0) / (1000.0 * std::f64::consts::PI)).cbrt()
}

/// Frontal area of a sphere-equivalent chunk of the given mass
#[inline]
pub fn equivalent_area(mass: f64) -> f64 {
    let r = equivalent_radius(mass);
    std::f64::consts::PI * r * r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_distance_ignores_height() {
        assert!((horizontal_distance(0.0, 0.0, 3.0, 4.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_equivalent_area_grows_with_mass() {
        assert!(equivalent_area(100.0) > equivalent_area(10.0));
        assert_eq!(equivalent_area(0.0), 0.0);
    }
}
