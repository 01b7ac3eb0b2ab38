//! Deterministic simulation module
//!
//! All physics and impact logic lives here. This module must be pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by arena slot / handle)
//! - No rendering or platform dependencies

pub mod atmosphere;
pub mod body;
pub mod ejecta;
pub mod impact;
pub mod integrator;
pub mod rod;
pub mod shockwave;
pub mod terrain;
pub mod weather;
pub mod world;

pub use atmosphere::{
    Atmosphere, AtmosphereData, Layer, Trajectory, TrajectorySample, UpgradeModifiers, WindState,
    default_layers,
};
pub use body::{Body, BodyHandle, BodyKind, BodySnapshot, BodySpec};
pub use ejecta::{DebrisKind, EjectaAnimation, EjectaEnv, EjectaSimulator, SecondaryImpact, roll_kind};
pub use impact::{
    ImpactAnimation, ImpactContext, ImpactEnv, ImpactOutcome, ImpactResolver, PendingImpact,
    RodProfile, ScoreBreakdown, ShockwaveRecipe,
};
pub use integrator::{Gravity, Integrator, StepReport, advance};
pub use rod::{Progression, RodMaterial, RodSpec};
pub use shockwave::{
    DamagedObject, ShockwaveAnimation, ShockwaveEnv, ShockwavePropagator, ShockwaveReport,
};
pub use terrain::{CraterPlan, Material, ObjectKind, SizeTier, Terrain, TerrainData, TerrainObject};
pub use weather::{WeatherEffects, WeatherKind};
pub use world::{DeferredAction, RodFlight, SimEvent, TickSummary, World};
