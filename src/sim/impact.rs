//! Impact resolution
//!
//! Each rod impact moves through none → pending → applied, keyed by the
//! rod's `BodyHandle`. The pending record is built ahead of time from the
//! look-ahead landing point so terrain, shockwave and ejecta recipes are
//! ready when the rod actually lands; `handle_impact` then commits them
//! exactly once.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use super::atmosphere::Atmosphere;
use super::body::{BodyHandle, BodySnapshot};
use super::ejecta::{EjectaEnv, EjectaSimulator};
use super::integrator::Integrator;
use super::shockwave::{ShockwaveEnv, ShockwavePropagator};
use super::terrain::{CraterPlan, DebrisSeed, Terrain};
use super::weather::WeatherEffects;
use crate::config::ImpactConfig;
use crate::consts::{MAX_DEBRIS_SEEDS, MAX_RETAINED_IMPACTS};

/// Rod properties that feed scoring and ejecta
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RodProfile {
    pub mass: f64,
    /// Structural strength in [0, 1]
    pub strength: f64,
}

impl Default for RodProfile {
    fn default() -> Self {
        Self {
            mass: 1.0,
            strength: 1.0,
        }
    }
}

/// Everything outside the terrain that shapes an impact
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactContext {
    pub weather: WeatherEffects,
    pub rod: RodProfile,
    pub explosion_multiplier: f64,
}

impl Default for ImpactContext {
    fn default() -> Self {
        Self {
            weather: WeatherEffects::calm(),
            rod: RodProfile::default(),
            explosion_multiplier: 1.0,
        }
    }
}

/// Score as a product of factors: `score = base·resistance·weather·
/// material·efficiency·explosion`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// (E/1000)·base multiplier
    pub base: f64,
    /// 1 + 2r
    pub resistance: f64,
    /// Weather wind scale
    pub weather: f64,
    /// Rod strength
    pub material: f64,
    /// 1 + min(1, specific energy / scale)·1.5
    pub efficiency: f64,
    pub explosion: f64,
}

impl ScoreBreakdown {
    #[inline]
    pub fn total(&self) -> f64 {
        self.base * self.resistance * self.weather * self.material * self.efficiency * self.explosion
    }
}

/// How many ejecta particles to throw and with what
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EjectaRecipe {
    pub count: usize,
    pub debris: Vec<DebrisSeed>,
    /// 0.1·(1−r)·strength
    pub energy_fraction: f64,
}

/// Where and how hard the shockwave starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShockwaveRecipe {
    pub source: BodyHandle,
    pub x: f64,
    pub z: f64,
    pub radius: f64,
    /// J/m²
    pub intensity: f64,
    pub duration: f64,
}

/// Final numbers for an applied impact
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactOutcome {
    pub score: f64,
    pub energy: f64,
    pub crater_radius: f64,
    pub crater_depth: f64,
    pub breakdown: ScoreBreakdown,
    /// Ejecta particles thrown
    pub ejected: usize,
    /// Objects destroyed or displaced by the shockwave
    pub damaged_objects: usize,
}

/// Planned (and possibly applied) impact for one rod
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingImpact {
    pub handle: BodyHandle,
    pub plan: CraterPlan,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// 0.5·crater radius
    pub explosion_radius: f64,
    /// 0.3·E
    pub explosion_energy: f64,
    pub ejecta: EjectaRecipe,
    pub shockwave: ShockwaveRecipe,
    pub context: ImpactContext,
    pub applied: bool,
    pub outcome: Option<ImpactOutcome>,
}

/// Read-only view of an applied impact for the explosion effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactAnimation {
    pub x: f64,
    pub z: f64,
    pub energy: f64,
    pub crater_radius: f64,
    pub crater_depth: f64,
    pub explosion_radius: f64,
    pub explosion_energy: f64,
    pub explosion_duration: f64,
    pub shockwave_radius: f64,
    pub shockwave_duration: f64,
}

/// Collaborators an impact writes into
pub struct ImpactEnv<'a> {
    pub integrator: &'a mut Integrator,
    pub terrain: &'a mut Terrain,
    pub atmosphere: &'a Atmosphere,
    pub ejecta: &'a mut EjectaSimulator,
    pub shockwave: &'a mut ShockwavePropagator,
    /// Used when no pending record exists for the colliding body
    pub ctx: ImpactContext,
}

/// Scores impacts and drives their side effects
#[derive(Debug, Clone)]
pub struct ImpactResolver {
    config: ImpactConfig,
    pending: BTreeMap<BodyHandle, PendingImpact>,
    /// Applied handles, oldest first
    settled: VecDeque<BodyHandle>,
    total_score: f64,
}

impl ImpactResolver {
    pub fn new(config: ImpactConfig) -> Self {
        log::info!("Impact resolver initialized");
        Self {
            config,
            pending: BTreeMap::new(),
            settled: VecDeque::new(),
            total_score: 0.0,
        }
    }

    /// Score for an impact of `energy` on ground of resistance `resistance`
    pub fn score_breakdown(&self, energy: f64, resistance: f64, ctx: &ImpactContext) -> ScoreBreakdown {
        let energy = energy.max(0.0);
        let weather = ctx.weather.sanitized();
        let specific_energy = if ctx.rod.mass > 0.0 {
            energy / ctx.rod.mass
        } else {
            0.0
        };
        ScoreBreakdown {
            base: energy / 1000.0 * self.config.base_score_multiplier,
            resistance: 1.0 + resistance * self.config.resistance_bonus,
            weather: weather.wind_scale,
            material: ctx.rod.strength,
            efficiency: 1.0
                + (specific_energy / self.config.efficiency_scale).min(1.0) * self.config.efficiency_bonus,
            explosion: ctx.explosion_multiplier,
        }
    }

    fn plan(
        &self,
        x: f64,
        z: f64,
        energy: f64,
        handle: BodyHandle,
        terrain: &mut Terrain,
        ctx: &ImpactContext,
    ) -> PendingImpact {
        let energy = energy.max(0.0);
        let plan = terrain.precalculate_impact(x, z, energy);
        let breakdown = self.score_breakdown(energy, plan.resistance, ctx);

        let count = ((energy / 1e6).floor() as usize).min(MAX_DEBRIS_SEEDS);
        let ejecta = EjectaRecipe {
            count,
            debris: terrain.get_debris(x, z, energy),
            energy_fraction: 0.1 * (1.0 - plan.resistance) * ctx.rod.strength,
        };

        let radius = (energy / 1e5).sqrt();
        let intensity = if radius > 0.0 {
            energy / (4.0 * std::f64::consts::PI * radius * radius)
        } else {
            0.0
        };
        let shockwave = ShockwaveRecipe {
            source: handle,
            x,
            z,
            radius,
            intensity,
            duration: radius / self.config.sound_speed,
        };

        PendingImpact {
            handle,
            explosion_radius: plan.radius * 0.5,
            explosion_energy: energy * 0.3,
            score: breakdown.total(),
            breakdown,
            plan,
            ejecta,
            shockwave,
            context: *ctx,
            applied: false,
            outcome: None,
        }
    }

    /// Plan an impact for `handle` ahead of time. Replaces any earlier plan
    /// for the same handle unless that one was already applied, in which
    /// case `None` is returned and nothing changes.
    pub fn precalculate_impact(
        &mut self,
        x: f64,
        z: f64,
        energy: f64,
        handle: BodyHandle,
        terrain: &mut Terrain,
        ctx: &ImpactContext,
    ) -> Option<&PendingImpact> {
        if self.pending.get(&handle).is_some_and(|p| p.applied) {
            return None;
        }
        let pending = self.plan(x, z, energy, handle, terrain, ctx);
        log::debug!(
            "Pre-calculated impact for {:?}: E={:.3e} J, crater={:.2} m, score={:.1}",
            handle,
            pending.plan.energy,
            pending.plan.radius,
            pending.score
        );
        self.pending.insert(handle, pending);
        self.pending.get(&handle)
    }

    /// Commit the impact of a collided body: crater, shockwave, then ejecta.
    ///
    /// Plans synchronously from the snapshot when no current plan exists.
    /// Score is accumulated once; any later call for the same handle
    /// returns the stored outcome without side effects.
    pub fn handle_impact(&mut self, snapshot: &BodySnapshot, env: ImpactEnv<'_>) -> ImpactOutcome {
        let handle = snapshot.handle;

        let needs_plan = match self.pending.get(&handle) {
            Some(pending) => {
                if let (true, Some(outcome)) = (pending.applied, pending.outcome) {
                    return outcome;
                }
                !env.terrain.is_current(&pending.plan)
            }
            None => true,
        };

        if needs_plan {
            log::debug!("No current plan for {:?}, calculating at impact", handle);
            let pending = self.plan(
                snapshot.body.position.x,
                snapshot.body.position.z,
                snapshot.body.impact_energy(),
                handle,
                env.terrain,
                &env.ctx,
            );
            self.pending.insert(handle, pending);
        }

        let Some(pending) = self.pending.get_mut(&handle) else {
            return ImpactOutcome {
                score: 0.0,
                energy: 0.0,
                crater_radius: 0.0,
                crater_depth: 0.0,
                breakdown: self.score_breakdown(0.0, 0.0, &env.ctx),
                ejected: 0,
                damaged_objects: 0,
            };
        };

        env.terrain.apply_pending_impact(&pending.plan);

        let report = env.shockwave.apply(
            &pending.shockwave,
            ShockwaveEnv {
                integrator: &mut *env.integrator,
                terrain: &mut *env.terrain,
                atmosphere: env.atmosphere,
                weather: pending.context.weather,
            },
        );

        let ejected = env.ejecta.process(
            snapshot,
            pending,
            EjectaEnv {
                integrator: &mut *env.integrator,
                terrain: &mut *env.terrain,
                weather: pending.context.weather,
            },
        );

        let outcome = ImpactOutcome {
            score: pending.score,
            energy: pending.plan.energy,
            crater_radius: pending.plan.radius,
            crater_depth: pending.plan.depth,
            breakdown: pending.breakdown,
            ejected,
            damaged_objects: report.damaged.len(),
        };
        pending.applied = true;
        pending.outcome = Some(outcome);
        pending.ejecta.debris = Vec::new();
        self.total_score += outcome.score;

        log::info!(
            "Impact {:?}: E={:.3e} J, crater r={:.2} m, score={:.1}, ejecta={}, damaged={}",
            handle,
            outcome.energy,
            outcome.crater_radius,
            outcome.score,
            outcome.ejected,
            outcome.damaged_objects
        );

        self.settled.push_back(handle);
        while self.settled.len() > MAX_RETAINED_IMPACTS {
            if let Some(oldest) = self.settled.pop_front() {
                self.pending.remove(&oldest);
            }
        }
        outcome
    }

    /// Explosion parameters of an applied impact
    pub fn get_impact_animation_data(&self, handle: BodyHandle) -> Option<ImpactAnimation> {
        let pending = self.pending.get(&handle).filter(|p| p.applied)?;
        Some(ImpactAnimation {
            x: pending.plan.x,
            z: pending.plan.z,
            energy: pending.plan.energy,
            crater_radius: pending.plan.radius,
            crater_depth: pending.plan.depth,
            explosion_radius: pending.explosion_radius,
            explosion_energy: pending.explosion_energy,
            explosion_duration: self.config.explosion_duration,
            shockwave_radius: pending.shockwave.radius,
            shockwave_duration: pending.shockwave.duration,
        })
    }

    pub fn pending(&self, handle: BodyHandle) -> Option<&PendingImpact> {
        self.pending.get(&handle)
    }

    /// Number of records held, planned and applied
    pub fn retained(&self) -> usize {
        self.pending.len()
    }

    /// Score accumulated over all applied impacts
    #[inline]
    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    /// Drop unapplied plans computed against an older terrain
    pub fn discard_stale(&mut self, terrain: &Terrain) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, p| p.applied || terrain.is_current(&p.plan));
        let dropped = before - self.pending.len();
        if dropped > 0 {
            log::warn!("Discarded {} stale impact plan(s)", dropped);
        }
        dropped
    }

    /// Forget an unapplied plan (rod removed without landing)
    pub fn cancel(&mut self, handle: BodyHandle) -> bool {
        if self.pending.get(&handle).is_some_and(|p| !p.applied) {
            self.pending.remove(&handle);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.settled.clear();
        self.total_score = 0.0;
    }
}
