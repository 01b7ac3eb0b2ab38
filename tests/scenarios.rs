//! End-to-end scenarios across integrator, atmosphere, terrain and impacts

use glam::DVec3;
use rod_impact::SimConfig;
use rod_impact::config::{AtmosphereConfig, EjectaConfig, ImpactConfig, PhysicsConfig, ShockwaveConfig};
use rod_impact::consts::{MAX_EJECTA_PARTICLES, SIM_DT};
use rod_impact::sim::*;

fn still_atmosphere() -> Atmosphere {
    let mut atmosphere = Atmosphere::new(AtmosphereConfig::default(), 1);
    for layer in 0..atmosphere.layers().len() {
        atmosphere.set_wind(layer, 0.0, 0.0);
    }
    atmosphere.apply_weather(&WeatherEffects::calm());
    atmosphere
}

struct Pipeline {
    integrator: Integrator,
    terrain: Terrain,
    atmosphere: Atmosphere,
    ejecta: EjectaSimulator,
    shockwave: ShockwavePropagator,
    impacts: ImpactResolver,
}

impl Pipeline {
    fn flat(tier: SizeTier, material: Material) -> Self {
        Self {
            integrator: Integrator::new(&PhysicsConfig::default()),
            terrain: Terrain::flat(tier, 0.0, material, 7),
            atmosphere: still_atmosphere(),
            ejecta: EjectaSimulator::new(EjectaConfig::default(), SIM_DT, 7),
            shockwave: ShockwavePropagator::new(ShockwaveConfig::default(), SIM_DT),
            impacts: ImpactResolver::new(ImpactConfig::default()),
        }
    }

    /// Drop a body straight down with enough speed to carry `energy` into
    /// the ground at (x, z), and return its collision snapshot
    fn slam(&mut self, x: f64, z: f64, energy: f64) -> BodySnapshot {
        let mass = 1000.0;
        let speed = (2.0 * energy / mass).sqrt();
        let handle = self.integrator.add_object(
            BodySpec {
                mass,
                position: DVec3::new(x, 0.0, z),
                velocity: DVec3::new(0.0, -speed, 0.0),
                area: 0.01,
                ..Default::default()
            },
            false,
            0.0,
        );
        let mut snapshot = self.integrator.get_state(handle).unwrap();
        snapshot.body.resolve_contact(0.0);
        snapshot
    }

    fn handle(&mut self, snapshot: &BodySnapshot) -> ImpactOutcome {
        self.impacts.handle_impact(
            snapshot,
            ImpactEnv {
                integrator: &mut self.integrator,
                terrain: &mut self.terrain,
                atmosphere: &self.atmosphere,
                ejecta: &mut self.ejecta,
                shockwave: &mut self.shockwave,
                ctx: ImpactContext::default(),
            },
        )
    }
}

#[test]
fn drop_from_one_kilometer_loses_energy_to_drag() {
    let terrain = Terrain::flat(SizeTier::Ground, 0.0, Material::Dirt, 1);
    let atmosphere = still_atmosphere();
    let mut integrator = Integrator::new(&PhysicsConfig::default());
    let handle = integrator.add_object(
        BodySpec {
            mass: 100.0,
            position: DVec3::new(5.0, 1000.0, 5.0),
            area: 0.01,
            shape_factor: 1.0,
            ..Default::default()
        },
        false,
        0.0,
    );

    let start = integrator.get_state(handle).unwrap();
    let predicted = atmosphere.pre_integrate_trajectory(&start, &terrain, integrator.gravity(), SIM_DT);
    let predicted_landing = *predicted.landing().expect("look-ahead should land");

    let mut collision = None;
    for _ in 0..10_000 {
        let state = integrator.get_state(handle).unwrap();
        integrator.apply_force(handle, atmosphere.forces_on(&state.body));
        let report = integrator.step(SIM_DT, &terrain);
        if let Some(hit) = report.collisions.into_iter().find(|c| c.handle == handle) {
            collision = Some(hit);
            break;
        }
    }

    let hit = collision.expect("rod should land");
    let energy = hit.body.impact_energy();
    assert!(energy > 0.0);
    assert!(energy < 100.0 * 9.81 * 1000.0, "energy {energy} should be below mgh");
    assert_eq!(hit.body.position.y, 0.0);
    assert!((hit.body.position.x - 5.0).abs() < 1e-6);
    assert!((hit.body.position.z - 5.0).abs() < 1e-6);

    // Look-ahead and live run share kinematics in still air
    assert!((predicted_landing.energy - energy).abs() / energy < 1e-9);
    assert_eq!(predicted.ticks() as u64, integrator.steps());
    assert!(integrator.get_state(handle).is_none());
}

#[test]
fn massive_impact_throws_capped_ejecta() {
    let mut pipeline = Pipeline::flat(SizeTier::Orbital, Material::Dirt);
    let snapshot = pipeline.slam(5000.0, 5000.0, 2e10);
    let outcome = pipeline.handle(&snapshot);

    assert!((outcome.energy - 2e10).abs() / 2e10 < 1e-9);
    assert_eq!(outcome.ejected, MAX_EJECTA_PARTICLES);
    let simulation = pipeline.ejecta.simulation(snapshot.handle).unwrap();
    assert_eq!(simulation.particles.len(), 200);

    // Flaming boulders are on the table at this energy
    let config = EjectaConfig::default();
    assert_eq!(roll_kind(0.0, 2e10, 1.0, &config), DebrisKind::FlamingBoulder);
}

#[test]
fn small_impact_never_throws_boulders() {
    let mut pipeline = Pipeline::flat(SizeTier::Ground, Material::Dirt);
    let snapshot = pipeline.slam(5.0, 5.0, 1e5);
    let outcome = pipeline.handle(&snapshot);
    assert_eq!(outcome.ejected, 0);

    let config = EjectaConfig::default();
    for i in 0..10_000 {
        let roll = i as f64 / 10_000.0;
        for strength in [0.15, 0.5, 1.0] {
            let kind = roll_kind(roll, 1e5, strength, &config);
            assert!(
                !matches!(kind, DebrisKind::Boulder | DebrisKind::FlamingBoulder),
                "roll {roll} gave {kind:?}"
            );
        }
    }
}

#[test]
fn sub_threshold_shockwave_leaves_objects_intact() {
    let mut pipeline = Pipeline::flat(SizeTier::Regional, Material::Rock);
    for i in 0..10 {
        pipeline
            .terrain
            .add_object(ObjectKind::Tree, 480.0 + i as f64 * 4.0, 500.0);
        pipeline
            .terrain
            .add_object(ObjectKind::Rock, 500.0, 480.0 + i as f64 * 4.0);
    }
    let source = pipeline.slam(500.0, 500.0, 1.0).handle;

    // Tree destruction starts at 3e5 J/m², displacement at 1.5e5
    let recipe = ShockwaveRecipe {
        source,
        x: 500.0,
        z: 500.0,
        radius: 100.0,
        intensity: 1e5,
        duration: 100.0 / 343.0,
    };
    let report = pipeline.shockwave.apply(
        &recipe,
        ShockwaveEnv {
            integrator: &mut pipeline.integrator,
            terrain: &mut pipeline.terrain,
            atmosphere: &pipeline.atmosphere,
            weather: WeatherEffects::calm(),
        },
    );

    assert!(report.damaged.is_empty());
    assert!(pipeline.terrain.objects().iter().all(|o| o.intact));
    assert_eq!(pipeline.integrator.len(), 1);
}

#[test]
fn confirming_an_impact_twice_scores_once() {
    let mut pipeline = Pipeline::flat(SizeTier::Regional, Material::Grass);
    let snapshot = pipeline.slam(500.0, 500.0, 5e9);
    pipeline.impacts.precalculate_impact(
        500.0,
        500.0,
        5e9,
        snapshot.handle,
        &mut pipeline.terrain,
        &ImpactContext::default(),
    );

    let first = pipeline.handle(&snapshot);
    let score = pipeline.impacts.total_score();
    let heights: Vec<f64> = pipeline.terrain.data().cells.iter().map(|c| c.height).collect();

    let second = pipeline.handle(&snapshot);
    assert_eq!(first.score, second.score);
    assert_eq!(first.energy, second.energy);
    assert_eq!(pipeline.impacts.total_score(), score);
    let after: Vec<f64> = pipeline.terrain.data().cells.iter().map(|c| c.height).collect();
    assert_eq!(heights, after);
}

#[test]
fn world_reset_matches_fresh_shape() {
    let config = SimConfig::default().with_seed(21);
    let mut world = World::new(config.clone());
    let fresh = World::new(config);

    world.set_progression(Progression::default().with_launch_height(300.0));
    world.launch_rod(RodSpec::new(RodMaterial::Lead, 1.0, 0.05));
    world.run_until_idle(10_000);
    world.reset();

    let (a, b) = (world.terrain_data(), fresh.terrain_data());
    assert_eq!(a.cells.len(), b.cells.len());
    assert_eq!(a.objects.len(), b.objects.len());
    assert_eq!((a.grid_width, a.grid_depth), (b.grid_width, b.grid_depth));
    assert_eq!(
        world.atmosphere_data().layers.len(),
        fresh.atmosphere_data().layers.len()
    );
    assert_eq!(world.atmosphere_data().wind.len(), fresh.atmosphere_data().wind.len());
    assert!(world.integrator().is_empty());
}
