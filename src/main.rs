//! Rod Impact demo entry point
//!
//! Runs a scripted drop and logs what happened. Pass a JSON config path as
//! the first argument to override the defaults; set RUST_LOG=debug for
//! per-impact detail.

use rod_impact::SimConfig;
use rod_impact::sim::{Progression, RodMaterial, RodSpec, SimEvent, WeatherEffects, WeatherKind, World};

/// Give up on a drop after this many ticks (~10 min simulated)
const MAX_TICKS: u64 = 37_500;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load_or_default(path),
        None => SimConfig::default(),
    };

    let mut world = World::new(config);
    world.set_weather(WeatherEffects::preset(WeatherKind::Windy, 1.0));

    let drops = [
        (RodMaterial::Steel, 2_000.0, 0),
        (RodMaterial::Tungsten, 40_000.0, 6),
        (RodMaterial::Hyperdense, 200_000.0, 10),
    ];

    for (material, height, level) in drops {
        world.set_progression(
            Progression::default()
                .with_upgrade_level(level)
                .with_launch_height(height),
        );
        let rod = world.launch_rod(RodSpec::new(material, 1.0, 0.1));
        let ticks = world.run_until_idle(MAX_TICKS);

        for event in world.drain_events() {
            match event {
                SimEvent::Prediction {
                    landing: Some(landing),
                    energy,
                    impact_tick,
                    ..
                } => log::info!(
                    "Predicted landing at ({:.1}, {:.1}) with {:.3e} J at tick {:?}",
                    landing.x,
                    landing.z,
                    energy,
                    impact_tick
                ),
                SimEvent::Impact { outcome, .. } => log::info!(
                    "Impact: {:.3e} J, crater {:.2} m x {:.2} m, score {:.1}, {} ejecta, {} objects hit",
                    outcome.energy,
                    outcome.crater_radius,
                    outcome.crater_depth,
                    outcome.score,
                    outcome.ejected,
                    outcome.damaged_objects
                ),
                SimEvent::TerrainResized { tier } => log::info!("Terrain now {:?}", tier),
                _ => {}
            }
        }

        if world.has_flights() {
            log::warn!("{:?} rod {:?} still airborne after {} ticks", material, rod, ticks);
        } else if let Some(shockwave) = world.shockwave_animation(rod) {
            log::info!(
                "Shockwave: {} samples over {:.2} s",
                shockwave.samples.len(),
                shockwave.duration
            );
        }
    }

    log::info!(
        "Total score {:.1} after {} ticks",
        world.score(),
        world.tick_count()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on wasm
}
