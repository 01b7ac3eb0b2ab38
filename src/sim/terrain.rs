//! Terrain height/resistance field
//!
//! A row-major grid of cells (height + material) over a rectangular world,
//! plus a list of destructible surface objects. Impacts are planned against
//! the grid first (`precalculate_impact`) and committed later
//! (`apply_pending_impact`); every plan carries the terrain revision it was
//! computed against so plans made before a resize are rejected.

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::TerrainConfig;
use crate::consts::{MAX_DEBRIS_SEEDS, MAX_TERRAIN_OBJECTS};
use crate::horizontal_distance;

/// Height returned outside the grid
pub const OUT_OF_BOUNDS_HEIGHT: f64 = 0.0;
/// Neutral resistance returned outside the grid
pub const OUT_OF_BOUNDS_RESISTANCE: f64 = 0.5;

/// Ground material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Material {
    Grass,
    /// Also what every crater leaves behind
    #[default]
    Dirt,
    Rock,
}

/// Fixed per-material properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaterialProps {
    /// kg/m³
    pub density: f64,
    /// 0 = soft, 1 = fully resistant
    pub resistance: f64,
    /// 0xRRGGBB
    pub color: u32,
}

impl Material {
    pub const ALL: [Material; 3] = [Material::Grass, Material::Dirt, Material::Rock];

    pub fn props(self) -> MaterialProps {
        match self {
            Material::Grass => MaterialProps {
                density: 500.0,
                resistance: 0.2,
                color: 0x00ff00,
            },
            Material::Dirt => MaterialProps {
                density: 1500.0,
                resistance: 0.5,
                color: 0x8b4513,
            },
            Material::Rock => MaterialProps {
                density: 2500.0,
                resistance: 0.9,
                color: 0x808080,
            },
        }
    }

    #[inline]
    pub fn resistance(self) -> f64 {
        self.props().resistance
    }
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cell {
    pub height: f64,
    pub material: Material,
    /// Derived from material
    pub density: f64,
}

impl Cell {
    fn new(height: f64, material: Material) -> Self {
        Self {
            height: height.max(0.0),
            material,
            density: material.props().density,
        }
    }

    fn set_material(&mut self, material: Material) {
        self.material = material;
        self.density = material.props().density;
    }
}

/// Surface object types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Tree,
    Rock,
}

impl ObjectKind {
    /// (mass, height, resistance, debris mass)
    fn stats(self) -> (f64, f64, f64, f64) {
        match self {
            ObjectKind::Tree => (1000.0, 10.0, 0.3, 100.0),
            ObjectKind::Rock => (5000.0, 2.0, 0.8, 500.0),
        }
    }
}

/// A destructible object sitting on the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TerrainObject {
    pub id: u32,
    pub kind: ObjectKind,
    pub x: f64,
    /// Ground height under the object when it was placed
    pub y: f64,
    pub z: f64,
    pub mass: f64,
    pub height: f64,
    pub resistance: f64,
    pub debris_mass: f64,
    pub intact: bool,
}

/// Discrete world sizes tied to progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeTier {
    /// 10 m field, 1 m cells
    #[default]
    Ground,
    /// 1 km field, 20 m cells
    Regional,
    /// 10 km field, 50 m cells
    Orbital,
}

impl SizeTier {
    /// World edge length (m)
    pub fn extent(self) -> f64 {
        match self {
            SizeTier::Ground => 10.0,
            SizeTier::Regional => 1000.0,
            SizeTier::Orbital => 10_000.0,
        }
    }

    /// Cell edge length (m)
    pub fn cell_size(self) -> f64 {
        match self {
            SizeTier::Ground => 1.0,
            SizeTier::Regional => 20.0,
            SizeTier::Orbital => 50.0,
        }
    }

    /// Tier for a progression state
    pub fn for_progression(upgrade_level: u32, orbital_phase: bool) -> Self {
        if orbital_phase {
            SizeTier::Orbital
        } else if upgrade_level > 5 {
            SizeTier::Regional
        } else {
            SizeTier::Ground
        }
    }
}

/// Height loss planned for one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffectedCell {
    pub x: usize,
    pub z: usize,
    pub reduction: f64,
}

/// A crater computed against a specific terrain revision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CraterPlan {
    pub x: f64,
    pub z: f64,
    pub energy: f64,
    pub radius: f64,
    pub depth: f64,
    /// Resistance at ground zero
    pub resistance: f64,
    pub cells: Vec<AffectedCell>,
    /// Object ids flagged for destruction by the pre-shockwave pass
    pub destroyed_objects: Vec<u32>,
    pub revision: u64,
}

/// Raw debris produced at an impact site
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DebrisSeed {
    pub mass: f64,
    pub position: DVec3,
    pub velocity: DVec3,
}

/// Read-only view for renderers
#[derive(Debug, Clone, Serialize)]
pub struct TerrainData<'a> {
    pub tier: SizeTier,
    pub width: f64,
    pub depth: f64,
    pub cell_size: f64,
    pub grid_width: usize,
    pub grid_depth: usize,
    pub cells: &'a [Cell],
    pub objects: &'a [TerrainObject],
}

/// How the grid is filled on (re)generation
#[derive(Debug, Clone, Copy, PartialEq)]
enum Layout {
    Procedural,
    Flat { height: f64, material: Material },
}

/// The terrain field
#[derive(Debug, Clone)]
pub struct Terrain {
    config: TerrainConfig,
    tier: SizeTier,
    layout: Layout,
    width: f64,
    depth: f64,
    cell_size: f64,
    grid_width: usize,
    grid_depth: usize,
    cells: Vec<Cell>,
    objects: Vec<TerrainObject>,
    next_object_id: u32,
    revision: u64,
    seed: u64,
    rng: Pcg32,
}

/// Crater radius for an energy on ground of a given resistance
#[inline]
pub fn crater_radius(energy: f64, resistance: f64, config: &TerrainConfig) -> f64 {
    let energy = energy.max(0.0);
    (config.crater_coefficient * energy.powf(1.0 / config.crater_exponent) * (1.0 - resistance))
        .max(0.0)
}

impl Terrain {
    /// Procedurally generated terrain for a tier
    pub fn new(tier: SizeTier, config: TerrainConfig, seed: u64) -> Self {
        Self::build(tier, Layout::Procedural, config, seed)
    }

    /// Level terrain of a single material with no objects
    pub fn flat(tier: SizeTier, height: f64, material: Material, seed: u64) -> Self {
        Self::build(
            tier,
            Layout::Flat { height, material },
            TerrainConfig::default(),
            seed,
        )
    }

    fn build(tier: SizeTier, layout: Layout, config: TerrainConfig, seed: u64) -> Self {
        let mut terrain = Self {
            config,
            tier,
            layout,
            width: 0.0,
            depth: 0.0,
            cell_size: 1.0,
            grid_width: 2,
            grid_depth: 2,
            cells: Vec::new(),
            objects: Vec::new(),
            next_object_id: 1,
            revision: 0,
            seed,
            rng: Pcg32::seed_from_u64(seed),
        };
        terrain.regenerate();
        terrain
    }

    fn regenerate(&mut self) {
        self.width = self.tier.extent();
        self.depth = self.tier.extent();
        self.cell_size = self.tier.cell_size();
        self.grid_width = ((self.width / self.cell_size).floor() as usize).max(2);
        self.grid_depth = ((self.depth / self.cell_size).floor() as usize).max(2);
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.revision += 1;

        self.cells = Vec::with_capacity(self.grid_width * self.grid_depth);
        for gz in 0..self.grid_depth {
            for gx in 0..self.grid_width {
                let cell = match self.layout {
                    Layout::Flat { height, material } => Cell::new(height, material),
                    Layout::Procedural => {
                        let noise = (gx as f64 * 0.1).sin() * (gz as f64 * 0.1).cos() * 50.0 + 50.0;
                        let material = if noise < 20.0 {
                            Material::Dirt
                        } else if noise < 60.0 {
                            Material::Grass
                        } else {
                            Material::Rock
                        };
                        Cell::new(noise, material)
                    }
                };
                self.cells.push(cell);
            }
        }

        self.objects.clear();
        self.next_object_id = 1;
        if self.layout == Layout::Procedural {
            let wanted = (self.width * self.depth * self.config.object_density).floor() as usize;
            let count = wanted.min(MAX_TERRAIN_OBJECTS);
            for _ in 0..count {
                let x = self.rng.random::<f64>() * self.width;
                let z = self.rng.random::<f64>() * self.depth;
                let kind = if self.rng.random::<f64>() < self.config.tree_fraction {
                    ObjectKind::Tree
                } else {
                    ObjectKind::Rock
                };
                self.add_object(kind, x, z);
            }
        }

        log::info!(
            "Terrain initialized: {}x{}m, {}x{} grid, {} objects",
            self.width,
            self.depth,
            self.grid_width,
            self.grid_depth,
            self.objects.len()
        );
    }

    /// Switch size tier. Always a full regeneration, never a resample; all
    /// outstanding crater plans become stale.
    pub fn resize(&mut self, tier: SizeTier) {
        self.tier = tier;
        self.regenerate();
    }

    /// Regenerate the current tier from the original seed
    pub fn reset(&mut self) {
        self.regenerate();
    }

    #[inline]
    pub fn tier(&self) -> SizeTier {
        self.tier
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> f64 {
        self.depth
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    pub fn grid_dims(&self) -> (usize, usize) {
        (self.grid_width, self.grid_depth)
    }

    /// Increments on every regeneration
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// World center at ground level
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.depth / 2.0)
    }

    /// Grid coordinates for a world position, `None` outside the grid
    fn grid_coords(&self, x: f64, z: f64) -> Option<(usize, usize)> {
        let gx = (x / self.cell_size).floor();
        let gz = (z / self.cell_size).floor();
        if !gx.is_finite() || !gz.is_finite() || gx < 0.0 || gz < 0.0 {
            return None;
        }
        let (gx, gz) = (gx as usize, gz as usize);
        if gx >= self.grid_width || gz >= self.grid_depth {
            return None;
        }
        Some((gx, gz))
    }

    #[inline]
    fn cell_index(&self, gx: usize, gz: usize) -> usize {
        gz * self.grid_width + gx
    }

    /// Cell at grid coordinates
    pub fn cell(&self, gx: usize, gz: usize) -> Option<&Cell> {
        if gx >= self.grid_width || gz >= self.grid_depth {
            return None;
        }
        self.cells.get(self.cell_index(gx, gz))
    }

    /// Ground height at a world position (0 outside the grid)
    pub fn height_at(&self, x: f64, z: f64) -> f64 {
        self.grid_coords(x, z)
            .map(|(gx, gz)| self.cells[self.cell_index(gx, gz)].height)
            .unwrap_or(OUT_OF_BOUNDS_HEIGHT)
    }

    /// Ground resistance at a world position (0.5 outside the grid)
    pub fn resistance_at(&self, x: f64, z: f64) -> f64 {
        self.grid_coords(x, z)
            .map(|(gx, gz)| self.cells[self.cell_index(gx, gz)].material.resistance())
            .unwrap_or(OUT_OF_BOUNDS_RESISTANCE)
    }

    /// Place an object on the ground. Returns its id.
    pub fn add_object(&mut self, kind: ObjectKind, x: f64, z: f64) -> u32 {
        let (mass, height, resistance, debris_mass) = kind.stats();
        let id = self.next_object_id;
        self.next_object_id += 1;
        let y = self.height_at(x, z);
        self.objects.push(TerrainObject {
            id,
            kind,
            x,
            y,
            z,
            mass,
            height,
            resistance,
            debris_mass,
            intact: true,
        });
        id
    }

    pub fn objects(&self) -> &[TerrainObject] {
        &self.objects
    }

    pub fn object(&self, id: u32) -> Option<&TerrainObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Copies of intact objects within `radius` of (x, z), in id order
    pub fn objects_within(&self, x: f64, z: f64, radius: f64) -> Vec<TerrainObject> {
        self.objects
            .iter()
            .filter(|o| o.intact && horizontal_distance(x, z, o.x, o.z) <= radius)
            .copied()
            .collect()
    }

    /// Clear an object's intact flag. Returns false if it was already gone.
    pub fn destroy_object(&mut self, id: u32) -> bool {
        match self.objects.iter_mut().find(|o| o.id == id && o.intact) {
            Some(object) => {
                object.intact = false;
                true
            }
            None => false,
        }
    }

    /// Enumerate the cells a crater of the given size would lower
    pub fn plan_crater(&self, x: f64, z: f64, radius: f64, depth: f64) -> Vec<AffectedCell> {
        let mut cells = Vec::new();
        if radius <= 0.0 || !radius.is_finite() {
            return cells;
        }

        let grid_radius = (radius / self.cell_size).ceil() as i64;
        let cx = (x / self.cell_size).floor() as i64;
        let cz = (z / self.cell_size).floor() as i64;

        for dz in -grid_radius..=grid_radius {
            for dx in -grid_radius..=grid_radius {
                let tx = cx + dx;
                let tz = cz + dz;
                if tx < 0 || tz < 0 || tx >= self.grid_width as i64 || tz >= self.grid_depth as i64
                {
                    continue;
                }
                let distance = ((dx * dx + dz * dz) as f64).sqrt() * self.cell_size;
                if distance > radius {
                    continue;
                }
                let (tx, tz) = (tx as usize, tz as usize);
                let local = self.cells[self.cell_index(tx, tz)].material.resistance();
                let reduction = depth * (1.0 - distance / radius) * (1.0 - local);
                cells.push(AffectedCell {
                    x: tx,
                    z: tz,
                    reduction,
                });
            }
        }
        cells
    }

    /// Plan the crater and pre-shockwave damage for an impact without
    /// touching any state
    pub fn precalculate_impact(&self, x: f64, z: f64, energy: f64) -> CraterPlan {
        let resistance = self.resistance_at(x, z);
        let radius = crater_radius(energy, resistance, &self.config);
        let depth = radius * self.config.depth_ratio;
        let cells = self.plan_crater(x, z, radius, depth);

        let blast_radius = (energy.max(0.0) / self.config.shockwave_energy_scale).sqrt();
        let destroyed_objects = if blast_radius > 0.0 {
            self.objects
                .iter()
                .filter(|o| o.intact)
                .filter(|o| {
                    let distance = horizontal_distance(x, z, o.x, o.z);
                    if distance > blast_radius {
                        return false;
                    }
                    let force = (energy / 1e6) * (1.0 - distance / blast_radius);
                    force > o.resistance * self.config.object_break_force
                })
                .map(|o| o.id)
                .collect()
        } else {
            Vec::new()
        };

        log::debug!(
            "Pre-calculated crater: radius={:.2}m, depth={:.2}m, cells={}, doomed objects={}",
            radius,
            depth,
            cells.len(),
            destroyed_objects.len()
        );

        CraterPlan {
            x,
            z,
            energy,
            radius,
            depth,
            resistance,
            cells,
            destroyed_objects,
            revision: self.revision,
        }
    }

    /// Whether a plan was computed against the current grid
    #[inline]
    pub fn is_current(&self, plan: &CraterPlan) -> bool {
        plan.revision == self.revision
    }

    /// Commit a planned crater. Stale plans are rejected untouched.
    pub fn apply_pending_impact(&mut self, plan: &CraterPlan) -> bool {
        if !self.is_current(plan) {
            log::warn!(
                "Discarding stale crater plan (revision {} vs {})",
                plan.revision,
                self.revision
            );
            return false;
        }
        self.lower_cells(&plan.cells);
        for id in &plan.destroyed_objects {
            self.destroy_object(*id);
        }
        true
    }

    /// Dig a crater immediately (secondary impacts)
    pub fn apply_crater(&mut self, x: f64, z: f64, radius: f64, depth: f64) -> usize {
        let cells = self.plan_crater(x, z, radius, depth);
        self.lower_cells(&cells);
        cells.len()
    }

    fn lower_cells(&mut self, cells: &[AffectedCell]) {
        for affected in cells {
            let index = self.cell_index(affected.x, affected.z);
            if let Some(cell) = self.cells.get_mut(index) {
                cell.height = (cell.height - affected.reduction).max(0.0);
                cell.set_material(Material::Dirt);
            }
        }
    }

    /// Raw debris for an impact: up to 100 seeds thrown outward
    pub fn get_debris(&mut self, x: f64, z: f64, energy: f64) -> Vec<DebrisSeed> {
        let resistance = self.resistance_at(x, z);
        let softness = 1.0 - resistance;
        let count = ((energy.max(0.0) / self.config.energy_per_debris).floor() as usize)
            .min(MAX_DEBRIS_SEEDS);
        let ground = self.height_at(x, z);

        (0..count)
            .map(|_| {
                let angle = self.rng.random::<f64>() * std::f64::consts::TAU;
                let speed = self.rng.random::<f64>() * 50.0 * softness;
                let mass = 10.0 + self.rng.random::<f64>() * 100.0 * softness;
                let vy = 10.0 + self.rng.random::<f64>() * 20.0;
                DebrisSeed {
                    mass,
                    position: DVec3::new(x + angle.cos() * 5.0, ground, z + angle.sin() * 5.0),
                    velocity: DVec3::new(angle.cos() * speed, vy, angle.sin() * speed),
                }
            })
            .collect()
    }

    /// Read-only snapshot for renderers
    pub fn data(&self) -> TerrainData<'_> {
        TerrainData {
            tier: self.tier,
            width: self.width,
            depth: self.depth,
            cell_size: self.cell_size,
            grid_width: self.grid_width,
            grid_depth: self.grid_depth,
            cells: &self.cells,
            objects: &self.objects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_out_of_bounds_fallbacks() {
        let terrain = Terrain::new(SizeTier::Ground, TerrainConfig::default(), 3);
        assert_eq!(terrain.height_at(-1.0, 5.0), OUT_OF_BOUNDS_HEIGHT);
        assert_eq!(terrain.height_at(5.0, 1e9), OUT_OF_BOUNDS_HEIGHT);
        assert_eq!(terrain.resistance_at(f64::NAN, 0.0), OUT_OF_BOUNDS_RESISTANCE);
        assert_eq!(terrain.resistance_at(10.5, 2.0), OUT_OF_BOUNDS_RESISTANCE);
    }

    #[test]
    fn test_tier_dimensions() {
        let terrain = Terrain::new(SizeTier::Regional, TerrainConfig::default(), 3);
        assert_eq!(terrain.grid_dims(), (50, 50));
        assert_eq!(terrain.objects().len(), 5000);
        assert!(terrain.data().cells.iter().all(|c| c.height >= 0.0));

        assert_eq!(SizeTier::for_progression(0, false), SizeTier::Ground);
        assert_eq!(SizeTier::for_progression(6, false), SizeTier::Regional);
        assert_eq!(SizeTier::for_progression(0, true), SizeTier::Orbital);
    }

    #[test]
    fn test_procedural_materials_follow_height() {
        let terrain = Terrain::new(SizeTier::Regional, TerrainConfig::default(), 3);
        for cell in terrain.data().cells {
            let expected = if cell.height < 20.0 {
                Material::Dirt
            } else if cell.height < 60.0 {
                Material::Grass
            } else {
                Material::Rock
            };
            assert_eq!(cell.material, expected);
            assert_eq!(cell.density, expected.props().density);
        }
    }

    #[test]
    fn test_fully_resistant_ground_has_no_crater() {
        let config = TerrainConfig::default();
        assert_eq!(crater_radius(1e12, 1.0, &config), 0.0);
        let terrain = Terrain::flat(SizeTier::Ground, 5.0, Material::Dirt, 1);
        assert!(terrain.plan_crater(5.0, 5.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn test_precalculate_then_apply_once() {
        let mut terrain = Terrain::flat(SizeTier::Ground, 10.0, Material::Grass, 1);
        let plan = terrain.precalculate_impact(5.0, 5.0, 1e12);
        assert!(plan.radius > 0.0);
        assert!(!plan.cells.is_empty());
        // Planning does not deform
        assert_eq!(terrain.height_at(5.0, 5.0), 10.0);

        assert!(terrain.apply_pending_impact(&plan));
        let center = terrain.height_at(5.0, 5.0);
        assert!(center < 10.0);
        assert_eq!(terrain.cell(5, 5).unwrap().material, Material::Dirt);
        assert!(terrain.data().cells.iter().all(|c| c.height >= 0.0));
    }

    #[test]
    fn test_resize_makes_plans_stale() {
        let mut terrain = Terrain::flat(SizeTier::Ground, 10.0, Material::Grass, 1);
        let plan = terrain.precalculate_impact(5.0, 5.0, 1e12);
        terrain.resize(SizeTier::Regional);
        assert!(!terrain.is_current(&plan));
        assert!(!terrain.apply_pending_impact(&plan));
        assert!(terrain.data().cells.iter().all(|c| c.height == 10.0));
    }

    #[test]
    fn test_pre_shockwave_flags_close_weak_objects() {
        let mut terrain = Terrain::flat(SizeTier::Regional, 0.0, Material::Dirt, 1);
        let near = terrain.add_object(ObjectKind::Tree, 500.0, 500.0);
        let far = terrain.add_object(ObjectKind::Tree, 990.0, 990.0);

        // blast radius = sqrt(1e10 / 1e5) ≈ 316 m; force at center = 1e4
        let plan = terrain.precalculate_impact(500.0, 500.0, 1e10);
        assert!(plan.destroyed_objects.contains(&near));
        assert!(!plan.destroyed_objects.contains(&far));

        assert!(terrain.apply_pending_impact(&plan));
        assert!(!terrain.object(near).unwrap().intact);
        assert!(terrain.object(far).unwrap().intact);
    }

    #[test]
    fn test_debris_is_capped_and_softened() {
        let mut terrain = Terrain::flat(SizeTier::Ground, 0.0, Material::Grass, 9);
        assert!(terrain.get_debris(5.0, 5.0, 5e5).is_empty());
        let debris = terrain.get_debris(5.0, 5.0, 1e12);
        assert_eq!(debris.len(), MAX_DEBRIS_SEEDS);
        for seed in &debris {
            let horizontal = (seed.velocity.x.powi(2) + seed.velocity.z.powi(2)).sqrt();
            assert!(horizontal <= 50.0 * 0.8 + 1e-9);
            assert!(seed.velocity.y >= 10.0 && seed.velocity.y <= 30.0);
            assert!(seed.mass >= 10.0 && seed.mass <= 90.0);
        }
    }

    #[test]
    fn test_reset_keeps_shape() {
        let mut terrain = Terrain::new(SizeTier::Regional, TerrainConfig::default(), 5);
        let (cells, objects) = (terrain.data().cells.len(), terrain.objects().len());
        let plan = terrain.precalculate_impact(500.0, 500.0, 1e12);
        terrain.apply_pending_impact(&plan);
        terrain.reset();
        assert_eq!(terrain.data().cells.len(), cells);
        assert_eq!(terrain.objects().len(), objects);
        assert!(terrain.objects().iter().all(|o| o.intact));
    }

    proptest! {
        #[test]
        fn crater_radius_monotonic_in_energy(
            e1 in 0.0f64..1e15,
            e2 in 0.0f64..1e15,
            resistance in 0.0f64..=1.0,
        ) {
            let config = TerrainConfig::default();
            let (lo, hi) = if e1 <= e2 { (e1, e2) } else { (e2, e1) };
            prop_assert!(crater_radius(lo, resistance, &config) <= crater_radius(hi, resistance, &config));
        }
    }
}
