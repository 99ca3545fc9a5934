//! Altitude regions and their enemy populations.
//!
//! A [`RegionCatalog`] is an ordered list of [`Region`]s keyed by the height at
//! which they start.  The spawner asks for the region nearest to a height and
//! turns its [`EnemySpec`]s into a concrete spawn list with [`plan_spawns`].
//!
//! Besides the per-region population there is a separate pool of challenge
//! enemies, handed out in a fresh random order on every call.

use crate::config::load_toml_or_default;
use crate::error::{GameError, GameResult};
use bevy::prelude::*;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const REGION_CATALOG_PATH: &str = "assets/regions.toml";

/// How an enemy moves around its spawn point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionPattern {
    #[default]
    Static,
    LinearHorizontal,
    LinearVertical,
    Wavy,
    Jerky,
    Unpredictable,
}

/// Authored description of one enemy type within a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    pub asset_id: String,
    pub speed: f32,
    #[serde(default)]
    pub motion: MotionPattern,
    /// Pattern-specific parameters, see [`crate::enemy::motion_offset`].
    #[serde(default)]
    pub motion_params: (f32, f32),
    /// Vertical gap (min, max) kept before this enemy in a wave.
    pub isolate_distance: (f32, f32),
    /// Spawned in every wave regardless of weights.
    #[serde(default)]
    pub required_amount: u32,
    /// Weight in `[0, 1]` for filling the rest of the quota.
    #[serde(default)]
    pub relative_amount: f32,
}

impl EnemySpec {
    /// Isolation bounds with `min <= max` and no negative gaps.
    pub fn isolate_range(&self) -> (f32, f32) {
        let (a, b) = self.isolate_distance;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        (lo.max(0.0), hi.max(0.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub start_height: f32,
    pub enemies: Vec<EnemySpec>,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionCatalog {
    pub regions: Vec<Region>,
    pub challenge_enemies: Vec<EnemySpec>,
    /// Weighted enemies per regular wave (required ones come on top when
    /// they exceed it).
    pub base_enemy_quota: u32,
    /// Challenge enemies added to a challenge wave.
    pub challenge_quota: u32,
}

impl RegionCatalog {
    /// Sort regions by start height so iteration order is altitude order.
    pub fn normalize(&mut self) {
        self.regions
            .sort_by(|a, b| a.start_height.total_cmp(&b.start_height));
    }

    /// The region whose start height is nearest to `height`.  Ties go to the
    /// lower region.
    pub fn region_for_height(&self, height: f32) -> GameResult<&Region> {
        let mut best: Option<(&Region, f32)> = None;
        for region in &self.regions {
            let dist = (region.start_height - height).abs();
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((region, dist)),
            }
        }
        best.map(|(region, _)| region).ok_or(GameError::NoRegions)
    }

    /// Every challenge enemy, in a fresh uniformly random order.
    pub fn challenge_enemies<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<EnemySpec> {
        let mut enemies = self.challenge_enemies.clone();
        enemies.shuffle(rng);
        enemies
    }

    /// Upper bound on simultaneously planned enemies, for pool sizing.
    #[inline]
    pub fn all_enemy_count(&self) -> u32 {
        self.base_enemy_quota + self.challenge_quota
    }
}

/// Concrete enemy list for one wave.
///
/// Every spec contributes `required_amount` copies first.  The remaining
/// quota is drawn by `relative_amount` weight; if all weights are zero only
/// the required enemies are returned.
pub fn plan_spawns<'a, R: Rng + ?Sized>(
    region: &'a Region,
    quota: u32,
    rng: &mut R,
) -> Vec<&'a EnemySpec> {
    let mut planned: Vec<&EnemySpec> = region
        .enemies
        .iter()
        .flat_map(|spec| std::iter::repeat(spec).take(spec.required_amount as usize))
        .collect();

    let remaining = quota.saturating_sub(planned.len() as u32);
    if remaining == 0 {
        return planned;
    }

    let weights: Vec<f32> = region
        .enemies
        .iter()
        .map(|spec| spec.relative_amount.clamp(0.0, 1.0))
        .collect();
    let Ok(dist) = WeightedIndex::new(&weights) else {
        return planned;
    };

    for _ in 0..remaining {
        planned.push(&region.enemies[dist.sample(rng)]);
    }
    planned
}

fn spec(
    asset_id: &str,
    speed: f32,
    motion: MotionPattern,
    motion_params: (f32, f32),
    isolate_distance: (f32, f32),
    required_amount: u32,
    relative_amount: f32,
) -> EnemySpec {
    EnemySpec {
        asset_id: asset_id.to_string(),
        speed,
        motion,
        motion_params,
        isolate_distance,
        required_amount,
        relative_amount,
    }
}

impl Default for RegionCatalog {
    fn default() -> Self {
        use MotionPattern::*;
        Self {
            regions: vec![
                Region {
                    name: "Lowlands".to_string(),
                    start_height: 0.0,
                    enemies: vec![
                        spec("drone", 0.0, Static, (0.0, 0.0), (120.0, 220.0), 1, 0.6),
                        spec("glider", 90.0, LinearHorizontal, (160.0, 0.0), (140.0, 260.0), 0, 0.4),
                    ],
                },
                Region {
                    name: "Cloud Belt".to_string(),
                    start_height: 1500.0,
                    enemies: vec![
                        spec("glider", 120.0, LinearHorizontal, (220.0, 0.0), (110.0, 200.0), 0, 0.4),
                        spec("kite", 0.0, Wavy, (140.0, 1.6), (120.0, 220.0), 1, 0.4),
                        spec("lift", 80.0, LinearVertical, (90.0, 0.0), (160.0, 260.0), 0, 0.2),
                    ],
                },
                Region {
                    name: "Storm Front".to_string(),
                    start_height: 4000.0,
                    enemies: vec![
                        spec("kite", 0.0, Wavy, (180.0, 2.2), (100.0, 180.0), 0, 0.5),
                        spec("spark", 600.0, Jerky, (150.0, 0.9), (120.0, 200.0), 1, 0.5),
                    ],
                },
                Region {
                    name: "Stratosphere".to_string(),
                    start_height: 8000.0,
                    enemies: vec![
                        spec("spark", 800.0, Jerky, (200.0, 0.7), (90.0, 160.0), 1, 0.4),
                        spec("wraith", 0.0, Unpredictable, (220.0, 90.0), (100.0, 180.0), 1, 0.6),
                    ],
                },
            ],
            challenge_enemies: vec![
                spec("interceptor", 0.0, Unpredictable, (260.0, 120.0), (140.0, 200.0), 0, 1.0),
                spec("mine_layer", 500.0, Jerky, (240.0, 1.2), (160.0, 240.0), 0, 1.0),
                spec("sentinel", 0.0, Wavy, (300.0, 1.0), (180.0, 260.0), 0, 1.0),
            ],
            base_enemy_quota: 6,
            challenge_quota: 2,
        }
    }
}

/// Startup system: replace the default catalog from `assets/regions.toml`.
pub fn load_region_catalog(mut catalog: ResMut<RegionCatalog>) {
    let mut loaded = load_toml_or_default::<RegionCatalog>(REGION_CATALOG_PATH);
    loaded.normalize();
    if loaded.regions.is_empty() {
        warn!("Region catalog is empty; no enemies will spawn");
    }
    *catalog = loaded;
}
