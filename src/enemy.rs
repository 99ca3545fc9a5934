//! Enemy waves: region-driven spawning, motion patterns, and contact damage.

use crate::config::FlightConfig;
use crate::player::{Hull, Player};
use crate::region::{plan_spawns, EnemySpec, MotionPattern, RegionCatalog};
use crate::state::GameState;
use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

#[derive(Component, Debug, Clone)]
pub struct Enemy {
    pub asset_id: String,
}

/// Deterministic movement around the spawn point.
#[derive(Component, Debug, Clone, Copy)]
pub struct EnemyMotion {
    pub pattern: MotionPattern,
    pub params: (f32, f32),
    pub speed: f32,
    pub origin: Vec2,
    pub elapsed: f32,
    pub seed: u64,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct EnemySpawnState {
    /// Player height at which the next wave spawns.
    pub next_wave_height: f32,
    pub waves_spawned: u32,
    pub total_spawned: u64,
}

pub struct EnemySpawnPlugin;

impl Plugin for EnemySpawnPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RegionCatalog>()
            .init_resource::<EnemySpawnState>()
            .add_systems(
                Update,
                (
                    enemy_wave_spawn_system,
                    enemy_motion_system,
                    enemy_contact_system,
                    enemy_despawn_system,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(OnExit(GameState::GameOver), clear_enemies_system);
    }
}

// ── Motion ────────────────────────────────────────────────────────────────────

/// Triangle wave through 0 → `amplitude` → −`amplitude` → 0 over a travelled
/// distance of `4 * amplitude`.
fn triangle(distance: f32, amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    let p = distance.rem_euclid(4.0 * amplitude);
    if p < amplitude {
        p
    } else if p < 3.0 * amplitude {
        2.0 * amplitude - p
    } else {
        p - 4.0 * amplitude
    }
}

#[inline]
fn hash(seed: u64, salt: u64) -> u64 {
    (seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_mul(1_103_515_245)
        .wrapping_add(12_345)
}

/// Uniform-ish value in `[-1, 1]` derived from `(seed, salt)`.
#[inline]
fn unit(seed: u64, salt: u64) -> f32 {
    ((hash(seed, salt) >> 16) % 10_000) as f32 / 5_000.0 - 1.0
}

/// Jerky waypoint `step`; step 0 is the spawn point.
fn jerk_waypoint(seed: u64, step: u64, amplitude: f32) -> Vec2 {
    if step == 0 {
        return Vec2::ZERO;
    }
    Vec2::new(unit(seed, step * 2), unit(seed, step * 2 + 1)) * amplitude
}

/// Offset from the spawn point after `t` seconds.
///
/// | Pattern | `params.0` | `params.1` |
/// |---------|-----------|-----------|
/// | `LinearHorizontal` / `LinearVertical` | sweep amplitude | unused |
/// | `Wavy` | horizontal amplitude | angular frequency (rad/s) |
/// | `Jerky` | jump radius | seconds between jumps |
/// | `Unpredictable` | horizontal amplitude | vertical amplitude |
///
/// `speed` is the travel speed of the linear and jerky patterns.
pub fn motion_offset(
    pattern: MotionPattern,
    params: (f32, f32),
    speed: f32,
    t: f32,
    seed: u64,
) -> Vec2 {
    let (a, b) = params;
    match pattern {
        MotionPattern::Static => Vec2::ZERO,
        MotionPattern::LinearHorizontal => Vec2::new(triangle(speed * t, a), 0.0),
        MotionPattern::LinearVertical => Vec2::new(0.0, triangle(speed * t, a)),
        MotionPattern::Wavy => Vec2::new(a * (b * t).sin(), 0.0),
        MotionPattern::Jerky => {
            let interval = b.max(0.05);
            let step = (t.max(0.0) / interval).floor();
            let since_jump = t.max(0.0) - step * interval;
            let from = jerk_waypoint(seed, step as u64, a);
            let to = jerk_waypoint(seed, step as u64 + 1, a);
            let dist = from.distance(to);
            if dist <= f32::EPSILON || speed <= 0.0 {
                return from;
            }
            let progress = (since_jump * speed / dist).min(1.0);
            from + (to - from) * progress
        }
        MotionPattern::Unpredictable => {
            let phase = |salt| unit(seed, salt) * TAU;
            let x = a * (0.6 * (1.3 * t + phase(1)).sin() + 0.4 * (2.9 * t + phase(2)).sin());
            let y = b * (0.6 * (1.7 * t + phase(3)).sin() + 0.4 * (3.7 * t + phase(4)).sin());
            // Anchor at the spawn point.
            let x0 = a * (0.6 * phase(1).sin() + 0.4 * phase(2).sin());
            let y0 = b * (0.6 * phase(3).sin() + 0.4 * phase(4).sin());
            Vec2::new(x - x0, y - y0)
        }
    }
}

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Spawn positions for one wave starting at `base_y`.  Each enemy sits
/// above the previous one by a gap drawn from its isolation range.
pub fn wave_layout<R: Rng + ?Sized>(
    specs: &[EnemySpec],
    base_y: f32,
    lane_half_width: f32,
    rng: &mut R,
) -> Vec<Vec2> {
    let half = lane_half_width.abs();
    let mut cursor = base_y;
    specs
        .iter()
        .map(|spec| {
            let (lo, hi) = spec.isolate_range();
            cursor += if hi > lo { rng.gen_range(lo..=hi) } else { lo };
            let x = if half > 0.0 {
                rng.gen_range(-half..=half)
            } else {
                0.0
            };
            Vec2::new(x, cursor)
        })
        .collect()
}

#[inline]
pub fn is_challenge_wave(wave: u32, interval: u32) -> bool {
    interval > 0 && wave > 0 && wave % interval == 0
}

pub fn enemy_wave_spawn_system(
    mut commands: Commands,
    config: Res<FlightConfig>,
    catalog: Res<RegionCatalog>,
    mut state: ResMut<EnemySpawnState>,
    q_player: Query<&Transform, With<Player>>,
) {
    let Ok(player) = q_player.single() else {
        return;
    };
    let height = player.translation.y;
    if height < state.next_wave_height {
        return;
    }
    state.next_wave_height = height + config.enemy_wave_spacing;

    let base_y = height + config.enemy_spawn_ahead;
    let region = match catalog.region_for_height(base_y) {
        Ok(region) => region,
        Err(err) => {
            warn!("Skipping enemy wave at height {:.0}: {}", base_y, err);
            return;
        }
    };

    let mut rng = rand::thread_rng();
    let mut specs: Vec<EnemySpec> = plan_spawns(region, catalog.base_enemy_quota, &mut rng)
        .into_iter()
        .cloned()
        .collect();

    state.waves_spawned += 1;
    if is_challenge_wave(state.waves_spawned, config.challenge_wave_interval) {
        let challenge = catalog.challenge_enemies(&mut rng);
        info!(
            "Challenge wave {} in {}: {} extra enemies",
            state.waves_spawned,
            region.name,
            challenge.len().min(catalog.challenge_quota as usize)
        );
        specs.extend(challenge.into_iter().take(catalog.challenge_quota as usize));
    }

    let positions = wave_layout(&specs, base_y, config.lane_half_width, &mut rng);
    for (spec, origin) in specs.into_iter().zip(positions) {
        state.total_spawned += 1;
        commands.spawn((
            Enemy {
                asset_id: spec.asset_id,
            },
            EnemyMotion {
                pattern: spec.motion,
                params: spec.motion_params,
                speed: spec.speed,
                origin,
                elapsed: 0.0,
                seed: state.total_spawned,
            },
            Transform::from_translation(origin.extend(0.0)),
            Visibility::default(),
        ));
    }
}

pub fn enemy_motion_system(
    time: Res<Time>,
    mut q_enemies: Query<(&mut Transform, &mut EnemyMotion), With<Enemy>>,
) {
    let dt = time.delta_secs();
    for (mut transform, mut motion) in q_enemies.iter_mut() {
        motion.elapsed += dt;
        let offset = motion_offset(
            motion.pattern,
            motion.params,
            motion.speed,
            motion.elapsed,
            motion.seed,
        );
        transform.translation = (motion.origin + offset).extend(transform.translation.z);
    }
}

/// Colliding enemies damage the hull and are removed.
pub fn enemy_contact_system(
    mut commands: Commands,
    config: Res<FlightConfig>,
    mut q_player: Query<(&Transform, &mut Hull), With<Player>>,
    q_enemies: Query<(Entity, &Transform), (With<Enemy>, Without<Player>)>,
) {
    let Ok((player, mut hull)) = q_player.single_mut() else {
        return;
    };
    let reach = config.player_radius + config.enemy_contact_radius;
    let player_pos = player.translation.truncate();
    for (entity, transform) in q_enemies.iter() {
        if transform.translation.truncate().distance(player_pos) <= reach {
            hull.damage(config.enemy_contact_damage);
            commands.entity(entity).despawn();
        }
    }
}

pub fn enemy_despawn_system(
    mut commands: Commands,
    config: Res<FlightConfig>,
    q_player: Query<&Transform, With<Player>>,
    q_enemies: Query<(Entity, &Transform), (With<Enemy>, Without<Player>)>,
) {
    let Ok(player) = q_player.single() else {
        return;
    };
    let floor = player.translation.y - config.enemy_despawn_distance;
    for (entity, transform) in q_enemies.iter() {
        if transform.translation.y < floor {
            commands.entity(entity).despawn();
        }
    }
}

pub fn clear_enemies_system(
    mut commands: Commands,
    mut state: ResMut<EnemySpawnState>,
    q_enemies: Query<Entity, With<Enemy>>,
) {
    for entity in q_enemies.iter() {
        commands.entity(entity).despawn();
    }
    *state = EnemySpawnState::default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const PATTERNS: [MotionPattern; 6] = [
        MotionPattern::Static,
        MotionPattern::LinearHorizontal,
        MotionPattern::LinearVertical,
        MotionPattern::Wavy,
        MotionPattern::Jerky,
        MotionPattern::Unpredictable,
    ];

    #[test]
    fn every_pattern_starts_at_spawn_point() {
        for pattern in PATTERNS {
            let offset = motion_offset(pattern, (100.0, 1.0), 200.0, 0.0, 42);
            assert!(offset.length() < 1e-3, "{pattern:?} starts at {offset:?}");
        }
    }

    #[test]
    fn motion_is_deterministic_per_seed() {
        for pattern in PATTERNS {
            for step in 0..50 {
                let t = step as f32 * 0.13;
                assert_eq!(
                    motion_offset(pattern, (120.0, 0.8), 300.0, t, 7),
                    motion_offset(pattern, (120.0, 0.8), 300.0, t, 7)
                );
            }
        }
    }

    #[test]
    fn static_never_moves() {
        assert_eq!(
            motion_offset(MotionPattern::Static, (50.0, 50.0), 10.0, 3.0, 1),
            Vec2::ZERO
        );
    }

    #[test]
    fn linear_sweep_stays_within_amplitude() {
        for step in 0..200 {
            let t = step as f32 * 0.05;
            let h = motion_offset(MotionPattern::LinearHorizontal, (80.0, 0.0), 150.0, t, 0);
            let v = motion_offset(MotionPattern::LinearVertical, (80.0, 0.0), 150.0, t, 0);
            assert!(h.x.abs() <= 80.0 + 1e-3 && h.y == 0.0);
            assert!(v.y.abs() <= 80.0 + 1e-3 && v.x == 0.0);
        }
    }

    #[test]
    fn triangle_hits_both_extremes() {
        assert_eq!(triangle(10.0, 10.0), 10.0);
        assert_eq!(triangle(30.0, 10.0), -10.0);
        assert!(triangle(40.0, 10.0).abs() < 1e-4);
    }

    #[test]
    fn jerky_and_unpredictable_are_bounded() {
        for step in 0..300 {
            let t = step as f32 * 0.07;
            let jerky = motion_offset(MotionPattern::Jerky, (100.0, 0.5), 400.0, t, 9);
            assert!(jerky.x.abs() <= 100.0 + 1e-3 && jerky.y.abs() <= 100.0 + 1e-3);
            let wild = motion_offset(MotionPattern::Unpredictable, (60.0, 30.0), 0.0, t, 9);
            assert!(wild.x.abs() <= 120.0 + 1e-3 && wild.y.abs() <= 60.0 + 1e-3);
        }
    }

    #[test]
    fn wave_layout_respects_isolation_gaps() {
        let catalog = RegionCatalog::default();
        let specs: Vec<EnemySpec> = catalog.regions[1].enemies.clone();
        let mut rng = StdRng::seed_from_u64(21);
        let positions = wave_layout(&specs, 1000.0, 300.0, &mut rng);
        assert_eq!(positions.len(), specs.len());

        let mut previous = 1000.0;
        for (spec, pos) in specs.iter().zip(&positions) {
            let (lo, hi) = spec.isolate_range();
            let gap = pos.y - previous;
            assert!(gap >= lo - 1e-3 && gap <= hi + 1e-3, "gap {gap} outside {lo}..{hi}");
            assert!(pos.x.abs() <= 300.0);
            previous = pos.y;
        }
    }

    #[test]
    fn challenge_waves_follow_interval() {
        let waves: Vec<u32> = (1..=12).filter(|w| is_challenge_wave(*w, 4)).collect();
        assert_eq!(waves, vec![4, 8, 12]);
        assert!(!is_challenge_wave(4, 0));
    }
}
