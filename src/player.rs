//! Player ship: climb, steering, ability effects, and hull.
//!
//! The ship climbs on its own at `ascend_speed`.  Input only steers
//! sideways and fires abilities:
//!
//! - **Boost** ramps the climb-speed multiplier towards the boost table's
//!   `BoostForce` at `InterpolationRate` per second, for
//!   `ForceIncreaseDuration` seconds, then ramps back to 1.
//! - **Emergency brake** stops the climb for `brake_duration_secs`.
//!
//! The ship also carries [`RelocationAnchor`], so pooled pickups follow it.

use crate::characteristics::Characteristic;
use crate::charge::{Ability, AbilityActivated};
use crate::config::FlightConfig;
use crate::modules::{upgrade_purchase_system, LevelChanged, ModuleCatalog, ModuleKind};
use crate::relocation::RelocationAnchor;
use crate::state::GameState;
use bevy::prelude::*;

// ── Components ─────────────────────────────────────────────────────────────────

/// Marker component for the player ship entity.
#[derive(Component)]
pub struct Player;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Hull {
    pub hp: f32,
    pub max_hp: f32,
}

impl Hull {
    pub fn new(max_hp: f32) -> Self {
        Self { hp: max_hp, max_hp }
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn damage(&mut self, amount: f32) {
        self.hp = (self.hp - amount.max(0.0)).max(0.0);
    }

    pub fn repair(&mut self, amount: f32) {
        self.hp = (self.hp + amount.max(0.0)).min(self.max_hp);
    }

    /// Change capacity.  Gained capacity is granted as hp; lost capacity
    /// clamps hp.
    pub fn set_capacity(&mut self, max_hp: f32) {
        let gained = (max_hp - self.max_hp).max(0.0);
        self.max_hp = max_hp;
        self.hp = (self.hp + gained).min(max_hp);
    }
}

/// Ability effects currently running on the ship.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    /// Seconds of boost left.
    pub boost_remaining: f32,
    /// Current climb-speed multiplier; eases towards its target.
    pub speed_multiplier: f32,
    /// Seconds of emergency brake left.
    pub brake_remaining: f32,
}

impl Default for FlightState {
    fn default() -> Self {
        Self {
            boost_remaining: 0.0,
            speed_multiplier: 1.0,
            brake_remaining: 0.0,
        }
    }
}

/// Boost parameters resolved from the boost table for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostTuning {
    pub force: f32,
    pub interpolation_rate: f32,
}

impl FlightState {
    /// Advance ability timers by `dt` and return the climb speed for this
    /// frame.
    pub fn step(&mut self, ascend_speed: f32, boost: BoostTuning, dt: f32) -> f32 {
        let target = if self.boost_remaining > 0.0 {
            boost.force
        } else {
            1.0
        };
        let blend = (boost.interpolation_rate * dt).clamp(0.0, 1.0);
        self.speed_multiplier += (target - self.speed_multiplier) * blend;
        self.boost_remaining = (self.boost_remaining - dt).max(0.0);

        let braking = self.brake_remaining > 0.0;
        self.brake_remaining = (self.brake_remaining - dt).max(0.0);
        if braking {
            0.0
        } else {
            ascend_speed * self.speed_multiplier
        }
    }
}

// ── Resources ──────────────────────────────────────────────────────────────────

/// Aggregated steering input for the current frame.  `-1.0` is full left.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct PlayerIntent {
    pub steer: f32,
}

/// Height reached this run and the best height across runs.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub height: f32,
    pub best_height: f32,
}

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerIntent>()
            .init_resource::<RunStats>()
            .add_systems(
                Update,
                (
                    apply_ability_effects_system,
                    flight_system,
                    run_stats_system,
                    game_over_check_system,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            // Upgrades are bought while paused, so capacity must apply there too.
            .add_systems(
                Update,
                hull_upgrade_system
                    .after(upgrade_purchase_system)
                    .run_if(not(in_state(GameState::GameOver))),
            )
            .add_systems(OnExit(GameState::GameOver), reset_player_system);
    }
}

/// Spawn the player's ship at the origin with a full hull.
pub fn spawn_player(mut commands: Commands, catalog: Res<ModuleCatalog>, config: Res<FlightConfig>) {
    let max_hp = catalog.value_or(
        ModuleKind::Hull,
        Characteristic::HullCapacity,
        config.player_max_hull,
    );
    commands.spawn((
        Player,
        RelocationAnchor,
        Hull::new(max_hp),
        FlightState::default(),
        Transform::from_translation(Vec3::ZERO),
        Visibility::default(),
    ));

    info!("Player ship spawned at origin");
}

pub fn boost_tuning(catalog: &ModuleCatalog) -> BoostTuning {
    BoostTuning {
        force: catalog.value_or(ModuleKind::Boost, Characteristic::BoostForce, 1.5),
        interpolation_rate: catalog.value_or(
            ModuleKind::Boost,
            Characteristic::InterpolationRate,
            3.0,
        ),
    }
}

pub fn apply_ability_effects_system(
    mut activated: MessageReader<AbilityActivated>,
    catalog: Res<ModuleCatalog>,
    config: Res<FlightConfig>,
    mut q_player: Query<&mut FlightState, With<Player>>,
) {
    let Ok(mut flight) = q_player.single_mut() else {
        activated.clear();
        return;
    };
    for message in activated.read() {
        match message.ability {
            Ability::Boost => {
                flight.boost_remaining = catalog.value_or(
                    ModuleKind::Boost,
                    Characteristic::ForceIncreaseDuration,
                    1.0,
                );
            }
            Ability::EmergencyBrake => {
                flight.brake_remaining = config.brake_duration_secs;
            }
        }
    }
}

pub fn flight_system(
    time: Res<Time>,
    config: Res<FlightConfig>,
    catalog: Res<ModuleCatalog>,
    intent: Res<PlayerIntent>,
    mut q_player: Query<(&mut Transform, &mut FlightState), With<Player>>,
) {
    let dt = time.delta_secs();
    let tuning = boost_tuning(&catalog);
    for (mut transform, mut flight) in q_player.iter_mut() {
        let climb = flight.step(config.ascend_speed, tuning, dt);
        transform.translation.y += climb * dt;
        transform.translation.x = (transform.translation.x
            + intent.steer.clamp(-1.0, 1.0) * config.horizontal_speed * dt)
            .clamp(-config.lane_half_width, config.lane_half_width);
    }
}

pub fn run_stats_system(q_player: Query<&Transform, With<Player>>, mut stats: ResMut<RunStats>) {
    let Ok(transform) = q_player.single() else {
        return;
    };
    stats.height = stats.height.max(transform.translation.y);
    stats.best_height = stats.best_height.max(stats.height);
}

/// Apply bought hull capacity to the live ship.
pub fn hull_upgrade_system(
    mut level_changed: MessageReader<LevelChanged>,
    mut q_player: Query<&mut Hull, With<Player>>,
) {
    for message in level_changed.read() {
        if message.characteristic != Characteristic::HullCapacity {
            continue;
        }
        for mut hull in q_player.iter_mut() {
            hull.set_capacity(message.value);
        }
    }
}

pub fn game_over_check_system(
    q_player: Query<&Hull, With<Player>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if q_player.iter().any(Hull::is_destroyed) {
        info!("Hull destroyed");
        next_state.set(GameState::GameOver);
    }
}

/// Put the ship back at the origin for a new run.
pub fn reset_player_system(
    catalog: Res<ModuleCatalog>,
    config: Res<FlightConfig>,
    mut stats: ResMut<RunStats>,
    mut q_player: Query<(&mut Transform, &mut Hull, &mut FlightState), With<Player>>,
) {
    let max_hp = catalog.value_or(
        ModuleKind::Hull,
        Characteristic::HullCapacity,
        config.player_max_hull,
    );
    for (mut transform, mut hull, mut flight) in q_player.iter_mut() {
        transform.translation = Vec3::ZERO;
        *hull = Hull::new(max_hp);
        *flight = FlightState::default();
    }
    stats.height = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    const TUNING: BoostTuning = BoostTuning {
        force: 2.0,
        interpolation_rate: 4.0,
    };

    #[test]
    fn cruising_climbs_at_ascend_speed() {
        let mut flight = FlightState::default();
        assert_eq!(flight.step(200.0, TUNING, 0.1), 200.0);
    }

    #[test]
    fn boost_ramps_up_then_back_down() {
        let mut flight = FlightState {
            boost_remaining: 0.5,
            ..Default::default()
        };
        let first = flight.step(100.0, TUNING, 0.1);
        assert!(first > 100.0 && first < 200.0);

        for _ in 0..4 {
            flight.step(100.0, TUNING, 0.1);
        }
        let peak = flight.speed_multiplier;
        assert!(peak > 1.5);

        for _ in 0..30 {
            flight.step(100.0, TUNING, 0.1);
        }
        assert!((flight.speed_multiplier - 1.0).abs() < 0.01);
    }

    #[test]
    fn brake_stops_climb_for_its_duration() {
        let mut flight = FlightState {
            brake_remaining: 0.25,
            ..Default::default()
        };
        assert_eq!(flight.step(100.0, TUNING, 0.1), 0.0);
        assert_eq!(flight.step(100.0, TUNING, 0.1), 0.0);
        assert_eq!(flight.step(100.0, TUNING, 0.1), 0.0);
        assert_eq!(flight.step(100.0, TUNING, 0.1), 100.0);
    }

    #[test]
    fn hull_repair_and_damage_are_clamped() {
        let mut hull = Hull::new(100.0);
        hull.damage(130.0);
        assert!(hull.is_destroyed());
        hull.repair(500.0);
        assert_eq!(hull.hp, 100.0);
    }

    #[test]
    fn hull_capacity_upgrade_grants_the_difference() {
        let mut hull = Hull::new(100.0);
        hull.damage(40.0);
        hull.set_capacity(125.0);
        assert_eq!(hull.max_hp, 125.0);
        assert_eq!(hull.hp, 85.0);
    }
}
