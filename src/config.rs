//! Runtime flight configuration loaded from `assets/flight.toml`.
//!
//! [`FlightConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_flight_config`] reads
//! `assets/flight.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! The same loader ([`load_toml_or_default`]) backs the region catalog and the
//! module catalog, which live in `assets/regions.toml` and `assets/modules.toml`.

use crate::constants::*;
use crate::error::{GameError, GameResult};
use crate::relocation::{BoundsOverride, RelocationBounds};
use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::path::Path;

pub const FLIGHT_CONFIG_PATH: &str = "assets/flight.toml";

/// Runtime-tunable flight and gameplay configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    // ── Flight ───────────────────────────────────────────────────────────────
    pub ascend_speed: f32,
    pub horizontal_speed: f32,
    pub lane_half_width: f32,
    pub player_radius: f32,
    pub player_max_hull: f32,

    // ── Abilities ────────────────────────────────────────────────────────────
    pub brake_duration_secs: f32,

    // ── Pooled Items ─────────────────────────────────────────────────────────
    pub repair_kit_pool_size: usize,
    #[serde(deserialize_with = "repair_kit_bounds")]
    pub repair_kit_bounds: RelocationBounds,
    pub repair_kit_hull_restore: f32,
    pub coin_pool_size: usize,
    #[serde(deserialize_with = "coin_bounds")]
    pub coin_bounds: RelocationBounds,
    pub coin_value: u32,
    pub pickup_radius: f32,

    // ── Enemies ──────────────────────────────────────────────────────────────
    pub enemy_wave_spacing: f32,
    pub enemy_spawn_ahead: f32,
    pub enemy_despawn_distance: f32,
    pub challenge_wave_interval: u32,
    pub enemy_contact_radius: f32,
    pub enemy_contact_damage: f32,

    // ── HUD ──────────────────────────────────────────────────────────────────
    pub hud_font_size: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            // Flight
            ascend_speed: ASCEND_SPEED,
            horizontal_speed: HORIZONTAL_SPEED,
            lane_half_width: LANE_HALF_WIDTH,
            player_radius: PLAYER_RADIUS,
            player_max_hull: PLAYER_MAX_HULL,
            // Abilities
            brake_duration_secs: BRAKE_DURATION_SECS,
            // Pooled Items
            repair_kit_pool_size: REPAIR_KIT_POOL_SIZE,
            repair_kit_bounds: RelocationBounds::REPAIR_KIT,
            repair_kit_hull_restore: REPAIR_KIT_HULL_RESTORE,
            coin_pool_size: COIN_POOL_SIZE,
            coin_bounds: RelocationBounds::COIN,
            coin_value: COIN_VALUE,
            pickup_radius: PICKUP_RADIUS,
            // Enemies
            enemy_wave_spacing: ENEMY_WAVE_SPACING,
            enemy_spawn_ahead: ENEMY_SPAWN_AHEAD,
            enemy_despawn_distance: ENEMY_DESPAWN_DISTANCE,
            challenge_wave_interval: CHALLENGE_WAVE_INTERVAL,
            enemy_contact_radius: ENEMY_CONTACT_RADIUS,
            enemy_contact_damage: ENEMY_CONTACT_DAMAGE,
            // HUD
            hud_font_size: HUD_FONT_SIZE,
        }
    }
}

fn repair_kit_bounds<'de, D: Deserializer<'de>>(d: D) -> Result<RelocationBounds, D::Error> {
    BoundsOverride::deserialize(d).map(|o| o.apply(RelocationBounds::REPAIR_KIT))
}

fn coin_bounds<'de, D: Deserializer<'de>>(d: D) -> Result<RelocationBounds, D::Error> {
    BoundsOverride::deserialize(d).map(|o| o.apply(RelocationBounds::COIN))
}

/// Parse `contents` as a `T`, tagging errors with `path` for logging.
pub fn parse_toml<T: DeserializeOwned>(path: &str, contents: &str) -> GameResult<T> {
    toml::from_str::<T>(contents).map_err(|err| GameError::Config {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

/// Read `path` into a `T`, falling back to `T::default()`.
///
/// A missing file is not an error.  Parse errors are logged and the defaults
/// are kept, so a broken tuning file never stops the game from starting.
pub fn load_toml_or_default<T: DeserializeOwned + Default>(path: &str) -> T {
    if !Path::new(path).exists() {
        info!("No {path} found; using compiled defaults");
        return T::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match parse_toml::<T>(path, &contents) {
            Ok(loaded) => {
                info!("Loaded {path}");
                loaded
            }
            Err(err) => {
                warn!("{err}; using defaults");
                T::default()
            }
        },
        Err(err) => {
            warn!("Failed to read {path}: {err}; using defaults");
            T::default()
        }
    }
}

/// Startup system: overwrite the `FlightConfig` resource from `assets/flight.toml`.
pub fn load_flight_config(mut config: ResMut<FlightConfig>) {
    *config = load_toml_or_default::<FlightConfig>(FLIGHT_CONFIG_PATH);
}
