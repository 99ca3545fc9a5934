//! Ascent game library
//!
//! A vertical flight arcade game: the ship climbs through altitude regions,
//! dodges enemy waves, collects pickups that are recycled around it, and
//! spends coins on tiered module upgrades.  Boost and emergency brake are
//! charge-limited abilities that refill on a cooldown.

pub mod characteristics;
pub mod charge;
pub mod config;
pub mod constants;
pub mod economy;
pub mod enemy;
pub mod error;
pub mod hud;
pub mod input;
pub mod modules;
pub mod pickup;
pub mod player;
pub mod region;
pub mod relocation;
pub mod save;
pub mod state;

use bevy::prelude::*;

/// Every gameplay plugin and the ordered startup sequence, without window,
/// rendering, or HUD.
///
/// Requires `Time`, `ButtonInput<KeyCode>`, and the states plugin to be
/// present (all provided by `DefaultPlugins`).
pub struct AscentPlugin;

impl Plugin for AscentPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<config::FlightConfig>()
            .add_plugins((
                state::StatePlugin,
                charge::ChargePlugin,
                modules::ModulesPlugin,
                relocation::RelocationPlugin,
                pickup::PickupPlugin,
                player::PlayerPlugin,
                enemy::EnemySpawnPlugin,
                save::SavePlugin,
                input::InputPlugin,
            ))
            .add_systems(
                Startup,
                (
                    // Config and catalogs first so every later step sees the final values.
                    config::load_flight_config,
                    modules::load_module_catalog,
                    region::load_region_catalog,
                    save::load_profile_system,
                    modules::init_ability_charges_system,
                    player::spawn_player,
                    pickup::spawn_pickup_pools,
                )
                    .chain(),
            );
    }
}
