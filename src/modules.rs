//! Upgradeable ship modules and the upgrade shop flow.
//!
//! Every module owns a [`CharacteristicTable`].  The default tables below are
//! the authored progression; `assets/modules.toml` may replace them.
//!
//! ## Module layout
//!
//! | Module | Characteristics |
//! |--------|-----------------|
//! | Boost | `BoostForce`, `BoostCharges`, `BoostCooldown`, `ForceIncreaseDuration` → `InterpolationRate` |
//! | EmergencyBrake | `BrakeCharges`, `BrakeCooldown` |
//! | Magnet | `MagnetRadius`, `MagnetStrength` |
//! | Hull | `HullCapacity`, `RepairEfficiency` |
//!
//! `ForceIncreaseDuration` drives `InterpolationRate`: buying a longer boost
//! ramp also buys a faster ramp of the same tier.

use crate::characteristics::{Characteristic, CharacteristicEntry, CharacteristicTable};
use crate::charge::{Ability, AbilityCharges, ChargeChanged};
use crate::config::load_toml_or_default;
use crate::economy::Wallet;
use crate::state::GameState;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::iter;

pub const MODULE_CATALOG_PATH: &str = "assets/modules.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleKind {
    Boost,
    EmergencyBrake,
    Magnet,
    Hull,
}

impl ModuleKind {
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            ModuleKind::Boost => "BOOST",
            ModuleKind::EmergencyBrake => "EMERGENCY BRAKE",
            ModuleKind::Magnet => "MAGNET",
            ModuleKind::Hull => "HULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub kind: ModuleKind,
    pub table: CharacteristicTable,
}

/// All upgradeable modules with their live levels.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleCatalog {
    pub modules: Vec<ModuleConfig>,
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self {
            modules: vec![
                ModuleConfig {
                    kind: ModuleKind::Boost,
                    table: boost_table(),
                },
                ModuleConfig {
                    kind: ModuleKind::EmergencyBrake,
                    table: brake_table(),
                },
                ModuleConfig {
                    kind: ModuleKind::Magnet,
                    table: magnet_table(),
                },
                ModuleConfig {
                    kind: ModuleKind::Hull,
                    table: hull_table(),
                },
            ],
        }
    }
}

impl ModuleCatalog {
    pub fn table(&self, kind: ModuleKind) -> Option<&CharacteristicTable> {
        self.modules.iter().find(|m| m.kind == kind).map(|m| &m.table)
    }

    pub fn table_mut(&mut self, kind: ModuleKind) -> Option<&mut CharacteristicTable> {
        self.modules
            .iter_mut()
            .find(|m| m.kind == kind)
            .map(|m| &mut m.table)
    }

    /// Current value of `characteristic` in `kind`, or `fallback` when the
    /// module or key is missing.
    pub fn value_or(&self, kind: ModuleKind, characteristic: Characteristic, fallback: f32) -> f32 {
        match self.table(kind) {
            Some(table) => table.value_or(characteristic, fallback),
            None => {
                warn!("Module {:?} is not configured; using {fallback}", kind);
                fallback
            }
        }
    }
}

fn entry(characteristic: Characteristic, costs: &[u32], values: &[f32]) -> CharacteristicEntry {
    CharacteristicEntry::new(characteristic, costs.to_vec(), values.to_vec())
}

pub fn boost_table() -> CharacteristicTable {
    CharacteristicTable::new()
        .with_entry(entry(
            Characteristic::BoostForce,
            &[0, 40, 90, 160, 250],
            &[1.6, 1.8, 2.0, 2.25, 2.5],
        ))
        .with_entry(entry(
            Characteristic::BoostCharges,
            &[0, 120, 300],
            &[2.0, 3.0, 4.0],
        ))
        .with_entry(entry(
            Characteristic::BoostCooldown,
            &[0, 60, 140, 260],
            &[6.0, 5.0, 4.25, 3.5],
        ))
        .with_entry(entry(
            Characteristic::ForceIncreaseDuration,
            &[0, 50, 110, 200],
            &[1.0, 1.25, 1.5, 2.0],
        ))
        .with_entry(entry(
            Characteristic::InterpolationRate,
            &[0, 0, 0, 0],
            &[3.0, 3.5, 4.0, 5.0],
        ))
        .with_link(
            Characteristic::ForceIncreaseDuration,
            Characteristic::InterpolationRate,
        )
}

pub fn brake_table() -> CharacteristicTable {
    CharacteristicTable::new()
        .with_entry(entry(
            Characteristic::BrakeCharges,
            &[0, 150, 350],
            &[1.0, 2.0, 3.0],
        ))
        .with_entry(entry(
            Characteristic::BrakeCooldown,
            &[0, 80, 180],
            &[12.0, 9.0, 7.0],
        ))
}

pub fn magnet_table() -> CharacteristicTable {
    CharacteristicTable::new()
        .with_entry(entry(
            Characteristic::MagnetRadius,
            &[0, 30, 70, 130],
            &[0.0, 80.0, 130.0, 200.0],
        ))
        .with_entry(entry(
            Characteristic::MagnetStrength,
            &[0, 40, 90],
            &[150.0, 220.0, 300.0],
        ))
}

pub fn hull_table() -> CharacteristicTable {
    CharacteristicTable::new()
        .with_entry(entry(
            Characteristic::HullCapacity,
            &[0, 60, 150, 300],
            &[100.0, 125.0, 150.0, 200.0],
        ))
        .with_entry(entry(
            Characteristic::RepairEfficiency,
            &[0, 50, 120],
            &[1.0, 1.3, 1.6],
        ))
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// Request to buy the next level of `characteristic` in `module`.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeRequest {
    pub module: ModuleKind,
    pub characteristic: Characteristic,
}

/// `characteristic` in `module` is now at `level`, worth `value`.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct LevelChanged {
    pub module: ModuleKind,
    pub characteristic: Characteristic,
    pub level: u32,
    pub value: f32,
}

pub struct ModulesPlugin;

impl Plugin for ModulesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModuleCatalog>()
            .init_resource::<Wallet>()
            .add_message::<UpgradeRequest>()
            .add_message::<LevelChanged>()
            .add_systems(
                Update,
                upgrade_purchase_system.run_if(not(in_state(GameState::GameOver))),
            )
            .add_systems(OnExit(GameState::GameOver), restart_ability_charges_system);
    }
}

/// Startup system: replace the default catalog from `assets/modules.toml`.
pub fn load_module_catalog(mut catalog: ResMut<ModuleCatalog>) {
    let mut loaded = load_toml_or_default::<ModuleCatalog>(MODULE_CATALOG_PATH);
    for module in &mut loaded.modules {
        module.table.dedup();
    }
    *catalog = loaded;
}

/// Push boost/brake capacities and cooldowns from the tables into the pools.
///
/// With `reset` the pools start full; otherwise current charges are kept
/// and only capacity and cooldown change.
pub fn sync_ability_charges(catalog: &ModuleCatalog, charges: &mut AbilityCharges, reset: bool) {
    let boost_max = catalog
        .value_or(ModuleKind::Boost, Characteristic::BoostCharges, 2.0)
        .round()
        .max(0.0) as u32;
    let boost_cooldown = catalog.value_or(ModuleKind::Boost, Characteristic::BoostCooldown, 6.0);
    let brake_max = catalog
        .value_or(ModuleKind::EmergencyBrake, Characteristic::BrakeCharges, 1.0)
        .round()
        .max(0.0) as u32;
    let brake_cooldown = catalog.value_or(
        ModuleKind::EmergencyBrake,
        Characteristic::BrakeCooldown,
        12.0,
    );

    if reset {
        charges.boost.initialize(boost_max, boost_cooldown, true);
        charges.brake.initialize(brake_max, brake_cooldown, true);
    } else {
        charges.boost.reconfigure(boost_max, boost_cooldown);
        charges.brake.reconfigure(brake_max, brake_cooldown);
    }
}

/// Startup system: fill the ability pools from the (possibly loaded) levels.
pub fn init_ability_charges_system(catalog: Res<ModuleCatalog>, mut charges: ResMut<AbilityCharges>) {
    sync_ability_charges(&catalog, &mut charges, true);
}

/// Refill the pools for a new run and announce the refilled counts.
pub fn restart_ability_charges_system(
    catalog: Res<ModuleCatalog>,
    mut charges: ResMut<AbilityCharges>,
    mut changed: MessageWriter<ChargeChanged>,
) {
    sync_ability_charges(&catalog, &mut charges, true);
    for ability in Ability::ALL {
        changed.write(ChargeChanged {
            ability,
            charges: charges.pool(ability).charges(),
        });
    }
}

pub fn upgrade_purchase_system(
    mut requests: MessageReader<UpgradeRequest>,
    mut catalog: ResMut<ModuleCatalog>,
    mut wallet: ResMut<Wallet>,
    mut charges: ResMut<AbilityCharges>,
    mut level_changed: MessageWriter<LevelChanged>,
) {
    for request in requests.read() {
        let Some(table) = catalog.table_mut(request.module) else {
            warn!("Upgrade requested for unconfigured module {:?}", request.module);
            continue;
        };

        match table.try_upgrade(request.characteristic, &mut *wallet) {
            Ok(level) => {
                info!(
                    "Upgraded {} {:?} to level {} ({} coins left)",
                    request.module.label(),
                    request.characteristic,
                    level,
                    wallet.coins
                );
                let touched: Vec<Characteristic> = iter::once(request.characteristic)
                    .chain(table.slaved_to(request.characteristic))
                    .collect();
                for characteristic in touched {
                    level_changed.write(LevelChanged {
                        module: request.module,
                        characteristic,
                        level: table.level(characteristic),
                        value: table.value_or(characteristic, 0.0),
                    });
                }
            }
            Err(err) => {
                info!("Upgrade of {:?} refused: {err}", request.characteristic);
                continue;
            }
        }

        if matches!(request.module, ModuleKind::Boost | ModuleKind::EmergencyBrake) {
            sync_ability_charges(&catalog, &mut charges, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_every_module() {
        let catalog = ModuleCatalog::default();
        for kind in [
            ModuleKind::Boost,
            ModuleKind::EmergencyBrake,
            ModuleKind::Magnet,
            ModuleKind::Hull,
        ] {
            assert!(catalog.table(kind).is_some(), "{kind:?} missing");
        }
    }

    #[test]
    fn authored_tables_have_one_cost_per_level() {
        let catalog = ModuleCatalog::default();
        for module in &catalog.modules {
            for entry in module.table.entries() {
                assert_eq!(
                    entry.level_cost.len(),
                    entry.values_per_level.len(),
                    "{:?} cost/value arrays differ",
                    entry.characteristic
                );
            }
        }
    }

    #[test]
    fn boost_ramp_duration_drives_interpolation_rate() {
        let mut table = boost_table();
        table.set_level(Characteristic::ForceIncreaseDuration, 3);
        assert_eq!(table.level(Characteristic::InterpolationRate), 3);
    }

    #[test]
    fn sync_uses_table_values_for_pool_shape() {
        let mut catalog = ModuleCatalog::default();
        let mut charges = AbilityCharges::default();
        sync_ability_charges(&catalog, &mut charges, true);
        assert_eq!(charges.boost.max_charges(), 2);
        assert_eq!(charges.boost.charges(), 2);
        assert_eq!(charges.brake.max_charges(), 1);

        charges.boost.use_charge();
        catalog
            .table_mut(ModuleKind::Boost)
            .expect("boost table")
            .set_level(Characteristic::BoostCharges, 2);
        sync_ability_charges(&catalog, &mut charges, false);
        assert_eq!(charges.boost.max_charges(), 4);
        assert_eq!(charges.boost.charges(), 1);
        assert!(charges.boost.is_recharging());
    }

    #[test]
    fn catalog_parses_from_toml() {
        let toml_src = r#"
[[modules]]
kind = "Magnet"

[[modules.table.entries]]
characteristic = "MagnetRadius"
level_cost = [0, 10]
values_per_level = [50.0, 90.0]
"#;
        let catalog: ModuleCatalog =
            crate::config::parse_toml("inline", toml_src).expect("catalog must parse");
        assert_eq!(catalog.modules.len(), 1);
        let table = catalog.table(ModuleKind::Magnet).expect("magnet table");
        assert_eq!(table.max_level(Characteristic::MagnetRadius), 1);
        assert_eq!(table.level(Characteristic::MagnetRadius), 0);
    }
}
