//! Tiered characteristics: numeric gameplay parameters that depend on an
//! upgrade level.
//!
//! Each [`CharacteristicEntry`] carries two per-level arrays indexed by level:
//! the value at that level and the coin cost of reaching it.  Only the current
//! level is mutable; costs and values are authored data.
//!
//! | Operation | Absent key | Level past the arrays |
//! |-----------|------------|-----------------------|
//! | [`CharacteristicTable::level`] | `0` | n/a |
//! | [`CharacteristicTable::max_level`] | `0` | n/a |
//! | [`CharacteristicTable::level_cost`] | `None` | `None` |
//! | [`CharacteristicTable::value_for_level`] | `Err(UnknownCharacteristic)` | `Err(LevelOutOfRange)` |
//! | [`CharacteristicTable::set_level`] | `None`, logged | clamped to max, logged |
//!
//! Some characteristics are slaved to another one through a
//! [`CharacteristicLink`]: setting the driver's level sets the slaved
//! characteristic to the same level.

use crate::economy::Economy;
use crate::error::{GameError, GameResult};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Identifier of an upgradeable gameplay parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Characteristic {
    // Boost
    BoostForce,
    BoostCharges,
    BoostCooldown,
    ForceIncreaseDuration,
    InterpolationRate,
    // Emergency brake
    BrakeCharges,
    BrakeCooldown,
    // Magnet
    MagnetRadius,
    MagnetStrength,
    // Hull
    HullCapacity,
    RepairEfficiency,
}

/// Authored per-level data plus the mutable current level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicEntry {
    pub characteristic: Characteristic,
    #[serde(default)]
    pub current_level: u32,
    /// Coin cost of reaching each level; index 0 is the starting level.
    pub level_cost: Vec<u32>,
    pub values_per_level: Vec<f32>,
}

impl CharacteristicEntry {
    pub fn new(characteristic: Characteristic, level_cost: Vec<u32>, values: Vec<f32>) -> Self {
        Self {
            characteristic,
            current_level: 0,
            level_cost,
            values_per_level: values,
        }
    }

    #[inline]
    pub fn max_level(&self) -> u32 {
        (self.values_per_level.len() as u32).saturating_sub(1)
    }
}

/// Setting `driver`'s level also sets `slaved` to the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicLink {
    pub driver: Characteristic,
    pub slaved: Characteristic,
}

/// Persisted form of one entry: the level, and optionally the cost array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLevel {
    pub characteristic: Characteristic,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_cost: Option<Vec<u32>>,
}

/// A set of tiered characteristics with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicTable {
    entries: Vec<CharacteristicEntry>,
    #[serde(default)]
    links: Vec<CharacteristicLink>,
}

impl CharacteristicTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add `entry`, replacing any entry with the same key.
    pub fn with_entry(mut self, entry: CharacteristicEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Builder: slave `slaved` to `driver`.
    pub fn with_link(mut self, driver: Characteristic, slaved: Characteristic) -> Self {
        self.links.push(CharacteristicLink { driver, slaved });
        self
    }

    pub fn insert(&mut self, entry: CharacteristicEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.characteristic == entry.characteristic)
        {
            Some(existing) => {
                warn!(
                    "Duplicate characteristic {:?}; keeping the last definition",
                    entry.characteristic
                );
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
    }

    /// Remove duplicate keys left by deserialization, keeping the last one.
    pub fn dedup(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            self.insert(entry);
        }
    }

    pub fn entries(&self) -> &[CharacteristicEntry] {
        &self.entries
    }

    pub fn links(&self) -> &[CharacteristicLink] {
        &self.links
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, characteristic: Characteristic) -> bool {
        self.entry(characteristic).is_some()
    }

    pub fn entry(&self, characteristic: Characteristic) -> Option<&CharacteristicEntry> {
        self.entries
            .iter()
            .find(|e| e.characteristic == characteristic)
    }

    fn entry_mut(&mut self, characteristic: Characteristic) -> Option<&mut CharacteristicEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.characteristic == characteristic)
    }

    /// Current level, or `0` when the characteristic is not configured.
    pub fn level(&self, characteristic: Characteristic) -> u32 {
        self.entry(characteristic).map_or(0, |e| e.current_level)
    }

    /// Highest valid level, or `0` when the characteristic is not configured.
    pub fn max_level(&self, characteristic: Characteristic) -> u32 {
        self.entry(characteristic)
            .map_or(0, CharacteristicEntry::max_level)
    }

    pub fn is_maxed(&self, characteristic: Characteristic) -> bool {
        self.level(characteristic) >= self.max_level(characteristic)
    }

    /// Cost of reaching `level`.  `None` means the key or the level is not
    /// configured, which is distinct from a configured cost of zero.
    pub fn level_cost(&self, characteristic: Characteristic, level: u32) -> Option<u32> {
        self.entry(characteristic)?
            .level_cost
            .get(level as usize)
            .copied()
    }

    /// Cost of the next upgrade, or `None` when maxed or not configured.
    pub fn next_level_cost(&self, characteristic: Characteristic) -> Option<u32> {
        if self.is_maxed(characteristic) {
            return None;
        }
        self.level_cost(characteristic, self.level(characteristic) + 1)
    }

    pub fn value_for_level(&self, characteristic: Characteristic, level: u32) -> GameResult<f32> {
        let entry = self
            .entry(characteristic)
            .ok_or(GameError::UnknownCharacteristic { characteristic })?;
        entry
            .values_per_level
            .get(level as usize)
            .copied()
            .ok_or(GameError::LevelOutOfRange {
                characteristic,
                level,
                max_level: entry.max_level(),
            })
    }

    pub fn current_value(&self, characteristic: Characteristic) -> GameResult<f32> {
        self.value_for_level(characteristic, self.level(characteristic))
    }

    /// Current value, or `fallback` (logged) when the lookup fails.
    pub fn value_or(&self, characteristic: Characteristic, fallback: f32) -> f32 {
        self.current_value(characteristic).unwrap_or_else(|err| {
            warn!("{err}; using {fallback}");
            fallback
        })
    }

    /// Characteristics slaved to `driver`.
    pub fn slaved_to(&self, driver: Characteristic) -> impl Iterator<Item = Characteristic> + '_ {
        self.links
            .iter()
            .filter(move |link| link.driver == driver)
            .map(|link| link.slaved)
    }

    /// Set the level of `characteristic` and of everything slaved to it.
    ///
    /// Levels past the end of an entry's arrays are clamped to its max level.
    /// Returns the level applied to `characteristic`, or `None` when it is not
    /// configured.
    pub fn set_level(&mut self, characteristic: Characteristic, level: u32) -> Option<u32> {
        let applied = self.set_single_level(characteristic, level);
        if applied.is_none() {
            warn!(
                "Cannot set level of unconfigured characteristic {:?}",
                characteristic
            );
            return None;
        }

        let slaved: Vec<Characteristic> = self.slaved_to(characteristic).collect();
        for target in slaved {
            if self.set_single_level(target, level).is_none() {
                warn!(
                    "{:?} is linked to {:?} but not configured",
                    target, characteristic
                );
            }
        }
        applied
    }

    fn set_single_level(&mut self, characteristic: Characteristic, level: u32) -> Option<u32> {
        let entry = self.entry_mut(characteristic)?;
        let applied = clamp_level(entry, level);
        entry.current_level = applied;
        Some(applied)
    }

    /// Buy the next level of `characteristic` from `wallet`.
    ///
    /// Returns the new level.  The wallet is only charged when the upgrade
    /// goes through.  A level with a value but no cost entry is refused.
    pub fn try_upgrade<E: Economy + ?Sized>(
        &mut self,
        characteristic: Characteristic,
        wallet: &mut E,
    ) -> GameResult<u32> {
        if !self.contains(characteristic) {
            return Err(GameError::UnknownCharacteristic { characteristic });
        }
        if self.is_maxed(characteristic) {
            return Err(GameError::MaxLevelReached { characteristic });
        }

        let next = self.level(characteristic) + 1;
        let cost = self
            .level_cost(characteristic, next)
            .ok_or(GameError::MissingCost {
                characteristic,
                level: next,
            })?;
        if !wallet.try_decrease(cost) {
            return Err(GameError::InsufficientFunds { cost });
        }

        Ok(self.set_level(characteristic, next).unwrap_or(next))
    }

    /// Levels to persist, one record per configured key.
    pub fn saved_levels(&self) -> Vec<SavedLevel> {
        self.entries
            .iter()
            .map(|e| SavedLevel {
                characteristic: e.characteristic,
                level: e.current_level,
                level_cost: None,
            })
            .collect()
    }

    /// Apply persisted levels by key.
    ///
    /// Mismatches between the save and the configuration are logged and
    /// tolerated: unknown saved keys are skipped, configured keys missing from
    /// the save keep their level, and out-of-range levels are clamped.  A saved
    /// cost array replaces the configured one only when it has one cost per
    /// level.  Returns how many saved records were applied.
    pub fn load_saved_levels(&mut self, saved: &[SavedLevel]) -> usize {
        if saved.len() != self.entries.len() {
            warn!(
                "Save holds {} characteristic levels but {} are configured; applying matching keys",
                saved.len(),
                self.entries.len()
            );
        }

        let mut applied = 0;
        for record in saved {
            let Some(entry) = self.entry_mut(record.characteristic) else {
                warn!(
                    "Saved characteristic {:?} is no longer configured; skipping",
                    record.characteristic
                );
                continue;
            };

            if let Some(costs) = &record.level_cost {
                if costs.len() == entry.values_per_level.len() {
                    entry.level_cost = costs.clone();
                } else {
                    warn!(
                        "Saved cost table for {:?} has {} levels, expected {}; keeping configured costs",
                        record.characteristic,
                        costs.len(),
                        entry.values_per_level.len()
                    );
                }
            }

            entry.current_level = clamp_level(entry, record.level);
            applied += 1;
        }
        applied
    }
}

fn clamp_level(entry: &CharacteristicEntry, level: u32) -> u32 {
    let max = entry.max_level();
    if level > max {
        warn!(
            "Level {} for {:?} exceeds max level {}; clamping",
            level, entry.characteristic, max
        );
        max
    } else {
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::Wallet;

    fn force_table() -> CharacteristicTable {
        CharacteristicTable::new()
            .with_entry(CharacteristicEntry::new(
                Characteristic::BoostForce,
                vec![0, 10, 25],
                vec![10.0, 20.0, 35.0],
            ))
            .with_entry(CharacteristicEntry::new(
                Characteristic::ForceIncreaseDuration,
                vec![0, 15, 30, 60],
                vec![0.5, 0.75, 1.0, 1.5],
            ))
            .with_entry(CharacteristicEntry::new(
                Characteristic::InterpolationRate,
                vec![0, 0, 0, 0],
                vec![4.0, 5.0, 6.0, 8.0],
            ))
            .with_link(
                Characteristic::ForceIncreaseDuration,
                Characteristic::InterpolationRate,
            )
    }

    #[test]
    fn value_lookup_follows_level_index() {
        let table = force_table();
        let key = Characteristic::BoostForce;
        assert_eq!(table.value_for_level(key, 0), Ok(10.0));
        assert_eq!(table.value_for_level(key, 1), Ok(20.0));
        assert_eq!(table.value_for_level(key, 2), Ok(35.0));
        assert_eq!(table.max_level(key), 2);
    }

    #[test]
    fn value_lookup_past_last_level_fails_explicitly() {
        let table = force_table();
        assert_eq!(
            table.value_for_level(Characteristic::BoostForce, 3),
            Err(GameError::LevelOutOfRange {
                characteristic: Characteristic::BoostForce,
                level: 3,
                max_level: 2,
            })
        );
    }

    #[test]
    fn absent_characteristic_reads_as_zero_level() {
        let table = force_table();
        assert_eq!(table.level(Characteristic::MagnetRadius), 0);
        assert_eq!(table.max_level(Characteristic::MagnetRadius), 0);
        assert_eq!(table.level_cost(Characteristic::MagnetRadius, 0), None);
        assert!(table.current_value(Characteristic::MagnetRadius).is_err());
    }

    #[test]
    fn level_cost_distinguishes_free_from_missing() {
        let table = force_table();
        assert_eq!(table.level_cost(Characteristic::BoostForce, 0), Some(0));
        assert_eq!(table.level_cost(Characteristic::BoostForce, 2), Some(25));
        assert_eq!(table.level_cost(Characteristic::BoostForce, 3), None);
    }

    #[test]
    fn set_level_clamps_to_max() {
        let mut table = force_table();
        assert_eq!(table.set_level(Characteristic::BoostForce, 9), Some(2));
        assert_eq!(table.level(Characteristic::BoostForce), 2);
        assert!(table.is_maxed(Characteristic::BoostForce));
        assert_eq!(table.next_level_cost(Characteristic::BoostForce), None);
    }

    #[test]
    fn set_level_on_absent_key_is_refused() {
        let mut table = force_table();
        assert_eq!(table.set_level(Characteristic::HullCapacity, 1), None);
    }

    #[test]
    fn driver_level_propagates_to_slaved_characteristic() {
        let mut table = force_table();
        table.set_level(Characteristic::ForceIncreaseDuration, 2);
        assert_eq!(table.level(Characteristic::InterpolationRate), 2);
        assert_eq!(table.current_value(Characteristic::InterpolationRate), Ok(6.0));

        // The link is one-way.
        table.set_level(Characteristic::InterpolationRate, 0);
        assert_eq!(table.level(Characteristic::ForceIncreaseDuration), 2);
    }

    #[test]
    fn insert_replaces_duplicate_key() {
        let mut table = force_table();
        table.insert(CharacteristicEntry::new(
            Characteristic::BoostForce,
            vec![0, 1],
            vec![1.0, 2.0],
        ));
        assert_eq!(table.len(), 3);
        assert_eq!(table.max_level(Characteristic::BoostForce), 1);
    }

    #[test]
    fn upgrade_charges_wallet_and_raises_level() {
        let mut table = force_table();
        let mut wallet = Wallet { coins: 40 };

        assert_eq!(table.try_upgrade(Characteristic::BoostForce, &mut wallet), Ok(1));
        assert_eq!(wallet.coins, 30);
        assert_eq!(table.try_upgrade(Characteristic::BoostForce, &mut wallet), Ok(2));
        assert_eq!(wallet.coins, 5);
        assert_eq!(
            table.try_upgrade(Characteristic::BoostForce, &mut wallet),
            Err(GameError::MaxLevelReached {
                characteristic: Characteristic::BoostForce
            })
        );
    }

    #[test]
    fn unaffordable_upgrade_leaves_state_untouched() {
        let mut table = force_table();
        let mut wallet = Wallet { coins: 5 };
        assert_eq!(
            table.try_upgrade(Characteristic::BoostForce, &mut wallet),
            Err(GameError::InsufficientFunds { cost: 10 })
        );
        assert_eq!(wallet.coins, 5);
        assert_eq!(table.level(Characteristic::BoostForce), 0);
    }

    #[test]
    fn upgrade_without_configured_cost_is_refused() {
        let mut table = CharacteristicTable::new().with_entry(CharacteristicEntry::new(
            Characteristic::MagnetRadius,
            vec![0, 30],
            vec![0.0, 80.0, 130.0],
        ));
        let mut wallet = Wallet { coins: 100 };

        assert_eq!(table.try_upgrade(Characteristic::MagnetRadius, &mut wallet), Ok(1));
        assert_eq!(wallet.coins, 70);
        assert_eq!(
            table.try_upgrade(Characteristic::MagnetRadius, &mut wallet),
            Err(GameError::MissingCost {
                characteristic: Characteristic::MagnetRadius,
                level: 2,
            })
        );
        assert_eq!(wallet.coins, 70);
        assert_eq!(table.level(Characteristic::MagnetRadius), 1);
    }

    #[test]
    fn saved_levels_reload_into_fresh_table() {
        let mut table = force_table();
        table.set_level(Characteristic::BoostForce, 1);
        table.set_level(Characteristic::ForceIncreaseDuration, 3);
        let saved = table.saved_levels();

        let mut fresh = force_table();
        assert_eq!(fresh.load_saved_levels(&saved), 3);
        for entry in table.entries() {
            assert_eq!(
                fresh.level(entry.characteristic),
                table.level(entry.characteristic)
            );
        }
    }

    #[test]
    fn load_tolerates_unknown_and_missing_keys() {
        let mut table = force_table();
        let saved = vec![
            SavedLevel {
                characteristic: Characteristic::MagnetRadius,
                level: 4,
                level_cost: None,
            },
            SavedLevel {
                characteristic: Characteristic::BoostForce,
                level: 7,
                level_cost: None,
            },
        ];

        assert_eq!(table.load_saved_levels(&saved), 1);
        assert_eq!(table.level(Characteristic::BoostForce), 2);
        assert_eq!(table.level(Characteristic::ForceIncreaseDuration), 0);
    }

    #[test]
    fn saved_cost_table_applies_only_when_shape_matches() {
        let mut table = force_table();
        let saved = vec![
            SavedLevel {
                characteristic: Characteristic::BoostForce,
                level: 0,
                level_cost: Some(vec![0, 5, 6]),
            },
            SavedLevel {
                characteristic: Characteristic::ForceIncreaseDuration,
                level: 0,
                level_cost: Some(vec![1]),
            },
        ];
        table.load_saved_levels(&saved);

        assert_eq!(table.level_cost(Characteristic::BoostForce, 1), Some(5));
        assert_eq!(
            table.level_cost(Characteristic::ForceIncreaseDuration, 1),
            Some(15)
        );
    }
}
