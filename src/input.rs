//! Keyboard bindings.
//!
//! | Key | State | Effect |
//! |-----|-------|--------|
//! | A / D, ← / → | Playing | steer |
//! | Space | Playing | boost |
//! | S / ↓ | Playing | emergency brake |
//! | 1 … 0 | Paused | buy an upgrade (see [`UPGRADE_HOTKEYS`]) |
//! | F5 | any | save profile |

use crate::characteristics::Characteristic;
use crate::charge::{Ability, AbilityRequest};
use crate::modules::{ModuleKind, UpgradeRequest};
use crate::player::PlayerIntent;
use crate::save::SaveRequest;
use crate::state::GameState;
use bevy::prelude::*;

pub const UPGRADE_HOTKEYS: [(KeyCode, ModuleKind, Characteristic); 10] = [
    (KeyCode::Digit1, ModuleKind::Boost, Characteristic::BoostForce),
    (KeyCode::Digit2, ModuleKind::Boost, Characteristic::BoostCharges),
    (KeyCode::Digit3, ModuleKind::Boost, Characteristic::BoostCooldown),
    (KeyCode::Digit4, ModuleKind::Boost, Characteristic::ForceIncreaseDuration),
    (KeyCode::Digit5, ModuleKind::EmergencyBrake, Characteristic::BrakeCharges),
    (KeyCode::Digit6, ModuleKind::EmergencyBrake, Characteristic::BrakeCooldown),
    (KeyCode::Digit7, ModuleKind::Magnet, Characteristic::MagnetRadius),
    (KeyCode::Digit8, ModuleKind::Magnet, Characteristic::MagnetStrength),
    (KeyCode::Digit9, ModuleKind::Hull, Characteristic::HullCapacity),
    (KeyCode::Digit0, ModuleKind::Hull, Characteristic::RepairEfficiency),
];

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                (steering_input_system, ability_input_system)
                    .run_if(in_state(GameState::Playing)),
                upgrade_hotkey_system.run_if(in_state(GameState::Paused)),
                save_hotkey_system,
            ),
        );
    }
}

/// Net steering from the held keys; opposite keys cancel.
pub fn steering_from_keys(keys: &ButtonInput<KeyCode>) -> f32 {
    let left = keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]);
    let right = keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]);
    match (left, right) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

pub fn steering_input_system(keys: Res<ButtonInput<KeyCode>>, mut intent: ResMut<PlayerIntent>) {
    intent.steer = steering_from_keys(&keys);
}

pub fn ability_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut requests: MessageWriter<AbilityRequest>,
) {
    if keys.just_pressed(KeyCode::Space) {
        requests.write(AbilityRequest {
            ability: Ability::Boost,
        });
    }
    if keys.any_just_pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        requests.write(AbilityRequest {
            ability: Ability::EmergencyBrake,
        });
    }
}

pub fn upgrade_hotkey_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut requests: MessageWriter<UpgradeRequest>,
) {
    for (key, module, characteristic) in UPGRADE_HOTKEYS {
        if keys.just_pressed(key) {
            requests.write(UpgradeRequest {
                module,
                characteristic,
            });
        }
    }
}

pub fn save_hotkey_system(keys: Res<ButtonInput<KeyCode>>, mut requests: MessageWriter<SaveRequest>) {
    if keys.just_pressed(KeyCode::F5) {
        requests.write(SaveRequest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_keys_cancel() {
        let mut keys = ButtonInput::<KeyCode>::default();
        assert_eq!(steering_from_keys(&keys), 0.0);

        keys.press(KeyCode::KeyA);
        assert_eq!(steering_from_keys(&keys), -1.0);

        keys.press(KeyCode::ArrowRight);
        assert_eq!(steering_from_keys(&keys), 0.0);

        keys.release(KeyCode::KeyA);
        assert_eq!(steering_from_keys(&keys), 1.0);
    }

    #[test]
    fn every_hotkey_is_unique() {
        for (i, (key, _, characteristic)) in UPGRADE_HOTKEYS.iter().enumerate() {
            for (other_key, _, other) in &UPGRADE_HOTKEYS[i + 1..] {
                assert_ne!(key, other_key);
                assert_ne!(characteristic, other);
            }
        }
    }
}
