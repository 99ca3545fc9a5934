//! Collectible pools: repair kits and coins kept ahead of the ship.

use crate::characteristics::Characteristic;
use crate::config::FlightConfig;
use crate::economy::{Economy, Wallet};
use crate::modules::{ModuleCatalog, ModuleKind};
use crate::player::{Hull, Player};
use crate::relocation::{spawn_item_pool, ItemPool, PooledItem, RelocationBounds};
use crate::state::GameState;
use bevy::prelude::*;

/// What a pooled item gives when collected.  Also tags its pool entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    RepairKit,
    Coin,
}

/// Something collected this frame.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct PickupCollected {
    pub kind: PickupKind,
    pub position: Vec2,
}

pub struct PickupPlugin;

impl Plugin for PickupPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PickupCollected>().add_systems(
            Update,
            (magnet_system, pickup_system)
                .chain()
                .after(crate::relocation::relocation_system)
                .run_if(in_state(GameState::Playing)),
        );
    }
}

/// Startup system: one pool per pickup kind.
pub fn spawn_pickup_pools(mut commands: Commands, config: Res<FlightConfig>) {
    spawn_pool(
        &mut commands,
        PickupKind::RepairKit,
        config.repair_kit_pool_size,
        config.repair_kit_bounds,
    );
    spawn_pool(
        &mut commands,
        PickupKind::Coin,
        config.coin_pool_size,
        config.coin_bounds,
    );
}

fn spawn_pool(commands: &mut Commands, kind: PickupKind, count: usize, bounds: RelocationBounds) {
    spawn_item_pool(
        commands,
        count,
        bounds,
        kind,
        (kind, Name::new(format!("{kind:?} pool"))),
    );
    info!("Spawned {:?} pool with {} items", kind, count);
}

/// Pull visible coins towards the ship when the magnet module reaches them.
pub fn magnet_system(
    time: Res<Time>,
    catalog: Res<ModuleCatalog>,
    q_player: Query<&Transform, With<Player>>,
    mut q_items: Query<(&PickupKind, &mut Transform, &Visibility), (With<PooledItem>, Without<Player>)>,
) {
    let radius = catalog.value_or(ModuleKind::Magnet, Characteristic::MagnetRadius, 0.0);
    if radius <= 0.0 {
        return;
    }
    let strength = catalog.value_or(ModuleKind::Magnet, Characteristic::MagnetStrength, 0.0);
    let Ok(player) = q_player.single() else {
        return;
    };
    let target = player.translation.truncate();
    let step = strength * time.delta_secs();

    for (kind, mut transform, visibility) in q_items.iter_mut() {
        if *kind != PickupKind::Coin || *visibility == Visibility::Hidden {
            continue;
        }
        let pos = transform.translation.truncate();
        let to_player = target - pos;
        let dist = to_player.length();
        if dist > radius || dist <= f32::EPSILON {
            continue;
        }
        let moved = pos + to_player / dist * step.min(dist);
        transform.translation = moved.extend(transform.translation.z);
    }
}

/// Collect every visible item within reach of the ship.
pub fn pickup_system(
    config: Res<FlightConfig>,
    catalog: Res<ModuleCatalog>,
    mut wallet: ResMut<Wallet>,
    mut collected: MessageWriter<PickupCollected>,
    mut q_player: Query<(&Transform, &mut Hull), With<Player>>,
    mut q_pools: Query<&mut ItemPool>,
    mut q_items: Query<(&PooledItem, &PickupKind, &Transform, &mut Visibility), Without<Player>>,
) {
    let Ok((player, mut hull)) = q_player.single_mut() else {
        return;
    };
    let player_pos = player.translation.truncate();
    let reach = config.player_radius + config.pickup_radius;
    let repair_efficiency =
        catalog.value_or(ModuleKind::Hull, Characteristic::RepairEfficiency, 1.0);

    for (pooled, kind, transform, mut visibility) in q_items.iter_mut() {
        if *visibility == Visibility::Hidden {
            continue;
        }
        let position = transform.translation.truncate();
        if position.distance(player_pos) > reach {
            continue;
        }

        *visibility = Visibility::Hidden;
        if let Ok(mut pool) = q_pools.get_mut(pooled.pool) {
            pool.relocator.deactivate(pooled.index);
        }
        match kind {
            PickupKind::Coin => wallet.increase(config.coin_value),
            PickupKind::RepairKit => {
                hull.repair(config.repair_kit_hull_restore * repair_efficiency)
            }
        }
        collected.write(PickupCollected {
            kind: *kind,
            position,
        });
    }
}
