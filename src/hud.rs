//! Camera, HUD text, and gizmo drawing.
//!
//! ## Layers
//!
//! | Layer | Technique | Source |
//! |-------|-----------|--------|
//! | Ship, enemies, pickups | Gizmos | world transforms |
//! | Charges / coins / height / hull | Bevy UI | [`HudCharges`], [`Wallet`], [`RunStats`], [`Hull`] |
//! | Status banner | Bevy UI | `GameState` |

use crate::charge::{Ability, AbilityCharges, ChargeChanged};
use crate::config::FlightConfig;
use crate::economy::Wallet;
use crate::enemy::Enemy;
use crate::pickup::PickupKind;
use crate::player::{Hull, Player, RunStats};
use crate::relocation::PooledItem;
use crate::state::GameState;
use bevy::prelude::*;

/// Marker for the HUD text root node.
#[derive(Component)]
pub struct HudDisplay;

/// Marker for the state banner node.
#[derive(Component)]
pub struct StatusBanner;

/// Last charge counts announced through [`ChargeChanged`].
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudCharges {
    pub boost: u32,
    pub brake: u32,
}

impl HudCharges {
    pub fn from_pools(charges: &AbilityCharges) -> Self {
        Self {
            boost: charges.boost.charges(),
            brake: charges.brake.charges(),
        }
    }
}

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                hud_charge_listener_system,
                hud_text_system,
                status_banner_system,
                camera_follow_system,
                draw_world_gizmos_system,
            )
                .chain(),
        );
    }
}

pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Spawn the HUD text and the state banner, seeded from the current pools.
pub fn setup_hud(mut commands: Commands, config: Res<FlightConfig>, charges: Res<AbilityCharges>) {
    commands.insert_resource(HudCharges::from_pools(&charges));

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            HudDisplay,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: config.hud_font_size,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.88, 0.45)),
            ));
        });

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0 + config.hud_font_size + 6.0),
                ..default()
            },
            StatusBanner,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: config.hud_font_size,
                    ..default()
                },
                TextColor(Color::srgb(1.0, 0.35, 0.3)),
            ));
        });
}

pub fn hud_charge_listener_system(
    mut changed: MessageReader<ChargeChanged>,
    hud: Option<ResMut<HudCharges>>,
) {
    let Some(mut hud) = hud else {
        changed.clear();
        return;
    };
    for message in changed.read() {
        match message.ability {
            Ability::Boost => hud.boost = message.charges,
            Ability::EmergencyBrake => hud.brake = message.charges,
        }
    }
}

pub fn hud_line(charges: HudCharges, coins: u32, stats: &RunStats, hull: Option<&Hull>) -> String {
    let hull = hull
        .map(|h| format!("{:.0}/{:.0}", h.hp, h.max_hp))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} {}  {} {}  |  Coins: {}  |  Height: {:.0} m (best {:.0})  |  Hull: {}",
        Ability::Boost.label(),
        charges.boost,
        Ability::EmergencyBrake.label(),
        charges.brake,
        coins,
        stats.height,
        stats.best_height,
        hull
    )
}

pub fn hud_text_system(
    charges: Option<Res<HudCharges>>,
    wallet: Res<Wallet>,
    stats: Res<RunStats>,
    q_hull: Query<&Hull, With<Player>>,
    parent_query: Query<&Children, With<HudDisplay>>,
    mut text_query: Query<&mut Text>,
) {
    let Some(charges) = charges else {
        return;
    };
    let line = hud_line(*charges, wallet.coins, &stats, q_hull.iter().next());
    for children in parent_query.iter() {
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(line.clone());
            }
        }
    }
}

pub fn status_banner_system(
    state: Res<State<GameState>>,
    parent_query: Query<&Children, With<StatusBanner>>,
    mut text_query: Query<&mut Text>,
) {
    if !state.is_changed() {
        return;
    }
    let banner = match state.get() {
        GameState::Playing => "",
        GameState::Paused => "PAUSED  |  1-0 buy upgrades  |  F5 save  |  Esc resume",
        GameState::GameOver => "HULL DESTROYED  |  Enter to fly again",
    };
    for children in parent_query.iter() {
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(banner);
            }
        }
    }
}

pub fn camera_follow_system(
    q_player: Query<&Transform, With<Player>>,
    mut q_camera: Query<&mut Transform, (With<Camera>, Without<Player>)>,
) {
    let Ok(player_transform) = q_player.single() else {
        return;
    };
    let Ok(mut cam) = q_camera.single_mut() else {
        return;
    };

    cam.translation.x = player_transform.translation.x;
    cam.translation.y = player_transform.translation.y;
}

pub fn draw_world_gizmos_system(
    mut gizmos: Gizmos,
    config: Res<FlightConfig>,
    q_player: Query<&Transform, With<Player>>,
    q_enemies: Query<&Transform, With<Enemy>>,
    q_items: Query<(&Transform, &PickupKind, &Visibility), With<PooledItem>>,
) {
    for transform in q_player.iter() {
        let pos = transform.translation.truncate();
        let r = config.player_radius;
        gizmos.line_2d(pos + Vec2::new(0.0, r), pos + Vec2::new(-r, -r), Color::WHITE);
        gizmos.line_2d(pos + Vec2::new(-r, -r), pos + Vec2::new(r, -r), Color::WHITE);
        gizmos.line_2d(pos + Vec2::new(r, -r), pos + Vec2::new(0.0, r), Color::WHITE);
    }

    for transform in q_enemies.iter() {
        gizmos.circle_2d(
            transform.translation.truncate(),
            config.enemy_contact_radius,
            Color::srgb(1.0, 0.3, 0.25),
        );
    }

    for (transform, kind, visibility) in q_items.iter() {
        if *visibility == Visibility::Hidden {
            continue;
        }
        let color = match kind {
            PickupKind::RepairKit => Color::srgb(0.3, 1.0, 0.45),
            PickupKind::Coin => Color::srgb(1.0, 0.85, 0.2),
        };
        gizmos.circle_2d(transform.translation.truncate(), config.pickup_radius * 0.5, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hud_line_lists_every_counter() {
        let line = hud_line(
            HudCharges { boost: 2, brake: 1 },
            35,
            &RunStats {
                height: 812.4,
                best_height: 1200.0,
            },
            Some(&Hull::new(100.0)),
        );
        assert!(line.contains("BOOST 2"));
        assert!(line.contains("BRAKE 1"));
        assert!(line.contains("Coins: 35"));
        assert!(line.contains("Height: 812 m (best 1200)"));
        assert!(line.contains("Hull: 100/100"));
    }
}
