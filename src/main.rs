use ascent::{hud, modules, AscentPlugin};
use bevy::prelude::*;
use bevy::window::WindowResolution;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Ascent".into(),
                resolution: WindowResolution::new(720, 960),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.04, 0.05, 0.12)))
        .add_plugins((AscentPlugin, hud::HudPlugin))
        .add_systems(
            Startup,
            (hud::setup_camera, hud::setup_hud)
                .chain()
                .after(modules::init_ability_charges_system),
        )
        .run();
}
