use bevy::prelude::*;

/// Top-level application state machine.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Active flight.
    #[default]
    Playing,
    /// Flight frozen; upgrades can be bought from the hotkeys.
    Paused,
    /// Hull destroyed.  Enter restarts the run.
    GameOver,
}

pub struct StatePlugin;

impl Plugin for StatePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>().add_systems(
            Update,
            (
                toggle_pause_system.run_if(in_state(GameState::Playing)),
                pause_resume_input_system.run_if(in_state(GameState::Paused)),
                restart_input_system.run_if(in_state(GameState::GameOver)),
            ),
        );
    }
}

/// ESC while in `Playing` → transition to `Paused`.
pub fn toggle_pause_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        next_state.set(GameState::Paused);
    }
}

/// ESC while in `Paused` → transition back to `Playing`.
pub fn pause_resume_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        next_state.set(GameState::Playing);
    }
}

/// Enter while in `GameOver` → start a new run.
pub fn restart_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keys.just_pressed(KeyCode::Enter) {
        next_state.set(GameState::Playing);
    }
}
