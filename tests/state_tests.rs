//! Headless tests for the [`GameState`] state machine and its key bindings.
//!
//! No window, no rendering; key presses are written straight into the
//! `ButtonInput<KeyCode>` resource.
//!
//! Covered scenarios:
//! 1. Default initial state is `Playing`.
//! 2. Escape pauses, Escape again resumes.
//! 3. Enter restarts from `GameOver` and does nothing while playing.

use ascent::state::{GameState, StatePlugin};
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn state_app() -> App {
    let mut app = App::new();
    app.add_plugins((StatesPlugin, StatePlugin));
    app.init_resource::<ButtonInput<KeyCode>>();
    app
}

fn current(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

/// Press and release `key` within one frame, then let the transition apply.
fn tap(app: &mut App, key: KeyCode) {
    app.world_mut()
        .resource_mut::<ButtonInput<KeyCode>>()
        .press(key);
    app.update();
    {
        let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keys.release(key);
        keys.clear();
    }
    app.update();
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn default_state_is_playing() {
    let mut app = state_app();
    app.update();
    assert_eq!(current(&app), GameState::Playing);
}

#[test]
fn escape_toggles_pause() {
    let mut app = state_app();
    app.update();

    tap(&mut app, KeyCode::Escape);
    assert_eq!(current(&app), GameState::Paused);

    tap(&mut app, KeyCode::Escape);
    assert_eq!(current(&app), GameState::Playing);
}

#[test]
fn enter_restarts_only_after_game_over() {
    let mut app = state_app();
    app.update();

    tap(&mut app, KeyCode::Enter);
    assert_eq!(current(&app), GameState::Playing);

    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::GameOver);
    app.update();
    assert_eq!(current(&app), GameState::GameOver);

    tap(&mut app, KeyCode::Escape);
    assert_eq!(current(&app), GameState::GameOver, "escape must not leave game over");

    tap(&mut app, KeyCode::Enter);
    assert_eq!(current(&app), GameState::Playing);
}
