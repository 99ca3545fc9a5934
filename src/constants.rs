//! Centralised flight and gameplay constants.
//!
//! These are the compiled defaults behind [`crate::config::FlightConfig`].
//! Any of them can be overridden at startup from `assets/flight.toml`
//! without recompiling.
//!
//! ## Tuning guidance
//!
//! Each constant notes the observable consequence of changing it.  Per-level
//! values for upgradeable modules (boost force, brake charges, magnet radius,
//! ...) are not here; they live in the authored tables of
//! [`crate::modules::ModuleCatalog`].

// ── Flight ────────────────────────────────────────────────────────────────────

/// Cruising climb rate (world units per second) with no ability active.
pub const ASCEND_SPEED: f32 = 220.0;

/// Lateral steering speed (u/s) at full stick deflection.
pub const HORIZONTAL_SPEED: f32 = 260.0;

/// The ship is clamped to ±LANE_HALF_WIDTH around x = 0.
pub const LANE_HALF_WIDTH: f32 = 420.0;

/// Collision radius of the player ship, used for pickups and enemy contact.
pub const PLAYER_RADIUS: f32 = 14.0;

/// Starting and maximum hull points.
pub const PLAYER_MAX_HULL: f32 = 100.0;

// ── Abilities ─────────────────────────────────────────────────────────────────

/// Seconds the emergency brake holds the ship in place after activation.
pub const BRAKE_DURATION_SECS: f32 = 1.2;

// ── Repair Kits ───────────────────────────────────────────────────────────────

/// Number of pooled repair kits kept around the player.
pub const REPAIR_KIT_POOL_SIZE: usize = 3;

/// Horizontal window (relative to the player) across which kits are spread.
pub const REPAIR_KIT_X_MIN: f32 = -300.0;
pub const REPAIR_KIT_X_MAX: f32 = 300.0;

/// Vertical window (relative to the player) in which kits are placed.
///
/// Positive values place kits ahead of the ship.  Keep the minimum above the
/// camera's bottom edge or kits will appear behind the player.
pub const REPAIR_KIT_Y_MIN: f32 = 600.0;
pub const REPAIR_KIT_Y_MAX: f32 = 1400.0;

/// Kits are relocated once the player is this far from the lowest kit.
///
/// Lower values make kits reappear sooner; values below `REPAIR_KIT_Y_MIN`
/// relocate the pool before the player can ever reach it.
pub const REPAIR_KIT_TRIGGER_DISTANCE: f32 = 1500.0;

/// Hull points restored by one kit.
pub const REPAIR_KIT_HULL_RESTORE: f32 = 25.0;

// ── Coins ─────────────────────────────────────────────────────────────────────

pub const COIN_POOL_SIZE: usize = 8;
pub const COIN_X_MIN: f32 = -350.0;
pub const COIN_X_MAX: f32 = 350.0;
pub const COIN_Y_MIN: f32 = 300.0;
pub const COIN_Y_MAX: f32 = 900.0;
pub const COIN_TRIGGER_DISTANCE: f32 = 950.0;

/// Currency credited to the wallet per collected coin.
pub const COIN_VALUE: u32 = 5;

/// Distance at which the ship collects an active pooled item.
pub const PICKUP_RADIUS: f32 = 24.0;

// ── Enemies ───────────────────────────────────────────────────────────────────

/// Height the player must climb past the previous wave before the next spawns.
pub const ENEMY_WAVE_SPACING: f32 = 600.0;

/// How far above the player a new wave starts.
pub const ENEMY_SPAWN_AHEAD: f32 = 700.0;

/// Enemies this far below the player are despawned.
pub const ENEMY_DESPAWN_DISTANCE: f32 = 900.0;

/// Every Nth wave also carries the shuffled challenge enemies.
pub const CHALLENGE_WAVE_INTERVAL: u32 = 4;

/// Contact radius for enemy ↔ player overlap.
pub const ENEMY_CONTACT_RADIUS: f32 = 18.0;

/// Hull damage dealt by one enemy contact.  The enemy is destroyed on contact.
pub const ENEMY_CONTACT_DAMAGE: f32 = 20.0;

// ── HUD ───────────────────────────────────────────────────────────────────────

pub const HUD_FONT_SIZE: f32 = 18.0;
