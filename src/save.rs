use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use serde::{Deserialize, Serialize};

use crate::characteristics::SavedLevel;
use crate::economy::Wallet;
use crate::error::{GameError, GameResult};
use crate::modules::{ModuleCatalog, ModuleKind};
use crate::player::RunStats;
use crate::state::GameState;

pub const PROFILE_PATH: &str = "saves/profile.toml";
const SAVE_VERSION: u32 = 1;

/// Request to write the profile to disk.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct SaveRequest;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SaveProfile {
    pub version: u32,
    pub saved_at_unix: u64,
    pub coins: u32,
    pub best_height: f32,
    pub modules: Vec<ModuleSave>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModuleSave {
    pub module: ModuleKind,
    pub levels: Vec<SavedLevel>,
}

impl SaveProfile {
    pub fn capture(catalog: &ModuleCatalog, wallet: &Wallet, stats: &RunStats) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at_unix: current_unix_timestamp(),
            coins: wallet.coins,
            best_height: stats.best_height,
            modules: catalog
                .modules
                .iter()
                .map(|m| ModuleSave {
                    module: m.kind,
                    levels: m.table.saved_levels(),
                })
                .collect(),
        }
    }

    /// Apply the saved levels and balance.  Returns how many level records
    /// were applied.
    pub fn apply(&self, catalog: &mut ModuleCatalog, wallet: &mut Wallet, stats: &mut RunStats) -> usize {
        wallet.coins = self.coins;
        stats.best_height = stats.best_height.max(self.best_height);

        let mut applied = 0;
        for saved in &self.modules {
            match catalog.table_mut(saved.module) {
                Some(table) => applied += table.load_saved_levels(&saved.levels),
                None => warn!(
                    "Saved module {:?} is no longer configured; skipping",
                    saved.module
                ),
            }
        }
        applied
    }
}

/// Where the profile lives, plus a lock that serializes background writes.
#[derive(Resource, Debug, Clone)]
pub struct SaveStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl Default for SaveStore {
    fn default() -> Self {
        Self::new(PROFILE_PATH)
    }
}

impl SaveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no profile has been written yet.
    pub fn load(&self) -> GameResult<Option<SaveProfile>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|err| GameError::Save {
            reason: format!("failed to read {}: {err}", self.path.display()),
        })?;
        parse_profile_with_migration(&contents).map(Some)
    }

    pub fn write_blocking(&self, profile: &SaveProfile) -> GameResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| GameError::Save {
            reason: "save lock poisoned by an earlier failed write".to_string(),
        })?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| GameError::Save {
                reason: format!("failed to create save dir: {err}"),
            })?;
        }

        let serialized = serialize_profile(profile)?;
        fs::write(&self.path, serialized).map_err(|err| GameError::Save {
            reason: format!("failed to write {}: {err}", self.path.display()),
        })
    }

    /// Write on the IO task pool; falls back to a blocking write when the pool
    /// is not running (headless tools and tests).
    pub fn write_in_background(&self, profile: SaveProfile) {
        let Some(pool) = IoTaskPool::try_get() else {
            log_write_result(&self.path, self.write_blocking(&profile));
            return;
        };
        let store = self.clone();
        pool.spawn(async move {
            let result = store.write_blocking(&profile);
            log_write_result(&store.path, result);
        })
        .detach();
    }
}

fn log_write_result(path: &Path, result: GameResult<()>) {
    match result {
        Ok(()) => info!("Saved profile to {}", path.display()),
        Err(err) => error!("Failed to save profile: {}", err),
    }
}

fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn serialize_profile(profile: &SaveProfile) -> GameResult<String> {
    toml::to_string_pretty(profile).map_err(|err| GameError::Save {
        reason: format!("failed to serialize profile TOML: {err}"),
    })
}

pub fn parse_profile_with_migration(contents: &str) -> GameResult<SaveProfile> {
    let mut value: toml::Value = toml::from_str(contents).map_err(|err| GameError::Save {
        reason: format!("failed to parse profile TOML: {err}"),
    })?;

    migrate_profile_value(&mut value)?;

    value.try_into::<SaveProfile>().map_err(|err| GameError::Save {
        reason: format!("failed to decode migrated profile: {err}"),
    })
}

fn migrate_profile_value(value: &mut toml::Value) -> GameResult<()> {
    let table = value.as_table_mut().ok_or_else(|| GameError::Save {
        reason: "profile root must be a TOML table".to_string(),
    })?;

    let defaults = [
        ("version", toml::Value::Integer(SAVE_VERSION as i64)),
        ("saved_at_unix", toml::Value::Integer(0)),
        ("coins", toml::Value::Integer(0)),
        ("best_height", toml::Value::Float(0.0)),
        ("modules", toml::Value::Array(Vec::new())),
    ];
    for (key, default) in defaults {
        if !table.contains_key(key) {
            table.insert(key.to_string(), default);
        }
    }

    let version = table
        .get("version")
        .and_then(toml::Value::as_integer)
        .ok_or_else(|| GameError::Save {
            reason: "profile version is missing or invalid".to_string(),
        })?;

    if version != SAVE_VERSION as i64 {
        return Err(GameError::Save {
            reason: format!(
                "unsupported profile version {} (expected {})",
                version, SAVE_VERSION
            ),
        });
    }

    Ok(())
}

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SaveStore>()
            .add_message::<SaveRequest>()
            .add_systems(Update, handle_save_requests_system)
            .add_systems(OnEnter(GameState::GameOver), request_save_system);
    }
}

/// Startup system: restore levels, coins, and best height.
pub fn load_profile_system(
    store: Res<SaveStore>,
    mut catalog: ResMut<ModuleCatalog>,
    mut wallet: ResMut<Wallet>,
    mut stats: ResMut<RunStats>,
) {
    match store.load() {
        Ok(Some(profile)) => {
            let applied = profile.apply(&mut catalog, &mut wallet, &mut stats);
            info!(
                "Loaded profile from {} ({} levels, {} coins)",
                store.path().display(),
                applied,
                profile.coins
            );
        }
        Ok(None) => info!("No profile at {}; starting fresh", store.path().display()),
        Err(err) => error!("Failed to load profile: {}", err),
    }
}

pub fn handle_save_requests_system(
    mut requests: MessageReader<SaveRequest>,
    store: Res<SaveStore>,
    catalog: Res<ModuleCatalog>,
    wallet: Res<Wallet>,
    stats: Res<RunStats>,
) {
    // Several requests in one frame describe the same state.
    if requests.read().count() == 0 {
        return;
    }
    store.write_in_background(SaveProfile::capture(&catalog, &wallet, &stats));
}

pub fn request_save_system(mut requests: MessageWriter<SaveRequest>) {
    requests.write(SaveRequest);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characteristics::Characteristic;

    fn temp_store(name: &str) -> SaveStore {
        let dir = std::env::temp_dir().join(format!("ascent-save-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        SaveStore::new(dir.join("profile.toml"))
    }

    fn upgraded_catalog() -> ModuleCatalog {
        let mut catalog = ModuleCatalog::default();
        let boost = catalog.table_mut(ModuleKind::Boost).expect("boost table");
        boost.set_level(Characteristic::BoostForce, 3);
        boost.set_level(Characteristic::ForceIncreaseDuration, 2);
        catalog
    }

    #[test]
    fn profile_round_trips_through_disk() {
        let store = temp_store("round-trip");
        let catalog = upgraded_catalog();
        let wallet = Wallet { coins: 77 };
        let stats = RunStats {
            height: 0.0,
            best_height: 5120.0,
        };
        let profile = SaveProfile::capture(&catalog, &wallet, &stats);
        store.write_blocking(&profile).expect("write must succeed");

        let loaded = store.load().expect("load must succeed").expect("profile exists");
        assert_eq!(loaded, profile);

        let mut fresh = ModuleCatalog::default();
        let mut fresh_wallet = Wallet::default();
        let mut fresh_stats = RunStats::default();
        loaded.apply(&mut fresh, &mut fresh_wallet, &mut fresh_stats);
        assert_eq!(fresh, catalog);
        assert_eq!(fresh_wallet.coins, 77);
        assert_eq!(fresh_stats.best_height, 5120.0);
    }

    #[test]
    fn missing_profile_is_not_an_error() {
        let store = temp_store("missing");
        assert_eq!(store.load(), Ok(None));
    }

    #[test]
    fn old_profile_without_optional_fields_migrates() {
        let profile = parse_profile_with_migration("coins = 12\n").expect("must migrate");
        assert_eq!(profile.version, SAVE_VERSION);
        assert_eq!(profile.coins, 12);
        assert!(profile.modules.is_empty());
    }

    #[test]
    fn future_version_is_rejected() {
        let err = parse_profile_with_migration("version = 99\n").unwrap_err();
        assert!(matches!(err, GameError::Save { .. }));
    }

    #[test]
    fn levels_are_keyed_not_positional() {
        let contents = r#"
version = 1
coins = 0
best_height = 0.0

[[modules]]
module = "Boost"

[[modules.levels]]
characteristic = "BoostCooldown"
level = 2

[[modules.levels]]
characteristic = "BoostForce"
level = 1

[[modules]]
module = "Magnet"

[[modules.levels]]
characteristic = "MagnetRadius"
level = 99
"#;
        let profile = parse_profile_with_migration(contents).expect("must parse");
        let mut catalog = ModuleCatalog::default();
        let mut wallet = Wallet::default();
        let mut stats = RunStats::default();
        assert_eq!(profile.apply(&mut catalog, &mut wallet, &mut stats), 3);

        let boost = catalog.table(ModuleKind::Boost).expect("boost table");
        assert_eq!(boost.level(Characteristic::BoostCooldown), 2);
        assert_eq!(boost.level(Characteristic::BoostForce), 1);
        assert_eq!(boost.level(Characteristic::BoostCharges), 0);

        let magnet = catalog.table(ModuleKind::Magnet).expect("magnet table");
        assert_eq!(
            magnet.level(Characteristic::MagnetRadius),
            magnet.max_level(Characteristic::MagnetRadius)
        );
    }
}
