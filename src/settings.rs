//! Flat key/value preset store.
//!
//! Presets are a single JSON object whose values are plain scalars
//! (integers, bytes, booleans, one float).  There is no nesting and no
//! schema version: unknown keys are preserved on write and ignored on read,
//! and a value of the wrong shape falls back to that field's default.
//!
//! # Example
//!
//! ```json
//! {
//!   "SaveGlowDuration": 250,
//!   "SaveWaveDuration": 65,
//!   "SaveUpdateDelay": 35,
//!   "HexagonRadius": 50,
//!   "RippleDuration": 20,
//!   "SaveColorA": 180,
//!   "SaveColorR": 100,
//!   "SaveColorG": 200,
//!   "SaveColorB": 255,
//!   "GameMode": false
//! }
//! ```

use crate::color::Color;
use crate::config::{Config, Showcase};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Longest duration a preset may hold.  Presets store 32-bit integers.
pub const MAX_MILLIS: u64 = i32::MAX as u64;

/// The in-memory form of a preset.
pub type SettingsMap = Map<String, Value>;

/// Preset key names.
pub mod keys {
    pub const GLOW_DURATION: &str = "SaveGlowDuration";
    pub const WAVE_SPEED: &str = "SaveWaveDuration";
    pub const HOLD_INTERVAL: &str = "SaveUpdateDelay";
    pub const RADIUS: &str = "HexagonRadius";
    pub const RIPPLE_SPEED: &str = "RippleDuration";
    pub const RESET_ANIMATION: &str = "ResetHexagonsAnimation";
    pub const SETTINGS_ANIMATION: &str = "CloseToolsAnimation";
    pub const GLOW_A: &str = "SaveColorA";
    pub const GLOW_R: &str = "SaveColorR";
    pub const GLOW_G: &str = "SaveColorG";
    pub const GLOW_B: &str = "SaveColorB";
    pub const PASSIVE_A: &str = "SaveColorAPassive";
    pub const PASSIVE_R: &str = "SaveColorRPassive";
    pub const PASSIVE_G: &str = "SaveColorGPassive";
    pub const PASSIVE_B: &str = "SaveColorBPassive";
    pub const GAME_MODE: &str = "GameMode";
    pub const CONSTANT_TRAIL: &str = "ConstantTrail";
    pub const ROTATION_ENABLED: &str = "RotationEnabled";
    pub const ROTATION_SPEED: &str = "RotationSpeed";
}

/// Errors from reading or writing a preset file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} does not contain a JSON object")]
    NotAnObject(PathBuf),
}

//  Config <-> map

/// Every [`Config`] field as a flat map.
pub fn flush(config: &Config) -> SettingsMap {
    let mut map = SettingsMap::new();
    let mut put = |k: &str, v: Value| {
        map.insert(k.to_string(), v);
    };
    put(keys::GLOW_DURATION, config.glow_duration_ms.into());
    put(keys::WAVE_SPEED, config.wave_speed_ms.into());
    put(keys::HOLD_INTERVAL, config.hold_interval_ms.into());
    put(keys::RADIUS, config.radius.into());
    put(keys::RIPPLE_SPEED, config.ripple_speed_ms.into());
    put(keys::RESET_ANIMATION, config.reset_animation.index().into());
    put(keys::SETTINGS_ANIMATION, config.settings_animation.index().into());
    put(keys::GLOW_A, config.glow_color.a.into());
    put(keys::GLOW_R, config.glow_color.r.into());
    put(keys::GLOW_G, config.glow_color.g.into());
    put(keys::GLOW_B, config.glow_color.b.into());
    put(keys::PASSIVE_A, config.passive_color.a.into());
    put(keys::PASSIVE_R, config.passive_color.r.into());
    put(keys::PASSIVE_G, config.passive_color.g.into());
    put(keys::PASSIVE_B, config.passive_color.b.into());
    put(keys::GAME_MODE, config.game_mode.into());
    put(keys::CONSTANT_TRAIL, config.constant_trail.into());
    put(keys::ROTATION_ENABLED, config.rotation_enabled.into());
    put(keys::ROTATION_SPEED, config.rotation_speed_rpm.into());
    map
}

/// Build a [`Config`] from a flat map, field by field.
///
/// Missing keys take their default silently; present but malformed values
/// take their default with a warning.
pub fn hydrate(map: &SettingsMap) -> Config {
    let d = Config::default();
    let r = Reader { map };
    Config {
        radius: r
            .get(keys::RADIUS, |v| v.as_u64().and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0))
            .unwrap_or(d.radius),
        glow_color: Color::argb(
            r.byte(keys::GLOW_A, d.glow_color.a),
            r.byte(keys::GLOW_R, d.glow_color.r),
            r.byte(keys::GLOW_G, d.glow_color.g),
            r.byte(keys::GLOW_B, d.glow_color.b),
        ),
        passive_color: Color::argb(
            r.byte(keys::PASSIVE_A, d.passive_color.a),
            r.byte(keys::PASSIVE_R, d.passive_color.r),
            r.byte(keys::PASSIVE_G, d.passive_color.g),
            r.byte(keys::PASSIVE_B, d.passive_color.b),
        ),
        glow_duration_ms: r.millis(keys::GLOW_DURATION, d.glow_duration_ms),
        wave_speed_ms: r.millis(keys::WAVE_SPEED, d.wave_speed_ms),
        ripple_speed_ms: r.millis(keys::RIPPLE_SPEED, d.ripple_speed_ms),
        hold_interval_ms: r.millis(keys::HOLD_INTERVAL, d.hold_interval_ms),
        game_mode: r.flag(keys::GAME_MODE, d.game_mode),
        constant_trail: r.flag(keys::CONSTANT_TRAIL, d.constant_trail),
        rotation_enabled: r.flag(keys::ROTATION_ENABLED, d.rotation_enabled),
        rotation_speed_rpm: r
            .get(keys::ROTATION_SPEED, |v| {
                v.as_f64().filter(|f| f.is_finite() && *f > 0.0)
            })
            .unwrap_or(d.rotation_speed_rpm),
        reset_animation: r.showcase(keys::RESET_ANIMATION, d.reset_animation),
        settings_animation: r.showcase(keys::SETTINGS_ANIMATION, d.settings_animation),
    }
}

struct Reader<'a> {
    map: &'a SettingsMap,
}

impl Reader<'_> {
    fn get<T>(&self, key: &str, parse: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
        let value = self.map.get(key)?;
        let parsed = parse(value);
        if parsed.is_none() {
            warn!("ignoring bad preset value {} = {}", key, value);
        }
        parsed
    }

    fn byte(&self, key: &str, default: u8) -> u8 {
        self.get(key, |v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
            .unwrap_or(default)
    }

    fn millis(&self, key: &str, default: u64) -> u64 {
        self.get(key, |v| v.as_u64().filter(|n| *n <= MAX_MILLIS))
            .unwrap_or(default)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key, Value::as_bool).unwrap_or(default)
    }

    fn showcase(&self, key: &str, default: Showcase) -> Showcase {
        self.get(key, |v| v.as_u64().and_then(Showcase::from_index))
            .unwrap_or(default)
    }
}

//  File store

/// A preset file on disk.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole preset, reporting any failure.  An empty file reads
    /// as an empty map.
    pub fn read(&self) -> Result<SettingsMap, SettingsError> {
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(SettingsMap::new());
        }
        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(SettingsError::NotAnObject(self.path.clone())),
        }
    }

    /// Read the whole preset; a missing or unreadable file reads as empty.
    pub fn load_all(&self) -> SettingsMap {
        match self.read() {
            Ok(map) => map,
            Err(e) => {
                debug!("preset {} unreadable ({}), treating as empty", self.path.display(), e);
                SettingsMap::new()
            }
        }
    }

    /// Set one key, keeping every other key in the file.
    pub fn save(&self, key: &str, value: impl Into<Value>) -> Result<(), SettingsError> {
        let mut map = self.load_all();
        map.insert(key.to_string(), value.into());
        self.write(&map)
    }

    /// Set every key in `values`, keeping other keys in the file.
    pub fn save_all(&self, values: &SettingsMap) -> Result<(), SettingsError> {
        let mut map = self.load_all();
        for (k, v) in values {
            map.insert(k.clone(), v.clone());
        }
        self.write(&map)
    }

    /// Replace the file with an empty object.
    pub fn clear(&self) -> Result<(), SettingsError> {
        self.write(&SettingsMap::new())
    }

    fn write(&self, map: &SettingsMap) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
