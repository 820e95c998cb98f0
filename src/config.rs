//! Application configuration.
//!
//! The configuration is persisted as a *preset*: a flat JSON object of
//! scalar values (see [`settings`](crate::settings) for the key names).
//! Every key is optional — a minimal `{}` file is valid and each missing or
//! malformed value falls back to its compiled-in default.
//!
//! # Example
//!
//! ```json
//! {
//!   "HexagonRadius": 40,
//!   "SaveGlowDuration": 300,
//!   "SaveColorA": 200,
//!   "GameMode": false,
//!   "RotationEnabled": true,
//!   "RotationSpeed": 4.5
//! }
//! ```

use crate::color::Color;
use crate::settings::{self, JsonSettingsStore, SettingsError};
use std::path::Path;

/// A grid-wide animation the host can play on demand: after the
/// configuration is applied, or around opening the settings dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Showcase {
    #[default]
    Wave,
    AnimateAll,
    /// Ripple from the center of the overlay.
    Ripple,
    None,
}

impl Showcase {
    /// Index used in the persisted preset.
    pub fn index(self) -> u64 {
        match self {
            Showcase::Wave => 0,
            Showcase::AnimateAll => 1,
            Showcase::Ripple => 2,
            Showcase::None => 3,
        }
    }

    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Showcase::Wave),
            1 => Some(Showcase::AnimateAll),
            2 => Some(Showcase::Ripple),
            3 => Some(Showcase::None),
            _ => None,
        }
    }
}

/// Every tunable of the overlay.
///
/// All durations are in **milliseconds**.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Distance from a hexagon's center to its vertices (px).  Changing it
    /// rebuilds the grid.
    pub radius: u32,
    /// Fill at the peak of a glow.
    pub glow_color: Color,
    /// Fill at rest.
    pub passive_color: Color,
    /// Time from passive to glow; the pulse takes twice this to fade back.
    pub glow_duration_ms: u64,
    /// Delay between two wave columns.
    pub wave_speed_ms: u64,
    /// Delay between two ripple growth steps.
    pub ripple_speed_ms: u64,
    /// How often the held pointer position is sampled for glows.
    pub hold_interval_ms: u64,
    /// Ignore pointer presses entirely.
    pub game_mode: bool,
    /// Sample the pointer even when no button is held.
    pub constant_trail: bool,
    /// Spin glowing hexagons and allow continuous rotation.
    pub rotation_enabled: bool,
    /// Continuous rotation speed in rotations per minute.
    pub rotation_speed_rpm: f64,
    /// Played after a new configuration is applied.
    pub reset_animation: Showcase,
    /// Played when the settings dialog is opened and after it closes.
    pub settings_animation: Showcase,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            radius: 50,
            glow_color: Color::argb(180, 100, 200, 255),
            passive_color: Color::argb(0, 0, 150, 255),
            glow_duration_ms: 250,
            wave_speed_ms: 65,
            ripple_speed_ms: 20,
            hold_interval_ms: 35,
            game_mode: false,
            constant_trail: false,
            rotation_enabled: false,
            rotation_speed_rpm: 2.0,
            reset_animation: Showcase::Wave,
            settings_animation: Showcase::Wave,
        }
    }
}

impl Config {
    /// Vertical extent of a hexagon row pitch: `radius · √3`.
    pub fn height(&self) -> f64 {
        self.radius as f64 * 3f64.sqrt()
    }

    /// Period of one full continuous revolution, `60000 / rpm` ms, or
    /// `None` if the speed cannot produce a finite period.
    pub fn rotation_period_ms(&self) -> Option<u64> {
        let rpm = self.rotation_speed_rpm;
        if !(rpm.is_finite() && rpm > 0.0) {
            return None;
        }
        Some((60_000.0 / rpm).round().max(1.0) as u64)
    }

    /// Load a preset from the JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let map = JsonSettingsStore::new(path).read()?;
        Ok(settings::hydrate(&map))
    }

    /// Write every field into the preset at `path`, keeping unrelated keys.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        JsonSettingsStore::new(path).save_all(&settings::flush(self))
    }
}
