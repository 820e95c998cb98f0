//! Pointer and keyboard routing.
//!
//! [`InputRouter`] turns raw pointer and key events into glows and hotkeys.
//! While the primary button is held (or permanently, in constant-trail
//! mode) a sample timer re-reads the last known pointer position and glows
//! whatever hexagons lie under it.

use crate::command::{keys, KeyCode, Modifiers};
use crate::config::Config;
use crate::engine::AnimationEngine;
use crate::geometry::{distance, point_in_polygon, Point};
use crate::grid::{HexGrid, HexId};
use crate::timer::RepeatingTimer;
use crate::traits::DrawingSurface;
use log::{debug, trace};

/// A resolved global hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    /// Ctrl+Alt+Shift+W
    Wave,
    /// Ctrl+Alt+Shift+T
    OpenSettings,
    /// Ctrl+Alt+Shift+A
    AnimateAll,
    /// Ctrl+Alt+Shift+S
    AnimateSome,
    /// Ctrl+Alt+Shift+R
    RippleFromCenter,
    /// Caps Lock, with or without modifiers.
    ToggleIndicator,
}

/// Map a key press to a hotkey.  Letter hotkeys need all three of
/// Ctrl, Alt and Shift; Caps Lock needs none.
pub fn resolve_hotkey(key: KeyCode, modifiers: Modifiers) -> Option<Hotkey> {
    if key.0 == keys::CAPS_LOCK {
        return Some(Hotkey::ToggleIndicator);
    }
    if modifiers != Modifiers::CTRL_ALT_SHIFT {
        return None;
    }
    match key.0 {
        keys::W => Some(Hotkey::Wave),
        keys::T => Some(Hotkey::OpenSettings),
        keys::A => Some(Hotkey::AnimateAll),
        keys::S => Some(Hotkey::AnimateSome),
        keys::R => Some(Hotkey::RippleFromCenter),
        _ => None,
    }
}

/// Every hexagon whose outline contains grid-local `point`.
///
/// Neighbouring outlines overlap slightly, so a point near an edge may hit
/// more than one cell.
pub fn hexagons_at(grid: &HexGrid, point: Point) -> Vec<HexId> {
    let r = grid.radius();
    grid.hexagons()
        .iter()
        .filter(|h| (h.center.x - point.x).abs() <= r && (h.center.y - point.y).abs() <= r)
        .filter(|h| point_in_polygon(&h.vertices, point))
        .map(|h| h.id)
        .collect()
}

/// The hexagon whose centroid is closest to grid-local `point`.
pub fn nearest_hexagon(grid: &HexGrid, point: Point) -> Option<HexId> {
    grid.hexagons()
        .iter()
        .map(|h| (h.id, distance(h.centroid(), point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Pointer state, hold sampling and the lock-key belief.
#[derive(Debug)]
pub struct InputRouter {
    held: bool,
    /// Last known pointer position, in screen space.
    position: Point,
    sample_timer: RepeatingTimer,
    game_mode: bool,
    constant_trail: bool,
    /// What we believe the lock key's state is.  Never read back from the
    /// OS, only flipped on each press, so it can drift.
    lock_on: bool,
}

impl InputRouter {
    pub fn new(config: &Config) -> Self {
        Self {
            held: false,
            position: Point::default(),
            sample_timer: RepeatingTimer::new(config.hold_interval_ms),
            game_mode: config.game_mode,
            constant_trail: config.constant_trail,
            lock_on: false,
        }
    }

    /// Pick up mode flags and the sample period from `config`.  Turning on
    /// constant trail starts sampling right away; turning it off stops
    /// sampling unless a button is held.
    pub fn apply_config(&mut self, config: &Config, now: u64) {
        self.game_mode = config.game_mode;
        self.sample_timer.set_interval(config.hold_interval_ms, now);
        if config.constant_trail != self.constant_trail {
            self.constant_trail = config.constant_trail;
            if self.constant_trail {
                debug!("constant trail on");
                if !self.sample_timer.is_running() {
                    self.sample_timer.start(now);
                }
            } else if !self.held {
                debug!("constant trail off");
                self.sample_timer.stop();
            }
        }
    }

    /// Begin sampling if constant trail is configured.
    pub fn start(&mut self, now: u64) {
        if self.constant_trail {
            self.sample_timer.start(now);
        }
    }

    /// Stop sampling and release the pointer.
    pub fn stop(&mut self) {
        self.held = false;
        self.sample_timer.stop();
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn is_sampling(&self) -> bool {
        self.sample_timer.is_running()
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn lock_on(&self) -> bool {
        self.lock_on
    }

    pub fn deadline(&self) -> Option<u64> {
        self.sample_timer.deadline()
    }

    //  Pointer

    /// Primary button pressed at screen point `screen`.  Glows what is
    /// under it at once and starts hold sampling.  Ignored in game mode.
    pub fn pointer_down<S: DrawingSurface>(
        &mut self,
        grid: &HexGrid,
        engine: &mut AnimationEngine,
        surface: &mut S,
        screen: Point,
        now: u64,
    ) {
        if self.game_mode {
            trace!("game mode, ignoring press");
            return;
        }
        self.held = true;
        self.position = screen;
        glow_at(grid, engine, surface, screen, now);
        if !self.sample_timer.is_running() {
            self.sample_timer.start(now);
        }
    }

    /// Only the latest position is kept; glows come from the sample timer.
    pub fn pointer_move(&mut self, screen: Point) {
        if self.held || self.constant_trail {
            self.position = screen;
        }
    }

    pub fn pointer_up(&mut self, screen: Point) {
        if !self.held {
            return;
        }
        self.held = false;
        self.position = screen;
        if !self.constant_trail {
            self.sample_timer.stop();
        }
    }

    /// Sample the pointer if the hold timer is due.
    pub fn tick<S: DrawingSurface>(
        &mut self,
        grid: &HexGrid,
        engine: &mut AnimationEngine,
        surface: &mut S,
        now: u64,
    ) {
        if !self.sample_timer.poll(now) {
            return;
        }
        if self.held || self.constant_trail {
            glow_at(grid, engine, surface, self.position, now);
        } else {
            self.sample_timer.stop();
        }
    }

    //  Keyboard

    /// Resolve a key press to a hotkey.
    pub fn key_down(&self, key: KeyCode, modifiers: Modifiers) -> Option<Hotkey> {
        let hotkey = resolve_hotkey(key, modifiers);
        if let Some(h) = hotkey {
            debug!("key {} -> {:?}", key, h);
        }
        hotkey
    }

    /// Flip the lock-key belief and fade the indicator cell (the one
    /// nearest screen point `anchor`) in or out to match.
    pub fn toggle_indicator<S: DrawingSurface>(
        &mut self,
        grid: &HexGrid,
        engine: &mut AnimationEngine,
        surface: &mut S,
        anchor: Point,
        now: u64,
    ) {
        self.lock_on = !self.lock_on;
        let local = grid.bounds().to_local(anchor);
        let Some(id) = nearest_hexagon(grid, local) else {
            debug!("no cell for the indicator");
            return;
        };
        if self.lock_on {
            engine.toggle_on(surface, id, now);
        } else {
            engine.toggle_off(surface, id, now);
        }
    }
}

/// Glow every hexagon under screen point `screen`.  Returns how many.
pub fn glow_at<S: DrawingSurface>(
    grid: &HexGrid,
    engine: &mut AnimationEngine,
    surface: &mut S,
    screen: Point,
    now: u64,
) -> usize {
    let hits = hexagons_at(grid, grid.bounds().to_local(screen));
    for id in &hits {
        engine.animate_glow(surface, *id, now);
    }
    hits.len()
}
