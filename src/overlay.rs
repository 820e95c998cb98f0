//! The main orchestrator that ties the grid, the animation engine, the
//! input router and the drawing surface together.
//!
//! [`Overlay`] owns the current [`HexGrid`] and reacts to [`Command`]s by
//! routing input, starting animations and issuing intents to the
//! [`DrawingSurface`].  It never sleeps: the host calls
//! [`tick`](Overlay::tick) at or after [`next_deadline`](Overlay::next_deadline).

use crate::command::Command;
use crate::config::{Config, Showcase};
use crate::engine::AnimationEngine;
use crate::geometry::Point;
use crate::grid::{GridBuilder, HexGrid, HexId};
use crate::monitors::{indicator_anchor, total_bounds};
use crate::router::{hexagons_at, Hotkey, InputRouter};
use crate::timer::earliest;
use crate::traits::{BoundsProvider, DrawingSurface};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::mpsc;

/// Possible errors from the overlay.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// The host stopped listening for [`HostEvent`]s.
    #[error("host channel closed")]
    HostChannelClosed,
}

/// Requests the overlay cannot fulfil on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Show the configuration dialog.  The host applies the result with
    /// [`Overlay::apply_config`] and replays the settings animation once
    /// the dialog closes.
    OpenSettings,
}

/// Orchestrates the hexagon overlay.
///
/// Generic over the [`DrawingSurface`] and the [`BoundsProvider`], so the
/// same logic runs against a GTK window, an in-memory scene or a test
/// double.
///
/// # Typical usage
///
/// ```ignore
/// let mut overlay = Overlay::new(config, StaticMonitors::default(), Scene::new());
/// overlay.start(0);
/// overlay.handle(Command::Wave, 0)?;
/// overlay.tick(65);
/// ```
pub struct Overlay<S: DrawingSurface, B: BoundsProvider> {
    config: Config,
    bounds: B,
    surface: S,
    grid: HexGrid,
    engine: AnimationEngine,
    router: InputRouter,
    host_tx: Option<mpsc::Sender<HostEvent>>,
}

impl<S: DrawingSurface, B: BoundsProvider> Overlay<S, B> {
    /// Create an overlay.  Nothing is drawn until [`start`](Self::start).
    pub fn new(config: Config, bounds: B, surface: S) -> Self {
        Self {
            engine: AnimationEngine::new(&config),
            router: InputRouter::new(&config),
            grid: HexGrid::empty(0),
            config,
            bounds,
            surface,
            host_tx: None,
        }
    }

    /// Attach a channel for [`HostEvent`]s.
    pub fn set_host_channel(&mut self, tx: mpsc::Sender<HostEvent>) {
        self.host_tx = Some(tx);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Build the first grid and begin trail sampling if configured.
    pub fn start(&mut self, now: u64) {
        self.rebuild(now);
        self.router.start(now);
        info!(
            "overlay started: {} hexagons, radius {}",
            self.grid.len(),
            self.config.radius
        );
    }

    /// Halt the wave and hold sampling.  Ripples end on their own.
    pub fn shutdown(&mut self) {
        self.engine.stop_all();
        self.router.stop();
        info!("overlay stopped");
    }

    /// Re-query the display bounds and replace the grid.
    ///
    /// Ids of the previous grid stop resolving.  Waves and ripples already
    /// running finish against their own snapshots; the surface ignores
    /// their stale ids.
    pub fn rebuild(&mut self, now: u64) {
        let bounds = total_bounds(&self.bounds);
        let generation = self.grid.generation().wrapping_add(1);
        let grid = GridBuilder::new(self.config.radius as f64).build(bounds, generation);

        if let Err(e) = self.surface.clear() {
            warn!("surface clear failed: {}", e);
        }
        for h in grid.hexagons() {
            if let Err(e) = self.surface.add_cell(h.id, &h.vertices, self.config.passive_color) {
                warn!("add cell {:?} failed: {}", h.id, e);
            }
        }
        self.engine.forget_cells();
        self.grid = grid;
        debug!(
            "grid generation {} at {}: {} hexagons in {} columns",
            generation,
            now,
            self.grid.len(),
            self.grid.columns().len()
        );
    }

    /// Adopt a new configuration: rebuild the grid, reconfigure every
    /// timer and play the reset animation.
    pub fn apply_config(&mut self, config: Config, now: u64) {
        self.adopt(config, now);
        self.play(self.config.reset_animation, now);
    }

    /// Re-read the preset at `path` after the settings dialog closed, apply
    /// it and play the settings animation over the new grid.  The reset
    /// animation is skipped.  An unreadable preset keeps the current
    /// configuration.
    pub fn reload_preset(&mut self, path: &Path, now: u64) {
        match Config::load(path) {
            Ok(config) => {
                info!("reloaded preset {}", path.display());
                self.adopt(config, now);
            }
            Err(e) => warn!("preset {} not reloaded: {}", path.display(), e),
        }
        self.play(self.config.settings_animation, now);
    }

    /// Play a grid-wide showcase animation.
    pub fn play(&mut self, showcase: Showcase, now: u64) {
        debug!("showcase {:?}", showcase);
        match showcase {
            Showcase::Wave => {
                self.engine.start_wave(self.grid.columns(), now);
            }
            Showcase::AnimateAll => self.engine.animate_all(&mut self.surface, self.grid.ids(), now),
            Showcase::Ripple => {
                let center = self.grid.bounds().center();
                self.ripple_from_screen(center, now);
            }
            Showcase::None => {}
        }
    }

    /// Process a single [`Command`].
    ///
    /// Only fails when a host request cannot be delivered; everything the
    /// overlay does itself is best-effort.
    pub fn handle(&mut self, cmd: Command, now: u64) -> Result<(), OverlayError> {
        match cmd {
            //  Raw input
            Command::PointerDown { x, y } => {
                self.router.pointer_down(
                    &self.grid,
                    &mut self.engine,
                    &mut self.surface,
                    Point::new(x, y),
                    now,
                );
            }
            Command::PointerMove { x, y } => self.router.pointer_move(Point::new(x, y)),
            Command::PointerUp { x, y } => self.router.pointer_up(Point::new(x, y)),
            Command::KeyDown { key, modifiers } => {
                if let Some(hotkey) = self.router.key_down(key, modifiers) {
                    return self.hotkey(hotkey, now);
                }
            }

            //  Direct actions
            Command::Wave => return self.hotkey(Hotkey::Wave, now),
            Command::AnimateAll => return self.hotkey(Hotkey::AnimateAll, now),
            Command::AnimateSome => return self.hotkey(Hotkey::AnimateSome, now),
            Command::RippleFromCenter => return self.hotkey(Hotkey::RippleFromCenter, now),
            Command::ToggleIndicator => return self.hotkey(Hotkey::ToggleIndicator, now),
            Command::OpenSettings => return self.hotkey(Hotkey::OpenSettings, now),
            Command::Ripple { x, y } => self.ripple_from_screen(Point::new(x, y), now),
            Command::Spin { x, y } => {
                for id in self.hexagons_under(Point::new(x, y)) {
                    self.engine.start_continuous_rotation(&mut self.surface, id, now);
                }
            }
            Command::StopSpin { x, y } => {
                for id in self.hexagons_under(Point::new(x, y)) {
                    self.engine.stop_continuous_rotation(&mut self.surface, id);
                }
            }
            Command::StopAll => {
                info!("stop all");
                self.engine.stop_all();
            }
            Command::Rebuild => {
                info!("rebuild requested");
                self.rebuild(now);
            }
        }
        Ok(())
    }

    /// Advance hold sampling and every animation timer.
    pub fn tick(&mut self, now: u64) {
        self.router
            .tick(&self.grid, &mut self.engine, &mut self.surface, now);
        self.engine.tick(&mut self.surface, now);
    }

    /// Earliest time [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        earliest([self.router.deadline(), self.engine.next_deadline()])
    }

    //  internals

    /// Swap in `config` and rebuild.  A running wave belongs to the old
    /// grid and is halted so the next showcase can sweep the new one.
    fn adopt(&mut self, config: Config, now: u64) {
        info!("applying configuration (radius {})", config.radius);
        self.engine.stop_all();
        self.engine.apply_config(&mut self.surface, &config, now);
        self.router.apply_config(&config, now);
        self.config = config;
        self.rebuild(now);
    }

    fn hotkey(&mut self, hotkey: Hotkey, now: u64) -> Result<(), OverlayError> {
        match hotkey {
            Hotkey::Wave => {
                self.engine.start_wave(self.grid.columns(), now);
            }
            Hotkey::AnimateAll => self.engine.animate_all(&mut self.surface, self.grid.ids(), now),
            Hotkey::AnimateSome => {
                let ids: Vec<HexId> = self.grid.ids().collect();
                self.engine.animate_some(&mut self.surface, &ids, now);
            }
            Hotkey::RippleFromCenter => {
                let center = self.grid.bounds().center();
                self.ripple_from_screen(center, now);
            }
            Hotkey::ToggleIndicator => {
                let anchor = indicator_anchor(&self.bounds, self.grid.bounds());
                self.router.toggle_indicator(
                    &self.grid,
                    &mut self.engine,
                    &mut self.surface,
                    anchor,
                    now,
                );
            }
            Hotkey::OpenSettings => {
                info!("opening settings");
                self.play(self.config.settings_animation, now);
                let tx = self.host_tx.as_ref().ok_or(OverlayError::HostChannelClosed)?;
                tx.send(HostEvent::OpenSettings)
                    .map_err(|_| OverlayError::HostChannelClosed)?;
            }
        }
        Ok(())
    }

    fn ripple_from_screen(&mut self, screen: Point, now: u64) {
        let origin = self.grid.bounds().to_local(screen);
        self.engine.start_ripple(&self.grid, origin, now);
    }

    fn hexagons_under(&self, screen: Point) -> Vec<HexId> {
        hexagons_at(&self.grid, self.grid.bounds().to_local(screen))
    }
}
