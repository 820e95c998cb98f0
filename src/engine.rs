//! Animation engine.
//!
//! [`AnimationEngine`] owns every timer and every piece of animation state:
//!
//! * **Glow** — a one-shot pulse (passive → glow → passive).  Optionally
//!   accompanied by a single 360° spin when rotation is enabled.
//! * **Sticky toggle** — the lock-key indicator.  Fades in and holds, or
//!   fades out and holds; exactly one cell is the indicator at a time.
//! * **Wave** — one column bucket per tick, left to right.  Single-flight:
//!   starting a wave while one runs does nothing.
//! * **Ripple** — a circle growing by [`RIPPLE_STEP_PX`] per tick from an
//!   origin; each cell fires once when the circle reaches its centroid.
//!   Any number of ripples may run side by side.
//! * **Continuous rotation** — an endless linear spin at the configured
//!   RPM, tracked per cell so a speed change can restart all of them.
//!
//! The engine never renders.  It issues intents to a [`DrawingSurface`] and
//! keeps just enough logical state to make decisions.  Timers are advanced
//! by [`tick`](AnimationEngine::tick) from the host's cooperative loop.

use crate::config::Config;
use crate::easing::Easing;
use crate::geometry::{distance, Point};
use crate::grid::{HexGrid, HexId};
use crate::timer::{earliest, RepeatingTimer};
use crate::traits::{DrawingSurface, FillAnimation, Repeat, RotationAnimation};
use log::{debug, info, trace, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Growth of a ripple's radius per tick (px).
pub const RIPPLE_STEP_PX: f64 = 20.0;

/// Logical state of one cell, as far as the engine is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Passive,
    /// Inside a glow pulse.
    Glowing,
    /// Held on as the lock-key indicator.
    Held,
}

/// A running wave: a snapshot of the column buckets taken at start time.
#[derive(Debug)]
struct WaveSession {
    columns: Vec<Vec<HexId>>,
    next_column: usize,
}

/// A running ripple.
#[derive(Debug)]
struct RippleSession {
    origin: Point,
    radius: f64,
    /// Radius at which the ripple stops.
    reach: f64,
    /// Every cell of the grid at start time, with its centroid.
    targets: Vec<(HexId, Point)>,
    triggered: HashSet<HexId>,
    timer: RepeatingTimer,
    ticks: u32,
}

impl RippleSession {
    fn finished(&self) -> bool {
        self.radius >= self.reach
    }
}

/// Owns all animation timers and state.  See the [module docs](self).
#[derive(Debug)]
pub struct AnimationEngine {
    config: Config,
    wave_timer: RepeatingTimer,
    wave: Option<WaveSession>,
    ripples: Vec<RippleSession>,
    rotating: BTreeSet<HexId>,
    glowing_until: HashMap<HexId, u64>,
    indicator: Option<HexId>,
}

impl AnimationEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            wave_timer: RepeatingTimer::new(config.wave_speed_ms),
            wave: None,
            ripples: Vec::new(),
            rotating: BTreeSet::new(),
            glowing_until: HashMap::new(),
            indicator: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Adopt a new configuration, reconfiguring running timers and
    /// continuous rotations as needed.  Nothing else is reset.
    pub fn apply_config<S: DrawingSurface>(&mut self, surface: &mut S, config: &Config, now: u64) {
        let old = std::mem::replace(&mut self.config, config.clone());

        if old.wave_speed_ms != config.wave_speed_ms || old.ripple_speed_ms != config.ripple_speed_ms {
            self.update_timer_intervals(now);
        }
        if !config.rotation_enabled && !self.rotating.is_empty() {
            debug!("rotation disabled, stopping {} spinning cells", self.rotating.len());
            let ids: Vec<HexId> = self.rotating.iter().copied().collect();
            for id in ids {
                self.stop_continuous_rotation(surface, id);
            }
        } else if old.rotation_speed_rpm != config.rotation_speed_rpm {
            self.update_rotation_speed(surface, now);
        }
    }

    //  Per-cell animations

    /// One glow pulse on `id`, plus a single spin if rotation is enabled.
    pub fn animate_glow<S: DrawingSurface>(&mut self, surface: &mut S, id: HexId, now: u64) {
        let cfg = &self.config;
        trace!("glow {:?}", id);

        report(surface.set_fill(id, cfg.passive_color), "set fill", id);
        report(
            surface.animate_fill(
                id,
                FillAnimation {
                    from: cfg.passive_color,
                    to: cfg.glow_color,
                    duration_ms: cfg.glow_duration_ms,
                    easing: Easing::EaseInOut,
                    auto_reverse: true,
                    started_at: now,
                },
            ),
            "glow",
            id,
        );

        if cfg.rotation_enabled {
            report(
                surface.animate_rotation(
                    id,
                    RotationAnimation {
                        degrees: 360.0,
                        duration_ms: cfg.glow_duration_ms.saturating_mul(2),
                        easing: Easing::EaseInOut,
                        repeat: Repeat::Once,
                        started_at: now,
                    },
                ),
                "spin",
                id,
            );
        }

        self.glowing_until
            .insert(id, now.saturating_add(cfg.glow_duration_ms.saturating_mul(2)));
        // The pulse ends at the passive colour, so a held indicator is lost.
        if self.indicator == Some(id) {
            self.indicator = None;
        }
    }

    /// Fade `id` in over half the glow duration and hold it.
    ///
    /// Any other cell still held as the indicator is faded out first.
    pub fn toggle_on<S: DrawingSurface>(&mut self, surface: &mut S, id: HexId, now: u64) {
        if let Some(previous) = self.indicator.filter(|p| *p != id) {
            self.toggle_off(surface, previous, now);
        }
        let cfg = &self.config;
        debug!("indicator on {:?}", id);
        report(surface.set_fill(id, cfg.passive_color), "set fill", id);
        report(
            surface.animate_fill(
                id,
                FillAnimation {
                    from: cfg.passive_color,
                    to: cfg.glow_color,
                    duration_ms: cfg.glow_duration_ms / 2,
                    easing: Easing::EaseIn,
                    auto_reverse: false,
                    started_at: now,
                },
            ),
            "toggle on",
            id,
        );
        self.glowing_until.remove(&id);
        self.indicator = Some(id);
    }

    /// Fade `id` out over half the glow duration and leave it passive.
    pub fn toggle_off<S: DrawingSurface>(&mut self, surface: &mut S, id: HexId, now: u64) {
        let cfg = &self.config;
        debug!("indicator off {:?}", id);
        report(surface.set_fill(id, cfg.passive_color), "set fill", id);
        report(
            surface.animate_fill(
                id,
                FillAnimation {
                    from: cfg.glow_color,
                    to: cfg.passive_color,
                    duration_ms: cfg.glow_duration_ms / 2,
                    easing: Easing::EaseOut,
                    auto_reverse: false,
                    started_at: now,
                },
            ),
            "toggle off",
            id,
        );
        self.glowing_until.remove(&id);
        if self.indicator == Some(id) {
            self.indicator = None;
        }
    }

    /// The cell currently held on as the indicator.
    pub fn indicator(&self) -> Option<HexId> {
        self.indicator
    }

    pub fn cell_state(&self, id: HexId, now: u64) -> CellState {
        if self.glowing_until.get(&id).is_some_and(|until| now < *until) {
            CellState::Glowing
        } else if self.indicator == Some(id) {
            CellState::Held
        } else {
            CellState::Passive
        }
    }

    //  Bulk animations

    /// Glow every cell, in no particular order.
    pub fn animate_all<S: DrawingSurface>(
        &mut self,
        surface: &mut S,
        ids: impl IntoIterator<Item = HexId>,
        now: u64,
    ) {
        let mut count = 0usize;
        for id in ids {
            self.animate_glow(surface, id, now);
            count += 1;
        }
        debug!("animated all {} cells", count);
    }

    /// Glow `⌊len / 2⌋` cells picked at random *with replacement*.
    pub fn animate_some<S: DrawingSurface>(&mut self, surface: &mut S, ids: &[HexId], now: u64) {
        self.animate_some_with(surface, ids, &mut rand::thread_rng(), now);
    }

    /// [`animate_some`](Self::animate_some) with a caller-supplied RNG.
    pub fn animate_some_with<S: DrawingSurface, R: Rng + ?Sized>(
        &mut self,
        surface: &mut S,
        ids: &[HexId],
        rng: &mut R,
        now: u64,
    ) {
        let count = ids.len() / 2;
        for _ in 0..count {
            if let Some(id) = ids.choose(rng) {
                self.animate_glow(surface, *id, now);
            }
        }
        debug!("animated {} random picks out of {} cells", count, ids.len());
    }

    //  Wave

    /// Start a wave over a snapshot of `columns`.
    ///
    /// Returns `false` (and changes nothing) if a wave is already running
    /// or there is nothing to sweep.
    pub fn start_wave(&mut self, columns: &[Vec<HexId>], now: u64) -> bool {
        if self.wave.is_some() {
            debug!("wave already running, ignoring start");
            return false;
        }
        if columns.is_empty() {
            debug!("no columns to sweep");
            return false;
        }
        info!("wave started over {} columns", columns.len());
        self.wave = Some(WaveSession {
            columns: columns.to_vec(),
            next_column: 0,
        });
        self.wave_timer.set_interval(self.config.wave_speed_ms, now);
        self.wave_timer.start(now);
        true
    }

    pub fn is_wave_active(&self) -> bool {
        self.wave.is_some()
    }

    /// Column the running wave will light next.
    pub fn wave_column(&self) -> Option<usize> {
        self.wave.as_ref().map(|w| w.next_column)
    }

    fn wave_tick<S: DrawingSurface>(&mut self, surface: &mut S, now: u64) {
        let Some(mut wave) = self.wave.take() else {
            self.wave_timer.stop();
            return;
        };
        if let Some(column) = wave.columns.get(wave.next_column) {
            trace!("wave column {} ({} cells)", wave.next_column, column.len());
            for id in column.clone() {
                self.animate_glow(surface, id, now);
            }
        }
        wave.next_column += 1;
        if wave.next_column >= wave.columns.len() {
            self.wave_timer.stop();
            info!("wave completed");
        } else {
            self.wave = Some(wave);
        }
    }

    //  Ripple

    /// Start a ripple at grid-local `origin` over every cell of `grid`.
    ///
    /// The ripple stops once its radius reaches the diagonal of the grid's
    /// bounds, which covers the farthest cell from any origin inside them.
    pub fn start_ripple(&mut self, grid: &HexGrid, origin: Point, now: u64) {
        let targets: Vec<(HexId, Point)> = grid
            .hexagons()
            .iter()
            .map(|h| (h.id, h.centroid()))
            .collect();
        let reach = grid.bounds().diagonal();
        info!(
            "ripple from ({:.0}, {:.0}) over {} cells, reach {:.0}",
            origin.x,
            origin.y,
            targets.len(),
            reach
        );
        let mut timer = RepeatingTimer::new(self.config.ripple_speed_ms);
        timer.start(now);
        self.ripples.push(RippleSession {
            origin,
            radius: 0.0,
            reach,
            targets,
            triggered: HashSet::new(),
            timer,
            ticks: 0,
        });
    }

    /// Number of ripples still expanding.
    pub fn active_ripples(&self) -> usize {
        self.ripples.len()
    }

    fn ripple_tick<S: DrawingSurface>(&mut self, surface: &mut S, ripple: &mut RippleSession, now: u64) {
        ripple.radius += RIPPLE_STEP_PX;
        ripple.ticks += 1;
        let reached: Vec<HexId> = ripple
            .targets
            .iter()
            .filter(|(id, c)| {
                !ripple.triggered.contains(id) && distance(ripple.origin, *c) <= ripple.radius
            })
            .map(|(id, _)| *id)
            .collect();
        for id in reached {
            ripple.triggered.insert(id);
            self.animate_glow(surface, id, now);
        }
        if ripple.finished() {
            ripple.timer.stop();
            debug!(
                "ripple finished after {} ticks ({} cells)",
                ripple.ticks,
                ripple.triggered.len()
            );
        }
    }

    //  Continuous rotation

    /// Spin `id` forever at the configured RPM.  Replaces any rotation the
    /// cell already had.  Returns `false` if rotation is disabled or the
    /// speed is unusable.
    pub fn start_continuous_rotation<S: DrawingSurface>(
        &mut self,
        surface: &mut S,
        id: HexId,
        now: u64,
    ) -> bool {
        if !self.config.rotation_enabled {
            debug!("rotation disabled, not spinning {:?}", id);
            return false;
        }
        let Some(period) = self.config.rotation_period_ms() else {
            warn!("unusable rotation speed {} rpm", self.config.rotation_speed_rpm);
            return false;
        };
        if self.rotating.contains(&id) {
            report(surface.cancel_rotation(id), "cancel rotation", id);
        }
        self.rotating.insert(id);
        report(
            surface.animate_rotation(
                id,
                RotationAnimation {
                    degrees: 360.0,
                    duration_ms: period,
                    easing: Easing::Linear,
                    repeat: Repeat::Forever,
                    started_at: now,
                },
            ),
            "continuous rotation",
            id,
        );
        true
    }

    pub fn stop_continuous_rotation<S: DrawingSurface>(&mut self, surface: &mut S, id: HexId) {
        self.rotating.remove(&id);
        report(surface.cancel_rotation(id), "cancel rotation", id);
    }

    pub fn is_rotating(&self, id: HexId) -> bool {
        self.rotating.contains(&id)
    }

    pub fn rotating_count(&self) -> usize {
        self.rotating.len()
    }

    //  Reconfiguration

    /// Push the configured wave and ripple periods into running timers.
    pub fn update_timer_intervals(&mut self, now: u64) {
        self.wave_timer.set_interval(self.config.wave_speed_ms, now);
        for ripple in &mut self.ripples {
            ripple.timer.set_interval(self.config.ripple_speed_ms, now);
        }
        debug!(
            "timer intervals: wave {}ms, ripple {}ms",
            self.config.wave_speed_ms, self.config.ripple_speed_ms
        );
    }

    /// Restart every continuously rotating cell at the configured speed.
    pub fn update_rotation_speed<S: DrawingSurface>(&mut self, surface: &mut S, now: u64) {
        let ids: Vec<HexId> = self.rotating.iter().copied().collect();
        debug!("restarting {} spinning cells", ids.len());
        for id in ids {
            self.stop_continuous_rotation(surface, id);
            if !self.start_continuous_rotation(surface, id, now) {
                debug!("{:?} not restarted, rotation unavailable", id);
            }
        }
    }

    //  Lifecycle

    /// Halt the wave.  Ripples run to completion on their own.
    pub fn stop_all(&mut self) {
        if self.wave.take().is_some() {
            info!("wave stopped");
        }
        self.wave_timer.stop();
    }

    /// Drop per-cell state after the grid was rebuilt.  Running waves and
    /// ripples keep their snapshots and finish against stale ids.
    pub fn forget_cells(&mut self) {
        self.glowing_until.clear();
        self.rotating.clear();
        self.indicator = None;
    }

    /// Advance every timer that is due at `now`.
    pub fn tick<S: DrawingSurface>(&mut self, surface: &mut S, now: u64) {
        if self.wave_timer.poll(now) {
            self.wave_tick(surface, now);
        }

        let mut ripples = std::mem::take(&mut self.ripples);
        for ripple in ripples.iter_mut() {
            if ripple.timer.poll(now) {
                self.ripple_tick(surface, ripple, now);
            }
        }
        ripples.retain(|r| !r.finished());
        ripples.append(&mut self.ripples);
        self.ripples = ripples;

        let before = self.glowing_until.len();
        self.glowing_until.retain(|_, until| now < *until);
        if before != self.glowing_until.len() {
            trace!("{} cells still glowing", self.glowing_until.len());
        }
    }

    /// Earliest time a timer wants to fire.
    pub fn next_deadline(&self) -> Option<u64> {
        earliest(
            std::iter::once(self.wave_timer.deadline())
                .chain(self.ripples.iter().map(|r| r.timer.deadline())),
        )
    }
}

/// Log a failed surface call and carry on.
fn report<E: std::error::Error>(result: Result<(), E>, what: &str, id: HexId) {
    if let Err(e) = result {
        warn!("{} on {:?} failed: {}", what, id, e);
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::Rect;
    use crate::grid::GridBuilder;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    //  Mock surface

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SetFill(HexId, Color),
        Fill(HexId, FillAnimation),
        Rotate(HexId, RotationAnimation),
        CancelRotation(HexId),
    }

    /// A test double that records every intent it receives.
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<Call>,
        fail: bool,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("surface unavailable")]
    struct MockError;

    impl Recorder {
        fn failing() -> Self {
            Self {
                calls: Vec::new(),
                fail: true,
            }
        }

        fn record(&mut self, call: Call) -> Result<(), MockError> {
            self.calls.push(call);
            if self.fail {
                Err(MockError)
            } else {
                Ok(())
            }
        }

        fn glows(&self) -> Vec<HexId> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Fill(id, a) if a.auto_reverse => Some(*id),
                    _ => None,
                })
                .collect()
        }
    }

    impl DrawingSurface for Recorder {
        type Error = MockError;

        fn clear(&mut self) -> Result<(), MockError> {
            Ok(())
        }

        fn add_cell(&mut self, _: HexId, _: &[Point; 6], _: Color) -> Result<(), MockError> {
            Ok(())
        }

        fn set_fill(&mut self, id: HexId, color: Color) -> Result<(), MockError> {
            self.record(Call::SetFill(id, color))
        }

        fn animate_fill(&mut self, id: HexId, a: FillAnimation) -> Result<(), MockError> {
            self.record(Call::Fill(id, a))
        }

        fn animate_rotation(&mut self, id: HexId, a: RotationAnimation) -> Result<(), MockError> {
            self.record(Call::Rotate(id, a))
        }

        fn cancel_rotation(&mut self, id: HexId) -> Result<(), MockError> {
            self.record(Call::CancelRotation(id))
        }
    }

    fn grid(width: f64, height: f64) -> HexGrid {
        GridBuilder::new(50.0).build(Rect::new(0.0, 0.0, width, height), 1)
    }

    fn rotating_config() -> Config {
        Config {
            rotation_enabled: true,
            ..Config::default()
        }
    }

    //  Glow

    #[test]
    fn glow_resets_then_pulses() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[0].id;
        let cfg = Config::default();
        let mut engine = AnimationEngine::new(&cfg);
        let mut s = Recorder::default();

        engine.animate_glow(&mut s, id, 1_000);

        assert_eq!(s.calls.len(), 2);
        assert_eq!(s.calls[0], Call::SetFill(id, cfg.passive_color));
        assert_eq!(
            s.calls[1],
            Call::Fill(
                id,
                FillAnimation {
                    from: cfg.passive_color,
                    to: cfg.glow_color,
                    duration_ms: 250,
                    easing: Easing::EaseInOut,
                    auto_reverse: true,
                    started_at: 1_000,
                }
            )
        );
        assert_eq!(engine.cell_state(id, 1_000), CellState::Glowing);
        assert_eq!(engine.cell_state(id, 1_499), CellState::Glowing);
        assert_eq!(engine.cell_state(id, 1_500), CellState::Passive);
    }

    #[test]
    fn glow_spins_once_when_rotation_enabled() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[0].id;
        let mut engine = AnimationEngine::new(&rotating_config());
        let mut s = Recorder::default();

        engine.animate_glow(&mut s, id, 0);

        let spin = s.calls.iter().find_map(|c| match c {
            Call::Rotate(_, a) => Some(*a),
            _ => None,
        });
        let spin = spin.expect("rotation intent");
        assert_eq!(spin.degrees, 360.0);
        assert_eq!(spin.duration_ms, 500);
        assert_eq!(spin.repeat, Repeat::Once);
        assert!(!engine.is_rotating(id));
    }

    #[test]
    fn surface_failures_are_not_fatal() {
        let g = grid(400.0, 300.0);
        let mut engine = AnimationEngine::new(&rotating_config());
        let mut s = Recorder::failing();
        for h in g.hexagons() {
            engine.animate_glow(&mut s, h.id, 0);
        }
        assert!(engine.start_continuous_rotation(&mut s, g.hexagons()[0].id, 0));
        assert!(!s.calls.is_empty());
    }

    #[test]
    fn huge_glow_duration_saturates() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[0].id;
        let mut engine = AnimationEngine::new(&Config {
            glow_duration_ms: u64::MAX,
            ..rotating_config()
        });
        let mut s = Recorder::default();

        engine.animate_glow(&mut s, id, 1_000);
        engine.animate_all(&mut s, g.ids(), 2_000);

        let spin = s.calls.iter().find_map(|c| match c {
            Call::Rotate(_, a) => Some(*a),
            _ => None,
        });
        assert_eq!(spin.map(|a| a.duration_ms), Some(u64::MAX));
        assert_eq!(engine.cell_state(id, u64::MAX - 1), CellState::Glowing);
    }

    //  Toggle

    #[test]
    fn toggle_on_then_off() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[3].id;
        let cfg = Config::default();
        let mut engine = AnimationEngine::new(&cfg);
        let mut s = Recorder::default();

        engine.toggle_on(&mut s, id, 0);
        assert_eq!(engine.indicator(), Some(id));
        assert_eq!(engine.cell_state(id, 10_000), CellState::Held);
        match s.calls.last() {
            Some(Call::Fill(_, a)) => {
                assert_eq!(a.duration_ms, 125);
                assert_eq!(a.easing, Easing::EaseIn);
                assert!(!a.auto_reverse);
                assert_eq!(a.to, cfg.glow_color);
            }
            other => panic!("unexpected {:?}", other),
        }

        engine.toggle_off(&mut s, id, 20);
        assert_eq!(engine.indicator(), None);
        assert_eq!(engine.cell_state(id, 10_000), CellState::Passive);
        match s.calls.last() {
            Some(Call::Fill(_, a)) => {
                assert_eq!(a.easing, Easing::EaseOut);
                assert_eq!(a.from, cfg.glow_color);
                assert_eq!(a.to, cfg.passive_color);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn only_one_indicator_at_a_time() {
        let g = grid(400.0, 300.0);
        let a = g.hexagons()[0].id;
        let b = g.hexagons()[1].id;
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();

        engine.toggle_on(&mut s, a, 0);
        engine.toggle_on(&mut s, b, 10);
        assert_eq!(engine.indicator(), Some(b));
        assert_eq!(engine.cell_state(a, 10), CellState::Passive);
        assert!(s
            .calls
            .iter()
            .any(|c| matches!(c, Call::Fill(id, f) if *id == a && f.easing == Easing::EaseOut)));
    }

    //  Wave

    #[test]
    fn wave_visits_columns_in_order_one_per_tick() {
        let g = grid(1920.0, 1080.0);
        let cfg = Config::default();
        let mut engine = AnimationEngine::new(&cfg);
        let mut s = Recorder::default();

        assert!(engine.start_wave(g.columns(), 0));
        let mut now = 0;
        for expected in 0..g.columns().len() {
            assert_eq!(engine.wave_column(), Some(expected));
            let before = s.glows().len();
            now += cfg.wave_speed_ms;
            engine.tick(&mut s, now);
            let glows = s.glows();
            assert_eq!(&glows[before..], g.columns()[expected].as_slice());
        }
        assert!(!engine.is_wave_active());
        assert_eq!(engine.next_deadline(), None);
        assert_eq!(s.glows().len(), g.len());
    }

    #[test]
    fn second_wave_start_is_ignored() {
        let g = grid(800.0, 600.0);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();

        assert!(engine.start_wave(g.columns(), 0));
        engine.tick(&mut s, 65);
        assert!(!engine.start_wave(g.columns(), 70));
        assert_eq!(engine.wave_column(), Some(1));
    }

    #[test]
    fn wave_can_restart_after_completion() {
        let g = grid(200.0, 200.0);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();

        assert!(engine.start_wave(g.columns(), 0));
        let mut now = 0;
        while engine.is_wave_active() {
            now += 65;
            engine.tick(&mut s, now);
        }
        assert!(engine.start_wave(g.columns(), now));
    }

    #[test]
    fn wave_over_nothing_does_not_start() {
        let mut engine = AnimationEngine::new(&Config::default());
        assert!(!engine.start_wave(&[], 0));
        assert!(!engine.is_wave_active());
    }

    #[test]
    fn stop_all_halts_wave() {
        let g = grid(800.0, 600.0);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();

        engine.start_wave(g.columns(), 0);
        engine.stop_all();
        engine.stop_all();
        assert!(!engine.is_wave_active());
        engine.tick(&mut s, 1_000);
        assert!(s.calls.is_empty());
    }

    #[test]
    fn wave_survives_rebuild_with_stale_snapshot() {
        let builder = GridBuilder::new(50.0);
        let old = builder.build(Rect::new(0.0, 0.0, 600.0, 400.0), 1);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();

        engine.start_wave(old.columns(), 0);
        let _new = builder.build(Rect::new(0.0, 0.0, 600.0, 400.0), 2);
        engine.forget_cells();
        let mut now = 0;
        while engine.is_wave_active() {
            now += 65;
            engine.tick(&mut s, now);
        }
        assert!(s.glows().iter().all(|id| id.generation() == 1));
    }

    #[test]
    fn interval_change_applies_to_running_wave() {
        let g = grid(800.0, 600.0);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();
        engine.start_wave(g.columns(), 0);

        let faster = Config {
            wave_speed_ms: 10,
            ..Config::default()
        };
        engine.apply_config(&mut s, &faster, 5);
        assert_eq!(engine.next_deadline(), Some(15));
        engine.tick(&mut s, 15);
        assert_eq!(engine.wave_column(), Some(1));
    }

    //  Ripple

    #[test]
    fn ripple_over_square_takes_71_ticks() {
        let g = grid(1000.0, 1000.0);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();

        engine.start_ripple(&g, Point::new(0.0, 0.0), 0);
        let mut ticks = 0;
        let mut now = 0;
        while engine.active_ripples() > 0 {
            now += 20;
            engine.tick(&mut s, now);
            ticks += 1;
            assert!(ticks <= 71, "ripple did not stop");
        }
        assert_eq!(ticks, 71);
    }

    #[test]
    fn ripple_fires_each_cell_at_most_once() {
        let g = grid(1000.0, 700.0);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();

        engine.start_ripple(&g, Point::new(500.0, 350.0), 0);
        let mut now = 0;
        while engine.active_ripples() > 0 {
            now += 20;
            engine.tick(&mut s, now);
        }
        let glows = s.glows();
        let unique: HashSet<HexId> = glows.iter().copied().collect();
        assert_eq!(glows.len(), unique.len());
        // Everything within the bounds diagonal of the center is reached.
        assert_eq!(unique.len(), g.len());
    }

    #[test]
    fn ripple_reaches_near_cells_first() {
        let g = grid(1000.0, 700.0);
        let origin = Point::new(0.0, 0.0);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();

        engine.start_ripple(&g, origin, 0);
        engine.tick(&mut s, 20);
        engine.tick(&mut s, 40);
        for id in s.glows() {
            let c = g.get(id).unwrap().centroid();
            assert!(distance(origin, c) <= 40.0);
        }
    }

    #[test]
    fn ripples_run_side_by_side() {
        let g = grid(600.0, 400.0);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();

        engine.start_ripple(&g, Point::new(0.0, 0.0), 0);
        engine.start_ripple(&g, Point::new(600.0, 400.0), 5);
        assert_eq!(engine.active_ripples(), 2);
        engine.stop_all();
        assert_eq!(engine.active_ripples(), 2);
        assert_eq!(engine.next_deadline(), Some(20));
    }

    #[test]
    fn ripple_over_empty_grid_ends_after_one_tick() {
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();
        engine.start_ripple(&HexGrid::empty(1), Point::new(0.0, 0.0), 0);
        engine.tick(&mut s, 20);
        assert_eq!(engine.active_ripples(), 0);
        assert!(s.calls.is_empty());
    }

    //  Bulk

    #[test]
    fn animate_all_glows_everything() {
        let g = grid(800.0, 600.0);
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();
        engine.animate_all(&mut s, g.ids(), 0);
        assert_eq!(s.glows().len(), g.len());
    }

    #[test]
    fn animate_some_picks_half_with_replacement() {
        let g = grid(800.0, 600.0);
        let ids: Vec<HexId> = g.ids().collect();
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();
        let mut rng = SmallRng::seed_from_u64(7);

        engine.animate_some_with(&mut s, &ids, &mut rng, 0);

        assert_eq!(s.glows().len(), ids.len() / 2);
        assert!(s.glows().iter().all(|id| ids.contains(id)));
    }

    #[test]
    fn animate_some_on_single_cell_does_nothing() {
        let g = grid(800.0, 600.0);
        let ids = vec![g.hexagons()[0].id];
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();
        engine.animate_some(&mut s, &ids, 0);
        assert!(s.calls.is_empty());
    }

    //  Rotation

    #[test]
    fn continuous_rotation_requires_enabled_flag() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[0].id;
        let mut engine = AnimationEngine::new(&Config::default());
        let mut s = Recorder::default();
        assert!(!engine.start_continuous_rotation(&mut s, id, 0));
        assert!(!engine.is_rotating(id));
        assert!(s.calls.is_empty());
    }

    #[test]
    fn continuous_rotation_is_linear_forever() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[0].id;
        let mut engine = AnimationEngine::new(&rotating_config());
        let mut s = Recorder::default();

        assert!(engine.start_continuous_rotation(&mut s, id, 0));
        assert!(engine.is_rotating(id));
        assert_eq!(
            s.calls,
            vec![Call::Rotate(
                id,
                RotationAnimation {
                    degrees: 360.0,
                    duration_ms: 30_000,
                    easing: Easing::Linear,
                    repeat: Repeat::Forever,
                    started_at: 0,
                }
            )]
        );

        engine.stop_continuous_rotation(&mut s, id);
        assert!(!engine.is_rotating(id));
        assert_eq!(s.calls.last(), Some(&Call::CancelRotation(id)));
    }

    #[test]
    fn restarting_rotation_cancels_previous() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[0].id;
        let mut engine = AnimationEngine::new(&rotating_config());
        let mut s = Recorder::default();

        engine.start_continuous_rotation(&mut s, id, 0);
        engine.start_continuous_rotation(&mut s, id, 100);
        assert_eq!(s.calls[1], Call::CancelRotation(id));
        assert_eq!(engine.rotating_count(), 1);
    }

    #[test]
    fn speed_change_restarts_all_spinning_cells() {
        let g = grid(400.0, 300.0);
        let a = g.hexagons()[0].id;
        let b = g.hexagons()[1].id;
        let mut engine = AnimationEngine::new(&rotating_config());
        let mut s = Recorder::default();
        engine.start_continuous_rotation(&mut s, a, 0);
        engine.start_continuous_rotation(&mut s, b, 0);
        s.calls.clear();

        let faster = Config {
            rotation_speed_rpm: 60.0,
            ..rotating_config()
        };
        engine.apply_config(&mut s, &faster, 500);

        let periods: Vec<u64> = s
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Rotate(_, r) => Some(r.duration_ms),
                _ => None,
            })
            .collect();
        assert_eq!(periods, vec![1_000, 1_000]);
        assert_eq!(engine.rotating_count(), 2);
    }

    #[test]
    fn unusable_speed_drops_spinning_cells() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[0].id;
        let mut engine = AnimationEngine::new(&rotating_config());
        let mut s = Recorder::default();
        engine.start_continuous_rotation(&mut s, id, 0);
        s.calls.clear();

        let stalled = Config {
            rotation_speed_rpm: 0.0,
            ..rotating_config()
        };
        engine.apply_config(&mut s, &stalled, 500);

        assert_eq!(s.calls, vec![Call::CancelRotation(id)]);
        assert!(!engine.is_rotating(id));
    }

    #[test]
    fn disabling_rotation_stops_spinning_cells() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[0].id;
        let mut engine = AnimationEngine::new(&rotating_config());
        let mut s = Recorder::default();
        engine.start_continuous_rotation(&mut s, id, 0);

        engine.apply_config(&mut s, &Config::default(), 10);
        assert_eq!(engine.rotating_count(), 0);
        assert_eq!(s.calls.last(), Some(&Call::CancelRotation(id)));
    }

    #[test]
    fn forget_cells_clears_per_cell_state() {
        let g = grid(400.0, 300.0);
        let id = g.hexagons()[0].id;
        let mut engine = AnimationEngine::new(&rotating_config());
        let mut s = Recorder::default();
        engine.start_continuous_rotation(&mut s, id, 0);
        engine.toggle_on(&mut s, g.hexagons()[1].id, 0);

        engine.forget_cells();
        assert_eq!(engine.rotating_count(), 0);
        assert_eq!(engine.indicator(), None);
    }
}
