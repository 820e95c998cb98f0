//! Core traits that decouple the overlay from any specific renderer,
//! display server or input mechanism.
//!
//! Every concrete backend (the GTK layer-shell window, the in-memory scene,
//! a Unix-socket listener, a test harness, …) implements one of these
//! traits.  The [`Overlay`](crate::overlay::Overlay) and the
//! [`AnimationEngine`](crate::engine::AnimationEngine) only depend on these
//! abstractions.

use crate::color::Color;
use crate::command::{Command, MonitorInfo};
use crate::easing::Easing;
use crate::geometry::Point;
use crate::grid::HexId;
use std::sync::mpsc;

//  Drawing surface

/// A colour transition the surface should play on one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillAnimation {
    pub from: Color,
    pub to: Color,
    pub duration_ms: u64,
    pub easing: Easing,
    /// Play back to `from` after reaching `to`, doubling the total time.
    pub auto_reverse: bool,
    /// Clock time (ms) the animation starts at.
    pub started_at: u64,
}

/// How often a rotation plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Once,
    Forever,
}

/// A rotation the surface should play on one cell, about its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAnimation {
    /// Angle swept per run, relative to the angle at `started_at`.
    pub degrees: f64,
    pub duration_ms: u64,
    pub easing: Easing,
    pub repeat: Repeat,
    pub started_at: u64,
}

/// The thing that actually renders hexagons.
///
/// The core only issues *intents*: add a cell, set its colour, play an
/// animation.  Interpolation and frame timing belong to the surface.
/// Every method may fail; callers log the failure and carry on.
pub trait DrawingSurface {
    /// The error type produced by this surface.
    type Error: std::error::Error + Send + 'static;

    /// Remove every cell.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Add a cell with its grid-local vertex ring and initial fill.
    fn add_cell(&mut self, id: HexId, vertices: &[Point; 6], fill: Color)
        -> Result<(), Self::Error>;

    /// Set a cell's fill immediately, cancelling any fill animation.
    fn set_fill(&mut self, id: HexId, color: Color) -> Result<(), Self::Error>;

    /// Replace the cell's fill animation.
    fn animate_fill(&mut self, id: HexId, animation: FillAnimation) -> Result<(), Self::Error>;

    /// Replace the cell's rotation animation.
    fn animate_rotation(
        &mut self,
        id: HexId,
        animation: RotationAnimation,
    ) -> Result<(), Self::Error>;

    /// Stop the cell's rotation animation, leaving it at rest.
    fn cancel_rotation(&mut self, id: HexId) -> Result<(), Self::Error>;
}

//  Bounds provider

/// Source of display geometry.
pub trait BoundsProvider {
    /// The error type produced by this provider.
    type Error: std::error::Error + Send + 'static;

    /// Every active display.
    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error>;

    /// The primary display, used as a fallback region when the full list
    /// is unavailable and as the anchor for the lock-key indicator.
    fn primary(&self) -> Result<MonitorInfo, Self::Error>;
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport — a Unix socket, a global input
/// hook, an in-memory channel, … — and forward parsed commands into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
///   Sending never blocks; the overlay picks commands up on its own thread.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    /// A test double that emits a fixed sequence of commands.
    struct MockSource {
        commands: Vec<Command>,
    }

    impl CommandSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), MockError> {
            for cmd in self.commands.drain(..) {
                let _ = sink.send(cmd);
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_commands() {
        let mut src = MockSource {
            commands: vec![Command::PointerDown { x: 1.0, y: 2.0 }, Command::Wave],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0], Command::PointerDown { x: 1.0, y: 2.0 });
        assert_eq!(cmds[1], Command::Wave);
    }

    #[test]
    fn source_runs_on_another_thread() {
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::spawn(move || {
            let mut src = MockSource {
                commands: vec![Command::ToggleIndicator],
            };
            src.run(tx)
        });
        handle.join().unwrap().unwrap();
        assert_eq!(rx.recv().unwrap(), Command::ToggleIndicator);
    }
}
