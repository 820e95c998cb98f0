//! **hexglow** — a click-through hexagon overlay that glows where you touch.
//!
//! The union of every monitor is tiled with a honeycomb of hexagons.  Cells
//! light up under the pointer while a button is held, and global hotkeys
//! sweep a wave across the screen, fire ripples, flash random cells, or
//! hold a lock-key indicator lit.
//!
//! # Architecture
//!
//! The crate is organised around three seams, all in [`traits`]:
//!
//! * [`traits::DrawingSurface`] — receives intents (add a cell, set its
//!   fill, play an animation) so the core never touches a renderer.
//! * [`traits::BoundsProvider`] — reports display geometry so the core is
//!   not coupled to any display server.
//! * [`traits::CommandSource`] — delivers input and requests (a Unix
//!   socket, an input hook, …) over a channel.
//!
//! [`overlay::Overlay`] ties them together on a single thread.  Geometry
//! lives in [`geometry`] and [`grid`], timing in [`timer`] and [`engine`],
//! input handling in [`router`].  Concrete backends live in [`surface`]
//! (in-memory scene, GTK layer-shell window) and [`ipc`] (Unix-socket
//! command listener).

pub mod color;
pub mod command;
pub mod config;
pub mod easing;
pub mod engine;
pub mod geometry;
pub mod grid;
pub mod ipc;
pub mod monitors;
pub mod overlay;
pub mod router;
pub mod settings;
pub mod surface;
pub mod timer;
pub mod traits;
