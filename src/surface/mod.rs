//! Drawing surfaces for the hexagon overlay.
//!
//! [`scene::Scene`] is an in-memory surface: it keeps every cell and its
//! running animations and can be sampled at any clock time.  The headless
//! host and the tests drive it directly.
//!
//! When the `overlay-gtk` feature is enabled, [`gtk::run_main_loop`] takes
//! over the main thread, paints a `Scene` into a click-through layer-shell
//! window and drives command processing through the GLib main loop.

pub mod scene;

#[cfg(feature = "overlay-gtk")]
pub mod gtk;
