//! GTK4 + layer-shell overlay that runs on the **main thread**.
//!
//! # Window layout
//!
//! ```text
//! window per monitor        (layer-shell overlay, transparent, click-through)
//! └ DrawingArea             (paints the shared Scene with cairo)
//! ```
//!
//! Every window is anchored to all four edges of its monitor, takes no
//! keyboard focus and has an empty input region, so pointer events fall
//! through to whatever is underneath.  Input reaches the overlay through
//! the command channel instead.

use crate::color::Color;
use crate::command::{Command, MonitorInfo};
use crate::config::Config;
use crate::geometry::{Point, Rect};
use crate::grid::HexId;
use crate::monitors::monitor_rect;
use crate::overlay::{HostEvent, Overlay};
use crate::surface::scene::{Scene, SceneCell};
use crate::traits::{BoundsProvider, DrawingSurface, FillAnimation, RotationAnimation};
use gtk4::prelude::*;
use gtk4::{cairo, gdk, glib};
use gtk4_layer_shell::{Edge, LayerShell};
use log::{debug, error, info, warn};
use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

//  Default CSS

const DEFAULT_CSS: &str = r#"
window,
window.background {
    background-color: transparent;
    background: none;
}
"#;

//  Monitors

/// Errors from the GDK monitor query.
#[derive(Debug, thiserror::Error)]
pub enum GdkMonitorsError {
    #[error("GDK reports no monitors")]
    NoMonitors,
}

/// [`BoundsProvider`] backed by the default GDK display.
///
/// GDK has no notion of a primary monitor; the first one listed stands in.
pub struct GdkMonitors {
    display: gdk::Display,
}

impl GdkMonitors {
    pub fn new(display: gdk::Display) -> Self {
        Self { display }
    }

    fn list(&self) -> Vec<gdk::Monitor> {
        let model = self.display.monitors();
        (0..model.n_items())
            .filter_map(|i| model.item(i).and_downcast::<gdk::Monitor>())
            .collect()
    }
}

fn monitor_info(index: usize, monitor: &gdk::Monitor) -> MonitorInfo {
    let geometry = monitor.geometry();
    MonitorInfo {
        name: monitor
            .connector()
            .map(|c| c.to_string())
            .unwrap_or_else(|| format!("MONITOR-{}", index + 1)),
        width: geometry.width().max(0) as u32,
        height: geometry.height().max(0) as u32,
        x: geometry.x(),
        y: geometry.y(),
    }
}

impl BoundsProvider for GdkMonitors {
    type Error = GdkMonitorsError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, GdkMonitorsError> {
        let monitors: Vec<MonitorInfo> = self
            .list()
            .iter()
            .enumerate()
            .map(|(i, m)| monitor_info(i, m))
            .collect();
        if monitors.is_empty() {
            return Err(GdkMonitorsError::NoMonitors);
        }
        Ok(monitors)
    }

    fn primary(&self) -> Result<MonitorInfo, GdkMonitorsError> {
        self.list()
            .first()
            .map(|m| monitor_info(0, m))
            .ok_or(GdkMonitorsError::NoMonitors)
    }
}

//  Surface

/// Errors from the GTK surface.
#[derive(Debug, thiserror::Error)]
pub enum GtkSurfaceError {
    /// The scene is borrowed by a draw callback.
    #[error("scene is being drawn")]
    Busy,
}

/// [`DrawingSurface`] that records into a [`Scene`] shared with the
/// drawing areas.
pub struct GtkSurface {
    scene: Rc<RefCell<Scene>>,
}

impl GtkSurface {
    fn with_scene(
        &self,
        f: impl FnOnce(&mut Scene) -> Result<(), Infallible>,
    ) -> Result<(), GtkSurfaceError> {
        let mut scene = self.scene.try_borrow_mut().map_err(|_| GtkSurfaceError::Busy)?;
        f(&mut scene).map_err(|never| match never {})
    }
}

impl DrawingSurface for GtkSurface {
    type Error = GtkSurfaceError;

    fn clear(&mut self) -> Result<(), GtkSurfaceError> {
        self.with_scene(|s| s.clear())
    }

    fn add_cell(&mut self, id: HexId, vertices: &[Point; 6], fill: Color) -> Result<(), GtkSurfaceError> {
        self.with_scene(|s| s.add_cell(id, vertices, fill))
    }

    fn set_fill(&mut self, id: HexId, color: Color) -> Result<(), GtkSurfaceError> {
        self.with_scene(|s| s.set_fill(id, color))
    }

    fn animate_fill(&mut self, id: HexId, animation: FillAnimation) -> Result<(), GtkSurfaceError> {
        self.with_scene(|s| s.animate_fill(id, animation))
    }

    fn animate_rotation(
        &mut self,
        id: HexId,
        animation: RotationAnimation,
    ) -> Result<(), GtkSurfaceError> {
        self.with_scene(|s| s.animate_rotation(id, animation))
    }

    fn cancel_rotation(&mut self, id: HexId) -> Result<(), GtkSurfaceError> {
        self.with_scene(|s| s.cancel_rotation(id))
    }
}

//  Painting

fn paint_cell(cr: &cairo::Context, cell: &SceneCell, now: u64) -> Result<(), cairo::Error> {
    let fill = cell.fill_at(now);
    if fill.a == 0 {
        return Ok(());
    }
    cr.save()?;
    cr.translate(cell.center.x, cell.center.y);
    cr.rotate(cell.angle_at(now).to_radians());
    for (i, v) in cell.vertices.iter().enumerate() {
        let (x, y) = (v.x - cell.center.x, v.y - cell.center.y);
        if i == 0 {
            cr.move_to(x, y);
        } else {
            cr.line_to(x, y);
        }
    }
    cr.close_path();
    let (r, g, b, a) = fill.to_rgba_f64();
    cr.set_source_rgba(r, g, b, a);
    cr.fill()?;
    cr.restore()
}

/// One overlay window covering `monitor`.
///
/// `origin` holds the screen position of the grid's top-left corner, which
/// changes when the grid is rebuilt.
fn build_window(
    monitor: &gdk::Monitor,
    scene: Rc<RefCell<Scene>>,
    origin: Rc<Cell<Point>>,
    clock: Instant,
) -> (gtk4::Window, gtk4::DrawingArea) {
    let rect = monitor_rect(&monitor_info(0, monitor));

    let window = gtk4::Window::new();
    window.init_layer_shell();
    window.set_layer(gtk4_layer_shell::Layer::Overlay);
    window.set_namespace("hexglow");
    window.set_monitor(Some(monitor));
    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        window.set_anchor(edge, true);
    }
    window.set_exclusive_zone(-1);
    window.set_keyboard_mode(gtk4_layer_shell::KeyboardMode::None);
    window.set_decorated(false);
    window.set_can_target(false);
    window.remove_css_class("background");

    window.connect_realize(|w| match w.surface() {
        Some(surface) => surface.set_input_region(&cairo::Region::create()),
        None => warn!("overlay window has no surface, clicks will not pass through"),
    });

    let area = gtk4::DrawingArea::new();
    area.set_can_target(false);
    area.set_draw_func(move |_, cr, _, _| {
        let Ok(scene) = scene.try_borrow() else {
            return;
        };
        let now = clock.elapsed().as_millis() as u64;
        let o = origin.get();
        cr.translate(o.x - rect.left, o.y - rect.top);
        for (id, cell) in scene.cells() {
            if let Err(e) = paint_cell(cr, cell, now) {
                debug!("paint {:?} failed: {}", id, e);
                return;
            }
        }
    });
    window.set_child(Some(&area));
    (window, area)
}

//  Public API

/// Run the GTK4 main loop on the **current** (main) thread.
///
/// Builds the overlay from `config`, paints it on every monitor and feeds
/// it from `cmd_rx` until every command source is gone.  Opening settings
/// reloads the preset at `preset_path`.
pub fn run_main_loop(config: Config, preset_path: PathBuf, cmd_rx: mpsc::Receiver<Command>) {
    if let Err(e) = gtk4::init() {
        error!("failed to initialise GTK4: {}", e);
        return;
    }
    info!("GTK4 initialised on main thread");

    let Some(display) = gdk::Display::default() else {
        error!("no GDK display");
        return;
    };
    load_css(&display);

    let clock = Instant::now();
    let scene = Rc::new(RefCell::new(Scene::new()));
    let origin = Rc::new(Cell::new(Point::default()));

    let monitors = GdkMonitors::new(display);
    let gdk_monitors = monitors.list();

    let mut overlay = Overlay::new(
        config,
        monitors,
        GtkSurface {
            scene: Rc::clone(&scene),
        },
    );
    let (host_tx, host_rx) = mpsc::channel::<HostEvent>();
    overlay.set_host_channel(host_tx);
    overlay.start(clock.elapsed().as_millis() as u64);
    origin.set(grid_origin(overlay.grid().bounds()));

    //  Windows
    let areas: Vec<gtk4::DrawingArea> = gdk_monitors
        .iter()
        .map(|m| {
            let (window, area) = build_window(m, Rc::clone(&scene), Rc::clone(&origin), clock);
            window.present();
            area
        })
        .collect();
    info!("overlay mapped on {} monitor(s)", areas.len());

    //  Main event loop (~60 fps)
    let main_loop = glib::MainLoop::new(None, false);
    let quit = main_loop.clone();
    let mut was_animating = true;
    glib::timeout_add_local(Duration::from_millis(16), move || {
        let now = clock.elapsed().as_millis() as u64;

        // 1. Drain commands.
        let mut dirty = false;
        let mut disconnected = false;
        loop {
            match cmd_rx.try_recv() {
                Ok(cmd) => {
                    debug!("command: {:?}", cmd);
                    if let Err(e) = overlay.handle(cmd, now) {
                        error!("command error: {}", e);
                    }
                    dirty = true;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        // 2. Advance timers.
        overlay.tick(now);

        // 3. Host requests.
        while let Ok(event) = host_rx.try_recv() {
            match event {
                HostEvent::OpenSettings => {
                    overlay.reload_preset(&preset_path, now);
                    dirty = true;
                }
            }
        }
        origin.set(grid_origin(overlay.grid().bounds()));

        // 4. Redraw while anything moves, plus one settling frame.
        let animating = scene.try_borrow().map(|s| s.is_animating(now)).unwrap_or(true);
        if dirty || animating || was_animating {
            for area in &areas {
                area.queue_draw();
            }
        }
        was_animating = animating;

        if disconnected {
            overlay.shutdown();
            info!("all sources closed, exiting");
            quit.quit();
            return glib::ControlFlow::Break;
        }
        glib::ControlFlow::Continue
    });

    info!("entering GLib main loop");
    main_loop.run();
    info!("GLib main loop exited");
}

fn grid_origin(bounds: Rect) -> Point {
    Point::new(bounds.left, bounds.top)
}

//  CSS loading

fn load_css(display: &gdk::Display) {
    let provider = gtk4::CssProvider::new();
    #[allow(deprecated)]
    provider.load_from_data(DEFAULT_CSS);
    gtk4::style_context_add_provider_for_display(
        display,
        &provider,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}
