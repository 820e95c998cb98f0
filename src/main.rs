//! Entry point for the **hexglow** overlay.
//!
//! Spawns the Unix-socket [`CommandSource`](hexglow::traits::CommandSource)
//! on a background thread and drives the overlay on the main thread.
//!
//! When the `overlay-gtk` feature is enabled the main thread runs the GLib
//! main loop (GTK4 requires it) and polls the command channel from there.
//! Without the feature, a headless loop sleeps on the channel until the
//! next command or timer deadline.
//!
//! ```text
//! hexglow [--config PATH] [--socket PATH] [--monitor WxH+X+Y]...
//! ```

use hexglow::command::Command;
use hexglow::config::Config;
use hexglow::ipc::listener::UnixSocketListener;
use hexglow::traits::CommandSource;
use log::{error, info};
use std::path::PathBuf;
use std::sync::mpsc;

/// Default socket path for the command listener.
fn default_socket_path() -> PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(runtime).join("hexglow.sock")
}

/// Default preset path (`$XDG_CONFIG_HOME/hexglow/preset.json`).
fn default_preset_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("hexglow").join("preset.json")
}

/// Load the preset, falling back to compiled-in defaults.
fn load_config(path: &std::path::Path) -> Config {
    match Config::load(path) {
        Ok(cfg) => {
            info!("loaded preset from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no preset ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Arguments

struct Args {
    preset: PathBuf,
    socket: PathBuf,
    /// `WxH+X+Y` layouts for the headless host.
    monitors: Vec<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        preset: default_preset_path(),
        socket: default_socket_path(),
        monitors: Vec::new(),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "--config" => args.preset = PathBuf::from(value("--config")?),
            "--socket" => args.socket = PathBuf::from(value("--socket")?),
            "--monitor" => args.monitors.push(value("--monitor")?),
            other => return Err(format!("unknown argument {:?}", other)),
        }
    }
    Ok(args)
}

//  Main

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            error!("{}", e);
            eprintln!("usage: hexglow [--config PATH] [--socket PATH] [--monitor WxH+X+Y]...");
            std::process::exit(2);
        }
    };

    let config = load_config(&args.preset);

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_sources(cmd_tx, args.socket.clone());

    start_event_loop(config, args, cmd_rx);
}

//  Event loops

#[cfg(feature = "overlay-gtk")]
fn start_event_loop(config: Config, args: Args, cmd_rx: mpsc::Receiver<Command>) {
    if !args.monitors.is_empty() {
        info!("--monitor ignored, the GTK overlay reads monitors from GDK");
    }
    hexglow::surface::gtk::run_main_loop(config, args.preset, cmd_rx);
}

#[cfg(not(feature = "overlay-gtk"))]
fn start_event_loop(config: Config, args: Args, cmd_rx: mpsc::Receiver<Command>) {
    use hexglow::monitors::StaticMonitors;
    use hexglow::overlay::{HostEvent, Overlay};
    use hexglow::surface::scene::Scene;
    use std::time::{Duration, Instant};

    /// Longest sleep when no timer is armed.
    const IDLE_WAIT: Duration = Duration::from_secs(3600);

    let monitors = if args.monitors.is_empty() {
        StaticMonitors::default()
    } else {
        match StaticMonitors::from_specs(&args.monitors) {
            Ok(m) => m,
            Err(e) => {
                error!("{}", e);
                std::process::exit(2);
            }
        }
    };

    let clock = Instant::now();
    let now = || clock.elapsed().as_millis() as u64;

    let mut overlay = Overlay::new(config, monitors, Scene::new());
    let (host_tx, host_rx) = mpsc::channel::<HostEvent>();
    overlay.set_host_channel(host_tx);
    overlay.start(now());

    info!("hexglow running headless");
    loop {
        let wait = overlay
            .next_deadline()
            .map(|due| Duration::from_millis(due.saturating_sub(now())))
            .unwrap_or(IDLE_WAIT);
        match cmd_rx.recv_timeout(wait) {
            Ok(cmd) => {
                if let Err(e) = overlay.handle(cmd, now()) {
                    error!("command error: {}", e);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        overlay.tick(now());

        while let Ok(event) = host_rx.try_recv() {
            match event {
                // No dialog without a display; pick up whatever an external
                // editor wrote to the preset.
                HostEvent::OpenSettings => overlay.reload_preset(&args.preset, now()),
            }
        }
    }
    overlay.shutdown();
    info!("all command sources closed, exiting");
}

//  Helpers

fn spawn_command_sources(tx: mpsc::Sender<Command>, socket: PathBuf) {
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&socket);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}
