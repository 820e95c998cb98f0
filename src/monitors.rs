//! Display bounds with fallback.
//!
//! The overlay covers the union of every monitor.  If the monitor list is
//! unavailable it falls back to the primary monitor, and if even that fails
//! it settles for an empty rectangle (which builds an empty grid) rather
//! than aborting.

use crate::command::MonitorInfo;
use crate::geometry::{Point, Rect};
use crate::traits::BoundsProvider;
use log::{debug, warn};

/// Vertical distance of the lock-key indicator below the top edge of the
/// primary monitor.
pub const INDICATOR_OFFSET_Y: f64 = 70.0;

/// Errors from the static monitor provider.
#[derive(Debug, thiserror::Error)]
pub enum MonitorsError {
    #[error("no monitors configured")]
    NoMonitors,
    #[error("bad monitor spec {0:?} (expected WxH+X+Y)")]
    BadSpec(String),
}

/// Screen rectangle occupied by a monitor.
pub fn monitor_rect(m: &MonitorInfo) -> Rect {
    Rect::new(m.x as f64, m.y as f64, m.width as f64, m.height as f64)
}

/// Union of all monitors, falling back to the primary monitor, then to an
/// empty rectangle.
pub fn total_bounds<B: BoundsProvider>(provider: &B) -> Rect {
    match provider.monitors() {
        Ok(monitors) => {
            let mut rects = monitors.iter().map(monitor_rect);
            if let Some(first) = rects.next() {
                let total = rects.fold(first, |acc, r| acc.union(&r));
                debug!("total bounds over {} monitor(s): {:?}", monitors.len(), total);
                return total;
            }
            warn!("no monitors reported, falling back to primary");
        }
        Err(e) => warn!("monitor query failed ({}), falling back to primary", e),
    }
    match provider.primary() {
        Ok(m) => monitor_rect(&m),
        Err(e) => {
            warn!("primary monitor query failed ({}), using empty bounds", e);
            Rect::default()
        }
    }
}

/// Screen point the lock-key indicator gravitates to: top-center of the
/// primary monitor, or of `fallback` if the primary is unknown.
pub fn indicator_anchor<B: BoundsProvider>(provider: &B, fallback: Rect) -> Point {
    let rect = match provider.primary() {
        Ok(m) => monitor_rect(&m),
        Err(e) => {
            debug!("no primary monitor for indicator ({}), using bounds", e);
            fallback
        }
    };
    Point::new(rect.left + rect.width / 2.0, rect.top + INDICATOR_OFFSET_Y)
}

/// Parse an X-style geometry `WxH+X+Y` (offsets may be negative:
/// `1280x1024-1280+0`).
pub fn parse_monitor_spec(name: &str, spec: &str) -> Result<MonitorInfo, MonitorsError> {
    let bad = || MonitorsError::BadSpec(spec.to_string());
    let spec_trimmed = spec.trim();

    let (size, offsets) = match spec_trimmed.find(|c| c == '+' || c == '-') {
        Some(i) => spec_trimmed.split_at(i),
        None => (spec_trimmed, "+0+0"),
    };
    let (w, h) = size.split_once(['x', 'X']).ok_or_else(bad)?;
    let width: u32 = w.parse().map_err(|_| bad())?;
    let height: u32 = h.parse().map_err(|_| bad())?;

    // offsets looks like "+0+0", "-1280+0", "+10-20"
    let second = offsets[1..]
        .find(|c| c == '+' || c == '-')
        .map(|i| i + 1)
        .ok_or_else(bad)?;
    let (xs, ys) = offsets.split_at(second);
    let x: i32 = xs.parse().map_err(|_| bad())?;
    let y: i32 = ys.parse().map_err(|_| bad())?;

    if width == 0 || height == 0 {
        return Err(bad());
    }
    Ok(MonitorInfo {
        name: name.to_string(),
        width,
        height,
        x,
        y,
    })
}

/// A fixed monitor layout, used when no display server is queried.
///
/// The first monitor is the primary one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMonitors {
    monitors: Vec<MonitorInfo>,
}

impl StaticMonitors {
    pub fn new(monitors: Vec<MonitorInfo>) -> Self {
        Self { monitors }
    }

    /// Build from `WxH+X+Y` specs.
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> Result<Self, MonitorsError> {
        let monitors = specs
            .iter()
            .enumerate()
            .map(|(i, s)| parse_monitor_spec(&format!("STATIC-{}", i + 1), s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { monitors })
    }
}

impl Default for StaticMonitors {
    fn default() -> Self {
        Self::new(vec![MonitorInfo {
            name: "STATIC-1".into(),
            width: 1920,
            height: 1080,
            x: 0,
            y: 0,
        }])
    }
}

impl BoundsProvider for StaticMonitors {
    type Error = MonitorsError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, MonitorsError> {
        if self.monitors.is_empty() {
            return Err(MonitorsError::NoMonitors);
        }
        Ok(self.monitors.clone())
    }

    fn primary(&self) -> Result<MonitorInfo, MonitorsError> {
        self.monitors.first().cloned().ok_or(MonitorsError::NoMonitors)
    }
}
