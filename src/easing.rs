//! Quadratic easing curves for scalar interpolation.

/// Shape of an animation's progress over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Quadratic, slow start.
    EaseIn,
    /// Quadratic, slow finish.
    EaseOut,
    /// Quadratic, slow start and finish.
    EaseInOut,
}

impl Easing {
    /// Map normalized time `u` in `[0, 1]` to eased progress in `[0, 1]`.
    pub fn apply(self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        match self {
            Easing::Linear => u,
            Easing::EaseIn => u * u,
            Easing::EaseOut => 1.0 - (1.0 - u) * (1.0 - u),
            Easing::EaseInOut => {
                if u < 0.5 {
                    2.0 * u * u
                } else {
                    1.0 - 2.0 * (1.0 - u) * (1.0 - u)
                }
            }
        }
    }

    /// Interpolate between two scalars.
    pub fn scalar(self, a: f64, b: f64, u: f64) -> f64 {
        a + (b - a) * self.apply(u)
    }
}

/// Progress of an animation that started at `started_at` and runs for
/// `duration_ms`, as normalized time.
///
/// With `auto_reverse` the animation plays forwards over the first
/// duration and backwards over the second, so the returned value rises to
/// `1.0` and falls back to `0.0`.  Zero durations complete instantly.
pub fn progress(started_at: u64, duration_ms: u64, now: u64, auto_reverse: bool) -> f64 {
    let elapsed = now.saturating_sub(started_at) as f64;
    if duration_ms == 0 {
        return if auto_reverse { 0.0 } else { 1.0 };
    }
    let d = duration_ms as f64;
    if !auto_reverse {
        return (elapsed / d).min(1.0);
    }
    if elapsed <= d {
        elapsed / d
    } else {
        (1.0 - (elapsed - d) / d).max(0.0)
    }
}
