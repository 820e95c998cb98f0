//! Commands and types shared by input sources, the router and the overlay.
//!
//! [`Command`] is the single vocabulary every [`CommandSource`] speaks.
//! It mixes *raw input* (pointer and key events, exactly as a global hook
//! would report them) with *direct actions* (start a wave, ripple from a
//! point, …) so scripts can drive the overlay without synthesising key
//! presses.
//!
//! Key codes are Windows-style virtual key codes.  On the wire a key may be
//! given as a number (`87`) or by name (`"W"`, `"CapsLock"`).
//!
//! [`CommandSource`]: crate::traits::CommandSource

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Virtual key codes the router reacts to.
pub mod keys {
    pub const A: u32 = 0x41;
    pub const R: u32 = 0x52;
    pub const S: u32 = 0x53;
    pub const T: u32 = 0x54;
    pub const W: u32 = 0x57;
    pub const CAPS_LOCK: u32 = 0x14;
}

/// A virtual key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct KeyCode(pub u32);

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            keys::CAPS_LOCK => write!(f, "CapsLock"),
            c @ 0x30..=0x39 | c @ 0x41..=0x5A => write!(f, "{}", char::from(c as u8)),
            c => write!(f, "0x{:02X}", c),
        }
    }
}

/// Parse a key name (case-insensitive): a single letter or digit, or
/// `"CapsLock"` / `"Caps"`.
fn parse_key_name(s: &str) -> Option<KeyCode> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_uppercase())
        .collect();
    match normalized.as_str() {
        "CAPS" | "CAPSLOCK" | "CAPITAL" => Some(KeyCode(keys::CAPS_LOCK)),
        name => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => Some(KeyCode(c as u32)),
                _ => None,
            }
        }
    }
}

impl<'de> Deserialize<'de> for KeyCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = KeyCode;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "virtual key code or key name")
            }
            fn visit_u64<E>(self, n: u64) -> Result<KeyCode, E>
            where
                E: DeError,
            {
                u32::try_from(n)
                    .map(KeyCode)
                    .map_err(|_| DeError::custom(format!("key code {} out of range", n)))
            }
            fn visit_str<E>(self, s: &str) -> Result<KeyCode, E>
            where
                E: DeError,
            {
                parse_key_name(s).ok_or_else(|| DeError::custom(format!("unknown key: {:?}", s)))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Modifier keys held while a key went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
    };

    pub const CTRL_ALT_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        alt: true,
        shift: true,
    };
}

/// Every input the overlay understands.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and consumed by the [`Overlay`](crate::overlay::Overlay).
/// All coordinates are in screen space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    //  Raw input

    /// Primary pointer button pressed.
    PointerDown { x: f64, y: f64 },

    /// Pointer moved.  Only the latest position matters; glows are triggered
    /// by the sample timer, not by this event.
    PointerMove { x: f64, y: f64 },

    /// Primary pointer button released.
    PointerUp { x: f64, y: f64 },

    /// A key went down.  The router resolves hotkeys from this.
    KeyDown {
        key: KeyCode,
        #[serde(default)]
        modifiers: Modifiers,
    },

    //  Direct actions

    /// Sweep a glow across the grid column by column.
    Wave,

    /// Glow every hexagon at once.
    AnimateAll,

    /// Glow a random half of the hexagons.
    AnimateSome,

    /// Expand a ripple from a screen point.
    Ripple { x: f64, y: f64 },

    /// Expand a ripple from the center of the overlay bounds.
    RippleFromCenter,

    /// Flip the sticky lock-key indicator.
    ToggleIndicator,

    /// Start continuously rotating the hexagons under a screen point.
    Spin { x: f64, y: f64 },

    /// Stop continuously rotating the hexagons under a screen point.
    StopSpin { x: f64, y: f64 },

    /// Halt the wave.
    StopAll,

    /// Re-query monitor bounds and rebuild the grid.
    Rebuild,

    /// Ask the host to open the configuration dialog.
    OpenSettings,
}

/// Static information about one display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Connector or display name (e.g. `"DP-1"`).
    pub name: String,
    /// Horizontal resolution in pixels.
    pub width: u32,
    /// Vertical resolution in pixels.
    pub height: u32,
    /// X position on the virtual desktop (pixels).
    pub x: i32,
    /// Y position on the virtual desktop (pixels).
    pub y: i32,
}
