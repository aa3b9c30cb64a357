//! Run colors

/// Run color as written in a `<color>` element.
///
/// Supports RGB, ARGB, theme colors and indexed colors. Theme tints are
/// kept as the raw `f64` from the markup so they serialize back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    /// `auto="1"`, or no color attributes at all
    #[default]
    Auto,

    /// Six-digit `rgb`; written back with an opaque alpha
    Rgb { r: u8, g: u8, b: u8 },

    /// Eight-digit `rgb`
    Argb { a: u8, r: u8, g: u8, b: u8 },

    /// Theme color with tint in -1.0..=1.0
    Theme {
        /// Theme color index
        index: u32,
        /// Tint value, 0.0 when absent
        tint: f64,
    },

    /// `indexed`, into the legacy 64-color palette
    Indexed(u32),
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color::Argb { a, r, g, b }
    }

    pub const fn theme(index: u32, tint: f64) -> Self {
        Color::Theme { index, tint }
    }

    /// Parse `RRGGBB` or `AARRGGBB`, with or without a leading `#`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

        match hex.len() {
            6 => Some(Color::Rgb {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
            }),
            8 => Some(Color::Argb {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => None,
        }
    }

    /// `AARRGGBB` form written to the `rgb` attribute
    ///
    /// Returns `None` for colors that are not expressed as RGB.
    pub fn to_argb_hex(&self) -> Option<String> {
        match self {
            Color::Rgb { r, g, b } => Some(format!("FF{:02X}{:02X}{:02X}", r, g, b)),
            Color::Argb { a, r, g, b } => Some(format!("{:02X}{:02X}{:02X}{:02X}", a, r, g, b)),
            _ => None,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Color::Auto)
    }

    pub const RED: Color = Color::Rgb { r: 255, g: 0, b: 0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(
            Color::from_hex("#FF0000"),
            Some(Color::Rgb { r: 255, g: 0, b: 0 })
        );
        assert_eq!(
            Color::from_hex("80FFFFFF"),
            Some(Color::Argb {
                a: 128,
                r: 255,
                g: 255,
                b: 255
            })
        );
        assert_eq!(Color::from_hex("F00"), None);
        assert_eq!(Color::from_hex("GG0000"), None);
    }

    #[test]
    fn test_to_argb_hex() {
        assert_eq!(Color::RED.to_argb_hex().as_deref(), Some("FFFF0000"));
        assert_eq!(Color::Indexed(2).to_argb_hex(), None);
    }
}
