//! Fonts applied to shared string runs

use super::Color;

/// Font applied to a range of an entry.
///
/// Each field maps to one `rPr` child; see
/// [`RunProperties::from_font`](crate::RunProperties::from_font) for the
/// order they are written in. Defaults match a fresh Excel workbook
/// (Calibri 11, automatic color).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontStyle {
    /// `<rFont val>`
    pub name: String,
    /// `<sz val>`, in points
    pub size: f64,
    /// `<b/>`
    pub bold: bool,
    /// `<i/>`
    pub italic: bool,
    /// `<u val>`; `None` writes nothing
    pub underline: Underline,
    /// `<strike/>`
    pub strikethrough: bool,
    /// `<color>`; `Color::Auto` writes nothing
    pub color: Color,
    /// `<vertAlign val>`; baseline writes nothing
    pub vertical_align: FontVerticalAlign,
}

impl Default for FontStyle {
    fn default() -> Self {
        FontStyle {
            name: String::from("Calibri"),
            size: 11.0,
            bold: false,
            italic: false,
            underline: Underline::None,
            strikethrough: false,
            color: Color::Auto,
            vertical_align: FontVerticalAlign::Baseline,
        }
    }
}

impl FontStyle {
    pub fn new() -> Self {
        FontStyle::default()
    }

    pub fn with_name<S: Into<String>>(self, name: S) -> Self {
        FontStyle {
            name: name.into(),
            ..self
        }
    }

    pub fn with_size(self, size: f64) -> Self {
        FontStyle { size, ..self }
    }

    pub fn with_bold(self, bold: bool) -> Self {
        FontStyle { bold, ..self }
    }

    pub fn with_italic(self, italic: bool) -> Self {
        FontStyle { italic, ..self }
    }

    pub fn with_underline(self, underline: Underline) -> Self {
        FontStyle { underline, ..self }
    }

    pub fn with_strikethrough(self, strikethrough: bool) -> Self {
        FontStyle {
            strikethrough,
            ..self
        }
    }

    pub fn with_color(self, color: Color) -> Self {
        FontStyle { color, ..self }
    }

    pub fn with_vertical_align(self, vertical_align: FontVerticalAlign) -> Self {
        FontStyle {
            vertical_align,
            ..self
        }
    }
}

/// `val` of `<u>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Underline {
    #[default]
    None,
    /// Bare `<u/>`
    Single,
    Double,
    SingleAccounting,
    DoubleAccounting,
}

impl Underline {
    /// The `val` attribute of `<u>`
    pub fn as_str(&self) -> &'static str {
        match self {
            Underline::None => "none",
            Underline::Single => "single",
            Underline::Double => "double",
            Underline::SingleAccounting => "singleAccounting",
            Underline::DoubleAccounting => "doubleAccounting",
        }
    }

    /// Parse a `val` attribute; unknown values fall back to single.
    pub fn from_val(s: &str) -> Self {
        match s {
            "none" => Underline::None,
            "double" => Underline::Double,
            "singleAccounting" => Underline::SingleAccounting,
            "doubleAccounting" => Underline::DoubleAccounting,
            _ => Underline::Single,
        }
    }
}

/// `val` of `<vertAlign>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FontVerticalAlign {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

impl FontVerticalAlign {
    /// The `val` attribute of `<vertAlign>`
    pub fn as_str(&self) -> &'static str {
        match self {
            FontVerticalAlign::Baseline => "baseline",
            FontVerticalAlign::Superscript => "superscript",
            FontVerticalAlign::Subscript => "subscript",
        }
    }

    pub fn from_val(s: &str) -> Option<Self> {
        Some(match s {
            "baseline" => FontVerticalAlign::Baseline,
            "superscript" => FontVerticalAlign::Superscript,
            "subscript" => FontVerticalAlign::Subscript,
            _ => return None,
        })
    }
}

/// Theme font scheme of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FontScheme {
    None,
    Major,
    Minor,
}

impl FontScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontScheme::None => "none",
            FontScheme::Major => "major",
            FontScheme::Minor => "minor",
        }
    }

    pub fn from_val(s: &str) -> Option<Self> {
        Some(match s {
            "none" => FontScheme::None,
            "major" => FontScheme::Major,
            "minor" => FontScheme::Minor,
            _ => return None,
        })
    }
}
