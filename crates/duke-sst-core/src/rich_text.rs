//! Shared string entries.
//!
//! A [`RichText`] mirrors the structure of a SpreadsheetML `<si>` element:
//!
//! ```text
//! <si>
//!   <t>plain text</t>                     -- or --
//!   <r><rPr>...</rPr><t>run 1</t></r>
//!   <r><t>run 2</t></r>
//!   <rPh sb="0" eb="1"><t>phonetic</t></rPh>
//!   <phoneticPr fontId="1"/>
//! </si>
//! ```
//!
//! Run properties are kept as an ordered list so that an entry read from
//! a file serializes back with its properties in the original order.

use crate::color::Color;
use crate::error::{Error, Result};
use crate::escape::decode_excel_escapes;
use crate::font::{FontScheme, FontStyle, FontVerticalAlign, Underline};

/// One shared string entry.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RichText {
    /// Plain `<t>` child; `None` when the entry is made of runs
    text: Option<String>,
    runs: Vec<TextRun>,
    phonetic_runs: Vec<PhoneticRun>,
    phonetic_properties: Option<PhoneticProperties>,
}

/// A formatting run (`<r>`).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRun {
    /// `<rPr>`, absent for runs that inherit the cell font
    pub properties: Option<RunProperties>,
    /// Raw run text, Excel escapes not decoded
    pub text: String,
}

/// Ordered children of a run's `<rPr>` element.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunProperties(pub Vec<RunProperty>);

/// A single `<rPr>` child element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunProperty {
    /// `<rFont val=".."/>`
    Font(String),
    Charset(i32),
    Family(i32),
    Bold(bool),
    Italic(bool),
    Strike(bool),
    Outline(bool),
    Shadow(bool),
    Condense(bool),
    Extend(bool),
    Color(Color),
    /// `<sz val=".."/>` in points
    Size(f64),
    Underline(Underline),
    VertAlign(FontVerticalAlign),
    Scheme(FontScheme),
}

/// A phonetic run (`<rPh>`) covering base characters `start..end`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhoneticRun {
    pub start: u32,
    pub end: u32,
    pub text: String,
}

/// `<phoneticPr>` settings.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhoneticProperties {
    pub font_id: u32,
    /// `type` attribute (e.g. "fullwidthKatakana")
    pub kind: Option<String>,
    /// `alignment` attribute (e.g. "left")
    pub alignment: Option<String>,
}

impl RichText {
    /// Create a plain text entry
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Create an entry from formatting runs
    pub fn from_runs(runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// An entry with neither a text node nor runs carries no content at all.
    ///
    /// This is distinct from the empty string, which is `RichText::new("")`.
    pub fn is_absent(&self) -> bool {
        self.text.is_none() && self.runs.is_empty()
    }

    /// The plain `<t>` child, if this entry is not made of runs
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Formatting runs
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Phonetic runs
    pub fn phonetic_runs(&self) -> &[PhoneticRun] {
        &self.phonetic_runs
    }

    /// Phonetic properties
    pub fn phonetic_properties(&self) -> Option<&PhoneticProperties> {
        self.phonetic_properties.as_ref()
    }

    /// Replace the plain text node
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.text = Some(text.into());
    }

    /// Append a formatting run
    pub fn push_run(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    /// Append a phonetic run
    pub fn push_phonetic_run(&mut self, run: PhoneticRun) {
        self.phonetic_runs.push(run);
    }

    pub fn set_phonetic_properties(&mut self, properties: PhoneticProperties) {
        self.phonetic_properties = Some(properties);
    }

    /// Text as stored, with Excel escapes still encoded.
    ///
    /// Phonetic runs are not part of the displayed text.
    pub fn raw_string(&self) -> String {
        let mut s = self.text.clone().unwrap_or_default();
        for run in &self.runs {
            s.push_str(&run.text);
        }
        s
    }

    /// Displayed text, with `_xHHHH_` escapes decoded
    pub fn string(&self) -> String {
        decode_excel_escapes(&self.raw_string())
    }

    /// Number of runs that carry their own formatting
    pub fn num_formatting_runs(&self) -> usize {
        self.runs.iter().filter(|r| r.properties.is_some()).count()
    }

    /// Apply a font to the whole text
    pub fn apply_font(&mut self, font: &FontStyle) {
        let len = self.raw_string().chars().count();
        self.restyle(0, len, font);
    }

    /// Apply a font to characters `start..end` (char indices of the raw text).
    ///
    /// Plain entries are converted to runs. Runs crossing the range boundary
    /// are split, keeping their original properties outside the range.
    pub fn apply_font_range(&mut self, start: usize, end: usize, font: &FontStyle) -> Result<()> {
        let len = self.raw_string().chars().count();
        if start > end || end > len {
            return Err(Error::InvalidRange { start, end, len });
        }
        self.restyle(start, end, font);
        Ok(())
    }

    /// `start..end` must lie within the raw text
    fn restyle(&mut self, start: usize, end: usize, font: &FontStyle) {
        if start == end {
            return;
        }

        let mut runs = std::mem::take(&mut self.runs);
        if let Some(text) = self.text.take() {
            runs.insert(
                0,
                TextRun {
                    properties: None,
                    text,
                },
            );
        }

        let properties = RunProperties::from_font(font);
        let mut split = Vec::with_capacity(runs.len() + 2);
        let mut pos = 0;

        for run in runs {
            let run_len = run.text.chars().count();
            let (run_start, run_end) = (pos, pos + run_len);
            pos = run_end;

            if run_len == 0 || run_end <= start || run_start >= end {
                split.push(run);
                continue;
            }

            let mid_start = start.max(run_start);
            let mid_end = end.min(run_end);

            if mid_start > run_start {
                split.push(TextRun {
                    properties: run.properties.clone(),
                    text: char_slice(&run.text, 0, mid_start - run_start),
                });
            }
            split.push(TextRun {
                properties: Some(properties.clone()),
                text: char_slice(&run.text, mid_start - run_start, mid_end - run_start),
            });
            if mid_end < run_end {
                split.push(TextRun {
                    properties: run.properties,
                    text: char_slice(&run.text, mid_end - run_start, run_len),
                });
            }
        }

        self.runs = split;
    }
}

impl From<&str> for RichText {
    fn from(s: &str) -> Self {
        RichText::new(s)
    }
}

impl From<String> for RichText {
    fn from(s: String) -> Self {
        RichText::new(s)
    }
}

impl TextRun {
    /// A run without its own formatting
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            properties: None,
            text: text.into(),
        }
    }

    /// A run with formatting
    pub fn styled<S: Into<String>>(text: S, properties: RunProperties) -> Self {
        Self {
            properties: Some(properties),
            text: text.into(),
        }
    }
}

impl RunProperties {
    /// Build run properties from a font, in schema order.
    pub fn from_font(font: &FontStyle) -> Self {
        let mut props = vec![RunProperty::Font(font.name.clone())];
        if font.bold {
            props.push(RunProperty::Bold(true));
        }
        if font.italic {
            props.push(RunProperty::Italic(true));
        }
        if font.strikethrough {
            props.push(RunProperty::Strike(true));
        }
        if !font.color.is_auto() {
            props.push(RunProperty::Color(font.color));
        }
        props.push(RunProperty::Size(font.size));
        if font.underline != Underline::None {
            props.push(RunProperty::Underline(font.underline));
        }
        if font.vertical_align != FontVerticalAlign::Baseline {
            props.push(RunProperty::VertAlign(font.vertical_align));
        }
        RunProperties(props)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunProperty> {
        self.0.iter()
    }

    pub fn is_bold(&self) -> bool {
        self.0.iter().any(|p| matches!(p, RunProperty::Bold(true)))
    }

    /// The `rFont` name, if set
    pub fn font_name(&self) -> Option<&str> {
        self.0.iter().find_map(|p| match p {
            RunProperty::Font(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

fn char_slice(s: &str, from: usize, to: usize) -> String {
    s.chars().skip(from).take(to - from).collect()
}
