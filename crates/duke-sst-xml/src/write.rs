//! `<si>` writer.
//!
//! Entries are written without a namespace declaration; the enclosing
//! `<sst>` root declares the SpreadsheetML namespace as the default one, so
//! an entry looks the same whether it was built in memory or read back
//! from a file.

use duke_sst_core::escape::encode_excel_escapes;
use duke_sst_core::{Color, RichText, RunProperties, RunProperty, Underline};

/// Canonical serialized form of an entry.
///
/// Two entries are the same shared string exactly when this form is equal.
pub fn to_xml(text: &RichText) -> String {
    let mut out = String::with_capacity(text.raw_string().len() + 16);
    write_rich_text(&mut out, text);
    out
}

/// Append the `<si>` element for an entry
pub fn write_rich_text(out: &mut String, text: &RichText) {
    out.push_str("<si>");

    if let Some(t) = text.text() {
        write_t(out, t);
    }

    for run in text.runs() {
        out.push_str("<r>");
        if let Some(props) = &run.properties {
            write_run_properties(out, props);
        }
        write_t(out, &run.text);
        out.push_str("</r>");
    }

    for ph in text.phonetic_runs() {
        out.push_str(&format!("<rPh sb=\"{}\" eb=\"{}\">", ph.start, ph.end));
        write_t(out, &ph.text);
        out.push_str("</rPh>");
    }

    if let Some(pp) = text.phonetic_properties() {
        out.push_str(&format!("<phoneticPr fontId=\"{}\"", pp.font_id));
        if let Some(kind) = &pp.kind {
            out.push_str(&format!(" type=\"{}\"", escape_xml(kind)));
        }
        if let Some(alignment) = &pp.alignment {
            out.push_str(&format!(" alignment=\"{}\"", escape_xml(alignment)));
        }
        out.push_str("/>");
    }

    out.push_str("</si>");
}

/// Escape text for element content or attribute values.
///
/// CR is written as a character reference so parsers do not normalize it
/// to LF; control characters XML 1.0 cannot carry become `_xHHHH_`.
pub fn escape_xml(s: &str) -> String {
    let s = encode_excel_escapes(s);
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_t(out: &mut String, text: &str) {
    if text.is_empty() {
        out.push_str("<t/>");
        return;
    }
    let is_xml_space = |c: char| matches!(c, ' ' | '\t' | '\n' | '\r');
    if text.starts_with(is_xml_space) || text.ends_with(is_xml_space) {
        out.push_str("<t xml:space=\"preserve\">");
    } else {
        out.push_str("<t>");
    }
    out.push_str(&escape_xml(text));
    out.push_str("</t>");
}

fn write_run_properties(out: &mut String, props: &RunProperties) {
    out.push_str("<rPr>");
    for prop in props.iter() {
        match prop {
            RunProperty::Font(name) => {
                out.push_str(&format!("<rFont val=\"{}\"/>", escape_xml(name)));
            }
            RunProperty::Charset(v) => out.push_str(&format!("<charset val=\"{}\"/>", v)),
            RunProperty::Family(v) => out.push_str(&format!("<family val=\"{}\"/>", v)),
            RunProperty::Bold(v) => write_flag(out, "b", *v),
            RunProperty::Italic(v) => write_flag(out, "i", *v),
            RunProperty::Strike(v) => write_flag(out, "strike", *v),
            RunProperty::Outline(v) => write_flag(out, "outline", *v),
            RunProperty::Shadow(v) => write_flag(out, "shadow", *v),
            RunProperty::Condense(v) => write_flag(out, "condense", *v),
            RunProperty::Extend(v) => write_flag(out, "extend", *v),
            RunProperty::Color(color) => write_color(out, "color", color),
            RunProperty::Size(size) => out.push_str(&format!("<sz val=\"{}\"/>", size)),
            RunProperty::Underline(Underline::Single) => out.push_str("<u/>"),
            RunProperty::Underline(u) => {
                out.push_str(&format!("<u val=\"{}\"/>", u.as_str()));
            }
            RunProperty::VertAlign(v) => {
                out.push_str(&format!("<vertAlign val=\"{}\"/>", v.as_str()));
            }
            RunProperty::Scheme(s) => out.push_str(&format!("<scheme val=\"{}\"/>", s.as_str())),
        }
    }
    out.push_str("</rPr>");
}

fn write_flag(out: &mut String, tag: &str, value: bool) {
    if value {
        out.push_str(&format!("<{tag}/>"));
    } else {
        out.push_str(&format!("<{tag} val=\"0\"/>"));
    }
}

fn write_color(out: &mut String, tag: &str, color: &Color) {
    match color {
        Color::Auto => out.push_str(&format!("<{tag} auto=\"1\"/>")),
        Color::Rgb { .. } | Color::Argb { .. } => {
            let hex = color.to_argb_hex().unwrap_or_default();
            out.push_str(&format!("<{tag} rgb=\"{hex}\"/>"));
        }
        Color::Indexed(i) => out.push_str(&format!("<{tag} indexed=\"{i}\"/>")),
        Color::Theme { index, tint } => {
            if *tint == 0.0 {
                out.push_str(&format!("<{tag} theme=\"{index}\"/>"));
            } else {
                out.push_str(&format!("<{tag} theme=\"{index}\" tint=\"{tint}\"/>"));
            }
        }
    }
}
