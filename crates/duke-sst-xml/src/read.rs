//! `<si>` readers.
//!
//! Element and attribute names are matched on their local part, so both
//! transitional files (default namespace) and strict or prefixed files
//! (`<x:si>`) are accepted.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::Writer;

use crate::error::{XmlError, XmlResult};
use duke_sst_core::{
    Color, FontScheme, FontVerticalAlign, PhoneticProperties, PhoneticRun, RichText,
    RunProperties, RunProperty, TextRun, Underline,
};

/// Read the literal text of an `<si>` whose start tag was just consumed.
///
/// Concatenates `<t>` content of the entry and of its runs; phonetic
/// (`<rPh>`) text and all formatting are skipped. Consumes events up to and
/// including the matching end tag.
pub fn read_plain_text<B: BufRead>(reader: &mut Reader<B>, buf: &mut Vec<u8>) -> XmlResult<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    let mut in_t = false;
    let mut phonetic_depth = 0usize;

    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Start(e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"t" => in_t = phonetic_depth == 0,
                    b"rPh" => phonetic_depth += 1,
                    _ => {}
                }
            }
            Event::End(e) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                match e.local_name().as_ref() {
                    b"t" => in_t = false,
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    _ => {}
                }
            }
            Event::Text(e) if in_t => text.push_str(&e.unescape()?),
            Event::CData(e) if in_t => text.push_str(&String::from_utf8(e.into_inner().into_owned())?),
            Event::Eof => return Err(XmlError::UnexpectedEof("si".into())),
            _ => {}
        }
    }

    Ok(text)
}

/// Buffer an element whose start tag was just consumed, as markup.
///
/// Re-emits `start` and every following event up to and including the
/// matching end tag. Text keeps its original escaping, so the captured
/// markup parses to the same content as the source.
pub fn capture_element<B: BufRead>(
    reader: &mut Reader<B>,
    start: &BytesStart<'_>,
    buf: &mut Vec<u8>,
) -> XmlResult<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(start.borrow()))?;
    let mut depth = 0usize;

    loop {
        buf.clear();
        let event = reader.read_event_into(buf)?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => {
                writer.write_event(&event)?;
                break;
            }
            Event::End(_) => depth -= 1,
            Event::Eof => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                return Err(XmlError::UnexpectedEof(name));
            }
            _ => {}
        }
        writer.write_event(&event)?;
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

/// Parse a complete `<si>` element, formatting included.
pub fn parse_rich_text(markup: &str) -> XmlResult<RichText> {
    let mut reader = Reader::from_str(markup);

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => break,
            Event::Empty(e) if e.local_name().as_ref() == b"si" => return Ok(RichText::new("")),
            Event::Start(e) | Event::Empty(e) => {
                return Err(XmlError::Parse(format!(
                    "expected <si>, found <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Event::Eof => return Err(XmlError::UnexpectedEof("si".into())),
            _ => {}
        }
    }

    let mut entry = RichText::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"t" => entry.set_text(read_t(&mut reader)?),
                b"r" => entry.push_run(read_run(&mut reader)?),
                b"rPh" => {
                    let (start, end) = phonetic_bounds(&e);
                    let text = read_phonetic_text(&mut reader)?;
                    entry.push_phonetic_run(PhoneticRun { start, end, text });
                }
                b"phoneticPr" => {
                    entry.set_phonetic_properties(phonetic_properties(&e));
                    reader.read_to_end(e.name())?;
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"t" => entry.set_text(""),
                b"r" => entry.push_run(TextRun::plain("")),
                b"rPh" => {
                    let (start, end) = phonetic_bounds(&e);
                    entry.push_phonetic_run(PhoneticRun {
                        start,
                        end,
                        text: String::new(),
                    });
                }
                b"phoneticPr" => entry.set_phonetic_properties(phonetic_properties(&e)),
                _ => {}
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("si".into())),
            _ => {}
        }
    }

    Ok(entry)
}

/// Text content of a `<t>` whose start tag was just consumed
fn read_t(reader: &mut Reader<&[u8]>) -> XmlResult<String> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8(e.into_inner().into_owned())?),
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("t".into())),
            _ => {}
        }
    }
    Ok(text)
}

fn read_run(reader: &mut Reader<&[u8]>) -> XmlResult<TextRun> {
    let mut run = TextRun::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"rPr" => run.properties = Some(read_run_properties(reader)?),
                b"t" => run.text = read_t(reader)?,
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"rPr" => run.properties = Some(RunProperties::default()),
                b"t" => run.text.clear(),
                _ => {}
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("r".into())),
            _ => {}
        }
    }
    Ok(run)
}

fn read_run_properties(reader: &mut Reader<&[u8]>) -> XmlResult<RunProperties> {
    let mut props = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Empty(e) => props.extend(run_property(&e)),
            Event::Start(e) => {
                props.extend(run_property(&e));
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("rPr".into())),
            _ => {}
        }
    }
    Ok(RunProperties(props))
}

fn read_phonetic_text(reader: &mut Reader<&[u8]>) -> XmlResult<String> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => text.push_str(&read_t(reader)?),
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("rPh".into())),
            _ => {}
        }
    }
    Ok(text)
}

/// Map one `<rPr>` child to a property; unknown children are dropped.
fn run_property(e: &BytesStart<'_>) -> Option<RunProperty> {
    let val = attr_value(e, b"val");
    Some(match e.local_name().as_ref() {
        b"rFont" => RunProperty::Font(val?),
        b"charset" => RunProperty::Charset(val?.parse().ok()?),
        b"family" => RunProperty::Family(val?.parse().ok()?),
        b"b" => RunProperty::Bold(flag(val)),
        b"i" => RunProperty::Italic(flag(val)),
        b"strike" => RunProperty::Strike(flag(val)),
        b"outline" => RunProperty::Outline(flag(val)),
        b"shadow" => RunProperty::Shadow(flag(val)),
        b"condense" => RunProperty::Condense(flag(val)),
        b"extend" => RunProperty::Extend(flag(val)),
        b"color" => RunProperty::Color(parse_color_attrs(e)),
        b"sz" => RunProperty::Size(val?.parse().ok()?),
        b"u" => RunProperty::Underline(val.map_or(Underline::Single, |v| Underline::from_val(&v))),
        b"vertAlign" => RunProperty::VertAlign(FontVerticalAlign::from_val(&val?)?),
        b"scheme" => RunProperty::Scheme(FontScheme::from_val(&val?)?),
        _ => return None,
    })
}

/// Boolean property: a bare element means true
fn flag(val: Option<String>) -> bool {
    !matches!(val.as_deref(), Some("0") | Some("false"))
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn parse_color_attrs(e: &BytesStart<'_>) -> Color {
    // Priority: rgb > theme > indexed > auto
    if let Some(color) = attr_value(e, b"rgb").and_then(|rgb| Color::from_hex(&rgb)) {
        return color;
    }

    if let Some(index) = attr_value(e, b"theme").and_then(|s| s.parse::<u32>().ok()) {
        let tint = attr_value(e, b"tint")
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);
        return Color::Theme { index, tint };
    }

    if let Some(i) = attr_value(e, b"indexed").and_then(|s| s.parse::<u32>().ok()) {
        return Color::Indexed(i);
    }

    Color::Auto
}

fn phonetic_bounds(e: &BytesStart<'_>) -> (u32, u32) {
    let parse = |name: &[u8]| {
        attr_value(e, name)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0)
    };
    (parse(b"sb"), parse(b"eb"))
}

fn phonetic_properties(e: &BytesStart<'_>) -> PhoneticProperties {
    PhoneticProperties {
        font_id: attr_value(e, b"fontId")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        kind: attr_value(e, b"type"),
        alignment: attr_value(e, b"alignment"),
    }
}
