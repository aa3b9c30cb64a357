//! End-to-end tests for shared strings tables (build -> write -> read -> verify)

use duke_sst::prelude::*;
use pretty_assertions::assert_eq;

const NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_STRICT: &str = "http://purl.oclc.org/ooxml/spreadsheetml/main";

const STRICT_PANGRAM_RUNS: [&str; 11] = [
    "The", " ", "quick", " ", "brown", " fox", " jumps", " over", " the", " lazy", " dog",
];

/// Every combination of backend and parse mode
fn configurations() -> Vec<(Backend, bool)> {
    vec![
        (Backend::Embedded, false),
        (Backend::Embedded, true),
        (Backend::FileBacked, false),
        (Backend::FileBacked, true),
    ]
}

fn new_table(backend: Backend, full_format: bool) -> SharedStringsTable {
    SharedStringsTable::builder()
        .backend(backend)
        .full_format(full_format)
        .build()
        .unwrap()
}

fn write_to_vec(table: &mut SharedStringsTable) -> Vec<u8> {
    let mut out = Vec::new();
    table.write_to(&mut out).unwrap();
    out
}

/// A document with 15 entries, 19 references and an 11-run last entry
fn strict_shared_strings() -> String {
    let words = [
        "Lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed",
        "do", "eiusmod", "tempor", "incididunt", "ut",
    ];
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{NS_STRICT}" count="19" uniqueCount="15">"#
    );
    for word in words {
        xml.push_str(&format!("<si><t>{word}</t></si>"));
    }
    xml.push_str("<si>");
    for (i, run) in STRICT_PANGRAM_RUNS.iter().enumerate() {
        let style = if i % 2 == 0 { "<b/>" } else { "<i/>" };
        xml.push_str(&format!(
            r#"<r><rPr>{style}<sz val="11"/><color theme="1"/><rFont val="Calibri"/><family val="2"/><scheme val="minor"/></rPr><t xml:space="preserve">{run}</t></r>"#
        ));
    }
    xml.push_str("</si></sst>");
    xml
}

const STYLED_SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="1" uniqueCount="1"><si><r><rPr><b/><sz val="11"/><color rgb="FFFF0000"/><rFont val="Calibri"/><family val="2"/><scheme val="minor"/></rPr><t xml:space="preserve">shared </t></r><r><rPr><i/><u/><sz val="11"/><color theme="1"/><rFont val="Calibri"/><family val="2"/><scheme val="minor"/></rPr><t>styled string</t></r></si></sst>"#;

/// A sheet-like document: 38 distinct strings referenced 60 times
fn city_shared_strings() -> String {
    let mut xml = format!(r#"<sst xmlns="{NS}" count="60" uniqueCount="38">"#);
    xml.push_str("<si><t>City</t></si>");
    for i in 1..38 {
        xml.push_str(&format!("<si><t>Town {i}</t></si>"));
    }
    xml.push_str("</sst>");
    xml
}

/// Insert a mix of plain and formatted duplicates, write out, read back
#[test]
fn test_write_out() {
    for (backend, full_format) in configurations() {
        let mut sst = new_table(backend, full_format);
        for _ in 0..3 {
            sst.add_shared_string_item("First string").unwrap();
        }
        for _ in 0..3 {
            sst.add_shared_string_item("Second string").unwrap();
        }
        let mut rts = RichText::new("Second string");
        rts.apply_font(&FontStyle::new().with_name("Arial").with_bold(true));
        sst.add_shared_string_item(rts.clone()).unwrap();

        assert_eq!(sst.unique_count(), 3);
        assert_eq!(sst.count(), 7);

        let out = write_to_vec(&mut sst);
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("<sst count=\"7\" uniqueCount=\"3\""));
        assert!(text.contains(NS));
        assert!(!text.contains("xml-fragment"));

        let mut sst2 = new_table(backend, full_format);
        sst2.read_from(&mut out.as_slice()).unwrap();
        assert_eq!(sst2.unique_count(), 3);
        assert_eq!(sst2.count(), 7);
        assert_eq!(sst2.get_at(0).unwrap().string(), "First string");
        assert_eq!(sst2.get_at(1).unwrap().string(), "Second string");
        assert_eq!(sst2.get_at(2).unwrap().string(), "Second string");

        let expected_runs = if full_format { 1 } else { 0 };
        assert_eq!(sst2.get_at(2).unwrap().num_formatting_runs(), expected_runs);
        if full_format {
            assert_eq!(sst2.get_at(2).unwrap(), rts);
        }

        sst.close().unwrap();
        sst2.close().unwrap();
    }
}

#[test]
fn test_read_xml() {
    for (backend, full_format) in configurations() {
        let mut sst = new_table(backend, full_format);
        let summary = sst.read_from(&mut city_shared_strings().as_bytes()).unwrap();
        assert_eq!(summary.entries, 38);
        assert!(!summary.unique_count_mismatch);
        assert_eq!(sst.count(), 60);
        assert_eq!(sst.unique_count(), 38);
        assert_eq!(sst.get_at(0).unwrap().string(), "City");
        assert_eq!(sst.get_at(37).unwrap().string(), "Town 37");
    }
}

#[test]
fn test_read_styled_xml() {
    for (backend, full_format) in configurations() {
        let mut sst = new_table(backend, full_format);
        sst.read_from(&mut STYLED_SHARED_STRINGS.as_bytes()).unwrap();
        assert_eq!(sst.count(), 1);
        assert_eq!(sst.unique_count(), 1);

        let entry = sst.get_at(0).unwrap();
        assert_eq!(entry.string(), "shared styled string");
        if full_format {
            assert_eq!(entry.num_formatting_runs(), 2);
            assert!(entry.runs()[0].properties.as_ref().unwrap().is_bold());
        } else {
            assert_eq!(entry.num_formatting_runs(), 0);
        }
    }
}

#[test]
fn test_read_ooxml_strict() {
    let xml = strict_shared_strings();
    for (backend, full_format) in configurations() {
        let mut sst = new_table(backend, full_format);
        let summary = sst.read_from(&mut xml.as_bytes()).unwrap();
        assert_eq!(summary.declared_unique_count, Some(15));
        assert!(!summary.unique_count_mismatch);

        assert_eq!(sst.unique_count(), 15);
        assert_eq!(sst.count(), 19);
        assert_eq!(sst.get_at(0).unwrap().string(), "Lorem");
        assert_eq!(
            sst.get_at(14).unwrap().string(),
            "The quick brown fox jumps over the lazy dog"
        );
        let expected_runs = if full_format { 11 } else { 0 };
        assert_eq!(sst.get_at(14).unwrap().num_formatting_runs(), expected_runs);
    }
}

#[test]
fn test_read_unique_count_mismatch() {
    let xml = format!(
        r#"<sst xmlns="{NS}" count="4" uniqueCount="5"><si><t>a</t></si><si><t>b</t></si><si><t>a</t></si></sst>"#
    );
    let mut sst = new_table(Backend::Embedded, false);
    let summary = sst.read_from(&mut xml.as_bytes()).unwrap();

    // The entries read win; the declared value is only reported
    assert!(summary.unique_count_mismatch);
    assert_eq!(summary.declared_unique_count, Some(5));
    assert_eq!(sst.unique_count(), 3);
    assert_eq!(sst.count(), 4);
    assert_eq!(sst.get_at(2).unwrap().string(), "a");
}

#[test]
fn test_read_keeps_positional_duplicates() {
    let xml = format!(
        r#"<sst xmlns="{NS}"><si><t>dup</t></si><si><t>other</t></si><si><t>dup</t></si></sst>"#
    );
    let mut sst = new_table(Backend::FileBacked, true);
    sst.read_from(&mut xml.as_bytes()).unwrap();
    assert_eq!(sst.unique_count(), 3);
    assert_eq!(sst.count(), 3);

    // Later deduplicating inserts resolve to the first position
    assert_eq!(sst.add_shared_string_item("dup").unwrap(), 0);
    assert_eq!(sst.add_shared_string_item("other").unwrap(), 1);
    assert_eq!(sst.unique_count(), 3);
    assert_eq!(sst.count(), 5);
}

#[test]
fn test_read_missing_entry() {
    for (backend, full_format) in configurations() {
        let mut sst = new_table(backend, full_format);
        assert!(matches!(sst.get_at(0), Err(SstError::NotFound(0))));
    }
}

#[test]
fn test_write() {
    for (backend, full_format) in configurations() {
        let mut sst = new_table(backend, full_format);
        for i in 0..10 {
            let s = format!("{:0>64}", format!("{:x}", (i as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)));
            sst.add_shared_string_item(s).unwrap();
        }
        let out = write_to_vec(&mut sst);
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(!text.contains("xml-fragment"));

        let mut sst2 = new_table(backend, full_format);
        sst2.read_from(&mut out.as_slice()).unwrap();
        assert_eq!(sst2.count(), 10);
    }
}

#[test]
fn test_special_characters_round_trip() {
    let samples = [
        "Special: <>&\"'",
        "Multi\nLine",
        "Carriage\r\nReturn",
        "  leading and trailing  ",
        "Unicode: \u{1F600} 東京",
        "Control \u{1} char",
        "Literal _x000D_ marker",
    ];
    for (backend, full_format) in configurations() {
        let mut sst = new_table(backend, full_format);
        for s in samples {
            sst.add_shared_string_item(s).unwrap();
        }
        let out = write_to_vec(&mut sst);

        let mut sst2 = new_table(backend, full_format);
        sst2.read_from(&mut out.as_slice()).unwrap();
        for (i, s) in samples.iter().enumerate() {
            assert_eq!(
                sst2.get_at(i as u32).unwrap().string(),
                RichText::new(*s).string(),
                "entry {i}"
            );
        }
    }
}

#[test]
fn test_encrypted_round_trip() {
    for backend in [Backend::Embedded, Backend::FileBacked] {
        let mut sst = SharedStringsTable::builder()
            .backend(backend)
            .encrypt_temp_files(true)
            .full_format(true)
            .build()
            .unwrap();
        let mut bold = RichText::new("confidential");
        bold.apply_font(&FontStyle::new().with_bold(true));

        assert_eq!(sst.add_shared_string_item("confidential").unwrap(), 0);
        assert_eq!(sst.add_entry(&bold, true).unwrap(), 1);
        assert_eq!(sst.add_shared_string_item("confidential").unwrap(), 0);
        assert_eq!(sst.get_at(1).unwrap(), bold);

        let out = write_to_vec(&mut sst);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("<si><t>confidential</t></si>"));
        assert_eq!(sst.count(), 3);
        assert_eq!(sst.unique_count(), 2);
    }
}

/// Write to a file, read it back with the other backend
#[test]
fn stress_test() {
    let limit = 100u32;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared-string-stress.xml");

    let mut sst = new_table(Backend::Embedded, true);
    for i in 0..limit {
        sst.add_shared_string_item(format!("entry-{i:08x}-{}", i.wrapping_mul(2_654_435_761)))
            .unwrap();
    }
    let mut file = std::fs::File::create(&path).unwrap();
    sst.write_to(&mut file).unwrap();
    drop(file);

    let mut sst2 = new_table(Backend::FileBacked, true);
    let mut file = std::fs::File::open(&path).unwrap();
    sst2.read_from(&mut file).unwrap();
    assert_eq!(sst2.unique_count(), limit);
    assert_eq!(sst2.count(), u64::from(limit));
    for i in (0..limit).step_by(7) {
        assert_eq!(sst2.get_at(i).unwrap(), sst.get_at(i).unwrap());
    }
}
