//! Loading the shared strings part of an XLSX package

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use duke_sst_xml::SHARED_STRINGS_CONTENT_TYPE;

use crate::error::{SstError, SstResult};
use crate::options::TableOptions;
use crate::table::SharedStringsTable;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Name of the part declared with the shared strings content type.
///
/// Looks at the `Override` entries of `[Content_Types].xml`. Returns the
/// zip entry name (no leading `/`), or `None` if no part is declared.
pub fn find_shared_strings_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> SstResult<Option<String>> {
    let file = archive
        .by_name(CONTENT_TYPES_PART)
        .map_err(|_| SstError::MissingPart(CONTENT_TYPES_PART.into()))?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Override" => {
                let mut part_name = None;
                let mut content_type = None;
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"PartName" => part_name = Some(value),
                        b"ContentType" => content_type = Some(value),
                        _ => {}
                    }
                }
                if content_type.as_deref() == Some(SHARED_STRINGS_CONTENT_TYPE) {
                    if let Some(name) = part_name {
                        return Ok(Some(name.trim_start_matches('/').to_string()));
                    }
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

impl SharedStringsTable {
    /// Build a table and fill it from the shared strings part of a package.
    ///
    /// A package without a shared strings part yields an empty table.
    pub fn from_package<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        options: TableOptions,
    ) -> SstResult<Self> {
        let mut table = Self::with_options(options)?;
        let Some(part) = find_shared_strings_part(archive)? else {
            log::debug!("Package declares no shared strings part");
            return Ok(table);
        };
        let mut file = archive
            .by_name(&part)
            .map_err(|_| SstError::MissingPart(part.clone()))?;
        let summary = table.read_from(&mut file)?;
        log::debug!("Read {} shared strings from {}", summary.entries, part);
        Ok(table)
    }

    /// Open an XLSX file and load its shared strings
    pub fn open_package<P: AsRef<Path>>(path: P, options: TableOptions) -> SstResult<Self> {
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        Self::from_package(&mut archive, options)
    }
}
