//! The shared strings table

use std::io::{BufReader, BufWriter, Read, Write};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use duke_sst_core::RichText;
use duke_sst_xml::{
    capture_element, parse_rich_text, read_plain_text, to_xml, write_rich_text, NS_SPREADSHEETML,
};

use crate::error::{SstError, SstResult};
use crate::store::SstStore;

/// Number of indices fetched from the store per step while writing
const WRITE_BATCH: usize = 256;

/// Operations every shared strings table offers
pub trait StringTable {
    /// Intern an entry, returning its index
    fn add_entry(&mut self, entry: &RichText, dedup: bool) -> SstResult<u32>;

    /// Entry at `index`
    fn get_at(&mut self, index: u32) -> SstResult<RichText>;

    /// Total number of references recorded, duplicates included
    fn count(&self) -> u64;

    /// Number of distinct entries stored
    fn unique_count(&self) -> u32;

    /// Every entry at once
    fn shared_string_items(&mut self) -> SstResult<Vec<RichText>>;

    /// Load an `<sst>` document
    fn read_from(&mut self, source: &mut dyn Read) -> SstResult<ReadSummary>;

    /// Serialize the table as an `<sst>` document
    fn write_to(&mut self, sink: &mut dyn Write) -> SstResult<()>;

    /// Release backing storage
    fn close(&mut self) -> SstResult<()>;
}

/// What [`SharedStringsTable::read_from`] found in a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// Number of `<si>` entries read
    pub entries: u32,
    /// `count` attribute of the root, if present and valid
    pub declared_count: Option<u64>,
    /// `uniqueCount` attribute of the root, if present and valid
    pub declared_unique_count: Option<u32>,
    /// Declared `uniqueCount` disagreed with the entries actually stored
    pub unique_count_mismatch: bool,
}

/// Shared strings table whose entries live in a disk-backed store.
///
/// Indices are dense and assigned in insertion order starting at 0. With
/// deduplication, equal entries (by canonical `<si>` markup) share one
/// index; a table read from a document keeps duplicates where they are.
///
/// ```rust,no_run
/// use duke_sst::{RichText, SharedStringsTable};
///
/// let mut table = SharedStringsTable::builder().build()?;
/// let first = table.add_shared_string_item("First string")?;
/// assert_eq!(table.add_shared_string_item("First string")?, first);
/// assert_eq!(table.get_at(first)?, RichText::new("First string"));
///
/// let mut out = Vec::new();
/// table.write_to(&mut out)?;
/// table.close()?;
/// # Ok::<(), duke_sst::SstError>(())
/// ```
pub struct SharedStringsTable {
    store: Box<dyn SstStore>,
    full_format: bool,
    count: u64,
    unique_count: u32,
}

impl SharedStringsTable {
    /// Wrap a store. `full_format` keeps formatting when reading documents.
    pub fn with_store(store: Box<dyn SstStore>, full_format: bool) -> Self {
        Self {
            store,
            full_format,
            count: 0,
            unique_count: 0,
        }
    }

    /// Whether documents are read with formatting
    pub fn full_format(&self) -> bool {
        self.full_format
    }

    /// Intern an entry.
    ///
    /// With `dedup`, an entry whose canonical markup was seen before gets the
    /// earlier index back. Without it, the entry always gets a new index.
    /// Either way `count` goes up by one.
    ///
    /// An entry whose dedup key could not be stored still keeps its index
    /// and is counted; later duplicates of it get fresh indices.
    pub fn add_entry(&mut self, entry: &RichText, dedup: bool) -> SstResult<u32> {
        if entry.is_absent() {
            return Err(SstError::InvalidArgument(
                "shared string entry has no text and no runs".into(),
            ));
        }
        let key = to_xml(entry);

        if dedup {
            if let Some(index) = self.store.get_content_key(&key)? {
                self.count += 1;
                return Ok(index);
            }
        }

        let index = self.unique_count;
        let next = index
            .checked_add(1)
            .ok_or_else(|| SstError::InvalidArgument("shared strings table is full".into()))?;

        // The entry goes in first: a key must never point at an empty index
        self.store.put_indexed(index, entry)?;
        self.unique_count = next;
        self.count += 1;

        // The map keeps the first index that produced a key
        if dedup || !self.store.contains_content_key(&key)? {
            self.store.put_content_key(&key, index)?;
        }
        Ok(index)
    }

    /// Intern an entry with deduplication
    pub fn add_shared_string_item<T: Into<RichText>>(&mut self, entry: T) -> SstResult<u32> {
        self.add_entry(&entry.into(), true)
    }

    /// Entry at `index`, or [`SstError::NotFound`]
    pub fn get_at(&mut self, index: u32) -> SstResult<RichText> {
        self.store.get_indexed(index)?.ok_or(SstError::NotFound(index))
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn unique_count(&self) -> u32 {
        self.unique_count
    }

    /// Not offered: entries live on disk. Use [`get_at`](Self::get_at) or
    /// [`write_to`](Self::write_to).
    pub fn shared_string_items(&mut self) -> SstResult<Vec<RichText>> {
        Err(SstError::UnsupportedOperation(
            "listing all shared strings; use get_at or write_to",
        ))
    }

    /// Entry cache statistics of the store, if it caches
    pub fn cache_stats(&self) -> Option<crate::cache::CacheStats> {
        self.store.cache_stats()
    }

    /// Load an `<sst>` document, appending its entries without deduplication.
    ///
    /// The `count` attribute, when valid, replaces the reference counter.
    /// `uniqueCount` is only checked against the entries stored; a mismatch
    /// is logged and flagged in the summary. The source is not closed.
    pub fn read_from<R: Read + ?Sized>(&mut self, source: &mut R) -> SstResult<ReadSummary> {
        let mut reader = Reader::from_reader(BufReader::new(source));
        let mut buf = Vec::new();
        let mut entry_buf = Vec::new();
        let mut summary = ReadSummary::default();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sst" => {
                    read_header(&e, &mut summary);
                }
                Event::Start(e) if e.local_name().as_ref() == b"si" => {
                    let entry = if self.full_format {
                        let markup = capture_element(&mut reader, &e, &mut entry_buf)?;
                        parse_rich_text(&markup)?
                    } else {
                        RichText::new(read_plain_text(&mut reader, &mut entry_buf)?)
                    };
                    self.add_entry(&entry, false)?;
                    summary.entries += 1;
                }
                Event::Empty(e) if e.local_name().as_ref() == b"si" => {
                    self.add_entry(&RichText::new(""), false)?;
                    summary.entries += 1;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(count) = summary.declared_count {
            self.count = count;
        }
        if let Some(declared) = summary.declared_unique_count {
            if declared != self.unique_count {
                log::warn!(
                    "Shared strings table declares uniqueCount={} but {} unique entries were read; \
                     cell references may not resolve",
                    declared,
                    self.unique_count
                );
                summary.unique_count_mismatch = true;
            }
        }

        Ok(summary)
    }

    /// Serialize as an `<sst>` document, entries in index order.
    ///
    /// The sink is flushed but not closed.
    pub fn write_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> SstResult<()> {
        let mut out = BufWriter::new(sink);
        write!(
            out,
            "<sst count=\"{}\" uniqueCount=\"{}\" xmlns=\"{}\">",
            self.count, self.unique_count, NS_SPREADSHEETML
        )?;

        let mut markup = String::new();
        let mut next = 0u32;
        loop {
            let batch = self.store.indices_from(next, WRITE_BATCH)?;
            let Some(&last) = batch.last() else {
                break;
            };
            for index in batch {
                match self.store.get_indexed(index)? {
                    Some(entry) => {
                        markup.clear();
                        write_rich_text(&mut markup, &entry);
                        out.write_all(markup.as_bytes())?;
                    }
                    None => log::warn!("No shared string stored at index {}, skipping", index),
                }
            }
            match last.checked_add(1) {
                Some(n) => next = n,
                None => break,
            }
        }

        out.write_all(b"</sst>")?;
        out.flush()?;
        Ok(())
    }

    /// Release the store and delete its scratch files. Idempotent.
    pub fn close(&mut self) -> SstResult<()> {
        self.store.close()?;
        Ok(())
    }
}

/// Pick up `count` and `uniqueCount`; bad values are logged and ignored
fn read_header(e: &BytesStart<'_>, summary: &mut ReadSummary) {
    for attr in e.attributes().flatten() {
        let name = attr.key.local_name();
        let name = name.as_ref();
        if name != b"count" && name != b"uniqueCount" {
            continue;
        }
        let value = match attr.unescape_value() {
            Ok(v) => v,
            Err(err) => {
                log::warn!("Unreadable shared strings attribute: {}", err);
                continue;
            }
        };
        match value.trim().parse::<i64>() {
            Ok(n) if n < 0 => log::warn!("Ignoring negative shared strings count: {}", n),
            Ok(n) if name == b"count" => summary.declared_count = Some(n as u64),
            Ok(n) => match u32::try_from(n) {
                Ok(n) => summary.declared_unique_count = Some(n),
                Err(_) => log::warn!("Ignoring out of range uniqueCount: {}", n),
            },
            Err(err) => log::warn!(
                "Failed to parse shared strings attribute {:?}: {}",
                value,
                err
            ),
        }
    }
}

impl StringTable for SharedStringsTable {
    fn add_entry(&mut self, entry: &RichText, dedup: bool) -> SstResult<u32> {
        SharedStringsTable::add_entry(self, entry, dedup)
    }

    fn get_at(&mut self, index: u32) -> SstResult<RichText> {
        SharedStringsTable::get_at(self, index)
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn unique_count(&self) -> u32 {
        self.unique_count
    }

    fn shared_string_items(&mut self) -> SstResult<Vec<RichText>> {
        SharedStringsTable::shared_string_items(self)
    }

    fn read_from(&mut self, source: &mut dyn Read) -> SstResult<ReadSummary> {
        SharedStringsTable::read_from(self, source)
    }

    fn write_to(&mut self, sink: &mut dyn Write) -> SstResult<()> {
        SharedStringsTable::write_to(self, sink)
    }

    fn close(&mut self) -> SstResult<()> {
        SharedStringsTable::close(self)
    }
}

impl std::fmt::Debug for SharedStringsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStringsTable")
            .field("full_format", &self.full_format)
            .field("count", &self.count)
            .field("unique_count", &self.unique_count)
            .finish_non_exhaustive()
    }
}
