use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use duke_sst_core::RichText;

use super::engine::{RedbFile, STMAP};
use super::{EntryCodec, SstStore, StoreConfig, StoreError, StoreResult};
use crate::cache::{CacheStats, LazyLruCache};
use crate::scratch::ScratchFile;

const RECORDS_PREFIX: &str = "duke-sst-strings";
const STMAP_PREFIX: &str = "duke-sst-stmap";

/// Append-only file of length-prefixed records.
///
/// Each record is a little-endian `u32` byte length followed by the bytes.
/// Record offsets are kept in memory, one per index. A failed append may
/// leave part of a record behind, so the file refuses further use.
struct RecordFile {
    file: ScratchFile,
    writer: BufWriter<File>,
    reader: File,
    offsets: Vec<u64>,
    end: u64,
    unflushed: bool,
    broken: bool,
}

impl RecordFile {
    fn create(dir: Option<&Path>) -> io::Result<Self> {
        let file = ScratchFile::create(RECORDS_PREFIX, dir)?;
        let writer = BufWriter::new(file.reopen()?);
        let reader = file.reopen()?;
        Ok(Self {
            file,
            writer,
            reader,
            offsets: Vec::new(),
            end: 0,
            unflushed: false,
            broken: false,
        })
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn check_usable(&self) -> io::Result<()> {
        if self.broken {
            Err(io::Error::other(format!(
                "record file {} is unusable after a failed write",
                self.file.path().display()
            )))
        } else {
            Ok(())
        }
    }

    fn append(&mut self, record: &[u8]) -> io::Result<()> {
        self.check_usable()?;
        let len = u32::try_from(record.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record of {} bytes is too large", record.len()),
            )
        })?;
        let written = self
            .writer
            .write_all(&len.to_le_bytes())
            .and_then(|()| self.writer.write_all(record));
        if let Err(e) = written {
            self.broken = true;
            return Err(e);
        }
        self.offsets.push(self.end);
        self.end += 4 + u64::from(len);
        self.unflushed = true;
        Ok(())
    }

    fn read(&mut self, index: usize) -> io::Result<Option<Vec<u8>>> {
        self.check_usable()?;
        let Some(&offset) = self.offsets.get(index) else {
            return Ok(None);
        };
        if self.unflushed {
            if let Err(e) = self.writer.flush() {
                self.broken = true;
                return Err(e);
            }
            self.unflushed = false;
        }
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut len = [0u8; 4];
        self.reader.read_exact(&mut len)?;
        let mut record = vec![0u8; u32::from_le_bytes(len) as usize];
        self.reader.read_exact(&mut record)?;
        Ok(Some(record))
    }

    /// Close both handles and delete the file
    fn delete(mut self) -> io::Result<()> {
        // Buffered bytes are garbage once the file goes away
        let (handle, _) = self.writer.into_parts();
        drop(handle);
        drop(self.reader);
        self.file.delete()
    }
}

/// Entries in an append-only record file, dedup map in its own redb file.
///
/// Entries must be stored in index order starting at 0. Both files are
/// created on first use.
pub struct FileBackedStore {
    config: StoreConfig,
    codec: EntryCodec,
    records: Option<RecordFile>,
    stmap: Option<RedbFile>,
    cache: LazyLruCache<u32, RichText>,
    closed: bool,
}

impl FileBackedStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            codec: EntryCodec::new(config.encrypt),
            cache: LazyLruCache::new(config.cache_capacity),
            records: None,
            stmap: None,
            closed: false,
            config,
        }
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn records(&mut self) -> StoreResult<&mut RecordFile> {
        self.check_open()?;
        if self.records.is_none() {
            self.records = Some(RecordFile::create(self.config.temp_dir.as_deref())?);
        }
        self.records.as_mut().ok_or(StoreError::Closed)
    }

    fn stmap(&mut self) -> StoreResult<&mut RedbFile> {
        self.check_open()?;
        if self.stmap.is_none() {
            let mut engine = RedbFile::create(STMAP_PREFIX, self.config.temp_dir.as_deref())?;
            if let Err(e) = engine.init_table(STMAP) {
                if let Err(cleanup) = engine.close() {
                    log::warn!("Failed to clean up shared strings map: {}", cleanup);
                }
                return Err(e);
            }
            self.stmap = Some(engine);
        }
        self.stmap.as_mut().ok_or(StoreError::Closed)
    }
}

impl SstStore for FileBackedStore {
    fn put_indexed(&mut self, index: u32, entry: &RichText) -> StoreResult<()> {
        let bytes = self.codec.encode(entry)?;
        let records = self.records()?;
        let expected = records.len() as u32;
        if index != expected {
            return Err(StoreError::OutOfOrder {
                expected,
                actual: index,
            });
        }
        records.append(&bytes)?;
        Ok(())
    }

    fn get_indexed(&mut self, index: u32) -> StoreResult<Option<RichText>> {
        self.check_open()?;
        let Self {
            records,
            codec,
            cache,
            ..
        } = self;
        let Some(records) = records.as_mut() else {
            return Ok(None);
        };
        cache.get_or_fetch(index, |&index| {
            records
                .read(index as usize)?
                .map(|bytes| codec.decode(&bytes))
                .transpose()
        })
    }

    fn put_content_key(&mut self, key: &str, index: u32) -> StoreResult<()> {
        let key = self.codec.content_key(key).into_owned();
        self.stmap()?.put_key(&key, index)
    }

    fn get_content_key(&mut self, key: &str) -> StoreResult<Option<u32>> {
        self.check_open()?;
        match &self.stmap {
            Some(engine) => engine.get_key(&self.codec.content_key(key)),
            None => Ok(None),
        }
    }

    fn indices_from(&mut self, start: u32, limit: usize) -> StoreResult<Vec<u32>> {
        self.check_open()?;
        let len = self.records.as_ref().map_or(0, |r| r.len()) as u64;
        let end = len.min(u64::from(start).saturating_add(limit as u64));
        Ok((u64::from(start)..end).map(|i| i as u32).collect())
    }

    /// Every file is deleted even if an earlier step fails; the first
    /// failure is returned.
    fn close(&mut self) -> StoreResult<()> {
        self.closed = true;
        self.cache.clear();
        let mut first_error = None;

        if let Some(records) = self.records.take() {
            if let Err(e) = records.delete() {
                first_error.get_or_insert(StoreError::Io(e));
            }
        }
        if let Some(mut stmap) = self.stmap.take() {
            if let Err(e) = stmap.close() {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.cache.stats())
    }
}

impl Drop for FileBackedStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close shared strings store: {}", e);
        }
    }
}
