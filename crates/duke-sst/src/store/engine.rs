//! redb database living in a scratch file

use std::path::Path;

use redb::{
    Database, Durability, Key, ReadableTable, TableDefinition, Value, WriteTransaction,
};

use super::{StoreError, StoreResult};
use crate::scratch::ScratchFile;

/// `index -> stored entry bytes`
pub(super) const STRINGS: TableDefinition<'_, u32, &[u8]> = TableDefinition::new("strings");

/// `stored content key -> index`
pub(super) const STMAP: TableDefinition<'_, &[u8], u32> = TableDefinition::new("stmap");

/// Writes per commit of the open transaction
const COMMIT_EVERY: usize = 4096;

/// Inserts accumulate in one open write transaction that is committed every
/// [`COMMIT_EVERY`] writes. Lookups read through that transaction, so
/// uncommitted inserts are visible.
pub(super) struct RedbFile {
    // Dropped before `db`
    pending: Option<WriteTransaction>,
    db: Option<Database>,
    pending_writes: usize,
    file: ScratchFile,
}

impl RedbFile {
    /// Create the scratch file and an empty database in it.
    ///
    /// Nothing is left on disk if opening the database fails.
    pub fn create(prefix: &str, dir: Option<&Path>) -> StoreResult<Self> {
        let mut file = ScratchFile::create(prefix, dir)?;
        match Database::create(file.path()) {
            Ok(db) => Ok(Self {
                pending: None,
                db: Some(db),
                pending_writes: 0,
                file,
            }),
            Err(e) => {
                if let Err(cleanup) = file.delete() {
                    log::warn!(
                        "Failed to delete scratch file {}: {}",
                        file.path().display(),
                        cleanup
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Create the table so read transactions can open it before any insert
    pub fn init_table<K: Key + 'static, V: Value + 'static>(
        &mut self,
        table: TableDefinition<'_, K, V>,
    ) -> StoreResult<()> {
        self.write(|txn| {
            txn.open_table(table)?;
            Ok(())
        })?;
        self.commit()
    }

    /// Run `f` in the open write transaction, starting one if needed.
    ///
    /// Commits skip fsync; the file never outlives the process.
    pub fn write<T>(
        &mut self,
        f: impl FnOnce(&WriteTransaction) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let out = f(self.transaction()?)?;
        self.pending_writes += 1;
        if self.pending_writes >= COMMIT_EVERY {
            self.commit()?;
        }
        Ok(out)
    }

    /// Commit the open write transaction, if any
    pub fn commit(&mut self) -> StoreResult<()> {
        self.pending_writes = 0;
        if let Some(txn) = self.pending.take() {
            txn.commit()?;
        }
        Ok(())
    }

    pub fn put_entry(&mut self, index: u32, bytes: &[u8]) -> StoreResult<()> {
        self.write(|txn| {
            txn.open_table(STRINGS)?.insert(index, bytes)?;
            Ok(())
        })
    }

    pub fn get_entry(&self, index: u32) -> StoreResult<Option<Vec<u8>>> {
        match &self.pending {
            Some(txn) => entry_bytes(&txn.open_table(STRINGS)?, index),
            None => entry_bytes(&self.db()?.begin_read()?.open_table(STRINGS)?, index),
        }
    }

    pub fn entry_indices_from(&self, start: u32, limit: usize) -> StoreResult<Vec<u32>> {
        match &self.pending {
            Some(txn) => indices_from(&txn.open_table(STRINGS)?, start, limit),
            None => indices_from(
                &self.db()?.begin_read()?.open_table(STRINGS)?,
                start,
                limit,
            ),
        }
    }

    pub fn put_key(&mut self, key: &[u8], index: u32) -> StoreResult<()> {
        self.write(|txn| {
            txn.open_table(STMAP)?.insert(key, index)?;
            Ok(())
        })
    }

    pub fn get_key(&self, key: &[u8]) -> StoreResult<Option<u32>> {
        match &self.pending {
            Some(txn) => key_index(&txn.open_table(STMAP)?, key),
            None => key_index(&self.db()?.begin_read()?.open_table(STMAP)?, key),
        }
    }

    /// Drop the open transaction and the database handle, then delete the
    /// file.
    ///
    /// Uncommitted writes are discarded. The file is deleted even if the
    /// handle was already gone.
    pub fn close(&mut self) -> StoreResult<()> {
        self.pending_writes = 0;
        drop(self.pending.take());
        drop(self.db.take());
        self.file.delete()?;
        Ok(())
    }

    fn transaction(&mut self) -> StoreResult<&WriteTransaction> {
        if self.pending.is_none() {
            let mut txn = self.db()?.begin_write()?;
            txn.set_durability(Durability::None);
            self.pending = Some(txn);
        }
        self.pending.as_ref().ok_or(StoreError::Closed)
    }

    fn db(&self) -> StoreResult<&Database> {
        self.db.as_ref().ok_or(StoreError::Closed)
    }
}

fn entry_bytes(
    table: &impl ReadableTable<u32, &'static [u8]>,
    index: u32,
) -> StoreResult<Option<Vec<u8>>> {
    Ok(table.get(index)?.map(|v| v.value().to_vec()))
}

fn indices_from(
    table: &impl ReadableTable<u32, &'static [u8]>,
    start: u32,
    limit: usize,
) -> StoreResult<Vec<u32>> {
    let mut indices = Vec::with_capacity(limit.min(1024));
    for entry in table.range(start..)?.take(limit) {
        let (index, _) = entry?;
        indices.push(index.value());
    }
    Ok(indices)
}

fn key_index(
    table: &impl ReadableTable<&'static [u8], u32>,
    key: &[u8],
) -> StoreResult<Option<u32>> {
    Ok(table.get(key)?.map(|v| v.value()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(dir: &Path) -> RedbFile {
        let mut engine = RedbFile::create("duke-sst-test", Some(dir)).unwrap();
        engine.init_table(STRINGS).unwrap();
        engine.init_table(STMAP).unwrap();
        engine
    }

    #[test]
    fn test_entries_are_ordered_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path());

        for index in [2u32, 0, 1, 3] {
            engine.put_entry(index, format!("entry {index}").as_bytes()).unwrap();
        }

        assert_eq!(engine.get_entry(1).unwrap().as_deref(), Some(&b"entry 1"[..]));
        assert_eq!(engine.get_entry(4).unwrap(), None);
        assert_eq!(engine.entry_indices_from(0, 10).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(engine.entry_indices_from(1, 2).unwrap(), vec![1, 2]);
        assert!(engine.entry_indices_from(4, 10).unwrap().is_empty());
    }

    #[test]
    fn test_content_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path());

        engine.put_key(b"<si><t>a</t></si>", 0).unwrap();
        assert_eq!(engine.get_key(b"<si><t>a</t></si>").unwrap(), Some(0));
        assert_eq!(engine.get_key(b"<si><t>b</t></si>").unwrap(), None);
    }

    #[test]
    fn test_close_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path());
        engine.put_entry(0, b"x").unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        engine.close().unwrap();
        engine.close().unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(matches!(engine.get_entry(0), Err(StoreError::Closed)));
    }

    #[test]
    fn test_uncommitted_writes_are_visible() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path());

        engine.put_entry(0, b"a").unwrap();
        engine.put_key(b"a", 0).unwrap();
        assert_eq!(engine.get_entry(0).unwrap().as_deref(), Some(&b"a"[..]));
        assert_eq!(engine.get_key(b"a").unwrap(), Some(0));

        engine.commit().unwrap();
        assert_eq!(engine.get_entry(0).unwrap().as_deref(), Some(&b"a"[..]));
        assert_eq!(engine.entry_indices_from(0, 10).unwrap(), vec![0]);

        engine.put_entry(1, b"b").unwrap();
        assert_eq!(engine.entry_indices_from(0, 10).unwrap(), vec![0, 1]);
        assert_eq!(engine.get_key(b"a").unwrap(), Some(0));
    }

    #[test]
    fn test_writes_span_commits() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path());

        let total = COMMIT_EVERY as u32 * 2 + 10;
        for index in 0..total {
            engine.put_entry(index, &index.to_le_bytes()).unwrap();
            engine.put_key(&index.to_be_bytes(), index).unwrap();
        }

        assert_eq!(engine.entry_indices_from(0, usize::MAX).unwrap().len(), total as usize);
        for index in [0, COMMIT_EVERY as u32 - 1, COMMIT_EVERY as u32, total - 1] {
            assert_eq!(engine.get_entry(index).unwrap(), Some(index.to_le_bytes().to_vec()));
            assert_eq!(engine.get_key(&index.to_be_bytes()).unwrap(), Some(index));
        }
    }
}
