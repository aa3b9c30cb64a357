//! Scratch file lifecycle and cache behavior

use std::path::Path;

use duke_sst::prelude::*;

fn scratch_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn table_in(dir: &Path, backend: Backend, encrypt: bool) -> SharedStringsTable {
    SharedStringsTable::builder()
        .backend(backend)
        .encrypt_temp_files(encrypt)
        .temp_dir(dir)
        .build()
        .unwrap()
}

#[test]
fn test_files_created_lazily_and_deleted_on_close() {
    for (backend, expected_files) in [(Backend::Embedded, 1), (Backend::FileBacked, 2)] {
        let dir = tempfile::tempdir().unwrap();
        let mut sst = table_in(dir.path(), backend, false);
        assert!(scratch_files(dir.path()).is_empty());

        sst.add_shared_string_item("a").unwrap();
        let files = scratch_files(dir.path());
        assert_eq!(files.len(), expected_files, "{backend}");
        assert!(files
            .iter()
            .all(|f| f.starts_with("duke-sst-") && f.ends_with(".tmp")));

        sst.close().unwrap();
        assert!(scratch_files(dir.path()).is_empty());

        // Closing again is harmless
        sst.close().unwrap();
    }
}

#[test]
fn test_drop_deletes_files() {
    for backend in [Backend::Embedded, Backend::FileBacked] {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut sst = table_in(dir.path(), backend, true);
            sst.add_shared_string_item("a").unwrap();
            sst.add_shared_string_item("b").unwrap();
        }
        assert!(scratch_files(dir.path()).is_empty());
    }
}

#[test]
fn test_operations_after_close_fail() {
    let dir = tempfile::tempdir().unwrap();
    let mut sst = table_in(dir.path(), Backend::Embedded, false);
    sst.add_shared_string_item("a").unwrap();
    sst.close().unwrap();

    let err = sst.add_shared_string_item("b").unwrap_err();
    assert!(err.is_io_failure());
    assert!(sst.get_at(0).unwrap_err().is_io_failure());
}

#[test]
fn test_unusable_temp_dir_reports_io_failure() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    for backend in [Backend::Embedded, Backend::FileBacked] {
        let mut sst = table_in(&missing, backend, false);
        let err = sst.add_shared_string_item("a").unwrap_err();
        assert!(err.is_io_failure(), "{err}");
        assert_eq!(sst.count(), 0);
        assert_eq!(sst.unique_count(), 0);
        sst.close().unwrap();
    }
}

#[test]
fn test_encrypted_scratch_files_hold_no_plaintext() {
    let secret = "account number 1234-5678-9012";
    for backend in [Backend::Embedded, Backend::FileBacked] {
        let dir = tempfile::tempdir().unwrap();
        let mut sst = table_in(dir.path(), backend, true);
        for _ in 0..50 {
            sst.add_shared_string_item(secret).unwrap();
        }
        assert_eq!(sst.get_at(0).unwrap().string(), secret);

        for name in scratch_files(dir.path()) {
            let bytes = std::fs::read(dir.path().join(&name)).unwrap();
            assert!(
                !bytes.windows(secret.len()).any(|w| w == secret.as_bytes()),
                "{name} contains plaintext"
            );
        }
        sst.close().unwrap();
    }
}

/// Lookups return the same entries whatever the cache size
#[test]
fn test_cache_transparency() {
    let entries: Vec<String> = (0..40).map(|i| format!("value {}", i % 25)).collect();
    let lookups: Vec<u32> = (0..200u32).map(|i| (i * 7 + i / 3) % 25).collect();

    let mut baseline: Option<Vec<RichText>> = None;
    for backend in [Backend::Embedded, Backend::FileBacked] {
        for capacity in [1, 2, 3, 10, 100] {
            let mut sst = SharedStringsTable::builder()
                .backend(backend)
                .cache_capacity(capacity)
                .build()
                .unwrap();
            for e in &entries {
                sst.add_shared_string_item(e.as_str()).unwrap();
            }
            assert_eq!(sst.unique_count(), 25);

            let results: Vec<RichText> = lookups.iter().map(|&i| sst.get_at(i).unwrap()).collect();
            match &baseline {
                Some(expected) => assert_eq!(&results, expected, "{backend} capacity {capacity}"),
                None => baseline = Some(results),
            }

            let stats = sst.cache_stats().unwrap();
            assert!(stats.size <= capacity);
            assert_eq!(stats.hits + stats.misses, lookups.len() as u64);
        }
    }
}

#[test]
fn test_trait_object_backends_are_interchangeable() {
    let mut tables: Vec<Box<dyn StringTable>> = vec![
        Box::new(SharedStringsTable::builder().build().unwrap()),
        Box::new(
            SharedStringsTable::builder()
                .backend(Backend::FileBacked)
                .build()
                .unwrap(),
        ),
    ];
    for table in &mut tables {
        assert_eq!(table.add_entry(&RichText::new("x"), true).unwrap(), 0);
        assert_eq!(table.add_entry(&RichText::new("x"), true).unwrap(), 0);
        assert_eq!(table.add_entry(&RichText::new("x"), false).unwrap(), 1);
        assert_eq!(table.count(), 3);
        assert_eq!(table.unique_count(), 2);
        table.close().unwrap();
    }
}
