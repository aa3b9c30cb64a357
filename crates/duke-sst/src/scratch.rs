//! Temporary files backing a store.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// A temporary file owned by one backend.
///
/// Deleted by [`ScratchFile::delete`] or on drop, whichever comes first.
#[derive(Debug)]
pub struct ScratchFile {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl ScratchFile {
    /// Create an empty `<prefix>XXXX.tmp` file in `dir`, or the OS temp dir
    pub fn create(prefix: &str, dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix).suffix(".tmp");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let path = file.path().to_path_buf();
        log::debug!("Created scratch file {}", path.display());
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open an independent handle with its own cursor
    pub fn reopen(&self) -> io::Result<File> {
        match &self.file {
            Some(file) => file.reopen(),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("scratch file {} was deleted", self.path.display()),
            )),
        }
    }

    /// Whether the file has not been deleted yet
    pub fn exists(&self) -> bool {
        self.file.is_some()
    }

    /// Remove the file. Idempotent; a file already gone is not an error.
    pub fn delete(&mut self) -> io::Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        match file.close() {
            Ok(()) => {
                log::debug!("Deleted scratch file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
