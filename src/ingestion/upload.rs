//! Scoped temporary storage for uploaded files.
//!
//! A [`ScopedUpload`] owns the temporary file from the moment the upload is
//! received. [`ScopedUpload::cleanup`] deletes it and reports failures; if the
//! upload is dropped without an explicit cleanup (early return, panic) the
//! `Drop` impl deletes it instead. Either way the file is removed exactly once.

use log::{debug, error};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct ScopedUpload {
    file: Option<NamedTempFile>,
    path: PathBuf,
    original_name: Option<String>,
    bytes_written: u64,
}

impl ScopedUpload {
    /// Create an empty upload file inside `dir`, creating the directory if needed.
    pub fn create_in<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".csv")
            .tempfile_in(dir.as_ref())?;
        let path = file.path().to_path_buf();
        debug!("Created upload file {}", path.display());
        Ok(Self {
            file: Some(file),
            path,
            original_name: None,
            bytes_written: 0,
        })
    }

    /// Remember the client-side file name for logging.
    pub fn with_original_name(mut self, name: Option<String>) -> Self {
        self.original_name = name;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Append a chunk of the uploaded body.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "upload already cleaned up"))?;
        file.write_all(chunk)?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Flush buffered writes so readers see the whole body.
    pub fn finish(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    /// Delete the file now and report any failure.
    pub fn cleanup(mut self) -> io::Result<()> {
        match self.file.take() {
            Some(file) => {
                debug!("Removing upload file {}", self.path.display());
                file.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for ScopedUpload {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.close() {
                error!("Error deleting file {}: {}", self.path.display(), e);
            }
        }
    }
}
