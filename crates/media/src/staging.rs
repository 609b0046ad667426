//! Temporary on-disk copies of video bytes.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// A video written to a private temporary file. The file is removed on
/// [`StagedVideo::release`] or when the value is dropped.
#[derive(Debug)]
pub struct StagedVideo {
    path: PathBuf,
    file: Option<NamedTempFile>,
}

impl StagedVideo {
    /// Write `bytes` to a new, uniquely named file in `dir`. The file is
    /// readable by the current user only.
    pub fn write(dir: &Path, bytes: &[u8]) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("poise-")
            .suffix(".video")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;

        let path = file.path().to_path_buf();
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Staged video");
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file. Idempotent.
    pub fn release(&mut self) -> std::io::Result<()> {
        match self.file.take() {
            Some(file) => file.close(),
            None => Ok(()),
        }
    }

    pub fn is_released(&self) -> bool {
        self.file.is_none()
    }
}
