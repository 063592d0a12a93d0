use std::{fs, path::PathBuf};

use super::{DownloadSink, ExportFile};
use crate::pipeline::ExportError;

/// Saves exports into a directory, overwriting a file of the same name.
pub struct FileDownloadSink {
    dir: PathBuf,
}

impl FileDownloadSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, file: &ExportFile) -> PathBuf {
        self.dir.join(&file.filename)
    }
}

impl DownloadSink for FileDownloadSink {
    fn save(&self, file: &ExportFile) -> Result<(), ExportError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ExportError::Sink(format!("failed to create {}: {e}", self.dir.display()))
        })?;

        let path = self.path_for(file);
        fs::write(&path, file.content.as_bytes())
            .map_err(|e| ExportError::Sink(format!("failed to write {}: {e}", path.display())))?;

        tracing::info!(
            path = %path.display(),
            bytes = file.content.len(),
            mime_type = file.mime_type,
            "export saved"
        );
        Ok(())
    }
}
