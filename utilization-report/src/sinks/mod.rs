pub mod file;

pub use file::FileDownloadSink;

use crate::pipeline::ExportError;

pub const CSV_MIME_TYPE: &str = "text/csv";

/// A finished export ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub content: String,
    pub filename: String,
    pub mime_type: &'static str,
}

/// Where exported files are saved.
pub trait DownloadSink: Send + Sync {
    fn save(&self, file: &ExportFile) -> Result<(), ExportError>;
}
