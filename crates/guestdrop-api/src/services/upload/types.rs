//! Types used by the upload service

use bytes::Bytes;
use futures::Stream;
use guestdrop_core::AppError;
use tempfile::NamedTempFile;

/// A file arriving from a client, not yet read.
///
/// `body` yields the file's chunks; a chunk error means the client stopped
/// sending and is reported as-is.
pub struct IncomingFile<S>
where
    S: Stream<Item = Result<Bytes, AppError>>,
{
    /// Name as supplied by the client, unsanitized.
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub body: S,
}

/// A fully received upload held in the staging area.
///
/// The temp file is removed when this value is closed or dropped.
pub struct StagedFile {
    pub(super) file: NamedTempFile,
    pub size: u64,
    pub original_filename: String,
    pub content_type: String,
}

impl StagedFile {
    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    /// Remove the staging file. Failure is logged, never surfaced.
    pub fn close(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove staging file");
        }
    }
}

/// An event background stored under the public prefix.
#[derive(Debug, Clone)]
pub struct StoredBackground {
    pub key: String,
    /// Public URL of the object.
    pub url: String,
}
