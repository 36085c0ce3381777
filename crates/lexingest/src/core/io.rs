//! Job sources.
//!
//! A batch registers every job up front but only loads it once the job has
//! been admitted under the concurrency limit. Loading can fail; such a failure
//! belongs to that job and never aborts the batch.

use crate::error::ValidationError;
use crate::types::DocumentJob;
use crate::{IngestError, Result};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Something the pipeline can turn into a [`DocumentJob`].
pub trait JobSource: Send + 'static {
    /// Name reported by the tracker and in batch failures, known before loading.
    fn file_name(&self) -> &str;

    /// Produce the job. Called once, after the job has been admitted.
    fn load(self) -> impl Future<Output = Result<DocumentJob>> + Send;
}

impl JobSource for DocumentJob {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    async fn load(self) -> Result<DocumentJob> {
        Ok(self)
    }
}

/// A job read from the local filesystem when it is admitted.
#[derive(Debug, Clone)]
pub struct FileJob {
    path: PathBuf,
    file_name: String,
    mime_type: Option<String>,
}

impl FileJob {
    /// The MIME type is guessed from the extension unless overridden.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            file_name,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JobSource for FileJob {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    /// # Errors
    ///
    /// A path that does not exist is a `MissingFile` validation error. Any
    /// other read failure is `IngestError::Io` naming the path.
    async fn load(self) -> Result<DocumentJob> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "File not found");
                return Err(ValidationError::MissingFile.into());
            }
            Err(e) => {
                return Err(IngestError::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to read {}: {}", self.path.display(), e),
                )));
            }
        };

        let mime_type = match self.mime_type {
            Some(mime_type) => mime_type,
            None => guess_mime_type(&self.path),
        };
        Ok(DocumentJob::new(self.file_name, mime_type, bytes))
    }
}

/// MIME type for a path by extension, `application/octet-stream` if unknown.
pub fn guess_mime_type(path: impl AsRef<Path>) -> String {
    mime_guess::from_path(path).first_or_octet_stream().essence_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_job_loads_bytes_and_guesses_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let source = FileJob::new(&path);
        assert_eq!(source.file_name(), "notes.txt");

        let job = source.load().await.unwrap();
        assert_eq!(job.file_name, "notes.txt");
        assert_eq!(job.mime_type, "text/plain");
        assert_eq!(job.size_bytes, 5);
        assert_eq!(job.bytes, b"hello");
    }

    #[tokio::test]
    async fn test_file_job_mime_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.bin");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let job = FileJob::new(&path).with_mime_type("image/png").load().await.unwrap();
        assert_eq!(job.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_missing_file_is_a_validation_error() {
        let dir = tempdir().unwrap();
        let err = FileJob::new(dir.path().join("gone.pdf")).load().await.unwrap_err();

        assert!(matches!(err, IngestError::Validation(ValidationError::MissingFile)));
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn test_unreadable_path_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = FileJob::new(dir.path()).load().await.unwrap_err();

        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("report.pdf"), "application/pdf");
        assert_eq!(guess_mime_type("blob.unknownext"), "application/octet-stream");
    }
}
