//! Upload validation.
//!
//! The validator is the only place a declared MIME type is matched as a
//! string. A job that passes carries its resolved [`DocumentCategory`] in a
//! [`ValidatedJob`], and every later stage dispatches on that.

use crate::core::config::IngestConfig;
use crate::core::mime::{DocumentCategory, classify, matches_allowed, normalize_mime_type};
use crate::error::ValidationError;
use crate::types::DocumentJob;

/// A job that passed validation, tagged with its document category.
#[derive(Debug, Clone)]
pub struct ValidatedJob {
    job: DocumentJob,
    category: DocumentCategory,
}

impl ValidatedJob {
    pub fn job(&self) -> &DocumentJob {
        &self.job
    }

    pub fn category(&self) -> DocumentCategory {
        self.category
    }

    pub fn bytes(&self) -> &[u8] {
        &self.job.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.job.mime_type
    }

    pub fn into_job(self) -> DocumentJob {
        self.job
    }
}

/// Checks size and type constraints before any processing.
#[derive(Debug, Clone)]
pub struct Validator {
    max_size_bytes: u64,
    allowed_types: Vec<String>,
}

impl Validator {
    pub fn new(max_size_bytes: u64, allowed_types: Vec<String>) -> Self {
        Self {
            max_size_bytes,
            allowed_types,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.max_size_bytes(), config.allowed_types.clone())
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Validate a job: presence, then size, then type.
    ///
    /// The size checked is the larger of the declared size and the actual
    /// buffer length, so an understated declaration can't sneak past the limit.
    pub fn validate(&self, job: DocumentJob) -> Result<ValidatedJob, ValidationError> {
        let category = self.check(&job)?;
        Ok(ValidatedJob { job, category })
    }

    /// Run the checks without taking ownership of the job.
    pub fn check(&self, job: &DocumentJob) -> Result<DocumentCategory, ValidationError> {
        if job.file_name.trim().is_empty() || (job.bytes.is_empty() && job.size_bytes > 0) {
            return Err(ValidationError::MissingFile);
        }

        let size_bytes = job.size_bytes.max(job.bytes.len() as u64);
        if size_bytes > self.max_size_bytes {
            return Err(ValidationError::Oversized {
                size_bytes,
                max_bytes: self.max_size_bytes,
            });
        }

        let mime_type = normalize_mime_type(&job.mime_type);
        let allowed = self.allowed_types.iter().any(|entry| matches_allowed(&mime_type, entry));

        match classify(&mime_type) {
            Some(category) if allowed => Ok(category),
            _ => Err(ValidationError::UnsupportedType {
                mime_type: job.mime_type.clone(),
            }),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}
