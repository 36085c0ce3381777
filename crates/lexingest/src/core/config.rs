//! Configuration loading and management.
//!
//! The configuration is read once at startup (from TOML, YAML or JSON, or by
//! discovering `lexingest.toml` in the directory hierarchy) and then shared
//! read-only by every job.

use crate::core::mime::{DOCX_MIME_TYPE, LEGACY_WORD_MIME_TYPE, PDF_MIME_TYPE, PLAIN_TEXT_MIME_TYPE};
use crate::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const BYTES_PER_MB: u64 = 1024 * 1024;

pub const CONFIG_FILE_NAME: &str = "lexingest.toml";

pub const ENV_MAX_UPLOAD_SIZE_MB: &str = "LEXINGEST_MAX_UPLOAD_SIZE_MB";
pub const ENV_MAX_CONCURRENT_JOBS: &str = "LEXINGEST_MAX_CONCURRENT_JOBS";
pub const ENV_OCR_ENDPOINT: &str = "LEXINGEST_OCR_ENDPOINT";

/// Main ingestion configuration.
///
/// # Example
///
/// ```rust
/// use lexingest::core::config::IngestConfig;
///
/// let config = IngestConfig::default();
/// assert_eq!(config.max_upload_size_mb, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum accepted upload size in megabytes
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: u64,

    /// Accepted MIME types. Entries ending in `/*` match by prefix.
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,

    /// Maximum jobs in flight during a batch (None = num_cpus * 2).
    ///
    /// Every in-flight job holds its file fully in memory, so this bounds
    /// peak memory as well as parallelism.
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,

    /// Per-job deadline in seconds (None = no deadline)
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,

    /// Seconds a finished job stays queryable in the tracker (None = until
    /// pruned by the caller)
    #[serde(default)]
    pub job_retention_secs: Option<u64>,

    /// Image cleanup applied before OCR
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,

    /// Language heuristic settings
    #[serde(default)]
    pub language_detection: LanguageDetectionConfig,

    /// OCR service (None = image extraction unavailable)
    #[serde(default)]
    pub ocr: Option<OcrServiceConfig>,

    /// Where original files are uploaded
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Longest edge after downscaling, in pixels. Images are never upscaled.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// Gaussian sigma of the unsharp mask
    #[serde(default = "default_sharpen_sigma")]
    pub sharpen_sigma: f32,

    /// Minimum brightness difference the unsharp mask acts on
    #[serde(default)]
    pub sharpen_threshold: i32,

    /// Percentage of darkest and brightest pixels clipped during contrast
    /// normalisation
    #[serde(default = "default_clip_percent")]
    pub clip_percent: f32,
}

/// Language detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageDetectionConfig {
    /// Number of leading tokens scored against the stop-word lists
    #[serde(default = "default_sample_tokens")]
    pub sample_tokens: usize,
}

/// OCR service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrServiceConfig {
    /// Recognition endpoint URL
    pub endpoint: String,

    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

/// Blob store selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Keep uploads in process memory
    #[default]
    Memory,
    /// Write uploads below a local directory
    Local { root: PathBuf },
    /// PUT uploads to an HTTP object store
    Http {
        base_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bearer_token: Option<String>,
        #[serde(default = "default_storage_timeout")]
        timeout_secs: u64,
    },
}

fn default_true() -> bool {
    true
}
fn default_max_upload_size_mb() -> u64 {
    50
}
fn default_allowed_types() -> Vec<String> {
    vec![
        PDF_MIME_TYPE.to_string(),
        LEGACY_WORD_MIME_TYPE.to_string(),
        DOCX_MIME_TYPE.to_string(),
        "image/*".to_string(),
        PLAIN_TEXT_MIME_TYPE.to_string(),
    ]
}
fn default_max_dimension() -> u32 {
    3000
}
fn default_sharpen_sigma() -> f32 {
    1.0
}
fn default_clip_percent() -> f32 {
    1.0
}
fn default_sample_tokens() -> usize {
    100
}
fn default_ocr_timeout() -> u64 {
    60
}
fn default_storage_timeout() -> u64 {
    30
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: default_max_upload_size_mb(),
            allowed_types: default_allowed_types(),
            max_concurrent_jobs: None,
            job_timeout_secs: None,
            job_retention_secs: None,
            preprocessing: PreprocessingConfig::default(),
            language_detection: LanguageDetectionConfig::default(),
            ocr: None,
            storage: StorageConfig::default(),
        }
    }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_dimension: default_max_dimension(),
            sharpen_sigma: default_sharpen_sigma(),
            sharpen_threshold: 0,
            clip_percent: default_clip_percent(),
        }
    }
}

impl Default for LanguageDetectionConfig {
    fn default() -> Self {
        Self {
            sample_tokens: default_sample_tokens(),
        }
    }
}

impl IngestConfig {
    /// Maximum accepted upload size in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Effective batch parallelism.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent_jobs.unwrap_or_else(|| num_cpus::get() * 2).max(1)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Config` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_config(path)?;
        toml::from_str(&content)
            .map_err(|e| IngestError::config_with_source(format!("Invalid TOML in {}", path.display()), e))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_config(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| IngestError::config_with_source(format!("Invalid YAML in {}", path.display()), e))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_config(path)?;
        serde_json::from_str(&content)
            .map_err(|e| IngestError::config_with_source(format!("Invalid JSON in {}", path.display()), e))
    }

    /// Load configuration choosing the parser from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(IngestError::config(format!(
                "Unsupported config file extension: {}",
                path.display()
            ))),
        }
    }

    /// Discover `lexingest.toml` in the current directory or any parent.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(IngestError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_env_overrides_with(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides using `lookup` to resolve variables.
    pub fn apply_env_overrides_with<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_UPLOAD_SIZE_MB) {
            self.max_upload_size_mb = parse_env(ENV_MAX_UPLOAD_SIZE_MB, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_CONCURRENT_JOBS) {
            self.max_concurrent_jobs = Some(parse_env(ENV_MAX_CONCURRENT_JOBS, &value)?);
        }
        if let Some(endpoint) = lookup(ENV_OCR_ENDPOINT) {
            match self.ocr.as_mut() {
                Some(ocr) => ocr.endpoint = endpoint,
                None => {
                    self.ocr = Some(OcrServiceConfig {
                        endpoint,
                        api_key: None,
                        timeout_secs: default_ocr_timeout(),
                    })
                }
            }
        }
        Ok(self)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_size_mb == 0 {
            return Err(IngestError::config("max_upload_size_mb must be greater than 0"));
        }
        if self.allowed_types.is_empty() {
            return Err(IngestError::config("allowed_types must not be empty"));
        }
        if self.max_concurrent_jobs == Some(0) {
            return Err(IngestError::config("max_concurrent_jobs must be greater than 0"));
        }
        if self.job_timeout_secs == Some(0) {
            return Err(IngestError::config("job_timeout_secs must be greater than 0"));
        }
        if self.preprocessing.max_dimension == 0 {
            return Err(IngestError::config("preprocessing.max_dimension must be greater than 0"));
        }
        if !(0.0..50.0).contains(&self.preprocessing.clip_percent) {
            return Err(IngestError::config("preprocessing.clip_percent must be in [0, 50)"));
        }
        if self.language_detection.sample_tokens == 0 {
            return Err(IngestError::config("language_detection.sample_tokens must be greater than 0"));
        }
        if let Some(ocr) = &self.ocr
            && ocr.endpoint.trim().is_empty()
        {
            return Err(IngestError::config("ocr.endpoint must not be empty"));
        }
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| IngestError::config_with_source(format!("Failed to read config file {}", path.display()), e))
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| IngestError::config(format!("Invalid value for {}: {} ({})", key, value, e)))
}
