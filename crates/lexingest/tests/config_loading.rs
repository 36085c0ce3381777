//! Configuration files driving a pipeline.

use lexingest::{DocumentJob, IngestConfig, IngestError, IngestPipeline, StorageConfig};
use std::fs;
use tempfile::tempdir;

#[tokio::test]
async fn test_toml_config_drives_limits() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("lexingest.toml");
    fs::write(
        &path,
        r#"
max_upload_size_mb = 1
allowed_types = ["text/plain"]
max_concurrent_jobs = 2

[language_detection]
sample_tokens = 20
"#,
    )?;

    let config = IngestConfig::from_file(&path)?;
    assert_eq!(config.max_size_bytes(), 1024 * 1024);
    assert_eq!(config.effective_concurrency(), 2);
    assert!(matches!(config.storage, StorageConfig::Memory));

    let pipeline = IngestPipeline::new(config)?;

    let oversized = vec![b'a'; 1024 * 1024 + 1];
    let err = pipeline
        .process(DocumentJob::new("big.txt", "text/plain", oversized))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation(_)));

    let err = pipeline
        .process(DocumentJob::new("a.pdf", "application/pdf", b"%PDF-1.4".to_vec()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unsupported file type"));
    Ok(())
}

#[tokio::test]
async fn test_yaml_config_with_local_storage() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("store");
    let path = dir.path().join("ingest.yaml");
    fs::write(
        &path,
        format!("storage:\n  backend: local\n  root: {}\npreprocessing:\n  enabled: false\n", root.display()),
    )
    .unwrap();

    let config = IngestConfig::from_file(&path).unwrap();
    assert!(!config.preprocessing.enabled);

    let pipeline = IngestPipeline::new(config).unwrap();
    let doc = pipeline
        .process(DocumentJob::new("kept.txt", "text/plain", b"stored locally".to_vec()))
        .await
        .unwrap();
    assert!(doc.storage_url.starts_with("file://"));
    assert!(root.exists());
}

#[test]
fn test_invalid_config_file_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"max_upload_size_mb\": \"lots\" }").unwrap();

    let err = IngestConfig::from_file(&path).unwrap_err();
    assert_eq!(err.kind(), "config");
}

#[test]
fn test_zero_limit_rejected_by_pipeline() {
    let config: IngestConfig = toml::from_str("max_upload_size_mb = 0").unwrap();
    let err = IngestPipeline::new(config).unwrap_err();
    assert_eq!(err.kind(), "config");
}
