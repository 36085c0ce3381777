//! lexingest command-line interface

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use lexingest::{
    BatchResult, FileJob, IngestConfig, IngestError, IngestPipeline, JobSource, OcrServiceConfig, ProcessedDocument,
    StorageConfig, Validator,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser)]
#[command(name = "lexingest", version)]
#[command(about = "Validate, extract and store documents", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to a discovered lexingest.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one or more documents
    Process {
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Declared MIME type for every file, instead of guessing from the extension
        #[arg(short, long)]
        mime: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Store originals below this directory
        #[arg(long)]
        storage_dir: Option<PathBuf>,

        /// OCR service endpoint for image documents
        #[arg(long)]
        ocr_endpoint: Option<String>,

        /// Maximum concurrent jobs in a batch
        #[arg(short = 'j', long)]
        max_concurrent: Option<usize>,
    },

    /// Check whether a file would be accepted without processing it
    Validate {
        file: PathBuf,

        #[arg(short, long)]
        mime: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Process {
            files,
            mime,
            format,
            storage_dir,
            ocr_endpoint,
            max_concurrent,
        } => {
            if let Some(root) = storage_dir {
                config.storage = StorageConfig::Local { root };
            }
            if let Some(endpoint) = ocr_endpoint {
                let timeout_secs = config.ocr.as_ref().map(|ocr| ocr.timeout_secs).unwrap_or(60);
                let api_key = config.ocr.as_ref().and_then(|ocr| ocr.api_key.clone());
                config.ocr = Some(OcrServiceConfig {
                    endpoint,
                    api_key,
                    timeout_secs,
                });
            }
            if max_concurrent.is_some() {
                config.max_concurrent_jobs = max_concurrent;
            }

            let pipeline = IngestPipeline::new(config)?;
            let sources: Vec<FileJob> = files.into_iter().map(|path| file_job(path, mime.as_deref())).collect();
            tracing::debug!(files = sources.len(), "Submitting batch");

            let result = pipeline.process_sources(sources).await;
            print_batch(&result, format)?;
            pipeline.shutdown()?;
            if !result.failed.is_empty() {
                bail!("{} of {} documents failed", result.failed.len(), result.total_processed);
            }
            Ok(())
        }

        Commands::Validate { file, mime } => {
            let job = match file_job(file.clone(), mime.as_deref()).load().await {
                Ok(job) => job,
                Err(IngestError::Validation(e)) => bail!("{} rejected [{}]: {}", file.display(), e.reason(), e),
                Err(e) => return Err(e.into()),
            };
            match Validator::from_config(&config).check(&job) {
                Ok(category) => {
                    println!("✓ {} accepted as {} ({})", file.display(), category, job.mime_type);
                    Ok(())
                }
                Err(e) => bail!("{} rejected [{}]: {}", file.display(), e.reason(), e),
            }
        }

        Commands::Config => {
            config.validate()?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<IngestConfig> {
    let config = match path {
        Some(path) => IngestConfig::from_file(path)?,
        None => IngestConfig::discover()?.unwrap_or_default(),
    };
    let config = config.apply_env_overrides()?;
    tracing::debug!(
        max_upload_size_mb = config.max_upload_size_mb,
        max_concurrent_jobs = config.effective_concurrency(),
        ocr = config.ocr.is_some(),
        "Configuration loaded"
    );
    Ok(config)
}

fn file_job(path: PathBuf, mime: Option<&str>) -> FileJob {
    let job = FileJob::new(path);
    match mime {
        Some(mime) => job.with_mime_type(mime),
        None => job,
    }
}

fn print_document(doc: &ProcessedDocument) {
    println!(
        "✓ {} [{}] pages={} words={} confidence={} language={} method={}",
        doc.original_name,
        doc.document_id,
        doc.pages,
        doc.word_count,
        doc.confidence,
        doc.metadata.language,
        doc.metadata.method
    );
    if let Some(reason) = &doc.metadata.unavailable_reason {
        println!("  text unavailable: {}", reason);
    }
    println!("  stored at {}", doc.storage_url);
}

fn print_batch(result: &BatchResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            for doc in &result.successful {
                print_document(doc);
            }
            for failure in &result.failed {
                println!("✗ {} [{}] {}", failure.file_name, failure.kind, failure.error);
            }
            println!(
                "{}/{} succeeded ({:.1}%)",
                result.successful.len(),
                result.total_processed,
                result.success_rate
            );
        }
    }
    Ok(())
}
