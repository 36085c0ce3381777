//! The ingestion pipeline.
//!
//! One job runs validate -> extract -> enrich -> upload -> assemble, reporting
//! each checkpoint to the [`JobTracker`]. Batches fan the same flow out over a
//! `JoinSet` bounded by a semaphore and collect outcomes by submission index.
//!
//! # Example
//!
//! ```rust,no_run
//! use lexingest::{DocumentJob, IngestConfig, IngestPipeline};
//!
//! # async fn example() -> lexingest::Result<()> {
//! let pipeline = IngestPipeline::new(IngestConfig::default())?;
//! let doc = pipeline
//!     .process(DocumentJob::new("notes.txt", "text/plain", b"Hello world".to_vec()))
//!     .await?;
//! println!("{} words ({})", doc.word_count, doc.metadata.language);
//! # Ok(())
//! # }
//! ```

use crate::core::assembler::{AssemblyParts, assemble};
use crate::core::batch_mode::with_batch_mode;
use crate::core::config::IngestConfig;
use crate::core::dispatcher::ExtractionDispatcher;
use crate::core::io::JobSource;
use crate::core::validation::Validator;
use crate::jobs::{JobTracker, Milestone, StatusReport};
use crate::plugins::{DocumentExtractor, OcrBackend};
use crate::storage::BlobStore;
use crate::text::MetadataEnricher;
use crate::types::{BatchFailure, BatchResult, DocumentJob, ExtractionOutcome, ProcessedDocument};
use crate::{IngestError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::Instrument;
use uuid::Uuid;

/// Builder for [`IngestPipeline`].
pub struct IngestPipelineBuilder {
    config: IngestConfig,
    ocr: Option<Arc<dyn OcrBackend>>,
    store: Option<Arc<dyn BlobStore>>,
    extractors: Vec<Arc<dyn DocumentExtractor>>,
    tracker: Option<JobTracker>,
    span: Option<tracing::Span>,
}

impl IngestPipelineBuilder {
    /// OCR backend for image extraction. Overrides `config.ocr`.
    pub fn ocr_backend(mut self, ocr: Arc<dyn OcrBackend>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Blob store for original uploads. Overrides `config.storage`.
    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the built-in extractor of the extractor's category.
    pub fn extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Share a job tracker with other pipelines or with a status endpoint.
    pub fn tracker(mut self, tracker: JobTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Parent span for every job span. Defaults to `info_span!("lexingest")`.
    pub fn span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn build(self) -> Result<IngestPipeline> {
        self.config.validate()?;

        let ocr = match self.ocr {
            Some(ocr) => Some(ocr),
            None => default_ocr_backend(&self.config)?,
        };
        let store = match self.store {
            Some(store) => store,
            None => crate::storage::from_config(&self.config.storage)?,
        };

        let mut dispatcher = ExtractionDispatcher::with_defaults(&self.config, ocr.clone());
        for extractor in self.extractors {
            dispatcher.register(extractor);
        }

        dispatcher.initialize()?;
        if let Some(ocr) = &ocr {
            ocr.initialize()?;
        }
        store.initialize()?;

        let span = self.span.unwrap_or_else(|| tracing::info_span!("lexingest"));
        tracing::debug!(
            parent: &span,
            dispatcher = ?dispatcher,
            store = store.name(),
            ocr = ocr.as_ref().map(|o| o.name()),
            "Pipeline built"
        );

        Ok(IngestPipeline {
            validator: Arc::new(Validator::from_config(&self.config)),
            enricher: Arc::new(MetadataEnricher::new(&self.config.language_detection)),
            config: Arc::new(self.config),
            dispatcher: Arc::new(dispatcher),
            ocr,
            store,
            tracker: self.tracker.unwrap_or_default(),
            span,
        })
    }
}

#[cfg(feature = "http")]
fn default_ocr_backend(config: &IngestConfig) -> Result<Option<Arc<dyn OcrBackend>>> {
    match &config.ocr {
        Some(ocr_config) => Ok(Some(Arc::new(crate::ocr::HttpOcrBackend::new(ocr_config)?))),
        None => Ok(None),
    }
}

#[cfg(not(feature = "http"))]
fn default_ocr_backend(config: &IngestConfig) -> Result<Option<Arc<dyn OcrBackend>>> {
    if config.ocr.is_some() {
        tracing::warn!("OCR endpoint configured but the `http` feature is disabled; image extraction unavailable");
    }
    Ok(None)
}

/// Document ingestion pipeline.
///
/// Cheap to clone; clones share configuration, plugins and the job tracker.
///
/// # Retention
///
/// Tracker entries for finished jobs are kept until pruned. With
/// `job_retention_secs` set, every submission first drops entries that
/// finished longer ago than that; otherwise call
/// [`JobTracker::prune_finished`] yourself. The default memory store keeps
/// every uploaded original for the life of the process, so long-running
/// services should configure local or HTTP storage.
#[derive(Clone)]
pub struct IngestPipeline {
    config: Arc<IngestConfig>,
    validator: Arc<Validator>,
    dispatcher: Arc<ExtractionDispatcher>,
    enricher: Arc<MetadataEnricher>,
    ocr: Option<Arc<dyn OcrBackend>>,
    store: Arc<dyn BlobStore>,
    tracker: JobTracker,
    span: tracing::Span,
}

impl IngestPipeline {
    pub fn builder(config: IngestConfig) -> IngestPipelineBuilder {
        IngestPipelineBuilder {
            config,
            ocr: None,
            store: None,
            extractors: Vec::new(),
            tracker: None,
            span: None,
        }
    }

    /// Pipeline with plugins derived from `config`.
    pub fn new(config: IngestConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    /// Status of a previously submitted document.
    pub fn status(&self, document_id: Uuid) -> Result<StatusReport> {
        self.tracker.status(document_id)
    }

    /// Process one job and wait for the result.
    pub async fn process(&self, job: DocumentJob) -> Result<ProcessedDocument> {
        self.prune_expired();
        let document_id = Uuid::new_v4();
        self.tracker.register(document_id, job.file_name.clone());
        self.run_registered(document_id, job).await
    }

    /// Start processing one job in the background.
    ///
    /// The document id is returned immediately so the caller can poll
    /// [`status`](Self::status) while the job runs.
    pub fn submit(&self, job: DocumentJob) -> (Uuid, JoinHandle<Result<ProcessedDocument>>) {
        self.prune_expired();
        let document_id = Uuid::new_v4();
        self.tracker.register(document_id, job.file_name.clone());
        let pipeline = self.clone();
        let handle = tokio::spawn(async move { pipeline.run_registered(document_id, job).await });
        (document_id, handle)
    }

    /// Process many jobs with per-job failure isolation.
    ///
    /// At most `max_concurrent_jobs` jobs run at once. `successful` and
    /// `failed` keep submission order; a panicking or timed-out job is
    /// reported as a failure of that job only.
    pub async fn process_many(&self, jobs: Vec<DocumentJob>) -> BatchResult {
        self.process_sources(jobs).await
    }

    /// Batch over lazily loaded jobs, such as [`FileJob`](crate::FileJob)s.
    ///
    /// A source is loaded only after its job is admitted under the
    /// concurrency limit, so at most `max_concurrent_jobs` payloads are held
    /// in memory. A source that fails to load is a failure of that job.
    pub async fn process_sources<S: JobSource>(&self, sources: Vec<S>) -> BatchResult {
        let submitted = sources.len();
        if submitted == 0 {
            return BatchResult::from_parts(Vec::new(), Vec::new(), 0);
        }
        self.prune_expired();

        let semaphore = Arc::new(Semaphore::new(self.config.effective_concurrency()));
        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::with_capacity(submitted);
        let mut entries = Vec::with_capacity(submitted);

        for (index, source) in sources.into_iter().enumerate() {
            let document_id = Uuid::new_v4();
            let file_name = source.file_name().to_string();
            self.tracker.register(document_id, file_name.clone());
            entries.push((document_id, file_name));

            let pipeline = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let handle = tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => with_batch_mode(pipeline.run_registered(document_id, source)).await,
                    Err(e) => Err(IngestError::Other(format!("batch semaphore closed: {}", e))),
                };
                (index, result)
            });
            task_index.insert(handle.id(), index);
        }

        let mut outcomes: Vec<Option<std::result::Result<ProcessedDocument, BatchFailure>>> =
            (0..submitted).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(doc))) => outcomes[index] = Some(Ok(doc)),
                Ok((index, Err(e))) => {
                    let (document_id, file_name) = &entries[index];
                    outcomes[index] = Some(Err(batch_failure(file_name, Some(*document_id), &e)));
                }
                Err(join_err) => {
                    let Some(&index) = task_index.get(&join_err.id()) else {
                        tracing::error!(parent: &self.span, error = %join_err, "Unattributable batch task failure");
                        continue;
                    };
                    let (document_id, file_name) = &entries[index];
                    let e = IngestError::Other(format!("job panicked: {}", join_err));
                    if let Err(track_err) = self.tracker.fail(*document_id, e.to_string()) {
                        tracing::debug!(error = %track_err, "Could not mark panicked job as failed");
                    }
                    tracing::error!(parent: &self.span, file_name = %file_name, error = %e, "Job panicked");
                    outcomes[index] = Some(Err(batch_failure(file_name, Some(*document_id), &e)));
                }
            }
        }

        let mut successful = Vec::new();
        let mut failed = Vec::new();
        for (outcome, (document_id, file_name)) in outcomes.into_iter().zip(entries) {
            match outcome {
                Some(Ok(doc)) => successful.push(doc),
                Some(Err(failure)) => failed.push(failure),
                None => failed.push(batch_failure(
                    &file_name,
                    Some(document_id),
                    &IngestError::Other("job produced no outcome".to_string()),
                )),
            }
        }

        let result = BatchResult::from_parts(successful, failed, submitted);
        tracing::info!(
            parent: &self.span,
            submitted,
            successful = result.successful.len(),
            failed = result.failed.len(),
            success_rate = result.success_rate,
            "Batch finished"
        );
        result
    }

    /// Shut down every plugin.
    pub fn shutdown(&self) -> Result<()> {
        self.dispatcher.shutdown()?;
        if let Some(ocr) = &self.ocr {
            ocr.shutdown()?;
        }
        self.store.shutdown()
    }

    fn prune_expired(&self) {
        if let Some(seconds) = self.config.job_retention_secs {
            let pruned = self.tracker.prune_finished(Duration::from_secs(seconds));
            if pruned > 0 {
                tracing::debug!(parent: &self.span, pruned, "Pruned finished jobs");
            }
        }
    }

    async fn run_registered<S: JobSource>(&self, document_id: Uuid, source: S) -> Result<ProcessedDocument> {
        let span = tracing::info_span!(
            parent: &self.span,
            "ingest_job",
            document_id = %document_id,
            file_name = %source.file_name(),
            mime_type = tracing::field::Empty,
        );

        async {
            let started = Instant::now();
            let result = match self.config.job_timeout_secs {
                Some(seconds) => {
                    tokio::time::timeout(Duration::from_secs(seconds), self.run_stages(document_id, source, started))
                        .await
                        .unwrap_or_else(|_| Err(IngestError::Timeout { seconds }))
                }
                None => self.run_stages(document_id, source, started).await,
            };

            match &result {
                Ok(doc) => tracing::info!(
                    processing_time_ms = doc.processing_time_ms,
                    confidence = doc.confidence.value(),
                    method = %doc.metadata.method,
                    "Job completed"
                ),
                Err(e) => {
                    tracing::error!(kind = e.kind(), error = %e, "Job failed");
                    if let Err(track_err) = self.tracker.fail(document_id, e.to_string()) {
                        tracing::debug!(error = %track_err, "Could not mark job as failed");
                    }
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_stages<S: JobSource>(
        &self,
        document_id: Uuid,
        source: S,
        started: Instant,
    ) -> Result<ProcessedDocument> {
        self.tracker.start(document_id)?;

        let job = source.load().await?;
        tracing::Span::current().record("mime_type", job.mime_type.as_str());

        let validated = self.validator.validate(job)?;
        self.tracker.advance(document_id, Milestone::Validated)?;
        tracing::debug!(category = %validated.category(), "Validated");

        let outcome = self.dispatcher.extract(&validated).await?;
        self.tracker.advance(document_id, Milestone::Extracted)?;

        let enrichment = match &outcome {
            ExtractionOutcome::Extracted(result) => self.enricher.enrich(&result.text),
            ExtractionOutcome::Unavailable(_) => self.enricher.enrich(""),
        };
        self.tracker.advance(document_id, Milestone::Enriched)?;

        let job = validated.into_job();
        let upload = self.store.upload(&job.bytes, &job.file_name, &job.mime_type).await?;
        self.tracker.advance(document_id, Milestone::Stored)?;
        tracing::debug!(url = %upload.url, "Original stored");

        let doc = assemble(AssemblyParts {
            document_id,
            job,
            outcome,
            enrichment,
            upload,
            started,
        });
        self.tracker.complete(document_id)?;
        Ok(doc)
    }
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

fn batch_failure(file_name: &str, document_id: Option<Uuid>, error: &IngestError) -> BatchFailure {
    BatchFailure {
        file_name: file_name.to_string(),
        error: error.to_string(),
        kind: error.kind().to_string(),
        document_id,
    }
}
