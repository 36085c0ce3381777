//! Batch mode tracking using tokio task-local storage.
//!
//! Single jobs parse documents inline on the calling task. Inside a batch the
//! pipeline sets a task-local flag and parsers move their CPU-bound work onto
//! the blocking pool so that jobs actually run in parallel.

use crate::{IngestError, Result};
use std::cell::Cell;
use tokio::task_local;

task_local! {
    static BATCH_MODE: Cell<bool>;
}

/// Whether the current task runs as part of a batch.
///
/// Returns `false` outside [`with_batch_mode`].
pub fn is_batch_mode() -> bool {
    BATCH_MODE.try_with(|cell| cell.get()).unwrap_or(false)
}

/// Run `future` with batch mode enabled.
pub async fn with_batch_mode<F, T>(future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    BATCH_MODE.scope(Cell::new(true), future).await
}

/// Run a synchronous parser over `content`.
///
/// In batch mode the parser runs on the blocking pool inside the caller's
/// tracing span; otherwise it runs directly.
pub async fn run_parser<F, T>(content: &[u8], mime_type: &str, parse: F) -> Result<T>
where
    F: FnOnce(&[u8]) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    if !is_batch_mode() {
        return parse(content);
    }

    let content_owned = content.to_vec();
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || {
        let _guard = span.entered();
        parse(&content_owned)
    })
    .await
    .map_err(|e| IngestError::extraction_with_source(mime_type, "parser task failed", e))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_mode_not_set_by_default() {
        assert!(!is_batch_mode());
    }

    #[tokio::test]
    async fn test_batch_mode_scoped_to_future() {
        let inside = with_batch_mode(async { is_batch_mode() }).await;
        assert!(inside);
        assert!(!is_batch_mode(), "flag must not leak out of the scope");
    }

    #[tokio::test]
    async fn test_run_parser_inline() {
        let len = run_parser(b"abc", "text/plain", |bytes| Ok(bytes.len())).await.unwrap();
        assert_eq!(len, 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_parser_in_batch_mode_uses_blocking_pool() {
        let len = with_batch_mode(run_parser(b"abcd", "text/plain", |bytes| Ok(bytes.len())))
            .await
            .unwrap();
        assert_eq!(len, 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_parser_panic_becomes_extraction_error() {
        let result: Result<()> = with_batch_mode(run_parser(b"", "application/pdf", |_| panic!("boom"))).await;
        match result {
            Err(IngestError::Extraction { mime_type, .. }) => assert_eq!(mime_type, "application/pdf"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
