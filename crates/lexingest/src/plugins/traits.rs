//! Base plugin trait definition.
//!
//! Extractors, OCR backends and blob stores all implement [`Plugin`], which
//! gives them a name for logging and optional lifecycle hooks.

use crate::Result;

/// Base trait for pluggable pipeline components.
///
/// Plugins are shared across concurrent jobs behind `Arc`, so they must be
/// `Send + Sync` and use interior mutability for any state they keep.
pub trait Plugin: Send + Sync {
    /// Unique, stable, kebab-case identifier.
    fn name(&self) -> &str;

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// Called once when the pipeline is built.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Called when the pipeline shuts down.
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        ""
    }
}
