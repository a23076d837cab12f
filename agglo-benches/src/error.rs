//! Benchmark setup error type.
//!
//! Lets setup helpers propagate failures with `?`; the Criterion entry
//! points panic with the message.

use agglo_core::LinkageError;

use crate::source::SyntheticError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic data generation failed.
    #[error("synthetic point generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// Building the input or configuring the linkage failed.
    #[error("linkage setup failed: {0}")]
    Linkage(#[from] LinkageError),
}
