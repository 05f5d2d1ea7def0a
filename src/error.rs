//! Error types for sort calls.

use std::collections::TryReserveError;
use thiserror::Error;

/// Result type alias for sort operations.
pub type Result<T> = std::result::Result<T, SortError>;

/// Errors that abort a whole sort call.
///
/// All of these are reported before any element of the input has been moved,
/// so the input is left as it was.
#[derive(Error, Debug)]
pub enum SortError {
    /// A configuration value is out of range.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidConfig {
        /// The parameter name
        parameter: &'static str,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// The shadow or auxiliary buffer could not be allocated.
    #[error("Failed to allocate a buffer for {elements} elements")]
    Allocation {
        /// Number of elements requested
        elements: usize,
        /// Underlying reservation failure
        #[source]
        source: TryReserveError,
    },

    /// A worker thread could not be started.
    #[error("Failed to spawn worker thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// The data-parallel pool used by the LSD variants could not be built.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
