//! Tuning knobs for the MSD engine.

use crate::error::{Result, SortError};

/// Default cutoff below which ranges are comparison sorted.
pub const DEFAULT_SUBSORT_THRESHOLD: usize = 32;

/// Default lower bound on the size of one BigRadixStep chunk.
pub const DEFAULT_MIN_PARALLEL_CHUNK: usize = 32;

/// Configuration of a parallel radix sort call.
///
/// All defaults match the tuned engine: parallel radix steps and work sharing
/// enabled, out-of-place sequential steps, threshold based on the total size.
///
/// # Examples
///
/// ```
/// use prsort::SortConfig;
///
/// let config = SortConfig::default()
///     .with_threads(4)
///     .with_work_sharing(false);
/// assert!(config.validate().is_ok());
/// assert!(SortConfig::default().with_threads(0).validate().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortConfig {
    /// Number of worker threads.
    pub threads: usize,

    /// Ranges shorter than this are sorted with the comparison fallback.
    pub subsort_threshold: usize,

    /// Lower bound of the sequential threshold, i.e. of the chunk size a
    /// BigRadixStep hands to one count or distribute task.
    pub min_parallel_chunk: usize,

    /// Split ranges above the sequential threshold into parallel steps.
    pub parallel_radix_step: bool,

    /// Let sequential jobs donate the bottom of their stack to idle workers.
    pub work_sharing: bool,

    /// Base the sequential threshold on the number of elements not yet
    /// finalized instead of the total input size.
    pub track_remaining: bool,

    /// Permute sequential radix steps in place instead of scattering through
    /// the shadow buffer.
    pub in_place_small_sort: bool,
}

impl SortConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(SortError::InvalidConfig {
                parameter: "threads",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.subsort_threshold == 0 {
            return Err(SortError::InvalidConfig {
                parameter: "subsort_threshold",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.min_parallel_chunk == 0 {
            return Err(SortError::InvalidConfig {
                parameter: "min_parallel_chunk",
                reason: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub fn with_subsort_threshold(mut self, threshold: usize) -> Self {
        self.subsort_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_min_parallel_chunk(mut self, chunk: usize) -> Self {
        self.min_parallel_chunk = chunk;
        self
    }

    #[must_use]
    pub fn with_parallel_radix_step(mut self, enabled: bool) -> Self {
        self.parallel_radix_step = enabled;
        self
    }

    #[must_use]
    pub fn with_work_sharing(mut self, enabled: bool) -> Self {
        self.work_sharing = enabled;
        self
    }

    #[must_use]
    pub fn with_track_remaining(mut self, enabled: bool) -> Self {
        self.track_remaining = enabled;
        self
    }

    #[must_use]
    pub fn with_in_place_small_sort(mut self, enabled: bool) -> Self {
        self.in_place_small_sort = enabled;
        self
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            subsort_threshold: DEFAULT_SUBSORT_THRESHOLD,
            min_parallel_chunk: DEFAULT_MIN_PARALLEL_CHUNK,
            parallel_radix_step: true,
            work_sharing: true,
            track_remaining: false,
            in_place_small_sort: false,
        }
    }
}
