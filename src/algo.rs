//! Parallel MSD radix sort frontends.
//!
//! The engine combines two radix sort implementations:
//! - **BigRadixStep**: out-of-place and parallelized over chunks, for ranges
//!   larger than `total / threads`.
//! - **SmallSortJob**: sequential with an explicit recursion stack, which lets
//!   a busy thread give away its coarsest pending buckets when others idle.
//! - **Comparison sort**: fallback for buckets smaller than the subsort
//!   threshold and for ranges whose keys are exhausted (`max_depth`).
//!
//! The main entry points are [`radix_sort`], [`radix_sort_by`] and
//! [`par_radix_sort`].

use crate::config::SortConfig;
use crate::context::{SortContext, SortStats};
use crate::core::{Digit, RadixValue};
use crate::error::{Result, SortError};
use crate::scheduler::JobScheduler;
use crate::shadow::ShadowBuffer;
use log::debug;
use std::cmp::Ordering;

/// Sorts `data` in place by the digits `key_fn` extracts.
///
/// Digits are taken most significant first: `key_fn(v, 0)` is the top digit,
/// `key_fn(v, 1)` the next one, and so on. Digit depths `>= max_depth` are never
/// requested; ranges that are still unsorted at that depth, as well as small
/// buckets, are finished with `T`'s [`Ord`]. The ordering must agree with the
/// digits.
///
/// The digit type picks the radix: `u8` for 256 buckets, `u16` for 65536.
///
/// # Examples
///
/// ```
/// use prsort::radix_sort;
///
/// let mut data: Vec<u32> = (0..10_000u32).map(|i| i.wrapping_mul(2_654_435_761)).collect();
/// radix_sort(&mut data, |v: &u32, depth| (v >> (24 - 8 * depth)) as u8, 4).unwrap();
///
/// assert!(data.windows(2).all(|w| w[0] <= w[1]));
/// ```
pub fn radix_sort<T, K, F>(data: &mut [T], key_fn: F, max_depth: usize) -> Result<SortStats>
where
    T: Ord + Copy + Send + Sync,
    K: Digit,
    F: Fn(&T, usize) -> K + Sync,
{
    RadixSorter::default().sort(data, key_fn, max_depth)
}

/// Like [`radix_sort`], with an explicit comparison fallback and configuration.
///
/// # Examples
///
/// ```
/// use prsort::{radix_sort_by, SortConfig};
///
/// #[derive(Clone, Copy)]
/// struct Record {
///     key: u16,
///     payload: u64,
/// }
///
/// let mut records: Vec<Record> = (0..1000u64)
///     .map(|i| Record { key: (i * 37 % 1000) as u16, payload: i })
///     .collect();
///
/// let config = SortConfig::default().with_threads(2);
/// radix_sort_by(
///     &mut records,
///     |r: &Record, _depth| r.key,
///     |a: &Record, b: &Record| a.key.cmp(&b.key),
///     1,
///     &config,
/// )
/// .unwrap();
///
/// assert!(records.windows(2).all(|w| w[0].key <= w[1].key));
/// ```
pub fn radix_sort_by<T, K, F, C>(
    data: &mut [T],
    key_fn: F,
    compare: C,
    max_depth: usize,
    config: &SortConfig,
) -> Result<SortStats>
where
    T: Copy + Send + Sync,
    K: Digit,
    F: Fn(&T, usize) -> K + Sync,
    C: Fn(&T, &T) -> Ordering + Sync,
{
    RadixSorter::new(*config).sort_by(data, key_fn, compare, max_depth)
}

/// Sorts primitive integers with 8-bit digits.
///
/// # Examples
///
/// ```
/// use prsort::par_radix_sort;
///
/// let mut data = vec![3i64, -7, 42, 0, -1, i64::MIN];
/// par_radix_sort(&mut data).unwrap();
///
/// assert_eq!(data, vec![i64::MIN, -7, -1, 0, 3, 42]);
/// ```
pub fn par_radix_sort<V: RadixValue + Ord>(data: &mut [V]) -> Result<SortStats> {
    radix_sort(data, |v: &V, depth| v.msd_digit::<u8>(depth), V::msd_depth::<u8>())
}

/// Reusable MSD radix sort configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct RadixSorter {
    config: SortConfig,
}

impl RadixSorter {
    pub fn new(config: SortConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Sorts `data`, using `T`'s [`Ord`] as the comparison fallback.
    pub fn sort<T, K, F>(&self, data: &mut [T], key_fn: F, max_depth: usize) -> Result<SortStats>
    where
        T: Ord + Copy + Send + Sync,
        K: Digit,
        F: Fn(&T, usize) -> K + Sync,
    {
        self.sort_by(data, key_fn, T::cmp, max_depth)
    }

    /// Sorts `data` with an explicit comparison fallback.
    ///
    /// # Errors
    ///
    /// Fails without touching `data` if the configuration is invalid, the
    /// shadow buffer cannot be allocated or a worker thread cannot be started.
    pub fn sort_by<T, K, F, C>(
        &self,
        data: &mut [T],
        key_fn: F,
        compare: C,
        max_depth: usize,
    ) -> Result<SortStats>
    where
        T: Copy + Send + Sync,
        K: Digit,
        F: Fn(&T, usize) -> K + Sync,
        C: Fn(&T, &T) -> Ordering + Sync,
    {
        self.config.validate()?;

        let n = data.len();
        if n <= 1 {
            return Ok(SortStats::default());
        }

        let mut shadow: Vec<T> = Vec::new();
        shadow
            .try_reserve_exact(n)
            .map_err(|source| SortError::Allocation { elements: n, source })?;
        shadow.extend_from_slice(data);

        debug!(
            "Radix sorting {n} elements with radix {} on {} threads",
            K::RADIX,
            self.config.threads
        );

        let ctx = SortContext::new(self.config, key_fn, compare, n, max_depth);
        let buffer = ShadowBuffer::new(data, &mut shadow);
        let pool = JobScheduler::new(self.config.threads);
        pool.run(|pool| {
            ctx.enqueue(pool, buffer, 0);
            pool.run_until_empty();
        })?;

        if self.config.track_remaining {
            assert_eq!(ctx.remaining(), 0, "elements left unsorted");
        }

        let stats = ctx.stats();
        debug!("Radix sort finished: {stats:?}");
        Ok(stats)
    }
}
