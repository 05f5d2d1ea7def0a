//! Shared state of one MSD sort call.
//!
//! The context owns the key extractor, the comparison fallback and the
//! thresholds, and decides for every range whether it becomes a parallel
//! [`BigRadixStep`](crate::big_step::BigRadixStep) or a sequential
//! [`SmallSortJob`](crate::small_sort::SmallSortJob).

use crate::big_step::BigRadixStep;
use crate::config::SortConfig;
use crate::core::Digit;
use crate::scheduler::JobScheduler;
use crate::shadow::ShadowBuffer;
use crate::small_sort::SmallSortJob;
use std::cmp::Ordering as CmpOrdering;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters describing how a sort call was executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Parallel count/distribute steps started.
    pub big_steps: usize,
    /// Sequential jobs executed, donated ones included.
    pub small_jobs: usize,
    /// Jobs created by idle-worker stack donation.
    pub donated_jobs: usize,
    /// Ranges finished by the comparison fallback.
    pub comparison_sorts: usize,
}

#[derive(Default)]
struct StatCounters {
    big_steps: AtomicUsize,
    small_jobs: AtomicUsize,
    donated_jobs: AtomicUsize,
    comparison_sorts: AtomicUsize,
}

pub(crate) struct SortContext<T, K, F, C> {
    pub(crate) config: SortConfig,
    key_fn: F,
    compare: C,
    total_size: usize,
    /// Elements not yet in their final position, only maintained when
    /// `config.track_remaining` is set.
    rest_size: AtomicUsize,
    pub(crate) max_depth: usize,
    stats: StatCounters,
    _marker: PhantomData<fn(&T) -> K>,
}

impl<T, K, F, C> SortContext<T, K, F, C>
where
    T: Copy + Send + Sync,
    K: Digit,
    F: Fn(&T, usize) -> K + Sync,
    C: Fn(&T, &T) -> CmpOrdering + Sync,
{
    pub(crate) fn new(
        config: SortConfig,
        key_fn: F,
        compare: C,
        total_size: usize,
        max_depth: usize,
    ) -> Self {
        Self {
            config,
            key_fn,
            compare,
            total_size,
            rest_size: AtomicUsize::new(total_size),
            max_depth,
            stats: StatCounters::default(),
            _marker: PhantomData,
        }
    }

    /// Bucket index of `value` at `depth`.
    #[inline(always)]
    pub(crate) fn bucket(&self, value: &T, depth: usize) -> usize {
        (self.key_fn)(value, depth).index()
    }

    /// Ranges longer than this are split into a parallel radix step.
    pub(crate) fn sequential_threshold(&self) -> usize {
        let base = if self.config.track_remaining {
            self.rest_size.load(Ordering::Relaxed)
        } else {
            self.total_size
        };
        self.config
            .min_parallel_chunk
            .max(base / self.config.threads)
    }

    /// Records that `n` elements reached their final position.
    #[inline]
    pub(crate) fn done(&self, n: usize) {
        if self.config.track_remaining {
            self.rest_size.fetch_sub(n, Ordering::Relaxed);
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.rest_size.load(Ordering::Acquire)
    }

    /// Comparison-sorts a range that radix sorting no longer pays off for.
    pub(crate) fn sub_sort(&self, data: &mut [T]) {
        self.stats.comparison_sorts.fetch_add(1, Ordering::Relaxed);
        data.sort_unstable_by(&self.compare);
        self.done(data.len());
    }

    /// Schedules `buffer` for sorting from `depth` on.
    pub(crate) fn enqueue<'a>(
        &'a self,
        pool: &JobScheduler<'a>,
        buffer: ShadowBuffer<'a, T>,
        depth: usize,
    ) {
        if self.config.parallel_radix_step
            && depth < self.max_depth
            && buffer.len() > self.sequential_threshold()
        {
            self.stats.big_steps.fetch_add(1, Ordering::Relaxed);
            BigRadixStep::start(self, pool, buffer, depth);
        } else {
            self.enqueue_small_job(pool, buffer, depth);
        }
    }

    /// Schedules `buffer` as a sequential job regardless of its size.
    pub(crate) fn enqueue_small_job<'a>(
        &'a self,
        pool: &JobScheduler<'a>,
        buffer: ShadowBuffer<'a, T>,
        depth: usize,
    ) {
        pool.enqueue(move |pool| {
            self.stats.small_jobs.fetch_add(1, Ordering::Relaxed);
            SmallSortJob::new(buffer, depth).run(self, pool);
        });
    }

    pub(crate) fn record_donation(&self) {
        self.stats.donated_jobs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stats(&self) -> SortStats {
        SortStats {
            big_steps: self.stats.big_steps.load(Ordering::Relaxed),
            small_jobs: self.stats.small_jobs.load(Ordering::Relaxed),
            donated_jobs: self.stats.donated_jobs.load(Ordering::Relaxed),
            comparison_sorts: self.stats.comparison_sorts.load(Ordering::Relaxed),
        }
    }
}
