//! Out-of-place parallel radix step for large ranges.
//!
//! A [`BigRadixStep`] splits its range into `parts` chunks and runs in three
//! phases, each phase one task per chunk:
//!
//! 1. **Count**: every chunk fills a private histogram and stores it in its own
//!    slot of the shared `parts × radix` table.
//! 2. **Prefix sum**: the task finishing the last count turns the table into an
//!    inclusive prefix sum in bucket-major, chunk-minor order.
//! 3. **Distribute**: every chunk moves its elements into the shadow range,
//!    filling its part of each bucket from the top down.
//!
//! Phase transitions happen on the thread that decrements the work counter to
//! zero, nobody waits. Buckets are finally re-enqueued one digit deeper with the
//! buffer flipped, since their data now lives on the shadow side.

use crate::context::SortContext;
use crate::core::Digit;
use crate::scheduler::JobScheduler;
use crate::shadow::ShadowBuffer;
use log::{debug, trace};
use std::cell::UnsafeCell;
use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// `parts × radix` counters, one row per chunk.
///
/// Rows are only ever written by the task owning the chunk, and the whole table
/// only by the task that completed a phase.
struct BucketTable {
    cells: Box<[UnsafeCell<usize>]>,
    radix: usize,
}

// SAFETY: see the access discipline above; phases are separated by the
// acquire/release work counter.
unsafe impl Sync for BucketTable {}

impl BucketTable {
    fn new(parts: usize, radix: usize) -> Self {
        let cells = (0..parts * radix).map(|_| UnsafeCell::new(0)).collect();
        Self { cells, radix }
    }

    fn base(&self) -> *mut usize {
        UnsafeCell::raw_get(self.cells.as_ptr())
    }

    /// # Safety
    ///
    /// Nobody may write row `part` concurrently.
    unsafe fn row(&self, part: usize) -> &[usize] {
        unsafe { std::slice::from_raw_parts(self.base().add(part * self.radix), self.radix) }
    }

    /// # Safety
    ///
    /// The caller must be the only one accessing row `part`.
    #[allow(clippy::mut_from_ref)]
    unsafe fn row_mut(&self, part: usize) -> &mut [usize] {
        unsafe { std::slice::from_raw_parts_mut(self.base().add(part * self.radix), self.radix) }
    }

    /// # Safety
    ///
    /// The caller must be the only one accessing the table.
    #[allow(clippy::mut_from_ref)]
    unsafe fn all_mut(&self) -> &mut [usize] {
        unsafe { std::slice::from_raw_parts_mut(self.base(), self.cells.len()) }
    }
}

/// Inclusive prefix sum over a chunk-major `parts × radix` table, visiting
/// bucket by bucket and chunk by chunk within a bucket. Returns the total.
///
/// Afterwards `table[p * radix + b]` is one past the last slot chunk `p` owns
/// in bucket `b`.
pub(crate) fn snake_prefix_sum(table: &mut [usize], parts: usize, radix: usize) -> usize {
    debug_assert_eq!(table.len(), parts * radix);
    let mut sum = 0;
    for b in 0..radix {
        for p in 0..parts {
            let cell = &mut table[p * radix + b];
            sum += *cell;
            *cell = sum;
        }
    }
    sum
}

/// Parallel three-phase radix step over one range.
pub(crate) struct BigRadixStep<'a, T> {
    buffer: ShadowBuffer<'a, T>,
    depth: usize,
    parts: usize,
    psize: usize,
    /// Chunk tasks of the current phase still running.
    pwork: AtomicUsize,
    table: BucketTable,
}

impl<'a, T> BigRadixStep<'a, T>
where
    T: Copy + Send + Sync + 'a,
{
    /// Splits `buffer` into chunks and enqueues one count task per chunk.
    pub(crate) fn start<K, F, C>(
        ctx: &'a SortContext<T, K, F, C>,
        pool: &JobScheduler<'a>,
        buffer: ShadowBuffer<'a, T>,
        depth: usize,
    ) where
        K: Digit,
        F: Fn(&T, usize) -> K + Sync,
        C: Fn(&T, &T) -> CmpOrdering + Sync,
    {
        let n = buffer.len();
        let threshold = ctx.sequential_threshold();
        let parts = n.div_ceil(threshold).max(1);
        let psize = n.div_ceil(parts);

        debug!("Area of {n} elements at depth {depth} split into {parts} parts of size {psize}");

        let step = Arc::new(Self {
            buffer,
            depth,
            parts,
            psize,
            pwork: AtomicUsize::new(parts),
            table: BucketTable::new(parts, K::RADIX),
        });
        for p in 0..parts {
            let step = Arc::clone(&step);
            pool.enqueue(move |pool| step.count(ctx, pool, p));
        }
    }

    fn chunk(&self, p: usize) -> (usize, usize) {
        let n = self.buffer.len();
        let end = ((p + 1) * self.psize).min(n);
        let begin = (p * self.psize).min(end);
        (begin, end)
    }

    fn count<K, F, C>(self: Arc<Self>, ctx: &'a SortContext<T, K, F, C>, pool: &JobScheduler<'a>, p: usize)
    where
        K: Digit,
        F: Fn(&T, usize) -> K + Sync,
        C: Fn(&T, &T) -> CmpOrdering + Sync,
    {
        trace!("Process CountJob {p} at depth {}", self.depth);

        let (begin, end) = self.chunk(p);
        // SAFETY: the range is only read until all counts are in.
        let data = unsafe { self.buffer.active() };

        let mut histogram = vec![0usize; K::RADIX];
        for value in &data[begin..end] {
            histogram[ctx.bucket(value, self.depth)] += 1;
        }
        // SAFETY: row `p` belongs to this task.
        unsafe { self.table.row_mut(p) }.copy_from_slice(&histogram);

        if self.pwork.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.count_finished(ctx, pool);
        }
    }

    fn count_finished<K, F, C>(self: Arc<Self>, ctx: &'a SortContext<T, K, F, C>, pool: &JobScheduler<'a>)
    where
        K: Digit,
        F: Fn(&T, usize) -> K + Sync,
        C: Fn(&T, &T) -> CmpOrdering + Sync,
    {
        trace!("Finishing CountJob at depth {} with prefix sum", self.depth);

        // SAFETY: every count task has finished, nobody else touches the table.
        let table = unsafe { self.table.all_mut() };
        let sum = snake_prefix_sum(table, self.parts, K::RADIX);
        assert_eq!(
            sum,
            self.buffer.len(),
            "bucket sizes do not add up to the range length"
        );

        self.pwork.store(self.parts, Ordering::Release);
        for p in 0..self.parts {
            let step = Arc::clone(&self);
            pool.enqueue(move |pool| step.distribute(ctx, pool, p));
        }
    }

    fn distribute<K, F, C>(self: Arc<Self>, ctx: &'a SortContext<T, K, F, C>, pool: &JobScheduler<'a>, p: usize)
    where
        K: Digit,
        F: Fn(&T, usize) -> K + Sync,
        C: Fn(&T, &T) -> CmpOrdering + Sync,
    {
        trace!("Process DistributeJob {p} at depth {}", self.depth);

        let (begin, end) = self.chunk(p);
        // SAFETY: the active range is read-only during this phase; writes go
        // to the shadow range.
        let data = unsafe { self.buffer.active() };
        let out = self.buffer.shadow_ptr();

        // SAFETY: row `p` is only read by this task until it finishes.
        let mut next = unsafe { self.table.row(p) }.to_vec();
        for value in &data[begin..end] {
            let b = ctx.bucket(value, self.depth);
            next[b] -= 1;
            // SAFETY: the prefix sum hands every (chunk, bucket) pair a
            // disjoint slot range inside the shadow range.
            unsafe { out.add(next[b]).write(*value) };
        }

        // chunk 0 comes first in every bucket, so its final cursors are the
        // bucket starts
        if p == 0 {
            // SAFETY: row 0 belongs to this task.
            unsafe { self.table.row_mut(0) }.copy_from_slice(&next);
        }

        if self.pwork.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.distribute_finished(ctx, pool);
        }
    }

    fn distribute_finished<K, F, C>(&self, ctx: &'a SortContext<T, K, F, C>, pool: &JobScheduler<'a>)
    where
        K: Digit,
        F: Fn(&T, usize) -> K + Sync,
        C: Fn(&T, &T) -> CmpOrdering + Sync,
    {
        trace!("Finishing DistributeJob at depth {} with enqueuing subjobs", self.depth);

        let n = self.buffer.len();
        // SAFETY: every distribute task has finished.
        let mut boundaries = unsafe { self.table.row(0) }.to_vec();
        boundaries.push(n);
        assert_eq!(boundaries[0], 0, "first bucket must start at the range start");
        assert!(
            boundaries.windows(2).all(|w| w[0] <= w[1]),
            "bucket boundaries must be non-decreasing"
        );

        for w in boundaries.windows(2) {
            let (lo, hi) = (w[0], w[1]);
            match hi - lo {
                0 => {}
                1 => {
                    // SAFETY: the singleton is owned by nobody else.
                    unsafe { self.buffer.flip(lo, 1).copy_back() };
                    ctx.done(1);
                }
                len => ctx.enqueue(pool, self.buffer.flip(lo, len), self.depth + 1),
            }
        }
    }
}
