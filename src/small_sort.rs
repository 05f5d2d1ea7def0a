//! Sequential radix sort with an explicit recursion stack.
//!
//! A [`SmallSortJob`] handles ranges below the parallel threshold. Instead of
//! recursing on the call stack it keeps a vector of [`RadixFrame`]s, one per
//! digit depth, each remembering which of its buckets is next. Keeping the
//! recursion in a plain vector lets the job hand work away: whenever the
//! scheduler reports an idle worker, the bottom frame (the coarsest remaining
//! work) is dissolved into independent jobs, one per unprocessed bucket.

use crate::context::SortContext;
use crate::core::Digit;
use crate::scheduler::JobScheduler;
use crate::shadow::ShadowBuffer;
use log::debug;
use std::cmp::Ordering as CmpOrdering;

/// One level of the explicit recursion: a range partitioned by one digit.
pub(crate) struct RadixFrame<'a, T> {
    buffer: ShadowBuffer<'a, T>,
    depth: usize,
    /// Next bucket to process.
    idx: usize,
    /// Exclusive prefix sums, `radix + 1` entries, last one is the length.
    bkt: Vec<usize>,
}

impl<'a, T: Copy> RadixFrame<'a, T> {
    /// Partitions `buffer` by the digit at `depth`.
    ///
    /// The buffer must not be flipped; the partitioned data ends up in the
    /// original range either way.
    pub(crate) fn new<K, F, C>(
        ctx: &SortContext<T, K, F, C>,
        buffer: ShadowBuffer<'a, T>,
        depth: usize,
    ) -> Self
    where
        T: Send + Sync,
        K: Digit,
        F: Fn(&T, usize) -> K + Sync,
        C: Fn(&T, &T) -> CmpOrdering + Sync,
    {
        debug_assert!(!buffer.is_flipped());
        let n = buffer.len();
        let key = |v: &T| ctx.bucket(v, depth);

        // SAFETY: the owning job has exclusive access to its range.
        let data = unsafe { buffer.active_mut() };
        let mut sizes = vec![0usize; K::RADIX];
        for value in data.iter() {
            sizes[key(value)] += 1;
        }

        let buffer = if ctx.config.in_place_small_sort {
            permute_in_place(data, &sizes, key);
            buffer
        } else {
            let mut next = exclusive_prefix_sum(&sizes);
            let out = buffer.shadow_ptr();
            for value in data.iter() {
                let b = key(value);
                // SAFETY: `next[b]` stays inside bucket `b` of the shadow range.
                unsafe { out.add(next[b]).write(*value) };
                next[b] += 1;
            }
            // SAFETY: still exclusive, and `data` is no longer used.
            unsafe { buffer.flip(0, n).copy_back() }
        };

        let mut bkt = exclusive_prefix_sum(&sizes);
        assert_eq!(
            bkt[K::RADIX - 1] + sizes[K::RADIX - 1],
            n,
            "bucket sizes do not add up to the range length"
        );
        bkt.push(n);

        Self {
            buffer,
            depth,
            idx: 0,
            bkt,
        }
    }

    /// Returns `(offset, len)` of the next non-empty bucket and advances.
    fn next_bucket(&mut self) -> Option<(usize, usize)> {
        while self.idx + 1 < self.bkt.len() {
            let b = self.idx;
            self.idx += 1;
            let len = self.bkt[b + 1] - self.bkt[b];
            if len > 0 {
                return Some((self.bkt[b], len));
            }
        }
        None
    }

    pub(crate) fn boundaries(&self) -> &[usize] {
        &self.bkt
    }
}

/// Exclusive prefix sum: `out[b]` is the first slot of bucket `b`.
fn exclusive_prefix_sum(sizes: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(sizes.len() + 1);
    let mut sum = 0;
    for &size in sizes {
        out.push(sum);
        sum += size;
    }
    out
}

/// In-place cycle-leader permutation into buckets of the given sizes.
fn permute_in_place<T: Copy>(data: &mut [T], sizes: &[usize], key: impl Fn(&T) -> usize) {
    let n = data.len();

    // bucket ends, consumed downwards while placing elements
    let mut ends = Vec::with_capacity(sizes.len());
    let mut sum = 0;
    let mut last_size = 0;
    for &size in sizes {
        sum += size;
        ends.push(sum);
        if size > 0 {
            last_size = size;
        }
    }

    // once all but the last bucket are placed, the last one is too
    let mut i = 0;
    while i < n - last_size {
        let mut perm = data[i];
        let mut b = key(&perm);
        loop {
            ends[b] -= 1;
            let j = ends[b];
            if j <= i {
                break;
            }
            std::mem::swap(&mut perm, &mut data[j]);
            b = key(&perm);
        }
        data[i] = perm;
        i += sizes[b];
    }
}

/// Sequential sort of one range, starting at a given digit depth.
pub(crate) struct SmallSortJob<'a, T> {
    buffer: ShadowBuffer<'a, T>,
    depth: usize,
}

impl<'a, T> SmallSortJob<'a, T>
where
    T: Copy + Send + Sync + 'a,
{
    pub(crate) fn new(buffer: ShadowBuffer<'a, T>, depth: usize) -> Self {
        Self { buffer, depth }
    }

    pub(crate) fn run<K, F, C>(self, ctx: &'a SortContext<T, K, F, C>, pool: &JobScheduler<'a>)
    where
        K: Digit,
        F: Fn(&T, usize) -> K + Sync,
        C: Fn(&T, &T) -> CmpOrdering + Sync,
    {
        // SAFETY: this job exclusively owns its range from here on.
        let buffer = unsafe { self.buffer.copy_back() };
        let n = buffer.len();
        let threshold = ctx.config.subsort_threshold;

        debug!("Process SmallSortJob of size {n} at depth {}", self.depth);

        if n < threshold || self.depth >= ctx.max_depth {
            ctx.sub_sort(unsafe { buffer.active_mut() });
            return;
        }

        // Frames below `bottom` were donated and are no longer ours.
        let mut bottom = 0;
        let mut stack = vec![RadixFrame::new(ctx, buffer, self.depth)];

        while stack.len() > bottom {
            while let Some(top) = stack.last_mut() {
                let Some((offset, len)) = top.next_bucket() else {
                    break;
                };
                let sub = top.buffer.sub(offset, len);
                let depth = top.depth + 1;

                if len == 1 {
                    ctx.done(1);
                    continue;
                }
                if len < threshold || depth >= ctx.max_depth {
                    // SAFETY: the bucket is part of our range.
                    ctx.sub_sort(unsafe { sub.active_mut() });
                } else {
                    stack.push(RadixFrame::new(ctx, sub, depth));
                }

                if ctx.config.work_sharing && pool.has_idle_worker() {
                    debug!("Freeing bottom level of SmallSortJob's radix stack");
                    let frame = &mut stack[bottom];
                    bottom += 1;
                    while let Some((offset, len)) = frame.next_bucket() {
                        if len == 1 {
                            ctx.done(1);
                            continue;
                        }
                        ctx.record_donation();
                        ctx.enqueue_small_job(pool, frame.buffer.sub(offset, len), frame.depth + 1);
                    }
                }
            }
            stack.pop();
        }
    }
}
