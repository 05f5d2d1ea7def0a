//! Parallel LSD radix sort.
//!
//! One counting-sort pass per key byte, least significant first, each pass out
//! of place between the input and an auxiliary buffer:
//!
//! 1. Every thread counts the current byte over its static chunk of the input.
//! 2. A snake prefix sum (bucket-major, thread-minor) turns the per-thread
//!    counts into a start offset for every (thread, bucket) pair.
//! 3. Every thread rescans its chunk and moves each element to the next slot of
//!    its bucket.
//!
//! Three variants differ only in how the bytes are obtained and written:
//! - [`lsd_radix_sort_cached`]: extracts the byte of every element once per
//!   pass into a byte array shared by both scans.
//! - [`lsd_radix_sort_recompute`]: calls the key function in both scans.
//! - [`lsd_radix_sort_write_back`]: like the recompute variant, but every
//!   thread collects outgoing elements in a small per-bucket buffer on its
//!   stack and flushes full buffers, so threads rarely write the same cache
//!   lines. The buffer limits elements to [`WRITE_BACK_MAX_ELEMENT_SIZE`] bytes.
//!
//! All variants are stable and produce identical output.

use crate::core::RadixValue;
use crate::error::{Result, SortError};
use cuneiform::cuneiform;
use log::debug;
use rayon::prelude::*;
use std::mem::MaybeUninit;

/// Number of buckets per pass (one byte).
const RADIX_BUCKETS: usize = 256;

/// Slots per bucket in the write-back buffer.
pub const WRITE_BACK_SLOTS: usize = 32;

/// Largest element size accepted by [`lsd_radix_sort_write_back`].
pub const WRITE_BACK_MAX_ELEMENT_SIZE: usize = 16;

// Cache-aligned counts struct.
#[cuneiform]
struct BucketCounts {
    data: [usize; RADIX_BUCKETS],
}

/// Destination pointer shared by the redistribution tasks.
#[derive(Clone, Copy)]
struct OutPtr<T>(*mut T);

// SAFETY: tasks write disjoint slot ranges handed out by the prefix sum.
unsafe impl<T: Send> Send for OutPtr<T> {}
unsafe impl<T: Send> Sync for OutPtr<T> {}

impl<T> OutPtr<T> {
    #[inline(always)]
    fn get(self) -> *mut T {
        self.0
    }
}

/// How the digits of one pass are extracted and the elements written out.
trait Redistribution: Sized + Send {
    fn prepare(len: usize) -> Result<Self>;

    fn pass<T, V, F>(&mut self, input: &[T], out: OutPtr<T>, chunk_len: usize, key_fn: &F, pass: usize)
    where
        T: Copy + Send + Sync,
        V: RadixValue,
        F: Fn(&T) -> V + Sync;
}

/// Counts one chunk.
fn count_chunk<I: Iterator<Item = usize>>(digits: I) -> BucketCounts {
    let mut counts = BucketCounts {
        data: [0; RADIX_BUCKETS],
    };
    digits.for_each(|d| counts.data[d] += 1);
    counts
}

/// Exclusive snake prefix sum: `starts[t][b]` is the first slot thread `t`
/// writes in bucket `b`.
fn snake_offsets(counts: &[BucketCounts]) -> Vec<[usize; RADIX_BUCKETS]> {
    let mut starts = vec![[0usize; RADIX_BUCKETS]; counts.len()];
    let mut sum = 0;
    for b in 0..RADIX_BUCKETS {
        for (t, c) in counts.iter().enumerate() {
            starts[t][b] = sum;
            sum += c.data[b];
        }
    }
    starts
}

struct CachedDigits {
    digits: Vec<u8>,
}

impl Redistribution for CachedDigits {
    fn prepare(len: usize) -> Result<Self> {
        let mut digits = Vec::new();
        digits
            .try_reserve_exact(len)
            .map_err(|source| SortError::Allocation { elements: len, source })?;
        digits.resize(len, 0);
        Ok(Self { digits })
    }

    fn pass<T, V, F>(&mut self, input: &[T], out: OutPtr<T>, chunk_len: usize, key_fn: &F, pass: usize)
    where
        T: Copy + Send + Sync,
        V: RadixValue,
        F: Fn(&T) -> V + Sync,
    {
        self.digits
            .par_chunks_mut(chunk_len)
            .zip(input.par_chunks(chunk_len))
            .for_each(|(digits, chunk)| {
                for (d, v) in digits.iter_mut().zip(chunk) {
                    *d = key_fn(v).lsd_byte(pass);
                }
            });

        let counts: Vec<BucketCounts> = self
            .digits
            .par_chunks(chunk_len)
            .map(|digits| count_chunk(digits.iter().map(|&d| d as usize)))
            .collect();
        let starts = snake_offsets(&counts);

        input
            .par_chunks(chunk_len)
            .zip(self.digits.par_chunks(chunk_len))
            .zip(starts.par_iter())
            .for_each(|((chunk, digits), start)| {
                let mut next = *start;
                for (v, &d) in chunk.iter().zip(digits) {
                    let b = d as usize;
                    // SAFETY: slot ranges of different (thread, bucket) pairs
                    // are disjoint and inside the output.
                    unsafe { out.get().add(next[b]).write(*v) };
                    next[b] += 1;
                }
            });
    }
}

struct RecomputeDigits;

impl Redistribution for RecomputeDigits {
    fn prepare(_len: usize) -> Result<Self> {
        Ok(Self)
    }

    fn pass<T, V, F>(&mut self, input: &[T], out: OutPtr<T>, chunk_len: usize, key_fn: &F, pass: usize)
    where
        T: Copy + Send + Sync,
        V: RadixValue,
        F: Fn(&T) -> V + Sync,
    {
        let digit = |v: &T| key_fn(v).lsd_byte(pass) as usize;

        let counts: Vec<BucketCounts> = input
            .par_chunks(chunk_len)
            .map(|chunk| count_chunk(chunk.iter().map(digit)))
            .collect();
        let starts = snake_offsets(&counts);

        input
            .par_chunks(chunk_len)
            .zip(starts.par_iter())
            .for_each(|(chunk, start)| {
                let mut next = *start;
                for v in chunk {
                    let b = digit(v);
                    // SAFETY: see `CachedDigits::pass`.
                    unsafe { out.get().add(next[b]).write(*v) };
                    next[b] += 1;
                }
            });
    }
}

struct WriteBackBuffer;

impl Redistribution for WriteBackBuffer {
    fn prepare(_len: usize) -> Result<Self> {
        Ok(Self)
    }

    fn pass<T, V, F>(&mut self, input: &[T], out: OutPtr<T>, chunk_len: usize, key_fn: &F, pass: usize)
    where
        T: Copy + Send + Sync,
        V: RadixValue,
        F: Fn(&T) -> V + Sync,
    {
        const {
            assert!(
                size_of::<T>() <= WRITE_BACK_MAX_ELEMENT_SIZE,
                "element too large for the stack-based write-back buffer"
            )
        };

        let digit = |v: &T| key_fn(v).lsd_byte(pass) as usize;

        let counts: Vec<BucketCounts> = input
            .par_chunks(chunk_len)
            .map(|chunk| count_chunk(chunk.iter().map(digit)))
            .collect();
        let starts = snake_offsets(&counts);

        input
            .par_chunks(chunk_len)
            .zip(starts.par_iter())
            .for_each(|(chunk, start)| {
                let mut next = *start;
                let mut local = [[MaybeUninit::<T>::uninit(); WRITE_BACK_SLOTS]; RADIX_BUCKETS];
                let mut fill = [0usize; RADIX_BUCKETS];

                for v in chunk {
                    let b = digit(v);
                    local[b][fill[b]].write(*v);
                    fill[b] += 1;
                    if fill[b] == WRITE_BACK_SLOTS {
                        // SAFETY: the slots are initialized and the target
                        // range belongs to this (thread, bucket) pair.
                        unsafe { flush(&local[b], out.get().add(next[b])) };
                        next[b] += WRITE_BACK_SLOTS;
                        fill[b] = 0;
                    }
                }
                for b in 0..RADIX_BUCKETS {
                    // SAFETY: as above, for the partially filled remainder.
                    unsafe { flush(&local[b][..fill[b]], out.get().add(next[b])) };
                }
            });
    }
}

/// Copies initialized buffer slots to `dst`.
///
/// # Safety
///
/// All of `slots` must be initialized and `dst` valid for `slots.len()` writes.
#[inline(always)]
unsafe fn flush<T: Copy>(slots: &[MaybeUninit<T>], dst: *mut T) {
    unsafe { std::ptr::copy_nonoverlapping(slots.as_ptr().cast::<T>(), dst, slots.len()) };
}

fn lsd_sort<T, V, F, R>(data: &mut [T], key_fn: F, threads: usize) -> Result<()>
where
    T: Copy + Send + Sync,
    V: RadixValue,
    F: Fn(&T) -> V + Sync,
    R: Redistribution,
{
    if threads == 0 {
        return Err(SortError::InvalidConfig {
            parameter: "threads",
            reason: "must be >= 1".to_string(),
        });
    }
    let n = data.len();
    if n <= 1 {
        return Ok(());
    }

    let mut aux: Vec<T> = Vec::new();
    aux.try_reserve_exact(n)
        .map_err(|source| SortError::Allocation { elements: n, source })?;
    aux.extend_from_slice(data);
    let mut strategy = R::prepare(n)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("prsort-lsd-{i}"))
        .build()?;

    // static division, one chunk per thread
    let chunk_len = n.div_ceil(threads);
    let passes = V::BYTES;
    debug!("LSD radix sort of {n} elements: {passes} passes on {threads} threads");

    let mut src = data.as_mut_ptr();
    let mut dst = aux.as_mut_ptr();
    for pass in 0..passes {
        debug!("LSD pass {pass} of {passes}");
        // SAFETY: `src` and `dst` are distinct allocations of `n` elements;
        // the pass only reads `src` and only writes `dst`.
        let input = unsafe { std::slice::from_raw_parts(src, n) };
        let out = OutPtr(dst);
        pool.install(|| strategy.pass(input, out, chunk_len, &key_fn, pass));
        std::mem::swap(&mut src, &mut dst);
    }

    // after an odd number of passes the result lives in the auxiliary buffer
    if passes % 2 == 1 {
        data.copy_from_slice(&aux);
    }
    Ok(())
}

/// Parallel LSD radix sort, caching each pass's byte per element.
///
/// `key_fn` maps an element to its key; one pass is made per key byte.
///
/// # Examples
///
/// ```
/// use prsort::lsd_radix_sort_cached;
///
/// let mut data: Vec<(u32, char)> = vec![(3, 'c'), (1, 'a'), (2, 'b'), (1, 'z')];
/// lsd_radix_sort_cached(&mut data, |e: &(u32, char)| e.0, 2).unwrap();
///
/// assert_eq!(data, vec![(1, 'a'), (1, 'z'), (2, 'b'), (3, 'c')]);
/// ```
pub fn lsd_radix_sort_cached<T, V, F>(data: &mut [T], key_fn: F, threads: usize) -> Result<()>
where
    T: Copy + Send + Sync,
    V: RadixValue,
    F: Fn(&T) -> V + Sync,
{
    lsd_sort::<T, V, F, CachedDigits>(data, key_fn, threads)
}

/// Parallel LSD radix sort, recomputing each byte whenever it is needed.
pub fn lsd_radix_sort_recompute<T, V, F>(data: &mut [T], key_fn: F, threads: usize) -> Result<()>
where
    T: Copy + Send + Sync,
    V: RadixValue,
    F: Fn(&T) -> V + Sync,
{
    lsd_sort::<T, V, F, RecomputeDigits>(data, key_fn, threads)
}

/// Parallel LSD radix sort writing through per-thread bucket buffers.
///
/// Elements larger than [`WRITE_BACK_MAX_ELEMENT_SIZE`] bytes are rejected at
/// compile time:
///
/// ```compile_fail
/// use prsort::lsd_radix_sort_write_back;
///
/// let mut data = vec![[0u64; 4]; 16];
/// lsd_radix_sort_write_back(&mut data, |e: &[u64; 4]| e[0], 2).unwrap();
/// ```
pub fn lsd_radix_sort_write_back<T, V, F>(data: &mut [T], key_fn: F, threads: usize) -> Result<()>
where
    T: Copy + Send + Sync,
    V: RadixValue,
    F: Fn(&T) -> V + Sync,
{
    lsd_sort::<T, V, F, WriteBackBuffer>(data, key_fn, threads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_offsets() {
        let a = count_chunk([0usize, 1, 1, 255].into_iter());
        let b = count_chunk([1usize, 0].into_iter());
        let starts = snake_offsets(&[a, b]);
        assert_eq!(starts[0][0], 0);
        assert_eq!(starts[1][0], 1);
        assert_eq!(starts[0][1], 2);
        assert_eq!(starts[1][1], 4);
        assert_eq!(starts[0][255], 5);
        assert_eq!(starts[1][255], 6);
    }

    #[test]
    fn test_odd_pass_count_copies_back() {
        let mut data: Vec<u8> = (0..=255u8).rev().collect();
        lsd_radix_sort_recompute(&mut data, |v: &u8| *v, 3).unwrap();
        assert_eq!(data, (0..=255u8).collect::<Vec<_>>());
    }

    #[test]
    fn test_rejects_zero_threads() {
        let mut data = vec![2u32, 1];
        let err = lsd_radix_sort_cached(&mut data, |v: &u32| *v, 0).unwrap_err();
        assert!(matches!(err, SortError::InvalidConfig { parameter: "threads", .. }));
        assert_eq!(data, vec![2, 1]);
    }

    #[test]
    fn test_more_threads_than_elements() {
        let mut data = vec![9u16, 3, 7];
        lsd_radix_sort_write_back(&mut data, |v: &u16| *v, 8).unwrap();
        assert_eq!(data, vec![3, 7, 9]);
    }
}
