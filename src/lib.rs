//! # prsort
//!
//! `prsort` is a parallel radix sort library for fixed-width keys.
//!
//! It contains two engines:
//!
//! - A **parallel MSD radix sort** driven by a small job scheduler. Large ranges
//!   are partitioned by a parallel count/prefix-sum/distribute step, smaller ones
//!   by sequential jobs that keep their recursion on an explicit stack and hand
//!   the coarsest pending buckets to idle workers. Small buckets, and ranges
//!   whose keys are exhausted, are finished with a comparison sort.
//! - A **parallel LSD radix sort** in three variants that differ in how digits
//!   are obtained and written ([`lsd`]).
//!
//! ## Key Features
//!
//! - **Caller-defined digits**: the MSD engine asks a closure for the digit of an
//!   element at a given depth. The digit type selects the radix: `u8` for 256
//!   buckets, `u16` for 65536.
//! - **Double buffering**: out-of-place passes alternate between the input and a
//!   single scratch allocation of the same size ([`ShadowBuffer`]).
//! - **Dynamic load balancing**: sequential jobs donate work whenever the
//!   scheduler reports an idle worker.
//!
//! ## Usage
//!
//! ### Primitive integers
//!
//! ```rust
//! use prsort::par_radix_sort;
//!
//! let mut data = vec![170u32, 45, 75, 90, 802, 24, 2, 66];
//! par_radix_sort(&mut data).unwrap();
//!
//! assert_eq!(data, vec![2, 24, 45, 66, 75, 90, 170, 802]);
//! ```
//!
//! ### Custom digits
//!
//! ```rust
//! use prsort::{RadixSorter, SortConfig};
//!
//! let mut pairs: Vec<(u16, u16)> = vec![(2, 9), (1, 5), (2, 1), (0, 7)];
//! let sorter = RadixSorter::new(SortConfig::default().with_threads(2));
//!
//! // one 16-bit digit per tuple field
//! sorter
//!     .sort(&mut pairs, |p: &(u16, u16), depth| if depth == 0 { p.0 } else { p.1 }, 2)
//!     .unwrap();
//!
//! assert_eq!(pairs, vec![(0, 7), (1, 5), (2, 1), (2, 9)]);
//! ```
//!
//! ### LSD
//!
//! ```rust
//! use prsort::lsd_radix_sort_write_back;
//!
//! let mut data = vec![(5u64, 'x'), (3, 'y'), (5, 'a')];
//! lsd_radix_sort_write_back(&mut data, |e: &(u64, char)| e.0, 4).unwrap();
//!
//! assert_eq!(data, vec![(3, 'y'), (5, 'x'), (5, 'a')]);
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Time**: O(N · D) for D digit passes, plus the comparison sorts of buckets
//!   below the subsort threshold.
//! - **Memory Overhead**: one scratch buffer of N elements per call.

pub mod algo;
pub(crate) mod big_step;
pub mod config;
pub(crate) mod context;
pub mod core;
pub mod error;
pub mod lsd;
pub mod scheduler;
pub mod shadow;
pub(crate) mod small_sort;

pub use algo::{RadixSorter, par_radix_sort, radix_sort, radix_sort_by};
pub use config::SortConfig;
pub use context::SortStats;
pub use core::{Digit, RadixValue};
pub use error::{Result, SortError};
pub use lsd::{lsd_radix_sort_cached, lsd_radix_sort_recompute, lsd_radix_sort_write_back};
pub use shadow::ShadowBuffer;

pub mod prelude {
    pub use crate::algo::{RadixSorter, par_radix_sort, radix_sort, radix_sort_by};
    pub use crate::config::SortConfig;
    pub use crate::context::SortStats;
    pub use crate::core::{Digit, RadixValue};
    pub use crate::lsd::{lsd_radix_sort_cached, lsd_radix_sort_recompute, lsd_radix_sort_write_back};
}
