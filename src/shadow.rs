//! Double-buffered element ranges.
//!
//! A [`ShadowBuffer`] pairs a range of the input with an equally sized range of
//! a scratch allocation and remembers which of the two currently holds the
//! valid data. Out-of-place passes read from the active range, write to the
//! shadow range and then [`flip`](ShadowBuffer::flip) the descriptor.
//!
//! Descriptors are small `Copy` values that can be handed to jobs running on
//! other threads. Jobs only ever receive descriptors of disjoint ranges, which
//! is why the accessors that touch memory are `unsafe`.

use std::marker::PhantomData;

/// Active/shadow pair of element ranges.
pub struct ShadowBuffer<'a, T> {
    active: *mut T,
    shadow: *mut T,
    len: usize,
    flipped: bool,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: a descriptor is just a pair of pointers; the scheduling discipline
// guarantees that descriptors handed to different threads never overlap.
unsafe impl<T: Send> Send for ShadowBuffer<'_, T> {}
unsafe impl<T: Sync> Sync for ShadowBuffer<'_, T> {}

impl<T> Clone for ShadowBuffer<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ShadowBuffer<'_, T> {}

impl<T> std::fmt::Debug for ShadowBuffer<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowBuffer")
            .field("active", &self.active)
            .field("shadow", &self.shadow)
            .field("len", &self.len)
            .field("flipped", &self.flipped)
            .finish()
    }
}

impl<'a, T> ShadowBuffer<'a, T> {
    /// Pairs `original` with `shadow`. The original range starts out active.
    ///
    /// # Panics
    ///
    /// Panics if the two ranges differ in length.
    pub fn new(original: &'a mut [T], shadow: &'a mut [T]) -> Self {
        assert_eq!(
            original.len(),
            shadow.len(),
            "shadow range must match the original range"
        );
        Self {
            active: original.as_mut_ptr(),
            shadow: shadow.as_mut_ptr(),
            len: original.len(),
            flipped: false,
            _marker: PhantomData,
        }
    }

    /// Number of elements in the range.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` if the valid data lives in the scratch allocation.
    #[inline]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Narrows both ranges to `[offset, offset + len)` without flipping.
    #[inline]
    pub fn sub(&self, offset: usize, len: usize) -> Self {
        assert!(offset + len <= self.len, "sub-range out of bounds");
        // SAFETY: checked to stay inside both ranges.
        unsafe {
            Self {
                active: self.active.add(offset),
                shadow: self.shadow.add(offset),
                len,
                flipped: self.flipped,
                _marker: PhantomData,
            }
        }
    }

    /// Narrows both ranges and swaps their roles, for a sub-range whose data
    /// has just been written to the shadow side.
    #[inline]
    pub fn flip(&self, offset: usize, len: usize) -> Self {
        assert!(offset + len <= self.len, "flip range out of bounds");
        // SAFETY: checked to stay inside both ranges.
        unsafe {
            Self {
                active: self.shadow.add(offset),
                shadow: self.active.add(offset),
                len,
                flipped: !self.flipped,
                _marker: PhantomData,
            }
        }
    }

    /// Raw pointer to the first element of the active range.
    #[inline]
    pub fn active_ptr(&self) -> *mut T {
        self.active
    }

    /// Raw pointer to the first element of the shadow range.
    #[inline]
    pub fn shadow_ptr(&self) -> *mut T {
        self.shadow
    }

    /// The active range.
    ///
    /// # Safety
    ///
    /// No other descriptor overlapping this range may be used to access its
    /// active memory for the lifetime of the returned slice.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn active_mut(&self) -> &mut [T] {
        // SAFETY: upheld by the caller.
        unsafe { std::slice::from_raw_parts_mut(self.active, self.len) }
    }

    /// The active range, shared.
    ///
    /// # Safety
    ///
    /// No descriptor overlapping this range may write its active memory for
    /// the lifetime of the returned slice.
    #[inline]
    pub unsafe fn active(&self) -> &[T] {
        // SAFETY: upheld by the caller.
        unsafe { std::slice::from_raw_parts(self.active, self.len) }
    }
}

impl<T: Copy> ShadowBuffer<'_, T> {
    /// Moves the valid data back to the original allocation if it currently
    /// lives in the scratch allocation. Returns a non-flipped descriptor.
    ///
    /// # Safety
    ///
    /// The caller must have exclusive access to both ranges of `self`.
    #[inline]
    pub unsafe fn copy_back(&self) -> Self {
        if !self.flipped {
            return *self;
        }
        // SAFETY: both ranges are valid for `len` elements, belong to
        // different allocations and are exclusively ours.
        unsafe { std::ptr::copy_nonoverlapping(self.active, self.shadow, self.len) };
        Self {
            active: self.shadow,
            shadow: self.active,
            len: self.len,
            flipped: false,
            _marker: PhantomData,
        }
    }
}
