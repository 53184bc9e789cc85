//! Software prefetch helpers for the tree-walk hot paths.
//!
//! The factorization loop chases pointers through the node array, so the
//! session keeps a small ring of upcoming node indices and asks the CPU
//! to pull those cache lines early. These helpers are hints only: they
//! never fault, and on architectures without a stable prefetch intrinsic
//! they compile to nothing.

/// Hint that `p` will be read soon. Non-temporal: the walk touches each
/// line once per position.
#[inline(always)]
pub(crate) fn prefetch_read<T>(p: &T) {
    #[cfg(target_arch = "x86_64")]
    {
        use core::arch::x86_64::{_mm_prefetch, _MM_HINT_NTA};
        // SAFETY: prefetch is a hint; it performs no memory access that
        // can fault, and `p` is a valid reference.
        unsafe { _mm_prefetch::<_MM_HINT_NTA>(p as *const T as *const i8) };
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        let _ = p;
    }
}

/// Hint that `p` will be written soon (the walk stamps every visited
/// node's offset field).
#[inline(always)]
pub(crate) fn prefetch_write<T>(p: &T) {
    #[cfg(target_arch = "x86_64")]
    {
        use core::arch::x86_64::{_mm_prefetch, _MM_HINT_ET0};
        // SAFETY: as above; ET0 requests the line in exclusive state.
        unsafe { _mm_prefetch::<_MM_HINT_ET0>(p as *const T as *const i8) };
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        let _ = p;
    }
}
