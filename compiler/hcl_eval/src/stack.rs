//! Stack headroom for recursive evaluation.
//!
//! Expressions and blocks are walked recursively, and a document can nest
//! either arbitrarily deep. Recursive entry points go through
//! [`ensure_sufficient_stack`], which grows the stack on demand via `stacker`.
//! On wasm32 `stacker` is unavailable and the closure runs as-is.

/// Run `f`, growing the stack first if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Headroom below which a new segment is allocated (128KB).
    const RED_ZONE: usize = 128 * 1024;

    /// Size of each newly allocated segment (2MB).
    const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
