//! Native stack growth for nested block execution.
//!
//! Every block, synchronous call and `new` recurses into the interpreter
//! loop, so deeply nested programs would otherwise overflow the stack of
//! the thread running them. Spawned units start on a small configured stack
//! and rely on this to grow.

/// Stack that must remain before another range starts executing.
const MIN_REMAINING: usize = 128 * 1024;

/// Size of each segment allocated once the stack runs low.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f` on the current stack, or on a fresh segment when fewer than
/// [`MIN_REMAINING`] bytes are left.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(MIN_REMAINING, SEGMENT_SIZE, f)
}

#[cfg(test)]
mod tests {
    use std::hint::black_box;
    use std::thread;

    use super::ensure_sufficient_stack;

    fn nest(depth: u32) -> u32 {
        ensure_sufficient_stack(|| {
            let pad = black_box([0u8; 1024]);
            if depth == 0 {
                u32::from(pad[0])
            } else {
                nest(depth - 1) + 1
            }
        })
    }

    #[test]
    #[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
    fn deep_nesting_outgrows_a_small_thread_stack() {
        let depth = thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| nest(20_000))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(depth, 20_000);
    }
}
