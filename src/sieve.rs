use std::sync::atomic::{AtomicBool, Ordering};

/// Shared composite-flag store for one sieve run.
///
/// One flag per number in [0, limit]; flag set means "known composite"
/// (0 and 1 are pre-marked). Flags only ever go from unset to set, and
/// every worker writes multiples of its own candidate, so concurrent
/// duplicate stores agree on the value. Relaxed ordering is enough: the
/// completion signal each worker sends through its channel orders all of
/// its marks before any release scan that depends on them.
pub struct Sieve {
    flags: Box<[AtomicBool]>,
}

impl Sieve {
    pub fn new(limit: usize) -> Self {
        let flags: Box<[AtomicBool]> = (0..=limit).map(|_| AtomicBool::new(false)).collect();
        let sieve = Sieve { flags };

        // 0 and 1 are composite by convention (index 1 only exists for limit >= 1)
        for i in 0..=limit.min(1) {
            sieve.mark(i);
        }

        sieve
    }

    /// Record `i` as composite. Indices are always derived within
    /// [0, limit]; anything else is a bug and panics on the slab access.
    #[inline]
    pub fn mark(&self, i: usize) {
        self.flags[i].store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_composite(&self, i: usize) -> bool {
        self.flags[i].load(Ordering::Relaxed)
    }
}
