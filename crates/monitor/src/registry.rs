#![forbid(unsafe_code)]

//! Dedup state for already-reported process IDs.
//!
//! A fixed-capacity bitset sized to the platform's maximum pid at start-up.
//! Bits are never cleared: a pid that is reused after the original process
//! exits is intentionally not reported a second time.

#[derive(Debug)]
pub struct SeenRegistry {
    bits: Vec<u64>,
    capacity: usize,
}

impl SeenRegistry {
    /// Allocate a zeroed registry able to track pids `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            bits: vec![0; capacity.div_ceil(64)],
            capacity,
        }
    }

    /// Whether `pid` has already been reported. Out-of-range pids read as
    /// "not seen"; the scanner guards against acting on them.
    pub fn has_seen(&self, pid: u32) -> bool {
        let index = pid as usize;
        index < self.capacity && self.bits[index / 64] >> (index % 64) & 1 == 1
    }

    /// Record `pid` as reported. Idempotent; out-of-range pids are ignored.
    pub fn mark_seen(&mut self, pid: u32) {
        let index = pid as usize;
        if index < self.capacity {
            self.bits[index / 64] |= 1 << (index % 64);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unseen_until_marked() {
        let mut registry = SeenRegistry::new(100);
        assert!(!registry.has_seen(42));
        registry.mark_seen(42);
        assert!(registry.has_seen(42));
    }

    #[test]
    fn mark_is_idempotent() {
        let mut registry = SeenRegistry::new(10);
        registry.mark_seen(3);
        registry.mark_seen(3);
        assert!(registry.has_seen(3));
        assert!(!registry.has_seen(2));
        assert!(!registry.has_seen(4));
    }

    #[test]
    fn pid_zero_is_tracked() {
        let mut registry = SeenRegistry::new(1);
        assert!(!registry.has_seen(0));
        registry.mark_seen(0);
        assert!(registry.has_seen(0));
    }

    #[test]
    fn out_of_range_is_never_seen() {
        let mut registry = SeenRegistry::new(100);
        assert!(!registry.has_seen(100));
        assert!(!registry.has_seen(u32::MAX));
        // Marking out of range is a no-op, not a panic.
        registry.mark_seen(100);
        registry.mark_seen(u32::MAX);
        assert!(!registry.has_seen(100));
    }

    proptest! {
        #[test]
        fn seen_is_monotone(capacity in 1usize..10_000, pids in prop::collection::vec(0u32..20_000, 0..64)) {
            let mut registry = SeenRegistry::new(capacity);
            for &pid in &pids {
                let in_range = (pid as usize) < capacity;
                registry.mark_seen(pid);
                prop_assert_eq!(registry.has_seen(pid), in_range);
            }
            // Everything marked in range stays seen at the end.
            for &pid in &pids {
                prop_assert_eq!(registry.has_seen(pid), (pid as usize) < capacity);
            }
        }
    }
}
