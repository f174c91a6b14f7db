//! Height allocator — hands out unique heights from a bounded range.
//!
//! A single shared cursor under a mutex. Safe to call from every worker
//! concurrently; no height is issued twice and none is skipped. Exhaustion is
//! a normal terminal signal, not a failure.

use std::ops::RangeInclusive;
use std::sync::Mutex;

/// Allocates heights from `[start, end]`, first-come-first-served.
pub struct HeightAllocator {
    remaining: Mutex<RangeInclusive<u64>>,
}

impl HeightAllocator {
    /// Create an allocator over the inclusive range `[start, end]`.
    ///
    /// If `start > end` the allocator is born exhausted.
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            remaining: Mutex::new(start..=end),
        }
    }

    /// Take the next unassigned height, or `None` once the range is consumed.
    pub fn next(&self) -> Option<u64> {
        self.remaining.lock().unwrap().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn issues_every_height_once() {
        let alloc = HeightAllocator::new(10, 15);
        let mut seen = vec![];
        while let Some(h) = alloc.next() {
            seen.push(h);
        }
        assert_eq!(seen, vec![10, 11, 12, 13, 14, 15]);
        assert!(alloc.next().is_none()); // stays exhausted
    }

    #[test]
    fn empty_range_is_exhausted_immediately() {
        let alloc = HeightAllocator::new(10, 9);
        assert!(alloc.next().is_none());
    }

    #[test]
    fn single_height_range() {
        let alloc = HeightAllocator::new(7, 7);
        assert_eq!(alloc.next(), Some(7));
        assert!(alloc.next().is_none());
    }

    #[test]
    fn survives_end_of_u64() {
        let alloc = HeightAllocator::new(u64::MAX - 1, u64::MAX);
        assert_eq!(alloc.next(), Some(u64::MAX - 1));
        assert_eq!(alloc.next(), Some(u64::MAX));
        assert!(alloc.next().is_none());
    }

    #[tokio::test]
    async fn no_double_allocation_under_contention() {
        let alloc = Arc::new(HeightAllocator::new(0, 999));
        let mut handles = vec![];
        for _ in 0..8 {
            let alloc = alloc.clone();
            handles.push(tokio::spawn(async move {
                let mut mine = vec![];
                while let Some(h) = alloc.next() {
                    mine.push(h);
                    tokio::task::yield_now().await;
                }
                mine
            }));
        }

        let mut all = vec![];
        for handle in handles {
            all.extend(handle.await.unwrap());
        }

        let unique: HashSet<u64> = all.iter().copied().collect();
        assert_eq!(all.len(), 1_000, "no height may be issued twice");
        assert_eq!(unique.len(), 1_000, "no height may be skipped");
        assert_eq!(unique.iter().copied().min(), Some(0));
        assert_eq!(unique.iter().copied().max(), Some(999));
    }
}
