//! Replay detection with a rolling low-water mark.
//!
//! Items are accepted at most once, and never with a tag at or below the
//! low-water mark. Cleaning raises the mark and forgets the items under it;
//! the mark alone keeps rejecting them afterwards, so memory stays bounded
//! by the items tagged above it.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use parking_lot::Mutex;
use tracing::trace;

struct Inner<T> {
    low_water: Option<i64>,
    seen: HashSet<T>,
    timeline: BTreeMap<i64, Vec<T>>,
}

/// Accept-once guard over `(item, tag)` pairs.
///
/// `try_add` and `clean` are serialised behind one lock; concurrent callers
/// never both accept the same item.
pub struct ReplayDetector<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Eq + Hash + Clone> ReplayDetector<T> {
    /// Creates an empty detector with no low-water mark.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                low_water: None,
                seen: HashSet::new(),
                timeline: BTreeMap::new(),
            }),
        }
    }

    /// Records `item` at `tag`.
    ///
    /// Returns false if `tag` is at or below the low-water mark, or if
    /// `item` is already retained.
    pub fn try_add(&self, item: T, tag: i64) -> bool {
        let mut inner = self.inner.lock();
        if inner.low_water.is_some_and(|mark| tag <= mark) {
            return false;
        }
        if !inner.seen.insert(item.clone()) {
            return false;
        }
        inner.timeline.entry(tag).or_default().push(item);
        true
    }

    /// Raises the low-water mark to `max(current, through)` and evicts
    /// every item tagged at or below `through`, oldest first.
    pub fn clean(&self, through: i64) {
        let mut inner = self.inner.lock();
        inner.low_water = Some(inner.low_water.map_or(through, |mark| mark.max(through)));

        let Inner { seen, timeline, .. } = &mut *inner;
        let mut evicted = 0usize;
        while let Some(entry) = timeline.first_entry() {
            if *entry.key() > through {
                break;
            }
            for item in entry.remove() {
                seen.remove(&item);
                evicted += 1;
            }
        }
        if evicted > 0 {
            trace!(through, evicted, retained = seen.len(), "Evicted replay entries");
        }
    }

    /// Current low-water mark.
    pub fn low_water_mark(&self) -> Option<i64> {
        self.inner.lock().low_water
    }

    /// Number of retained items.
    pub fn len(&self) -> usize {
        self.inner.lock().seen.len()
    }

    /// Returns true if no items are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Eq + Hash + Clone> Default for ReplayDetector<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_duplicate_rejected() {
        let detector = ReplayDetector::new();
        assert!(detector.try_add("x", 5));
        assert!(!detector.try_add("x", 5));
        assert!(!detector.try_add("x", 9));
    }

    #[test]
    fn test_evicted_item_accepted_with_newer_tag() {
        let detector = ReplayDetector::new();
        assert!(detector.try_add("x", 5));
        detector.clean(5);
        assert!(detector.is_empty());
        assert!(detector.try_add("x", 6));
    }

    #[test]
    fn test_tag_at_or_below_watermark_rejected() {
        let detector = ReplayDetector::new();
        detector.clean(5);
        assert!(!detector.try_add("y", 3));
        assert!(!detector.try_add("y", 5));
        assert!(detector.try_add("y", 6));
    }

    #[test]
    fn test_watermark_never_lowers() {
        let detector: ReplayDetector<u32> = ReplayDetector::new();
        detector.clean(10);
        detector.clean(4);
        assert_eq!(detector.low_water_mark(), Some(10));
        assert!(!detector.try_add(1, 7));
    }

    #[test]
    fn test_clean_evicts_only_old_tags() {
        let detector = ReplayDetector::new();
        assert!(detector.try_add(1u32, 1));
        assert!(detector.try_add(2, 2));
        assert!(detector.try_add(3, 2));
        assert!(detector.try_add(4, 8));

        detector.clean(2);
        assert_eq!(detector.len(), 1);
        assert!(!detector.try_add(4, 9));
        assert!(detector.try_add(5, 3));
    }

    #[test]
    fn test_concurrent_adds_accept_once() {
        let detector = Arc::new(ReplayDetector::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let detector = detector.clone();
                std::thread::spawn(move || detector.try_add(42u64, 100))
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|accepted| *accepted)
            .count();
        assert_eq!(accepted, 1);
    }
}
