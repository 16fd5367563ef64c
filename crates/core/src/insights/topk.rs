//! Bounded top-K selection

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Retains the `capacity` highest-priority values seen in a stream.
///
/// Backed by a min-heap of at most `capacity` entries, so each insert costs O(log K) and
/// draining costs O(K log K). Among equal priorities the earlier insert ranks first; a new
/// value only displaces the retained minimum when its priority is strictly greater.
#[derive(Debug, Clone)]
pub struct TopK<T> {
    capacity: usize,
    next_seq: u64,
    heap: BinaryHeap<Reverse<Ranked<T>>>,
}

#[derive(Debug, Clone)]
struct Ranked<T> {
    priority: f64,
    seq: u64,
    value: T,
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Ranked<T> {}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earlier inserts outrank later ones at equal priority.
        self.priority.total_cmp(&other.priority).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> TopK<T> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, next_seq: 0, heap: BinaryHeap::with_capacity(capacity) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Lowest priority currently retained
    pub fn min_priority(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(entry)| entry.priority)
    }

    pub fn insert(&mut self, value: T, priority: f64) {
        if self.capacity == 0 {
            return;
        }

        let entry = Ranked { priority, seq: self.next_seq, value };
        self.next_seq += 1;

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(entry));
            return;
        }

        if let Some(mut min) = self.heap.peek_mut() {
            if priority.total_cmp(&min.0.priority) == Ordering::Greater {
                // Sifts down when the guard drops.
                *min = Reverse(entry);
            }
        }
    }

    /// Retained values by descending priority; leaves the selector empty.
    pub fn drain(&mut self) -> Vec<(T, f64)> {
        std::mem::take(&mut self.heap)
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(entry)| (entry.value, entry.priority))
            .collect()
    }
}
