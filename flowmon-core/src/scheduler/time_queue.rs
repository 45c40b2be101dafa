use crate::time::SimTime;
use core::cmp::Reverse;
use std::collections::BinaryHeap;

/// Items ordered by the [`SimTime`] they are due at.
///
/// Items due at the same time come out in the order they were pushed.
pub(crate) struct TimeQueue<T> {
    map: BinaryHeap<Reverse<OrderedByTime<T>>>,
    sequence: u64,
}

struct OrderedByTime<T> {
    due: SimTime,
    sequence: u64,
    item: T,
}

impl<T> OrderedByTime<T> {
    fn key(&self) -> (SimTime, u64) {
        (self.due, self.sequence)
    }
}

impl<T> PartialEq for OrderedByTime<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for OrderedByTime<T> {}

impl<T> PartialOrd for OrderedByTime<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for OrderedByTime<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl<T> TimeQueue<T> {
    pub fn new() -> Self {
        Self {
            map: BinaryHeap::new(),
            sequence: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn time_to_next(&self) -> Option<SimTime> {
        self.map.peek().map(|v| v.0.due)
    }

    pub fn pop(&mut self) -> Option<(SimTime, T)> {
        self.map.pop().map(|Reverse(v)| (v.due, v.item))
    }

    pub fn push(&mut self, due: SimTime, item: T) {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        self.map.push(Reverse(OrderedByTime {
            due,
            sequence,
            item,
        }))
    }
}

impl<T> Default for TimeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
