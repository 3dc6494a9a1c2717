//! Bounded history buffers feeding the dashboard charts.

use std::collections::VecDeque;

use serde::Serialize;

/// Fixed-capacity history of the most recent readings of one field.
///
/// Values are kept in insertion order. Pushing into a full window evicts the
/// oldest value, so `len() <= capacity()` holds at all times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingWindow<T> {
    capacity: usize,
    values: VecDeque<T>,
}

impl<T> RollingWindow<T> {
    /// Create an empty window holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a reading, dropping the oldest one if the window is full.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent reading.
    pub fn latest(&self) -> Option<&T> {
        self.values.back()
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.values.iter()
    }
}

impl<T: Copy + Ord> RollingWindow<T> {
    /// Smallest and largest value currently held.
    pub fn bounds(&self) -> Option<(T, T)> {
        let min = self.values.iter().copied().min()?;
        let max = self.values.iter().copied().max()?;
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_within_capacity() {
        let mut window = RollingWindow::new(3);
        window.push(1);
        window.push(2);
        assert_eq!(window.len(), 2);
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(window.latest(), Some(&2));
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut window = RollingWindow::new(3);
        for v in 1..=4 {
            window.push(v);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut window = RollingWindow::new(5);
        for v in 0..100u64 {
            window.push(v);
            assert!(window.len() <= window.capacity());
        }
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![95, 96, 97, 98, 99]);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut window = RollingWindow::new(0);
        window.push(7);
        assert!(window.is_empty());
        assert_eq!(window.latest(), None);
    }

    #[test]
    fn test_bounds() {
        let mut window = RollingWindow::new(4);
        assert_eq!(window.bounds(), None);
        for v in [5u64, 2, 9, 4] {
            window.push(v);
        }
        assert_eq!(window.bounds(), Some((2, 9)));
    }
}
