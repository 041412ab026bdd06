use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-capacity history of recent radius estimates.
///
/// Every advance of a contour pushes its current radius and the oldest entry is dropped.
/// The history deliberately takes no decision about convergence; the owner of the contour compares
/// old and new entries to detect a plateau of the growth.
///
/// A new history is filled with the ramp $1.05\cdot i$ for $i=0,\dots,N-1$ so that comparing the
/// first and last entry right after construction never indicates a plateau.
/// ```
/// # use cellular_balloon_building_blocks::RadiusHistory;
/// let mut history = RadiusHistory::new(3);
/// assert_eq!(history.to_vec(), vec![0.0, 1.05, 2.1]);
///
/// history.push(7.0);
/// history.push(8.0);
/// assert_eq!(history.to_vec(), vec![2.1, 7.0, 8.0]);
/// assert_eq!(history.oldest(), Some(2.1));
/// assert_eq!(history.newest(), Some(8.0));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadiusHistory {
    capacity: usize,
    values: VecDeque<f64>,
}

/// Slope of the ramp a new [RadiusHistory] is filled with.
const RAMP_SLOPE: f64 = 1.05;

impl RadiusHistory {
    /// Creates a history holding exactly `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: (0..capacity).map(|i| i as f64 * RAMP_SLOPE).collect(),
        }
    }

    /// Push a new value to the back while dropping the oldest one.
    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Iterates from the oldest to the newest value.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, f64> {
        self.values.iter()
    }

    /// Number of stored values. Equal to [RadiusHistory::capacity].
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a history of capacity zero.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fixed number of values kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest stored value.
    pub fn oldest(&self) -> Option<f64> {
        self.values.front().copied()
    }

    /// Most recently pushed value.
    pub fn newest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Copies the values from oldest to newest.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

impl<'a> IntoIterator for &'a RadiusHistory {
    type Item = &'a f64;
    type IntoIter = std::collections::vec_deque::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
