//! Ordered time points.

use core::fmt;
use si_core::{Tolerances, nearly_equal};

use crate::error::TimeResult;
use crate::validate;

/// Position of a point within a [`TimeSet`].
///
/// Model keys carry a `TimeIdx` rather than the raw `f64`, so lookups never
/// depend on float equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeIdx(usize);

impl TimeIdx {
    pub const fn new(position: usize) -> Self {
        Self(position)
    }

    pub const fn position(self) -> usize {
        self.0
    }
}

impl fmt::Debug for TimeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Display for TimeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, strictly increasing sequence of time points.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSet {
    points: Vec<f64>,
}

impl TimeSet {
    /// Build a time set, rejecting empty, non-finite or non-increasing input.
    pub fn new(points: Vec<f64>) -> TimeResult<Self> {
        validate::validate_points(&points)?;
        Ok(Self { points })
    }

    /// Number of points (always at least one).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Horizon start.
    pub fn first(&self) -> f64 {
        self.points[0]
    }

    /// Horizon end.
    pub fn last(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    pub fn start_idx(&self) -> TimeIdx {
        TimeIdx(0)
    }

    pub fn end_idx(&self) -> TimeIdx {
        TimeIdx(self.points.len() - 1)
    }

    pub fn is_start(&self, idx: TimeIdx) -> bool {
        idx.0 == 0
    }

    /// Time value at `idx` (panics if `idx` did not come from this set).
    pub fn value(&self, idx: TimeIdx) -> f64 {
        self.points[idx.0]
    }

    /// Time value at `idx`, or `None` when out of range.
    pub fn get(&self, idx: TimeIdx) -> Option<f64> {
        self.points.get(idx.0).copied()
    }

    /// Locate `t` in the set within `tol`.
    pub fn find(&self, t: f64, tol: Tolerances) -> Option<TimeIdx> {
        let pos = self.points.partition_point(|&p| p < t);
        [pos.checked_sub(1), Some(pos)]
            .into_iter()
            .flatten()
            .filter(|&i| i < self.points.len())
            .find(|&i| nearly_equal(self.points[i], t, tol))
            .map(TimeIdx)
    }

    /// All indices in increasing time order.
    pub fn indices(&self) -> impl Iterator<Item = TimeIdx> + '_ {
        (0..self.points.len()).map(TimeIdx)
    }

    /// `(index, value)` pairs in increasing time order.
    pub fn iter(&self) -> impl Iterator<Item = (TimeIdx, f64)> + '_ {
        self.points.iter().enumerate().map(|(i, &t)| (TimeIdx(i), t))
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }
}
