//! Splitting a time set into finite elements.

use si_core::Tolerances;
use tracing::debug;

use crate::error::{TimeError, TimeResult};
use crate::time_set::{TimeIdx, TimeSet};
use crate::validate;

/// One finite element: the closed index range `[left, right]` of a time set.
///
/// Neighbouring elements share a boundary point: element `k`'s `right` is
/// element `k + 1`'s `left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiniteElement {
    /// Position of the element in horizon order (0-based).
    pub index: usize,
    pub left: TimeIdx,
    pub right: TimeIdx,
}

impl FiniteElement {
    /// Points strictly between the boundaries (collocation points other than
    /// the right boundary).
    pub fn interior(&self) -> impl Iterator<Item = TimeIdx> + use<> {
        (self.left.position() + 1..self.right.position()).map(TimeIdx::new)
    }

    /// Every point of the element, left boundary included.
    pub fn points(&self) -> impl Iterator<Item = TimeIdx> + use<> {
        (self.left.position()..=self.right.position()).map(TimeIdx::new)
    }

    /// Points this element solves for: interior plus right boundary, and the
    /// left boundary too when `include_left` is set (first element only).
    pub fn owned_points(&self, include_left: bool) -> impl Iterator<Item = TimeIdx> + use<> {
        let start = if include_left {
            self.left.position()
        } else {
            self.left.position() + 1
        };
        (start..=self.right.position()).map(TimeIdx::new)
    }

    /// `true` when `t` lies in `[left, right]`.
    pub fn contains(&self, t: TimeIdx) -> bool {
        self.left <= t && t <= self.right
    }

    /// `true` when `t` is one of [`owned_points`](Self::owned_points).
    pub fn owns(&self, t: TimeIdx, include_left: bool) -> bool {
        let after_left = if include_left {
            t >= self.left
        } else {
            t > self.left
        };
        after_left && t <= self.right
    }

    /// `true` when `t` lies strictly after the right boundary.
    pub fn is_downstream(&self, t: TimeIdx) -> bool {
        t > self.right
    }

    /// Number of points after the left boundary.
    pub fn len(&self) -> usize {
        self.right.position() - self.left.position()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(t_left, t_right)` as time values.
    pub fn span(&self, time: &TimeSet) -> (f64, f64) {
        (time.value(self.left), time.value(self.right))
    }
}

/// Split `time` into the ordered finite elements delimited by `boundaries`.
///
/// `boundaries` must be strictly increasing, start at the horizon start, end
/// at the horizon end, and every entry must be a point of `time` (matched
/// within `tol`). The result covers the horizon with no gaps; neighbours share
/// exactly one boundary point.
pub fn partition(
    time: &TimeSet,
    boundaries: &[f64],
    tol: Tolerances,
) -> TimeResult<Vec<FiniteElement>> {
    validate::validate_boundaries(boundaries, time.first(), time.last(), tol)?;

    let mut indices = Vec::with_capacity(boundaries.len());
    for &value in boundaries {
        let idx = time
            .find(value, tol)
            .ok_or(TimeError::BoundaryNotInTimeSet { value })?;
        indices.push(idx);
    }

    // Distinct values can still snap onto the same point under a loose tolerance
    for (index, pair) in indices.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(TimeError::BoundariesNotIncreasing {
                index: index + 1,
                prev: boundaries[index],
                next: boundaries[index + 1],
            });
        }
    }

    let elements: Vec<FiniteElement> = indices
        .windows(2)
        .enumerate()
        .map(|(index, pair)| FiniteElement {
            index,
            left: pair[0],
            right: pair[1],
        })
        .collect();

    debug!(
        elements = elements.len(),
        points = time.len(),
        "partitioned time horizon"
    );

    Ok(elements)
}
