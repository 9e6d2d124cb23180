//! Validation of raw point and boundary sequences.

use si_core::{Tolerances, nearly_equal};

use crate::error::{TimeError, TimeResult};

/// Check that time points are non-empty, finite and strictly increasing.
pub(crate) fn validate_points(points: &[f64]) -> TimeResult<()> {
    if points.is_empty() {
        return Err(TimeError::EmptyTimeSet);
    }

    for (index, &value) in points.iter().enumerate() {
        if !value.is_finite() {
            return Err(TimeError::NonFinitePoint { index, value });
        }
    }

    for (index, pair) in points.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(TimeError::PointsNotIncreasing {
                index: index + 1,
                prev: pair[0],
                next: pair[1],
            });
        }
    }

    Ok(())
}

/// Check the shape of an element boundary list against the horizon `[start, end]`.
///
/// Membership in the time set is checked separately by the caller, which
/// needs the matched indices anyway.
pub(crate) fn validate_boundaries(
    boundaries: &[f64],
    start: f64,
    end: f64,
    tol: Tolerances,
) -> TimeResult<()> {
    if boundaries.len() < 2 {
        return Err(TimeError::TooFewBoundaries {
            count: boundaries.len(),
        });
    }

    for (index, pair) in boundaries.windows(2).enumerate() {
        // NaN fails this comparison too
        if !(pair[1] > pair[0]) {
            return Err(TimeError::BoundariesNotIncreasing {
                index: index + 1,
                prev: pair[0],
                next: pair[1],
            });
        }
    }

    let first = boundaries[0];
    if !nearly_equal(first, start, tol) {
        return Err(TimeError::HorizonStartMismatch { first, start });
    }
    let last = boundaries[boundaries.len() - 1];
    if !nearly_equal(last, end, tol) {
        return Err(TimeError::HorizonEndMismatch { last, end });
    }

    Ok(())
}
