use crate::CoreError;

/// Floating point type used throughout the workspace
pub type Real = f64;

/// Absolute/relative tolerance pair.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Clamp `v` into the optional `[lower, upper]` interval.
pub fn clamp_to_bounds(v: Real, lower: Option<Real>, upper: Option<Real>) -> Real {
    let v = lower.map_or(v, |lo| v.max(lo));
    upper.map_or(v, |hi| v.min(hi))
}

/// Amount by which `v` lies outside `[lower, upper]` (zero inside).
pub fn bound_violation(v: Real, lower: Option<Real>, upper: Option<Real>) -> Real {
    let below = lower.map_or(0.0, |lo| (lo - v).max(0.0));
    let above = upper.map_or(0.0, |hi| (v - hi).max(0.0));
    below.max(above)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn clamp_respects_open_sides() {
        assert_eq!(clamp_to_bounds(5.0, Some(0.0), Some(1.0)), 1.0);
        assert_eq!(clamp_to_bounds(-5.0, Some(0.0), None), 0.0);
        assert_eq!(clamp_to_bounds(-5.0, None, None), -5.0);
    }

    #[test]
    fn violation_is_zero_inside() {
        assert_eq!(bound_violation(0.5, Some(0.0), Some(1.0)), 0.0);
        assert_eq!(bound_violation(3.0, Some(0.0), Some(1.0)), 2.0);
        assert_eq!(bound_violation(-0.25, Some(0.0), None), 0.25);
    }
}
