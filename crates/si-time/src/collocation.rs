//! Lagrange-Radau collocation on uniform finite elements.
//!
//! Each element `[t_i, t_i + h]` carries its left boundary plus `ncp`
//! Radau points, the last of which coincides with the right boundary. A state
//! is approximated by the Lagrange polynomial through those `ncp + 1` points,
//! so its time derivative at point `j` is `sum_k D[j][k] * x_k / h`.

use si_core::Tolerances;

use crate::error::{TimeError, TimeResult};
use crate::partition::{FiniteElement, partition};
use crate::time_set::TimeSet;

const RADAU_1: [f64; 1] = [1.0];
const RADAU_2: [f64; 2] = [1.0 / 3.0, 1.0];
const RADAU_3: [f64; 3] = [0.155_051_025_721_682_2, 0.644_948_974_278_317_8, 1.0];
const RADAU_4: [f64; 4] = [
    0.088_587_959_512_703_95,
    0.409_466_864_440_734_7,
    0.787_659_461_760_847_1,
    1.0,
];
const RADAU_5: [f64; 5] = [
    0.057_104_196_114_517_68,
    0.276_843_013_638_123_8,
    0.583_590_432_368_916_8,
    0.860_240_135_656_219_5,
    1.0,
];

/// Radau IIA collocation points on `(0, 1]` for `ncp` points per element.
pub fn radau_points(ncp: usize) -> TimeResult<&'static [f64]> {
    match ncp {
        1 => Ok(&RADAU_1),
        2 => Ok(&RADAU_2),
        3 => Ok(&RADAU_3),
        4 => Ok(&RADAU_4),
        5 => Ok(&RADAU_5),
        _ => Err(TimeError::UnsupportedCollocation { ncp }),
    }
}

/// Differentiation matrix of the Lagrange basis through `tau`.
///
/// `D[j][k]` is the derivative of the `k`-th basis polynomial evaluated at
/// `tau[j]`. Uses barycentric weights; `tau` must be distinct.
pub fn lagrange_derivative_matrix(tau: &[f64]) -> Vec<Vec<f64>> {
    let n = tau.len();
    let weights: Vec<f64> = (0..n)
        .map(|k| {
            let prod: f64 = (0..n)
                .filter(|&m| m != k)
                .map(|m| tau[k] - tau[m])
                .product();
            1.0 / prod
        })
        .collect();

    let mut d = vec![vec![0.0; n]; n];
    for j in 0..n {
        for k in 0..n {
            d[j][k] = if j == k {
                (0..n)
                    .filter(|&m| m != j)
                    .map(|m| 1.0 / (tau[j] - tau[m]))
                    .sum()
            } else {
                (weights[k] / weights[j]) / (tau[j] - tau[k])
            };
        }
    }
    d
}

/// A uniform collocation grid over `[start, end]`.
#[derive(Debug, Clone)]
pub struct Discretization {
    time: TimeSet,
    boundaries: Vec<f64>,
    ncp: usize,
    /// `[0, tau_1, ..., tau_ncp]`
    tau: Vec<f64>,
    derivative: Vec<Vec<f64>>,
}

impl Discretization {
    /// Build `nfe` equal elements with `ncp` Radau points each.
    pub fn lagrange_radau(start: f64, end: f64, nfe: usize, ncp: usize) -> TimeResult<Self> {
        if !(start.is_finite() && end.is_finite() && end > start) {
            return Err(TimeError::InvalidHorizon { start, end });
        }
        if nfe == 0 {
            return Err(TimeError::NoElements);
        }
        let roots = radau_points(ncp)?;

        let boundaries: Vec<f64> = (0..=nfe)
            .map(|i| {
                if i == nfe {
                    end
                } else {
                    start + (end - start) * i as f64 / nfe as f64
                }
            })
            .collect();

        let mut points = Vec::with_capacity(nfe * ncp + 1);
        points.push(start);
        for pair in boundaries.windows(2) {
            let h = pair[1] - pair[0];
            for &r in &roots[..ncp - 1] {
                points.push(pair[0] + r * h);
            }
            // tau = 1 lands exactly on the boundary
            points.push(pair[1]);
        }

        let mut tau = Vec::with_capacity(ncp + 1);
        tau.push(0.0);
        tau.extend_from_slice(roots);
        let derivative = lagrange_derivative_matrix(&tau);

        Ok(Self {
            time: TimeSet::new(points)?,
            boundaries,
            ncp,
            tau,
            derivative,
        })
    }

    pub fn time(&self) -> &TimeSet {
        &self.time
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Collocation points per element.
    pub fn ncp(&self) -> usize {
        self.ncp
    }

    /// Number of finite elements.
    pub fn nfe(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Normalised element coordinates, left boundary first.
    pub fn tau(&self) -> &[f64] {
        &self.tau
    }

    /// Partition of the grid's own time set.
    pub fn elements(&self) -> TimeResult<Vec<FiniteElement>> {
        partition(&self.time, &self.boundaries, Tolerances::default())
    }

    /// Weights `w_k` such that `dx/dt` at the `j`-th point of `element`
    /// (1-based after the left boundary) is `sum_k w_k * x(element.left + k)`.
    pub fn derivative_weights(&self, element: &FiniteElement, j: usize) -> TimeResult<Vec<f64>> {
        let row = self.derivative.get(j).ok_or(TimeError::PointOutOfRange {
            point: j,
            ncp: self.ncp(),
        })?;
        let (t0, t1) = element.span(&self.time);
        let h = t1 - t0;
        Ok(row.iter().map(|d| d / h).collect())
    }
}
