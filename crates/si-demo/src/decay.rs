//! First-order decay `dx/dt = -k x`.

use serde::{Deserialize, Serialize};
use si_model::{Model, VarKey, add_collocation_equations};
use si_time::Discretization;

use crate::case::DemoCase;
use crate::error::{DemoError, DemoResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayParams {
    pub horizon: f64,
    pub nfe: usize,
    pub ncp: usize,
    /// Decay constant `k`
    pub rate: f64,
    /// Fixed value of `x(0)`
    pub initial: f64,
    /// Placeholder for every other point
    pub guess: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            horizon: 2.0,
            nfe: 2,
            ncp: 3,
            rate: 1.0,
            initial: 1.0,
            guess: 1.0,
        }
    }
}

impl DecayParams {
    /// Analytic solution.
    pub fn exact(&self, t: f64) -> f64 {
        self.initial * (-self.rate * t).exp()
    }
}

pub fn state() -> VarKey {
    VarKey::new("x")
}

pub fn derivative() -> VarKey {
    VarKey::new("dxdt")
}

pub fn build(params: &DecayParams) -> DemoResult<DemoCase> {
    if !params.rate.is_finite() || !params.initial.is_finite() || !params.guess.is_finite() {
        return Err(DemoError::InvalidParams {
            what: "decay rate, initial value and guess must be finite".to_string(),
        });
    }
    let disc = Discretization::lagrange_radau(0.0, params.horizon, params.nfe, params.ncp)?;
    let time = disc.time();

    let mut model = Model::new();
    let x = model.add_indexed_var("x", &[], time, params.guess)?;
    let dxdt = model.add_indexed_var("dxdt", &[], time, 0.0)?;
    let k = params.rate;
    for (t, (&xi, &di)) in time.indices().zip(x.iter().zip(&dxdt)) {
        model.add_constraint("ode", Some(t), vec![xi, di], move |v| v[1] + k * v[0])?;
    }
    add_collocation_equations(&mut model, &disc, &state(), &derivative())?;

    model.fix_at(x[0], params.initial)?;

    Ok(DemoCase {
        name: "decay",
        model,
        disc,
    })
}
