//! Shared fixtures for initializer integration tests.
#![allow(dead_code)]

use si_model::{DofSummary, Model, VarKey, add_collocation_equations};
use si_solver::{NewtonAdapter, SolveOptions, SolverAdapter, TerminationStatus};
use si_time::{Discretization, TimeIdx};

/// `dx/dt = -x`, `x(0) = 1` fixed, every other point at the guess `x = 1`.
pub fn decay(start: f64, end: f64, nfe: usize, ncp: usize) -> (Model, Discretization) {
    let disc = Discretization::lagrange_radau(start, end, nfe, ncp).unwrap();
    let mut model = Model::new();
    for t in disc.time().indices() {
        let x = model.add_var(VarKey::new("x").at(t), 1.0).unwrap();
        let dxdt = model.add_var(VarKey::new("dxdt").at(t), 0.0).unwrap();
        model
            .add_constraint("ode", Some(t), vec![x, dxdt], |v| v[1] + v[0])
            .unwrap();
    }
    add_collocation_equations(&mut model, &disc, &VarKey::new("x"), &VarKey::new("dxdt")).unwrap();
    let x0 = model.var_id(&x_key(disc.time().start_idx())).unwrap();
    model.fix(x0).unwrap();
    (model, disc)
}

pub fn x_key(t: TimeIdx) -> VarKey {
    VarKey::new("x").at(t)
}

/// Fixed flag of every variable, in id order.
pub fn fixed_flags(model: &Model) -> Vec<bool> {
    model.variables().map(|(_, v)| v.is_fixed()).collect()
}

pub fn active_flags(model: &Model) -> Vec<bool> {
    model.constraints().map(|(_, c)| c.is_active()).collect()
}

/// What the model looked like when the solver was called.
#[derive(Debug, Clone, Copy)]
pub struct SpyCall {
    pub dof: i64,
    pub latest_free: Option<TimeIdx>,
    pub free_time_invariant: usize,
}

/// Records every call, then forwards to a Newton adapter.
#[derive(Debug, Default)]
pub struct Spy {
    pub inner: NewtonAdapter,
    pub calls: Vec<SpyCall>,
}

impl SolverAdapter for Spy {
    fn solve(&mut self, model: &mut Model, options: &SolveOptions) -> TerminationStatus {
        let seen: &Model = model;
        let free = || seen.variables().filter(|(_, v)| !v.is_fixed());
        self.calls.push(SpyCall {
            dof: DofSummary::of_model(seen).dof(),
            latest_free: free().filter_map(|(_, v)| v.time()).max(),
            free_time_invariant: free().filter(|(_, v)| v.time().is_none()).count(),
        });
        self.inner.solve(model, options)
    }
}
