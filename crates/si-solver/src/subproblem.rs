//! Active sub-problem extraction: packing model state to/from solver vectors.

use std::collections::BTreeSet;

use crate::error::{SolverError, SolverResult};
use nalgebra::DVector;
use si_core::{ConId, VarId, clamp_to_bounds};
use si_model::Model;

/// The square system a solver sees: active constraints over the unfixed
/// variables they reference.
///
/// Values of every other variable are frozen at construction time.
#[derive(Debug, Clone)]
pub struct Subproblem {
    vars: Vec<VarId>,
    cons: Vec<ConId>,
    lower: Vec<Option<f64>>,
    upper: Vec<Option<f64>>,
    base: Vec<f64>,
}

impl Subproblem {
    pub fn from_model(model: &Model) -> Self {
        let mut cons = Vec::new();
        let mut free = BTreeSet::new();
        for (id, con) in model.constraints() {
            if !con.is_active() {
                continue;
            }
            cons.push(id);
            for &v in con.vars() {
                if matches!(model.is_fixed(v), Ok(false)) {
                    free.insert(v);
                }
            }
        }

        let vars: Vec<VarId> = free.into_iter().collect();
        let (lower, upper) = vars
            .iter()
            .map(|&v| {
                model
                    .var(v)
                    .map(|var| (var.lower(), var.upper()))
                    .unwrap_or((None, None))
            })
            .unzip();

        Self {
            vars,
            cons,
            lower,
            upper,
            base: model.values(),
        }
    }

    /// Unknowns, in packing order.
    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    /// Equations, in residual order.
    pub fn cons(&self) -> &[ConId] {
        &self.cons
    }

    pub fn is_square(&self) -> bool {
        self.vars.len() == self.cons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.cons.is_empty()
    }

    /// Current values of the unknowns.
    pub fn pack(&self) -> DVector<f64> {
        DVector::from_iterator(self.vars.len(), self.vars.iter().map(|v| self.base[v.slot()]))
    }

    /// Write a solution vector back into the model.
    pub fn unpack(&self, model: &mut Model, x: &DVector<f64>) -> SolverResult<()> {
        self.check_len(x)?;
        for (&id, &value) in self.vars.iter().zip(x.iter()) {
            model.set_value(id, value)?;
        }
        Ok(())
    }

    /// Clamp every unknown into its bounds.
    pub fn project(&self, x: &mut DVector<f64>) {
        for (i, xi) in x.iter_mut().enumerate() {
            *xi = clamp_to_bounds(*xi, self.lower[i], self.upper[i]);
        }
    }

    /// Residual vector of the active constraints with the unknowns set to `x`.
    pub fn residuals(&self, model: &Model, x: &DVector<f64>) -> SolverResult<DVector<f64>> {
        self.check_len(x)?;
        let mut values = self.base.clone();
        for (id, &value) in self.vars.iter().zip(x.iter()) {
            values[id.slot()] = value;
        }

        let mut r = DVector::zeros(self.cons.len());
        for (i, &id) in self.cons.iter().enumerate() {
            r[i] = model.constraint(id)?.evaluate(&values);
        }
        Ok(r)
    }

    fn check_len(&self, x: &DVector<f64>) -> SolverResult<()> {
        if x.len() != self.vars.len() {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "vector length {} does not match {} unknowns",
                    x.len(),
                    self.vars.len()
                ),
            });
        }
        Ok(())
    }
}
