//! A built demonstration model and the operations the CLI runs on it.

use serde::Serialize;
use si_core::Tolerances;
use si_init::{ElementEvent, ElementPlan, InitOptions, initialize_with_progress, plan};
use si_model::{DofSummary, Model, VarKey};
use si_solver::SolverAdapter;
use si_time::Discretization;

use crate::error::{DemoError, DemoResult};

/// A collocated model together with its discretization.
#[derive(Debug)]
pub struct DemoCase {
    pub name: &'static str,
    pub model: Model,
    pub disc: Discretization,
}

/// One value of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub t: f64,
    pub value: f64,
}

/// Values of one quantity at every time point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub name: String,
    pub samples: Vec<Sample>,
}

/// Post-run figures reported by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub case: String,
    pub nfe: usize,
    pub ncp: usize,
    pub variables: usize,
    pub constraints: usize,
    pub dof: i64,
    pub max_infeasibility: f64,
}

impl DemoCase {
    /// Run the sequential initializer over the case's own element boundaries.
    pub fn initialize<S>(
        &mut self,
        solver: &mut S,
        options: &InitOptions,
        observer: Option<&mut dyn FnMut(&ElementEvent)>,
    ) -> DemoResult<()>
    where
        S: SolverAdapter + ?Sized,
    {
        initialize_with_progress(
            &mut self.model,
            self.disc.time(),
            self.disc.boundaries(),
            solver,
            options,
            observer,
        )?;
        Ok(())
    }

    pub fn plan(&self, tol: Tolerances) -> DemoResult<Vec<ElementPlan>> {
        Ok(plan(&self.model, self.disc.time(), self.disc.boundaries(), tol)?)
    }

    /// Values of `template` (a key without time) at every time point.
    pub fn trajectory(&self, template: &VarKey) -> DemoResult<Trajectory> {
        let samples = self
            .disc
            .time()
            .iter()
            .map(|(t, value)| -> DemoResult<Sample> {
                let id = self.model.require_var(&template.at_time(t))?;
                Ok(Sample {
                    t: value,
                    value: self.model.value(id)?,
                })
            })
            .collect::<DemoResult<Vec<_>>>()?;
        Ok(Trajectory {
            name: template.to_string(),
            samples,
        })
    }

    /// Value of `template` at the time point matching `t`.
    pub fn value_at(&self, template: &VarKey, t: f64) -> DemoResult<f64> {
        let idx = self
            .disc
            .time()
            .find(t, Tolerances::default())
            .ok_or_else(|| DemoError::InvalidParams {
                what: format!("{t} is not a time point"),
            })?;
        Ok(self.model.value(self.model.require_var(&template.at_time(idx))?)?)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            case: self.name.to_string(),
            nfe: self.disc.nfe(),
            ncp: self.disc.ncp(),
            variables: self.model.var_count(),
            constraints: self.model.constraint_count(),
            dof: DofSummary::of_model(&self.model).dof(),
            max_infeasibility: self.model.max_infeasibility(),
        }
    }
}
