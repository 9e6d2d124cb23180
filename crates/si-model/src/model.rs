//! Variable and constraint storage.

use core::fmt;
use std::collections::HashMap;

use si_core::{ConId, Id, VarId, bound_violation, ensure_finite};
use si_time::{TimeIdx, TimeSet};

use crate::error::{ModelError, ModelResult};
use crate::key::VarKey;

/// Residual of an equality constraint, evaluated over the values of the
/// constraint's variables in declaration order. Zero means satisfied.
pub type ResidualFn = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// A scalar decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    key: VarKey,
    value: f64,
    fixed: bool,
    lower: Option<f64>,
    upper: Option<f64>,
}

impl Variable {
    pub fn key(&self) -> &VarKey {
        &self.key
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    pub fn time(&self) -> Option<TimeIdx> {
        self.key.time()
    }
}

/// An equality constraint `residual(vars) == 0`.
pub struct Constraint {
    name: String,
    time: Option<TimeIdx>,
    vars: Vec<VarId>,
    residual: ResidualFn,
    active: bool,
}

impl Constraint {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time point the constraint is declared at (`None` for time-invariant).
    pub fn time(&self) -> Option<TimeIdx> {
        self.time
    }

    /// Referenced variables, in the order the residual receives them.
    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Evaluate against a full model value vector (indexed by `VarId` slot).
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let args: Vec<f64> = self.vars.iter().map(|v| values[v.slot()]).collect();
        (self.residual)(&args)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("name", &self.name)
            .field("time", &self.time)
            .field("vars", &self.vars)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Owned model: the single source of truth for values and flags.
#[derive(Debug, Default)]
pub struct Model {
    vars: Vec<Variable>,
    cons: Vec<Constraint>,
    lookup: HashMap<VarKey, VarId>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free, unbounded variable with an initial value.
    pub fn add_var(&mut self, key: VarKey, value: f64) -> ModelResult<VarId> {
        self.add_bounded_var(key, value, None, None)
    }

    /// Add a free variable with optional bounds.
    pub fn add_bounded_var(
        &mut self,
        key: VarKey,
        value: f64,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> ModelResult<VarId> {
        if self.lookup.contains_key(&key) {
            return Err(ModelError::DuplicateVariable {
                key: key.to_string(),
            });
        }
        ensure_finite(value, "initial value")?;
        check_bounds(&key, lower, upper)?;

        let id = Id::from_usize(self.vars.len()).ok_or(ModelError::Capacity {
            what: "variables",
        })?;
        self.lookup.insert(key.clone(), id);
        self.vars.push(Variable {
            key,
            value,
            fixed: false,
            lower,
            upper,
        });
        Ok(id)
    }

    /// Add `name[labels..]` at every point of `time`, all starting at `value`.
    pub fn add_indexed_var(
        &mut self,
        name: &str,
        labels: &[&str],
        time: &TimeSet,
        value: f64,
    ) -> ModelResult<Vec<VarId>> {
        let base = labels
            .iter()
            .fold(VarKey::new(name), |key, label| key.with(*label));
        time.indices()
            .map(|t| self.add_var(base.at_time(t), value))
            .collect()
    }

    pub fn set_bounds(
        &mut self,
        id: VarId,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> ModelResult<()> {
        let var = self.var_mut(id)?;
        check_bounds(&var.key, lower, upper)?;
        var.lower = lower;
        var.upper = upper;
        Ok(())
    }

    /// Add an equality constraint over `vars`.
    pub fn add_constraint<F>(
        &mut self,
        name: impl Into<String>,
        time: Option<TimeIdx>,
        vars: Vec<VarId>,
        residual: F,
    ) -> ModelResult<ConId>
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        if let Some(&id) = vars.iter().find(|v| v.slot() >= self.vars.len()) {
            return Err(ModelError::UnknownVariable { id });
        }
        let id = Id::from_usize(self.cons.len()).ok_or(ModelError::Capacity {
            what: "constraints",
        })?;
        self.cons.push(Constraint {
            name: name.into(),
            time,
            vars,
            residual: Box::new(residual),
            active: true,
        });
        Ok(id)
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.cons.len()
    }

    pub fn var_id(&self, key: &VarKey) -> Option<VarId> {
        self.lookup.get(key).copied()
    }

    /// Like [`var_id`](Self::var_id) but reports the missing key as an error.
    pub fn require_var(&self, key: &VarKey) -> ModelResult<VarId> {
        self.var_id(key).ok_or_else(|| ModelError::UnknownKey {
            key: key.to_string(),
        })
    }

    pub fn var(&self, id: VarId) -> ModelResult<&Variable> {
        self.vars
            .get(id.slot())
            .ok_or(ModelError::UnknownVariable { id })
    }

    fn var_mut(&mut self, id: VarId) -> ModelResult<&mut Variable> {
        self.vars
            .get_mut(id.slot())
            .ok_or(ModelError::UnknownVariable { id })
    }

    pub fn constraint(&self, id: ConId) -> ModelResult<&Constraint> {
        self.cons
            .get(id.slot())
            .ok_or(ModelError::UnknownConstraint { id })
    }

    fn constraint_mut(&mut self, id: ConId) -> ModelResult<&mut Constraint> {
        self.cons
            .get_mut(id.slot())
            .ok_or(ModelError::UnknownConstraint { id })
    }

    /// All variables in id order.
    pub fn variables(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, v)| (Id::from_index(i as u32), v))
    }

    /// All constraints in id order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConId, &Constraint)> {
        self.cons
            .iter()
            .enumerate()
            .map(|(i, c)| (Id::from_index(i as u32), c))
    }

    pub fn value(&self, id: VarId) -> ModelResult<f64> {
        Ok(self.var(id)?.value)
    }

    /// Set a value; non-finite values are rejected.
    pub fn set_value(&mut self, id: VarId, value: f64) -> ModelResult<()> {
        ensure_finite(value, "variable value")?;
        self.var_mut(id)?.value = value;
        Ok(())
    }

    pub fn is_fixed(&self, id: VarId) -> ModelResult<bool> {
        Ok(self.var(id)?.fixed)
    }

    pub fn set_fixed(&mut self, id: VarId, fixed: bool) -> ModelResult<()> {
        self.var_mut(id)?.fixed = fixed;
        Ok(())
    }

    /// Fix at the current value.
    pub fn fix(&mut self, id: VarId) -> ModelResult<()> {
        self.set_fixed(id, true)
    }

    /// Set the value and fix.
    pub fn fix_at(&mut self, id: VarId, value: f64) -> ModelResult<()> {
        self.set_value(id, value)?;
        self.set_fixed(id, true)
    }

    pub fn unfix(&mut self, id: VarId) -> ModelResult<()> {
        self.set_fixed(id, false)
    }

    pub fn is_active(&self, id: ConId) -> ModelResult<bool> {
        Ok(self.constraint(id)?.active)
    }

    pub fn set_active(&mut self, id: ConId, active: bool) -> ModelResult<()> {
        self.constraint_mut(id)?.active = active;
        Ok(())
    }

    pub fn activate(&mut self, id: ConId) -> ModelResult<()> {
        self.set_active(id, true)
    }

    pub fn deactivate(&mut self, id: ConId) -> ModelResult<()> {
        self.set_active(id, false)
    }

    /// Copy of every variable value, indexed by `VarId` slot.
    pub fn values(&self) -> Vec<f64> {
        self.vars.iter().map(|v| v.value).collect()
    }

    /// Residual of one constraint at the current values.
    pub fn residual(&self, id: ConId) -> ModelResult<f64> {
        let values = self.values();
        Ok(self.constraint(id)?.evaluate(&values))
    }

    /// Latest time point referenced by a constraint's time-indexed variables.
    pub fn constraint_reach(&self, id: ConId) -> ModelResult<Option<TimeIdx>> {
        let con = self.constraint(id)?;
        Ok(con
            .vars
            .iter()
            .filter_map(|v| self.vars[v.slot()].time())
            .max())
    }

    /// Largest violation over active constraint residuals and variable bounds.
    ///
    /// Non-finite residuals are reported as `f64::INFINITY`.
    pub fn max_infeasibility(&self) -> f64 {
        let values = self.values();
        let residual = self
            .cons
            .iter()
            .filter(|c| c.active)
            .map(|c| {
                let r = c.evaluate(&values).abs();
                if r.is_finite() { r } else { f64::INFINITY }
            })
            .fold(0.0, f64::max);
        let bounds = self
            .vars
            .iter()
            .map(|v| bound_violation(v.value, v.lower, v.upper))
            .fold(0.0, f64::max);
        residual.max(bounds)
    }
}

fn check_bounds(key: &VarKey, lower: Option<f64>, upper: Option<f64>) -> ModelResult<()> {
    if let (Some(lower), Some(upper)) = (lower, upper) {
        if lower > upper {
            return Err(ModelError::InvalidBounds {
                key: key.to_string(),
                lower,
                upper,
            });
        }
    }
    Ok(())
}
