//! Per-element projection of a model.

use si_core::{ConId, VarId};
use si_time::{FiniteElement, TimeSet};

use crate::model::Model;

/// The variables and constraints one finite element solves for.
///
/// Holds ids only, so the model stays free for in-place flag mutation while
/// the view is alive. Built fresh for each element and then dropped.
#[derive(Debug, Clone)]
pub struct ElementView {
    element: FiniteElement,
    variables: Vec<VarId>,
    initial_conditions: Vec<VarId>,
    constraints: Vec<ConId>,
    leaking: Vec<ConId>,
}

impl ElementView {
    /// Select the element's share of `model`.
    ///
    /// - variables: time-indexed variables at the element's owned points
    ///   (interior and right boundary; the horizon start too when `is_first`)
    /// - initial conditions: variables at the horizon start that are fixed
    ///   right now; kept out of `variables` so they are never released
    /// - constraints: time-indexed constraints declared at an owned point
    ///   whose variables all lie at or before the right boundary
    /// - leaking: constraints declared at an owned point that reach past the
    ///   right boundary
    pub fn select(model: &Model, time: &TimeSet, element: &FiniteElement, is_first: bool) -> Self {
        let mut variables = Vec::new();
        let mut initial_conditions = Vec::new();
        for (id, var) in model.variables() {
            let Some(t) = var.time() else { continue };
            if !element.owns(t, is_first) {
                continue;
            }
            if time.is_start(t) && var.is_fixed() {
                initial_conditions.push(id);
            } else {
                variables.push(id);
            }
        }

        let mut constraints = Vec::new();
        let mut leaking = Vec::new();
        for (id, con) in model.constraints() {
            let Some(t) = con.time() else { continue };
            if !element.owns(t, is_first) {
                continue;
            }
            let leaks = model
                .constraint_reach(id)
                .ok()
                .flatten()
                .is_some_and(|r| element.is_downstream(r));
            if leaks {
                leaking.push(id);
            } else {
                constraints.push(id);
            }
        }

        Self {
            element: *element,
            variables,
            initial_conditions,
            constraints,
            leaking,
        }
    }

    pub fn element(&self) -> &FiniteElement {
        &self.element
    }

    /// Variables released for this element's solve.
    pub fn variables(&self) -> &[VarId] {
        &self.variables
    }

    pub fn initial_conditions(&self) -> &[VarId] {
        &self.initial_conditions
    }

    pub fn constraints(&self) -> &[ConId] {
        &self.constraints
    }

    pub fn leaking(&self) -> &[ConId] {
        &self.leaking
    }
}
