//! Dry-run of the element loop: what each element would solve for.

use si_core::Tolerances;
use si_model::{DofSummary, ElementView, Model};
use si_time::{TimeSet, partition};

use crate::error::InitResult;

/// Sizes and balance of one element's sub-problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementPlan {
    pub index: usize,
    pub t_start: f64,
    pub t_end: f64,
    /// Time-indexed variables at the element's owned points.
    pub variables: usize,
    /// Of those, the ones the loop would unfix.
    pub released: usize,
    pub initial_conditions: usize,
    /// Active constraints declared in the element.
    pub constraints: usize,
    pub leaking: usize,
    /// Released variables referenced by the element's constraints, minus the
    /// constraint count.
    pub dof: i64,
}

impl ElementPlan {
    pub fn is_square(&self) -> bool {
        self.dof == 0
    }
}

/// Describe every element the initializer would visit, using the model's
/// current fixed flags. Nothing is mutated and no solver is involved.
pub fn plan(
    model: &Model,
    time: &TimeSet,
    boundaries: &[f64],
    tol: Tolerances,
) -> InitResult<Vec<ElementPlan>> {
    let elements = partition(time, boundaries, tol)?;
    let mut plans = Vec::with_capacity(elements.len());

    for element in &elements {
        let view = ElementView::select(model, time, element, element.index == 0);
        let released = view
            .variables()
            .iter()
            .filter(|&&id| matches!(model.is_fixed(id), Ok(false)))
            .count();
        let summary = DofSummary::of_view(model, &view);

        let (t_start, t_end) = element.span(time);
        plans.push(ElementPlan {
            index: element.index,
            t_start,
            t_end,
            variables: view.variables().len(),
            released,
            initial_conditions: view.initial_conditions().len(),
            constraints: summary.active_equations,
            leaking: view.leaking().len(),
            dof: summary.dof(),
        });
    }
    Ok(plans)
}
