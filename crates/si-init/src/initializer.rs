//! The sequential element-by-element initialization loop.

use std::collections::BTreeSet;

use si_core::{ConId, VarId};
use si_model::{ActivitySnapshot, DofSummary, ElementView, Model, VarSnapshot};
use si_solver::SolverAdapter;
use si_time::{FiniteElement, TimeSet, partition};
use tracing::{debug, info, warn};

use crate::error::{ConfigurationError, InitError, InitResult};
use crate::options::InitOptions;
use crate::progress::{ElementEvent, ElementStage, Progress};

/// Initialize `model` element by element over `time`.
///
/// `boundaries` are the element edges as time values; they must be points of
/// `time`, strictly increasing, and span the whole horizon. Initial
/// conditions (variables at the horizon start) must already be fixed.
///
/// On success every fixed flag and active flag is back to its value at entry
/// and all variable values hold the per-element solutions. On failure the
/// converged values of earlier elements are kept; see [`InitOptions`] for
/// which flags are restored.
pub fn initialize<S>(
    model: &mut Model,
    time: &TimeSet,
    boundaries: &[f64],
    solver: &mut S,
    options: &InitOptions,
) -> InitResult<()>
where
    S: SolverAdapter + ?Sized,
{
    initialize_with_progress(model, time, boundaries, solver, options, None)
}

/// Like [`initialize`], reporting each element to `observer`.
pub fn initialize_with_progress<S>(
    model: &mut Model,
    time: &TimeSet,
    boundaries: &[f64],
    solver: &mut S,
    options: &InitOptions,
    observer: Option<&mut dyn FnMut(&ElementEvent)>,
) -> InitResult<()>
where
    S: SolverAdapter + ?Sized,
{
    let summary = DofSummary::of_model(model);
    if !summary.is_square() {
        return Err(ConfigurationError::NonSquareModel {
            free_variables: summary.free_variables,
            active_equations: summary.active_equations,
        }
        .into());
    }

    let elements = partition(time, boundaries, options.time_tol)?;

    let entry = EntryState::capture(model);

    info!(
        elements = elements.len(),
        points = time.len(),
        variables = model.var_count(),
        constraints = model.constraint_count(),
        "sequential initialization started"
    );

    let mut progress = Progress::new(observer);
    let outcome = match freeze(model, time) {
        Ok(()) => run_elements(model, time, &elements, solver, options, &entry, &mut progress),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            entry.restore(model, true)?;
            info!(
                max_infeasibility = model.max_infeasibility(),
                "sequential initialization finished"
            );
            Ok(())
        }
        Err(e) => {
            entry.restore(model, options.restore_flags_on_failure)?;
            warn!(error = %e, "sequential initialization aborted");
            Err(e)
        }
    }
}

/// Flags of the model as the caller handed it over.
struct EntryState {
    flags: VarSnapshot,
    activity: ActivitySnapshot,
    invariant: BTreeSet<VarId>,
}

impl EntryState {
    fn capture(model: &Model) -> Self {
        Self {
            flags: VarSnapshot::capture_all(model),
            activity: ActivitySnapshot::capture_all(model),
            invariant: model
                .variables()
                .filter(|(_, v)| v.time().is_none())
                .map(|(id, _)| id)
                .collect(),
        }
    }

    fn was_free(&self, id: VarId) -> bool {
        self.flags.was_fixed(id) == Some(false)
    }

    fn was_active(&self, id: ConId) -> bool {
        self.activity.was_active(id) == Some(true)
    }

    /// Return `released` to its entry value, fixed, so a failed element looks
    /// like every element after it.
    fn refreeze(&self, model: &mut Model, released: &[VarId]) -> InitResult<()> {
        for &id in released {
            if let Some(state) = self.flags.get(id) {
                model.set_value(id, state.value)?;
            }
            model.fix(id)?;
        }
        Ok(())
    }

    /// Active flags and time-invariant fixed flags always come back;
    /// time-indexed fixed flags only when `all_flags` is set.
    fn restore(&self, model: &mut Model, all_flags: bool) -> InitResult<()> {
        self.activity.restore(model)?;
        if all_flags {
            self.flags.restore_flags(model)?;
        } else {
            self.flags
                .restore_flags_where(model, |id| self.invariant.contains(&id))?;
        }
        Ok(())
    }
}

/// Fix every time-indexed variable past the horizon start and every
/// time-invariant variable; deactivate every constraint.
fn freeze(model: &mut Model, time: &TimeSet) -> InitResult<()> {
    let to_fix: Vec<VarId> = model
        .variables()
        .filter(|(_, v)| !v.is_fixed())
        .filter(|(_, v)| v.time().is_none_or(|t| !time.is_start(t)))
        .map(|(id, _)| id)
        .collect();
    for id in to_fix {
        model.fix(id)?;
    }

    let active: Vec<_> = model
        .constraints()
        .filter(|(_, c)| c.is_active())
        .map(|(id, _)| id)
        .collect();
    for id in active {
        model.deactivate(id)?;
    }
    Ok(())
}

fn run_elements<S>(
    model: &mut Model,
    time: &TimeSet,
    elements: &[FiniteElement],
    solver: &mut S,
    options: &InitOptions,
    entry: &EntryState,
    progress: &mut Progress<'_>,
) -> InitResult<()>
where
    S: SolverAdapter + ?Sized,
{
    let count = elements.len();
    for element in elements {
        let is_first = element.index == 0;
        let is_last = element.index + 1 == count;
        let (t_start, t_end) = element.span(time);
        let event = |stage| ElementEvent {
            index: element.index,
            count,
            t_start,
            t_end,
            stage,
        };
        progress.emit(event(ElementStage::Started));

        let view = ElementView::select(model, time, element, is_first);
        for &id in view.leaking() {
            let name = model.constraint(id)?.name();
            warn!(
                element = element.index,
                constraint = name,
                "constraint references a point past the element; left inactive"
            );
        }

        // caller-fixed inputs stay fixed
        let released: Vec<VarId> = view
            .variables()
            .iter()
            .copied()
            .filter(|&id| entry.was_free(id))
            .collect();
        if options.propagate_guess && !is_first {
            propagate_guess(model, element, &released)?;
        }
        for &id in &released {
            model.unfix(id)?;
        }
        // constraints the caller switched off stay off
        let equations: Vec<ConId> = view
            .constraints()
            .iter()
            .copied()
            .filter(|&id| entry.was_active(id))
            .collect();
        for &id in &equations {
            model.activate(id)?;
        }

        let summary = DofSummary::of_model(model);
        debug!(
            element = element.index,
            t_start,
            t_end,
            free = summary.free_variables,
            equations = summary.active_equations,
            "element released"
        );
        if !summary.is_square() {
            entry.refreeze(model, &released)?;
            progress.emit(event(ElementStage::Failed));
            return Err(ConfigurationError::NonSquareElement {
                element: element.index,
                t_start,
                t_end,
                dof: summary.dof(),
            }
            .into());
        }

        let termination = solver.solve(model, &options.solve);
        if !termination.is_optimal() {
            entry.refreeze(model, &released)?;
            progress.emit(event(ElementStage::Failed));
            return Err(InitError::Solver {
                element: element.index,
                t_start,
                t_end,
                termination,
            });
        }

        for &id in &equations {
            model.deactivate(id)?;
        }
        // the last element keeps its entry flags; earlier ones freeze the
        // converged state for their successor
        if !is_last {
            for &id in &released {
                model.fix(id)?;
            }
        }

        info!(element = element.index, t_start, t_end, "element converged");
        progress.emit(event(ElementStage::Converged));
    }
    Ok(())
}

/// Copy each released variable's value from the same key at the element's
/// left boundary, where one exists.
fn propagate_guess(
    model: &mut Model,
    element: &FiniteElement,
    released: &[VarId],
) -> InitResult<()> {
    for &id in released {
        let key = model.var(id)?.key().at_time(element.left);
        if let Some(source) = model.var_id(&key) {
            let value = model.value(source)?;
            model.set_value(id, value)?;
        }
    }
    Ok(())
}
