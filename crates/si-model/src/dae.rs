//! Collocation equations linking a differential state to its derivative.

use si_core::ConId;
use si_time::Discretization;
use tracing::debug;

use crate::error::ModelResult;
use crate::key::VarKey;
use crate::model::Model;

/// Add `dxdt(t_j) = sum_k w_jk * x(t_k)` at every collocation point of every
/// element of `disc`.
///
/// `state` and `derivative` are time-free templates; both quantities must
/// already exist at every point of `disc.time()`. The constraint is declared
/// at `t_j` and named `<derivative>_disc_eq`. Nothing is added at the horizon
/// start.
pub fn add_collocation_equations(
    model: &mut Model,
    disc: &Discretization,
    state: &VarKey,
    derivative: &VarKey,
) -> ModelResult<Vec<ConId>> {
    let name = format!("{}_disc_eq", derivative.name());
    let mut added = Vec::with_capacity(disc.nfe() * disc.ncp());

    for element in disc.elements()? {
        let states = element
            .points()
            .map(|t| model.require_var(&state.at_time(t)))
            .collect::<ModelResult<Vec<_>>>()?;

        for (j, t) in element.points().enumerate().skip(1) {
            let weights = disc.derivative_weights(&element, j)?;
            let mut vars = Vec::with_capacity(states.len() + 1);
            vars.push(model.require_var(&derivative.at_time(t))?);
            vars.extend_from_slice(&states);

            let id = model.add_constraint(name.clone(), Some(t), vars, move |v| {
                let slope: f64 = weights.iter().zip(&v[1..]).map(|(w, x)| w * x).sum();
                v[0] - slope
            })?;
            added.push(id);
        }
    }

    debug!(
        state = %state,
        derivative = %derivative,
        equations = added.len(),
        "collocation equations added"
    );
    Ok(added)
}
