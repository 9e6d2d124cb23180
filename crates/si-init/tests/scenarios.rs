//! End-to-end behaviour of the sequential initializer.

mod common;

use common::{Spy, active_flags, decay, fixed_flags, x_key};
use si_init::{
    ConfigurationError, ElementEvent, ElementStage, InitError, InitOptions, initialize,
    initialize_with_progress, plan,
};
use si_model::{Model, VarKey, degrees_of_freedom};
use si_solver::{NewtonAdapter, SolveOptions, SolverAdapter, TerminationStatus};
use si_time::{Discretization, TimeError};

#[test]
fn decay_two_elements_tracks_exponential() {
    let (mut model, disc) = decay(0.0, 2.0, 2, 3);
    let flags_before = fixed_flags(&model);
    let mut spy = Spy::default();

    initialize(&mut model, disc.time(), disc.boundaries(), &mut spy, &InitOptions::default())
        .unwrap();

    assert_eq!(spy.calls.len(), 2);
    for (t, value) in disc.time().iter() {
        let x = model.value(model.var_id(&x_key(t)).unwrap()).unwrap();
        assert!((x - (-value).exp()).abs() < 1e-3, "x({value}) = {x}");
    }
    assert_eq!(fixed_flags(&model), flags_before);
    assert_eq!(degrees_of_freedom(&model), 0);
    assert!(model.max_infeasibility() < 1e-6);
}

#[test]
fn unsorted_boundaries_fail_before_any_solve() {
    let (mut model, disc) = decay(0.0, 2.0, 2, 2);
    let flags_before = fixed_flags(&model);
    let values_before = model.values();
    let mut spy = Spy::default();

    let err = initialize(
        &mut model,
        disc.time(),
        &[0.0, 2.0, 1.0],
        &mut spy,
        &InitOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        InitError::Configuration(ConfigurationError::Partition(
            TimeError::BoundariesNotIncreasing { .. }
        ))
    ));
    assert!(spy.calls.is_empty());
    assert_eq!(fixed_flags(&model), flags_before);
    assert_eq!(model.values(), values_before);
}

#[test]
fn non_square_model_is_rejected_up_front() {
    let (mut model, disc) = decay(0.0, 1.0, 1, 2);
    model.add_var(VarKey::new("spare"), 0.0).unwrap();
    let spare = model.var_id(&VarKey::new("spare")).unwrap();
    let x1 = model.var_id(&x_key(disc.time().end_idx())).unwrap();
    model
        .add_constraint("extra", None, vec![spare, x1], |v| v[0] - v[1])
        .unwrap();
    // spare gets an equation, but x(0) is now also free
    let x0 = model.var_id(&x_key(disc.time().start_idx())).unwrap();
    model.unfix(x0).unwrap();

    let mut spy = Spy::default();
    let err = initialize(&mut model, disc.time(), disc.boundaries(), &mut spy, &InitOptions::default())
        .unwrap_err();

    assert!(matches!(
        err,
        InitError::Configuration(ConfigurationError::NonSquareModel { .. })
    ));
    assert!(spy.calls.is_empty());
}

/// Decay plus `y(T) + z(T) = 1` and an element-0 constraint pinning `z(T)`.
/// The pin reaches past element 0 and is never active, so the last element
/// has one unmatched free variable.
fn decay_with_leak() -> (Model, Discretization) {
    let (mut model, disc) = decay(0.0, 2.0, 2, 2);
    let end = disc.time().end_idx();
    let y = model.add_var(VarKey::new("y").at(end), 0.5).unwrap();
    let z = model.add_var(VarKey::new("z").at(end), 0.5).unwrap();
    model
        .add_constraint("split", Some(end), vec![y, z], |v| v[0] + v[1] - 1.0)
        .unwrap();

    let early = disc.time().indices().nth(1).unwrap();
    model
        .add_constraint("pin", Some(early), vec![z], |v| v[0] - 0.25)
        .unwrap();
    (model, disc)
}

#[test]
fn non_square_element_stops_without_solving_it() {
    let (mut model, disc) = decay_with_leak();
    assert_eq!(degrees_of_freedom(&model), 0);
    let active_before = active_flags(&model);
    let mut spy = Spy::default();

    let err = initialize(&mut model, disc.time(), disc.boundaries(), &mut spy, &InitOptions::default())
        .unwrap_err();

    match err {
        InitError::Configuration(ConfigurationError::NonSquareElement { element, dof, .. }) => {
            assert_eq!(element, 1);
            assert_eq!(dof, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(spy.calls.len(), 1);

    // element 0 stays converged and frozen
    let elements = disc.elements().unwrap();
    let right = elements[0].right;
    let x_right = model.var_id(&x_key(right)).unwrap();
    assert!((model.value(x_right).unwrap() - (-1.0f64).exp()).abs() < 0.02);
    assert!(model.is_fixed(x_right).unwrap());
    assert_eq!(active_flags(&model), active_before);

    // the rejected element is frozen back at its placeholders
    for t in elements[1].owned_points(false) {
        let id = model.var_id(&x_key(t)).unwrap();
        assert_eq!(model.value(id).unwrap(), 1.0);
        assert!(model.is_fixed(id).unwrap());
    }
    let end = disc.time().end_idx();
    for name in ["y", "z"] {
        let id = model.var_id(&VarKey::new(name).at(end)).unwrap();
        assert_eq!(model.value(id).unwrap(), 0.5);
        assert!(model.is_fixed(id).unwrap());
    }
}

#[test]
fn plan_reports_leaks_and_balance() {
    let (model, disc) = decay_with_leak();
    let plans = plan(&model, disc.time(), disc.boundaries(), Default::default()).unwrap();

    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].leaking, 1);
    assert!(plans[0].is_square());
    assert_eq!(plans[0].initial_conditions, 1);
    assert_eq!(plans[1].dof, 1);
    assert_eq!(plans[1].released, 6);
}

/// Decay over four elements plus a bounded `w` that must equal 5 in the
/// third element but may not exceed 1.
fn decay_with_conflict() -> (Model, Discretization) {
    let (mut model, disc) = decay(0.0, 4.0, 4, 2);
    let elements = disc.elements().unwrap();
    let conflicting = elements[2];
    for t in disc.time().indices().skip(1) {
        let w = model
            .add_bounded_var(VarKey::new("w").at(t), 0.5, Some(0.0), Some(1.0))
            .unwrap();
        let target = if conflicting.owns(t, false) { 5.0 } else { 0.5 };
        model
            .add_constraint("w_target", Some(t), vec![w], move |v| v[0] - target)
            .unwrap();
    }
    (model, disc)
}

#[test]
fn infeasible_element_aborts_the_sweep() {
    let (mut model, disc) = decay_with_conflict();
    let elements = disc.elements().unwrap();
    let mut spy = Spy::default();

    let err = initialize(&mut model, disc.time(), disc.boundaries(), &mut spy, &InitOptions::default())
        .unwrap_err();

    assert!(err.is_solver());
    assert_eq!(err.element(), Some(2));
    match err {
        InitError::Solver {
            termination,
            t_start,
            t_end,
            ..
        } => {
            assert_eq!(termination, TerminationStatus::Infeasible);
            assert_eq!((t_start, t_end), (2.0, 3.0));
        }
        other => panic!("unexpected error: {other}"),
    }
    // the fourth element is never attempted
    assert_eq!(spy.calls.len(), 3);

    // converged elements keep their values and stay fixed
    for element in &elements[..2] {
        for t in element.owned_points(false) {
            let id = model.var_id(&x_key(t)).unwrap();
            let exact = (-disc.time().value(t)).exp();
            assert!((model.value(id).unwrap() - exact).abs() < 0.02);
            assert!(model.is_fixed(id).unwrap());
        }
    }
    // the failing element drops the partial iterate and is frozen again
    for t in elements[2].owned_points(false) {
        let x = model.var_id(&x_key(t)).unwrap();
        assert_eq!(model.value(x).unwrap(), 1.0);
        assert!(model.is_fixed(x).unwrap());
        let w = model.var_id(&VarKey::new("w").at(t)).unwrap();
        assert_eq!(model.value(w).unwrap(), 0.5);
        assert!(model.is_fixed(w).unwrap());
    }
    // untouched elements keep their placeholders, still fixed
    for t in elements[3].owned_points(false) {
        let id = model.var_id(&x_key(t)).unwrap();
        assert_eq!(model.value(id).unwrap(), 1.0);
        assert!(model.is_fixed(id).unwrap());
    }
}

#[test]
fn failure_can_restore_every_flag() {
    let (mut model, disc) = decay_with_conflict();
    let flags_before = fixed_flags(&model);
    let active_before = active_flags(&model);
    let options = InitOptions {
        restore_flags_on_failure: true,
        ..InitOptions::default()
    };

    let err = initialize(&mut model, disc.time(), disc.boundaries(), &mut NewtonAdapter::new(), &options)
        .unwrap_err();

    assert!(err.is_solver());
    assert_eq!(fixed_flags(&model), flags_before);
    assert_eq!(active_flags(&model), active_before);
}

#[test]
fn time_invariant_parameters_are_held_then_released() {
    // dx/dt = -k x with a free parameter k pinned by k = 1
    let disc = Discretization::lagrange_radau(0.0, 2.0, 2, 3).unwrap();
    let mut model = Model::new();
    let k = model.add_var(VarKey::new("k"), 1.0).unwrap();
    for t in disc.time().indices() {
        let x = model.add_var(x_key(t), 1.0).unwrap();
        let dxdt = model.add_var(VarKey::new("dxdt").at(t), 0.0).unwrap();
        model
            .add_constraint("ode", Some(t), vec![x, dxdt, k], |v| v[1] + v[2] * v[0])
            .unwrap();
    }
    si_model::add_collocation_equations(&mut model, &disc, &VarKey::new("x"), &VarKey::new("dxdt"))
        .unwrap();
    let k_pin = model.add_constraint("k_pin", None, vec![k], |v| v[0] - 1.0).unwrap();
    let x0 = model.var_id(&x_key(disc.time().start_idx())).unwrap();
    model.fix(x0).unwrap();

    let mut spy = Spy::default();
    initialize(&mut model, disc.time(), disc.boundaries(), &mut spy, &InitOptions::default())
        .unwrap();

    assert!(spy.calls.iter().all(|c| c.free_time_invariant == 0));
    assert!(!model.is_fixed(k).unwrap());
    assert!(model.is_active(k_pin).unwrap());

    // the initialized model is a good start for the full-horizon solve
    let status = NewtonAdapter::new().solve(&mut model, &SolveOptions::default());
    assert_eq!(status, TerminationStatus::Optimal);
    let x_end = model.var_id(&x_key(disc.time().end_idx())).unwrap();
    assert!((model.value(x_end).unwrap() - (-2.0f64).exp()).abs() < 1e-3);
}

#[test]
fn progress_events_bracket_each_element() {
    let (mut model, disc) = decay(0.0, 3.0, 3, 2);
    let mut events: Vec<ElementEvent> = Vec::new();
    let mut record = |e: &ElementEvent| events.push(*e);

    initialize_with_progress(
        &mut model,
        disc.time(),
        disc.boundaries(),
        &mut NewtonAdapter::new(),
        &InitOptions::default(),
        Some(&mut record),
    )
    .unwrap();

    let stages: Vec<_> = events.iter().map(|e| (e.index, e.stage)).collect();
    assert_eq!(
        stages,
        vec![
            (0, ElementStage::Started),
            (0, ElementStage::Converged),
            (1, ElementStage::Started),
            (1, ElementStage::Converged),
            (2, ElementStage::Started),
            (2, ElementStage::Converged),
        ]
    );
    assert!(events.iter().all(|e| e.count == 3));
    assert_eq!((events[2].t_start, events[2].t_end), (1.0, 2.0));
}

#[test]
fn caller_fixed_inputs_stay_fixed() {
    // x(1) is pinned by the caller, its collocation equation is dropped
    let (mut model, disc) = decay(0.0, 2.0, 2, 1);
    let mid = disc.time().indices().nth(1).unwrap();
    let x_mid = model.var_id(&x_key(mid)).unwrap();
    model.fix_at(x_mid, 0.5).unwrap();
    let ode_mid = model
        .constraints()
        .find(|(_, c)| c.name() == "ode" && c.time() == Some(mid))
        .map(|(id, _)| id)
        .unwrap();
    model.deactivate(ode_mid).unwrap();
    assert_eq!(degrees_of_freedom(&model), 0);

    initialize(&mut model, disc.time(), disc.boundaries(), &mut NewtonAdapter::new(), &InitOptions::default())
        .unwrap();

    assert!(model.is_fixed(x_mid).unwrap());
    assert_eq!(model.value(x_mid).unwrap(), 0.5);
    assert!(!model.is_active(ode_mid).unwrap());
}

#[test]
fn works_without_guess_propagation() {
    let (mut model, disc) = decay(0.0, 2.0, 4, 2);
    let options = InitOptions {
        propagate_guess: false,
        solve: SolveOptions::default().with_specific("central_jacobian", 1.0),
        ..InitOptions::default()
    };

    initialize(&mut model, disc.time(), disc.boundaries(), &mut NewtonAdapter::new(), &options)
        .unwrap();
    assert!(model.max_infeasibility() < 1e-6);
}
