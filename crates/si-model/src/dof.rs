//! Degrees-of-freedom accounting.
//!
//! A variable counts as free when it is unfixed and appears in at least one
//! active constraint; every active constraint counts as one equation.

use std::collections::BTreeSet;

use si_core::VarId;

use crate::model::{Constraint, Model};
use crate::view::ElementView;

/// Structural classification of a (sub-)model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    Square,
    UnderDetermined,
    OverDetermined,
}

impl Balance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Balance::Square => "square",
            Balance::UnderDetermined => "under-determined",
            Balance::OverDetermined => "over-determined",
        }
    }
}

/// Free-variable and equation counts of a model or element view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DofSummary {
    pub free_variables: usize,
    pub active_equations: usize,
}

impl DofSummary {
    /// Count over every active constraint of the model.
    pub fn of_model(model: &Model) -> Self {
        Self::count(model, model.constraints().map(|(_, c)| c), |_| true)
    }

    /// Count what the element would solve for on its own: active view
    /// constraints, and unfixed view variables they reference. Variables of
    /// other elements are treated as fixed.
    pub fn of_view(model: &Model, view: &ElementView) -> Self {
        let owned: BTreeSet<VarId> = view.variables().iter().copied().collect();
        Self::count(
            model,
            view.constraints()
                .iter()
                .filter_map(|&id| model.constraint(id).ok()),
            |v| owned.contains(&v),
        )
    }

    fn count<'a, P>(
        model: &Model,
        constraints: impl Iterator<Item = &'a Constraint>,
        in_scope: P,
    ) -> Self
    where
        P: Fn(VarId) -> bool,
    {
        let mut free: BTreeSet<VarId> = BTreeSet::new();
        let mut active_equations = 0;
        for con in constraints.filter(|c| c.is_active()) {
            active_equations += 1;
            for &v in con.vars() {
                if in_scope(v) && matches!(model.is_fixed(v), Ok(false)) {
                    free.insert(v);
                }
            }
        }
        Self {
            free_variables: free.len(),
            active_equations,
        }
    }

    /// `free_variables - active_equations`.
    pub fn dof(&self) -> i64 {
        self.free_variables as i64 - self.active_equations as i64
    }

    pub fn balance(&self) -> Balance {
        match self.dof() {
            0 => Balance::Square,
            d if d > 0 => Balance::UnderDetermined,
            _ => Balance::OverDetermined,
        }
    }

    pub fn is_square(&self) -> bool {
        self.dof() == 0
    }
}

/// Degrees of freedom of the whole model.
pub fn degrees_of_freedom(model: &Model) -> i64 {
    DofSummary::of_model(model).dof()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::VarKey;

    #[test]
    fn counts_only_vars_in_active_constraints() {
        let mut m = Model::new();
        let x = m.add_var(VarKey::new("x"), 0.0).unwrap();
        let y = m.add_var(VarKey::new("y"), 0.0).unwrap();
        // z appears nowhere and is not counted
        m.add_var(VarKey::new("z"), 0.0).unwrap();
        let c = m
            .add_constraint("c", None, vec![x, y], |v| v[0] - v[1])
            .unwrap();

        let s = DofSummary::of_model(&m);
        assert_eq!(s.free_variables, 2);
        assert_eq!(s.active_equations, 1);
        assert_eq!(s.balance(), Balance::UnderDetermined);

        m.fix(y).unwrap();
        assert_eq!(degrees_of_freedom(&m), 0);
        assert!(DofSummary::of_model(&m).is_square());

        m.fix(x).unwrap();
        assert_eq!(DofSummary::of_model(&m).balance(), Balance::OverDetermined);

        m.deactivate(c).unwrap();
        assert_eq!(DofSummary::of_model(&m), DofSummary::default());
    }

    #[test]
    fn view_counts_only_its_own_unfixed_variables() {
        use si_core::Tolerances;
        use si_time::{TimeIdx, TimeSet, partition};

        let time = TimeSet::new(vec![0.0, 1.0, 2.0]).unwrap();
        let elements = partition(&time, &[0.0, 1.0, 2.0], Tolerances::default()).unwrap();
        let mut m = Model::new();
        let x = m.add_indexed_var("x", &[], &time, 1.0).unwrap();
        m.fix(x[0]).unwrap();
        for i in 1..3 {
            m.add_constraint("step", Some(TimeIdx::new(i)), vec![x[i - 1], x[i]], |v| {
                v[1] - 0.5 * v[0]
            })
            .unwrap();
        }

        // x(1) is unfixed but belongs to the first element
        let second = ElementView::select(&m, &time, &elements[1], false);
        let s = DofSummary::of_view(&m, &second);
        assert_eq!(s.free_variables, 1);
        assert_eq!(s.active_equations, 1);
        assert!(s.is_square());
        assert_eq!(DofSummary::of_model(&m).free_variables, 2);

        m.fix(x[2]).unwrap();
        assert_eq!(
            DofSummary::of_view(&m, &second).balance(),
            Balance::OverDetermined
        );
        assert_eq!(DofSummary::of_model(&m).free_variables, 1);
    }

    #[test]
    fn balance_names() {
        assert_eq!(Balance::Square.as_str(), "square");
        assert_eq!(Balance::OverDetermined.as_str(), "over-determined");
    }
}
