//! Save/restore of variable and constraint state.
//!
//! Restoring is unconditional per-entry reassignment, never a diff, so it is
//! safe after arbitrary intervening mutation.

use std::collections::BTreeMap;

use si_core::{ConId, VarId};

use crate::error::ModelResult;
use crate::model::Model;

/// Fixed flag and value of one variable at capture time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarState {
    pub fixed: bool,
    pub value: f64,
}

/// Immutable record of fixed flags and values for a set of variables.
#[derive(Debug, Clone, Default)]
pub struct VarSnapshot {
    states: BTreeMap<VarId, VarState>,
}

impl VarSnapshot {
    /// Capture exactly `ids`.
    pub fn capture(model: &Model, ids: impl IntoIterator<Item = VarId>) -> ModelResult<Self> {
        let mut states = BTreeMap::new();
        for id in ids {
            let var = model.var(id)?;
            states.insert(
                id,
                VarState {
                    fixed: var.is_fixed(),
                    value: var.value(),
                },
            );
        }
        Ok(Self { states })
    }

    /// Capture every variable of the model.
    pub fn capture_all(model: &Model) -> Self {
        let states = model
            .variables()
            .map(|(id, var)| {
                (
                    id,
                    VarState {
                        fixed: var.is_fixed(),
                        value: var.value(),
                    },
                )
            })
            .collect();
        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn contains(&self, id: VarId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn get(&self, id: VarId) -> Option<VarState> {
        self.states.get(&id).copied()
    }

    /// Captured fixed flag, `None` when `id` was not captured.
    pub fn was_fixed(&self, id: VarId) -> Option<bool> {
        self.states.get(&id).map(|s| s.fixed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, VarState)> + '_ {
        self.states.iter().map(|(&id, &s)| (id, s))
    }

    /// Reassign both fixed flag and value of every captured variable.
    pub fn restore(&self, model: &mut Model) -> ModelResult<()> {
        for (&id, state) in &self.states {
            model.set_value(id, state.value)?;
            model.set_fixed(id, state.fixed)?;
        }
        Ok(())
    }

    /// Reassign only the fixed flags; current values are kept.
    pub fn restore_flags(&self, model: &mut Model) -> ModelResult<()> {
        self.restore_flags_where(model, |_| true)
    }

    /// Reassign the fixed flags of captured variables accepted by `keep`.
    pub fn restore_flags_where<P>(&self, model: &mut Model, mut keep: P) -> ModelResult<()>
    where
        P: FnMut(VarId) -> bool,
    {
        for (&id, state) in &self.states {
            if keep(id) {
                model.set_fixed(id, state.fixed)?;
            }
        }
        Ok(())
    }
}

/// Record of every constraint's active flag.
#[derive(Debug, Clone, Default)]
pub struct ActivitySnapshot {
    active: Vec<(ConId, bool)>,
}

impl ActivitySnapshot {
    pub fn capture_all(model: &Model) -> Self {
        Self {
            active: model
                .constraints()
                .map(|(id, c)| (id, c.is_active()))
                .collect(),
        }
    }

    pub fn was_active(&self, id: ConId) -> Option<bool> {
        // captured in id order
        self.active.get(id.slot()).map(|&(_, a)| a)
    }

    pub fn restore(&self, model: &mut Model) -> ModelResult<()> {
        for &(id, active) in &self.active {
            model.set_active(id, active)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::VarKey;

    fn model() -> (Model, VarId, VarId, VarId) {
        let mut m = Model::new();
        let a = m.add_var(VarKey::new("a"), 1.0).unwrap();
        let b = m.add_var(VarKey::new("b"), 2.0).unwrap();
        let c = m.add_var(VarKey::new("c"), 3.0).unwrap();
        m.fix(b).unwrap();
        (m, a, b, c)
    }

    #[test]
    fn restore_reassigns_only_captured() {
        let (mut m, a, b, c) = model();
        let snap = VarSnapshot::capture(&m, [a, b]).unwrap();
        assert_eq!(snap.len(), 2);
        assert!(!snap.contains(c));

        m.fix_at(a, 10.0).unwrap();
        m.unfix(b).unwrap();
        m.fix_at(c, 30.0).unwrap();

        snap.restore(&mut m).unwrap();
        assert_eq!(m.value(a).unwrap(), 1.0);
        assert!(!m.is_fixed(a).unwrap());
        assert!(m.is_fixed(b).unwrap());
        // untouched by restore
        assert_eq!(m.value(c).unwrap(), 30.0);
        assert!(m.is_fixed(c).unwrap());
    }

    #[test]
    fn restore_flags_keeps_values() {
        let (mut m, a, b, _) = model();
        let snap = VarSnapshot::capture_all(&m);

        m.fix_at(a, 7.0).unwrap();
        m.unfix(b).unwrap();
        m.set_value(b, 8.0).unwrap();

        snap.restore_flags(&mut m).unwrap();
        assert!(!m.is_fixed(a).unwrap());
        assert!(m.is_fixed(b).unwrap());
        assert_eq!(m.value(a).unwrap(), 7.0);
        assert_eq!(m.value(b).unwrap(), 8.0);
    }

    #[test]
    fn restore_is_not_a_diff() {
        let (mut m, a, _, _) = model();
        let snap = VarSnapshot::capture(&m, [a]).unwrap();
        // Mutate back and forth: restore still lands on the captured state
        m.fix(a).unwrap();
        m.unfix(a).unwrap();
        m.fix(a).unwrap();
        snap.restore(&mut m).unwrap();
        assert!(!m.is_fixed(a).unwrap());
        assert_eq!(snap.was_fixed(a), Some(false));
    }

    #[test]
    fn selective_flag_restore() {
        let (mut m, a, b, _) = model();
        let snap = VarSnapshot::capture_all(&m);
        m.fix(a).unwrap();
        m.unfix(b).unwrap();
        snap.restore_flags_where(&mut m, |id| id == b).unwrap();
        assert!(m.is_fixed(a).unwrap());
        assert!(m.is_fixed(b).unwrap());
    }

    #[test]
    fn activity_round_trip() {
        let (mut m, a, b, _) = model();
        let c1 = m.add_constraint("c1", None, vec![a], |v| v[0]).unwrap();
        let c2 = m.add_constraint("c2", None, vec![b], |v| v[0]).unwrap();
        m.deactivate(c2).unwrap();

        let snap = ActivitySnapshot::capture_all(&m);
        m.deactivate(c1).unwrap();
        m.activate(c2).unwrap();
        snap.restore(&mut m).unwrap();

        assert!(m.is_active(c1).unwrap());
        assert!(!m.is_active(c2).unwrap());
        assert_eq!(snap.was_active(c2), Some(false));
    }
}
