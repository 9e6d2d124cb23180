//! Non-isothermal CSTR with the enzyme reaction `S + E <-> C -> P + E`.
//!
//! Substrate `S` binds enzyme `E` into complex `C`, which either unbinds or
//! converts into product `P`, releasing the enzyme. Rate coefficients follow
//! Arrhenius, heats of reaction cool the reactor, and the feed switches
//! composition twice over the horizon.
//!
//! Units: minutes, m^3, kmol, K, kcal.

use serde::{Deserialize, Serialize};
use si_core::VarId;
use si_model::{Model, VarKey, add_collocation_equations};
use si_time::Discretization;
use tracing::debug;

use crate::case::DemoCase;
use crate::error::{DemoError, DemoResult};

/// Gas constant [kcal/kmol/K]
pub const GAS_CONSTANT: f64 = 1.987;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    Substrate,
    Enzyme,
    Complex,
    Product,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Substrate,
        Component::Enzyme,
        Component::Complex,
        Component::Product,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Component::Substrate => "S",
            Component::Enzyme => "E",
            Component::Complex => "C",
            Component::Product => "P",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reaction {
    /// `S + E -> C`
    Binding,
    /// `C -> S + E`
    Unbinding,
    /// `C -> P + E`
    Conversion,
}

impl Reaction {
    pub const ALL: [Reaction; 3] = [Reaction::Binding, Reaction::Unbinding, Reaction::Conversion];

    pub fn label(self) -> &'static str {
        match self {
            Reaction::Binding => "R1",
            Reaction::Unbinding => "R2",
            Reaction::Conversion => "R3",
        }
    }

    pub fn stoichiometry(self, j: Component) -> f64 {
        use Component::*;
        match (self, j) {
            (Reaction::Binding, Substrate | Enzyme) => -1.0,
            (Reaction::Binding, Complex) => 1.0,
            (Reaction::Unbinding, Substrate | Enzyme) => 1.0,
            (Reaction::Unbinding, Complex) => -1.0,
            (Reaction::Conversion, Enzyme | Product) => 1.0,
            (Reaction::Conversion, Complex) => -1.0,
            _ => 0.0,
        }
    }

    /// Arrhenius pre-exponential factor [1/min]
    pub fn pre_exponential(self) -> f64 {
        match self {
            Reaction::Binding => 3.36e6,
            Reaction::Unbinding => 1.80e6,
            Reaction::Conversion => 5.79e7,
        }
    }

    /// Activation energy [kcal/kmol]
    pub fn activation_energy(self) -> f64 {
        match self {
            Reaction::Binding => 8.0e3,
            Reaction::Unbinding => 9.0e3,
            Reaction::Conversion => 1.0e4,
        }
    }

    /// Temperature rise per unit extent, already scaled by `rho * cp`
    pub fn heat_of_reaction(self) -> f64 {
        match self {
            Reaction::Binding | Reaction::Unbinding => 1e3 / 900.0 / 0.231,
            Reaction::Conversion => 5e3 / 900.0 / 0.231,
        }
    }

    pub fn coefficient(self, temperature: f64) -> f64 {
        self.pre_exponential() * (-self.activation_energy() / GAS_CONSTANT / temperature).exp()
    }

    /// Rate [kmol/m^3/min] from the coefficient and concentrations in
    /// [`Component::ALL`] order.
    pub fn rate(self, coef: f64, conc: &[f64]) -> f64 {
        match self {
            Reaction::Binding => {
                coef * conc[Component::Substrate.slot()] * conc[Component::Enzyme.slot()]
            }
            Reaction::Unbinding | Reaction::Conversion => coef * conc[Component::Complex.slot()],
        }
    }
}

/// Feed composition in effect up to and including `until`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSegment {
    pub until: f64,
    /// Substrate molar flow [kmol/min]
    pub substrate: f64,
    /// Enzyme molar flow [kmol/min]
    pub enzyme: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnzymeParams {
    pub horizon: f64,
    pub nfe: usize,
    pub ncp: usize,
    pub volume: f64,
    /// Volumetric flow in and out [m^3/min]
    pub flow_rate: f64,
    pub inlet_temperature: f64,
    pub initial_temperature: f64,
    /// Placeholder temperature at every later point
    pub temperature_guess: f64,
    /// Ordered by `until`; the last segment also covers anything after it.
    pub feed: Vec<FeedSegment>,
}

impl Default for EnzymeParams {
    fn default() -> Self {
        Self {
            horizon: 6.0,
            nfe: 12,
            ncp: 3,
            volume: 1.0,
            flow_rate: 2.2,
            inlet_temperature: 300.0,
            initial_temperature: 300.0,
            temperature_guess: 300.0,
            feed: vec![
                FeedSegment {
                    until: 2.0,
                    substrate: 12.92 * 2.1,
                    enzyme: 11.91 * 0.1,
                },
                FeedSegment {
                    until: 4.0,
                    substrate: 12.92 * 2.1,
                    enzyme: 5.95 * 0.1,
                },
                FeedSegment {
                    until: 6.0,
                    substrate: 16.75 * 2.1,
                    enzyme: 8.95 * 0.1,
                },
            ],
        }
    }
}

impl EnzymeParams {
    /// Inlet molar flow of `j` at time `t`.
    pub fn inlet_flow(&self, t: f64, j: Component) -> f64 {
        let segment = self
            .feed
            .iter()
            .find(|s| t <= s.until + 1e-9)
            .or(self.feed.last());
        match (segment, j) {
            (Some(s), Component::Substrate) => s.substrate,
            (Some(s), Component::Enzyme) => s.enzyme,
            _ => 0.0,
        }
    }

    fn validate(&self) -> DemoResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let problem = if !positive(self.volume) {
            Some("volume must be positive")
        } else if !(self.flow_rate.is_finite() && self.flow_rate >= 0.0) {
            Some("flow rate must be non-negative")
        } else if !positive(self.initial_temperature) || !positive(self.temperature_guess) {
            Some("temperatures must be positive")
        } else if self.feed.is_empty() {
            Some("feed schedule is empty")
        } else if self.feed.windows(2).any(|w| w[1].until <= w[0].until) {
            Some("feed segments must be ordered by time")
        } else {
            None
        };
        match problem {
            Some(what) => Err(DemoError::InvalidParams {
                what: what.to_string(),
            }),
            None => Ok(()),
        }
    }
}

pub fn holdup(j: Component) -> VarKey {
    VarKey::new("holdup").with(j.label())
}

pub fn concentration(j: Component) -> VarKey {
    VarKey::new("conc").with(j.label())
}

pub fn outlet_flow(j: Component) -> VarKey {
    VarKey::new("flow_out").with(j.label())
}

pub fn inlet_flow(j: Component) -> VarKey {
    VarKey::new("flow_in").with(j.label())
}

pub fn temperature() -> VarKey {
    VarKey::new("temperature")
}

pub fn build(params: &EnzymeParams) -> DemoResult<DemoCase> {
    params.validate()?;
    let disc = Discretization::lagrange_radau(0.0, params.horizon, params.nfe, params.ncp)?;
    let time = disc.time();
    let volume = params.volume;
    let q = params.flow_rate;
    let t_in = params.inlet_temperature;

    let mut model = Model::new();
    for (t, t_value) in time.iter() {
        let at_start = time.is_start(t);
        let temp_value = if at_start {
            params.initial_temperature
        } else {
            params.temperature_guess
        };

        let temp = model.add_var(temperature().at(t), temp_value)?;
        let energy = model.add_var(VarKey::new("energy_holdup").at(t), volume * temp_value)?;
        let denergy = model.add_var(VarKey::new("denergy_dt").at(t), 0.0)?;
        if at_start {
            model.fix(temp)?;
        }

        let mut conc: Vec<VarId> = Vec::with_capacity(4);
        for j in Component::ALL {
            conc.push(model.add_var(concentration(j).at(t), 0.0)?);
        }

        let mut rates: Vec<VarId> = Vec::with_capacity(3);
        for r in Reaction::ALL {
            let coef = VarKey::new("coef").with(r.label()).at(t);
            let coef = model.add_var(coef, r.coefficient(temp_value))?;
            let rate = model.add_var(VarKey::new("rate").with(r.label()).at(t), 0.0)?;
            rates.push(rate);

            model.add_constraint(
                format!("arrhenius[{}]", r.label()),
                Some(t),
                vec![coef, temp],
                move |v| v[0] - r.coefficient(v[1]),
            )?;

            let mut vars = vec![rate, coef];
            vars.extend_from_slice(&conc);
            model.add_constraint(
                format!("rate_eq[{}]", r.label()),
                Some(t),
                vars,
                move |v| v[0] - r.rate(v[1], &v[2..]),
            )?;
        }

        for j in Component::ALL {
            let c = conc[j.slot()];
            let m = model.add_var(holdup(j).at(t), 0.0)?;
            let dm = model.add_var(VarKey::new("dholdup_dt").with(j.label()).at(t), 0.0)?;
            let inflow = model.add_var(inlet_flow(j).at(t), params.inlet_flow(t_value, j))?;
            let outflow = model.add_var(outlet_flow(j).at(t), 0.0)?;
            model.fix(inflow)?;
            if at_start {
                // empty reactor
                model.fix_at(m, 0.0)?;
            }

            model.add_constraint(
                format!("holdup_calc[{}]", j.label()),
                Some(t),
                vec![m, c],
                move |v| v[0] - volume * v[1],
            )?;
            model.add_constraint(
                format!("outlet_flow[{}]", j.label()),
                Some(t),
                vec![outflow, c],
                move |v| v[0] - q * v[1],
            )?;

            let nu: Vec<f64> = Reaction::ALL.iter().map(|r| r.stoichiometry(j)).collect();
            let mut vars = vec![dm, inflow, outflow];
            vars.extend_from_slice(&rates);
            model.add_constraint(
                format!("material_balance[{}]", j.label()),
                Some(t),
                vars,
                move |v| {
                    let generation: f64 = nu.iter().zip(&v[3..]).map(|(n, r)| n * r).sum();
                    v[0] - (v[1] - v[2] + volume * generation)
                },
            )?;
        }

        model.add_constraint(
            "energy_holdup_calc",
            Some(t),
            vec![energy, temp],
            move |v| v[0] - volume * v[1],
        )?;

        let dh: Vec<f64> = Reaction::ALL.iter().map(|r| r.heat_of_reaction()).collect();
        let mut vars = vec![denergy, temp];
        vars.extend_from_slice(&rates);
        model.add_constraint("energy_balance", Some(t), vars, move |v| {
            let heat: f64 = dh.iter().zip(&v[2..]).map(|(h, r)| h * r).sum();
            v[0] - (q * t_in - q * v[1] - volume * heat)
        })?;
    }

    for j in Component::ALL {
        add_collocation_equations(
            &mut model,
            &disc,
            &holdup(j),
            &VarKey::new("dholdup_dt").with(j.label()),
        )?;
    }
    add_collocation_equations(
        &mut model,
        &disc,
        &VarKey::new("energy_holdup"),
        &VarKey::new("denergy_dt"),
    )?;

    debug!(
        variables = model.var_count(),
        constraints = model.constraint_count(),
        "enzyme CSTR built"
    );
    Ok(DemoCase {
        name: "enzyme",
        model,
        disc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use si_model::degrees_of_freedom;

    #[test]
    fn stoichiometry_conserves_enzyme() {
        // E + C is invariant under every reaction
        for r in Reaction::ALL {
            let net = r.stoichiometry(Component::Enzyme) + r.stoichiometry(Component::Complex);
            assert_eq!(net, 0.0, "{}", r.label());
        }
    }

    #[test]
    fn rates_dispatch_on_reaction() {
        let conc = [2.0, 3.0, 5.0, 7.0];
        assert_eq!(Reaction::Binding.rate(1.0, &conc), 6.0);
        assert_eq!(Reaction::Unbinding.rate(2.0, &conc), 10.0);
        assert_eq!(Reaction::Conversion.rate(0.5, &conc), 2.5);
    }

    #[test]
    fn feed_switches_on_schedule() {
        let params = EnzymeParams::default();
        assert_eq!(params.inlet_flow(2.0, Component::Enzyme), 11.91 * 0.1);
        assert_eq!(params.inlet_flow(2.5, Component::Enzyme), 5.95 * 0.1);
        assert_eq!(params.inlet_flow(9.0, Component::Substrate), 16.75 * 2.1);
        assert_eq!(params.inlet_flow(1.0, Component::Product), 0.0);
    }

    #[test]
    fn built_model_is_square() {
        let params = EnzymeParams {
            nfe: 2,
            ncp: 2,
            ..EnzymeParams::default()
        };
        let case = build(&params).unwrap();
        assert_eq!(degrees_of_freedom(&case.model), 0);
    }

    #[test]
    fn unordered_feed_is_rejected() {
        let mut params = EnzymeParams::default();
        params.feed.swap(0, 2);
        assert!(matches!(build(&params), Err(DemoError::InvalidParams { .. })));
    }
}
