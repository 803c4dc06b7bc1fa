use std::convert::Infallible;

use approx::assert_relative_eq;
use ndarray::{Array1, array};

use mdao_core::{
    FlatState, Model, NameMap, Partials, ProblemMeta, Registry, StateStore, TotalsEngine,
    VariableMeta,
};
use mdao_driver::{Driver, Supports, TotalsFormat};

/// f(x) = (x - 3)², with analytic derivatives.
struct Parabola {
    state: FlatState,
}

impl Parabola {
    fn new(x: f64) -> Self {
        let mut state = FlatState::new();
        state.add("x", [x]).unwrap();
        state.add("f", [0.0]).unwrap();
        Self { state }
    }

    fn x(&self) -> f64 {
        self.state.get("x").unwrap()[0]
    }
}

impl Model for Parabola {
    type State = FlatState;
    type Error = Infallible;

    fn state(&self) -> &FlatState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FlatState {
        &mut self.state
    }

    fn solve_nonlinear(&mut self) -> Result<(), Infallible> {
        let x = self.x();
        self.state.get_mut("f").unwrap()[0] = (x - 3.0).powi(2);
        Ok(())
    }
}

impl TotalsEngine for Parabola {
    type Error = Infallible;

    fn compute_raw_totals(
        &mut self,
        _of: &[String],
        _wrt: &[String],
        _global_names: bool,
    ) -> Result<Partials, Infallible> {
        let dfdx = 2.0 * (self.x() - 3.0);
        let row: NameMap<_> = [("x", array![[dfdx]])].into_iter().collect();
        Ok([("f", row)].into_iter().collect())
    }
}

struct Problem;

impl ProblemMeta for Problem {
    fn design_vars(&self) -> Registry {
        [("x", VariableMeta::new().with_scaler(0.5).with_adder(-1.0))]
            .into_iter()
            .collect()
    }

    fn objectives(&self) -> Registry {
        [("f", VariableMeta::new().with_scaler(0.1))]
            .into_iter()
            .collect()
    }

    fn constraints(&self) -> Registry {
        Registry::new()
    }
}

fn scaled_objective(driver: &mut Driver, model: &mut Parabola, x: &Array1<f64>) -> f64 {
    driver.set_design_var(model.state_mut(), "x", x.view()).unwrap();
    driver.run(model);
    driver.objective_values(model.state()).unwrap().get("f").unwrap()[0]
}

#[test]
fn gradient_descent_in_scaled_space_finds_minimum() {
    let mut driver = Driver::new(Supports::default().with_gradients(true));
    driver.setup(&Problem);
    let mut model = Parabola::new(10.0);

    // Raw x = 10 starts at scaled (10 - 1) * 0.5.
    let mut x = driver.design_var_values(model.state()).unwrap().get("x").unwrap().clone();
    assert_relative_eq!(x[0], 4.5);

    for _ in 0..30 {
        driver.set_design_var(model.state_mut(), "x", x.view()).unwrap();
        driver.run(&mut model);
        assert!(!driver.fail());

        let totals = driver
            .compute_totals(&mut model, None, None, TotalsFormat::Array, true)
            .unwrap();
        let (jac, _) = totals.as_array().unwrap();
        x[0] -= jac[[0, 0]];
    }

    driver.set_design_var(model.state_mut(), "x", x.view()).unwrap();
    assert_relative_eq!(model.x(), 3.0, epsilon = 1e-10);
    assert_relative_eq!(x[0], 1.0, epsilon = 1e-10);
}

#[test]
fn scaled_totals_match_finite_differences() {
    let mut driver = Driver::new(Supports::default());
    driver.setup(&Problem);
    let mut model = Parabola::new(0.0);

    let x = array![2.7];
    let h = 1e-6;
    let forward = scaled_objective(&mut driver, &mut model, &array![x[0] + h]);
    let backward = scaled_objective(&mut driver, &mut model, &array![x[0] - h]);
    let fd = (forward - backward) / (2.0 * h);

    driver.set_design_var(model.state_mut(), "x", x.view()).unwrap();
    let totals = driver
        .compute_totals(&mut model, None, None, TotalsFormat::Dict, true)
        .unwrap();
    let analytic = totals.as_dict().unwrap().get("f").unwrap().get("x").unwrap()[[0, 0]];

    assert_relative_eq!(analytic, fd, max_relative = 1e-6);
}

#[cfg(feature = "serde")]
#[test]
fn config_and_metadata_load_from_json() {
    use mdao_core::Indices;

    let supports: Supports =
        serde_json::from_str(r#"{ "gradients": true, "equality_constraints": true }"#).unwrap();
    assert!(supports.gradients);
    assert!(supports.equality_constraints);
    assert!(!supports.active_set);

    let meta: VariableMeta =
        serde_json::from_str(r#"{ "scaler": 2.0, "indices": { "subset": [0, 2] } }"#).unwrap();
    assert_eq!(meta.scaler, Some(2.0));
    assert_eq!(meta.adder, None);
    assert_eq!(meta.indices, Indices::Subset(vec![0, 2]));

    let format: TotalsFormat = serde_json::from_str(r#""array""#).unwrap();
    assert_eq!(format, TotalsFormat::Array);
}
