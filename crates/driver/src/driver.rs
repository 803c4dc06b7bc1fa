
use ndarray::{Array1, ArrayView1};
use tracing::{debug, info, warn};

use mdao_core::{Model, NameMap, ProblemMeta, Registry, StateStore, TotalsEngine};

use crate::{
    ConstraintFilter, Error, Supports, Totals, TotalsFormat, extract_category, extract_constraints,
    set_design_var,
};

/// The outcome of a model run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The nonlinear solve completed.
    Converged,

    /// The nonlinear solve returned an error.
    Failed,
}

/// Variable metadata gathered from the problem at setup.
#[derive(Debug, Clone)]
struct Metadata {
    design_vars: Registry,
    responses: Registry,
    objectives: Registry,
    constraints: Registry,
}

/// Mediates between an optimizer and a model's flat state.
///
/// A driver reads design variables, objectives, and constraints out of the
/// model state in optimizer units, writes proposed design variables back in
/// model units, and scales total derivatives the same way.
///
/// The model state is never owned by the driver: every operation borrows it
/// explicitly, so exclusive access during injection is enforced by the
/// borrow checker rather than by convention.
///
/// # Example
///
/// ```
/// use mdao_core::{FlatState, ProblemMeta, Registry, StateStore, VariableMeta};
/// use mdao_driver::{Driver, Supports};
/// use ndarray::array;
///
/// struct Problem;
///
/// impl ProblemMeta for Problem {
///     fn design_vars(&self) -> Registry {
///         [("x", VariableMeta::new().with_scaler(0.5).with_adder(-1.0))]
///             .into_iter()
///             .collect()
///     }
///     fn objectives(&self) -> Registry {
///         Registry::new()
///     }
///     fn constraints(&self) -> Registry {
///         Registry::new()
///     }
/// }
///
/// let mut state = FlatState::new();
/// state.add("x", [3.0]).unwrap();
///
/// let mut driver = Driver::new(Supports::default());
/// driver.setup(&Problem);
///
/// let values = driver.design_var_values(&state).unwrap();
/// assert_eq!(values.get("x").unwrap(), &array![1.0]);
///
/// driver.set_design_var(&mut state, "x", array![1.0].view()).unwrap();
/// assert_eq!(state.get("x").unwrap()[0], 3.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Driver {
    supports: Supports,
    meta: Option<Metadata>,
    fail: bool,
}

impl Driver {
    /// Creates a driver that declares the given capabilities.
    #[must_use]
    pub fn new(supports: Supports) -> Self {
        Self {
            supports,
            meta: None,
            fail: false,
        }
    }

    /// Returns the capabilities this driver declares.
    #[must_use]
    pub fn supports(&self) -> &Supports {
        &self.supports
    }

    /// Gathers variable metadata from `problem`.
    ///
    /// The declared capabilities are not consulted here; call
    /// [`Driver::check_supports`] to reject problems this driver cannot
    /// handle. Calling `setup` again replaces the previously gathered metadata.
    pub fn setup<P>(&mut self, problem: &P)
    where
        P: ProblemMeta + ?Sized,
    {
        let meta = Metadata {
            design_vars: problem.design_vars(),
            responses: problem.responses(),
            objectives: problem.objectives(),
            constraints: problem.constraints(),
        };

        info!(
            design_vars = meta.design_vars.len(),
            objectives = meta.objectives.len(),
            constraints = meta.constraints.len(),
            "driver set up"
        );
        self.meta = Some(meta);
    }

    /// Checks the gathered objectives and constraints against the declared
    /// capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSetUp`] before setup, or [`Error::Unsupported`]
    /// naming the first feature the driver does not declare.
    pub fn check_supports(&self) -> Result<(), Error> {
        let meta = self.meta()?;
        self.supports.check(&meta.objectives, &meta.constraints)?;
        Ok(())
    }

    /// Returns `true` once [`Driver::setup`] has been called.
    #[must_use]
    pub fn is_set_up(&self) -> bool {
        self.meta.is_some()
    }

    /// Returns `true` if the most recent [`Driver::run`] failed.
    #[must_use]
    pub fn fail(&self) -> bool {
        self.fail
    }

    /// # Errors
    ///
    /// Returns [`Error::NotSetUp`] before setup.
    pub fn design_vars(&self) -> Result<&Registry, Error> {
        Ok(&self.meta()?.design_vars)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotSetUp`] before setup.
    pub fn objectives(&self) -> Result<&Registry, Error> {
        Ok(&self.meta()?.objectives)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotSetUp`] before setup.
    pub fn constraints(&self) -> Result<&Registry, Error> {
        Ok(&self.meta()?.constraints)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotSetUp`] before setup.
    pub fn responses(&self) -> Result<&Registry, Error> {
        Ok(&self.meta()?.responses)
    }

    /// Returns the scaled value of every design variable.
    ///
    /// # Errors
    ///
    /// Returns an error before setup, or if a design variable cannot be read
    /// from `state`.
    pub fn design_var_values<S>(&self, state: &S) -> Result<NameMap<Array1<f64>>, Error>
    where
        S: StateStore + ?Sized,
    {
        extract_category(&self.meta()?.design_vars, state)
    }

    /// Writes an optimizer value for one design variable into `state`.
    ///
    /// # Errors
    ///
    /// Returns an error before setup, if `name` is not a design variable, or
    /// if the value cannot be written.
    pub fn set_design_var<S>(
        &self,
        state: &mut S,
        name: &str,
        value: ArrayView1<'_, f64>,
    ) -> Result<(), Error>
    where
        S: StateStore + ?Sized,
    {
        set_design_var(&self.meta()?.design_vars, state, name, value)
    }

    /// Returns the scaled value of every objective.
    ///
    /// # Errors
    ///
    /// Returns an error before setup, or if an objective cannot be read.
    pub fn objective_values<S>(&self, state: &S) -> Result<NameMap<Array1<f64>>, Error>
    where
        S: StateStore + ?Sized,
    {
        extract_category(&self.meta()?.objectives, state)
    }

    /// Returns the scaled value of every constraint that passes `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error before setup, or if a selected constraint cannot be
    /// read.
    pub fn constraint_values<S>(
        &self,
        state: &S,
        filter: ConstraintFilter,
    ) -> Result<NameMap<Array1<f64>>, Error>
    where
        S: StateStore + ?Sized,
    {
        extract_constraints(&self.meta()?.constraints, state, filter)
    }

    /// Returns the scaled value of every response.
    ///
    /// # Errors
    ///
    /// Returns an error before setup, or if a response cannot be read.
    pub fn response_values<S>(&self, state: &S) -> Result<NameMap<Array1<f64>>, Error>
    where
        S: StateStore + ?Sized,
    {
        extract_category(&self.meta()?.responses, state)
    }

    /// Runs the model once at its current state.
    ///
    /// A failed solve is reported through the returned [`Status`] and
    /// [`Driver::fail`], not as an error.
    pub fn run<M>(&mut self, model: &mut M) -> Status
    where
        M: Model + ?Sized,
    {
        match model.solve_nonlinear() {
            Ok(()) => {
                self.fail = false;
                info!("model run converged");
                Status::Converged
            }
            Err(error) => {
                self.fail = true;
                warn!(%error, "model run failed");
                Status::Failed
            }
        }
    }

    /// Computes scaled total derivatives of `of` with respect to `wrt`.
    ///
    /// `of` defaults to every response and `wrt` to every design variable.
    /// Only the blocks the engine returns are scaled and assembled; missing
    /// pairs are not filled in.
    ///
    /// # Errors
    ///
    /// Returns an error before setup, if the engine fails, if a returned key
    /// has no metadata, or if an [`TotalsFormat::Array`] layout is
    /// inconsistent.
    pub fn compute_totals<E>(
        &self,
        engine: &mut E,
        of: Option<&[String]>,
        wrt: Option<&[String]>,
        format: TotalsFormat,
        global_names: bool,
    ) -> Result<Totals, Error>
    where
        E: TotalsEngine + ?Sized,
    {
        let meta = self.meta()?;

        let of = of.map_or_else(|| names(&meta.responses), <[String]>::to_vec);
        let wrt = wrt.map_or_else(|| names(&meta.design_vars), <[String]>::to_vec);

        let raw = engine
            .compute_raw_totals(&of, &wrt, global_names)
            .map_err(|e| Error::Totals(Box::new(e)))?;
        debug!(of = of.len(), wrt = wrt.len(), ?format, "computing scaled totals");

        Totals::build(format, raw, &meta.design_vars, &meta.responses)
    }

    fn meta(&self) -> Result<&Metadata, Error> {
        self.meta.as_ref().ok_or(Error::NotSetUp)
    }
}

fn names(registry: &Registry) -> Vec<String> {
    registry.names().map(String::from).collect()
}
