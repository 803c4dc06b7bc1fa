use crate::{Registry, StateStore};

/// A model whose state a driver reads and writes between evaluations.
pub trait Model {
    type State: StateStore;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the model's flat state.
    fn state(&self) -> &Self::State;

    /// Returns the model's flat state for writing.
    fn state_mut(&mut self) -> &mut Self::State;

    /// Evaluates the model at its current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the nonlinear solve fails to converge or the
    /// evaluation cannot be completed.
    fn solve_nonlinear(&mut self) -> Result<(), Self::Error>;
}

/// Supplies the driver metadata registered on a model.
///
/// Each method returns variables in registration order. That order fixes
/// the iteration order of every value mapping the driver produces.
pub trait ProblemMeta {
    fn design_vars(&self) -> Registry;

    fn objectives(&self) -> Registry;

    fn constraints(&self) -> Registry;

    /// Returns every response: objectives first, then constraints.
    fn responses(&self) -> Registry {
        let mut responses = self.objectives();
        responses.extend(self.constraints());
        responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VariableMeta;

    struct Meta;

    impl ProblemMeta for Meta {
        fn design_vars(&self) -> Registry {
            [("x", VariableMeta::new())].into_iter().collect()
        }

        fn objectives(&self) -> Registry {
            [("f", VariableMeta::new().with_scaler(2.0))].into_iter().collect()
        }

        fn constraints(&self) -> Registry {
            [("g", VariableMeta::new()), ("h", VariableMeta::new().equals(1.0))]
                .into_iter()
                .collect()
        }
    }

    #[test]
    fn responses_list_objectives_before_constraints() {
        let responses = Meta.responses();

        let names: Vec<_> = responses.names().collect();
        assert_eq!(names, ["f", "g", "h"]);
        assert_eq!(responses.get("f").unwrap().scaler, Some(2.0));
    }
}
