use thiserror::Error;

use mdao_core::Registry;

/// The problem features a driver can handle.
///
/// Every capability defaults to `false`; drivers opt in to what their
/// optimizer supports. The flags are declarations: nothing is rejected
/// unless [`Supports::check`] is called, usually through
/// `Driver::check_supports`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Supports {
    pub inequality_constraints: bool,
    pub equality_constraints: bool,
    pub linear_constraints: bool,
    pub two_sided_constraints: bool,
    pub multiple_objectives: bool,
    pub integer_design_vars: bool,
    pub gradients: bool,
    pub active_set: bool,
}

/// A problem feature the driver does not support.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupportError {
    #[error("equality constraint `{0}` is not supported by this driver")]
    EqualityConstraint(String),

    #[error("inequality constraint `{0}` is not supported by this driver")]
    InequalityConstraint(String),

    #[error("linear constraint `{0}` is not supported by this driver")]
    LinearConstraint(String),

    #[error("two-sided constraint `{0}` is not supported by this driver")]
    TwoSidedConstraint(String),

    #[error("{0} objectives given, but this driver supports only one")]
    MultipleObjectives(usize),
}

impl Supports {
    /// Returns a config with every capability enabled.
    #[must_use]
    pub fn all() -> Self {
        Self {
            inequality_constraints: true,
            equality_constraints: true,
            linear_constraints: true,
            two_sided_constraints: true,
            multiple_objectives: true,
            integer_design_vars: true,
            gradients: true,
            active_set: true,
        }
    }

    #[must_use]
    pub fn with_inequality_constraints(self, yes: bool) -> Self {
        Self {
            inequality_constraints: yes,
            ..self
        }
    }

    #[must_use]
    pub fn with_equality_constraints(self, yes: bool) -> Self {
        Self {
            equality_constraints: yes,
            ..self
        }
    }

    #[must_use]
    pub fn with_linear_constraints(self, yes: bool) -> Self {
        Self {
            linear_constraints: yes,
            ..self
        }
    }

    #[must_use]
    pub fn with_two_sided_constraints(self, yes: bool) -> Self {
        Self {
            two_sided_constraints: yes,
            ..self
        }
    }

    #[must_use]
    pub fn with_multiple_objectives(self, yes: bool) -> Self {
        Self {
            multiple_objectives: yes,
            ..self
        }
    }

    #[must_use]
    pub fn with_integer_design_vars(self, yes: bool) -> Self {
        Self {
            integer_design_vars: yes,
            ..self
        }
    }

    #[must_use]
    pub fn with_gradients(self, yes: bool) -> Self {
        Self {
            gradients: yes,
            ..self
        }
    }

    #[must_use]
    pub fn with_active_set(self, yes: bool) -> Self {
        Self {
            active_set: yes,
            ..self
        }
    }

    /// Checks that the objectives and constraints only need declared
    /// capabilities.
    ///
    /// # Errors
    ///
    /// Returns the first unsupported feature found, checking objectives
    /// before constraints and constraints in registry order.
    pub fn check(&self, objectives: &Registry, constraints: &Registry) -> Result<(), SupportError> {
        if objectives.len() > 1 && !self.multiple_objectives {
            return Err(SupportError::MultipleObjectives(objectives.len()));
        }

        for (name, meta) in constraints.iter() {
            if meta.is_equality() {
                if !self.equality_constraints {
                    return Err(SupportError::EqualityConstraint(name.to_string()));
                }
            } else if !self.inequality_constraints {
                return Err(SupportError::InequalityConstraint(name.to_string()));
            }

            if meta.linear && !self.linear_constraints {
                return Err(SupportError::LinearConstraint(name.to_string()));
            }
            if meta.is_two_sided() && !self.two_sided_constraints {
                return Err(SupportError::TwoSidedConstraint(name.to_string()));
            }
        }

        Ok(())
    }
}
