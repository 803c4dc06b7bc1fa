use crate::{NameMap, StateError};

/// Metadata for every variable of one category, in registration order.
pub type Registry = NameMap<VariableMeta>;

/// Selects which flat positions of a variable are in play.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Indices {
    /// Every position of the variable.
    #[default]
    All,

    /// The listed flat positions, in order.
    Subset(Vec<usize>),
}

impl Indices {
    /// Ensures the selection fits variable `name` of length `len`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::IndexOutOfRange`] for the first subset position
    /// at or past `len`.
    pub fn check(&self, name: &str, len: usize) -> Result<(), StateError> {
        let Indices::Subset(idx) = self else {
            return Ok(());
        };
        match idx.iter().find(|&&i| i >= len) {
            Some(&index) => Err(StateError::IndexOutOfRange {
                name: name.to_string(),
                index,
                len,
            }),
            None => Ok(()),
        }
    }

    /// Returns the number of selected positions for a variable of length `len`.
    #[must_use]
    pub fn count(&self, len: usize) -> usize {
        match self {
            Indices::All => len,
            Indices::Subset(idx) => idx.len(),
        }
    }
}

impl From<Vec<usize>> for Indices {
    fn from(idx: Vec<usize>) -> Self {
        Indices::Subset(idx)
    }
}

/// Driver metadata for a design variable, objective, or constraint.
///
/// Values move between model units and optimizer units through an affine
/// transform: `scaled = (raw + adder) * scaler`, and back through
/// `raw = scaled / scaler - adder`. A missing `adder` or `scaler` skips
/// that step.
///
/// Metadata is registered once by the model and is read-only afterward.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VariableMeta {
    pub scaler: Option<f64>,
    pub adder: Option<f64>,
    pub indices: Indices,
    pub linear: bool,
    pub equals: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl VariableMeta {
    /// Creates metadata with no scaling, no bounds, and all indices selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_scaler(self, scaler: f64) -> Self {
        Self {
            scaler: Some(scaler),
            ..self
        }
    }

    #[must_use]
    pub fn with_adder(self, adder: f64) -> Self {
        Self {
            adder: Some(adder),
            ..self
        }
    }

    #[must_use]
    pub fn with_indices(self, indices: impl Into<Indices>) -> Self {
        Self {
            indices: indices.into(),
            ..self
        }
    }

    /// Marks the variable as a linear constraint.
    #[must_use]
    pub fn linear(self) -> Self {
        Self {
            linear: true,
            ..self
        }
    }

    /// Marks the variable as an equality constraint with the given target.
    #[must_use]
    pub fn equals(self, target: f64) -> Self {
        Self {
            equals: Some(target),
            ..self
        }
    }

    /// Sets the lower and upper bounds; either may be absent.
    #[must_use]
    pub fn bounds(self, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self {
            lower,
            upper,
            ..self
        }
    }

    #[must_use]
    pub fn is_equality(&self) -> bool {
        self.equals.is_some()
    }

    /// Returns `true` if both bounds are set.
    #[must_use]
    pub fn is_two_sided(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }
}
