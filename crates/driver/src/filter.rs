use std::str::FromStr;

use mdao_core::VariableMeta;

use crate::Error;

/// Selects constraints by whether they carry an equality target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConstraintType {
    #[default]
    All,
    Eq,
    Ineq,
}

/// Selects constraints by their linear flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Linearity {
    #[default]
    All,
    Linear,
    Nonlinear,
}

/// A pair of independent constraint filters.
///
/// A constraint is kept only if it passes both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintFilter {
    pub ctype: ConstraintType,
    pub lintype: Linearity,
}

impl ConstraintFilter {
    #[must_use]
    pub fn new(ctype: ConstraintType, lintype: Linearity) -> Self {
        Self { ctype, lintype }
    }

    /// Returns `true` if `meta` passes both filters.
    #[must_use]
    pub fn accepts(&self, meta: &VariableMeta) -> bool {
        let ctype_ok = match self.ctype {
            ConstraintType::All => true,
            ConstraintType::Eq => meta.is_equality(),
            ConstraintType::Ineq => !meta.is_equality(),
        };
        let lintype_ok = match self.lintype {
            Linearity::All => true,
            Linearity::Linear => meta.linear,
            Linearity::Nonlinear => !meta.linear,
        };
        ctype_ok && lintype_ok
    }
}

impl FromStr for ConstraintType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "eq" => Ok(Self::Eq),
            "ineq" => Ok(Self::Ineq),
            other => Err(Error::InvalidFilter(other.to_string())),
        }
    }
}

impl FromStr for Linearity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "linear" => Ok(Self::Linear),
            "nonlinear" => Ok(Self::Nonlinear),
            other => Err(Error::InvalidFilter(other.to_string())),
        }
    }
}
