//! Scaling and assembly of total derivatives.
//!
//! A totals engine hands back raw blocks keyed by response and design
//! variable, in model units. The optimizer works in scaled units, so each
//! block `d(response)/d(design var)` is multiplied by the response's scaler
//! and by the reciprocal of the design variable's scaler. Adders cancel out
//! of derivatives and are ignored.
//!
//! The scaled blocks are returned either as the same nested mapping
//! ([`TotalsFormat::Dict`]) or laid out in one dense Jacobian
//! ([`TotalsFormat::Array`]) whose row and column ranges are described by a
//! [`JacobianLayout`].

use std::{ops::Range, str::FromStr};

use ndarray::{Array2, s};
use tracing::debug;

use mdao_core::{NameMap, Partials, Registry};

use crate::Error;

/// The shape in which total derivatives are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TotalsFormat {
    /// Nested mapping of scaled blocks, keyed like the raw partials.
    #[default]
    Dict,

    /// One dense matrix with a row range per response and a column range
    /// per design variable.
    Array,
}

impl FromStr for TotalsFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dict" => Ok(Self::Dict),
            "array" => Ok(Self::Array),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Scaled total derivatives in the requested format.
#[derive(Debug, Clone, PartialEq)]
pub enum Totals {
    Dict(Partials),
    Array {
        jacobian: Array2<f64>,
        layout: JacobianLayout,
    },
}

impl Totals {
    /// Scales `raw` and packages it as `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if a key has no metadata, or if the blocks cannot be
    /// laid out in a dense matrix.
    pub fn build(
        format: TotalsFormat,
        raw: Partials,
        design_vars: &Registry,
        responses: &Registry,
    ) -> Result<Self, Error> {
        let scaled = scale_partials(raw, design_vars, responses)?;
        match format {
            TotalsFormat::Dict => Ok(Totals::Dict(scaled)),
            TotalsFormat::Array => {
                let (jacobian, layout) = assemble(&scaled)?;
                Ok(Totals::Array { jacobian, layout })
            }
        }
    }

    /// Returns the nested mapping, if this is [`Totals::Dict`].
    #[must_use]
    pub fn as_dict(&self) -> Option<&Partials> {
        match self {
            Totals::Dict(partials) => Some(partials),
            Totals::Array { .. } => None,
        }
    }

    /// Returns the dense Jacobian and its layout, if this is [`Totals::Array`].
    #[must_use]
    pub fn as_array(&self) -> Option<(&Array2<f64>, &JacobianLayout)> {
        match self {
            Totals::Dict(_) => None,
            Totals::Array { jacobian, layout } => Some((jacobian, layout)),
        }
    }
}

/// Applies driver scaling to every block of `partials`.
///
/// Each block is multiplied by its response's scaler, then by the
/// reciprocal of its design variable's scaler. Missing scalers are skipped.
///
/// # Errors
///
/// Returns [`Error::UnknownResponse`] or [`Error::UnknownDesignVar`] if a key
/// is not registered.
pub fn scale_partials(
    mut partials: Partials,
    design_vars: &Registry,
    responses: &Registry,
) -> Result<Partials, Error> {
    for (response, row) in partials.iter_mut() {
        let oscaler = responses
            .get(response)
            .ok_or_else(|| Error::UnknownResponse(response.to_string()))?
            .scaler;

        for (design_var, block) in row.iter_mut() {
            let iscaler = design_vars
                .get(design_var)
                .ok_or_else(|| Error::UnknownDesignVar(design_var.to_string()))?
                .scaler;

            if let Some(scaler) = oscaler {
                *block *= scaler;
            }
            if let Some(scaler) = iscaler {
                *block *= 1.0 / scaler;
            }
        }
    }
    Ok(partials)
}

/// Row and column ranges of each variable in a dense Jacobian.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JacobianLayout {
    rows: NameMap<Range<usize>>,
    cols: NameMap<Range<usize>>,
}

impl JacobianLayout {
    /// Computes the layout of `partials` in a single pass, before any copy.
    ///
    /// Rows follow first-seen response order, each as tall as that response's
    /// blocks. Columns follow the first response's design-variable order, each
    /// as wide as its block. Every later response must carry exactly the same
    /// design variables (in any order) with matching widths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnMismatch`], [`Error::RowMismatch`], or
    /// [`Error::WidthMismatch`] if the blocks do not tile a rectangle.
    pub fn from_partials(partials: &Partials) -> Result<Self, Error> {
        let mut layout = Self::default();

        let Some((_, first)) = partials.iter().next() else {
            return Ok(layout);
        };

        let mut ncols = 0;
        for (design_var, block) in first.iter() {
            let width = block.ncols();
            layout.cols.insert(design_var, ncols..ncols + width);
            ncols += width;
        }

        let mut nrows = 0;
        for (response, row) in partials.iter() {
            layout.check_columns(response, row)?;

            let height = row_height(response, row)?;
            layout.rows.insert(response, nrows..nrows + height);
            nrows += height;
        }

        Ok(layout)
    }

    /// Returns `(rows, columns)` of the dense Jacobian.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        let end = |ranges: &NameMap<Range<usize>>| ranges.values().last().map_or(0, |r| r.end);
        (end(&self.rows), end(&self.cols))
    }

    /// Returns the row range of `response`.
    #[must_use]
    pub fn rows(&self, response: &str) -> Option<Range<usize>> {
        self.rows.get(response).cloned()
    }

    /// Returns the column range of `design_var`.
    #[must_use]
    pub fn cols(&self, design_var: &str) -> Option<Range<usize>> {
        self.cols.get(design_var).cloned()
    }

    /// Iterates over responses in row order.
    pub fn responses(&self) -> impl Iterator<Item = &str> {
        self.rows.names()
    }

    /// Iterates over design variables in column order.
    pub fn design_vars(&self) -> impl Iterator<Item = &str> {
        self.cols.names()
    }

    fn check_columns(&self, response: &str, row: &NameMap<Array2<f64>>) -> Result<(), Error> {
        let same_keys = row.len() == self.cols.len() && row.names().all(|k| self.cols.contains(k));
        if !same_keys {
            return Err(Error::ColumnMismatch {
                response: response.to_string(),
                expected: self.cols.names().map(String::from).collect(),
                found: row.names().map(String::from).collect(),
            });
        }

        for (design_var, block) in row.iter() {
            let expected = self.cols.get(design_var).map_or(0, |r| r.len());
            if block.ncols() != expected {
                return Err(Error::WidthMismatch {
                    response: response.to_string(),
                    design_var: design_var.to_string(),
                    expected,
                    found: block.ncols(),
                });
            }
        }
        Ok(())
    }
}

/// Returns the shared row count of a response's blocks.
fn row_height(response: &str, row: &NameMap<Array2<f64>>) -> Result<usize, Error> {
    let mut blocks = row.iter();
    let Some((_, first)) = blocks.next() else {
        return Ok(0);
    };

    let expected = first.nrows();
    match blocks.find(|(_, block)| block.nrows() != expected) {
        Some((design_var, block)) => Err(Error::RowMismatch {
            response: response.to_string(),
            design_var: design_var.to_string(),
            expected,
            found: block.nrows(),
        }),
        None => Ok(expected),
    }
}

/// Lays scaled blocks out in one dense, zero-initialized Jacobian.
///
/// # Errors
///
/// Returns an error if the blocks do not tile a rectangle; see
/// [`JacobianLayout::from_partials`].
pub fn assemble(partials: &Partials) -> Result<(Array2<f64>, JacobianLayout), Error> {
    let layout = JacobianLayout::from_partials(partials)?;
    let mut jacobian = Array2::zeros(layout.shape());

    for (response, row) in partials.iter() {
        let Some(rows) = layout.rows(response) else {
            continue;
        };
        for (design_var, block) in row.iter() {
            let Some(cols) = layout.cols(design_var) else {
                continue;
            };
            jacobian.slice_mut(s![rows.clone(), cols]).assign(block);
        }
    }

    debug!(
        rows = jacobian.nrows(),
        cols = jacobian.ncols(),
        "assembled total derivative jacobian"
    );
    Ok((jacobian, layout))
}
