//! Driver-side scaling and total-derivative assembly.
//!
//! An optimizer works in scaled units; a model stores raw values in one
//! flat state buffer. This crate sits between the two:
//!
//! - [`extract_category`] / [`extract_constraints`] read variables out of the
//!   state and convert them to optimizer units
//! - [`set_design_var`] writes an optimizer value back in model units
//! - [`Totals`] scales raw total-derivative blocks and, on request, lays them
//!   out in one dense Jacobian
//! - [`Driver`] ties these together around the metadata a model registers
//!
//! Every transform uses `scaled = (raw + adder) * scaler`; see [`Scaling`].

mod driver;
mod error;
mod extract;
mod filter;
mod inject;
mod scaling;
mod supports;
mod totals;

pub use driver::{Driver, Status};
pub use error::Error;
pub use extract::{extract_category, extract_constraints};
pub use filter::{ConstraintFilter, ConstraintType, Linearity};
pub use inject::set_design_var;
pub use scaling::Scaling;
pub use supports::{SupportError, Supports};
pub use totals::{JacobianLayout, Totals, TotalsFormat, assemble, scale_partials};
