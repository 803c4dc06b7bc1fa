use mdao_core::StateError;

use crate::SupportError;

/// Errors that can occur while driving a model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{0}` is not a registered design variable")]
    UnknownDesignVar(String),

    #[error("`{0}` is not a registered response")]
    UnknownResponse(String),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("unsupported derivative format `{0}`, expected `dict` or `array`")]
    UnsupportedFormat(String),

    #[error("invalid constraint filter `{0}`")]
    InvalidFilter(String),

    /// A response's design-variable keys differ from the first response's.
    #[error("response `{response}` has design variables {found:?}, expected {expected:?}")]
    ColumnMismatch {
        response: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Blocks of one response disagree on the number of rows.
    #[error("block `{response}`/`{design_var}` has {found} rows, expected {expected}")]
    RowMismatch {
        response: String,
        design_var: String,
        expected: usize,
        found: usize,
    },

    /// Blocks of one design variable disagree on the number of columns.
    #[error("block `{response}`/`{design_var}` has {found} columns, expected {expected}")]
    WidthMismatch {
        response: String,
        design_var: String,
        expected: usize,
        found: usize,
    },

    #[error("driver has not been set up")]
    NotSetUp,

    #[error("unsupported problem: {0}")]
    Unsupported(#[from] SupportError),

    #[error("totals engine error: {0}")]
    Totals(Box<dyn std::error::Error + Send + Sync>),
}
