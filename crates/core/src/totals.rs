use ndarray::Array2;

use crate::NameMap;

/// Raw total-derivative blocks keyed by response, then by design variable.
///
/// Each block has one row per response entry and one column per design
/// variable entry. Pairs with no block are treated as all-zero.
pub type Partials = NameMap<NameMap<Array2<f64>>>;

/// Produces unscaled total derivatives for a set of responses and design
/// variables.
pub trait TotalsEngine {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Computes the raw partial blocks of each `of` name with respect to
    /// each `wrt` name.
    ///
    /// `global_names` is `true` when the names are already fully qualified
    /// and need no translation.
    ///
    /// # Errors
    ///
    /// Returns an error if the derivatives cannot be computed.
    fn compute_raw_totals(
        &mut self,
        of: &[String],
        wrt: &[String],
        global_names: bool,
    ) -> Result<Partials, Self::Error>;
}
