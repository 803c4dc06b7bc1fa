use ndarray::{Array1, Axis};
use tracing::debug;

use mdao_core::{Indices, NameMap, Registry, StateError, StateStore, VariableMeta};

use crate::{ConstraintFilter, Error, Scaling};

/// Reads and scales every variable in `registry`.
///
/// Values are returned in registry order. Each value is a copy: mutating it
/// never touches the model state.
///
/// # Errors
///
/// Returns an error if a variable is missing from the state or one of its
/// indices is out of range.
pub fn extract_category<S>(registry: &Registry, state: &S) -> Result<NameMap<Array1<f64>>, Error>
where
    S: StateStore + ?Sized,
{
    extract_where(registry, state, |_| true)
}

/// Reads and scales the constraints in `registry` that pass `filter`.
///
/// Constraints rejected by the filter are left out of the result entirely.
///
/// # Errors
///
/// Returns an error if a selected constraint is missing from the state or
/// one of its indices is out of range.
pub fn extract_constraints<S>(
    registry: &Registry,
    state: &S,
    filter: ConstraintFilter,
) -> Result<NameMap<Array1<f64>>, Error>
where
    S: StateStore + ?Sized,
{
    extract_where(registry, state, |meta| filter.accepts(meta))
}

fn extract_where<S, F>(
    registry: &Registry,
    state: &S,
    keep: F,
) -> Result<NameMap<Array1<f64>>, Error>
where
    S: StateStore + ?Sized,
    F: Fn(&VariableMeta) -> bool,
{
    let mut values = NameMap::new();
    for (name, meta) in registry.iter().filter(|(_, meta)| keep(*meta)) {
        let value = extract_one(state, name, meta)?;
        debug!(name, size = value.len(), "extracted scaled value");
        values.insert(name, value);
    }
    Ok(values)
}

/// Reads one variable, selects its indices, and applies its scaling.
fn extract_one<S>(state: &S, name: &str, meta: &VariableMeta) -> Result<Array1<f64>, StateError>
where
    S: StateStore + ?Sized,
{
    let scaling = Scaling::from(meta);
    let raw = state.get(name)?;

    match &meta.indices {
        Indices::All => Ok(scaling.extract(raw)),
        Indices::Subset(idx) => {
            meta.indices.check(name, raw.len())?;
            Ok(raw
                .select(Axis(0), idx)
                .mapv_into(|v| scaling.extract_value(v)))
        }
    }
}
