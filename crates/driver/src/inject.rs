use ndarray::ArrayView1;
use tracing::debug;

use mdao_core::{Indices, Registry, StateError, StateStore};

use crate::{Error, Scaling};

/// Writes an optimizer value for design variable `name` into the model state.
///
/// `value` lands on the selected positions of the live variable first, and
/// those positions are then converted back to model units in place
/// (multiply by `1 / scaler`, then subtract `adder`). A length-1 `value` is
/// broadcast over every selected position. When an index repeats, the last
/// write wins and the position is rescaled once.
///
/// # Errors
///
/// Returns [`Error::UnknownDesignVar`] if `name` is not in `registry`, or a
/// state error if the variable is missing from the state, an index is out of
/// range, or `value` has the wrong length.
pub fn set_design_var<S>(
    registry: &Registry,
    state: &mut S,
    name: &str,
    value: ArrayView1<'_, f64>,
) -> Result<(), Error>
where
    S: StateStore + ?Sized,
{
    let meta = registry
        .get(name)
        .ok_or_else(|| Error::UnknownDesignVar(name.to_string()))?;
    let scaling = Scaling::from(meta);
    let mut dest = state.get_mut(name)?;

    meta.indices.check(name, dest.len())?;
    let expected = meta.indices.count(dest.len());
    if value.len() != expected && value.len() != 1 {
        return Err(StateError::LengthMismatch {
            name: name.to_string(),
            expected,
            actual: value.len(),
        }
        .into());
    }

    match &meta.indices {
        Indices::All => {
            dest.assign(&value);
            scaling.inject_in_place(dest.view_mut());
        }
        Indices::Subset(idx) => {
            for (k, &pos) in idx.iter().enumerate() {
                dest[pos] = if value.len() == 1 { value[0] } else { value[k] };
            }

            let mut unique = idx.clone();
            unique.sort_unstable();
            unique.dedup();
            for pos in unique {
                dest[pos] = scaling.inject_value(dest[pos]);
            }
        }
    }

    debug!(name, size = value.len(), "injected design variable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use mdao_core::{FlatState, VariableMeta};

    use super::*;
    use crate::extract_category;

    fn state() -> FlatState {
        let mut state = FlatState::new();
        state.add("x", [3.0]).unwrap();
        state.add("y", [1.0, 2.0, 3.0, 4.0]).unwrap();
        state
    }

    #[test]
    fn inverse_scaling_restores_raw_value() {
        let registry: Registry = [("x", VariableMeta::new().with_adder(2.0).with_scaler(3.0))]
            .into_iter()
            .collect();
        let mut state = state();

        set_design_var(&registry, &mut state, "x", array![9.0].view()).unwrap();

        assert_relative_eq!(state.get("x").unwrap()[0], 1.0);
    }

    #[test]
    fn subset_write_leaves_other_positions() {
        let registry: Registry = [(
            "y",
            VariableMeta::new()
                .with_indices(vec![1, 3])
                .with_scaler(2.0),
        )]
        .into_iter()
        .collect();
        let mut state = state();

        set_design_var(&registry, &mut state, "y", array![10.0, 20.0].view()).unwrap();

        assert_eq!(state.get("y").unwrap().to_vec(), vec![1.0, 5.0, 3.0, 10.0]);
    }

    #[test]
    fn scalar_value_broadcasts() {
        let registry: Registry = [("y", VariableMeta::new().with_adder(1.0))]
            .into_iter()
            .collect();
        let mut state = state();

        set_design_var(&registry, &mut state, "y", array![5.0].view()).unwrap();

        assert_eq!(state.get("y").unwrap().to_vec(), vec![4.0; 4]);
    }

    #[test]
    fn repeated_index_is_rescaled_once() {
        let registry: Registry = [(
            "y",
            VariableMeta::new().with_indices(vec![2, 2]).with_scaler(4.0),
        )]
        .into_iter()
        .collect();
        let mut state = state();

        set_design_var(&registry, &mut state, "y", array![8.0, 12.0].view()).unwrap();

        assert_relative_eq!(state.get("y").unwrap()[2], 3.0);
    }

    #[test]
    fn round_trip_through_subset() {
        let registry: Registry = [(
            "y",
            VariableMeta::new()
                .with_indices(vec![0, 2])
                .with_adder(-0.7)
                .with_scaler(1.3),
        )]
        .into_iter()
        .collect();
        let mut state = state();
        let before = state.as_slice().to_vec();

        let values = extract_category(&registry, &state).unwrap();
        set_design_var(&registry, &mut state, "y", values.get("y").unwrap().view()).unwrap();

        for (after, orig) in state.as_slice().iter().zip(before.iter()) {
            assert_relative_eq!(*after, *orig, max_relative = 1e-12);
        }
    }

    #[test]
    fn unknown_design_var_is_an_error() {
        let registry = Registry::new();
        let mut state = state();

        let err = set_design_var(&registry, &mut state, "x", array![1.0].view()).unwrap_err();

        assert!(matches!(err, Error::UnknownDesignVar(ref name) if name == "x"));
        assert_eq!(state.get("x").unwrap()[0], 3.0);
    }

    #[test]
    fn out_of_range_index_leaves_state_untouched() {
        let registry: Registry = [("y", VariableMeta::new().with_indices(vec![0, 4]))]
            .into_iter()
            .collect();
        let mut state = state();

        let err =
            set_design_var(&registry, &mut state, "y", array![7.0, 7.0].view()).unwrap_err();

        assert!(matches!(
            err,
            Error::State(StateError::IndexOutOfRange { index: 4, len: 4, .. })
        ));
        assert_eq!(state.get("y").unwrap()[0], 1.0);
    }

    #[test]
    fn wrong_length_is_an_error() {
        let registry: Registry = [("y", VariableMeta::new())].into_iter().collect();
        let mut state = state();

        let err =
            set_design_var(&registry, &mut state, "y", array![1.0, 2.0].view()).unwrap_err();

        assert!(matches!(
            err,
            Error::State(StateError::LengthMismatch {
                expected: 4,
                actual: 2,
                ..
            })
        ));
    }
}
