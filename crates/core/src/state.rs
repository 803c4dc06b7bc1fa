use std::ops::Range;

use ndarray::{ArrayView1, ArrayViewMut1};
use thiserror::Error;

use crate::NameMap;

/// Errors that can occur when addressing model state by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("no variable named `{0}` in the model state")]
    UnknownVariable(String),

    #[error("variable `{0}` is already present in the model state")]
    DuplicateVariable(String),

    #[error("index {index} is out of range for `{name}` (length {len})")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("`{name}` expects {expected} values, got {actual}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Named access to a model's flat state buffer.
///
/// Each variable occupies a contiguous run of the buffer, exposed as a 1-D
/// view. Implementations decide where the buffer lives; callers only see
/// views and never hold on to them across calls.
pub trait StateStore {
    /// Returns a read-only view of the named variable.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownVariable`] if `name` is not in the state.
    fn get(&self, name: &str) -> Result<ArrayView1<'_, f64>, StateError>;

    /// Returns a mutable view of the named variable.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownVariable`] if `name` is not in the state.
    fn get_mut(&mut self, name: &str) -> Result<ArrayViewMut1<'_, f64>, StateError>;
}

/// A contiguous `f64` buffer with named ranges.
///
/// # Example
///
/// ```
/// use mdao_core::{FlatState, StateStore};
///
/// let mut state = FlatState::new();
/// state.add("x", [1.0, 2.0]).unwrap();
/// state.add("y", [3.0]).unwrap();
///
/// assert_eq!(state.as_slice(), &[1.0, 2.0, 3.0]);
/// assert_eq!(state.get("y").unwrap()[0], 3.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatState {
    buffer: Vec<f64>,
    ranges: NameMap<Range<usize>>,
}

impl FlatState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variable to the end of the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicateVariable`] if `name` is already present.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = f64>,
    ) -> Result<(), StateError> {
        let name = name.into();
        if self.ranges.contains(&name) {
            return Err(StateError::DuplicateVariable(name));
        }

        let start = self.buffer.len();
        self.buffer.extend(values);
        self.ranges.insert(name, start..self.buffer.len());
        Ok(())
    }

    /// Returns the whole buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.buffer
    }

    /// Returns the buffer range occupied by `name`.
    #[must_use]
    pub fn range(&self, name: &str) -> Option<Range<usize>> {
        self.ranges.get(name).cloned()
    }

    /// Iterates over variable names in buffer order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ranges.names()
    }
}

impl StateStore for FlatState {
    fn get(&self, name: &str) -> Result<ArrayView1<'_, f64>, StateError> {
        let range = self
            .ranges
            .get(name)
            .ok_or_else(|| StateError::UnknownVariable(name.to_string()))?;
        Ok(ArrayView1::from(&self.buffer[range.clone()]))
    }

    fn get_mut(&mut self, name: &str) -> Result<ArrayViewMut1<'_, f64>, StateError> {
        let range = self
            .ranges
            .get(name)
            .cloned()
            .ok_or_else(|| StateError::UnknownVariable(name.to_string()))?;
        Ok(ArrayViewMut1::from(&mut self.buffer[range]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatState {
        let mut state = FlatState::new();
        state.add("a", [1.0, 2.0, 3.0]).unwrap();
        state.add("b", [4.0]).unwrap();
        state
    }

    #[test]
    fn views_address_contiguous_ranges() {
        let state = sample();

        assert_eq!(state.range("a"), Some(0..3));
        assert_eq!(state.range("b"), Some(3..4));
        assert_eq!(state.get("a").unwrap().to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn mutable_view_writes_through() {
        let mut state = sample();

        state.get_mut("b").unwrap()[0] = 9.0;
        state.get_mut("a").unwrap()[1] = -2.0;

        assert_eq!(state.as_slice(), &[1.0, -2.0, 3.0, 9.0]);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let mut state = sample();

        assert_eq!(
            state.get("c").unwrap_err(),
            StateError::UnknownVariable("c".into())
        );
        assert!(state.get_mut("c").is_err());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut state = sample();

        let err = state.add("a", [0.0]).unwrap_err();
        assert_eq!(err, StateError::DuplicateVariable("a".into()));
        assert_eq!(state.as_slice().len(), 4);
    }
}
