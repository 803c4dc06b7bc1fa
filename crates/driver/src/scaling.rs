use ndarray::{Array1, ArrayView1, ArrayViewMut1};

use mdao_core::VariableMeta;

/// The affine transform between model units and optimizer units.
///
/// Extraction computes `(raw + adder) * scaler`; injection undoes it with
/// `raw = scaled * (1 / scaler) - adder`. Each step is skipped when its
/// parameter is absent. A zero scaler is not rejected and yields IEEE
/// infinities on injection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scaling {
    pub adder: Option<f64>,
    pub scaler: Option<f64>,
}

impl Scaling {
    #[must_use]
    pub fn new(adder: Option<f64>, scaler: Option<f64>) -> Self {
        Self { adder, scaler }
    }

    /// Converts a single model value to optimizer units.
    #[must_use]
    pub fn extract_value(&self, raw: f64) -> f64 {
        let mut value = raw;
        if let Some(adder) = self.adder {
            value += adder;
        }
        if let Some(scaler) = self.scaler {
            value *= scaler;
        }
        value
    }

    /// Converts a single optimizer value back to model units.
    #[must_use]
    pub fn inject_value(&self, scaled: f64) -> f64 {
        let mut value = scaled;
        if let Some(scaler) = self.scaler {
            value *= 1.0 / scaler;
        }
        if let Some(adder) = self.adder {
            value -= adder;
        }
        value
    }

    /// Returns a scaled copy of `raw`.
    #[must_use]
    pub fn extract(&self, raw: ArrayView1<'_, f64>) -> Array1<f64> {
        raw.mapv(|v| self.extract_value(v))
    }

    /// Converts `values` from optimizer units to model units in place.
    pub fn inject_in_place(&self, mut values: ArrayViewMut1<'_, f64>) {
        values.mapv_inplace(|v| self.inject_value(v));
    }
}

impl From<&VariableMeta> for Scaling {
    fn from(meta: &VariableMeta) -> Self {
        Self::new(meta.adder, meta.scaler)
    }
}
