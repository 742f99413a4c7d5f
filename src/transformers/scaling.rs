//! # Scaling
//!
//! Standardizes numeric columns as `(x - center) / spread`, where `center` is the column mean and
//! `spread` the population standard deviation of the training data. Statistics are gathered and
//! applied with Arrow compute kernels on the column arrays; missing cells stay null throughout.
//!
//! The [`ScaleArtifact`] is fit once and then replayed on every later dataset without recomputing
//! anything. It also carries the fitted [`CategoricalEncoding`], so a single artifact holds every
//! frozen per-column transform: numeric columns are scaled, categorical columns are encoded (codes
//! are not scaled).

use crate::dataset::{nan_filled, observed_values, ColumnKind, Dataset};
use crate::exceptions::{TabularPrepError, TabularPrepResult};
use crate::transformers::categorical_encoding::{CategoricalEncoding, UnseenCategoryPolicy};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array};
use arrow::compute::kernels::numeric::{div, mul, sub};
use arrow::compute::sum;
use arrow::datatypes::Float64Type;
use std::collections::HashMap;
use tracing::debug;

/// Center and spread of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnScale {
    column: String,
    center: f64,
    spread: f64,
}

impl ColumnScale {
    /// Computes mean and population standard deviation over the observed values of a numeric
    /// array. Nulls and `NaN` are ignored.
    ///
    /// A column without observed values gets `center = 0` and `spread = 1`; a (near) constant column
    /// gets `spread = 1`.
    pub fn fit(column: &str, values: &ArrayRef) -> TabularPrepResult<Self> {
        let observed = observed_values(values)?;
        let count = observed.len() - observed.null_count();
        let Some(total) = sum(&observed).filter(|_| count > 0) else {
            return Ok(Self::new(column, 0.0, 1.0));
        };
        let n = count as f64;
        let center = total / n;

        let deviations = sub(&observed, &Float64Array::new_scalar(center))?;
        let squared = mul(&deviations, &deviations)?;
        let variance = sum(squared.as_primitive::<Float64Type>()).unwrap_or(0.0) / n;
        let spread = variance.sqrt();
        let spread = if !spread.is_finite() || spread <= 10.0 * f64::EPSILON * center.abs().max(1.0)
        {
            1.0
        } else {
            spread
        };
        Ok(Self::new(column, center, spread))
    }

    pub fn new(column: &str, center: f64, spread: f64) -> Self {
        Self {
            column: column.to_string(),
            center,
            spread,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// `(x - center) / spread`; `NaN` stays `NaN`.
    pub fn apply(&self, x: f64) -> f64 {
        (x - self.center) / self.spread
    }

    /// Scales a whole numeric array. Missing cells come back as `NaN`.
    pub fn apply_array(&self, values: &ArrayRef) -> TabularPrepResult<Vec<f64>> {
        let observed = observed_values(values)?;
        let centered = sub(&observed, &Float64Array::new_scalar(self.center))?;
        let scaled = div(&centered, &Float64Array::new_scalar(self.spread))?;
        Ok(nan_filled(scaled.as_primitive::<Float64Type>()))
    }

    /// Maps a scaled value back to the original units.
    pub fn inverse(&self, z: f64) -> f64 {
        z * self.spread + self.center
    }
}

/// Frozen per-column transforms: numeric scale statistics plus the categorical encoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaleArtifact {
    numeric: Vec<ColumnScale>,
    encoding: CategoricalEncoding,
}

impl ScaleArtifact {
    /// Fits scale statistics for the numeric columns of `features` and an encoding for its
    /// categorical columns.
    pub fn fit(features: &Dataset) -> TabularPrepResult<Self> {
        let numeric = features
            .columns_of_kind(ColumnKind::Numeric)
            .iter()
            .map(|name| {
                let scale = ColumnScale::fit(name, features.column(name)?)?;
                debug!(
                    "Fitted scale for column '{}': center={}, spread={}",
                    name, scale.center, scale.spread
                );
                Ok(scale)
            })
            .collect::<TabularPrepResult<Vec<_>>>()?;
        let encoding =
            CategoricalEncoding::fit(features, &features.columns_of_kind(ColumnKind::Categorical))?;
        Ok(Self { numeric, encoding })
    }

    /// Builds an artifact from known statistics and encoding.
    pub fn from_parts(numeric: Vec<ColumnScale>, encoding: CategoricalEncoding) -> Self {
        Self { numeric, encoding }
    }

    pub fn numeric(&self) -> &[ColumnScale] {
        &self.numeric
    }

    pub fn encoding(&self) -> &CategoricalEncoding {
        &self.encoding
    }

    pub fn scale(&self, column: &str) -> Option<&ColumnScale> {
        self.numeric.iter().find(|s| s.column == column)
    }

    /// Scales and encodes every column of `features`, returning one vector per column in the
    /// dataset's column order.
    ///
    /// The columns of `features` must be exactly the columns the artifact was fit on, with the same
    /// kinds. A fitted column that is absent is `MissingColumn`; anything else is `SchemaMismatch`.
    pub fn transform(
        &self,
        features: &Dataset,
        policy: UnseenCategoryPolicy,
    ) -> TabularPrepResult<Vec<Vec<f64>>> {
        self.check_columns(features)?;

        let mut encoded: HashMap<&str, Vec<f64>> = self
            .encoding
            .columns()
            .zip(self.encoding.transform(features, policy)?)
            .collect();

        let names = features.column_names();
        names
            .iter()
            .map(|name| {
                if let Some(scale) = self.scale(name) {
                    scale.apply_array(features.column(name)?)
                } else {
                    encoded.remove(name.as_str()).ok_or_else(|| {
                        TabularPrepError::SchemaMismatch(format!(
                            "Column '{}' is not part of the fitted artifact",
                            name
                        ))
                    })
                }
            })
            .collect()
    }

    fn check_columns(&self, features: &Dataset) -> TabularPrepResult<()> {
        for scale in &self.numeric {
            if features.kind(&scale.column)? != ColumnKind::Numeric {
                return Err(TabularPrepError::SchemaMismatch(format!(
                    "Column '{}' was scaled as numeric but is categorical",
                    scale.column
                )));
            }
        }
        for column in self.encoding.columns() {
            features.kind(column)?;
        }
        let fitted = self.numeric.len() + self.encoding.len();
        if features.num_columns() != fitted {
            let unknown: Vec<String> = features
                .column_names()
                .into_iter()
                .filter(|c| self.scale(c).is_none() && self.encoding.get(c).is_none())
                .collect();
            return Err(TabularPrepError::SchemaMismatch(format!(
                "Columns {:?} were not present when the artifact was fit",
                unknown
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, NullArray};
    use std::sync::Arc;

    fn floats(values: Vec<Option<f64>>) -> ArrayRef {
        Arc::new(Float64Array::from(values))
    }

    #[test]
    fn test_population_statistics() {
        let values = floats(vec![Some(1.0), Some(2.0), Some(3.0), Some(f64::NAN), None]);
        let scale = ColumnScale::fit("x", &values).unwrap();
        assert!((scale.center() - 2.0).abs() < 1e-12);
        assert!((scale.spread() - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_and_empty_columns() {
        let constant = ColumnScale::fit("x", &floats(vec![Some(0.1); 3])).unwrap();
        assert_eq!(constant.spread(), 1.0);
        assert!(constant.apply(0.1).abs() < 1e-12);

        let empty = ColumnScale::fit("y", &floats(vec![Some(f64::NAN), None])).unwrap();
        assert_eq!((empty.center(), empty.spread()), (0.0, 1.0));
        assert!(empty.apply(f64::NAN).is_nan());

        let blank: ArrayRef = Arc::new(NullArray::new(2));
        let blank = ColumnScale::fit("z", &blank).unwrap();
        assert_eq!((blank.center(), blank.spread()), (0.0, 1.0));
    }

    #[test]
    fn test_apply_array_keeps_gaps() {
        let scale = ColumnScale::new("x", 2.0, 2.0);
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![Some(4), None, Some(0)]));
        let scaled = scale.apply_array(&ints).unwrap();
        assert_eq!(scaled[0], 1.0);
        assert!(scaled[1].is_nan());
        assert_eq!(scaled[2], -1.0);
    }

    #[test]
    fn test_inverse_round_trip() {
        let scale = ColumnScale::new("x", 10.0, 4.0);
        assert_eq!(scale.apply(18.0), 2.0);
        assert_eq!(scale.inverse(2.0), 18.0);
    }
}
