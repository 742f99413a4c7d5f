//! ## Nearest-neighbour imputation
//!
//! This module provides the k-nearest-neighbour imputer that fills the missing cells of a
//! [`FeatureMatrix`].
//!
//! Fitting keeps the training matrix as the donor pool, together with the observed mean of each
//! column. A missing cell is filled with the uniform average of that column over the `k` closest
//! donor rows that observed it. Distances use the NaN-aware euclidean metric:
//!
//! ```text
//! d(a, b) = sqrt(n_columns / n_present * sum((a_i - b_i)^2))
//! ```
//!
//! where the sum and `n_present` run over the coordinates observed in both rows. Two rows without a
//! shared coordinate have no distance and never donate to each other. If no donor is available the
//! column mean is used.
//!
//! Columns with no observed value at fit time are kept and filled with [`EMPTY_FEATURE_FILL`].
//!
//! Errors are returned as `TabularPrepError` and results are wrapped in `TabularPrepResult`.

use crate::dataset::FeatureMatrix;
use crate::exceptions::{TabularPrepError, TabularPrepResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Number of neighbours averaged for each missing cell unless configured otherwise.
pub const DEFAULT_N_NEIGHBORS: usize = 2;

/// Value written into columns that had no observed value when the imputer was fit.
pub const EMPTY_FEATURE_FILL: f64 = 0.0;

/// NaN-aware euclidean distance, or `None` if the rows share no observed coordinate.
pub fn nan_euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Option<f64> {
    let mut present = 0usize;
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        if x.is_nan() || y.is_nan() {
            continue;
        }
        present += 1;
        sum += (x - y).powi(2);
    }
    if present == 0 {
        return None;
    }
    Some((a.len() as f64 / present as f64 * sum).sqrt())
}

/// A donor candidate; ordered by distance, then by donor row so that earlier rows win ties.
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    distance: f64,
    donor: usize,
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.donor.cmp(&other.donor))
    }
}

/// A fitted k-nearest-neighbour imputer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImputationArtifact {
    columns: Vec<String>,
    n_neighbors: usize,
    /// Donor pool, one row per training row.
    donors: Array2<f64>,
    /// Observed mean per column, `NaN` for empty columns.
    means: Array1<f64>,
}

impl ImputationArtifact {
    /// Fits the imputer on `features`, which becomes the donor pool.
    pub fn fit(features: &FeatureMatrix, n_neighbors: usize) -> TabularPrepResult<Self> {
        if n_neighbors == 0 {
            return Err(TabularPrepError::InvalidParameter(
                "Number of neighbours must be at least 1".to_string(),
            ));
        }
        if features.num_rows() == 0 {
            return Err(TabularPrepError::InvalidParameter(
                "Cannot fit the imputer on a matrix without rows".to_string(),
            ));
        }
        let means = features.values().map_axis(Axis(0), |column| {
            let (sum, count) = column
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        });
        let artifact = Self {
            columns: features.columns().to_vec(),
            n_neighbors,
            donors: features.values().clone(),
            means,
        };
        debug!(
            "Fitted KNN imputer (k={}) on {} rows, empty columns: {:?}",
            n_neighbors,
            artifact.n_donors(),
            artifact.empty_columns()
        );
        Ok(artifact)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Number of rows in the donor pool.
    pub fn n_donors(&self) -> usize {
        self.donors.nrows()
    }

    /// Columns that had no observed value at fit time.
    pub fn empty_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .zip(self.means.iter())
            .filter(|(_, m)| m.is_nan())
            .map(|(c, _)| c.as_str())
            .collect()
    }

    /// Returns a copy of `features` with every missing cell filled. The row index and row order are
    /// kept.
    pub fn transform(&self, features: &FeatureMatrix) -> TabularPrepResult<FeatureMatrix> {
        if features.columns() != self.columns.as_slice() {
            return Err(TabularPrepError::SchemaMismatch(format!(
                "Imputer was fit on columns {:?} but got {:?}",
                self.columns,
                features.columns()
            )));
        }

        let mut values = features.values().clone();
        let mut filled = 0usize;
        for (receiver, mut out) in features
            .values()
            .rows()
            .into_iter()
            .zip(values.rows_mut())
        {
            let needs_donors = receiver
                .iter()
                .zip(self.means.iter())
                .any(|(v, m)| v.is_nan() && !m.is_nan());

            let distances: Vec<Option<f64>> = if needs_donors {
                self.donors
                    .rows()
                    .into_iter()
                    .map(|donor| nan_euclidean(receiver, donor))
                    .collect()
            } else {
                Vec::new()
            };

            for (col, cell) in out.iter_mut().enumerate() {
                if self.means[col].is_nan() {
                    // Nothing was learned about this column.
                    *cell = EMPTY_FEATURE_FILL;
                } else if cell.is_nan() {
                    *cell = self.impute_cell(&distances, col);
                    filled += 1;
                }
            }
        }
        debug!("Imputed {} cells over {} rows", filled, features.num_rows());

        FeatureMatrix::new(self.columns.clone(), features.index().clone(), values)
    }

    /// Averages `col` over the `k` closest donors that observed it.
    fn impute_cell(&self, distances: &[Option<f64>], col: usize) -> f64 {
        let donor_column = self.donors.column(col);
        let mut nearest: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(self.n_neighbors + 1);
        for (donor, distance) in distances.iter().enumerate() {
            let Some(distance) = *distance else {
                continue;
            };
            if donor_column[donor].is_nan() {
                continue;
            }
            let candidate = Neighbor { distance, donor };
            if nearest.len() < self.n_neighbors {
                nearest.push(candidate);
            } else if nearest.peek().is_some_and(|farthest| candidate < *farthest) {
                nearest.pop();
                nearest.push(candidate);
            }
        }
        if nearest.is_empty() {
            return self.means[col];
        }
        let count = nearest.len() as f64;
        nearest.into_iter().map(|n| donor_column[n.donor]).sum::<f64>() / count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, aview1};

    #[test]
    fn test_nan_euclidean_weights_present_coordinates() {
        assert_eq!(nan_euclidean(aview1(&[0.0, 0.0]), aview1(&[3.0, 4.0])), Some(5.0));
        // One of two coordinates present: sqrt(2 / 1 * 9).
        let d = nan_euclidean(aview1(&[0.0, f64::NAN]), aview1(&[3.0, 4.0])).unwrap();
        assert!((d - 18.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(
            nan_euclidean(aview1(&[f64::NAN, 1.0]), aview1(&[1.0, f64::NAN])),
            None
        );
    }

    #[test]
    fn test_ties_go_to_earlier_donors() {
        let m = FeatureMatrix::new(
            vec!["a".into(), "b".into()],
            crate::dataset::RowIndex::Ordinal(vec![0, 1, 2]),
            array![[1.0, 10.0], [1.0, 20.0], [1.0, 30.0]],
        )
        .unwrap();
        let imputer = ImputationArtifact::fit(&m, 1).unwrap();
        let receiver = FeatureMatrix::new(
            vec!["a".into(), "b".into()],
            crate::dataset::RowIndex::Ordinal(vec![0]),
            array![[1.0, f64::NAN]],
        )
        .unwrap();
        let filled = imputer.transform(&receiver).unwrap();
        assert_eq!(filled.value(0, 1), Some(10.0));
    }

    #[test]
    fn test_zero_neighbours_is_rejected() {
        let m = FeatureMatrix::new(
            vec!["a".into()],
            crate::dataset::RowIndex::Ordinal(vec![0]),
            array![[1.0]],
        )
        .unwrap();
        assert!(matches!(
            ImputationArtifact::fit(&m, 0),
            Err(TabularPrepError::InvalidParameter(_))
        ));
    }
}
