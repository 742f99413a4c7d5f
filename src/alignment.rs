//! ## Schema Alignment
//!
//! Restricts a training dataset and an inference dataset to the columns they have in common, in
//! the order of the training dataset. Dropping columns here is expected and is only reported, never
//! treated as an error; an empty intersection simply yields datasets without columns.

use crate::dataset::Dataset;
use crate::exceptions::TabularPrepResult;
use std::collections::HashSet;
use tracing::info;

/// The outcome of aligning two column sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Common columns, in training order.
    pub columns: Vec<String>,
    pub dropped_from_train: usize,
    pub dropped_from_test: usize,
}

impl Alignment {
    /// True if neither side lost a column.
    pub fn is_unchanged(&self) -> bool {
        self.dropped_from_train == 0 && self.dropped_from_test == 0
    }
}

/// Computes the common columns of `train_columns` and `test_columns`, in training order.
///
/// Identical sequences are returned as they are.
pub fn align<A, B>(train_columns: &[A], test_columns: &[B]) -> Alignment
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let identical = train_columns.len() == test_columns.len()
        && train_columns
            .iter()
            .zip(test_columns)
            .all(|(a, b)| a.as_ref() == b.as_ref());
    if identical {
        info!("Both datasets have the same columns in the same order");
        return Alignment {
            columns: train_columns.iter().map(|c| c.as_ref().to_string()).collect(),
            dropped_from_train: 0,
            dropped_from_test: 0,
        };
    }

    let test: HashSet<&str> = test_columns.iter().map(AsRef::as_ref).collect();
    let mut seen = HashSet::new();
    let columns: Vec<String> = train_columns
        .iter()
        .map(AsRef::as_ref)
        .filter(|c| test.contains(c) && seen.insert(*c))
        .map(str::to_string)
        .collect();

    let alignment = Alignment {
        dropped_from_train: train_columns.len() - columns.len(),
        dropped_from_test: test_columns.len() - columns.len(),
        columns,
    };
    info!(
        "train: kept {} columns, dropped {} columns",
        alignment.columns.len(),
        alignment.dropped_from_train
    );
    info!(
        "test: kept {} columns, dropped {} columns",
        alignment.columns.len(),
        alignment.dropped_from_test
    );
    alignment
}

/// Restricts both datasets to their common columns, in training order.
pub fn align_datasets(
    train: &Dataset,
    test: &Dataset,
) -> TabularPrepResult<(Dataset, Dataset, Alignment)> {
    let alignment = align(&train.column_names(), &test.column_names());
    let train = train.select(&alignment.columns)?;
    let test = test.select(&alignment.columns)?;
    Ok((train, test, alignment))
}
