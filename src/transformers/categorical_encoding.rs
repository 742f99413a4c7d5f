//! # Categorical Encoding
//!
//! Replaces each categorical column with integer codes.
//!
//! The encoding is learned once, from training data: the distinct values of a column are sorted
//! lexicographically and numbered `0..n-1`. The fitted [`CategoricalEncoding`] is then replayed
//! unchanged on any later dataset. Missing cells stay missing (`NaN`) so that the imputer can fill
//! them. What happens to a value the encoding has never seen is decided by an
//! [`UnseenCategoryPolicy`].

use crate::dataset::{string_values, ColumnKind, Dataset};
use crate::exceptions::{TabularPrepError, TabularPrepResult};
use std::collections::BTreeSet;
use tracing::debug;

/// What to do with a category that was not present when the encoding was fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnseenCategoryPolicy {
    /// Fail with `UnseenCategory`.
    #[default]
    Error,
    /// Assign the reserved code `n`, one past the last known code.
    Reserved,
    /// Treat the cell as missing so the imputer fills it.
    Missing,
}

/// The fitted code map of a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEncoding {
    column: String,
    /// Sorted; the code of a category is its position.
    categories: Vec<String>,
}

impl ColumnEncoding {
    /// Learns the sorted distinct values of a column. Missing cells are ignored.
    pub fn fit(column: &str, values: &[Option<String>]) -> Self {
        let categories: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();
        Self {
            column: column.to_string(),
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// The code of `value`, if it was seen during fit.
    pub fn code(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// The code handed out to unseen values under [`UnseenCategoryPolicy::Reserved`].
    pub fn reserved_code(&self) -> usize {
        self.categories.len()
    }

    /// Encodes a column. Missing cells become `NaN`.
    pub fn transform(
        &self,
        values: &[Option<String>],
        policy: UnseenCategoryPolicy,
    ) -> TabularPrepResult<Vec<f64>> {
        values
            .iter()
            .map(|value| match value {
                None => Ok(f64::NAN),
                Some(v) => match (self.code(v), policy) {
                    (Some(code), _) => Ok(code as f64),
                    (None, UnseenCategoryPolicy::Error) => Err(TabularPrepError::UnseenCategory {
                        column: self.column.clone(),
                        value: v.clone(),
                    }),
                    (None, UnseenCategoryPolicy::Reserved) => Ok(self.reserved_code() as f64),
                    (None, UnseenCategoryPolicy::Missing) => Ok(f64::NAN),
                },
            })
            .collect()
    }
}

/// Fitted code maps for every categorical column of a dataset, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoricalEncoding {
    columns: Vec<ColumnEncoding>,
}

impl CategoricalEncoding {
    /// Learns a code map for each of `columns`. Every column must exist and be categorical.
    pub fn fit<S: AsRef<str>>(dataset: &Dataset, columns: &[S]) -> TabularPrepResult<Self> {
        let mut encodings = Vec::with_capacity(columns.len());
        for name in columns {
            let name = name.as_ref();
            require_categorical(dataset, name)?;
            let values = string_values(dataset.column(name)?)?;
            let encoding = ColumnEncoding::fit(name, &values);
            debug!(
                "Fitted encoding for column '{}' with {} categories",
                name,
                encoding.categories.len()
            );
            encodings.push(encoding);
        }
        Ok(Self { columns: encodings })
    }

    /// Encodes the fitted columns of `dataset`, returning one code vector per fitted column in
    /// fitted order.
    pub fn transform(
        &self,
        dataset: &Dataset,
        policy: UnseenCategoryPolicy,
    ) -> TabularPrepResult<Vec<Vec<f64>>> {
        self.columns
            .iter()
            .map(|encoding| {
                require_categorical(dataset, encoding.column())?;
                let values = string_values(dataset.column(encoding.column())?)?;
                encoding.transform(&values, policy)
            })
            .collect()
    }

    /// Names of the encoded columns.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(ColumnEncoding::column)
    }

    pub fn get(&self, column: &str) -> Option<&ColumnEncoding> {
        self.columns.iter().find(|e| e.column == column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn require_categorical(dataset: &Dataset, name: &str) -> TabularPrepResult<()> {
    match dataset.kind(name)? {
        ColumnKind::Categorical => Ok(()),
        ColumnKind::Numeric => Err(TabularPrepError::SchemaMismatch(format!(
            "Column '{}' was encoded as categorical but is numeric",
            name
        ))),
    }
}
