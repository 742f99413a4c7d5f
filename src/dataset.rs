//! ## Datasets, Feature Matrices and Target Vectors
//!
//! This module holds the in-memory table types the rest of the library works with.
//!
//! - [`Dataset`]: an Arrow [`RecordBatch`] whose columns carry an explicit [`ColumnKind`] tag.
//!   The tag is decided once, when the dataset is built, from the Arrow data type of each column.
//!   Columns of any other type (booleans, dates, ...) are kept untagged: they can still be dropped
//!   or serve as target or id, but asking for their kind is a `TypeMismatch`.
//! - [`RowIndex`]: the row labels of a processed table, either the original row positions or the
//!   values of an id column.
//! - [`FeatureMatrix`]: the numeric output of the preprocessing pipeline, an `ndarray` matrix.
//! - [`TargetVector`]: the target column split off from the features, aligned by row index.
//!
//! Missing cells are Arrow nulls. For floating-point columns `NaN` counts as missing too.

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, StringArray, UInt64Array};
use arrow::compute::kernels::nullif::nullif;
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, Field, Float64Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use ndarray::Array2;
use std::collections::HashSet;
use std::sync::Arc;

/// The kind of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Integer or floating-point storage. An all-null column (Arrow `Null`) counts as numeric.
    Numeric,
    /// String storage, plain or dictionary-encoded.
    Categorical,
}

impl ColumnKind {
    /// Maps an Arrow data type to a column kind, or `None` if the type is neither.
    pub fn from_data_type(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Null => Some(ColumnKind::Numeric),
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
                Some(ColumnKind::Categorical)
            }
            DataType::Dictionary(_, values) => match values.as_ref() {
                DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
                    Some(ColumnKind::Categorical)
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// A table of named, kind-tagged columns.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
    /// `None` for columns that are neither numeric nor categorical.
    kinds: Vec<Option<ColumnKind>>,
}

impl Dataset {
    /// Wraps a record batch, tagging every column with its kind.
    ///
    /// Fails with `InvalidParameter` if two columns share a name.
    pub fn try_new(batch: RecordBatch) -> TabularPrepResult<Self> {
        let schema = batch.schema();
        let mut seen = HashSet::new();
        let mut kinds = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            if !seen.insert(field.name().as_str()) {
                return Err(TabularPrepError::InvalidParameter(format!(
                    "Column '{}' appears more than once",
                    field.name()
                )));
            }
            kinds.push(ColumnKind::from_data_type(field.data_type()));
        }
        Ok(Self { batch, kinds })
    }

    /// Builds a dataset from `(name, array)` pairs. All arrays must have the same length.
    pub fn from_columns<I, S>(columns: I) -> TabularPrepResult<Self>
    where
        I: IntoIterator<Item = (S, ArrayRef)>,
        S: AsRef<str>,
    {
        let batch = RecordBatch::try_from_iter(columns)?;
        Self::try_new(batch)
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// The underlying record batch.
    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    fn index_of(&self, name: &str) -> TabularPrepResult<usize> {
        self.batch
            .schema()
            .index_of(name)
            .map_err(|_| TabularPrepError::MissingColumn(name.to_string()))
    }

    /// Returns the named column, or `MissingColumn`.
    pub fn column(&self, name: &str) -> TabularPrepResult<&ArrayRef> {
        let idx = self.index_of(name)?;
        Ok(self.batch.column(idx))
    }

    /// Returns the kind of the named column.
    ///
    /// Fails with `MissingColumn` for an absent column and with `TypeMismatch` for a column that is
    /// neither numeric nor categorical.
    pub fn kind(&self, name: &str) -> TabularPrepResult<ColumnKind> {
        let idx = self.index_of(name)?;
        self.kinds[idx].ok_or_else(|| TabularPrepError::TypeMismatch {
            column: name.to_string(),
            data_type: self.batch.schema().field(idx).data_type().to_string(),
        })
    }

    /// Names of the columns of the given kind, in schema order.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .zip(&self.kinds)
            .filter(|(_, k)| **k == Some(kind))
            .map(|(f, _)| f.name().to_string())
            .collect()
    }

    /// Restricts the dataset to `names`, in that order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> TabularPrepResult<Self> {
        let indices = names
            .iter()
            .map(|n| self.index_of(n.as_ref()))
            .collect::<TabularPrepResult<Vec<_>>>()?;
        let batch = self.batch.project(&indices)?;
        let kinds = indices.iter().map(|&i| self.kinds[i]).collect();
        Ok(Self { batch, kinds })
    }

    /// Removes the named columns. Every name must exist.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> TabularPrepResult<Self> {
        for name in names {
            self.index_of(name.as_ref())?;
        }
        let keep: Vec<String> = self
            .column_names()
            .into_iter()
            .filter(|c| !names.iter().any(|n| n.as_ref() == c))
            .collect();
        self.select(&keep)
    }

    /// Keeps the rows where `mask` is true.
    pub(crate) fn filter_rows(&self, mask: &BooleanArray) -> TabularPrepResult<Self> {
        let batch = filter_record_batch(&self.batch, mask)?;
        Ok(Self {
            batch,
            kinds: self.kinds.clone(),
        })
    }
}

/// Per-row missing flags for an array: nulls, and `NaN` for floating-point arrays.
pub(crate) fn missing_mask(array: &ArrayRef) -> TabularPrepResult<Vec<bool>> {
    match array.data_type() {
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let observed = observed_values(array)?;
            Ok((0..observed.len()).map(|i| observed.is_null(i)).collect())
        }
        _ => {
            // `NullArray` has no validity buffer, only logical nulls.
            let nulls = array.logical_nulls();
            Ok((0..array.len())
                .map(|i| nulls.as_ref().is_some_and(|n| n.is_null(i)))
                .collect())
        }
    }
}

/// Numeric array values cast to `Float64`, with `NaN` cells turned into nulls.
pub(crate) fn observed_values(array: &ArrayRef) -> TabularPrepResult<Float64Array> {
    let values = cast(array, &DataType::Float64)?;
    let values = values.as_primitive::<Float64Type>();
    let is_nan: BooleanArray = values.iter().map(|v| v.map(f64::is_nan)).collect();
    Ok(nullif(values, &is_nan)?.as_primitive::<Float64Type>().clone())
}

/// Numeric array values as `f64`, with missing cells as `NaN`.
pub(crate) fn numeric_values(array: &ArrayRef) -> TabularPrepResult<Vec<f64>> {
    Ok(nan_filled(&observed_values(array)?))
}

/// A `Float64` array as plain values, with nulls as `NaN`.
pub(crate) fn nan_filled(values: &Float64Array) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

/// Array values rendered as strings, with nulls as `None`.
pub(crate) fn string_values(array: &ArrayRef) -> TabularPrepResult<Vec<Option<String>>> {
    let values = cast(array, &DataType::Utf8)?;
    let values = values.as_string::<i32>();
    Ok(values.iter().map(|v| v.map(str::to_string)).collect())
}

/// Row labels of a processed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIndex {
    /// Row positions in the original dataset (before any row filtering).
    Ordinal(Vec<usize>),
    /// Values of an id column.
    Labels { name: String, labels: Vec<String> },
}

impl RowIndex {
    /// Builds a label index from an id column. Ids must be non-null and unique.
    pub fn from_id_column(name: &str, array: &ArrayRef) -> TabularPrepResult<Self> {
        let mut seen = HashSet::with_capacity(array.len());
        let mut labels = Vec::with_capacity(array.len());
        for (row, value) in string_values(array)?.into_iter().enumerate() {
            let value = value.ok_or_else(|| {
                TabularPrepError::InvalidParameter(format!(
                    "Id column '{}' has a null value at row {}",
                    name, row
                ))
            })?;
            if !seen.insert(value.clone()) {
                return Err(TabularPrepError::DuplicateIndex {
                    column: name.to_string(),
                    value,
                });
            }
            labels.push(value);
        }
        Ok(RowIndex::Labels {
            name: name.to_string(),
            labels,
        })
    }

    pub fn len(&self) -> usize {
        match self {
            RowIndex::Ordinal(positions) => positions.len(),
            RowIndex::Labels { labels, .. } => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name used for the index when it is exported as a column.
    pub fn name(&self) -> &str {
        match self {
            RowIndex::Ordinal(_) => "index",
            RowIndex::Labels { name, .. } => name,
        }
    }

    /// The label of row `i`, rendered as a string.
    pub fn label(&self, i: usize) -> Option<String> {
        match self {
            RowIndex::Ordinal(positions) => positions.get(i).map(|p| p.to_string()),
            RowIndex::Labels { labels, .. } => labels.get(i).cloned(),
        }
    }

    /// Position of the row carrying `label`.
    pub fn position(&self, label: &str) -> Option<usize> {
        (0..self.len()).find(|&i| self.label(i).as_deref() == Some(label))
    }

    /// The index as an Arrow array (`UInt64` for ordinal, `Utf8` for labels).
    pub fn to_array(&self) -> ArrayRef {
        match self {
            RowIndex::Ordinal(positions) => Arc::new(UInt64Array::from_iter_values(
                positions.iter().map(|&p| p as u64),
            )),
            RowIndex::Labels { labels, .. } => {
                Arc::new(StringArray::from_iter_values(labels.iter()))
            }
        }
    }
}

/// A numeric feature table with a row index: one matrix row per index entry, one matrix column per
/// feature name.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    index: RowIndex,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Creates a matrix from a `rows x columns` array.
    pub fn new(columns: Vec<String>, index: RowIndex, values: Array2<f64>) -> TabularPrepResult<Self> {
        if values.dim() != (index.len(), columns.len()) {
            return Err(TabularPrepError::InvalidParameter(format!(
                "Expected a {}x{} matrix, got {}x{}",
                index.len(),
                columns.len(),
                values.nrows(),
                values.ncols()
            )));
        }
        // Rows are handed out as slices.
        let values = if values.is_standard_layout() {
            values
        } else {
            values.as_standard_layout().into_owned()
        };
        Ok(Self {
            columns,
            index,
            values,
        })
    }

    /// Creates a matrix from per-column values.
    pub fn from_columns(
        columns: Vec<String>,
        index: RowIndex,
        data: Vec<Vec<f64>>,
    ) -> TabularPrepResult<Self> {
        let n_rows = index.len();
        if data.len() != columns.len() || data.iter().any(|c| c.len() != n_rows) {
            return Err(TabularPrepError::InvalidParameter(format!(
                "Column data does not match {} columns of {} rows",
                columns.len(),
                n_rows
            )));
        }
        let values = Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| data[c][r]);
        Self::new(columns, index, values)
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// True if the matrix has no feature columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Row `i`, or `None` past the last row.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i >= self.values.nrows() {
            return None;
        }
        self.values.row(i).to_slice()
    }

    /// The row carrying index label `label`.
    pub fn row_by_label(&self, label: &str) -> Option<&[f64]> {
        self.index.position(label).and_then(|i| self.row(i))
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    /// The values of a named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let col = self.column_index(name)?;
        Some(self.values.column(col).to_vec())
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of missing (`NaN`) cells.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Exports the matrix as a record batch: the index column first, then one nullable `Float64`
    /// column per feature. `NaN` cells become nulls.
    pub fn to_record_batch(&self) -> TabularPrepResult<RecordBatch> {
        let mut fields = vec![Field::new(
            self.index.name(),
            match self.index {
                RowIndex::Ordinal(_) => DataType::UInt64,
                RowIndex::Labels { .. } => DataType::Utf8,
            },
            false,
        )];
        let mut arrays: Vec<ArrayRef> = vec![self.index.to_array()];
        for (name, column) in self.columns.iter().zip(self.values.columns()) {
            fields.push(Field::new(name, DataType::Float64, true));
            let array: Float64Array = column.iter().map(|v| (!v.is_nan()).then_some(*v)).collect();
            arrays.push(Arc::new(array));
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

/// The target column, aligned by row index with the feature matrix.
#[derive(Debug, Clone)]
pub struct TargetVector {
    name: String,
    index: RowIndex,
    values: ArrayRef,
}

impl TargetVector {
    pub fn new(name: &str, index: RowIndex, values: ArrayRef) -> TabularPrepResult<Self> {
        if index.len() != values.len() {
            return Err(TabularPrepError::InvalidParameter(format!(
                "Target '{}' has {} values but the index has {} rows",
                name,
                values.len(),
                index.len()
            )));
        }
        Ok(Self {
            name: name.to_string(),
            index,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing target values.
    pub fn missing_count(&self) -> TabularPrepResult<usize> {
        Ok(missing_mask(&self.values)?.into_iter().filter(|m| *m).count())
    }

    /// The target as `f64` values (missing as `NaN`). Only numeric targets convert.
    pub fn to_f64(&self) -> TabularPrepResult<Vec<f64>> {
        match ColumnKind::from_data_type(self.values.data_type()) {
            Some(ColumnKind::Numeric) => numeric_values(&self.values),
            _ => Err(TabularPrepError::TypeMismatch {
                column: self.name.clone(),
                data_type: self.values.data_type().to_string(),
            }),
        }
    }
}
