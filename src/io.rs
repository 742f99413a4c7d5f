//! ## Loading and exporting data
//!
//! Adapters between files, DataFusion and the in-memory [`Dataset`] / [`FeatureMatrix`] types.
//!
//! - [`read_parquet`] reads a Parquet file synchronously with the `parquet` crate.
//! - [`load_dataset`] reads a CSV or Parquet file through DataFusion (format picked by extension).
//! - [`dataset_from_dataframe`] collects an existing DataFusion `DataFrame` into a dataset.
//! - [`features_to_dataframe`] hands a processed feature matrix back to DataFusion.
//!
//! Only the DataFusion adapters are async. Artifacts are never written anywhere by this crate.

use crate::dataset::{Dataset, FeatureMatrix};
use crate::exceptions::{TabularPrepError, TabularPrepResult};
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use datafusion::prelude::{CsvReadOptions, DataFrame, ParquetReadOptions, SessionContext};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Reads a Parquet file into a dataset.
pub fn read_parquet(path: impl AsRef<Path>) -> TabularPrepResult<Dataset> {
    let file = File::open(path.as_ref())?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<Result<Vec<_>, arrow::error::ArrowError>>()?;
    debug!(
        "Read {} batches from {}",
        batches.len(),
        path.as_ref().display()
    );
    Dataset::try_new(concat_batches(&schema, &batches)?)
}

/// Loads a CSV or Parquet file through DataFusion.
pub async fn load_dataset(path: &str) -> TabularPrepResult<Dataset> {
    let ctx = SessionContext::new();
    let extension = Path::new(path).extension().and_then(|e| e.to_str());
    let df = match extension {
        Some("parquet") => ctx.read_parquet(path, ParquetReadOptions::default()).await?,
        Some("csv") => ctx.read_csv(path, CsvReadOptions::new()).await?,
        _ => {
            return Err(TabularPrepError::UnsupportedFormat(format!(
                "Cannot load '{}': expected a .csv or .parquet file",
                path
            )))
        }
    };
    dataset_from_dataframe(df).await
}

/// Executes a DataFusion `DataFrame` and collects the result into a single dataset.
pub async fn dataset_from_dataframe(df: DataFrame) -> TabularPrepResult<Dataset> {
    let planned: SchemaRef = Arc::new(df.schema().as_arrow().clone());
    let batches = df.collect().await?;
    let schema = batches
        .first()
        .map(|b| b.schema())
        .unwrap_or(planned);
    Dataset::try_new(concat_batches(&schema, &batches)?)
}

/// Registers a feature matrix with `ctx` as a DataFrame (index column first).
pub fn features_to_dataframe(
    ctx: &SessionContext,
    features: &FeatureMatrix,
) -> TabularPrepResult<DataFrame> {
    Ok(ctx.read_batch(features.to_record_batch()?)?)
}
