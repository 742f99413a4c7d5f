// Run `cargo run --example basic_usage` to execute this example
// Set DEBUG_TABULAR_PREP=true to see what every step does

use std::error::Error;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use datafusion::prelude::SessionContext;
use tabular_prep::alignment::align_datasets;
use tabular_prep::dataset::Dataset;
use tabular_prep::io::features_to_dataframe;
use tabular_prep::pipeline::{PreprocessOptions, TabularPreprocessor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let train = Dataset::from_columns(vec![
        ("id", Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])) as ArrayRef),
        (
            "age",
            Arc::new(Float64Array::from(vec![Some(23.0), Some(35.0), None, Some(51.0), Some(44.0)]))
                as ArrayRef,
        ),
        (
            "city",
            Arc::new(StringArray::from(vec!["Lyon", "Paris", "Lyon", "Nice", "Paris"])) as ArrayRef,
        ),
        ("notes", Arc::new(StringArray::from(vec!["", "", "", "", ""])) as ArrayRef),
        (
            "target",
            Arc::new(Float64Array::from(vec![Some(0.0), Some(1.0), Some(1.0), None, Some(0.0)]))
                as ArrayRef,
        ),
    ])?;

    // The inference set has its columns in another order and lacks "notes".
    let test = Dataset::from_columns(vec![
        ("city", Arc::new(StringArray::from(vec!["Paris", "Lyon"])) as ArrayRef),
        ("target", Arc::new(Float64Array::from(vec![None::<f64>, None])) as ArrayRef),
        ("age", Arc::new(Float64Array::from(vec![None, Some(29.0)])) as ArrayRef),
        ("id", Arc::new(Int64Array::from(vec![100, 101])) as ArrayRef),
    ])?;

    let (train, test, alignment) = align_datasets(&train, &test)?;
    println!("Aligned columns: {:?}", alignment.columns);

    let preprocessor =
        TabularPreprocessor::new(PreprocessOptions::new("target").with_id_column("id"))?;
    let fitted = preprocessor.process(&train, None, None)?;
    let applied = preprocessor.process(&test, Some(&fitted.scale), Some(&fitted.imputation))?;

    let ctx = SessionContext::new();
    println!("Training features:");
    features_to_dataframe(&ctx, &fitted.features)?.show().await?;
    println!("Inference features:");
    features_to_dataframe(&ctx, &applied.features)?.show().await?;

    Ok(())
}
