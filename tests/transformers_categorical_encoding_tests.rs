use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, LargeStringArray, StringArray};

use tabular_prep::dataset::Dataset;
use tabular_prep::exceptions::{TabularPrepError, TabularPrepResult};
use tabular_prep::transformers::categorical_encoding::{
    CategoricalEncoding, UnseenCategoryPolicy,
};

/// Helper function to create a dataset with a categorical column "color" (with a gap) and a
/// numeric column "size".
fn create_categorical_dataset(colors: Vec<Option<&str>>) -> Dataset {
    let sizes: Vec<f64> = (0..colors.len()).map(|i| i as f64).collect();
    Dataset::from_columns(vec![
        ("color", Arc::new(StringArray::from(colors)) as ArrayRef),
        ("size", Arc::new(Float64Array::from(sizes)) as ArrayRef),
    ])
    .unwrap()
}

#[test]
fn test_fit_and_transform() -> TabularPrepResult<()> {
    let ds = create_categorical_dataset(vec![
        Some("red"),
        Some("blue"),
        None,
        Some("green"),
        Some("red"),
    ]);
    let encoding = CategoricalEncoding::fit(&ds, &["color"])?;
    assert_eq!(encoding.len(), 1);

    let codes = encoding.transform(&ds, UnseenCategoryPolicy::Error)?;
    // blue=0, green=1, red=2; the gap stays missing.
    assert_eq!(codes[0][0], 2.0);
    assert_eq!(codes[0][1], 0.0);
    assert!(codes[0][2].is_nan());
    assert_eq!(codes[0][3], 1.0);
    assert_eq!(codes[0][4], 2.0);
    Ok(())
}

#[test]
fn test_mapping_is_reused_on_new_data() -> TabularPrepResult<()> {
    let train = create_categorical_dataset(vec![Some("red"), Some("blue")]);
    let encoding = CategoricalEncoding::fit(&train, &["color"])?;

    // Refitting on this data alone would give "red" the code 0.
    let test = create_categorical_dataset(vec![Some("red"), Some("red")]);
    let codes = encoding.transform(&test, UnseenCategoryPolicy::Error)?;
    assert_eq!(codes[0], vec![1.0, 1.0]);
    Ok(())
}

#[test]
fn test_unseen_category_error_names_value() -> TabularPrepResult<()> {
    let encoding =
        CategoricalEncoding::fit(&create_categorical_dataset(vec![Some("red")]), &["color"])?;
    let test = create_categorical_dataset(vec![Some("red"), Some("teal")]);
    let err = encoding
        .transform(&test, UnseenCategoryPolicy::Error)
        .unwrap_err();
    assert!(matches!(
        err,
        TabularPrepError::UnseenCategory { ref column, ref value }
            if column == "color" && value == "teal"
    ));
    Ok(())
}

#[test]
fn test_large_strings_are_categorical() -> TabularPrepResult<()> {
    let ds = Dataset::from_columns(vec![(
        "name",
        Arc::new(LargeStringArray::from(vec!["b", "a"])) as ArrayRef,
    )])?;
    let encoding = CategoricalEncoding::fit(&ds, &["name"])?;
    assert_eq!(
        encoding.transform(&ds, UnseenCategoryPolicy::Error)?[0],
        vec![1.0, 0.0]
    );
    Ok(())
}

#[test]
fn test_numeric_column_cannot_be_encoded() {
    let ds = create_categorical_dataset(vec![Some("red")]);
    assert!(matches!(
        CategoricalEncoding::fit(&ds, &["size"]),
        Err(TabularPrepError::SchemaMismatch(_))
    ));
    assert!(matches!(
        CategoricalEncoding::fit(&ds, &["weight"]),
        Err(TabularPrepError::MissingColumn(_))
    ));
}
