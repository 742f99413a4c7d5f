use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};

use tabular_prep::dataset::{FeatureMatrix, RowIndex};
use tabular_prep::exceptions::{TabularPrepError, TabularPrepResult};
use tabular_prep::transformers::imputation::{
    ImputationArtifact, DEFAULT_N_NEIGHBORS, EMPTY_FEATURE_FILL,
};

const NAN: f64 = f64::NAN;

/// Creates a matrix with columns "a" and "b" from its rows.
fn matrix(rows: &[[f64; 2]]) -> FeatureMatrix {
    FeatureMatrix::new(
        vec!["a".to_string(), "b".to_string()],
        RowIndex::Ordinal((0..rows.len()).collect()),
        Array2::from(rows.to_vec()),
    )
    .unwrap()
}

fn training_matrix() -> FeatureMatrix {
    matrix(&[[1.0, 2.0], [3.0, 4.0], [NAN, 6.0], [8.0, 8.0]])
}

#[test]
fn test_fit_transform_fills_from_nearest_donors() -> TabularPrepResult<()> {
    let train = training_matrix();
    let imputer = ImputationArtifact::fit(&train, DEFAULT_N_NEIGHBORS)?;
    let filled = imputer.transform(&train)?;

    // Row 2 only shares column "b" with the donors; rows 1 and 3 tie as nearest and
    // row 2 cannot donate to itself.
    assert_abs_diff_eq!(filled.value(2, 0).unwrap(), (3.0 + 8.0) / 2.0, epsilon = 1e-12);
    assert_eq!(filled.missing_count(), 0);
    // Observed cells are untouched.
    assert_eq!(filled.row(0), Some(&[1.0, 2.0][..]));
    assert_eq!(filled.index(), train.index());
    Ok(())
}

#[test]
fn test_fewer_donors_than_neighbours() -> TabularPrepResult<()> {
    let train = training_matrix();
    let imputer = ImputationArtifact::fit(&train, 5)?;
    let filled = imputer.transform(&train)?;
    assert_abs_diff_eq!(filled.value(2, 0).unwrap(), (1.0 + 3.0 + 8.0) / 3.0, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_row_without_shared_coordinates_uses_column_means() -> TabularPrepResult<()> {
    let imputer = ImputationArtifact::fit(&training_matrix(), DEFAULT_N_NEIGHBORS)?;
    let filled = imputer.transform(&matrix(&[[NAN, NAN]]))?;
    assert_abs_diff_eq!(filled.value(0, 0).unwrap(), 4.0, epsilon = 1e-12);
    assert_abs_diff_eq!(filled.value(0, 1).unwrap(), 5.0, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_apply_uses_fitted_donors_only() -> TabularPrepResult<()> {
    let imputer = ImputationArtifact::fit(&training_matrix(), 1)?;
    // The new rows would pick each other if the imputer were refit on them.
    let new = matrix(&[[100.0, 7.9], [NAN, 8.0]]);
    let filled = imputer.transform(&new)?;
    assert_abs_diff_eq!(filled.value(1, 0).unwrap(), 8.0, epsilon = 1e-12);
    assert_eq!(imputer.n_donors(), 4);
    Ok(())
}

#[test]
fn test_empty_column_is_kept_with_sentinel() -> TabularPrepResult<()> {
    let train = matrix(&[[1.0, NAN], [NAN, NAN], [3.0, NAN]]);
    let imputer = ImputationArtifact::fit(&train, DEFAULT_N_NEIGHBORS)?;
    assert_eq!(imputer.empty_columns(), vec!["b"]);

    let filled = imputer.transform(&train)?;
    assert_eq!(filled.num_columns(), 2);
    assert_eq!(filled.column("b").unwrap(), vec![EMPTY_FEATURE_FILL; 3]);
    assert_abs_diff_eq!(filled.value(1, 0).unwrap(), 2.0, epsilon = 1e-12);
    assert_eq!(filled.missing_count(), 0);
    Ok(())
}

#[test]
fn test_column_mismatch_is_rejected() -> TabularPrepResult<()> {
    let imputer = ImputationArtifact::fit(&training_matrix(), DEFAULT_N_NEIGHBORS)?;
    let other = FeatureMatrix::new(
        vec!["b".to_string(), "a".to_string()],
        RowIndex::Ordinal(vec![0]),
        array![[1.0, 2.0]],
    )?;
    assert!(matches!(
        imputer.transform(&other),
        Err(TabularPrepError::SchemaMismatch(_))
    ));
    Ok(())
}

#[test]
fn test_fit_on_empty_matrix_fails() {
    let empty = matrix(&[]);
    assert!(matches!(
        ImputationArtifact::fit(&empty, DEFAULT_N_NEIGHBORS),
        Err(TabularPrepError::InvalidParameter(_))
    ));
}
