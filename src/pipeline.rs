//! ## Tabular Preprocessing Pipeline
//!
//! This module turns a [`Dataset`] into a numeric [`FeatureMatrix`] and a [`TargetVector`],
//! returning the fitted artifacts so the exact same transformation can be replayed later.
//!
//! ### Overview
//!
//! - [`PreprocessOptions`] names the target, id and drop columns and holds the tuning knobs.
//! - [`TabularPreprocessor`] runs the steps in order: column drop, row filter (fit mode only),
//!   index assignment, target split, type partition, categorical encoding, scaling, imputation.
//! - [`process`] is the same operation as a single function call.
//!
//! A call without a [`ScaleArtifact`] is a fit call: rows with a missing target are dropped, and
//! the encoding and scale statistics are learned from the data. A call with a `ScaleArtifact` is an
//! apply call: every row is kept, in order, and the frozen statistics are replayed. The
//! [`ImputationArtifact`] is fit when absent and replayed (never refit) when supplied.
//!
//! The preprocessor holds no state between calls and never mutates its inputs.

use crate::dataset::{missing_mask, Dataset, FeatureMatrix, RowIndex, TargetVector};
use crate::exceptions::{TabularPrepError, TabularPrepResult};
use crate::transformers::categorical_encoding::UnseenCategoryPolicy;
use crate::transformers::imputation::{ImputationArtifact, DEFAULT_N_NEIGHBORS};
use crate::transformers::scaling::ScaleArtifact;
use arrow::array::BooleanArray;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Column roles and tuning knobs for [`TabularPreprocessor`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessOptions {
    target_column: String,
    id_column: Option<String>,
    drop_columns: Vec<String>,
    n_neighbors: usize,
    unseen_categories: UnseenCategoryPolicy,
    allow_empty_features: bool,
}

impl PreprocessOptions {
    /// Options for the given target column, with defaults for everything else.
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            id_column: None,
            drop_columns: Vec::new(),
            n_neighbors: DEFAULT_N_NEIGHBORS,
            unseen_categories: UnseenCategoryPolicy::default(),
            allow_empty_features: true,
        }
    }

    /// Moves the given column to the row index.
    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = Some(id_column.into());
        self
    }

    /// Columns removed before anything else happens.
    pub fn with_drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Number of neighbours the imputer averages.
    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    pub fn with_unseen_category_policy(mut self, policy: UnseenCategoryPolicy) -> Self {
        self.unseen_categories = policy;
        self
    }

    /// Whether a result without feature columns is returned (with a warning) or is an
    /// `EmptyFeatureSet` error.
    pub fn allow_empty_features(mut self, allow: bool) -> Self {
        self.allow_empty_features = allow;
        self
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn id_column(&self) -> Option<&str> {
        self.id_column.as_deref()
    }

    pub fn drop_columns(&self) -> &[String] {
        &self.drop_columns
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn unseen_categories(&self) -> UnseenCategoryPolicy {
        self.unseen_categories
    }

    /// Checks the options on their own, without looking at a dataset.
    pub fn validate(&self) -> TabularPrepResult<()> {
        if self.n_neighbors == 0 {
            return Err(TabularPrepError::InvalidParameter(
                "Number of neighbours must be at least 1".to_string(),
            ));
        }
        if self.id_column.as_deref() == Some(self.target_column.as_str()) {
            return Err(TabularPrepError::InvalidParameter(format!(
                "Column '{}' cannot be both the target and the id",
                self.target_column
            )));
        }
        Ok(())
    }
}

/// Everything a `process` call produces.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub features: FeatureMatrix,
    pub target: TargetVector,
    pub scale: ScaleArtifact,
    pub imputation: ImputationArtifact,
}

impl ProcessOutput {
    /// True if no feature column survived.
    pub fn is_empty_feature_set(&self) -> bool {
        self.features.is_empty()
    }

    pub fn into_parts(self) -> (FeatureMatrix, TargetVector, ScaleArtifact, ImputationArtifact) {
        (self.features, self.target, self.scale, self.imputation)
    }
}

/// Fits or replays the preprocessing transforms on a dataset.
#[derive(Debug, Clone)]
pub struct TabularPreprocessor {
    options: PreprocessOptions,
}

impl TabularPreprocessor {
    pub fn new(options: PreprocessOptions) -> TabularPrepResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Runs the pipeline.
    ///
    /// Without `scale` this is a fit call; with `scale` the frozen encoding and statistics are
    /// replayed. `imputation` is fit from the current matrix when absent.
    pub fn process(
        &self,
        dataset: &Dataset,
        scale: Option<&ScaleArtifact>,
        imputation: Option<&ImputationArtifact>,
    ) -> TabularPrepResult<ProcessOutput> {
        let start = Instant::now();
        let fit_mode = scale.is_none();
        self.check_columns(dataset)?;
        let target_name = self.options.target_column.as_str();
        let id_name = self.options.id_column.as_deref();

        let dataset = dataset.drop_columns(&self.options.drop_columns)?;

        let (dataset, positions) = if fit_mode {
            let missing = missing_mask(dataset.column(target_name)?)?;
            let keep = BooleanArray::from(missing.iter().map(|m| !m).collect::<Vec<_>>());
            let positions: Vec<usize> = (0..missing.len()).filter(|&i| !missing[i]).collect();
            if positions.len() < missing.len() {
                info!(
                    "Dropped {} rows with a missing '{}'",
                    missing.len() - positions.len(),
                    target_name
                );
            }
            (dataset.filter_rows(&keep)?, positions)
        } else {
            let positions = (0..dataset.num_rows()).collect();
            (dataset, positions)
        };
        if fit_mode && dataset.num_rows() == 0 {
            return Err(TabularPrepError::InvalidParameter(format!(
                "No rows with an observed '{}' left to fit on",
                target_name
            )));
        }

        let index = match id_name {
            Some(id) => RowIndex::from_id_column(id, dataset.column(id)?)?,
            None => RowIndex::Ordinal(positions),
        };

        let target = TargetVector::new(
            target_name,
            index.clone(),
            dataset.column(target_name)?.clone(),
        )?;

        let feature_names: Vec<String> = dataset
            .column_names()
            .into_iter()
            .filter(|c| c != target_name && Some(c.as_str()) != id_name)
            .collect();
        if feature_names.is_empty() {
            if !self.options.allow_empty_features {
                return Err(TabularPrepError::EmptyFeatureSet);
            }
            warn!("No feature columns left after dropping target, id and drop columns");
        }
        let features = dataset.select(&feature_names)?;
        for name in &feature_names {
            // Only feature columns have to be numeric or categorical.
            features.kind(name)?;
        }

        let scale = match scale {
            Some(artifact) => artifact.clone(),
            None => ScaleArtifact::fit(&features)?,
        };
        let columns = scale.transform(&features, self.options.unseen_categories)?;
        let matrix = FeatureMatrix::from_columns(feature_names, index, columns)?;

        let imputation = match imputation {
            Some(artifact) => artifact.clone(),
            None => ImputationArtifact::fit(&matrix, self.options.n_neighbors)?,
        };
        let features = imputation.transform(&matrix)?;

        debug!(
            "Processed {} rows x {} features ({} mode) in {:?}",
            features.num_rows(),
            features.num_columns(),
            if fit_mode { "fit" } else { "apply" },
            start.elapsed()
        );
        Ok(ProcessOutput {
            features,
            target,
            scale,
            imputation,
        })
    }

    /// Reports every absent drop, target or id column, and any null or repeated id, before any work
    /// is done.
    fn check_columns(&self, dataset: &Dataset) -> TabularPrepResult<()> {
        for column in &self.options.drop_columns {
            if !dataset.has_column(column) {
                return Err(TabularPrepError::MissingColumn(column.clone()));
            }
        }
        let roles = std::iter::once(&self.options.target_column).chain(&self.options.id_column);
        for column in roles {
            if !dataset.has_column(column) || self.options.drop_columns.contains(column) {
                return Err(TabularPrepError::MissingColumn(column.clone()));
            }
        }
        if let Some(id) = self.options.id_column.as_deref() {
            RowIndex::from_id_column(id, dataset.column(id)?)?;
        }
        Ok(())
    }
}

/// One-call form of [`TabularPreprocessor::process`] with the default tuning knobs.
pub fn process(
    dataset: &Dataset,
    target_column: &str,
    id_column: Option<&str>,
    drop_columns: Option<&[&str]>,
    scale: Option<&ScaleArtifact>,
    imputation: Option<&ImputationArtifact>,
) -> TabularPrepResult<ProcessOutput> {
    let mut options = PreprocessOptions::new(target_column)
        .with_drop_columns(drop_columns.unwrap_or_default().iter().copied());
    if let Some(id) = id_column {
        options = options.with_id_column(id);
    }
    TabularPreprocessor::new(options)?.process(dataset, scale, imputation)
}
