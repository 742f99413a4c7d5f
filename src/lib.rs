//! # Tabular Prep
//!
//! Fit-once, replay-anywhere preprocessing for tabular data.
//!
//! A training dataset and a structurally related inference dataset are first aligned onto the
//! same ordered columns ([`alignment`]). The training set is then processed in fit mode, which
//! encodes categorical columns, scales numeric columns and imputes missing values, returning the
//! fitted artifacts. The inference set is processed in apply mode with those artifacts, so it goes
//! through exactly the same transformation ([`pipeline`]).
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
//! use tabular_prep::dataset::Dataset;
//! use tabular_prep::pipeline::process;
//!
//! let train = Dataset::from_columns(vec![
//!     ("id", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
//!     ("age", Arc::new(Float64Array::from(vec![Some(30.0), None, Some(50.0)])) as ArrayRef),
//!     ("city", Arc::new(StringArray::from(vec!["a", "b", "a"])) as ArrayRef),
//!     ("target", Arc::new(Float64Array::from(vec![1.0, 0.0, 1.0])) as ArrayRef),
//! ])
//! .unwrap();
//!
//! let fitted = process(&train, "target", Some("id"), None, None, None).unwrap();
//! assert_eq!(fitted.features.num_rows(), 3);
//! assert_eq!(fitted.features.missing_count(), 0);
//! ```

pub mod alignment;
pub mod dataset;
pub mod exceptions;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod transformers;
