//! # Transformer Implementations
//!
//! The submodules contain the fit/apply transforms the preprocessing pipeline chains together.

pub mod categorical_encoding;
pub mod imputation;
pub mod scaling;
