//! Sparse vector types and the row adapters used to feed matrices to the
//! classifier.
//!
//! `SparseVector` is the example-side representation (sorted, unique
//! indices); `WeightVector` is the model-side map that grows lazily as new
//! feature indices show up. `RowSource` turns dense `ndarray` matrices and
//! `CsrMatrix` values into one `SparseVector` per row.
pub mod matrix;
pub mod sparse;

pub use matrix::{CsrMatrix, RowSource, ShapeError};
pub use sparse::{FeatureKey, SparseVector, WeightVector};
