//! Dense point providers backed by Arrow and Parquet `FixedSizeList` columns.
//!
//! Rows become the points of an [`agglo_core::PointMatrix`]; `Float32` and
//! `Float64` children are both accepted and widened to `f64`.

mod errors;
mod ingest;
mod provider;

pub use errors::DenseMatrixProviderError;
pub use provider::PointMatrixProvider;

#[cfg(test)]
mod tests;
