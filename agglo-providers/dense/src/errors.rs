//! Errors raised while loading dense point matrices.

use agglo_core::LinkageError;
use arrow_schema::{ArrowError, DataType};
use thiserror::Error;

/// Failure to turn a `FixedSizeList` column into a point matrix.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DenseMatrixProviderError {
    /// The requested column is absent from the schema.
    #[error("column `{column}` not found in Parquet schema")]
    ColumnNotFound {
        /// Requested column name.
        column: String,
    },
    /// The column is not a `FixedSizeList`.
    #[error("column `{column}` must be a FixedSizeList<Float32 | Float64, _> but found {actual:?}")]
    InvalidColumnType {
        /// Requested column name.
        column: String,
        /// Type found in the schema.
        actual: DataType,
    },
    /// The list or its children are declared nullable.
    #[error("column `{column}` must not be nullable (nullable child: {nullable_child})")]
    NullableField {
        /// Requested column name.
        column: String,
        /// Whether the child field, rather than the list, is nullable.
        nullable_child: bool,
    },
    /// The list children are not floating point.
    #[error("FixedSizeList child type must be Float32 or Float64 but found {actual:?}")]
    InvalidListValueType {
        /// Child type found in the array.
        actual: DataType,
    },
    /// The declared list width is negative.
    #[error("invalid FixedSizeList dimension {actual}")]
    InvalidDimension {
        /// Declared width.
        actual: i32,
    },
    /// A whole row is null.
    #[error("row {row} is null")]
    NullRow {
        /// Absolute row index.
        row: usize,
    },
    /// A row contains a null coordinate.
    #[error("row {row} contains null value at position {value_index}")]
    NullValue {
        /// Absolute row index.
        row: usize,
        /// Coordinate index within the row.
        value_index: usize,
    },
    /// A row does not have the declared width.
    #[error("row {row} has length {actual} but expected {expected}")]
    InvalidRowLength {
        /// Absolute row index.
        row: usize,
        /// Declared width.
        expected: usize,
        /// Observed length.
        actual: usize,
    },
    /// The matrix does not fit in memory.
    #[error("matrix with {rows} rows and dimension {dimension} exceeds capacity limits")]
    CapacityOverflow {
        /// Rows in the offending batch.
        rows: usize,
        /// Declared width.
        dimension: usize,
    },
    /// Record batches disagree on the list width.
    #[error("inconsistent dimensions across batches: expected {expected}, got {actual}")]
    InconsistentBatchDimension {
        /// Width of the first batch.
        expected: usize,
        /// Width of the offending batch.
        actual: usize,
    },
    /// The loaded values do not form a valid point matrix.
    #[error("invalid point matrix: {0}")]
    Points(#[from] LinkageError),
    /// Arrow failed to decode a batch.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    /// Parquet failed to read the file.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    /// The file could not be opened.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
