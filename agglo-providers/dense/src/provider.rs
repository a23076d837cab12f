//! Point matrix provider implementation and Parquet ingestion.
use std::{fs::File, path::Path};

use agglo_core::PointMatrix;
use arrow_array::{Array, FixedSizeListArray, RecordBatchReader};
use parquet::arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder};
use parquet::file::reader::ChunkReader;
use tracing::{debug, instrument};

use crate::errors::DenseMatrixProviderError;
use crate::ingest::{append_fixed_size_list_values, validate_fixed_size_list_field};

/// Raw points loaded from a `FixedSizeList` column into a row-major `f64`
/// buffer.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use agglo_providers_dense::PointMatrixProvider;
/// use arrow_array::{ArrayRef, FixedSizeListArray, Float64Array};
/// use arrow_schema::{DataType, Field};
///
/// let values: ArrayRef = Arc::new(Float64Array::from(vec![0.0, 0.0, 3.0, 4.0]));
/// let field = Arc::new(Field::new("item", DataType::Float64, false));
/// let array = FixedSizeListArray::new(field, 2, values, None);
/// let provider = PointMatrixProvider::try_from_fixed_size_list("demo", &array)?;
/// assert_eq!(provider.len(), 2);
/// let points = provider.into_points()?;
/// assert_eq!(points.row(1), &[3.0, 4.0]);
/// # Ok::<(), agglo_providers_dense::DenseMatrixProviderError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PointMatrixProvider {
    name: String,
    rows: usize,
    dimension: usize,
    values: Vec<f64>,
}

impl PointMatrixProvider {
    pub(crate) fn from_parts(
        name: impl Into<String>,
        rows: usize,
        dimension: usize,
        values: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(values.len(), rows.saturating_mul(dimension));
        Self {
            name: name.into(),
            rows,
            dimension,
            values,
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns `true` when no rows were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns the dimensionality of each row.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the underlying row-major matrix.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.values
    }

    /// Converts the loaded rows into a [`PointMatrix`].
    ///
    /// # Errors
    /// Returns [`DenseMatrixProviderError::Points`] when the rows are not a
    /// valid point set, for example when a coordinate is NaN.
    pub fn into_points(self) -> Result<PointMatrix, DenseMatrixProviderError> {
        Ok(PointMatrix::new(self.rows, self.dimension, self.values)?)
    }

    /// Loads data from an Arrow [`FixedSizeListArray`].
    ///
    /// # Errors
    /// Returns an error when the children are not floating point or when a
    /// row or value is null.
    pub fn try_from_fixed_size_list(
        name: impl Into<String>,
        array: &FixedSizeListArray,
    ) -> Result<Self, DenseMatrixProviderError> {
        let mut values = Vec::new();
        let dimension = append_fixed_size_list_values(array, None, 0, &mut values)?;
        Ok(Self::from_parts(name, array.len(), dimension, values))
    }

    /// Loads a Parquet column of `FixedSizeList<Float32 | Float64, D>` rows.
    ///
    /// # Errors
    /// Returns [`DenseMatrixProviderError::Io`] when the file cannot be
    /// opened plus every error of [`Self::try_from_parquet_reader`].
    pub fn try_from_parquet_path(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        column: &str,
    ) -> Result<Self, DenseMatrixProviderError> {
        let file = File::open(path)?;
        Self::try_from_parquet_reader(name, file, column)
    }

    /// Loads a Parquet column from any chunked reader.
    ///
    /// # Errors
    /// Returns an error when the column is missing, nullable, of the wrong
    /// type, or when batches disagree on the list width.
    #[instrument(name = "dense.parquet", err, skip(name, reader))]
    pub fn try_from_parquet_reader<R>(
        name: impl Into<String>,
        reader: R,
        column: &str,
    ) -> Result<Self, DenseMatrixProviderError>
    where
        R: ChunkReader + Send + 'static,
    {
        let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
        let mask = ProjectionMask::columns(builder.parquet_schema(), [column]);
        let reader = builder.with_projection(mask).build()?;
        let schema = reader.schema();
        let column_index =
            schema
                .index_of(column)
                .map_err(|_| DenseMatrixProviderError::ColumnNotFound {
                    column: column.to_owned(),
                })?;
        let dimension = validate_fixed_size_list_field(schema.field(column_index), column)?;
        let mut values = Vec::new();
        let mut rows = 0_usize;
        for batch in reader {
            let batch = batch?;
            let column_array = batch.column(column_index);
            let list = column_array
                .as_any()
                .downcast_ref::<FixedSizeListArray>()
                .ok_or_else(|| DenseMatrixProviderError::InvalidColumnType {
                    column: column.to_owned(),
                    actual: column_array.data_type().clone(),
                })?;
            append_fixed_size_list_values(list, Some(dimension), rows, &mut values)?;
            rows += list.len();
        }
        debug!(rows, dimension, "parquet column loaded");
        Ok(Self::from_parts(name, rows, dimension, values))
    }
}
