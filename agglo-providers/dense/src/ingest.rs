//! Helpers for ingesting fixed-size list arrays into row-major `f64` buffers.

use arrow_array::{
    Array, ArrowPrimitiveType, FixedSizeListArray, PrimitiveArray,
    types::{Float32Type, Float64Type},
};
use arrow_schema::{DataType, Field};

use crate::errors::DenseMatrixProviderError;

fn ensure_float(data_type: &DataType) -> Result<(), DenseMatrixProviderError> {
    match data_type {
        DataType::Float32 | DataType::Float64 => Ok(()),
        other => Err(DenseMatrixProviderError::InvalidListValueType {
            actual: other.clone(),
        }),
    }
}

fn width(width: i32) -> Result<usize, DenseMatrixProviderError> {
    usize::try_from(width).map_err(|_| DenseMatrixProviderError::InvalidDimension { actual: width })
}

/// Checks a schema field and returns the list width.
pub(crate) fn validate_fixed_size_list_field(
    field: &Field,
    column: &str,
) -> Result<usize, DenseMatrixProviderError> {
    match field.data_type() {
        DataType::FixedSizeList(child, declared) => {
            if field.is_nullable() || child.is_nullable() {
                return Err(DenseMatrixProviderError::NullableField {
                    column: column.to_owned(),
                    nullable_child: child.is_nullable(),
                });
            }
            ensure_float(child.data_type())?;
            width(*declared)
        }
        other => Err(DenseMatrixProviderError::InvalidColumnType {
            column: column.to_owned(),
            actual: other.clone(),
        }),
    }
}

/// Appends the rows of `array` to `out`, returning the list width.
///
/// `expected_dimension` is the width of earlier batches, if any.
pub(crate) fn append_fixed_size_list_values(
    array: &FixedSizeListArray,
    expected_dimension: Option<usize>,
    start_row: usize,
    out: &mut Vec<f64>,
) -> Result<usize, DenseMatrixProviderError> {
    ensure_float(&array.value_type())?;
    let dimension = width(array.value_length())?;
    if let Some(expected) = expected_dimension.filter(|&expected| expected != dimension) {
        return Err(DenseMatrixProviderError::InconsistentBatchDimension {
            expected,
            actual: dimension,
        });
    }
    copy_list_values(array, dimension, start_row, out)?;
    Ok(dimension)
}

pub(crate) fn copy_list_values(
    array: &FixedSizeListArray,
    dimension: usize,
    start_row: usize,
    out: &mut Vec<f64>,
) -> Result<(), DenseMatrixProviderError> {
    let rows = array.len();
    let additional = rows
        .checked_mul(dimension)
        .ok_or(DenseMatrixProviderError::CapacityOverflow { rows, dimension })?;
    out.reserve(additional);
    for row_index in 0..rows {
        let absolute_row = start_row + row_index;
        if array.is_null(row_index) {
            return Err(DenseMatrixProviderError::NullRow { row: absolute_row });
        }
        let row = array.value(row_index);
        let any = row.as_any();
        if let Some(floats) = any.downcast_ref::<PrimitiveArray<Float32Type>>() {
            copy_row(floats, dimension, absolute_row, out)?;
        } else if let Some(doubles) = any.downcast_ref::<PrimitiveArray<Float64Type>>() {
            copy_row(doubles, dimension, absolute_row, out)?;
        } else {
            return Err(DenseMatrixProviderError::InvalidListValueType {
                actual: row.data_type().clone(),
            });
        }
    }
    Ok(())
}

fn copy_row<T>(
    values: &PrimitiveArray<T>,
    dimension: usize,
    row: usize,
    out: &mut Vec<f64>,
) -> Result<(), DenseMatrixProviderError>
where
    T: ArrowPrimitiveType,
    T::Native: Into<f64>,
{
    if values.len() != dimension {
        return Err(DenseMatrixProviderError::InvalidRowLength {
            row,
            expected: dimension,
            actual: values.len(),
        });
    }
    if let Some(value_index) = (0..dimension).find(|&idx| values.is_null(idx)) {
        return Err(DenseMatrixProviderError::NullValue { row, value_index });
    }
    out.extend(values.values().iter().map(|&value| value.into()));
    Ok(())
}
