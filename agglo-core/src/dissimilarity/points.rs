//! Dense row-major point storage.

use crate::error::{LinkageError, Result};

/// `rows × dimension` coordinates stored row-major.
///
/// # Examples
/// ```
/// use agglo_core::PointMatrix;
///
/// let points = PointMatrix::new(2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])?;
/// assert_eq!(points.row(1), &[3.0, 4.0, 5.0]);
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PointMatrix {
    rows: usize,
    dimension: usize,
    values: Vec<f64>,
}

impl PointMatrix {
    /// Wraps a row-major buffer of `rows` points with `dimension`
    /// coordinates each.
    ///
    /// # Errors
    /// Returns [`LinkageError::ZeroDimension`] when `dimension` is zero,
    /// [`LinkageError::LengthMismatch`] when the buffer is not
    /// `rows * dimension` long and [`LinkageError::NanInput`] when a
    /// coordinate is NaN.
    pub fn new(rows: usize, dimension: usize, values: Vec<f64>) -> Result<Self> {
        if dimension == 0 {
            return Err(LinkageError::ZeroDimension);
        }
        let expected = rows * dimension;
        if values.len() != expected {
            return Err(LinkageError::LengthMismatch {
                len: values.len(),
                expected,
            });
        }
        if let Some(index) = values.iter().position(|value| value.is_nan()) {
            return Err(LinkageError::NanInput { index });
        }
        Ok(Self {
            rows,
            dimension,
            values,
        })
    }

    /// Builds a matrix from equally sized rows.
    ///
    /// # Errors
    /// Returns [`LinkageError::LengthMismatch`] when a row's length differs
    /// from the first row's, plus the errors of [`PointMatrix::new`].
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let dimension = rows.first().map_or(0, |row| row.as_ref().len());
        let mut values = Vec::with_capacity(rows.len() * dimension);
        for row in rows {
            let row = row.as_ref();
            if row.len() != dimension {
                return Err(LinkageError::LengthMismatch {
                    len: row.len(),
                    expected: dimension,
                });
            }
            values.extend_from_slice(row);
        }
        Self::new(rows.len(), dimension, values)
    }

    /// Returns the number of points.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of coordinates per point.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the coordinates of point `index`.
    #[inline]
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.dimension;
        &self.values[start..start + self.dimension]
    }

    /// Borrows row `lower` immutably and row `upper` mutably.
    pub(crate) fn row_pair_mut(&mut self, lower: usize, upper: usize) -> (&[f64], &mut [f64]) {
        debug_assert!(lower < upper, "row pair must be ordered");
        let dimension = self.dimension;
        let (head, tail) = self.values.split_at_mut(upper * dimension);
        let start = lower * dimension;
        (&head[start..start + dimension], &mut tail[..dimension])
    }

    /// Returns the row-major coordinate buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}
