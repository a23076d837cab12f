//! Condensed (upper-triangular) pairwise dissimilarity storage.

use crate::{
    dissimilarity::Dissimilarity,
    error::{LinkageError, Result},
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Returns the flat index of the pair `(row, col)` in a condensed matrix of
/// `n` points.
///
/// Requires `row < col < n`.
///
/// # Examples
/// ```
/// use agglo_core::condensed_offset;
///
/// assert_eq!(condensed_offset(4, 0, 1), 0);
/// assert_eq!(condensed_offset(4, 1, 2), 3);
/// assert_eq!(condensed_offset(4, 2, 3), 5);
/// ```
#[inline]
#[must_use]
pub fn condensed_offset(n: usize, row: usize, col: usize) -> usize {
    debug_assert!(row < col, "condensed pair must satisfy row < col");
    debug_assert!(col < n, "column {col} out of range for {n} points");
    (((2 * n - 3 - row) * row) >> 1) + col - 1
}

/// Returns the number of entries stored for `n` points.
#[must_use]
pub const fn condensed_len(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Pairwise dissimilarities between `n` items stored as the strict upper
/// triangle of the full matrix, row by row.
///
/// Linkage drivers overwrite entries in place as clusters merge; cells that
/// belong to merged-away items become meaningless.
///
/// # Examples
/// ```
/// use agglo_core::CondensedMatrix;
///
/// let matrix = CondensedMatrix::new(3, vec![1.0, 4.0, 2.0])?;
/// assert_eq!(matrix.get(0, 2), 4.0);
/// assert_eq!(matrix.get_sym(2, 1), 2.0);
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CondensedMatrix {
    points: usize,
    values: Vec<f64>,
}

impl CondensedMatrix {
    /// Wraps a condensed buffer describing `points` items.
    ///
    /// # Errors
    /// Returns [`LinkageError::LengthMismatch`] when `values` does not hold
    /// `points * (points - 1) / 2` entries and [`LinkageError::NanInput`]
    /// when any entry is NaN.
    pub fn new(points: usize, values: Vec<f64>) -> Result<Self> {
        let expected = condensed_len(points);
        if values.len() != expected {
            return Err(LinkageError::LengthMismatch {
                len: values.len(),
                expected,
            });
        }
        if let Some(index) = values.iter().position(|value| value.is_nan()) {
            return Err(LinkageError::NanInput { index });
        }
        Ok(Self { points, values })
    }

    /// Builds a matrix by evaluating `distance(row, col)` for every pair
    /// with `row < col`.
    ///
    /// # Errors
    /// Returns [`LinkageError::NanInput`] when `distance` yields NaN.
    pub fn from_fn<F>(points: usize, mut distance: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut values = Vec::with_capacity(condensed_len(points));
        for row in 0..points {
            for col in (row + 1)..points {
                values.push(distance(row, col));
            }
        }
        Self::new(points, values)
    }

    /// Computes the pairwise matrix of a point set under its configured
    /// metric, with the metric's post-processing applied to each entry.
    ///
    /// Rows are evaluated in parallel when the `parallel` feature is on.
    ///
    /// # Errors
    /// Returns [`LinkageError::NanInput`] when the metric yields NaN for some
    /// pair.
    ///
    /// # Examples
    /// ```
    /// use agglo_core::{CondensedMatrix, Dissimilarity, Metric, PointMatrix};
    ///
    /// let points = PointMatrix::new(3, 1, vec![0.0, 3.0, 7.0])?;
    /// let dissimilarity = Dissimilarity::new(points, Metric::Euclidean)?;
    /// let matrix = CondensedMatrix::from_dissimilarity(&dissimilarity)?;
    /// assert_eq!(matrix.get(0, 1), 3.0);
    /// assert_eq!(matrix.get(1, 2), 4.0);
    /// # Ok::<(), agglo_core::LinkageError>(())
    /// ```
    pub fn from_dissimilarity(dissimilarity: &Dissimilarity) -> Result<Self> {
        let points = dissimilarity.point_count();
        let postprocess = dissimilarity.postprocess();
        let row = |i: usize| -> Vec<f64> {
            ((i + 1)..points)
                .map(|j| postprocess.apply(dissimilarity.distance(i, j)))
                .collect()
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<f64>> = (0..points).into_par_iter().map(row).collect();
        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<f64>> = (0..points).map(row).collect();

        Self::new(points, rows.concat())
    }

    /// Returns the number of items described by the matrix.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points
    }

    /// Returns the number of stored pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the matrix stores no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads the entry for `row < col`.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[condensed_offset(self.points, row, col)]
    }

    /// Reads the entry for the unordered pair `{a, b}` with `a != b`.
    #[inline]
    #[must_use]
    pub fn get_sym(&self, a: usize, b: usize) -> f64 {
        if a < b { self.get(a, b) } else { self.get(b, a) }
    }

    /// Returns a mutable reference to the entry for `row < col`.
    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        &mut self.values[condensed_offset(self.points, row, col)]
    }

    /// Overwrites the entry for `row < col`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        *self.get_mut(row, col) = value;
    }

    /// Squares every entry.
    pub fn square_in_place(&mut self) {
        for value in &mut self.values {
            *value *= *value;
        }
    }

    /// Returns the stored entries in condensed order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Consumes the matrix and returns its condensed buffer.
    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(7)]
    fn offsets_enumerate_pairs_in_row_order(#[case] n: usize) {
        let mut expected = 0;
        for row in 0..n {
            for col in (row + 1)..n {
                assert_eq!(condensed_offset(n, row, col), expected);
                expected += 1;
            }
        }
        assert_eq!(expected, condensed_len(n));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(2, 1)]
    #[case(5, 10)]
    fn condensed_len_matches_pair_count(#[case] n: usize, #[case] expected: usize) {
        assert_eq!(condensed_len(n), expected);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = CondensedMatrix::new(3, vec![1.0, 2.0]).expect_err("length must match");
        assert_eq!(err, LinkageError::LengthMismatch { len: 2, expected: 3 });
    }

    #[test]
    fn rejects_nan_entries() {
        let err = CondensedMatrix::new(3, vec![1.0, f64::NAN, 2.0]).expect_err("NaN rejected");
        assert_eq!(err, LinkageError::NanInput { index: 1 });
    }

    #[test]
    fn from_fn_visits_upper_triangle() {
        let matrix = CondensedMatrix::from_fn(4, |row, col| (10 * row + col) as f64)
            .expect("finite distances");
        assert_eq!(matrix.as_slice(), &[1.0, 2.0, 3.0, 12.0, 13.0, 23.0]);
    }

    #[test]
    fn set_and_square_update_entries() {
        let mut matrix = CondensedMatrix::new(3, vec![1.0, 2.0, 3.0]).expect("valid");
        matrix.set(1, 2, 5.0);
        matrix.square_in_place();
        assert_eq!(matrix.into_values(), vec![1.0, 4.0, 25.0]);
    }
}
