//! Single linkage through a minimum spanning tree (Rohlf's algorithm).
//!
//! The tree grows from point 0; `frontier[i]` holds the distance from point
//! `i` to the nearest point already in the tree. Each step adds the closest
//! outside point and relaxes the frontier against it. Events are recorded
//! between point indices in tree order, so the dendrogram is produced by
//! sorting and relabelling.

use tracing::instrument;

use crate::{
    active_set::ActiveSet,
    condensed::CondensedMatrix,
    dendrogram::{ClusterResult, Labelling},
    dissimilarity::Dissimilarity,
    error::{LinkageError, Result},
};

use super::ensure_points;

/// Runs single linkage on a condensed matrix.
///
/// The matrix is only read.
///
/// # Errors
/// Returns [`LinkageError::TooFewPoints`](crate::LinkageError::TooFewPoints)
/// for fewer than two points and
/// [`LinkageError::NanDistance`](crate::LinkageError::NanDistance) as soon
/// as a distance scanned while growing the tree is NaN.
///
/// # Examples
/// ```
/// use agglo_core::{CondensedMatrix, mst_linkage};
///
/// let matrix = CondensedMatrix::new(3, vec![2.0, 5.0, 1.0])?;
/// let dendrogram = mst_linkage(&matrix)?.into_dendrogram();
/// assert_eq!(dendrogram.distances().collect::<Vec<_>>(), vec![1.0, 2.0]);
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
#[instrument(name = "core.mst", err, skip(matrix), fields(points = matrix.point_count()))]
pub fn mst_linkage(matrix: &CondensedMatrix) -> Result<ClusterResult> {
    let n = ensure_points(matrix.point_count())?;
    grow_tree(n, |a, b| matrix.get_sym(a, b))
}

/// Runs single linkage directly on points under the dissimilarity's metric.
///
/// Distances are the metric's raw kernel values; apply
/// [`Dissimilarity::postprocess`] to the result.
///
/// # Errors
/// Same as [`mst_linkage`].
#[instrument(name = "core.mst_vector", err, skip(dissimilarity), fields(points = dissimilarity.point_count()))]
pub fn mst_linkage_vector(dissimilarity: &Dissimilarity) -> Result<ClusterResult> {
    let n = ensure_points(dissimilarity.point_count())?;
    grow_tree(n, |a, b| dissimilarity.distance(a, b))
}

fn grow_tree<F>(n: usize, distance: F) -> Result<ClusterResult>
where
    F: Fn(usize, usize) -> f64,
{
    let mut result = ClusterResult::new(n, Labelling::Points);
    let mut active = ActiveSet::new(n);
    let mut frontier = vec![f64::INFINITY; n];

    let mut added = 0;
    for _ in 0..n - 1 {
        active.remove(added);
        let mut next = active.start();
        let mut min = f64::INFINITY;
        let mut first = true;
        for i in active.iter() {
            let d = distance(i, added);
            if d.is_nan() {
                return Err(LinkageError::NanDistance { step: result.len() });
            }
            if d < frontier[i] {
                frontier[i] = d;
            }
            if first || frontier[i] < min {
                min = frontier[i];
                next = i;
                first = false;
            }
        }
        result.append(added, next, min)?;
        added = next;
    }
    Ok(result)
}
