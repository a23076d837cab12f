//! Heap-based generic linkage on a condensed matrix.
//!
//! Every row `i < n - 1` caches a candidate nearest neighbour `neighbor[i]`
//! among the active points after it, and the heap orders rows by the cached
//! distance. A cache may go stale when merges raise distances; stale rows
//! are detected when they reach the top of the heap and recomputed there.

use tracing::instrument;

use crate::{
    active_set::ActiveSet,
    condensed::CondensedMatrix,
    dendrogram::{ClusterResult, Labelling},
    error::Result,
    heap::IndexedMinHeap,
    method::LinkageMethod,
    update::{
        AverageRule, CentroidRule, CompleteRule, Drift, MedianRule, SingleRule, UpdateRule,
        WardRule, WeightedRule,
    },
};

use super::{ensure_points, nearest};

/// Runs the generic algorithm on a condensed matrix.
///
/// Handles every [`LinkageMethod`], including the non-monotone centroid and
/// median methods. The recurrence is applied to the values as given, so
/// Ward, centroid and median expect squared Euclidean input. The matrix is
/// overwritten.
///
/// # Errors
/// Returns [`LinkageError::TooFewPoints`](crate::LinkageError::TooFewPoints)
/// for fewer than two points and
/// [`LinkageError::NanDistance`](crate::LinkageError::NanDistance) when a
/// merge distance is NaN.
///
/// # Examples
/// ```
/// use agglo_core::{CondensedMatrix, Labelling, LinkageMethod, generic_linkage};
///
/// let mut matrix = CondensedMatrix::new(3, vec![1.0, 9.0, 4.0])?;
/// let result = generic_linkage(&mut matrix, LinkageMethod::Median)?;
/// assert_eq!(result.labelling(), Labelling::Nodes);
/// let dendrogram = result.into_dendrogram();
/// assert_eq!(dendrogram.distances().collect::<Vec<_>>(), vec![1.0, 6.25]);
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
#[instrument(
    name = "core.generic",
    err,
    skip(matrix),
    fields(points = matrix.point_count(), method = %method),
)]
pub fn generic_linkage(
    matrix: &mut CondensedMatrix,
    method: LinkageMethod,
) -> Result<ClusterResult> {
    ensure_points(matrix.point_count())?;
    match method {
        LinkageMethod::Single => run::<SingleRule>(matrix),
        LinkageMethod::Complete => run::<CompleteRule>(matrix),
        LinkageMethod::Average => run::<AverageRule>(matrix),
        LinkageMethod::Weighted => run::<WeightedRule>(matrix),
        LinkageMethod::Ward | LinkageMethod::WardD => run::<WardRule>(matrix),
        LinkageMethod::Centroid => run::<CentroidRule>(matrix),
        LinkageMethod::Median => run::<MedianRule>(matrix),
    }
}

fn run<R: UpdateRule>(matrix: &mut CondensedMatrix) -> Result<ClusterResult> {
    let n = matrix.point_count();
    let last = n - 1;
    let mut result = ClusterResult::new(n, Labelling::Nodes);
    let mut active = ActiveSet::new(n);
    let mut members = vec![1.0_f64; n];
    let mut row_repr: Vec<usize> = (0..n).collect();

    let mut neighbor = vec![0usize; last];
    let mut mindist = vec![f64::INFINITY; last];
    for i in 0..last {
        if let Some((nn, min)) = nearest(result.len(), i + 1..n, |j| matrix.get(i, j))? {
            neighbor[i] = nn;
            mindist[i] = min;
        }
    }
    let mut heap = IndexedMinHeap::new(mindist);
    heap.heapify();

    for step in 0..last {
        let mut idx1 = heap.argmin();
        if R::DRIFT != Drift::NonIncreasing {
            while heap.value(idx1) < matrix.get(idx1, neighbor[idx1]) {
                #[cfg(feature = "metrics")]
                metrics::counter!("agglo_generic_revalidations_total").increment(1);
                if let Some((nn, min)) =
                    nearest(result.len(), active.iter_after(idx1), |j| matrix.get(idx1, j))?
                {
                    neighbor[idx1] = nn;
                    heap.update_geq(idx1, min);
                }
                idx1 = heap.argmin();
            }
        }

        heap.heap_pop();
        let idx2 = neighbor[idx1];
        let merge_dist = heap.value(idx1);
        result.append(row_repr[idx1], row_repr[idx2], merge_dist)?;

        let rule = R::prepare(members[idx1], members[idx2], merge_dist);
        if R::TRACKS_SIZES {
            members[idx2] += members[idx1];
        }
        active.remove(idx1);
        row_repr[idx2] = n + step;

        let mut cursor = active.iter().peekable();

        // Rows before the merged pair: both distances sit in column position.
        while let Some(j) = cursor.next_if(|&j| j < idx1) {
            let updated = rule.apply(matrix.get(j, idx1), matrix.get(j, idx2), members[j]);
            matrix.set(j, idx2, updated);
            if R::DRIFT == Drift::Unbounded && updated < heap.value(j) {
                heap.update_leq(j, updated);
                neighbor[j] = idx2;
            } else if neighbor[j] == idx1 {
                neighbor[j] = idx2;
            }
        }

        // Rows between the pair: they never pointed at `idx1`.
        while let Some(j) = cursor.next_if(|&j| j < idx2) {
            let updated = rule.apply(matrix.get(idx1, j), matrix.get(j, idx2), members[j]);
            matrix.set(j, idx2, updated);
            if R::DRIFT != Drift::NonDecreasing && updated < heap.value(j) {
                heap.update_leq(j, updated);
                neighbor[j] = idx2;
            }
        }

        // Columns after the pair belong to the surviving row `idx2`.
        if idx2 < last {
            let survivor_min = match R::DRIFT {
                Drift::NonIncreasing => Some((neighbor[idx2], heap.value(idx2))),
                _ => None,
            };
            let mut best = survivor_min;
            for j in active.iter_after(idx2) {
                let updated = rule.apply(matrix.get(idx1, j), matrix.get(idx2, j), members[j]);
                matrix.set(idx2, j, updated);
                if best.is_none_or(|(_, min)| updated < min) {
                    best = Some((j, updated));
                }
            }
            match (R::DRIFT, best) {
                (Drift::NonDecreasing, _) | (_, None) => {}
                (Drift::NonIncreasing, Some((nn, min))) => {
                    neighbor[idx2] = nn;
                    heap.update_leq(idx2, min);
                }
                (_, Some((nn, min))) => {
                    neighbor[idx2] = nn;
                    heap.update(idx2, min);
                }
            }
        }
    }
    Ok(result)
}
