//! Generic linkage on raw points for methods with a closed-form merge.
//!
//! Ward, centroid and median linkage can represent a merged cluster by a
//! single point, so the distance from it to any other cluster is computed
//! afresh instead of through a recurrence. Two layouts are provided: the
//! in-place scheme overwrites the surviving point, the alternative scheme
//! writes every merged cluster to a new synthetic point `n + i`.

use tracing::instrument;

use crate::{
    active_set::ActiveSet,
    dendrogram::{ClusterResult, Labelling},
    dissimilarity::{Dissimilarity, Metric},
    error::{LinkageError, Result},
    heap::IndexedMinHeap,
    method::{Algorithm, LinkageMethod},
};

use super::{ensure_points, ensure_supported, nearest};

/// Point merge and distance rules of one vector-space method.
trait VectorRule {
    /// Whether a merge can only move the survivor away from rows before it,
    /// so their cached neighbours are invalidated rather than compared.
    const MONOTONE: bool;

    fn initial(d: &Dissimilarity, i: usize, j: usize) -> f64 {
        d.sqeuclidean(i, j)
    }

    fn convert_initial(min: f64) -> f64 {
        min
    }

    fn distance(d: &Dissimilarity, i: usize, j: usize) -> f64;

    fn distance_extended(d: &Dissimilarity, i: usize, j: usize) -> f64;

    fn merge_inplace(d: &mut Dissimilarity, i: usize, j: usize);

    fn merge(d: &mut Dissimilarity, i: usize, j: usize, new: usize);
}

struct Ward;

impl VectorRule for Ward {
    const MONOTONE: bool = true;

    fn initial(d: &Dissimilarity, i: usize, j: usize) -> f64 {
        d.ward_initial(i, j)
    }

    fn convert_initial(min: f64) -> f64 {
        Dissimilarity::ward_initial_conversion(min)
    }

    fn distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
        d.ward(i, j)
    }

    fn distance_extended(d: &Dissimilarity, i: usize, j: usize) -> f64 {
        d.ward_extended(i, j)
    }

    fn merge_inplace(d: &mut Dissimilarity, i: usize, j: usize) {
        d.merge_inplace(i, j);
    }

    fn merge(d: &mut Dissimilarity, i: usize, j: usize, new: usize) {
        d.merge(i, j, new);
    }
}

struct Centroid;

impl VectorRule for Centroid {
    const MONOTONE: bool = false;

    fn distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
        d.sqeuclidean(i, j)
    }

    fn distance_extended(d: &Dissimilarity, i: usize, j: usize) -> f64 {
        d.sqeuclidean_extended(i, j)
    }

    fn merge_inplace(d: &mut Dissimilarity, i: usize, j: usize) {
        d.merge_inplace(i, j);
    }

    fn merge(d: &mut Dissimilarity, i: usize, j: usize, new: usize) {
        d.merge(i, j, new);
    }
}

struct Median;

impl VectorRule for Median {
    const MONOTONE: bool = false;

    fn distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
        d.sqeuclidean(i, j)
    }

    fn distance_extended(d: &Dissimilarity, i: usize, j: usize) -> f64 {
        d.sqeuclidean_extended(i, j)
    }

    fn merge_inplace(d: &mut Dissimilarity, i: usize, j: usize) {
        d.merge_inplace_weighted(i, j);
    }

    fn merge(d: &mut Dissimilarity, i: usize, j: usize, new: usize) {
        d.merge_weighted(i, j, new);
    }
}

fn validate(d: &Dissimilarity, method: LinkageMethod, algorithm: Algorithm) -> Result<()> {
    ensure_supported(method, algorithm)?;
    if !matches!(d.metric(), Metric::Euclidean) {
        return Err(LinkageError::UnsupportedMetric {
            metric: d.metric().as_str(),
            method,
        });
    }
    ensure_points(d.point_count())?;
    Ok(())
}

/// Runs Ward, centroid or median linkage on Euclidean points, overwriting
/// the surviving point of each merge with the merged cluster's
/// representative.
///
/// Ward distances are half the squared Ward objective increase and
/// centroid/median distances are squared; apply
/// [`Postprocess::SqrtDouble`](crate::Postprocess::SqrtDouble) or
/// [`Postprocess::Sqrt`](crate::Postprocess::Sqrt) respectively.
///
/// # Errors
/// Returns [`LinkageError::UnsupportedMethod`] for other methods,
/// [`LinkageError::UnsupportedMetric`] unless the metric is Euclidean, both
/// before any merge, plus [`LinkageError::TooFewPoints`] and
/// [`LinkageError::NanDistance`].
///
/// # Examples
/// ```
/// use agglo_core::{
///     Dissimilarity, LinkageMethod, Metric, PointMatrix, Postprocess, generic_linkage_vector,
/// };
///
/// let points = PointMatrix::new(3, 1, vec![0.0, 2.0, 5.0])?;
/// let mut dissimilarity = Dissimilarity::new(points, Metric::Euclidean)?;
/// let mut result = generic_linkage_vector(&mut dissimilarity, LinkageMethod::Centroid)?;
/// result.postprocess(Postprocess::Sqrt);
/// let dendrogram = result.into_dendrogram();
/// assert_eq!(dendrogram.distances().collect::<Vec<_>>(), vec![2.0, 4.0]);
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
#[instrument(
    name = "core.vector_in_place",
    err,
    skip(dissimilarity),
    fields(points = dissimilarity.point_count(), method = %method),
)]
pub fn generic_linkage_vector(
    dissimilarity: &mut Dissimilarity,
    method: LinkageMethod,
) -> Result<ClusterResult> {
    validate(dissimilarity, method, Algorithm::VectorInPlace)?;
    match method {
        LinkageMethod::Ward => in_place::<Ward>(dissimilarity),
        LinkageMethod::Centroid => in_place::<Centroid>(dissimilarity),
        _ => in_place::<Median>(dissimilarity),
    }
}

fn in_place<R: VectorRule>(d: &mut Dissimilarity) -> Result<ClusterResult> {
    let n = d.point_count();
    let last = n - 1;
    let mut result = ClusterResult::new(n, Labelling::Nodes);
    let mut active = ActiveSet::new(n);
    let mut row_repr: Vec<usize> = (0..n).collect();

    let mut neighbor = vec![0usize; last];
    let mut mindist = vec![f64::INFINITY; last];
    for i in 0..last {
        if let Some((nn, min)) = nearest(result.len(), i + 1..n, |j| R::initial(d, i, j))? {
            neighbor[i] = nn;
            mindist[i] = R::convert_initial(min);
        }
    }
    let mut heap = IndexedMinHeap::new(mindist);
    heap.heapify();

    for step in 0..last {
        let mut idx1 = heap.argmin();
        while active.is_inactive(neighbor[idx1]) {
            if let Some((nn, min)) =
                nearest(result.len(), active.iter_after(idx1), |j| R::distance(d, idx1, j))?
            {
                neighbor[idx1] = nn;
                heap.update_geq(idx1, min);
            }
            idx1 = heap.argmin();
        }

        heap.heap_pop();
        let idx2 = neighbor[idx1];
        result.append(row_repr[idx1], row_repr[idx2], heap.value(idx1))?;
        R::merge_inplace(d, idx1, idx2);
        row_repr[idx2] = n + step;
        active.remove(idx1);

        let mut cursor = active.iter().peekable();
        if R::MONOTONE {
            // A neighbour pointing at the survivor may now be too close;
            // pointing it at the removed row forces a recomputation.
            while let Some(j) = cursor.next_if(|&j| j < idx1) {
                if neighbor[j] == idx2 {
                    neighbor[j] = idx1;
                }
            }
        }
        while let Some(j) = cursor.next_if(|&j| j < idx2) {
            let updated = R::distance(d, j, idx2);
            if updated < heap.value(j) {
                heap.update_leq(j, updated);
                neighbor[j] = idx2;
            } else if neighbor[j] == idx2 {
                neighbor[j] = idx1;
            }
        }

        if idx2 < last {
            if let Some((nn, min)) =
                nearest(result.len(), active.iter_after(idx2), |j| R::distance(d, idx2, j))?
            {
                neighbor[idx2] = nn;
                heap.update(idx2, min);
            }
        }
    }
    Ok(result)
}

/// Runs Ward, centroid or median linkage on Euclidean points, writing each
/// merged cluster's representative to a new synthetic point `n + i`.
///
/// Every cluster keeps its candidate nearest neighbour among the clusters
/// with a smaller label. Distances need the same post-processing as
/// [`generic_linkage_vector`].
///
/// # Errors
/// Same as [`generic_linkage_vector`].
#[instrument(
    name = "core.vector_alternative",
    err,
    skip(dissimilarity),
    fields(points = dissimilarity.point_count(), method = %method),
)]
pub fn generic_linkage_vector_alternative(
    dissimilarity: &mut Dissimilarity,
    method: LinkageMethod,
) -> Result<ClusterResult> {
    validate(dissimilarity, method, Algorithm::VectorAlternative)?;
    dissimilarity.reserve_synthetic();
    match method {
        LinkageMethod::Ward => alternative::<Ward>(dissimilarity),
        LinkageMethod::Centroid => alternative::<Centroid>(dissimilarity),
        _ => alternative::<Median>(dissimilarity),
    }
}

fn alternative<R: VectorRule>(d: &mut Dissimilarity) -> Result<ClusterResult> {
    let n = d.point_count();
    let last = n - 1;
    let nodes = 2 * n - 1;
    let mut result = ClusterResult::new(n, Labelling::Nodes);
    let mut active = ActiveSet::new(nodes);

    let mut neighbor = vec![0usize; nodes - 1];
    let mut mindist = vec![f64::INFINITY; nodes - 1];
    for i in 1..n {
        if let Some((nn, min)) = nearest(result.len(), 0..i, |j| R::initial(d, i, j))? {
            neighbor[i] = nn;
            mindist[i] = R::convert_initial(min);
        }
    }
    // Node 0 has no smaller partner and stays out of the heap.
    let mut heap = IndexedMinHeap::with_offset(mindist, last, 1);
    heap.heapify();

    for node in n..nodes {
        let mut idx1 = heap.argmin();
        while active.is_inactive(neighbor[idx1]) {
            let candidates = active.iter().take_while(|&j| j < idx1);
            if let Some((nn, min)) =
                nearest(result.len(), candidates, |j| R::distance_extended(d, idx1, j))?
            {
                neighbor[idx1] = nn;
                heap.update_geq(idx1, min);
            }
            idx1 = heap.argmin();
        }

        let idx2 = neighbor[idx1];
        active.remove(idx1);
        active.remove(idx2);
        result.append(idx1, idx2, heap.value(idx1))?;

        if node < nodes - 1 {
            R::merge(d, idx1, idx2, node);
            let candidates = active.iter().take_while(|&j| j < node);
            if let Some((nn, min)) =
                nearest(result.len(), candidates, |j| R::distance_extended(d, j, node))?
            {
                neighbor[node] = nn;
                // The smallest active node must leave the heap; `idx1` hands
                // its slot to the new node.
                if idx2 < active.start() {
                    heap.remove(active.start());
                } else {
                    heap.remove(idx2);
                }
                heap.replace(idx1, node, min);
            }
        }
    }
    Ok(result)
}
