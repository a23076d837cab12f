//! Merge recording and the canonical dendrogram produced by every driver.
//!
//! Drivers append [`MergeEvent`]s to a [`ClusterResult`] in the order they
//! perform merges. [`ClusterResult::into_dendrogram`] turns them into the
//! linkage-matrix convention: node `n + i` is the cluster created by step
//! `i`, children are stored smaller label first, and each step records the
//! size of the cluster it creates.

use std::cmp::Ordering;

use crate::{
    error::{LinkageError, Result},
    union_find::UnionFind,
};

/// Monotone transform applied to every merge distance once a run completes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Postprocess {
    /// Leave distances unchanged.
    Identity,
    /// Square root.
    Sqrt,
    /// Square root of twice the value.
    SqrtDouble,
    /// Power `1 / p`.
    Power(f64),
    /// Add one.
    PlusOne,
    /// Divide by a constant.
    Divide(f64),
}

impl Postprocess {
    /// Applies the transform to `distance`.
    ///
    /// # Examples
    /// ```
    /// use agglo_core::Postprocess;
    ///
    /// assert_eq!(Postprocess::SqrtDouble.apply(8.0), 4.0);
    /// assert_eq!(Postprocess::Divide(4.0).apply(2.0), 0.5);
    /// ```
    #[inline]
    #[must_use]
    pub fn apply(self, distance: f64) -> f64 {
        match self {
            Self::Identity => distance,
            Self::Sqrt => distance.sqrt(),
            Self::SqrtDouble => (2.0 * distance).sqrt(),
            Self::Power(p) => distance.powf(p.recip()),
            Self::PlusOne => distance + 1.0,
            Self::Divide(divisor) => distance / divisor,
        }
    }
}

/// One merge as performed by a driver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeEvent {
    left: usize,
    right: usize,
    distance: f64,
}

impl MergeEvent {
    /// Returns the first merged index.
    #[rustfmt::skip]
    #[must_use]
    pub fn left(&self) -> usize { self.left }

    /// Returns the second merged index.
    #[rustfmt::skip]
    #[must_use]
    pub fn right(&self) -> usize { self.right }

    /// Returns the merge distance.
    #[rustfmt::skip]
    #[must_use]
    pub fn distance(&self) -> f64 { self.distance }
}

/// What the indices of recorded [`MergeEvent`]s refer to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Labelling {
    /// Original point indices; any point of a cluster may stand for it and
    /// events may be out of distance order.
    Points,
    /// Dendrogram node labels, recorded in dendrogram order.
    Nodes,
}

/// Merge events collected during a run.
///
/// # Examples
/// ```
/// use agglo_core::{ClusterResult, Labelling, Postprocess};
///
/// let mut result = ClusterResult::new(3, Labelling::Points);
/// result.append(1, 2, 4.0)?;
/// result.append(0, 1, 1.0)?;
/// result.postprocess(Postprocess::Sqrt);
/// let dendrogram = result.into_dendrogram();
/// assert_eq!(
///     dendrogram.to_linkage_matrix(),
///     vec![[0.0, 1.0, 1.0, 2.0], [2.0, 3.0, 2.0, 3.0]]
/// );
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ClusterResult {
    points: usize,
    labelling: Labelling,
    events: Vec<MergeEvent>,
    postprocessed: bool,
}

impl ClusterResult {
    /// Creates an empty result for a run over `points` items.
    #[must_use]
    pub fn new(points: usize, labelling: Labelling) -> Self {
        Self {
            points,
            labelling,
            events: Vec::with_capacity(points.saturating_sub(1)),
            postprocessed: false,
        }
    }

    /// Records a merge.
    ///
    /// # Errors
    /// Returns [`LinkageError::NanDistance`] when `distance` is NaN.
    pub fn append(&mut self, left: usize, right: usize, distance: f64) -> Result<()> {
        if distance.is_nan() {
            return Err(LinkageError::NanDistance {
                step: self.events.len(),
            });
        }
        self.events.push(MergeEvent {
            left,
            right,
            distance,
        });
        Ok(())
    }

    /// Applies `postprocess` to every recorded distance.
    pub fn postprocess(&mut self, postprocess: Postprocess) {
        debug_assert!(!self.postprocessed, "distances post-processed twice");
        self.postprocessed = true;
        if postprocess == Postprocess::Identity {
            return;
        }
        for event in &mut self.events {
            event.distance = postprocess.apply(event.distance);
        }
    }

    /// Returns the recorded events in production order.
    #[must_use]
    pub fn events(&self) -> &[MergeEvent] {
        &self.events
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the labelling of the recorded events.
    #[must_use]
    pub fn labelling(&self) -> Labelling {
        self.labelling
    }

    /// Converts the events into canonical dendrogram steps.
    ///
    /// Point-labelled events are stably sorted by distance and relabelled
    /// through a [`UnionFind`]; node-labelled events are taken as they are.
    ///
    /// # Panics
    /// Panics when a node-labelled event names a cluster node that no
    /// earlier event created, or a point-labelled event names a point
    /// outside `0..n`.
    #[must_use]
    pub fn into_dendrogram(self) -> Dendrogram {
        let n = self.points;
        let mut events = self.events;
        let mut steps: Vec<LinkageStep> = Vec::with_capacity(events.len());
        let size_of = |steps: &[LinkageStep], node: usize| {
            if node < n { 1 } else { steps[node - n].size }
        };
        match self.labelling {
            Labelling::Points => {
                events.sort_by(|a, b| {
                    a.distance
                        .partial_cmp(&b.distance)
                        .unwrap_or(Ordering::Equal)
                });
                let mut sets = UnionFind::new(n);
                for event in events {
                    let left = sets.find(event.left);
                    let right = sets.find(event.right);
                    let size = size_of(&steps, left) + size_of(&steps, right);
                    sets.union(left, right);
                    steps.push(LinkageStep::new(left, right, event.distance, size));
                }
            }
            Labelling::Nodes => {
                for event in events {
                    let size = size_of(&steps, event.left) + size_of(&steps, event.right);
                    steps.push(LinkageStep::new(event.left, event.right, event.distance, size));
                }
            }
        }
        Dendrogram { points: n, steps }
    }
}

/// One row of the linkage matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkageStep {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

impl LinkageStep {
    fn new(a: usize, b: usize, distance: f64, size: usize) -> Self {
        Self {
            left: a.min(b),
            right: a.max(b),
            distance,
            size,
        }
    }

    /// Returns the smaller child label.
    #[rustfmt::skip]
    #[must_use]
    pub fn left(&self) -> usize { self.left }

    /// Returns the larger child label.
    #[rustfmt::skip]
    #[must_use]
    pub fn right(&self) -> usize { self.right }

    /// Returns the merge distance.
    #[rustfmt::skip]
    #[must_use]
    pub fn distance(&self) -> f64 { self.distance }

    /// Returns the number of points in the merged cluster.
    #[rustfmt::skip]
    #[must_use]
    pub fn size(&self) -> usize { self.size }
}

/// Binary merge tree over `n` points with `n - 1` steps.
#[derive(Clone, Debug, PartialEq)]
pub struct Dendrogram {
    points: usize,
    steps: Vec<LinkageStep>,
}

impl Dendrogram {
    /// Returns the merge steps; step `i` creates node `n + i`.
    #[must_use]
    pub fn steps(&self) -> &[LinkageStep] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` when the dendrogram has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the number of clustered points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points
    }

    /// Iterates over the merge distances in step order.
    pub fn distances(&self) -> impl Iterator<Item = f64> + '_ {
        self.steps.iter().map(LinkageStep::distance)
    }

    /// Returns the size of the final cluster.
    #[must_use]
    pub fn root_size(&self) -> Option<usize> {
        self.steps.last().map(LinkageStep::size)
    }

    /// Returns `true` when merge distances never decrease.
    #[must_use]
    pub fn is_monotone(&self) -> bool {
        self.steps
            .windows(2)
            .all(|pair| pair[0].distance <= pair[1].distance)
    }

    /// Returns the steps as `[left, right, distance, size]` rows.
    #[must_use]
    pub fn to_linkage_matrix(&self) -> Vec<[f64; 4]> {
        self.steps
            .iter()
            .map(|step| {
                [
                    step.left as f64,
                    step.right as f64,
                    step.distance,
                    step.size as f64,
                ]
            })
            .collect()
    }

    /// Assigns every point to one of `clusters` flat clusters by undoing the
    /// last `clusters - 1` merges.
    ///
    /// Labels are contiguous and numbered in order of each cluster's first
    /// point.
    ///
    /// # Errors
    /// Returns [`LinkageError::InvalidClusterCount`] unless
    /// `1 <= clusters <= n`, or when a dendrogram built from fewer than
    /// `n - 1` merges cannot reach `clusters`.
    ///
    /// # Examples
    /// ```
    /// use agglo_core::{CondensedMatrix, LinkageMethod, linkage};
    ///
    /// let mut matrix = CondensedMatrix::from_fn(4, |i, j| {
    ///     let x: [f64; 4] = [0.0, 1.0, 10.0, 11.0];
    ///     (x[i] - x[j]).abs()
    /// })?;
    /// let dendrogram = linkage(&mut matrix, LinkageMethod::Single)?;
    /// assert_eq!(dendrogram.cut(2)?, vec![0, 0, 1, 1]);
    /// # Ok::<(), agglo_core::LinkageError>(())
    /// ```
    pub fn cut(&self, clusters: usize) -> Result<Vec<usize>> {
        let n = self.points;
        let Some(merges) = n.checked_sub(clusters).filter(|_| clusters > 0) else {
            return Err(LinkageError::InvalidClusterCount {
                requested: clusters,
                points: n,
            });
        };
        let Some(applied) = self.steps.get(..merges) else {
            return Err(LinkageError::InvalidClusterCount {
                requested: clusters,
                points: n,
            });
        };
        let mut sets = UnionFind::new(n);
        for step in applied {
            sets.union(step.left, step.right);
        }
        let mut labels = Vec::with_capacity(n);
        let mut roots: Vec<usize> = Vec::with_capacity(clusters);
        for point in 0..n {
            let root = sets.find(point);
            let label = roots.iter().position(|&r| r == root).unwrap_or_else(|| {
                roots.push(root);
                roots.len() - 1
            });
            labels.push(label);
        }
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Postprocess::Identity, 9.0, 9.0)]
    #[case(Postprocess::Sqrt, 9.0, 3.0)]
    #[case(Postprocess::SqrtDouble, 2.0, 2.0)]
    #[case(Postprocess::Power(3.0), 27.0, 3.0)]
    #[case(Postprocess::PlusOne, -0.25, 0.75)]
    #[case(Postprocess::Divide(4.0), 3.0, 0.75)]
    fn postprocess_transforms(#[case] p: Postprocess, #[case] input: f64, #[case] expected: f64) {
        assert!((p.apply(input) - expected).abs() < 1e-12);
    }

    #[test]
    fn append_rejects_nan() {
        let mut result = ClusterResult::new(3, Labelling::Nodes);
        result.append(0, 1, 1.0).expect("finite distance");
        assert_eq!(
            result.append(2, 3, f64::NAN),
            Err(LinkageError::NanDistance { step: 1 })
        );
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn point_events_are_sorted_and_relabelled() {
        let mut result = ClusterResult::new(4, Labelling::Points);
        result.append(0, 1, 3.0).expect("finite");
        result.append(2, 3, 1.0).expect("finite");
        result.append(1, 3, 2.0).expect("finite");
        let dendrogram = result.into_dendrogram();
        let rows: Vec<_> = dendrogram
            .steps()
            .iter()
            .map(|s| (s.left(), s.right(), s.distance(), s.size()))
            .collect();
        assert_eq!(
            rows,
            vec![(2, 3, 1.0, 2), (1, 4, 2.0, 3), (0, 5, 3.0, 4)]
        );
        assert_eq!(dendrogram.root_size(), Some(4));
        assert!(dendrogram.is_monotone());
    }

    #[test]
    fn stable_sort_keeps_ties_in_production_order() {
        let mut result = ClusterResult::new(4, Labelling::Points);
        result.append(2, 3, 1.0).expect("finite");
        result.append(0, 1, 1.0).expect("finite");
        result.append(0, 2, 1.0).expect("finite");
        let steps = result.into_dendrogram();
        assert_eq!(steps.steps()[0].left(), 2);
        assert_eq!(steps.steps()[1].left(), 0);
        assert_eq!((steps.steps()[2].left(), steps.steps()[2].right()), (4, 5));
    }

    #[test]
    fn node_events_keep_order_and_normalise_children() {
        let mut result = ClusterResult::new(3, Labelling::Nodes);
        result.append(2, 0, 2.0).expect("finite");
        result.append(3, 1, 1.0).expect("finite");
        let dendrogram = result.into_dendrogram();
        assert_eq!(
            dendrogram.to_linkage_matrix(),
            vec![[0.0, 2.0, 2.0, 2.0], [1.0, 3.0, 1.0, 3.0]]
        );
        assert!(!dendrogram.is_monotone());
    }

    #[rstest]
    #[case(1, vec![0, 0, 0, 0])]
    #[case(2, vec![0, 0, 1, 1])]
    #[case(3, vec![0, 0, 1, 2])]
    #[case(4, vec![0, 1, 2, 3])]
    fn cut_undoes_last_merges(#[case] clusters: usize, #[case] expected: Vec<usize>) {
        let mut result = ClusterResult::new(4, Labelling::Points);
        result.append(0, 1, 1.0).expect("finite");
        result.append(2, 3, 2.0).expect("finite");
        result.append(1, 2, 5.0).expect("finite");
        let dendrogram = result.into_dendrogram();
        assert_eq!(dendrogram.cut(clusters), Ok(expected));
    }

    #[test]
    fn cut_of_a_partial_tree_stops_at_recorded_merges() {
        let mut result = ClusterResult::new(4, Labelling::Points);
        result.append(0, 1, 1.0).expect("finite");
        let dendrogram = result.into_dendrogram();
        assert_eq!(dendrogram.cut(3), Ok(vec![0, 0, 1, 2]));
        assert_eq!(
            dendrogram.cut(2),
            Err(LinkageError::InvalidClusterCount {
                requested: 2,
                points: 4
            })
        );
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn node_events_must_name_existing_clusters() {
        let mut result = ClusterResult::new(3, Labelling::Nodes);
        result.append(0, 4, 1.0).expect("finite");
        drop(result.into_dendrogram());
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    fn cut_rejects_impossible_counts(#[case] clusters: usize) {
        let mut result = ClusterResult::new(4, Labelling::Points);
        for (a, b) in [(0, 1), (2, 3), (1, 2)] {
            result.append(a, b, 1.0).expect("finite");
        }
        assert_eq!(
            result.into_dendrogram().cut(clusters),
            Err(LinkageError::InvalidClusterCount {
                requested: clusters,
                points: 4
            })
        );
    }
}
