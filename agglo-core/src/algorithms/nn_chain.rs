//! Nearest-neighbour chain algorithm for reducible linkage methods.
//!
//! The chain is extended by repeatedly stepping to the nearest neighbour of
//! its tip until two points are reciprocal nearest neighbours; those two
//! merge. The rest of the chain stays valid for reducible methods, so the
//! search resumes from the element before the merged pair.

use tracing::instrument;

use crate::{
    active_set::ActiveSet,
    condensed::CondensedMatrix,
    dendrogram::{ClusterResult, Labelling},
    error::{LinkageError, Result},
    method::{Algorithm, LinkageMethod},
    update::{AverageRule, CompleteRule, SingleRule, UpdateRule, WardRule, WeightedRule},
};

use super::ensure_points;

type Driver = fn(&mut CondensedMatrix) -> Result<ClusterResult>;

/// Runs the nearest-neighbour chain algorithm on a condensed matrix.
///
/// Supports single, complete, average, weighted and both Ward variants; the
/// Ward recurrence is applied to the values as given. The matrix is
/// overwritten.
///
/// # Errors
/// Returns [`LinkageError::UnsupportedMethod`](crate::LinkageError::UnsupportedMethod)
/// for centroid and median linkage, which are not reducible, plus the
/// errors of [`mst_linkage`](crate::mst_linkage).
///
/// # Examples
/// ```
/// use agglo_core::{CondensedMatrix, LinkageMethod, nn_chain_linkage};
///
/// let mut matrix = CondensedMatrix::new(3, vec![1.0, 4.0, 2.0])?;
/// let dendrogram = nn_chain_linkage(&mut matrix, LinkageMethod::Complete)?.into_dendrogram();
/// assert_eq!(dendrogram.distances().collect::<Vec<_>>(), vec![1.0, 4.0]);
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
#[instrument(
    name = "core.nn_chain",
    err,
    skip(matrix),
    fields(points = matrix.point_count(), method = %method),
)]
pub fn nn_chain_linkage(
    matrix: &mut CondensedMatrix,
    method: LinkageMethod,
) -> Result<ClusterResult> {
    let driver: Driver = match method {
        LinkageMethod::Single => run::<SingleRule>,
        LinkageMethod::Complete => run::<CompleteRule>,
        LinkageMethod::Average => run::<AverageRule>,
        LinkageMethod::Weighted => run::<WeightedRule>,
        LinkageMethod::Ward | LinkageMethod::WardD => run::<WardRule>,
        LinkageMethod::Centroid | LinkageMethod::Median => {
            return Err(LinkageError::UnsupportedMethod {
                method,
                algorithm: Algorithm::NnChain,
            });
        }
    };
    ensure_points(matrix.point_count())?;
    driver(matrix)
}

fn run<R: UpdateRule>(matrix: &mut CondensedMatrix) -> Result<ClusterResult> {
    let n = matrix.point_count();
    let mut result = ClusterResult::new(n, Labelling::Points);
    let mut active = ActiveSet::new(n);
    let mut members = vec![1.0_f64; n];
    let mut chain = vec![0usize; n];
    let mut tip = 0usize;

    for _ in 0..n - 1 {
        let (mut idx1, mut idx2, mut min);
        if tip <= 3 {
            idx1 = active.start();
            chain[0] = idx1;
            tip = 1;
            idx2 = active.succ(idx1);
            min = matrix.get(idx1, idx2);
            for i in active.iter_after(idx2) {
                let d = matrix.get(idx1, i);
                if d < min {
                    min = d;
                    idx2 = i;
                }
            }
        } else {
            tip -= 3;
            idx1 = chain[tip - 1];
            idx2 = chain[tip];
            min = matrix.get_sym(idx1, idx2);
        }

        // Walk until the tip's nearest neighbour is the previous element.
        loop {
            chain[tip] = idx2;
            for i in active.iter() {
                if i == idx2 {
                    continue;
                }
                let d = matrix.get_sym(i, idx2);
                if d < min {
                    min = d;
                    idx1 = i;
                }
            }
            idx2 = idx1;
            idx1 = chain[tip];
            tip += 1;
            if idx2 == chain[tip - 2] {
                break;
            }
        }

        result.append(idx1, idx2, min)?;
        let (idx1, idx2) = if idx1 < idx2 {
            (idx1, idx2)
        } else {
            (idx2, idx1)
        };

        let rule = R::prepare(members[idx1], members[idx2], min);
        if R::TRACKS_SIZES {
            members[idx2] += members[idx1];
        }
        active.remove(idx1);

        let mut cursor = active.iter().peekable();
        while let Some(j) = cursor.next_if(|&j| j < idx1) {
            let updated = rule.apply(matrix.get(j, idx1), matrix.get(j, idx2), members[j]);
            matrix.set(j, idx2, updated);
        }
        while let Some(j) = cursor.next_if(|&j| j < idx2) {
            let updated = rule.apply(matrix.get(idx1, j), matrix.get(j, idx2), members[j]);
            matrix.set(j, idx2, updated);
        }
        for j in active.iter_after(idx2) {
            let updated = rule.apply(matrix.get(idx1, j), matrix.get(idx2, j), members[j]);
            matrix.set(idx2, j, updated);
        }
    }
    Ok(result)
}
