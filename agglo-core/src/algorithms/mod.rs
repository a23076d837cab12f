//! Linkage drivers.
//!
//! Matrix drivers consume a [`CondensedMatrix`](crate::CondensedMatrix) and
//! overwrite it as clusters merge; vector drivers consume a
//! [`Dissimilarity`](crate::Dissimilarity) and merge points directly. Every
//! driver returns the raw [`ClusterResult`](crate::ClusterResult); callers
//! choose the post-processing before building the dendrogram.

mod generic;
mod mst;
mod nn_chain;
mod vector;

pub use generic::generic_linkage;
pub use mst::{mst_linkage, mst_linkage_vector};
pub use nn_chain::nn_chain_linkage;
pub use vector::{generic_linkage_vector, generic_linkage_vector_alternative};

use crate::{
    error::{LinkageError, Result},
    method::{Algorithm, LinkageMethod},
};

fn ensure_points(points: usize) -> Result<usize> {
    if points < 2 {
        return Err(LinkageError::TooFewPoints { points });
    }
    Ok(points)
}

fn ensure_supported(method: LinkageMethod, algorithm: Algorithm) -> Result<()> {
    if algorithm.supports(method) {
        Ok(())
    } else {
        Err(LinkageError::UnsupportedMethod { method, algorithm })
    }
}

/// Scans `candidates` for the smallest `distance`, keeping the first
/// candidate on ties. Returns `None` when there are no candidates.
///
/// A NaN distance stops the run with [`LinkageError::NanDistance`] at merge
/// `step`; comparisons would otherwise skip it silently.
fn nearest<I, F>(step: usize, candidates: I, mut distance: F) -> Result<Option<(usize, f64)>>
where
    I: IntoIterator<Item = usize>,
    F: FnMut(usize) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for candidate in candidates {
        let value = distance(candidate);
        if value.is_nan() {
            return Err(LinkageError::NanDistance { step });
        }
        if best.is_none_or(|(_, min)| value < min) {
            best = Some((candidate, value));
        }
    }
    Ok(best)
}
