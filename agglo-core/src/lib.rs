//! Agglo core library: hierarchical agglomerative clustering.
//!
//! Clusters either a condensed dissimilarity matrix or a set of raw points
//! and reports the result as a dendrogram in the linkage-matrix convention.
//! [`LinkageBuilder`] and the [`linkage`]/[`linkage_vector`] shortcuts pick
//! an algorithm for the method; the individual drivers and the data
//! structures behind them are exported for callers that need finer
//! control.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod active_set;
mod algorithms;
mod builder;
mod condensed;
mod dendrogram;
mod dissimilarity;
mod error;
mod heap;
mod linkage;
mod method;
mod union_find;
mod update;

#[cfg(test)]
mod test_utils;

pub use crate::{
    active_set::{ActiveIter, ActiveSet},
    algorithms::{
        generic_linkage, generic_linkage_vector, generic_linkage_vector_alternative, mst_linkage,
        mst_linkage_vector, nn_chain_linkage,
    },
    builder::LinkageBuilder,
    condensed::{CondensedMatrix, condensed_len, condensed_offset},
    dendrogram::{ClusterResult, Dendrogram, Labelling, LinkageStep, MergeEvent, Postprocess},
    dissimilarity::{Dissimilarity, Metric, PointMatrix, UserMetric},
    error::{LinkageError, LinkageErrorCode, Result},
    heap::IndexedMinHeap,
    linkage::{Linkage, linkage, linkage_vector},
    method::{Algorithm, LinkageMethod},
    union_find::UnionFind,
};
