//! Linkage methods and the algorithms able to run them.

use std::{fmt, str::FromStr};

use crate::error::LinkageError;

/// Criterion used to measure the dissimilarity between two clusters.
///
/// # Examples
/// ```
/// use agglo_core::LinkageMethod;
///
/// let method: LinkageMethod = "ward".parse().expect("ward is a known method");
/// assert_eq!(method, LinkageMethod::Ward);
/// assert_eq!(method.as_str(), "ward");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LinkageMethod {
    /// Minimum distance between members (nearest point).
    Single,
    /// Maximum distance between members (farthest point).
    Complete,
    /// Mean distance between members (UPGMA).
    Average,
    /// Mean of the two merged clusters' distances (WPGMA).
    Weighted,
    /// Ward's minimum variance criterion on Euclidean input (`ward.D2`).
    ///
    /// Matrix input is squared before the run and the merge heights are
    /// square-rooted afterwards.
    Ward,
    /// Ward's recurrence applied directly to the supplied dissimilarities
    /// (`ward.D`).
    WardD,
    /// Distance between cluster centroids (UPGMC).
    Centroid,
    /// Distance between unweighted cluster midpoints (WPGMC).
    Median,
}

impl LinkageMethod {
    /// Every method, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Single,
        Self::Complete,
        Self::Average,
        Self::Weighted,
        Self::Ward,
        Self::WardD,
        Self::Centroid,
        Self::Median,
    ];

    /// Returns the lower-case name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Average => "average",
            Self::Weighted => "weighted",
            Self::Ward => "ward",
            Self::WardD => "ward_d",
            Self::Centroid => "centroid",
            Self::Median => "median",
        }
    }

    /// Returns `true` when merge heights never decrease along the dendrogram.
    ///
    /// Centroid and median linkage may produce inversions.
    ///
    /// # Examples
    /// ```
    /// use agglo_core::LinkageMethod;
    ///
    /// assert!(LinkageMethod::Average.is_monotone());
    /// assert!(!LinkageMethod::Median.is_monotone());
    /// ```
    #[must_use]
    pub const fn is_monotone(self) -> bool {
        !matches!(self, Self::Centroid | Self::Median)
    }

    /// Returns `true` when matrix input is interpreted as Euclidean
    /// distances that must be squared before the recurrence applies.
    #[must_use]
    pub const fn squares_input(self) -> bool {
        matches!(self, Self::Ward | Self::Centroid | Self::Median)
    }

    /// Returns `true` when the method can merge raw points directly.
    #[must_use]
    pub const fn has_vector_form(self) -> bool {
        matches!(
            self,
            Self::Single | Self::Ward | Self::Centroid | Self::Median
        )
    }
}

impl fmt::Display for LinkageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkageMethod {
    type Err = LinkageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LinkageError::UnknownMethod { name: s.to_owned() })
    }
}

/// Clustering algorithm used to produce the dendrogram.
///
/// `Auto` picks the fastest algorithm able to run the configured method on
/// the supplied input form.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Algorithm {
    /// Select an algorithm from the method and input form.
    #[default]
    Auto,
    /// Minimum spanning tree (single linkage only).
    Mst,
    /// Nearest-neighbour chain (reducible methods).
    NnChain,
    /// Heap-based generic algorithm (every method, matrix input).
    Generic,
    /// Generic algorithm on points, reusing the absorbed point's slot.
    VectorInPlace,
    /// Generic algorithm on points, appending one synthetic node per merge.
    VectorAlternative,
}

impl Algorithm {
    /// Every algorithm, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Auto,
        Self::Mst,
        Self::NnChain,
        Self::Generic,
        Self::VectorInPlace,
        Self::VectorAlternative,
    ];

    /// Returns the lower-case name of the algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Mst => "mst",
            Self::NnChain => "nn_chain",
            Self::Generic => "generic",
            Self::VectorInPlace => "vector_in_place",
            Self::VectorAlternative => "vector_alternative",
        }
    }

    /// Returns `true` when the algorithm can run `method`.
    ///
    /// # Examples
    /// ```
    /// use agglo_core::{Algorithm, LinkageMethod};
    ///
    /// assert!(Algorithm::NnChain.supports(LinkageMethod::Ward));
    /// assert!(!Algorithm::NnChain.supports(LinkageMethod::Centroid));
    /// assert!(!Algorithm::VectorInPlace.supports(LinkageMethod::Average));
    /// ```
    #[must_use]
    pub const fn supports(self, method: LinkageMethod) -> bool {
        match self {
            Self::Auto | Self::Generic => true,
            Self::Mst => matches!(method, LinkageMethod::Single),
            Self::NnChain => method.is_monotone(),
            Self::VectorInPlace | Self::VectorAlternative => matches!(
                method,
                LinkageMethod::Ward | LinkageMethod::Centroid | LinkageMethod::Median
            ),
        }
    }

    /// Returns `true` when the algorithm consumes raw points only.
    #[must_use]
    pub const fn is_vector_only(self) -> bool {
        matches!(self, Self::VectorInPlace | Self::VectorAlternative)
    }

    /// Resolves `Auto` to a concrete algorithm for matrix input.
    #[must_use]
    pub const fn resolve_for_matrix(self, method: LinkageMethod) -> Self {
        match self {
            Self::Auto => match method {
                LinkageMethod::Single => Self::Mst,
                LinkageMethod::Centroid | LinkageMethod::Median => Self::Generic,
                _ => Self::NnChain,
            },
            other => other,
        }
    }

    /// Resolves `Auto` to a concrete algorithm for point input.
    ///
    /// Methods without a point merge rule resolve to the matrix algorithm
    /// that would run on the pairwise dissimilarities.
    #[must_use]
    pub const fn resolve_for_points(self, method: LinkageMethod) -> Self {
        match self {
            Self::Auto => match method {
                LinkageMethod::Single => Self::Mst,
                LinkageMethod::Ward => Self::VectorInPlace,
                LinkageMethod::Centroid | LinkageMethod::Median => Self::VectorAlternative,
                _ => Self::NnChain,
            },
            other => other,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = LinkageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LinkageError::UnknownAlgorithm { name: s.to_owned() })
    }
}
